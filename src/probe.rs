//! Probing program generation
//!
//! Writes the G-code that walks the probe over every grid point. Running it
//! on the machine produces the probe log that [`crate::grid::load_probe_log`]
//! turns back into a populated grid.

use std::io::{self, Write};

use crate::banner::Banner;
use crate::config::{MachineParams, Units};
use crate::error::{LevelError, Result};
use crate::flavor::ProbeDialect;
use crate::format::number;
use crate::grid::ProbeGrid;

/// Depth of the first, coarse probe that finds the surface
fn initial_probe_depth(units: Units) -> f64 {
    match units {
        Units::Millimeters => -10.0,
        Units::Inches => -0.375,
    }
}

pub struct ProbeCommandEmitter<'a> {
    grid: &'a ProbeGrid,
    params: &'a MachineParams,
    dialect: &'a dyn ProbeDialect,
}

impl<'a> ProbeCommandEmitter<'a> {
    pub fn new(
        grid: &'a ProbeGrid,
        params: &'a MachineParams,
        dialect: &'a dyn ProbeDialect,
    ) -> Self {
        Self {
            grid,
            params,
            dialect,
        }
    }

    /// Write the full probing program, banner first.
    pub fn emit<W: Write>(&self, banner: &Banner, out: &mut W) -> Result<()> {
        self.write_program(banner, out)
            .map_err(|e| LevelError::io("writing probe program", e))
    }

    fn write_program<W: Write>(&self, banner: &Banner, out: &mut W) -> io::Result<()> {
        let params = self.params;
        let origin = self.grid.area();

        banner.write_to(out)?;
        self.write_prerequisites(out)?;

        writeln!(out, "{} ({})", params.units.gcode(), params.units.label())?;
        writeln!(out, "G90 (absolute distance mode)")?;
        writeln!(out)?;

        if let Some(open) = self.dialect.open_log(&banner.source_name) {
            writeln!(out, "{open}")?;
        }

        writeln!(out, "(initial probe, sets Z0 on the surface)")?;
        writeln!(out, "G0 X{} Y{} Z0", number(origin.x), number(origin.y))?;
        writeln!(
            out,
            "{}",
            self.dialect
                .probe_command(initial_probe_depth(params.units), params.feed)
        )?;
        writeln!(out, "{}", self.dialect.zero_z())?;
        writeln!(out, "G0 Z{}", number(params.clearance))?;
        writeln!(
            out,
            "{}",
            self.dialect.probe_command(params.depth, params.feed / 2.0)
        )?;
        writeln!(out, "{}", self.dialect.zero_z())?;

        // serpentine: even rows left to right, odd rows right to left
        for (index, row) in self.grid.rows().iter().enumerate() {
            let points: Box<dyn Iterator<Item = _>> = if index % 2 == 0 {
                Box::new(row.iter())
            } else {
                Box::new(row.iter().rev())
            };
            for point in points {
                writeln!(out, "G0 Z{}", number(params.clearance))?;
                writeln!(out, "G0 X{} Y{}", number(point.x), number(point.y))?;
                writeln!(out, "{}", self.dialect.probe_command(params.depth, params.feed))?;
                writeln!(out, "{}", self.dialect.log_entry(point))?;
            }
        }

        writeln!(out, "G0 Z{}", number(params.clearance))?;
        writeln!(
            out,
            "G0 X{} Y{} Z{}",
            number(origin.x),
            number(origin.y),
            number(params.finish_height)
        )?;

        if let Some(close) = self.dialect.close_log() {
            writeln!(out, "{close}")?;
        }

        log::debug!(
            "probe program for {} points using {}",
            self.grid.points().count(),
            self.dialect.name()
        );
        Ok(())
    }

    fn write_prerequisites<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let reach = match self.params.units {
            Units::Millimeters => "10mm",
            Units::Inches => "3/8\"",
        };
        writeln!(out, "(prerequisites)")?;
        writeln!(out, "(1. a working probe is connected)")?;
        writeln!(out, "(2. the tool starts within {reach} of the board, )")?;
        writeln!(out, "(i.e. Z0 is no more than {reach} above the surface)")?;
        writeln!(out, "(The first probe sets Z0 where it touches the surface; )")?;
        writeln!(out, "(every later probe value is relative to that point)")?;
        writeln!(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::{Grbl, LinuxCnc};
    use chrono::NaiveDate;

    fn banner() -> Banner {
        let created = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        Banner::new("board.ngc", created)
    }

    fn emit(grid: &ProbeGrid, params: &MachineParams, dialect: &dyn ProbeDialect) -> String {
        let mut out = Vec::new();
        ProbeCommandEmitter::new(grid, params, dialect)
            .emit(&banner(), &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_serpentine_order() {
        let grid = ProbeGrid::synthetic(0.0, 0.0, 10.0, 10.0, 10.0).unwrap();
        let text = emit(&grid, &MachineParams::default(), &Grbl);

        let moves: Vec<_> = text
            .lines()
            .filter(|l| l.starts_with("G0 X") && !l.contains('Z'))
            .collect();
        assert_eq!(moves, vec!["G0 X0 Y0", "G0 X10 Y0", "G0 X10 Y10", "G0 X0 Y10"]);

        let logs: Vec<_> = text.lines().filter(|l| l.starts_with("(probe ")).collect();
        assert_eq!(logs[0], "(probe 500 at X0 Y0)");
        assert_eq!(logs[3], "(probe 502 at X0 Y10)");
    }

    #[test]
    fn test_program_frame_mm() {
        let grid = ProbeGrid::synthetic(5.0, 5.0, 10.0, 10.0, 10.0).unwrap();
        let text = emit(&grid, &MachineParams::default(), &Grbl);
        let lines: Vec<_> = text.lines().collect();

        assert!(lines.contains(&"G21 (millimeters)"));
        assert!(lines.contains(&"G90 (absolute distance mode)"));
        let start = lines.iter().position(|l| *l == "G0 X5 Y5 Z0").unwrap();
        assert_eq!(
            &lines[start + 1..start + 6],
            &["G38.2 Z-10 F100", "G92 Z0", "G0 Z2", "G38.2 Z-1 F50", "G92 Z0"]
        );
        assert_eq!(lines[lines.len() - 2], "G0 Z2");
        assert_eq!(lines[lines.len() - 1], "G0 X5 Y5 Z20");
    }

    #[test]
    fn test_program_inches_linuxcnc() {
        let grid = ProbeGrid::synthetic(0.0, 0.0, 1.0, 1.0, 0.5).unwrap();
        let params = MachineParams {
            units: Units::Inches,
            depth: -0.05,
            ..MachineParams::default()
        };
        let text = emit(&grid, &params, &LinuxCnc);
        let lines: Vec<_> = text.lines().collect();

        assert!(lines.contains(&"G20 (inches)"));
        assert!(lines.contains(&"(PROBEOPEN board-probe.txt)"));
        assert!(lines.contains(&"G38.2 Z-0.375 F100"));
        assert!(lines.contains(&"#508=#5063"));
        assert_eq!(lines.last(), Some(&"(PROBECLOSE)"));
        assert!(text.contains("3/8\""));
    }
}
