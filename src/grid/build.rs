//! Grid construction
//!
//! Two ways in: a synthetic lattice laid over the machining area (used to
//! generate the probing program), and a lattice rebuilt from the position
//! reports a controller printed while probing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::ProbeGrid;
use crate::error::{LevelError, Result};
use crate::geometry::{Point3, Rect};

/// First placeholder Z of a synthetic grid. Each point gets the next
/// integer, giving every probe point a unique parameter number.
pub const PLACEHOLDER_BASE: f64 = 500.0;

/// Upper bound on the points of a synthetic grid
pub const MAX_GRID_POINTS: usize = 1_000_000;

/// `<Probe,MPos:x,y,z,WPos:x,y,z>` status report
const STATUS_MARKER: &str = "<Probe,MPos:";
const WORK_POS: &str = "WPos:";
/// `[PRB:x,y,z:1]` probe report, always in machine coordinates
const PRB_MARKER: &str = "[PRB:";

/// Coordinate system a probe report is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFrame {
    /// Work coordinates: Z is already relative to the touched-off zero
    Work,
    /// Machine coordinates: needs re-basing against the touch-off probe
    Machine,
}

/// One probed point from a log line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReport {
    pub point: Point3,
    pub frame: ReportFrame,
}

impl ProbeGrid {
    /// Even lattice over `width` x `height` starting at the given corner,
    /// spaced no wider than `spacing`.
    pub fn synthetic(
        x_start: f64,
        y_start: f64,
        width: f64,
        height: f64,
        spacing: f64,
    ) -> Result<Self> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(LevelError::InvalidSpacing(spacing));
        }

        let x_spaces = axis_spaces(width, spacing);
        let y_spaces = axis_spaces(height, spacing);
        let points = (x_spaces + 1.0) * (y_spaces + 1.0);
        if points > MAX_GRID_POINTS as f64 {
            return Err(LevelError::InvalidSpacing(spacing));
        }
        let (x_spaces, y_spaces) = (x_spaces as usize, y_spaces as usize);
        let x_step = if x_spaces == 0 { 0.0 } else { width / x_spaces as f64 };
        let y_step = if y_spaces == 0 { 0.0 } else { height / y_spaces as f64 };

        let mut placeholder = PLACEHOLDER_BASE;
        let rows = (0..=y_spaces)
            .map(|j| {
                (0..=x_spaces)
                    .map(|i| {
                        let point = Point3::new(
                            x_start + i as f64 * x_step,
                            y_start + j as f64 * y_step,
                            placeholder,
                        );
                        placeholder += 1.0;
                        point
                    })
                    .collect()
            })
            .collect();

        let grid = Self::from_rows(rows, "synthetic grid")?;
        log::debug!(
            "synthetic grid {}x{} over {:?}",
            grid.row_count(),
            grid.column_count(),
            grid.area()
        );
        Ok(grid)
    }

    /// Lattice covering `area` at `spacing`.
    pub fn over_area(area: Rect, spacing: f64) -> Result<Self> {
        Self::synthetic(area.x, area.y, area.width, area.height, spacing)
    }

    /// Rebuild a lattice from probed points: grouped into rows by exact Y,
    /// then by exact X within a row (a repeated X replaces the earlier
    /// sample), rows ordered by Y and columns by X.
    pub fn from_samples(
        samples: impl IntoIterator<Item = Point3>,
        source_name: &str,
    ) -> Result<Self> {
        let mut rows: Vec<(f64, Vec<Point3>)> = Vec::new();
        for sample in samples {
            match rows.iter_mut().find(|(y, _)| *y == sample.y) {
                Some((_, row)) => match row.iter_mut().find(|p| p.x == sample.x) {
                    Some(existing) => *existing = sample,
                    None => row.push(sample),
                },
                None => rows.push((sample.y, vec![sample])),
            }
        }

        rows.sort_by(|a, b| a.0.total_cmp(&b.0));
        let rows = rows
            .into_iter()
            .map(|(_, mut row)| {
                row.sort_by(|a, b| a.x.total_cmp(&b.x));
                row
            })
            .collect();

        let grid = Self::from_rows(rows, source_name)?;
        log::debug!(
            "{}: probe grid {}x{} over {:?}",
            source_name,
            grid.row_count(),
            grid.column_count(),
            grid.area()
        );
        Ok(grid)
    }

    /// Build from a probe log; lines without a probe report are ignored.
    ///
    /// Work coordinate reports are taken as they are. Machine coordinate
    /// reports are re-based against the touch-off probe (see
    /// [`rebase_machine_reports`]), with `origin` the work XY the probing
    /// program started at.
    pub fn from_probe_log<R: BufRead>(
        reader: R,
        source_name: &str,
        origin: (f64, f64),
    ) -> Result<Self> {
        let mut frame = None;
        let mut samples = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let number = index as u64 + 1;
            let line = line
                .map_err(|e| LevelError::io(format!("reading {} line {}", source_name, number), e))?;
            let report = match parse_probe_report(&line) {
                None => continue,
                Some(Ok(report)) => report,
                Some(Err(text)) => {
                    return Err(LevelError::MalformedNumber {
                        source_name: source_name.to_string(),
                        line: number,
                        text,
                    });
                }
            };
            match frame {
                None => frame = Some(report.frame),
                Some(seen) if seen != report.frame => {
                    return Err(LevelError::MixedProbeFrames {
                        source_name: source_name.to_string(),
                        line: number,
                    });
                }
                Some(_) => {}
            }
            samples.push(report.point);
        }

        if frame == Some(ReportFrame::Machine) {
            samples = rebase_machine_reports(&samples, origin, source_name)?;
        }
        Self::from_samples(samples, source_name)
    }
}

/// Translate machine coordinate reports into work coordinates.
///
/// The probing program probes twice at the grid origin before the grid
/// itself (a coarse probe, then the touch-off that sets Z0), and the first
/// grid point sits on the origin too. The touch-off is therefore the second
/// to last report of the leading run at the first report's XY: its Z becomes
/// zero and its XY becomes `origin`. Reports before it are dropped.
pub fn rebase_machine_reports(
    reports: &[Point3],
    origin: (f64, f64),
    source_name: &str,
) -> Result<Vec<Point3>> {
    let Some(first) = reports.first() else {
        return Ok(Vec::new());
    };
    let at_origin = reports
        .iter()
        .take_while(|p| p.x == first.x && p.y == first.y)
        .count();
    if at_origin < 2 {
        return Err(LevelError::UnreferencedProbeLog {
            source_name: source_name.to_string(),
        });
    }

    let reference = reports[at_origin - 2];
    let (dx, dy) = (origin.0 - reference.x, origin.1 - reference.y);
    log::debug!(
        "{}: touch-off at machine {}, re-based to X{} Y{}",
        source_name,
        reference,
        origin.0,
        origin.1
    );

    Ok(reports[at_origin - 1..]
        .iter()
        .map(|p| Point3::new(p.x + dx, p.y + dy, p.z - reference.z))
        .collect())
}

/// Load and build a grid from the probe log at `path`.
pub fn load_probe_log(path: &Path, origin: (f64, f64)) -> Result<ProbeGrid> {
    if !path.exists() {
        return Err(LevelError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let file =
        File::open(path).map_err(|e| LevelError::io(format!("opening {}", path.display()), e))?;
    let source_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    ProbeGrid::from_probe_log(BufReader::new(file), &source_name, origin)
}

/// Extract the probed point from one log line.
///
/// `None` when the line holds no probe report, `Some(Err(text))` with the
/// offending text when the report's coordinates do not parse. A status
/// report's `WPos` is used when present, its `MPos` otherwise.
pub fn parse_probe_report(line: &str) -> Option<std::result::Result<ProbeReport, String>> {
    let (fields, frame) = if let Some(start) = line.find(STATUS_MARKER) {
        let report = &line[start + STATUS_MARKER.len()..];
        let report = &report[..report.find('>').unwrap_or(report.len())];
        match report.find(WORK_POS) {
            Some(work) => (&report[work + WORK_POS.len()..], ReportFrame::Work),
            None => (report, ReportFrame::Machine),
        }
    } else if let Some(start) = line.find(PRB_MARKER) {
        let report = &line[start + PRB_MARKER.len()..];
        (
            &report[..report.find([':', ']']).unwrap_or(report.len())],
            ReportFrame::Machine,
        )
    } else {
        return None;
    };

    Some(parse_triple(fields).map(|point| ProbeReport { point, frame }))
}

fn parse_triple(fields: &str) -> std::result::Result<Point3, String> {
    let mut values = fields.split(',').map(|field| field.trim().parse::<f64>());
    match (values.next(), values.next(), values.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Ok(Point3::new(x, y, z)),
        _ => Err(fields.to_string()),
    }
}

/// Number of spaces along one axis: `floor(|extent| / spacing)`, at least
/// one when the extent is non-zero so the far edge is still probed.
fn axis_spaces(extent: f64, spacing: f64) -> f64 {
    if extent == 0.0 {
        return 0.0;
    }
    (extent.abs() / spacing).floor().max(1.0)
}
