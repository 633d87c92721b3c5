//! Surface leveling
//!
//! Rewrites every cutting line of a program so its depth follows the probed
//! surface. Everything else is copied through untouched.

pub mod line;
pub mod segment;

pub use line::rewrite_line;
pub use segment::Segmentation;

use std::io::{BufRead, Write};
use std::path::Path;

use crate::banner::Banner;
use crate::error::{LevelError, Result};
use crate::grid::ProbeGrid;
use crate::parser::lexer::first_word;
use crate::parser::{self, Position, ProgramStateReader, scan_words};

/// Comment placed between the banner and the rewritten program
pub const EXPLANATION: [&str; 2] = [
    "(Z depths of cutting moves are rewritten with a bilinear interpolated)",
    "(surface offset taken from the probe grid)",
];

/// What a rewrite pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelStats {
    pub lines: u64,
    pub rewritten: u64,
    /// Lines added by splitting long cutting moves
    pub segments: u64,
}

pub struct SurfaceRewriter<'g> {
    grid: &'g ProbeGrid,
    segmentation: Segmentation,
}

impl<'g> SurfaceRewriter<'g> {
    pub fn new(grid: &'g ProbeGrid) -> Self {
        Self {
            grid,
            segmentation: Segmentation::default(),
        }
    }

    pub fn with_segmentation(mut self, segmentation: Segmentation) -> Self {
        self.segmentation = segmentation;
        self
    }

    /// Rewrite the rest of the program, line by line.
    ///
    /// A long linear cutting move is preceded by the levelled points that
    /// split it, so the line itself only finishes the move.
    pub fn rewrite<R: BufRead, W: Write>(
        &self,
        reader: &mut ProgramStateReader<R>,
        out: &mut W,
    ) -> Result<LevelStats> {
        let mut stats = LevelStats::default();
        loop {
            let before = reader.current_position();
            let Some(raw) = reader.next_line()? else {
                break;
            };
            stats.lines += 1;
            let ending = raw.ending.as_str();

            for segment in self.split_move(reader, before, &raw.text) {
                stats.segments += 1;
                out.write_all(segment.as_bytes())
                    .and_then(|_| out.write_all(ending.as_bytes()))
                    .map_err(|e| LevelError::io(format!("writing line {}", raw.number), e))?;
            }

            let text = rewrite_line(self.grid, &raw.text, reader.current_position());
            if text != raw.text {
                stats.rewritten += 1;
                log::trace!("{}: {} -> {}", raw.number, raw.text, text);
            }
            out.write_all(text.as_bytes())
                .and_then(|_| out.write_all(ending.as_bytes()))
                .map_err(|e| LevelError::io(format!("writing line {}", raw.number), e))?;
        }
        Ok(stats)
    }

    /// Intermediate lines for the move `line` made from `before`, empty
    /// unless it is a linear move that cuts and is longer than allowed.
    fn split_move<R: BufRead>(
        &self,
        reader: &ProgramStateReader<R>,
        before: Position,
        line: &str,
    ) -> Vec<String> {
        let Some(max_length) = self.segmentation.max_length(reader.units()) else {
            return Vec::new();
        };
        if !reader.is_linear_motion() {
            return Vec::new();
        }
        let (Some(from), Some(to)) = (before.point(), reader.current_position().point()) else {
            return Vec::new();
        };
        if from.z >= 0.0 && to.z >= 0.0 {
            return Vec::new();
        }

        let points = segment::intermediate_points(from, to, max_length);
        if points.is_empty() {
            return Vec::new();
        }
        log::trace!("splitting {} into {} pieces", line, points.len() + 1);

        let motion = reader.state().active_motion.as_deref().unwrap_or("G1");
        let words = scan_words(line);
        let feed = first_word(&words, 'F').map(|word| word.code());
        segment::segment_lines(self.grid, motion, &points, feed.as_deref())
    }

    /// Banner, explanation, then the rewritten program.
    pub fn write_document<R: BufRead, W: Write>(
        &self,
        banner: &Banner,
        reader: &mut ProgramStateReader<R>,
        out: &mut W,
    ) -> Result<LevelStats> {
        banner
            .write_to(out)
            .and_then(|_| {
                for line in EXPLANATION {
                    writeln!(out, "{line}")?;
                }
                writeln!(out)
            })
            .map_err(|e| LevelError::io("writing header", e))?;

        self.rewrite(reader, out)
    }
}

/// Level the program at `gcode` against `grid` and return the whole
/// rewritten document. Nothing is returned unless both passes succeed.
pub fn level_file(
    gcode: &Path,
    grid: &ProbeGrid,
    segmentation: Segmentation,
    banner: &Banner,
) -> Result<Vec<u8>> {
    match parser::machining_area(gcode)? {
        Some(area) if !grid.area().contains_rect(&area) => log::warn!(
            "probe area {:?} does not cover machining area {:?}; heights outside it use the nearest probe point",
            grid.area(),
            area
        ),
        Some(area) => log::debug!("machining area {:?}", area),
        None => log::warn!("{}: no cutting moves found", gcode.display()),
    }

    let mut reader = ProgramStateReader::open(gcode)?;
    let mut out = Vec::new();
    let stats = SurfaceRewriter::new(grid)
        .with_segmentation(segmentation)
        .write_document(banner, &mut reader, &mut out)?;
    reader.close();

    log::info!(
        "{}: rewrote {} of {} lines, added {} segments",
        gcode.display(),
        stats.rewritten,
        stats.lines,
        stats.segments
    );
    Ok(out)
}
