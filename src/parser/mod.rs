//! GCode Parser
//!
//! Word scanning and the stateful reader that tracks position and modal
//! codes across lines.

pub mod lexer;
pub mod reader;

pub use lexer::{Word, comment_span, scan_words};
pub use reader::{LineEnding, ParserState, Position, ProgramStateReader, RawLine};

use std::path::Path;

use crate::error::Result;
use crate::geometry::Rect;

/// Bounding rectangle of every cutting move in the program at `path`.
///
/// Uses its own reader; the rewrite pass must open a fresh one.
pub fn machining_area(path: &Path) -> Result<Option<Rect>> {
    ProgramStateReader::open(path)?.machining_area()
}
