//! Error kinds
//!
//! Every failure is fatal for the run; variants carry enough context
//! (file, line) to find the offending input.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("{}: file not found", path.display())]
    NotFound { path: PathBuf },

    #[error("{source_name}:{line}: malformed number '{text}'")]
    MalformedNumber {
        source_name: String,
        line: u64,
        text: String,
    },

    #[error(
        "{source_name}: irregular probe grid, row at Y={row_y} has {found} points, expected {expected}"
    )]
    IrregularGrid {
        source_name: String,
        row_y: f64,
        found: usize,
        expected: usize,
    },

    #[error("{source_name}: no probe samples found")]
    EmptyGrid { source_name: String },

    #[error(
        "{source_name}: machine coordinate probe reports need the touch-off probe at the grid origin before the grid"
    )]
    UnreferencedProbeLog { source_name: String },

    #[error("{source_name}:{line}: work and machine coordinate probe reports mixed in one log")]
    MixedProbeFrames { source_name: String, line: u64 },

    #[error("invalid probe spacing {0}, must be positive and give at most 1000000 grid points")]
    InvalidSpacing(f64),

    #[error("{context}: {source}")]
    IoFailure {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl LevelError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::IoFailure {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, LevelError>;
