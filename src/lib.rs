//! G-code auto-leveller
//!
//! Compensates a milling program for a surface that is not perfectly flat,
//! such as a warped PCB blank. The work happens in two steps:
//!
//! - `probe`: build a grid over the program's machining area and emit a
//!   probing program for it
//! - `level`: load the probe log produced by running that program and
//!   rewrite the Z depth of every cutting move by the bilinear interpolated
//!   surface height at its XY position

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod flavor;
pub mod format;
pub mod geometry;
pub mod grid;
pub mod level;
pub mod parser;
pub mod probe;

pub use banner::Banner;
pub use config::{Config, MachineParams, Units};
pub use error::{LevelError, Result};
pub use flavor::{FlavorRegistry, ProbeDialect};
pub use geometry::{Point3, Rect};
pub use grid::ProbeGrid;
pub use level::{SurfaceRewriter, level_file};
pub use parser::ProgramStateReader;
pub use probe::ProbeCommandEmitter;
