//! Probe Dialects
//!
//! Controller-specific spelling of the probing commands.

use std::fmt;

use crate::format::number;
use crate::geometry::Point3;

/// LinuxCNC parameter holding Z of the last probe trip
const LINUXCNC_PROBED_Z: &str = "#5063";

/// Commands a probing program needs from a controller
pub trait ProbeDialect: fmt::Debug + Send + Sync {
    /// Registry name, e.g. `grbl`
    fn name(&self) -> &'static str;

    /// Probe straight down towards `depth` at `feed`.
    fn probe_command(&self, depth: f64, feed: f64) -> String;

    /// Make the current Z the work zero.
    fn zero_z(&self) -> String;

    /// Record the probe result for `point` (Z holds its placeholder id).
    fn log_entry(&self, point: &Point3) -> String;

    /// Start recording probe results; `None` if the controller needs nothing.
    fn open_log(&self, _source_name: &str) -> Option<String> {
        None
    }

    fn close_log(&self) -> Option<String> {
        None
    }
}

/// GRBL: probe reports are printed by the controller itself
#[derive(Debug, Clone, Copy, Default)]
pub struct Grbl;

impl ProbeDialect for Grbl {
    fn name(&self) -> &'static str {
        "grbl"
    }

    fn probe_command(&self, depth: f64, feed: f64) -> String {
        format!("G38.2 Z{} F{}", number(depth), number(feed))
    }

    fn zero_z(&self) -> String {
        "G92 Z0".to_string()
    }

    fn log_entry(&self, point: &Point3) -> String {
        format!(
            "(probe {} at X{} Y{})",
            number(point.z),
            number(point.x),
            number(point.y)
        )
    }
}

/// LinuxCNC: results go to a probe file and numbered parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxCnc;

impl ProbeDialect for LinuxCnc {
    fn name(&self) -> &'static str {
        "linuxcnc"
    }

    fn probe_command(&self, depth: f64, feed: f64) -> String {
        format!("G38.2 Z{} F{}", number(depth), number(feed))
    }

    fn zero_z(&self) -> String {
        "G10 L20 P0 Z0".to_string()
    }

    fn log_entry(&self, point: &Point3) -> String {
        format!("#{}={}", number(point.z), LINUXCNC_PROBED_Z)
    }

    fn open_log(&self, source_name: &str) -> Option<String> {
        let stem = source_name
            .rsplit_once('.')
            .map_or(source_name, |(stem, _)| stem);
        Some(format!("(PROBEOPEN {stem}-probe.txt)"))
    }

    fn close_log(&self) -> Option<String> {
        Some("(PROBECLOSE)".to_string())
    }
}
