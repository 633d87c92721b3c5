//! Header block written at the top of every generated file.

use std::io::{self, Write};

use chrono::{Local, NaiveDateTime};

/// Provenance comment block: tool version, source file and creation time
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub source_name: String,
    pub created: NaiveDateTime,
}

impl Banner {
    pub fn new(source_name: impl Into<String>, created: NaiveDateTime) -> Self {
        Self {
            source_name: source_name.into(),
            created,
        }
    }

    /// Banner stamped with the local time.
    pub fn now(source_name: impl Into<String>) -> Self {
        Self::new(source_name, Local::now().naive_local())
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "(gcode-leveller, version: {})",
            env!("CARGO_PKG_VERSION")
        )?;
        writeln!(out, "(Original file: {})", self.source_name)?;
        writeln!(
            out,
            "(Creation date: {} time: {})",
            self.created.format("%Y-%m-%d"),
            self.created.format("%H:%M")
        )?;
        writeln!(out)
    }
}
