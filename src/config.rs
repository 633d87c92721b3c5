//! Configuration management for the leveller.
//!
//! Handles:
//! - Command-line argument parsing
//! - Optional TOML config file with machine defaults
//! - Resolving both into the job to run (CLI > file > built-in)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use crate::level::Segmentation;

/// Config file looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = ".gcode-leveller.toml";

/// Flavor used when neither CLI nor config file names one
pub const DEFAULT_FLAVOR: &str = "grbl";

/// Unit system of a program or a probing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Millimeters,
    Inches,
}

impl Units {
    /// The G-code selecting this unit system.
    pub fn gcode(self) -> &'static str {
        match self {
            Units::Millimeters => "G21",
            Units::Inches => "G20",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Units::Millimeters => "millimeters",
            Units::Inches => "inches",
        }
    }
}

/// Machine parameters for a probing run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineParams {
    pub feed: f64,
    pub depth: f64,
    pub clearance: f64,
    pub spacing: f64,
    pub finish_height: f64,
    pub units: Units,
}

impl Default for MachineParams {
    fn default() -> Self {
        Self {
            feed: 100.0,
            depth: -1.0,
            clearance: 2.0,
            spacing: 10.0,
            finish_height: 20.0,
            units: Units::Millimeters,
        }
    }
}

/// Contents of a config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub flavor: Option<String>,
    pub machine: MachineOverrides,
}

/// `[machine]` table; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MachineOverrides {
    pub feed: Option<f64>,
    pub depth: Option<f64>,
    pub clearance: Option<f64>,
    pub spacing: Option<f64>,
    pub finish_height: Option<f64>,
    pub units: Option<Units>,
}

impl ConfigFile {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Project file in the working directory, then the user config directory.
    pub fn discover() -> Result<Option<(PathBuf, Self)>> {
        let mut candidates = vec![PathBuf::from(PROJECT_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("gcode-leveller").join("config.toml"));
        }

        for path in candidates {
            if path.is_file() {
                let file = Self::load(&path)?;
                return Ok(Some((path, file)));
            }
        }
        Ok(None)
    }
}

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "gcode-leveller")]
#[command(about = "Compensate milling G-code for an uneven surface using a probe grid")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file with machine defaults
    #[arg(long, global = true, help = "TOML file with flavor and [machine] defaults")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the program that probes the machining area
    Probe(ProbeArgs),
    /// Rewrite a program using a probe log
    Level(LevelArgs),
}

#[derive(Debug, clap::Args)]
pub struct ProbeArgs {
    /// G-code file to be milled
    pub gcode: PathBuf,

    #[arg(long, help = "Probing feed rate (default 100)")]
    pub feed: Option<f64>,

    #[arg(long, allow_hyphen_values = true, help = "Probing depth (default -1)")]
    pub depth: Option<f64>,

    #[arg(long, help = "Clearance above the surface between probes (default 2)")]
    pub clearance: Option<f64>,

    #[arg(long, help = "Spacing between probe points (default 10)")]
    pub spacing: Option<f64>,

    #[arg(long, help = "Z height to finish at (default 20)")]
    pub finish_height: Option<f64>,

    #[arg(long, help = "Probe in inches instead of millimeters")]
    pub inches: bool,

    #[arg(long, help = "Controller flavor (grbl, linuxcnc)")]
    pub flavor: Option<String>,

    #[arg(long, help = "Output directory, stdout if not set")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct LevelArgs {
    /// G-code file to be milled
    pub gcode: PathBuf,

    #[arg(long, help = "Probe log captured while running the probing program")]
    pub probe_log: PathBuf,

    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Split cutting moves longer than this, 0 to disable (default 5mm or 0.187in by program units)"
    )]
    pub segment_length: Option<f64>,

    #[arg(long, help = "Output directory, stdout if not set")]
    pub dir: Option<PathBuf>,
}

/// Resolved probing job
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeJob {
    pub gcode: PathBuf,
    pub params: MachineParams,
    pub flavor: String,
    pub out_dir: Option<PathBuf>,
}

/// Resolved leveling job
#[derive(Debug, Clone, PartialEq)]
pub struct LevelJob {
    pub gcode: PathBuf,
    pub probe_log: PathBuf,
    pub segmentation: Segmentation,
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Job {
    Probe(ProbeJob),
    Level(LevelJob),
}

/// Combined configuration from all sources
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub job: Job,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments, looking up a config file
    pub fn from_args(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ConfigFile::load(path)?,
            None => match ConfigFile::discover()? {
                Some((path, file)) => {
                    log::debug!("using config file {}", path.display());
                    file
                }
                None => ConfigFile::default(),
            },
        };
        Self::from_args_with_file(args, file)
    }

    /// Merge arguments over an already loaded config file
    pub fn from_args_with_file(args: Args, file: ConfigFile) -> Result<Self> {
        let job = match args.command {
            Command::Probe(probe) => {
                let defaults = MachineParams::default();
                let machine = &file.machine;
                let units = if probe.inches {
                    Units::Inches
                } else {
                    machine.units.unwrap_or(defaults.units)
                };
                let params = MachineParams {
                    feed: probe.feed.or(machine.feed).unwrap_or(defaults.feed),
                    depth: probe.depth.or(machine.depth).unwrap_or(defaults.depth),
                    clearance: probe
                        .clearance
                        .or(machine.clearance)
                        .unwrap_or(defaults.clearance),
                    spacing: probe.spacing.or(machine.spacing).unwrap_or(defaults.spacing),
                    finish_height: probe
                        .finish_height
                        .or(machine.finish_height)
                        .unwrap_or(defaults.finish_height),
                    units,
                };
                let flavor = probe
                    .flavor
                    .or(file.flavor)
                    .unwrap_or_else(|| DEFAULT_FLAVOR.to_string());

                Job::Probe(ProbeJob {
                    gcode: probe.gcode,
                    params,
                    flavor,
                    out_dir: check_out_dir(probe.dir)?,
                })
            }
            Command::Level(level) => Job::Level(LevelJob {
                gcode: level.gcode,
                probe_log: level.probe_log,
                segmentation: match level.segment_length {
                    None => Segmentation::ByUnits,
                    Some(length) if length == 0.0 => Segmentation::Off,
                    Some(length) if length.is_finite() && length > 0.0 => {
                        Segmentation::Length(length)
                    }
                    Some(length) => bail!("invalid segment length {length}, must be positive or 0"),
                },
                out_dir: check_out_dir(level.dir)?,
            }),
        };

        Ok(Config {
            job,
            log_level: args.log_level,
        })
    }
}

fn check_out_dir(dir: Option<PathBuf>) -> Result<Option<PathBuf>> {
    match dir {
        Some(dir) if !dir.is_dir() => bail!("directory '{}' does not exist", dir.display()),
        other => Ok(other),
    }
}
