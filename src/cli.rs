//! Command execution
//!
//! Runs a resolved [`Config`]: both commands render their whole output in
//! memory and only then write it, so a failed run leaves no partial file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::banner::Banner;
use crate::config::{Config, Job, LevelJob, ProbeJob};
use crate::flavor::FlavorRegistry;
use crate::grid::{self, ProbeGrid};
use crate::level;
use crate::parser;
use crate::probe::ProbeCommandEmitter;

/// Parse arguments, set up logging and run the selected command
pub fn run() -> Result<()> {
    let config = Config::from_args_and_env()?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();

    execute(&config)
}

/// Run an already resolved configuration
pub fn execute(config: &Config) -> Result<()> {
    match &config.job {
        Job::Probe(job) => {
            let banner = Banner::now(file_name(&job.gcode));
            let program = render_probe(job, &banner)?;
            deliver(&program, &job.gcode, job.out_dir.as_deref(), "Probing")
        }
        Job::Level(job) => {
            let banner = Banner::now(file_name(&job.gcode));
            let program = render_level(job, &banner)?;
            deliver(&program, &job.gcode, job.out_dir.as_deref(), "Levelled")
        }
    }
}

/// Probing program for the machining area of `job.gcode`
pub fn render_probe(job: &ProbeJob, banner: &Banner) -> Result<Vec<u8>> {
    let registry = FlavorRegistry::with_builtin();
    let dialect = registry.get(&job.flavor).with_context(|| {
        format!(
            "unknown flavor '{}', available: {}",
            job.flavor,
            registry.list_flavors().join(", ")
        )
    })?;

    let area = parser::machining_area(&job.gcode)?.with_context(|| {
        format!(
            "{}: no cutting moves (Z below 0) to probe for",
            job.gcode.display()
        )
    })?;
    log::info!("machining area {:?}", area);

    let grid = ProbeGrid::over_area(area, job.params.spacing)?;
    log::info!(
        "probing {} x {} points with {} flavor",
        grid.column_count(),
        grid.row_count(),
        dialect.name()
    );

    let mut out = Vec::new();
    ProbeCommandEmitter::new(&grid, &job.params, dialect).emit(banner, &mut out)?;
    Ok(out)
}

/// Levelled version of `job.gcode` using the grid from `job.probe_log`
pub fn render_level(job: &LevelJob, banner: &Banner) -> Result<Vec<u8>> {
    // the probing program started at the machining area's corner, which is
    // where machine coordinate logs get anchored
    let origin = parser::machining_area(&job.gcode)?.map_or((0.0, 0.0), |area| (area.x, area.y));
    let grid = grid::load_probe_log(&job.probe_log, origin)
        .with_context(|| format!("loading probe log {}", job.probe_log.display()))?;
    log::info!(
        "probe grid {} x {} over {:?}",
        grid.column_count(),
        grid.row_count(),
        grid.area()
    );

    let program = level::level_file(&job.gcode, &grid, job.segmentation, banner)
        .with_context(|| format!("leveling {}", job.gcode.display()))?;
    Ok(program)
}

/// Write to a fresh file in `out_dir`, or to stdout.
fn deliver(content: &[u8], gcode: &Path, out_dir: Option<&Path>, tag: &str) -> Result<()> {
    match out_dir {
        Some(dir) => {
            let path = unique_output_path(dir, gcode, tag);
            fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
            log::info!("created {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(content)
                .and_then(|_| stdout.flush())
                .context("writing to stdout")?;
        }
    }
    Ok(())
}

/// `<stem>-<tag><ext>` in `dir`, or `<stem>-<tag>_<n><ext>` with the first
/// `n` not already taken.
pub fn unique_output_path(dir: &Path, gcode: &Path, tag: &str) -> PathBuf {
    let name = file_name(gcode);
    let (stem, ext) = match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name.as_str(), ""),
    };

    let mut path = dir.join(format!("{stem}-{tag}{ext}"));
    let mut n = 0;
    while path.exists() {
        n += 1;
        path = dir.join(format!("{stem}-{tag}_{n}{ext}"));
    }
    path
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let gcode = Path::new("/jobs/board.ngc");

        let first = unique_output_path(dir.path(), gcode, "Levelled");
        assert_eq!(first, dir.path().join("board-Levelled.ngc"));

        fs::write(&first, "").unwrap();
        let second = unique_output_path(dir.path(), gcode, "Levelled");
        assert_eq!(second, dir.path().join("board-Levelled_1.ngc"));

        fs::write(&second, "").unwrap();
        assert_eq!(
            unique_output_path(dir.path(), gcode, "Levelled"),
            dir.path().join("board-Levelled_2.ngc")
        );
    }

    #[test]
    fn test_unique_output_path_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            unique_output_path(dir.path(), Path::new(".hidden"), "Probing"),
            dir.path().join(".hidden-Probing")
        );
        assert_eq!(
            unique_output_path(dir.path(), Path::new("board"), "Probing"),
            dir.path().join("board-Probing")
        );
    }
}
