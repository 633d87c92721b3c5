//! Probing programs generated for real machining areas
use chrono::NaiveDate;
use clap::Parser;
use gcode_leveller::cli::render_probe;
use gcode_leveller::config::{Args, Config, Job, ProbeJob};
use gcode_leveller::{Banner, MachineParams};
use std::io::Write;
use std::path::Path;

fn banner() -> Banner {
    let created = NaiveDate::from_ymd_opt(2024, 6, 1)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .expect("valid date");
    Banner::new("board.ngc", created)
}

fn program_file(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write program");
    file.flush().expect("flush");
    file
}

fn job(gcode: &Path, flavor: &str) -> ProbeJob {
    ProbeJob {
        gcode: gcode.to_path_buf(),
        params: MachineParams::default(),
        flavor: flavor.to_string(),
        out_dir: None,
    }
}

fn render(job: &ProbeJob) -> String {
    String::from_utf8(render_probe(job, &banner()).expect("render probe program"))
        .expect("utf-8 output")
}

const BOARD: &str = "G21\nG0 X0 Y0 Z1\nG1 Z-1 F100\nG1 X20 Y10\nG1 X0\nG0 Z5\n";

#[test]
fn test_grbl_program_covers_area() {
    let file = program_file(BOARD);
    let text = render(&job(file.path(), "grbl"));

    let visits: Vec<_> = text
        .lines()
        .filter(|l| l.starts_with("G0 X") && !l.contains('Z'))
        .collect();
    assert_eq!(
        visits,
        vec![
            "G0 X0 Y0",
            "G0 X10 Y0",
            "G0 X20 Y0",
            "G0 X20 Y10",
            "G0 X10 Y10",
            "G0 X0 Y10"
        ]
    );

    let probes = text.lines().filter(|l| *l == "G38.2 Z-1 F100").count();
    assert_eq!(probes, 6);

    let logs: Vec<_> = text.lines().filter(|l| l.starts_with("(probe ")).collect();
    assert_eq!(logs.first(), Some(&"(probe 500 at X0 Y0)"));
    assert_eq!(logs.last(), Some(&"(probe 505 at X0 Y10)"));
}

#[test]
fn test_linuxcnc_program_logs_parameters() {
    let file = program_file(BOARD);
    let text = render(&job(file.path(), "LinuxCNC"));
    let lines: Vec<_> = text.lines().collect();

    assert!(lines.contains(&"(PROBEOPEN board-probe.txt)"));
    assert!(lines.contains(&"G10 L20 P0 Z0"));
    assert_eq!(lines.iter().filter(|l| l.ends_with("=#5063")).count(), 6);
    assert_eq!(lines.last(), Some(&"(PROBECLOSE)"));
}

#[test]
fn test_unknown_flavor_lists_available() {
    let file = program_file(BOARD);
    let err = render_probe(&job(file.path(), "marlin"), &banner()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("marlin"), "{message}");
    assert!(message.contains("grbl, linuxcnc"), "{message}");
}

#[test]
fn test_program_without_cuts_is_rejected() {
    let file = program_file("G0 X0 Y0 Z5\nG0 X10 Y10\n");
    let err = render_probe(&job(file.path(), "grbl"), &banner()).unwrap_err();
    assert!(format!("{err:#}").contains("no cutting moves"));
}

#[test]
fn test_resolved_cli_job_renders() {
    let file = program_file(BOARD);
    let gcode = file.path().to_string_lossy().into_owned();
    let args = Args::try_parse_from([
        "gcode-leveller",
        "probe",
        gcode.as_str(),
        "--spacing",
        "20",
        "--depth",
        "-2",
        "--finish-height",
        "15",
    ])
    .expect("valid arguments");
    let config = Config::from_args_with_file(args, Default::default()).expect("config");
    let Job::Probe(job) = config.job else {
        panic!("expected probe job");
    };

    let text = render(&job);
    // 20 wide at spacing 20 gives 2 columns, 10 high gives 1 space
    assert_eq!(text.lines().filter(|l| *l == "G38.2 Z-2 F100").count(), 4);
    assert!(text.ends_with("G0 X0 Y0 Z15\n"));
}
