use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gcode_leveller::geometry::Point3;
use gcode_leveller::parser::scan_words;
use gcode_leveller::{Banner, ProbeGrid, ProgramStateReader, SurfaceRewriter};
use std::hint::black_box;

/// Engraving-style program: short cutting segments over a 50 x 50 area
fn generate_program(lines: usize) -> String {
    let mut content = String::from("G21\nG90\nG0 X0 Y0 Z2\nG1 Z-0.1 F200\n");
    for i in 0..lines {
        let x = (i % 500) as f64 * 0.1;
        let y = (i / 500) as f64 * 0.5 % 50.0;
        match i % 50 {
            0 => content.push_str("G0 Z1\n"),
            1 => content.push_str(&format!("G0 X{x:.3} Y{y:.3}\nG1 Z-0.1\n")),
            _ => content.push_str(&format!("G1 X{x:.3} Y{y:.3} (seg {i})\n")),
        }
    }
    content.push_str("G0 Z20\nM5\nM30\n");
    content
}

fn grid() -> ProbeGrid {
    let rows = (0..=5)
        .map(|j| {
            (0..=5)
                .map(|i| Point3::new(i as f64 * 10.0, j as f64 * 10.0, (i + j) as f64 * 0.01))
                .collect()
        })
        .collect();
    ProbeGrid::from_rows(rows, "bench").expect("regular grid")
}

fn bench_rewrite(c: &mut Criterion) {
    let grid = grid();
    let mut group = c.benchmark_group("rewrite");

    for size in [1_000, 10_000, 100_000] {
        let program = generate_program(size);
        group.throughput(Throughput::Bytes(program.len() as u64));
        group.bench_with_input(BenchmarkId::new("lines", size), &program, |b, program| {
            b.iter(|| {
                let mut reader = ProgramStateReader::new(program.as_bytes(), "bench.ngc");
                let mut out = Vec::with_capacity(program.len() + program.len() / 4);
                SurfaceRewriter::new(&grid)
                    .rewrite(&mut reader, &mut out)
                    .expect("rewrite");
                black_box(out)
            })
        });
    }

    group.finish();
}

fn bench_document(c: &mut Criterion) {
    let grid = grid();
    let program = generate_program(10_000);
    let created = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid date");
    let banner = Banner::new("bench.ngc", created);

    c.bench_function("write_document_10k", |b| {
        b.iter(|| {
            let mut reader = ProgramStateReader::new(program.as_bytes(), "bench.ngc");
            let mut out = Vec::new();
            SurfaceRewriter::new(&grid)
                .write_document(&banner, &mut reader, &mut out)
                .expect("rewrite");
            black_box(out)
        })
    });
}

fn bench_scan_words(c: &mut Criterion) {
    let lines = [
        ("simple", "G1 X10 Y20"),
        ("full", "G1 X10.125 Y-20.5 Z-0.1 F200 (contour pass 3)"),
        ("spaced", "g1 x 10 y 20 z -0.1"),
        ("comment", "(nothing but a comment)"),
    ];

    let mut group = c.benchmark_group("scan_words");
    for (name, line) in lines {
        group.bench_with_input(BenchmarkId::new("line", name), &line, |b, line| {
            b.iter(|| scan_words(black_box(line)))
        });
    }
    group.finish();
}

criterion_group!(leveling_benches, bench_rewrite, bench_document, bench_scan_words);
criterion_main!(leveling_benches);
