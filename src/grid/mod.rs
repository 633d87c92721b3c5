//! Probe grid
//!
//! A rectangular lattice of probed surface points. Row index follows Y and
//! column index follows X; spacing does not have to be even. The grid is
//! built once (see [`build`]) and only read afterwards (see [`query`]).

pub mod build;
pub mod query;

pub use build::{
    MAX_GRID_POINTS, PLACEHOLDER_BASE, ProbeReport, ReportFrame, load_probe_log, parse_probe_report,
    rebase_machine_reports,
};

use crate::error::{LevelError, Result};
use crate::geometry::{Point3, Rect};

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeGrid {
    rows: Vec<Vec<Point3>>,
    area: Rect,
}

impl ProbeGrid {
    /// Wrap an already ordered lattice. Every row must have the same,
    /// non-zero length.
    pub fn from_rows(rows: Vec<Vec<Point3>>, source_name: &str) -> Result<Self> {
        let expected = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => {
                return Err(LevelError::EmptyGrid {
                    source_name: source_name.to_string(),
                });
            }
        };

        if let Some(row) = rows.iter().find(|row| row.len() != expected) {
            return Err(LevelError::IrregularGrid {
                source_name: source_name.to_string(),
                row_y: row.first().map_or(f64::NAN, |p| p.y),
                found: row.len(),
                expected,
            });
        }

        let first = rows[0][0];
        let last = rows[rows.len() - 1][expected - 1];
        Ok(Self {
            area: Rect::spanning(first, last),
            rows,
        })
    }

    pub fn rows(&self) -> &[Vec<Point3>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows[0].len()
    }

    /// Rectangle spanned by the first and last lattice points.
    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn point(&self, row: usize, col: usize) -> Option<Point3> {
        self.rows.get(row)?.get(col).copied()
    }

    /// All points, row by row.
    pub fn points(&self) -> impl Iterator<Item = &Point3> {
        self.rows.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn test_from_rows_derives_area() {
        let grid = ProbeGrid::from_rows(
            vec![vec![p(0.0, 0.0), p(10.0, 0.0)], vec![p(0.0, 5.0), p(10.0, 5.0)]],
            "test",
        )
        .unwrap();

        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.area(), Rect::new(0.0, 0.0, 10.0, 5.0));
        assert_eq!(grid.point(1, 1), Some(p(10.0, 5.0)));
        assert_eq!(grid.point(2, 0), None);
        assert_eq!(grid.points().count(), 4);
    }

    #[test]
    fn test_descending_lattice_area_is_positive() {
        let grid = ProbeGrid::from_rows(
            vec![vec![p(10.0, 5.0), p(0.0, 5.0)], vec![p(10.0, 0.0), p(0.0, 0.0)]],
            "test",
        )
        .unwrap();
        assert_eq!(grid.area(), Rect::new(0.0, 0.0, 10.0, 5.0));
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = ProbeGrid::from_rows(
            vec![vec![p(0.0, 0.0), p(10.0, 0.0)], vec![p(0.0, 5.0)]],
            "probe.log",
        )
        .unwrap_err();

        match err {
            LevelError::IrregularGrid {
                row_y,
                found,
                expected,
                ..
            } => {
                assert_eq!(row_y, 5.0);
                assert_eq!(found, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(matches!(
            ProbeGrid::from_rows(vec![], "x"),
            Err(LevelError::EmptyGrid { .. })
        ));
        assert!(matches!(
            ProbeGrid::from_rows(vec![vec![]], "x"),
            Err(LevelError::EmptyGrid { .. })
        ));
    }
}
