//! Splitting long cutting moves.
//!
//! A straight move only gets its end point levelled, so a long cut would
//! follow a straight line between two surface heights. Splitting it makes
//! the depth track the surface along the whole cut.

use crate::config::Units;
use crate::format::number;
use crate::geometry::Point3;
use crate::grid::ProbeGrid;

/// Longest cutting move left whole in a millimeter program
pub const MAX_SEGMENT_MM: f64 = 5.0;

/// Longest cutting move left whole in an inch program
pub const MAX_SEGMENT_INCH: f64 = 0.187;

/// How long cutting moves are split
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Segmentation {
    /// By the program's units, millimeters when it declares none
    #[default]
    ByUnits,
    /// Fixed maximum length in program units
    Length(f64),
    Off,
}

impl Segmentation {
    /// Maximum segment length for a program in `units`, `None` when off.
    pub fn max_length(self, units: Option<Units>) -> Option<f64> {
        match self {
            Segmentation::ByUnits => Some(match units.unwrap_or_default() {
                Units::Millimeters => MAX_SEGMENT_MM,
                Units::Inches => MAX_SEGMENT_INCH,
            }),
            Segmentation::Length(length) if length.is_finite() && length > 0.0 => Some(length),
            Segmentation::Length(_) | Segmentation::Off => None,
        }
    }
}

/// Points strictly between `from` and `to` that cut the XY path into equal
/// pieces no longer than `max_length`. Z is interpolated along.
pub fn intermediate_points(from: Point3, to: Point3, max_length: f64) -> Vec<Point3> {
    let length = (to.x - from.x).hypot(to.y - from.y);
    if length <= max_length {
        return Vec::new();
    }

    let pieces = (length / max_length).ceil() as usize;
    (1..pieces)
        .map(|k| {
            let t = k as f64 / pieces as f64;
            Point3::new(
                from.x + (to.x - from.x) * t,
                from.y + (to.y - from.y) * t,
                from.z + (to.z - from.z) * t,
            )
        })
        .collect()
}

/// One `<motion> X Y Z` line per point, Z levelled where it cuts.
///
/// `feed` (an `F` word) goes on the first line so the split move runs at the
/// feed its source line asked for.
pub fn segment_lines(
    grid: &ProbeGrid,
    motion: &str,
    points: &[Point3],
    feed: Option<&str>,
) -> Vec<String> {
    points
        .iter()
        .enumerate()
        .map(|(index, point)| {
            let z = if point.z < 0.0 {
                grid.height_at(*point) + point.z
            } else {
                point.z
            };
            let mut line = format!(
                "{} X{} Y{} Z{}",
                motion,
                number(point.x),
                number(point.y),
                number(z)
            );
            if let (0, Some(feed)) = (index, feed) {
                line.push(' ');
                line.push_str(feed);
            }
            line
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> ProbeGrid {
        let rows = [0.0, 20.0]
            .iter()
            .map(|&y| [0.0, 20.0].iter().map(|&x| Point3::new(x, y, x * 0.1)).collect())
            .collect();
        ProbeGrid::from_rows(rows, "ramp").unwrap()
    }

    #[test]
    fn test_max_length_by_units() {
        assert_eq!(Segmentation::ByUnits.max_length(None), Some(MAX_SEGMENT_MM));
        assert_eq!(
            Segmentation::ByUnits.max_length(Some(Units::Inches)),
            Some(MAX_SEGMENT_INCH)
        );
        assert_eq!(Segmentation::Length(2.0).max_length(Some(Units::Inches)), Some(2.0));
        assert_eq!(Segmentation::Length(0.0).max_length(None), None);
        assert_eq!(Segmentation::Off.max_length(None), None);
    }

    #[test]
    fn test_short_move_is_not_split() {
        let from = Point3::new(0.0, 0.0, -1.0);
        assert!(intermediate_points(from, Point3::new(3.0, 4.0, -1.0), 5.0).is_empty());
        assert!(intermediate_points(from, Point3::new(0.0, 0.0, -2.0), 5.0).is_empty());
    }

    #[test]
    fn test_pieces_are_even() {
        let points = intermediate_points(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(12.0, 0.0, -3.0),
            5.0,
        );
        // 12 / 5 -> 3 pieces of 4
        assert_eq!(
            points,
            vec![Point3::new(4.0, 0.0, -1.0), Point3::new(8.0, 0.0, -2.0)]
        );
    }

    #[test]
    fn test_segment_lines_follow_surface() {
        let points = [Point3::new(5.0, 5.0, -0.5), Point3::new(10.0, 5.0, -0.5)];
        let lines = segment_lines(&ramp(), "G1", &points, Some("F200"));
        assert_eq!(lines, vec!["G1 X5 Y5 Z0 F200", "G1 X10 Y5 Z0.5"]);
    }

    #[test]
    fn test_segment_above_surface_is_not_levelled() {
        let lines = segment_lines(&ramp(), "G01", &[Point3::new(10.0, 5.0, 0.5)], None);
        assert_eq!(lines, vec!["G01 X10 Y5 Z0.5"]);
    }
}
