//! Spatial queries and bilinear interpolation over a probe grid.
//!
//! Height at an arbitrary XY is resolved from the four lattice points around
//! it: interpolate along Y on the left and right pair, then along X between
//! the two results.

use super::ProbeGrid;
use crate::geometry::Point3;

/// Added to a zero-length interpolation span so the division stays finite.
const ZERO_SPAN_NUDGE: f64 = 0.001;

impl ProbeGrid {
    /// Column of row 0 closest in X. Ties go to the higher index.
    pub fn nearest_column(&self, point: Point3) -> usize {
        let row = &self.rows[0];
        let mut best = 0;
        let mut distance = (point.x - row[0].x).abs();
        for (col, candidate) in row.iter().enumerate().skip(1) {
            let d = (point.x - candidate.x).abs();
            if d <= distance {
                distance = d;
                best = col;
            }
        }
        best
    }

    /// Row of column 0 closest in Y. Ties go to the higher index.
    pub fn nearest_row(&self, point: Point3) -> usize {
        let mut best = 0;
        let mut distance = (point.y - self.rows[0][0].y).abs();
        for (row, candidate) in self.rows.iter().enumerate().skip(1) {
            let d = (point.y - candidate[0].y).abs();
            if d <= distance {
                distance = d;
                best = row;
            }
        }
        best
    }

    pub fn nearest_point(&self, point: Point3) -> Point3 {
        self.rows[self.nearest_row(point)][self.nearest_column(point)]
    }

    /// Closed containment in the grid's area.
    pub fn contains(&self, point: Point3) -> bool {
        self.area.contains(point.x, point.y)
    }

    /// Lattice corner of the cell around `point` in the requested quadrant.
    ///
    /// Outside the grid, or where the quadrant would step past the border,
    /// this is the nearest lattice point.
    pub fn corner(&self, point: Point3, want_left: bool, want_top: bool) -> Point3 {
        let nearest = self.nearest_point(point);
        if !self.contains(point) {
            return nearest;
        }
        self.quadrant_index(point, nearest, want_left, want_top)
            .and_then(|(row, col)| self.point(row, col))
            .unwrap_or(nearest)
    }

    fn quadrant_index(
        &self,
        point: Point3,
        nearest: Point3,
        want_left: bool,
        want_top: bool,
    ) -> Option<(usize, usize)> {
        let mut row = self.nearest_row(point);
        let mut col = self.nearest_column(point);

        // nearest sits left of the query when the query is further along X,
        // and on "top" when the query is lower in Y
        let left_of = point.x - nearest.x > 0.0;
        let top_of = point.y - nearest.y < 0.0;

        if left_of && !want_left {
            col += 1;
        } else if !left_of && want_left {
            col = col.checked_sub(1)?;
        }

        if top_of && !want_top {
            row = row.checked_sub(1)?;
        } else if !top_of && want_top {
            row += 1;
        }

        Some((row, col))
    }

    pub fn top_left(&self, point: Point3) -> Point3 {
        self.corner(point, true, true)
    }

    pub fn top_right(&self, point: Point3) -> Point3 {
        self.corner(point, false, true)
    }

    pub fn bottom_left(&self, point: Point3) -> Point3 {
        self.corner(point, true, false)
    }

    pub fn bottom_right(&self, point: Point3) -> Point3 {
        self.corner(point, false, false)
    }

    /// Interpolated surface height at `point`'s XY.
    pub fn height_at(&self, point: Point3) -> f64 {
        let left = interpolate_along_y(self.bottom_left(point), self.top_left(point), point);
        let right = interpolate_along_y(self.bottom_right(point), self.top_right(point), point);
        interpolate_along_x(left, right, point).z
    }
}

/// Z between `p1` and `p2` at `query.y`, keeping `p1.x`.
pub fn interpolate_along_y(p1: Point3, p2: Point3, query: Point3) -> Point3 {
    let z = if p1 == p2 {
        p1.z
    } else {
        let nudge = zero_span_nudge(p2.y, p1.y);
        let t = (query.y - p1.y) / ((p2.y + nudge) - p1.y);
        p1.z + t * p2.z - t * p1.z
    };
    Point3::new(p1.x, query.y, z)
}

/// Z between `p1` and `p2` at `query.x`, keeping `p1.y`.
pub fn interpolate_along_x(p1: Point3, p2: Point3, query: Point3) -> Point3 {
    let z = if p1 == p2 {
        p1.z
    } else {
        let nudge = zero_span_nudge(p2.x, p1.x);
        let t = (query.x - p1.x) / ((p2.x + nudge) - p1.x);
        p1.z + t * p2.z - t * p1.z
    };
    Point3::new(query.x, p1.y, z)
}

fn zero_span_nudge(second: f64, first: f64) -> f64 {
    if second - first == 0.0 {
        ZERO_SPAN_NUDGE
    } else {
        0.0
    }
}
