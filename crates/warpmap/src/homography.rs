use crate::{Quad, WarpError};

const PIVOT_EPSILON: f64 = 1e-12;
const DIVISOR_EPSILON: f64 = 1e-12;

/// Row-major 3x3 projective transform with `h33` normalised to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    /// Solves for the transform taking each `source` corner onto the matching
    /// `target` corner.
    ///
    /// Each correspondence `(x, y) -> (u, v)` contributes two rows to an 8x8
    /// system in the unknowns `h11..h32`.
    pub fn from_quads(source: &Quad, target: &Quad) -> Result<Self, WarpError> {
        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];

        for (i, (&(x, y), &(u, v))) in source.iter().zip(target.iter()).enumerate() {
            let r = 2 * i;
            a[r] = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y];
            b[r] = u;
            a[r + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y];
            b[r + 1] = v;
        }

        let h = solve(&mut a, &mut b)?;
        Ok(Self {
            m: [h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0],
        })
    }

    pub fn matrix(&self) -> [[f64; 3]; 3] {
        let m = &self.m;
        [[m[0], m[1], m[2]], [m[3], m[4], m[5]], [m[6], m[7], m[8]]]
    }

    fn divisor(&self, x: f64, y: f64) -> f64 {
        self.m[6] * x + self.m[7] * y + self.m[8]
    }

    /// Fails unless the homogeneous divisor keeps one sign over the rectangle
    /// spanned by `min` and `max`.
    ///
    /// The divisor is affine, so its extremes over the rectangle sit at the
    /// corners.
    pub fn check_region(&self, min: (f64, f64), max: (f64, f64)) -> Result<(), WarpError> {
        let corners = [min, (min.0, max.1), max, (max.0, min.1)];
        let divisors = corners.map(|(x, y)| self.divisor(x, y));
        let vanishing = divisors
            .iter()
            .any(|w| !w.is_finite() || w.abs() < DIVISOR_EPSILON);
        let positive = divisors.iter().filter(|w| **w > 0.0).count();
        if vanishing || (positive != 0 && positive != corners.len()) {
            return Err(WarpError::Singular(format!(
                "homogeneous divisor changes sign inside {min:?}..{max:?}"
            )));
        }
        Ok(())
    }

    /// Maps a point through the transform, performing the perspective divide.
    pub fn apply(&self, x: f64, y: f64) -> Result<(f64, f64), WarpError> {
        let m = &self.m;
        let w = self.divisor(x, y);
        if !w.is_finite() || w.abs() < DIVISOR_EPSILON {
            return Err(WarpError::Singular(format!(
                "homogeneous divisor vanishes at ({x}, {y})"
            )));
        }
        let u = (m[0] * x + m[1] * y + m[2]) / w;
        let v = (m[3] * x + m[4] * y + m[5]) / w;
        Ok((u, v))
    }
}

/// Gaussian elimination with partial pivoting on an 8x8 system.
fn solve(a: &mut [[f64; 8]; 8], b: &mut [f64; 8]) -> Result<[f64; 8], WarpError> {
    let n = 8;

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = a[col][col].abs();
        for row in (col + 1)..n {
            if a[row][col].abs() > max_val {
                max_val = a[row][col].abs();
                max_row = row;
            }
        }

        if max_row != col {
            a.swap(col, max_row);
            b.swap(col, max_row);
        }

        let pivot = a[col][col];
        if !pivot.is_finite() || pivot.abs() < PIVOT_EPSILON {
            return Err(WarpError::Singular(
                "corner correspondences do not determine a unique transform".into(),
            ));
        }

        for row in (col + 1)..n {
            let factor = a[row][col] / pivot;
            for j in col..n {
                a[row][j] -= factor * a[col][j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIT: Quad = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];

    fn close(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    #[test]
    fn identity_for_matching_quads() {
        let h = Homography::from_quads(&UNIT, &UNIT).unwrap();
        let m = h.matrix();
        for (r, row) in m.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let expected = if r == c { 1.0 } else { 0.0 };
                assert!((value - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn maps_defining_corners_exactly() {
        let target = [(-0.25, 0.0), (-0.75, 1.0), (1.75, 1.0), (1.25, 0.0)];
        let h = Homography::from_quads(&UNIT, &target).unwrap();
        for (src, dst) in UNIT.iter().zip(target.iter()) {
            assert!(close(h.apply(src.0, src.1).unwrap(), *dst));
        }
    }

    #[test]
    fn collapsed_target_is_singular() {
        let target = [(0.0, 0.0); 4];
        assert!(matches!(
            Homography::from_quads(&UNIT, &target),
            Err(WarpError::Singular(_))
        ));
    }

    #[test]
    fn divisor_at_horizon_is_rejected() {
        let h = Homography {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0],
        };
        assert!(matches!(h.apply(-1.0, 0.0), Err(WarpError::Singular(_))));
        assert!(matches!(
            h.check_region((-2.0, 0.0), (0.0, 1.0)),
            Err(WarpError::Singular(_))
        ));
        assert!(h.check_region((0.0, 0.0), (1.0, 1.0)).is_ok());
    }
}
