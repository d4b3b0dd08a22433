//! Offline perspective correction for oblique projection displays.
//!
//! A [`Homography`] is solved from two corner quads: the idealised flat
//! display and the footprint it actually lands on. [`build_warp`] samples that
//! transform over a regular lattice. The resulting [`WarpGrid`] is saved as a
//! tab-separated asset that the display layer loads once at startup.
//!
//! ```text
//!   source quad ─┐
//!                ├─▶ Homography ─▶ lattice ─▶ WarpGrid ─▶ perspective.data
//!   target quad ─┘
//! ```

use std::io;

mod grid;
mod homography;

pub use grid::{WarpGrid, WarpPoint, HEADER};
pub use homography::Homography;

/// Four corners in correspondence order; both quads must share the winding.
pub type Quad = [(f64, f64); 4];

const AREA_EPSILON: f64 = 1e-12;

#[derive(Debug, thiserror::Error)]
pub enum WarpError {
    #[error("singular warp: {0}")]
    Singular(String),
    #[error("warp grid must have at least one sample in each direction")]
    EmptyGrid,
    #[error("warp grid has {found} samples but its lattice needs {expected}")]
    Shape { expected: usize, found: usize },
    #[error("malformed warp grid at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Samples the projective map from `source` onto `target` over a
/// `grid_width x grid_height` lattice spanning the source's bounding box.
pub fn build_warp(
    source: &Quad,
    target: &Quad,
    grid_width: usize,
    grid_height: usize,
) -> Result<WarpGrid, WarpError> {
    if grid_width == 0 || grid_height == 0 {
        return Err(WarpError::EmptyGrid);
    }

    let source_winding = winding("source", source)?;
    let target_winding = winding("target", target)?;
    if source_winding != target_winding {
        return Err(WarpError::Singular(
            "source and target quads wind in opposite directions".into(),
        ));
    }

    let transform = Homography::from_quads(source, target)?;
    let (min, max) = bounding_box(source);
    transform.check_region(min, max)?;

    let xs = linspace(min.0, max.0, grid_width);
    let ys = linspace(min.1, max.1, grid_height);

    let mut points = Vec::with_capacity(grid_width * grid_height);
    for &y in &ys {
        for &x in &xs {
            let mapped = transform.apply(x, y)?;
            points.push(WarpPoint {
                source: (x, y),
                mapped,
                weight: 1.0,
            });
        }
    }

    tracing::debug!(
        width = grid_width,
        height = grid_height,
        "sampled perspective warp"
    );
    WarpGrid::from_points(grid_width, grid_height, points)
}

/// Twice the signed area of the polygon; positive when counter-clockwise.
fn signed_area(quad: &Quad) -> f64 {
    (0..4)
        .map(|i| {
            let (x0, y0) = quad[i];
            let (x1, y1) = quad[(i + 1) % 4];
            x0 * y1 - x1 * y0
        })
        .sum()
}

/// Returns the winding sign of a simple, non-degenerate quad.
fn winding(label: &str, quad: &Quad) -> Result<bool, WarpError> {
    if quad.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return Err(WarpError::Singular(format!(
            "{label} quad has non-finite corners"
        )));
    }

    let area = signed_area(quad);
    if area.abs() < AREA_EPSILON {
        return Err(WarpError::Singular(format!("{label} quad has no area")));
    }

    if segments_cross(quad[0], quad[1], quad[2], quad[3])
        || segments_cross(quad[1], quad[2], quad[3], quad[0])
    {
        return Err(WarpError::Singular(format!(
            "{label} quad is self-intersecting"
        )));
    }

    Ok(area > 0.0)
}

fn orientation(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Whether the open segments `ab` and `cd` properly intersect.
fn segments_cross(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let d1 = orientation(a, b, c);
    let d2 = orientation(a, b, d);
    let d3 = orientation(c, d, a);
    let d4 = orientation(c, d, b);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

fn bounding_box(quad: &Quad) -> ((f64, f64), (f64, f64)) {
    quad.iter().fold(
        ((f64::INFINITY, f64::INFINITY), (f64::NEG_INFINITY, f64::NEG_INFINITY)),
        |((min_x, min_y), (max_x, max_y)), &(x, y)| {
            ((min_x.min(x), min_y.min(y)), (max_x.max(x), max_y.max(y)))
        },
    )
}

/// Evenly spaced samples over `[start, end]`, endpoints included.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![start];
    }
    let last = count - 1;
    (0..count)
        .map(|i| {
            if i == last {
                end
            } else {
                start + (end - start) * i as f64 / last as f64
            }
        })
        .collect()
}
