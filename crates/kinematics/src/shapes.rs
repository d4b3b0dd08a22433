//! Vertex outlines for the shapes the render layer draws.
//!
//! Every outline is in the shape's local frame; the tasks report where each
//! one sits on screen.

use std::f64::consts::{PI, TAU};

use crate::course::Path;
use crate::linspace;

pub type Vertex = (f64, f64);

/// Open polyline of one trough: an arc of the trough circle, lifted so its
/// lowest point sits at the origin, with a flat lip at either end.
pub fn trough_profile(full_angle: f64, width: f64, edge_width: f64, points: usize) -> Vec<Vertex> {
    let half = (0.5 * full_angle).to_radians();
    let radius = 0.5 * width / half.sin();
    let arc: Vec<Vertex> = linspace(-half, half, points)
        .into_iter()
        .map(|a| {
            let theta = 1.5 * PI + a;
            (radius * theta.cos(), radius * theta.sin() + radius)
        })
        .collect();

    let (Some(first), Some(last)) = (arc.first().copied(), arc.last().copied()) else {
        return arc;
    };
    let mut profile = Vec::with_capacity(arc.len() + 2);
    profile.push((first.0 - edge_width, first.1));
    profile.extend(arc);
    profile.push((last.0 + edge_width, last.1));
    profile
}

/// Lower semicircle used for one rolling band.
pub fn roll_band_outline(radius: f64, points: usize) -> Vec<Vertex> {
    linspace(PI, TAU, points)
        .into_iter()
        .map(|a| (radius * a.cos(), radius * a.sin()))
        .collect()
}

/// Closed ellipse shifted vertically by `offset`.
pub fn shadow_outline(
    radius: f64,
    offset: f64,
    xscale: f64,
    yscale: f64,
    points: usize,
) -> Vec<Vertex> {
    linspace(0.0, TAU, points)
        .into_iter()
        .map(|a| (xscale * radius * a.cos(), offset + yscale * radius * a.sin()))
        .collect()
}

/// Closed band of `angle_width` degrees centred on the course, wrapped onto
/// a trough circle of `radius`, with rounded caps at both ends.
///
/// `endcap_points` counts cap vertices including the two shared with the
/// band edges, so each cap adds `endcap_points - 2` vertices.
pub fn course_outline(path: &Path, radius: f64, angle_width: f64, endcap_points: usize) -> Vec<Vertex> {
    let samples = path.samples();
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Vec::new();
    };
    let half = 0.5 * angle_width;
    let left = |angle: f64| (angle - half).to_radians();
    let right = |angle: f64| (angle + half).to_radians();
    let cap = |from: f64, to: f64| -> Vec<f64> {
        let mut angles = linspace(from, to, endcap_points.max(2));
        angles.pop();
        angles.remove(0);
        angles
    };

    // (angle in radians, course position) in drawing order
    let mut ring: Vec<(f64, f64)> = Vec::with_capacity(2 * samples.len() + 2 * endcap_points);
    ring.extend(
        cap(right(first.angle), left(first.angle))
            .into_iter()
            .map(|a| (a, first.position)),
    );
    ring.extend(samples.iter().map(|s| (left(s.angle), s.position)));
    ring.extend(
        cap(left(last.angle), right(last.angle))
            .into_iter()
            .map(|a| (a, last.position)),
    );
    ring.extend(samples.iter().rev().map(|s| (right(s.angle), s.position)));

    ring.into_iter()
        .map(|(a, y)| (radius * a.sin(), y + radius * (1.0 - a.cos())))
        .collect()
}

/// Closed rounded rectangle. `width` and `height` measure the straight
/// sides; corners of `corner_rad` are added outside them.
pub fn rounded_rect_outline(
    width: f64,
    height: f64,
    corner_rad: f64,
    corner_points: usize,
) -> Vec<Vertex> {
    let circle = linspace(0.0, TAU, 4 * corner_points + 5);
    let run = corner_points + 2;
    let (hw, hh) = (0.5 * width, 0.5 * height);
    let quadrants = [(hw, hh), (-hw, hh), (-hw, -hh), (hw, -hh)];

    let mut outline = Vec::with_capacity(4 * run);
    for (k, (dx, dy)) in quadrants.into_iter().enumerate() {
        let start = k * (run - 1);
        outline.extend(
            circle[start..start + run]
                .iter()
                .map(|a| (corner_rad * a.cos() + dx, corner_rad * a.sin() + dy)),
        );
    }
    outline
}

/// Rounded rectangle bent so its sides converge on the centre of a circle of
/// `task_radius` below it.
pub fn wedge_outline(
    task_radius: f64,
    width: f64,
    height: f64,
    corner_rad: f64,
    corner_points: usize,
) -> Vec<Vertex> {
    rounded_rect_outline(width, height, corner_rad, corner_points)
        .into_iter()
        .map(|(x, y)| (x * (y / task_radius + 1.0), y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vertex, b: Vertex) -> bool {
        (a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12
    }

    #[test]
    fn trough_profile_has_lips_and_rests_on_origin() {
        let profile = trough_profile(60.0, 0.5, 0.04, 31);
        assert_eq!(profile.len(), 33);
        // Arc ends are half the width apart at the chord's height.
        assert!(close(profile[1], (-0.25, 0.5 - 0.5 * 30f64.to_radians().cos())));
        assert!(close(profile[0], (profile[1].0 - 0.04, profile[1].1)));
        assert!(close(profile[32], (profile[31].0 + 0.04, profile[31].1)));
        assert!(close(profile[16], (0.0, 0.0)));
    }

    #[test]
    fn roll_band_is_lower_half() {
        let band = roll_band_outline(0.04, 20);
        assert_eq!(band.len(), 20);
        assert!(close(band[0], (-0.04, 0.0)));
        assert!(band.iter().all(|&(_, y)| y <= 1e-12));
    }

    #[test]
    fn shadow_is_offset_ellipse() {
        let shadow = shadow_outline(0.04, -0.016, 0.9, 0.9, 30);
        assert_eq!(shadow.len(), 30);
        assert!(close(shadow[0], (0.036, -0.016)));
        assert!(close(shadow[0], shadow[29]));
    }

    #[test]
    fn rounded_rect_corners_sit_outside_sides() {
        let outline = rounded_rect_outline(0.2, 0.1, 0.01, 5);
        assert_eq!(outline.len(), 28);
        assert!(close(outline[0], (0.11, 0.05)));
        let max_x = outline.iter().map(|v| v.0).fold(f64::MIN, f64::max);
        let max_y = outline.iter().map(|v| v.1).fold(f64::MIN, f64::max);
        assert!((max_x - 0.11).abs() < 1e-12);
        assert!((max_y - 0.06).abs() < 1e-12);
    }

    #[test]
    fn wedge_narrows_toward_arc_centre() {
        let outline = wedge_outline(0.8, 0.2, 0.1, 0.0, 5);
        let top = outline.iter().filter(|v| v.1 > 0.0).map(|v| v.0.abs());
        let bottom = outline.iter().filter(|v| v.1 < 0.0).map(|v| v.0.abs());
        let top = top.fold(0.0, f64::max);
        let bottom = bottom.fold(0.0, f64::max);
        assert!(top > bottom);
        assert!((top - 0.1 * (0.05 / 0.8 + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn course_outline_wraps_band_with_caps() {
        let path = Path::build(&[(0.0, 0.0), (1.0, 20.0), (2.0, 0.0)], 0.5, 0.1).unwrap();
        let outline = course_outline(&path, 0.5, 15.0, 10);
        assert_eq!(outline.len(), 2 * path.samples().len() + 2 * 8);

        // The first left-edge vertex follows the bottom cap.
        let first_left = (-7.5f64).to_radians();
        assert!(close(
            outline[8],
            (0.5 * first_left.sin(), 0.5 * (1.0 - first_left.cos()))
        ));
        // The right edge closes the loop back at the bottom.
        let last = *outline.last().unwrap();
        assert!((last.0 - 0.5 * 7.5f64.to_radians().sin()).abs() < 1e-12);
    }
}
