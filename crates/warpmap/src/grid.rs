use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::WarpError;

/// Column names written as the first row of the grid asset.
pub const HEADER: [&str; 5] = ["source_x", "source_y", "mapped_u", "mapped_v", "weight"];

/// One lattice sample of the correction grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpPoint {
    pub source: (f64, f64),
    pub mapped: (f64, f64),
    /// Blend weight, reserved for vignetting. Always one when freshly built.
    pub weight: f64,
}

/// Dense perspective correction sampled on a regular lattice.
///
/// Points are stored row by row: `y` advances between rows and `x` varies
/// fastest within a row, so index `row * width + col` addresses a sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpGrid {
    width: usize,
    height: usize,
    points: Vec<WarpPoint>,
}

impl WarpGrid {
    pub(crate) fn from_points(
        width: usize,
        height: usize,
        points: Vec<WarpPoint>,
    ) -> Result<Self, WarpError> {
        if width == 0 || height == 0 {
            return Err(WarpError::EmptyGrid);
        }
        if points.len() != width * height {
            return Err(WarpError::Shape {
                expected: width * height,
                found: points.len(),
            });
        }
        Ok(Self {
            width,
            height,
            points,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn points(&self) -> &[WarpPoint] {
        &self.points
    }

    pub fn point(&self, col: usize, row: usize) -> Option<&WarpPoint> {
        if col >= self.width || row >= self.height {
            return None;
        }
        self.points.get(row * self.width + col)
    }

    /// Source-space rectangle covered by the lattice as `(min, max)` corners.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        let first = self.points[0].source;
        let last = self.points[self.points.len() - 1].source;
        (first, last)
    }

    /// Bilinearly interpolates the mapped coordinate for an arbitrary source
    /// point. Returns `None` outside the lattice bounds.
    pub fn sample(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let ((x0, y0), (x1, y1)) = self.bounds();
        let (c0, c1, tx) = cell(x, x0, x1, self.width)?;
        let (r0, r1, ty) = cell(y, y0, y1, self.height)?;

        let at = |col: usize, row: usize| self.points[row * self.width + col].mapped;
        let lerp = |a: (f64, f64), b: (f64, f64), t: f64| {
            (a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t)
        };

        let bottom = lerp(at(c0, r0), at(c1, r0), tx);
        let top = lerp(at(c0, r1), at(c1, r1), tx);
        Some(lerp(bottom, top, ty))
    }

    /// Writes the grid as tab-separated text with a header row.
    pub fn write_tsv<W: Write>(&self, mut out: W) -> Result<(), WarpError> {
        writeln!(out, "{}", HEADER.join("\t"))?;
        for p in &self.points {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                p.source.0, p.source.1, p.mapped.0, p.mapped.1, p.weight
            )?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), WarpError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.write_tsv(BufWriter::new(file))?;
        tracing::debug!(
            path = %path.display(),
            width = self.width,
            height = self.height,
            "wrote warp grid"
        );
        Ok(())
    }

    /// Reads a grid previously produced by [`WarpGrid::write_tsv`].
    ///
    /// The lattice width is recovered from the length of the first row, that
    /// is the number of leading samples sharing the first `source_y`.
    pub fn read_tsv<R: Read>(input: R) -> Result<Self, WarpError> {
        let reader = BufReader::new(input);
        let mut points = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let number = index + 1;
            if index == 0 || line.trim().is_empty() {
                continue;
            }

            let fields = line
                .split('\t')
                .map(|field| field.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| WarpError::Parse {
                    line: number,
                    message: err.to_string(),
                })?;

            let &[sx, sy, u, v, weight] = fields.as_slice() else {
                return Err(WarpError::Parse {
                    line: number,
                    message: format!("expected 5 columns, found {}", fields.len()),
                });
            };

            points.push(WarpPoint {
                source: (sx, sy),
                mapped: (u, v),
                weight,
            });
        }

        let first_y = points.first().ok_or(WarpError::EmptyGrid)?.source.1;
        let width = points
            .iter()
            .take_while(|p| p.source.1 == first_y)
            .count();
        let height = points.len() / width;
        Self::from_points(width, height, points)
    }

    pub fn load(path: &Path) -> Result<Self, WarpError> {
        let file = File::open(path)?;
        Self::read_tsv(file)
    }
}

/// Locates `value` within `count` evenly spaced samples on `[lo, hi]`,
/// returning the bracketing indices and the fractional position between them.
fn cell(value: f64, lo: f64, hi: f64, count: usize) -> Option<(usize, usize, f64)> {
    if count == 1 || hi == lo {
        return ((value - lo).abs() < 1e-12).then_some((0, 0, 0.0));
    }
    let span = hi - lo;
    let pos = (value - lo) / span * (count - 1) as f64;
    if !(0.0..=(count - 1) as f64).contains(&pos) {
        return None;
    }
    let i0 = (pos.floor() as usize).min(count - 2);
    Some((i0, i0 + 1, pos - i0 as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_warp;
    use tempfile::TempDir;

    const UNIT: crate::Quad = [(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)];
    const SHIFTED: crate::Quad = [(1.0, 2.0), (1.0, 3.0), (2.0, 3.0), (2.0, 2.0)];

    #[test]
    fn tsv_round_trip_preserves_layout() {
        let grid = build_warp(&UNIT, &SHIFTED, 4, 3).unwrap();
        let mut buffer = Vec::new();
        grid.write_tsv(&mut buffer).unwrap();

        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.starts_with("source_x\tsource_y\tmapped_u\tmapped_v\tweight\n"));
        assert_eq!(text.lines().count(), 1 + 12);

        let reloaded = WarpGrid::read_tsv(buffer.as_slice()).unwrap();
        assert_eq!(reloaded.width(), 4);
        assert_eq!(reloaded.height(), 3);
        assert_eq!(reloaded, grid);
    }

    #[test]
    fn sample_interpolates_between_lattice_points() {
        let grid = build_warp(&UNIT, &SHIFTED, 3, 3).unwrap();
        let (u, v) = grid.sample(0.25, 0.75).unwrap();
        assert!((u - 1.25).abs() < 1e-9);
        assert!((v - 2.75).abs() < 1e-9);
        assert!(grid.sample(1.5, 0.5).is_none());
    }

    #[test]
    fn rejects_short_rows() {
        let text = "source_x\tsource_y\tmapped_u\tmapped_v\tweight\n0\t0\t0\t0\n";
        let err = WarpGrid::read_tsv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, WarpError::Parse { line: 2, .. }));
    }

    #[test]
    fn rejects_ragged_lattice() {
        let text = "h\n0\t0\t0\t0\t1\n1\t0\t1\t0\t1\n0\t1\t0\t1\t1\n";
        let err = WarpGrid::read_tsv(text.as_bytes()).unwrap_err();
        assert!(matches!(err, WarpError::Shape { .. }));
    }

    #[test]
    fn save_and_load_from_disk() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("nested/perspective.data");
        let grid = build_warp(&UNIT, &SHIFTED, 2, 2).unwrap();
        grid.save(&path).unwrap();
        let loaded = WarpGrid::load(&path).unwrap();
        assert_eq!(loaded.points().len(), 4);
        let (u, v) = loaded.point(1, 1).unwrap().mapped;
        assert!((u - 2.0).abs() < 1e-9 && (v - 3.0).abs() < 1e-9);
    }
}
