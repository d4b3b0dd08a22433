//! Dense course trajectories built from sparse timed targets.

/// Tolerance when comparing the fixed-step samples against the final position.
const STEP_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CourseError {
    #[error("invalid waypoints: {0}")]
    InvalidWaypoints(String),
    #[error("invalid sampling: {0}")]
    InvalidSampling(String),
}

/// A target angle (degrees) to be reached at `time` seconds into the course.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub time: f64,
    pub angle: f64,
}

impl From<(f64, f64)> for Waypoint {
    fn from((time, angle): (f64, f64)) -> Self {
        Self { time, angle }
    }
}

/// Shape-preserving piecewise cubic Hermite interpolant.
///
/// Knot derivatives use the Fritsch–Carlson weighted harmonic mean, so the
/// curve is monotone wherever the data is and never leaves the range of the
/// two knots bracketing it.
#[derive(Debug, Clone, PartialEq)]
pub struct MonotoneCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubic {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, CourseError> {
        if xs.len() != ys.len() {
            return Err(CourseError::InvalidWaypoints(format!(
                "{} positions but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(CourseError::InvalidWaypoints(
                "at least two waypoints are required".into(),
            ));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(CourseError::InvalidWaypoints(
                "waypoints must be finite".into(),
            ));
        }
        if let Some(index) = xs.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(CourseError::InvalidWaypoints(format!(
                "waypoint {} does not come strictly after waypoint {}",
                index + 1,
                index
            )));
        }

        let slopes = knot_slopes(&xs, &ys);
        Ok(Self { xs, ys, slopes })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Evaluates the curve, clamping `x` into the knot range.
    pub fn evaluate(&self, x: f64) -> f64 {
        let (lo, hi) = self.domain();
        if x <= lo {
            return self.ys[0];
        }
        if x >= hi {
            return self.ys[self.ys.len() - 1];
        }

        let k = self.xs.partition_point(|&knot| knot <= x) - 1;
        let h = self.xs[k + 1] - self.xs[k];
        let t = (x - self.xs[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.ys[k]
            + h10 * h * self.slopes[k]
            + h01 * self.ys[k + 1]
            + h11 * h * self.slopes[k + 1]
    }
}

fn knot_slopes(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = ys
        .windows(2)
        .zip(&h)
        .map(|(w, step)| (w[1] - w[0]) / step)
        .collect();

    if n == 2 {
        return vec![delta[0], delta[0]];
    }

    let mut slopes = vec![0.0; n];
    for k in 1..n - 1 {
        let (d0, d1) = (delta[k - 1], delta[k]);
        if d0 == 0.0 || d1 == 0.0 || d0.signum() != d1.signum() {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        slopes[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
    }

    slopes[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    slopes[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    slopes
}

/// One-sided three-point estimate at an end knot, limited to keep the shape.
fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let slope = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if slope.signum() != d0.signum() || d0 == 0.0 {
        0.0
    } else if d0.signum() != d1.signum() && slope.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        slope
    }
}

/// One dense sample of the course: lateral angle at a scroll position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub position: f64,
    pub angle: f64,
}

/// Immutable dense course, sampled at a fixed step along the scroll axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    curve: MonotoneCubic,
    samples: Vec<PathSample>,
}

impl Path {
    /// Maps each waypoint time to a scroll position (`time * speed`), fits the
    /// monotone interpolant through them and samples it every `step`, from the
    /// first position to the last one inclusive. When the span is not a whole
    /// number of steps the final position is appended as a shorter last step.
    pub fn build<W>(waypoints: &[W], speed: f64, step: f64) -> Result<Self, CourseError>
    where
        W: Copy + Into<Waypoint>,
    {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(CourseError::InvalidSampling(format!(
                "speed must be positive (got {speed})"
            )));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(CourseError::InvalidSampling(format!(
                "step must be positive (got {step})"
            )));
        }

        let (xs, ys): (Vec<f64>, Vec<f64>) = waypoints
            .iter()
            .map(|&w| {
                let w: Waypoint = w.into();
                (w.time * speed, w.angle)
            })
            .unzip();
        let curve = MonotoneCubic::new(xs, ys)?;

        let (first, last) = curve.domain();
        let count = ((last - first) / step + STEP_SLACK).floor() as usize + 1;
        let mut samples: Vec<PathSample> = (0..count)
            .map(|i| {
                let position = (first + i as f64 * step).min(last);
                PathSample {
                    position,
                    angle: curve.evaluate(position),
                }
            })
            .collect();
        if samples
            .last()
            .is_some_and(|sample| last - sample.position > STEP_SLACK)
        {
            samples.push(PathSample {
                position: last,
                angle: curve.evaluate(last),
            });
        }

        Ok(Self { curve, samples })
    }

    pub fn samples(&self) -> &[PathSample] {
        &self.samples
    }

    /// Angle of the underlying curve at an arbitrary scroll position.
    pub fn angle_at(&self, position: f64) -> f64 {
        self.curve.evaluate(position)
    }

    /// Scroll distance from the first to the last waypoint.
    pub fn span(&self) -> f64 {
        let (first, last) = self.curve.domain();
        last - first
    }
}
