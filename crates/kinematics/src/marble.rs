use std::f64::consts::{FRAC_PI_2, PI, TAU};

use taskconfig::{Hand, MarbleConfig};

use crate::course::{CourseError, Path};
use crate::device::{Channel, DeviceSample};
use crate::linspace;

/// Shadow orientation as a fraction of the marble angle.
pub const SHADOW_TILT: f64 = 0.4;
/// Fraction of the marble circumference that sweeps one roll-phase unit.
const ROLL_TRAVEL_FRACTION: f64 = 0.4;
/// Vertical screen offset of the course when the task starts.
pub const COURSE_START_OFFSET: f64 = -0.35;
/// Offset the course jumps back to on [`MarbleTask::reset_course`].
pub const COURSE_RESET_OFFSET: f64 = 0.5;

/// Folds a cyclic scalar back into `[-1, 1]` using a period of 2.
///
/// Values already in range are returned untouched.
pub fn wrap_unit(value: f64) -> f64 {
    if (-1.0..=1.0).contains(&value) {
        value
    } else {
        (value + 1.0).rem_euclid(2.0) - 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarbleState {
    /// Tilt in degrees after gain, neutral offset and hand mirroring.
    pub angle: f64,
    /// Angular velocity in degrees per second.
    pub velocity: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowState {
    pub x: f64,
    pub y: f64,
    /// Horizontal and vertical stretch applied to the shadow outline.
    pub scale: (f64, f64),
    /// Rotation in degrees.
    pub ori: f64,
}

/// One crescent band that fakes the marble's rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollBand {
    /// Cyclic phase in `[-1, 1]`; decreases as the marble rolls.
    pub phase: f64,
    /// Visible vertical scale of the band outline.
    pub height: f64,
    /// Rotation in degrees.
    pub ori: f64,
}

impl RollBand {
    fn at_phase(phase: f64) -> Self {
        Self {
            phase,
            height: band_height(phase),
            ori: 0.0,
        }
    }
}

/// Visible height of a band over one half-cycle of apparent rotation.
fn band_height(phase: f64) -> f64 {
    (FRAC_PI_2 - (phase - 1.0) * FRAC_PI_2).sin()
}

/// Marble, shadow, rolling bands, decorative troughs and the course offset.
///
/// Only [`MarbleTask::advance`] and [`MarbleTask::reset_course`] mutate this
/// state; the render layer reads it back through the accessors.
pub struct MarbleTask {
    channel: Channel,
    mirrored: bool,
    neutral_angle: f64,
    gain: f64,
    trough_speed: f64,
    trough_radius: f64,
    base_y: f64,
    roll_unit: f64,
    rota_coef: f64,
    marble: MarbleState,
    shadow: ShadowState,
    bands: Box<[RollBand]>,
    troughs: Box<[f64]>,
    course_offset: f64,
    course: Path,
}

impl MarbleTask {
    pub fn new(config: &MarbleConfig) -> Result<Self, CourseError> {
        let course = Path::build(
            &config.course.timed_targets(),
            config.trough_speed,
            config.course.step,
        )?;

        let trough_radius = trough_radius(config.trough_width, config.trough_full_angle);
        let circumference = TAU * config.marble_rad;
        let base_y = config.marble_base_ypos;

        let bands = (0..config.rolling_bands)
            .map(|i| RollBand::at_phase(1.0 - 2.0 * i as f64 / config.rolling_bands as f64))
            .collect();

        Ok(Self {
            channel: Channel::from(config.display_hand),
            mirrored: config.display_hand == Hand::Lh,
            neutral_angle: config.neutral_angle,
            gain: config.kb_angle_gain,
            trough_speed: config.trough_speed,
            trough_radius,
            base_y,
            roll_unit: ROLL_TRAVEL_FRACTION * circumference,
            rota_coef: config.marble_rota_coef,
            marble: MarbleState {
                angle: 0.0,
                velocity: 0.0,
                x: 0.0,
                y: base_y,
            },
            shadow: ShadowState {
                x: 0.0,
                y: base_y,
                scale: (1.0, 1.0),
                ori: 0.0,
            },
            bands,
            troughs: linspace(1.0, -1.0, config.trough_count).into_boxed_slice(),
            course_offset: COURSE_START_OFFSET,
            course,
        })
    }

    /// Advances one frame by `dt` seconds using the latest device sample.
    ///
    /// With `dt == 0` nothing scrolls or rolls, but the marble still follows
    /// the sample.
    pub fn advance(&mut self, dt: f64, sample: &DeviceSample) {
        debug_assert!(!(dt < 0.0), "frame delta must be non-negative, got {dt}");
        let dt = dt.max(0.0);

        self.scroll(dt);
        self.follow(sample);
        self.place_marble();
        self.cast_shadow();
        self.roll(dt);
    }

    /// Moves the course back to its restart position above the marble.
    pub fn reset_course(&mut self) {
        self.course_offset = COURSE_RESET_OFFSET;
    }

    pub fn marble(&self) -> &MarbleState {
        &self.marble
    }

    pub fn shadow(&self) -> &ShadowState {
        &self.shadow
    }

    pub fn roll_bands(&self) -> &[RollBand] {
        &self.bands
    }

    pub fn trough_offsets(&self) -> &[f64] {
        &self.troughs
    }

    pub fn course_offset(&self) -> f64 {
        self.course_offset
    }

    pub fn course(&self) -> &Path {
        &self.course
    }

    /// Radius of the arc the marble rides on, derived from the trough shape.
    pub fn trough_radius(&self) -> f64 {
        self.trough_radius
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    fn scroll(&mut self, dt: f64) {
        let travel = dt * self.trough_speed;
        self.course_offset -= travel;
        for offset in self.troughs.iter_mut() {
            *offset -= travel;
            if *offset < -1.0 {
                *offset = wrap_unit(*offset);
            }
        }
    }

    fn follow(&mut self, sample: &DeviceSample) {
        let reading = sample.channel(self.channel);
        let mut angle = (reading.angle - self.neutral_angle) * self.gain;
        let mut velocity = reading.velocity * self.gain;
        if self.mirrored {
            angle = -angle;
            velocity = -velocity;
        }
        self.marble.angle = angle;
        self.marble.velocity = velocity;
    }

    fn place_marble(&mut self) {
        let theta = self.marble.angle.to_radians();
        self.marble.x = self.trough_radius * theta.sin();
        self.marble.y = self.base_y + self.trough_radius * (1.0 - theta.cos());
    }

    fn cast_shadow(&mut self) {
        let lift = 1.0 - self.marble.angle.to_radians().cos();
        self.shadow = ShadowState {
            x: self.marble.x,
            y: self.marble.y,
            scale: (1.0, 1.0 + lift),
            ori: SHADOW_TILT * self.marble.angle,
        };
    }

    fn roll(&mut self, dt: f64) {
        let forward = self.trough_speed * dt / self.roll_unit;
        let lateral_distance = TAU * self.trough_radius * self.marble.velocity / 360.0 * dt;
        let lateral = lateral_distance / self.roll_unit;
        let travel = forward.hypot(lateral);
        let ori = self.rota_coef * self.marble.velocity;

        for band in self.bands.iter_mut() {
            let phase = band.phase - travel;
            band.phase = if phase < -1.0 { wrap_unit(phase) } else { phase };
            band.height = band_height(band.phase);
            band.ori = ori;
        }
    }
}

/// Radius of the circle through the trough's arc, given its mouth width and
/// full opening angle in degrees.
pub fn trough_radius(width: f64, full_angle: f64) -> f64 {
    0.5 * width / (0.5 * full_angle * PI / 180.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ChannelReading;

    fn config() -> MarbleConfig {
        MarbleConfig::default()
    }

    fn sample(right: (f64, f64), left: (f64, f64)) -> DeviceSample {
        DeviceSample::new(
            ChannelReading::new(right.0, right.1),
            ChannelReading::new(left.0, left.1),
        )
    }

    #[test]
    fn trough_radius_matches_sixty_degree_trough() {
        // A 60 degree chord of width w sits on a circle of radius w.
        assert!((trough_radius(0.5, 60.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn starts_at_rest_with_spread_troughs() {
        let task = MarbleTask::new(&config()).unwrap();
        assert_eq!(task.marble().y, -0.35);
        assert_eq!(task.course_offset(), COURSE_START_OFFSET);
        let troughs = task.trough_offsets();
        assert_eq!(troughs.len(), 8);
        assert_eq!(troughs[0], 1.0);
        assert_eq!(troughs[7], -1.0);
        assert_eq!(task.roll_bands()[0].phase, 1.0);
        assert!((task.roll_bands()[0].height - 1.0).abs() < 1e-12);
    }

    #[test]
    fn left_hand_reads_left_channel_and_mirrors() {
        let mut cfg = config();
        cfg.display_hand = Hand::Lh;
        cfg.neutral_angle = 5.0;
        cfg.kb_angle_gain = 2.0;
        let mut task = MarbleTask::new(&cfg).unwrap();
        task.advance(0.0, &sample((100.0, 100.0), (15.0, 4.0)));
        assert_eq!(task.marble().angle, -20.0);
        assert_eq!(task.marble().velocity, -8.0);
    }

    #[test]
    fn right_hand_reads_right_channel_unmirrored() {
        let mut cfg = config();
        cfg.display_hand = Hand::Rh;
        let mut task = MarbleTask::new(&cfg).unwrap();
        task.advance(0.0, &sample((12.0, 3.0), (-50.0, -50.0)));
        assert_eq!(task.marble().angle, 12.0);
        assert_eq!(task.marble().velocity, 3.0);
    }

    #[test]
    fn marble_rides_trough_arc() {
        let mut cfg = config();
        cfg.display_hand = Hand::Rh;
        let mut task = MarbleTask::new(&cfg).unwrap();
        let r = task.trough_radius();
        task.advance(0.0, &sample((30.0, 0.0), (0.0, 0.0)));
        let m = task.marble();
        assert!((m.x - r * 0.5).abs() < 1e-12);
        assert!((m.y - (-0.35 + r * (1.0 - 30f64.to_radians().cos()))).abs() < 1e-12);

        let shadow = task.shadow();
        assert_eq!((shadow.x, shadow.y), (m.x, m.y));
        assert!((shadow.ori - 12.0).abs() < 1e-12);
        assert!(shadow.scale.1 > 1.0);
    }

    #[test]
    fn zero_dt_updates_position_but_not_scroll() {
        let mut task = MarbleTask::new(&config()).unwrap();
        let troughs = task.trough_offsets().to_vec();
        let phase = task.roll_bands()[0].phase;
        task.advance(0.0, &sample((10.0, 90.0), (10.0, 90.0)));
        assert_eq!(task.trough_offsets(), troughs.as_slice());
        assert_eq!(task.course_offset(), COURSE_START_OFFSET);
        assert_eq!(task.roll_bands()[0].phase, phase);
        assert!(task.marble().x != 0.0);
    }

    #[test]
    fn scroll_moves_course_and_troughs_down() {
        let mut task = MarbleTask::new(&config()).unwrap();
        task.advance(0.4, &DeviceSample::default());
        assert!((task.course_offset() - (COURSE_START_OFFSET - 0.1)).abs() < 1e-12);
        assert!((task.trough_offsets()[0] - 0.9).abs() < 1e-12);
        // The lowest trough wrapped back to the top of the belt.
        assert!((task.trough_offsets()[7] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn course_does_not_wrap_until_reset() {
        let mut task = MarbleTask::new(&config()).unwrap();
        for _ in 0..100 {
            task.advance(0.1, &DeviceSample::default());
        }
        assert!(task.course_offset() < -1.0);
        task.reset_course();
        assert_eq!(task.course_offset(), COURSE_RESET_OFFSET);
    }

    #[test]
    fn forward_scroll_alone_rolls_the_marble() {
        let mut task = MarbleTask::new(&config()).unwrap();
        task.advance(0.1, &DeviceSample::default());
        let unit = ROLL_TRAVEL_FRACTION * TAU * config().marble_rad;
        let expected = 1.0 - 0.25 * 0.1 / unit;
        let band = task.roll_bands()[0];
        assert!((band.phase - expected).abs() < 1e-12);
        assert!((band.height - band_height(expected)).abs() < 1e-12);
    }

    #[test]
    fn wrap_tracked_values_stay_in_range() {
        let mut cfg = config();
        cfg.rolling_bands = 3;
        let mut task = MarbleTask::new(&cfg).unwrap();
        let dts = [0.016, 0.0, 0.5, 3.7, 0.033, 12.0, 0.001];
        for (i, dt) in dts.iter().cycle().take(500).enumerate() {
            let angle = (i as f64 * 0.37).sin() * 40.0;
            let velocity = (i as f64 * 0.11).cos() * 900.0;
            task.advance(*dt, &sample((angle, velocity), (angle, velocity)));
            assert!(task
                .trough_offsets()
                .iter()
                .all(|o| (-1.0..=1.0).contains(o)));
            assert!(task
                .roll_bands()
                .iter()
                .all(|b| (-1.0..=1.0).contains(&b.phase)));
        }
    }

    #[test]
    fn band_rotation_tracks_velocity() {
        let mut cfg = config();
        cfg.display_hand = Hand::Rh;
        cfg.marble_rota_coef = 0.5;
        let mut task = MarbleTask::new(&cfg).unwrap();
        task.advance(0.016, &sample((0.0, 40.0), (0.0, 0.0)));
        assert_eq!(task.roll_bands()[0].ori, 20.0);
    }

    #[test]
    fn wrap_unit_folds_with_period_two() {
        assert_eq!(wrap_unit(0.3), 0.3);
        assert_eq!(wrap_unit(1.0), 1.0);
        assert!((wrap_unit(-1.5) - 0.5).abs() < 1e-12);
        assert!((wrap_unit(-5.25) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn invalid_course_is_reported() {
        let mut cfg = config();
        cfg.course.lead_spacing = 2.0;
        assert!(matches!(
            MarbleTask::new(&cfg),
            Err(CourseError::InvalidWaypoints(_))
        ));
    }
}
