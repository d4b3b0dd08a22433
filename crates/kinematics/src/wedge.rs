use taskconfig::WedgeConfig;

use crate::shapes;

/// Corner points per rounded corner when outlining wedge shapes.
pub const CORNER_POINTS: usize = 5;

/// Rotation sense derived from the two held keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Left = -1,
    #[default]
    Neutral = 0,
    Right = 1,
}

impl Direction {
    /// Holding both keys, or neither, is neutral. There is no last-winner rule.
    pub fn from_keys(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, false) => Direction::Left,
            (false, true) => Direction::Right,
            _ => Direction::Neutral,
        }
    }

    pub fn sign(self) -> f64 {
        self as i8 as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKey {
    Left,
    Right,
}

impl TaskKey {
    /// Maps the operator keyboard layout: `a` turns left, `d` turns right.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "a" => Some(TaskKey::Left),
            "d" => Some(TaskKey::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: TaskKey,
    pub action: KeyAction,
}

impl KeyEvent {
    pub fn press(key: TaskKey) -> Self {
        Self {
            key,
            action: KeyAction::Press,
        }
    }

    pub fn release(key: TaskKey) -> Self {
        Self {
            key,
            action: KeyAction::Release,
        }
    }
}

/// Held/released flags for the two task keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    left: bool,
    right: bool,
}

impl KeyState {
    pub fn apply(&mut self, event: KeyEvent) {
        let held = event.action == KeyAction::Press;
        match event.key {
            TaskKey::Left => self.left = held,
            TaskKey::Right => self.right = held,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::from_keys(self.left, self.right)
    }
}

/// Screen pose of something riding the task arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPlacement {
    pub x: f64,
    pub y: f64,
    /// Orientation in degrees; zero is straight up.
    pub ori: f64,
}

impl ArcPlacement {
    /// Places an item on a circle of `radius` whose top touches the origin.
    pub fn on_arc(radius: f64, ori: f64) -> Self {
        let theta = ori.to_radians();
        Self {
            x: radius * theta.sin(),
            y: -radius + radius * theta.cos(),
            ori,
        }
    }
}

/// A static target drawn on the arc.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetZone {
    pub placement: ArcPlacement,
    pub width: f64,
    pub height: f64,
    pub corner_rad: f64,
}

impl TargetZone {
    /// Outline in the zone's local frame, bent to follow the arc.
    pub fn outline(&self, task_radius: f64) -> Vec<(f64, f64)> {
        shapes::wedge_outline(
            task_radius,
            self.width - 2.0 * self.corner_rad,
            self.height - 2.0 * self.corner_rad,
            self.corner_rad,
            CORNER_POINTS,
        )
    }
}

/// Chord width spanned by `degrees` of arc on a circle of `radius`.
fn chord(radius: f64, degrees: f64) -> f64 {
    2.0 * radius * (degrees.to_radians() / 2.0).sin()
}

/// Keyboard-steered wedge that rotates around a fixed arc.
pub struct WedgeTask {
    radius: f64,
    rotation_speed: f64,
    orientation: f64,
    wedge: ArcPlacement,
    wedge_width: f64,
    wedge_height: f64,
    wedge_corner_rad: f64,
    targets: Vec<TargetZone>,
}

impl WedgeTask {
    pub fn new(config: &WedgeConfig) -> Self {
        let radius = config.task_radius;
        let target_width = chord(radius, config.target_size + config.wedge_size);
        let targets = config
            .target_pos
            .iter()
            .map(|&ori| TargetZone {
                placement: ArcPlacement::on_arc(radius, ori),
                width: target_width,
                height: config.target_height,
                corner_rad: config.target_corner_rad,
            })
            .collect();

        Self {
            radius,
            rotation_speed: config.rotation_speed,
            orientation: 0.0,
            wedge: ArcPlacement::on_arc(radius, 0.0),
            wedge_width: chord(radius, config.wedge_size),
            wedge_height: config.wedge_height,
            wedge_corner_rad: config.wedge_corner_rad,
            targets,
        }
    }

    pub fn advance(&mut self, dt: f64, direction: Direction) {
        debug_assert!(!(dt < 0.0), "frame delta must be non-negative, got {dt}");
        let dt = dt.max(0.0);
        self.orientation += self.rotation_speed * direction.sign() * dt;
        self.wedge = ArcPlacement::on_arc(self.radius, self.orientation);
    }

    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    pub fn wedge(&self) -> &ArcPlacement {
        &self.wedge
    }

    pub fn wedge_width(&self) -> f64 {
        self.wedge_width
    }

    pub fn targets(&self) -> &[TargetZone] {
        &self.targets
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn wedge_outline(&self) -> Vec<(f64, f64)> {
        shapes::wedge_outline(
            self.radius,
            self.wedge_width - 2.0 * self.wedge_corner_rad,
            self.wedge_height - 2.0 * self.wedge_corner_rad,
            self.wedge_corner_rad,
            CORNER_POINTS,
        )
    }
}
