//! Render-layer seam.
//!
//! A [`FrameSink`] receives the static scene once and then the task state
//! every frame. The headless build ships [`TraceSink`], which logs what a
//! display backend would draw.

use kinematics::shapes::{self, Vertex};
use kinematics::{MarbleTask, WedgeTask};
use taskconfig::MarbleConfig;
use warpmap::WarpGrid;

const TROUGH_POINTS: usize = 30;
const SHADOW_POINTS: usize = 30;
const BAND_POINTS: usize = 20;
const COURSE_ENDCAP_POINTS: usize = 10;
const SHADOW_DROP: f64 = 0.4;
const SHADOW_SCALE: f64 = 0.9;

/// Outlines for the marble task, built once before the first frame.
#[derive(Debug, Clone)]
pub struct MarbleScene {
    pub trough: Vec<Vertex>,
    pub course: Vec<Vertex>,
    pub shadow: Vec<Vertex>,
    pub roll_band: Vec<Vertex>,
}

impl MarbleScene {
    pub fn build(config: &MarbleConfig, task: &MarbleTask) -> Self {
        let rad = config.marble_rad;
        Self {
            trough: shapes::trough_profile(
                config.trough_full_angle,
                config.trough_width,
                config.trough_edge_width,
                TROUGH_POINTS,
            ),
            course: shapes::course_outline(
                task.course(),
                task.trough_radius(),
                config.course.angle_width,
                COURSE_ENDCAP_POINTS,
            ),
            shadow: shapes::shadow_outline(
                rad,
                -SHADOW_DROP * rad,
                SHADOW_SCALE,
                SHADOW_SCALE,
                SHADOW_POINTS,
            ),
            roll_band: shapes::roll_band_outline(rad, BAND_POINTS),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.trough.len() + self.course.len() + self.shadow.len() + self.roll_band.len()
    }
}

#[derive(Debug, Clone)]
pub struct WedgeScene {
    pub wedge: Vec<Vertex>,
    pub targets: Vec<Vec<Vertex>>,
}

impl WedgeScene {
    pub fn build(task: &WedgeTask) -> Self {
        Self {
            wedge: task.wedge_outline(),
            targets: task
                .targets()
                .iter()
                .map(|zone| zone.outline(task.radius()))
                .collect(),
        }
    }
}

pub trait FrameSink {
    fn begin_marble(&mut self, _scene: &MarbleScene) {}
    fn present_marble(&mut self, frame: u64, task: &MarbleTask);
    fn begin_wedge(&mut self, _scene: &WedgeScene) {}
    fn present_wedge(&mut self, frame: u64, task: &WedgeTask);
}

/// Logs each frame at trace level, mapping positions through the warp grid
/// when one is loaded.
#[derive(Debug, Default)]
pub struct TraceSink {
    warp: Option<WarpGrid>,
    outside_warned: bool,
}

impl TraceSink {
    pub fn new(warp: Option<WarpGrid>) -> Self {
        Self {
            warp,
            outside_warned: false,
        }
    }

    /// Screen position after the perspective warp.
    ///
    /// Task coordinates are in screen heights, so the visible screen spans
    /// half the grid's source range in each direction.
    pub fn project(&mut self, x: f64, y: f64) -> (f64, f64) {
        let Some(grid) = &self.warp else {
            return (x, y);
        };
        match grid.sample(2.0 * x, 2.0 * y) {
            Some(mapped) => mapped,
            None => {
                if !self.outside_warned {
                    tracing::warn!(x, y, "position outside the warp grid; drawing unwarped");
                    self.outside_warned = true;
                }
                (x, y)
            }
        }
    }
}

impl FrameSink for TraceSink {
    fn begin_marble(&mut self, scene: &MarbleScene) {
        tracing::debug!(
            vertices = scene.vertex_count(),
            course_vertices = scene.course.len(),
            warped = self.warp.is_some(),
            "marble scene ready"
        );
    }

    fn present_marble(&mut self, frame: u64, task: &MarbleTask) {
        let marble = *task.marble();
        let (x, y) = self.project(marble.x, marble.y);
        tracing::trace!(
            frame,
            x,
            y,
            angle = marble.angle,
            velocity = marble.velocity,
            course = task.course_offset(),
            "marble frame"
        );
    }

    fn begin_wedge(&mut self, scene: &WedgeScene) {
        tracing::debug!(
            wedge_vertices = scene.wedge.len(),
            targets = scene.targets.len(),
            "wedge scene ready"
        );
    }

    fn present_wedge(&mut self, frame: u64, task: &WedgeTask) {
        let wedge = *task.wedge();
        tracing::trace!(frame, x = wedge.x, y = wedge.y, ori = wedge.ori, "wedge frame");
    }
}
