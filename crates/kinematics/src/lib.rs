//! Per-frame state for the marble and wedge motor-control tasks.
//!
//! The frame loop owned by the binary drives everything here:
//!
//! ```text
//!   FrameClock::tick ──▶ dt ─┐
//!                            ├─▶ MarbleTask::advance ──▶ render sink
//!   DeviceSource::poll ─▶ SampleLatch ─┘
//! ```
//!
//! [`course::Path`] is built once when a [`marble::MarbleTask`] is created and
//! then scrolls with the troughs. [`shapes`] holds the static vertex outlines
//! the render layer draws at the positions reported by the tasks.

pub mod clock;
pub mod course;
pub mod device;
pub mod marble;
pub mod shapes;
pub mod wedge;

pub use clock::{BoxedTimeSource, FrameClock, ScriptedTimeSource, SystemTimeSource, TimeSource};
pub use course::{CourseError, MonotoneCubic, Path, PathSample, Waypoint};
pub use device::{
    Channel, ChannelReading, DeviceError, DeviceSample, DeviceSource, SampleLatch,
    ScriptedDevice, SimulatedDevice,
};
pub use marble::{wrap_unit, MarbleState, MarbleTask, RollBand, ShadowState};
pub use wedge::{
    ArcPlacement, Direction, KeyAction, KeyEvent, KeyState, TargetZone, TaskKey, WedgeTask,
};

/// Evenly spaced samples over `[start, end]`, endpoints included.
pub(crate) fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
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
    }
}
