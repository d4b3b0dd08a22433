//! Boundary with the hand-control device.
//!
//! The physical driver lives outside this crate; the task only needs a
//! [`DeviceSource`] that yields one [`DeviceSample`] per frame.

use std::collections::VecDeque;
use std::f64::consts::TAU;

use taskconfig::{Hand, ModeCommand};

use crate::clock::BoxedTimeSource;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    #[error("device unavailable: {0}")]
    Unavailable(String),
}

/// Physical source on the device. The discriminant is the sample index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Right = 0,
    Left = 1,
}

impl Channel {
    pub fn index(self) -> usize {
        self as usize
    }
}

impl From<Hand> for Channel {
    fn from(hand: Hand) -> Self {
        match hand {
            Hand::Lh => Channel::Left,
            Hand::Rh => Channel::Right,
        }
    }
}

/// Angle (degrees) and angular velocity (degrees/second) of one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelReading {
    pub angle: f64,
    pub velocity: f64,
}

impl ChannelReading {
    pub fn new(angle: f64, velocity: f64) -> Self {
        Self { angle, velocity }
    }
}

/// One poll of both device channels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceSample {
    channels: [ChannelReading; 2],
}

impl DeviceSample {
    pub fn new(right: ChannelReading, left: ChannelReading) -> Self {
        Self {
            channels: [right, left],
        }
    }

    /// Sample with the same reading on both channels.
    pub fn uniform(reading: ChannelReading) -> Self {
        Self::new(reading, reading)
    }

    pub fn channel(&self, channel: Channel) -> ChannelReading {
        self.channels[channel.index()]
    }
}

pub trait DeviceSource {
    /// Forwards a session mode to the device. Called once before the first poll.
    fn send_command(&mut self, command: &ModeCommand) -> Result<(), DeviceError>;

    /// Returns the newest sample, or `None` when nothing arrived since the
    /// previous poll. Must not block.
    fn poll(&mut self) -> Result<Option<DeviceSample>, DeviceError>;
}

/// Keeps the most recent good sample so the frame loop always has one.
///
/// Empty polls and device errors both hold the previous sample. An outage is
/// logged once when it starts and once when samples resume.
#[derive(Debug, Default)]
pub struct SampleLatch {
    last: DeviceSample,
    outage: bool,
}

impl SampleLatch {
    pub fn new(initial: DeviceSample) -> Self {
        Self {
            last: initial,
            outage: false,
        }
    }

    pub fn update(&mut self, polled: Result<Option<DeviceSample>, DeviceError>) -> &DeviceSample {
        match polled {
            Ok(Some(sample)) => {
                if self.outage {
                    tracing::info!("device samples resumed");
                    self.outage = false;
                }
                self.last = sample;
            }
            Ok(None) => {}
            Err(err) => {
                if !self.outage {
                    tracing::warn!(error = %err, "holding last device sample");
                    self.outage = true;
                }
            }
        }
        &self.last
    }

    pub fn last(&self) -> &DeviceSample {
        &self.last
    }

    pub fn in_outage(&self) -> bool {
        self.outage
    }
}

/// Stand-in device that sweeps both channels sinusoidally.
///
/// The left channel mirrors the right one, matching a device running in a
/// mirrored mode. Useful for running the task headless without hardware.
pub struct SimulatedDevice {
    amplitude: f64,
    period: f64,
    clock: BoxedTimeSource,
    commands: Vec<ModeCommand>,
}

impl SimulatedDevice {
    pub fn new(amplitude: f64, period: f64, mut clock: BoxedTimeSource) -> Self {
        clock.reset();
        Self {
            amplitude,
            period: period.max(f64::EPSILON),
            clock,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[ModeCommand] {
        &self.commands
    }

    fn reading_at(&self, t: f64) -> ChannelReading {
        let omega = TAU / self.period;
        ChannelReading::new(
            self.amplitude * (omega * t).sin(),
            self.amplitude * omega * (omega * t).cos(),
        )
    }
}

impl DeviceSource for SimulatedDevice {
    fn send_command(&mut self, command: &ModeCommand) -> Result<(), DeviceError> {
        self.commands.push(command.clone());
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<DeviceSample>, DeviceError> {
        let t = self.clock.now();
        let right = self.reading_at(t);
        let left = ChannelReading::new(-right.angle, -right.velocity);
        Ok(Some(DeviceSample::new(right, left)))
    }
}

/// Replays a fixed sequence of poll results, then reports no new data.
#[derive(Debug, Default)]
pub struct ScriptedDevice {
    script: VecDeque<Result<Option<DeviceSample>, DeviceError>>,
    commands: Vec<ModeCommand>,
}

impl ScriptedDevice {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Result<Option<DeviceSample>, DeviceError>>,
    {
        Self {
            script: script.into_iter().collect(),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[ModeCommand] {
        &self.commands
    }
}

impl DeviceSource for ScriptedDevice {
    fn send_command(&mut self, command: &ModeCommand) -> Result<(), DeviceError> {
        self.commands.push(command.clone());
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<DeviceSample>, DeviceError> {
        self.script.pop_front().unwrap_or(Ok(None))
    }
}
