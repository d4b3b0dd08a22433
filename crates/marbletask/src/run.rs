use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use kinematics::{
    DeviceSource, FrameClock, KeyState, MarbleTask, SampleLatch, SimulatedDevice,
    SystemTimeSource, WedgeTask,
};
use taskconfig::{MarbleConfig, WarpProfile, WedgeConfig};
use tracing_subscriber::EnvFilter;
use warpmap::WarpGrid;

use crate::cli::{PacingArgs, RunArgs, WarpArgs, WedgeArgs};
use crate::control::{ControlSignal, ControlThread};
use crate::paths::{AppPaths, WARP_ASSET};
use crate::sink::{FrameSink, MarbleScene, TraceSink, WedgeScene};

/// Frames between frame-time summaries in the debug log.
const SUMMARY_INTERVAL: u64 = 300;
/// Peak tilt of the simulated hand device, in degrees.
const SIMULATED_AMPLITUDE: f64 = 30.0;
/// Seconds per full sweep of the simulated hand device.
const SIMULATED_PERIOD: f64 = 4.0;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover();
    let config: MarbleConfig = load_profile(&paths, &args.config)?;

    let warp = if args.perspective {
        None
    } else {
        Some(load_warp(&paths)?)
    };

    let mut task = MarbleTask::new(&config).context("failed to build the course")?;
    let mut device = SimulatedDevice::new(
        SIMULATED_AMPLITUDE,
        SIMULATED_PERIOD,
        Box::new(SystemTimeSource::new()),
    );
    match device.send_command(&config.device_mode) {
        Ok(()) => tracing::info!(command = config.device_mode.as_str(), "device mode sent"),
        Err(err) => tracing::warn!(error = %err, "device did not accept mode command"),
    }

    tracing::info!(
        profile = %args.config,
        hand = %config.display_hand,
        channel = ?task.channel(),
        width = config.screen_width,
        height = config.screen_height,
        fullscreen = args.fullscreen,
        warped = warp.is_some(),
        course_samples = task.course().samples().len(),
        "starting marble task"
    );

    let mut sink = TraceSink::new(warp);
    sink.begin_marble(&MarbleScene::build(&config, &task));

    let control = ControlThread::stdin()?;
    let mut clock = FrameClock::system();
    let frames = drive_marble(
        &mut task,
        &mut device,
        &mut clock,
        control.receiver(),
        &mut sink,
        LoopLimits::from(args.pacing),
    );
    tracing::info!(frames, mean_frame_ms = clock.mean_frame_ms(), "marble task finished");
    Ok(())
}

pub fn run_wedge(args: WedgeArgs) -> Result<()> {
    let paths = AppPaths::discover();
    let config: WedgeConfig = load_profile(&paths, &args.config)?;
    let mut task = WedgeTask::new(&config);

    tracing::info!(
        profile = %args.config,
        width = config.screen_width,
        height = config.screen_height,
        fullscreen = args.fullscreen,
        targets = task.targets().len(),
        "starting wedge task"
    );

    let mut sink = TraceSink::new(None);
    sink.begin_wedge(&WedgeScene::build(&task));

    let control = ControlThread::stdin()?;
    let mut clock = FrameClock::system();
    let frames = drive_wedge(
        &mut task,
        &mut clock,
        control.receiver(),
        &mut sink,
        LoopLimits::from(args.pacing),
    );
    tracing::info!(
        frames,
        orientation = task.orientation(),
        mean_frame_ms = clock.mean_frame_ms(),
        "wedge task finished"
    );
    Ok(())
}

pub fn run_warp(args: WarpArgs) -> Result<()> {
    let paths = AppPaths::discover();
    let profile = match args.profile.as_deref() {
        Some(name) => load_profile(&paths, name)?,
        None => WarpProfile::default(),
    };

    let grid = warpmap::build_warp(
        &profile.source.corners(),
        &profile.target.corners(),
        profile.grid_width,
        profile.grid_height,
    )
    .context("failed to build the perspective warp")?;

    let output = args
        .output
        .unwrap_or_else(|| paths.config_dir().join(WARP_ASSET));
    grid.save(&output)
        .with_context(|| format!("failed to write warp grid to {}", output.display()))?;

    tracing::info!(
        path = %output.display(),
        width = grid.width(),
        height = grid.height(),
        "warp asset written"
    );
    println!(
        "Wrote {}x{} warp grid to {}",
        grid.width(),
        grid.height(),
        output.display()
    );
    Ok(())
}

fn load_profile<T: taskconfig::Profile>(paths: &AppPaths, name: &str) -> Result<T> {
    let path = paths.profile(name);
    tracing::debug!(path = %path.display(), roots = ?paths.roots(), "resolved profile");
    taskconfig::load(&path).with_context(|| format!("failed to load profile '{name}'"))
}

fn load_warp(paths: &AppPaths) -> Result<WarpGrid> {
    let path = paths.warp_asset();
    let grid = WarpGrid::load(&path).with_context(|| {
        format!(
            "failed to read warp grid {}; run `marbletask warp` to create it or pass --perspective",
            path.display()
        )
    })?;
    tracing::debug!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        "loaded warp grid"
    );
    Ok(grid)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopLimits {
    pub frame_period: Option<Duration>,
    pub max_frames: Option<u64>,
}

impl From<PacingArgs> for LoopLimits {
    fn from(args: PacingArgs) -> Self {
        Self {
            frame_period: Some(Duration::from_secs_f64(1.0 / args.fps)),
            max_frames: args.frames,
        }
    }
}

/// Sleeps until the next frame slot, standing in for a blocking buffer flip.
struct FramePacer {
    period: Duration,
    next: Instant,
}

impl FramePacer {
    fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            // Late: restart the schedule from now.
            self.next = now + self.period;
        }
    }
}

/// Outcome of draining the control channel before a frame.
enum Drained {
    Continue,
    Stop,
}

fn drain<F>(signals: &Receiver<ControlSignal>, mut on_signal: F) -> Drained
where
    F: FnMut(ControlSignal),
{
    for signal in signals.try_iter() {
        if signal == ControlSignal::Stop {
            tracing::info!("stop requested");
            return Drained::Stop;
        }
        on_signal(signal);
    }
    Drained::Continue
}

/// Runs the marble frame loop until a stop signal or the frame limit.
/// Returns the number of frames presented.
pub fn drive_marble<D, S>(
    task: &mut MarbleTask,
    device: &mut D,
    clock: &mut FrameClock,
    signals: &Receiver<ControlSignal>,
    sink: &mut S,
    limits: LoopLimits,
) -> u64
where
    D: DeviceSource,
    S: FrameSink,
{
    let mut latch = SampleLatch::default();
    let mut pacer = limits.frame_period.map(FramePacer::new);
    let mut frames = 0;

    while limits.max_frames.map_or(true, |max| frames < max) {
        let drained = drain(signals, |signal| match signal {
            ControlSignal::ResetCourse => {
                task.reset_course();
                tracing::info!(offset = task.course_offset(), "course reset");
            }
            ControlSignal::Key(event) => tracing::debug!(?event, "key ignored by marble task"),
            ControlSignal::Stop => {}
        });
        if let Drained::Stop = drained {
            break;
        }

        let dt = clock.tick();
        let sample = *latch.update(device.poll());
        task.advance(dt, &sample);
        sink.present_marble(clock.frame_index(), task);
        frames += 1;
        log_summary(frames, clock);

        if let Some(pacer) = pacer.as_mut() {
            pacer.wait();
        }
    }
    frames
}

/// Runs the wedge frame loop until a stop signal or the frame limit.
/// Returns the number of frames presented.
pub fn drive_wedge<S: FrameSink>(
    task: &mut WedgeTask,
    clock: &mut FrameClock,
    signals: &Receiver<ControlSignal>,
    sink: &mut S,
    limits: LoopLimits,
) -> u64 {
    let mut keys = KeyState::default();
    let mut pacer = limits.frame_period.map(FramePacer::new);
    let mut frames = 0;

    while limits.max_frames.map_or(true, |max| frames < max) {
        let drained = drain(signals, |signal| {
            if let ControlSignal::Key(event) = signal {
                keys.apply(event);
            }
        });
        if let Drained::Stop = drained {
            break;
        }

        let dt = clock.tick();
        task.advance(dt, keys.direction());
        sink.present_wedge(clock.frame_index(), task);
        frames += 1;
        log_summary(frames, clock);

        if let Some(pacer) = pacer.as_mut() {
            pacer.wait();
        }
    }
    frames
}

fn log_summary(frames: u64, clock: &FrameClock) {
    if frames % SUMMARY_INTERVAL == 0 {
        tracing::debug!(
            frames,
            elapsed = clock.elapsed(),
            mean_frame_ms = clock.mean_frame_ms(),
            "frame time"
        );
    }
}
