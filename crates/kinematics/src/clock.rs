use std::collections::VecDeque;
use std::time::Instant;

/// Number of recent frame durations kept for the frame-time readout.
pub const FRAME_HISTORY: usize = 100;

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Seconds elapsed since the source was created or last reset.
    fn now(&mut self) -> f64;
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Time source backed by the system monotonic clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    /// Creates a system time source initialised to `Instant::now()`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
    }

    fn now(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Time source that replays a fixed list of timestamps, then holds the last.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTimeSource {
    pending: VecDeque<f64>,
    current: f64,
}

impl ScriptedTimeSource {
    pub fn new<I: IntoIterator<Item = f64>>(times: I) -> Self {
        Self {
            pending: times.into_iter().collect(),
            current: 0.0,
        }
    }
}

impl TimeSource for ScriptedTimeSource {
    fn reset(&mut self) {}

    fn now(&mut self) -> f64 {
        if let Some(next) = self.pending.pop_front() {
            self.current = next;
        }
        self.current
    }
}

/// Measures the time between successive frames.
pub struct FrameClock {
    source: BoxedTimeSource,
    last: f64,
    frame_index: u64,
    history: [f64; FRAME_HISTORY],
    cursor: usize,
    filled: usize,
}

impl FrameClock {
    pub fn new(mut source: BoxedTimeSource) -> Self {
        source.reset();
        Self {
            source,
            last: 0.0,
            frame_index: 0,
            history: [0.0; FRAME_HISTORY],
            cursor: 0,
            filled: 0,
        }
    }

    pub fn system() -> Self {
        Self::new(Box::new(SystemTimeSource::new()))
    }

    /// Returns the seconds elapsed since the previous tick.
    ///
    /// The result is never negative even if the source steps backwards.
    pub fn tick(&mut self) -> f64 {
        let now = self.source.now();
        let dt = (now - self.last).max(0.0);
        self.last = now;
        self.frame_index = self.frame_index.saturating_add(1);

        self.history[self.cursor] = dt;
        self.cursor = (self.cursor + 1) % FRAME_HISTORY;
        self.filled = (self.filled + 1).min(FRAME_HISTORY);
        dt
    }

    /// Frames ticked so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Seconds on the source clock at the last tick.
    pub fn elapsed(&self) -> f64 {
        self.last
    }

    /// Mean frame time over the recent history, in milliseconds.
    pub fn mean_frame_ms(&self) -> f64 {
        if self.filled == 0 {
            return 0.0;
        }
        let total: f64 = self.history[..self.filled].iter().sum();
        1000.0 * total / self.filled as f64
    }
}
