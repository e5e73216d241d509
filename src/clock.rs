/// Time sources and the clamped per-frame delta.
///
/// The simulation never reads the wall clock itself: the host owns a
/// [`Clock`] and a [`FrameTimer`] and passes `now_ms` / `dt` into every tick.

use std::cell::Cell;
use std::time::Instant;

/// Largest step the integrators ever see, in seconds. Longer frames (tab in
/// background, debugger pause) are truncated to this.
pub const MAX_FRAME_DT: f32 = 0.05;

/// Monotonic millisecond time source.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Milliseconds since construction.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms.max(0.0));
    }

    pub fn set(&self, ms: f64) {
        if ms > self.now.get() {
            self.now.set(ms);
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Turns successive timestamps into clamped deltas in seconds.
#[derive(Clone, Debug)]
pub struct FrameTimer {
    last_ms: Option<f64>,
    max_dt: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::with_max_dt(MAX_FRAME_DT)
    }

    pub fn with_max_dt(max_dt: f32) -> Self {
        Self {
            last_ms: None,
            max_dt,
        }
    }

    /// Delta since the previous call, in `[0, max_dt]`. The first call
    /// after construction or [`reset`](Self::reset) returns `0`.
    pub fn step(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, self.max_dt),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        dt
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}
