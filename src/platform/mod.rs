//! Platform abstraction layer
//!
//! Handles browser/native differences for wall-clock time. Everything else
//! platform-specific lives next to its concern (`persistence::LocalStore`,
//! `assets::HttpSource`, `renderer::web`).

/// Wall-clock milliseconds since the Unix epoch
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// `Date.now()` in the browser
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }
}

/// System time on native targets
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

/// Hand-driven clock for headless runs and tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::cell::Cell<f64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: std::cell::Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: f64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.now.get()
    }
}

/// Seed for a new game from the current time
pub fn time_seed(clock: &dyn Clock) -> u64 {
    clock.now_ms() as u64
}
