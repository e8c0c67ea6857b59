//! # Rate Controller
//!
//! Converts a bandwidth share into the pause between background copy steps.
//!
//! The controller keeps an exponentially smoothed estimate of the time needed
//! to sync one item. With share `s` and average `a`, the worker waits
//! `a / s - a` after each step so that copying occupies roughly `s` of the
//! wall-clock time.
//!
//! ```rust
//! use shadow_sync::RateController;
//! use std::time::Duration;
//!
//! let mut rate = RateController::new(0.5);
//! assert_eq!(rate.next_wait(), Some(Duration::ZERO));
//!
//! rate.record(10, Duration::from_millis(10));
//! let wait = rate.next_wait().unwrap();
//! assert!(wait > Duration::from_micros(990) && wait < Duration::from_micros(1010));
//! ```

use std::time::Duration;

/// Weight of the previous average when folding in a new sample.
pub const SMOOTHING: f64 = 0.95;

/// Lower bound applied to a measured step duration.
pub const MIN_STEP_DURATION: Duration = Duration::from_micros(1);

/// Throttles background copying to a fraction of wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct RateController {
    share: f64,
    item_secs: Option<f64>,
}

fn clamp_share(share: f64) -> f64 {
    if share.is_nan() {
        return 0.0;
    }
    share.clamp(0.0, 1.0)
}

impl RateController {
    /// Creates a controller with no timing estimate yet.
    pub fn new(share: f64) -> Self {
        Self {
            share: clamp_share(share),
            item_secs: None,
        }
    }

    pub fn share(&self) -> f64 {
        self.share
    }

    /// Updates the share, clamped into `[0, 1]`, and returns the stored value.
    pub fn set_share(&mut self, share: f64) -> f64 {
        self.share = clamp_share(share);
        self.share
    }

    /// `true` when background copying is suspended.
    pub fn is_passive(&self) -> bool {
        self.share <= 0.0
    }

    /// Smoothed per-item sync duration, if any step has been measured.
    pub fn average(&self) -> Option<Duration> {
        self.item_secs.map(Duration::from_secs_f64)
    }

    /// Folds in a background step that synced `items` items in `elapsed`.
    pub fn record(&mut self, items: usize, elapsed: Duration) {
        if items == 0 {
            return;
        }
        let elapsed = elapsed.max(MIN_STEP_DURATION);
        let sample = elapsed.as_secs_f64() / items as f64;
        self.item_secs = Some(match self.item_secs {
            Some(avg) => SMOOTHING * avg + (1.0 - SMOOTHING) * sample,
            None => sample,
        });
    }

    /// Pause before the next background step.
    ///
    /// `None` means wait indefinitely for a command.
    pub fn next_wait(&self) -> Option<Duration> {
        if self.is_passive() {
            return None;
        }
        let Some(avg) = self.item_secs else {
            return Some(Duration::ZERO);
        };
        let wait = (avg / self.share - avg).max(0.0);
        Some(Duration::try_from_secs_f64(wait).unwrap_or(Duration::MAX))
    }
}

impl Default for RateController {
    fn default() -> Self {
        Self::new(0.0)
    }
}
