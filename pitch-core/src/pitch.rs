//! # Pitch Detection Module
//!
//! Time-domain pitch estimation for a single window of samples.
//!
//! The estimator scores every lag in the first half of the window with a
//! normalized absolute-difference measure (1.0 means the window lines up
//! perfectly with itself shifted by that lag), walks up the first peak that
//! clears [`GOOD_CORRELATION`], and stops as soon as the scores turn down.
//! The stopping lag is then nudged using its two neighbours to recover some
//! sub-sample precision.
//!
//! ## Cost
//! The search is O(M²) with M = window length / 2. That is fine for windows of
//! one or two thousand samples at interactive rates, and is the dominant cost
//! of a [`crate::source::PitchSession`] tick if windows grow.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::gate;

/// A lag score must exceed this to start or continue a peak.
pub const GOOD_CORRELATION: f32 = 0.9;

/// Minimum best score accepted when the scan runs off the end of the lags.
pub const MIN_FALLBACK_CORRELATION: f32 = 0.01;

/// Scale applied to the neighbour-difference shift when interpolating the peak.
/// Empirical; changing it changes every interpolated estimate.
const INTERPOLATION_SCALE: f32 = 8.0;

/// Value historically returned in place of a frequency when no pitch was found.
pub const LEGACY_NO_PITCH: f32 = -1.0;

/// Which branch of the search produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeakKind {
    /// The scan found a peak, saw it fall off, and interpolated around it.
    Interpolated,
    /// The scan ended while still on a peak; the best integer lag is used as is.
    Fallback,
}

/// A pitch estimate for one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    /// Fundamental frequency in Hz.
    pub frequency: f32,
    /// Score of the best lag (at most 1.0).
    pub correlation: f32,
    /// How the frequency was derived.
    pub peak: PeakKind,
}

/// Reusable autocorrelation estimator.
///
/// Holds the per-lag score trace between calls so repeated estimation on a
/// stream of equally sized windows does not reallocate. Estimation takes
/// `&mut self`, so a single instance can never be driven by two windows at once.
#[derive(Debug, Default, Clone)]
pub struct Autocorrelator {
    trace: Vec<f32>,
}

impl Autocorrelator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an estimator whose trace is sized for windows of `window_length`.
    pub fn with_window_length(window_length: usize) -> Self {
        Self {
            trace: Vec::with_capacity(window_length / 2),
        }
    }

    /// Scores computed during the most recent call, one per lag tested.
    ///
    /// The trace stops at the lag where the search ended, so it can be shorter
    /// than half the window.
    pub fn trace(&self) -> &[f32] {
        &self.trace
    }

    /// Estimates the fundamental frequency of `samples`.
    ///
    /// # Arguments
    /// * `samples` - One window of audio, nominally in [-1.0, 1.0]
    /// * `sample_rate` - Sample rate in Hz
    ///
    /// # Returns
    /// * `Some(estimate)` - A periodic peak was found
    /// * `None` - Window shorter than two samples, zero sample rate, too quiet, or aperiodic
    pub fn estimate(&mut self, samples: &[f32], sample_rate: u32) -> Option<Estimate> {
        self.trace.clear();

        if samples.len() < 2 || sample_rate == 0 || !gate::has_signal(samples) {
            return None;
        }

        // Lags and the compared span share this bound, so `i + lag` never
        // exceeds `2 * max_lag - 2 < samples.len()`.
        let max_lag = samples.len() / 2;

        let mut last_score = 1.0;
        let mut found_good_run = false;
        let mut best_score = 0.0;
        let mut best_lag = None;

        for lag in 0..max_lag {
            let score = lag_score(samples, lag, max_lag);
            self.trace.push(score);

            if score > GOOD_CORRELATION && score > last_score {
                found_good_run = true;
                if score > best_score {
                    best_score = score;
                    best_lag = Some(lag);
                }
            } else if found_good_run {
                // Past the top of the first good peak; later peaks are repeats.
                let lag = best_lag?;
                return self.interpolate(lag, best_score, sample_rate);
            }

            last_score = score;
        }

        if best_score > MIN_FALLBACK_CORRELATION {
            let lag = best_lag?;
            trace!("scan ended on a rising peak at lag {lag}, score {best_score}");
            return Some(Estimate {
                frequency: sample_rate as f32 / lag as f32,
                correlation: best_score,
                peak: PeakKind::Fallback,
            });
        }

        None
    }

    /// Refines the peak at `lag` using the scores on either side of it.
    ///
    /// `lag >= 1` always holds here: lag 0 scores exactly 1.0 and can never
    /// beat the initial `last_score`, and the stop fires one lag after the best.
    fn interpolate(&self, lag: usize, score: f32, sample_rate: u32) -> Option<Estimate> {
        let before = self.trace[lag - 1];
        let after = self.trace[lag + 1];
        let shift = (after - before) / self.trace[lag];
        let period = lag as f32 + INTERPOLATION_SCALE * shift;
        let frequency = sample_rate as f32 / period;

        trace!("peak at lag {lag}, shift {shift}, {frequency} Hz");

        if frequency.is_finite() && frequency > 0.0 {
            Some(Estimate {
                frequency,
                correlation: score,
                peak: PeakKind::Interpolated,
            })
        } else {
            None
        }
    }
}

/// Normalized absolute-difference score of the window against itself at `lag`.
fn lag_score(samples: &[f32], lag: usize, span: usize) -> f32 {
    let distance: f32 = samples[..span]
        .iter()
        .zip(&samples[lag..lag + span])
        .map(|(a, b)| (a - b).abs())
        .sum();
    1.0 - distance / span as f32
}

/// Estimates the fundamental frequency of one window with a fresh trace.
///
/// See [`Autocorrelator::estimate`]; use that directly to reuse scratch space
/// across calls.
pub fn estimate_frequency(samples: &[f32], sample_rate: u32) -> Option<f32> {
    Autocorrelator::with_window_length(samples.len())
        .estimate(samples, sample_rate)
        .map(|estimate| estimate.frequency)
}

/// Collapses an optional frequency into the legacy `-1.0` sentinel encoding.
pub fn to_legacy(frequency: Option<f32>) -> f32 {
    frequency.unwrap_or(LEGACY_NO_PITCH)
}
