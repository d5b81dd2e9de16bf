// pitch-core/src/lib.rs

//! Monophonic pitch estimation for short windows of audio.
//! This crate estimates the fundamental frequency of a window with a
//! time-domain autocorrelation search and maps it to the nearest note,
//! its pitch-class name and its deviation in cents. It is completely
//! headless; audio acquisition is reached only through the
//! [`source::SampleSource`] trait.

pub mod config;
pub mod error;
pub mod gate;
pub mod pitch;
pub mod source;
pub mod tuning;

#[cfg(feature = "capture")]
pub mod audio;

use serde::{Deserialize, Serialize};

pub use config::SessionConfig;
pub use error::{PitchError, Result};
pub use pitch::{Autocorrelator, Estimate, PeakKind, estimate_frequency};
pub use source::{ChannelSource, PitchSession, SampleSource, SliceSource};

/// Represents the result of estimating the pitch of a single window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PitchResult {
    /// Too quiet, too short, or no periodic structure found.
    #[serde(rename = "vague")]
    NoPitch,
    /// A pitch was found.
    Confident {
        /// The estimated fundamental frequency in Hz.
        frequency_hz: f32,
        /// The nearest MIDI note number (A4 = 69).
        note_number: i32,
        /// The pitch-class name of the nearest note.
        note_name: String,
        /// The octave of the nearest note (middle C is in octave 4).
        octave: i32,
        /// The deviation from the nearest note in whole cents.
        cents_offset: i32,
        /// `cents_offset < 0`.
        is_flat: bool,
        /// `cents_offset >= 0`; an exactly in-tune note counts as sharp.
        is_sharp: bool,
    },
}

impl PitchResult {
    /// Builds a result from a detected frequency.
    pub fn from_frequency(frequency_hz: f32) -> Self {
        let note_number = tuning::note_number_from_pitch(frequency_hz);
        let cents_offset = tuning::cents_off_from_pitch(frequency_hz, note_number);
        PitchResult::Confident {
            frequency_hz,
            note_number,
            note_name: tuning::note_name_from_pitch(frequency_hz).to_string(),
            octave: tuning::octave_from_note_number(note_number),
            cents_offset,
            is_flat: cents_offset < 0,
            is_sharp: cents_offset >= 0,
        }
    }

    pub fn is_confident(&self) -> bool {
        matches!(self, PitchResult::Confident { .. })
    }

    /// The detected frequency, if any.
    pub fn frequency(&self) -> Option<f32> {
        match self {
            PitchResult::Confident { frequency_hz, .. } => Some(*frequency_hz),
            PitchResult::NoPitch => None,
        }
    }
}

impl From<Option<f32>> for PitchResult {
    fn from(frequency: Option<f32>) -> Self {
        frequency.map_or(PitchResult::NoPitch, PitchResult::from_frequency)
    }
}

/// Estimates the pitch of one window and resolves it to a note.
///
/// # Arguments
/// * `samples` - One window of audio
/// * `sample_rate` - Sample rate in Hz
pub fn classify(samples: &[f32], sample_rate: u32) -> PitchResult {
    estimate_frequency(samples, sample_rate).into()
}
