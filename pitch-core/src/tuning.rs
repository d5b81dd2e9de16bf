//! # Musical Tuning Module
//!
//! Equal temperament arithmetic between frequencies, MIDI note numbers,
//! pitch-class names and cent deviations, with concert A (A4, MIDI 69) at 440 Hz.
//!
//! ## Features
//! - Frequency to nearest MIDI note number and back
//! - Cent deviation of a frequency from a given note
//! - Octave-independent note names, valid for negative note numbers too
//! - Note labels with octave (e.g. "A4") for the full MIDI range

use once_cell::sync::Lazy;

/// Reference pitch of A4 in Hz.
pub const A4_FREQUENCY: f32 = 440.0;

/// MIDI note number of A4.
pub const A4_NOTE_NUMBER: i32 = 69;

/// Pitch-class names, ascending in semitones from C.
pub static NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A single MIDI note with its label and equal-tempered frequency.
#[derive(Debug, Clone)]
pub struct Note {
    /// MIDI note number (0-127).
    pub number: i32,
    /// Note name with octave (e.g. "A4", "C#-1").
    pub label: String,
    /// Frequency in Hz.
    pub frequency: f32,
}

/// The 128 MIDI notes, built once on first use.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    (0..128)
        .map(|number| Note {
            number,
            label: format_label(number),
            frequency: frequency_from_note_number(number),
        })
        .collect()
});

/// Returns the MIDI note table (0-127).
pub fn midi_notes() -> &'static [Note] {
    &NOTES
}

/// Nearest MIDI note number for a frequency in Hz.
///
/// Halfway cases round up, so a frequency exactly between two notes maps to
/// the higher one. Only meaningful for finite, positive frequencies.
pub fn note_number_from_pitch(frequency: f32) -> i32 {
    let semitones = 12.0 * (frequency / A4_FREQUENCY).log2();
    (semitones + 0.5).floor() as i32 + A4_NOTE_NUMBER
}

/// Equal-tempered frequency of a MIDI note number.
pub fn frequency_from_note_number(note_number: i32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((note_number - A4_NOTE_NUMBER) as f32 / 12.0)
}

/// Deviation of `frequency` from the pitch of `note_number`, in whole cents.
///
/// Rounded towards negative infinity, so anything slightly below the note is
/// at least one cent flat.
pub fn cents_off_from_pitch(frequency: f32, note_number: i32) -> i32 {
    let target = frequency_from_note_number(note_number);
    (1200.0 * (frequency / target).log2()).floor() as i32
}

/// Pitch-class name of a MIDI note number.
///
/// Uses Euclidean remainder, so notes below MIDI 0 still map into the table
/// (-1 is "B", -12 is "C").
pub fn note_name(note_number: i32) -> &'static str {
    NOTE_NAMES[note_number.rem_euclid(12) as usize]
}

/// Pitch-class name of the note nearest to `frequency`.
pub fn note_name_from_pitch(frequency: f32) -> &'static str {
    note_name(note_number_from_pitch(frequency))
}

/// Octave number of a MIDI note, with middle C (60) in octave 4.
pub fn octave_from_note_number(note_number: i32) -> i32 {
    note_number.div_euclid(12) - 1
}

/// Note label with octave, e.g. "A4" for 69.
pub fn note_label(note_number: i32) -> String {
    match usize::try_from(note_number).ok().and_then(|i| NOTES.get(i)) {
        Some(note) => note.label.clone(),
        None => format_label(note_number),
    }
}

fn format_label(note_number: i32) -> String {
    format!(
        "{}{}",
        note_name(note_number),
        octave_from_note_number(note_number)
    )
}
