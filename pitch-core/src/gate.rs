//! # Signal Gate
//!
//! Cheap loudness check run before the quadratic correlation search, so that
//! near-silent windows are rejected without paying for it.

/// Minimum RMS level a window must reach before pitch estimation is attempted.
pub const SIGNAL_THRESHOLD: f32 = 0.01;

/// Root-mean-square level of a window. An empty window has an RMS of zero.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Returns true if the window carries enough energy to look for a pitch.
///
/// NaN input yields a NaN level, which never passes the comparison.
pub fn has_signal(samples: &[f32]) -> bool {
    rms(samples) >= SIGNAL_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_is_gated() {
        assert!(!has_signal(&[0.0; 1024]));
        assert!(!has_signal(&[]));
    }

    #[test]
    fn dc_level_rms() {
        assert_eq!(rms(&[0.5; 64]), 0.5);
        assert!(has_signal(&[0.02; 16]));
        assert!(!has_signal(&[0.009; 16]));
    }

    #[test]
    fn nan_is_gated() {
        assert!(!has_signal(&[f32::NAN, 0.5, 0.5]));
    }
}
