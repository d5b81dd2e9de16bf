//! # Sample Sources and Sessions
//!
//! The estimator never talks to audio hardware. Anything that can hand over
//! the most recent window of samples and report its sample rate implements
//! [`SampleSource`], and a [`PitchSession`] pulls one window from it per tick.

use std::collections::VecDeque;

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::{PitchError, Result};
use crate::pitch::{Autocorrelator, Estimate};
use crate::PitchResult;

/// A provider of fixed-length windows of audio.
pub trait SampleSource {
    /// Sample rate of the delivered audio in Hz.
    fn sample_rate(&self) -> u32;

    /// Returns true once the source can deliver no further audio.
    fn is_ended(&mut self) -> bool;

    /// Fills `buffer` with the most recent `buffer.len()` samples.
    ///
    /// Fails with [`PitchError::StreamUnavailable`] once the source has ended.
    fn fill(&mut self, buffer: &mut [f32]) -> Result<()>;
}

/// Pulls windows from a [`SampleSource`] and estimates their pitch.
pub struct PitchSession<S> {
    source: S,
    buffer: Vec<f32>,
    estimator: Autocorrelator,
}

impl<S: SampleSource> PitchSession<S> {
    /// Creates a session over `source`.
    ///
    /// # Returns
    /// * `Err(InvalidConfig)` - The config does not validate, or the source reports a zero sample rate
    /// * `Err(StreamUnavailable)` - The source has already ended
    pub fn new(mut source: S, config: &SessionConfig) -> Result<Self> {
        config.validate()?;

        if source.sample_rate() == 0 {
            return Err(PitchError::invalid_config(
                "sample_rate",
                "source reports a sample rate of 0 Hz",
            ));
        }

        if source.is_ended() {
            warn!("refusing to start a pitch session on an ended source");
            return Err(PitchError::StreamUnavailable);
        }

        info!(
            "pitch session started: {} Hz, {} sample windows",
            source.sample_rate(),
            config.window_length
        );

        Ok(Self {
            source,
            buffer: vec![0.0; config.window_length],
            estimator: Autocorrelator::with_window_length(config.window_length),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.source.sample_rate()
    }

    /// The window pulled by the most recent call.
    pub fn window(&self) -> &[f32] {
        &self.buffer
    }

    /// Pulls one window and returns the raw estimate for it.
    pub fn estimate(&mut self) -> Result<Option<Estimate>> {
        self.source.fill(&mut self.buffer)?;
        Ok(self
            .estimator
            .estimate(&self.buffer, self.source.sample_rate()))
    }

    /// Pulls one window and resolves its pitch to a note.
    pub fn get_pitch(&mut self) -> Result<PitchResult> {
        Ok(self.estimate()?.map(|estimate| estimate.frequency).into())
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

/// Steps through an in-memory recording one window at a time.
///
/// Each fill consumes `buffer.len()` samples; the final window is zero-padded.
/// The source has ended once every sample has been delivered.
#[derive(Debug, Clone)]
pub struct SliceSource {
    samples: Vec<f32>,
    sample_rate: u32,
    position: usize,
}

impl SliceSource {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            position: 0,
        }
    }
}

impl SampleSource for SliceSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_ended(&mut self) -> bool {
        self.position >= self.samples.len()
    }

    fn fill(&mut self, buffer: &mut [f32]) -> Result<()> {
        if self.is_ended() {
            return Err(PitchError::StreamUnavailable);
        }
        let end = (self.position + buffer.len()).min(self.samples.len());
        let chunk = &self.samples[self.position..end];
        buffer[..chunk.len()].copy_from_slice(chunk);
        buffer[chunk.len()..].fill(0.0);
        self.position = end;
        Ok(())
    }
}

/// Collects audio chunks sent over a channel, e.g. from a capture callback.
///
/// Keeps the newest `analysis_size` samples. A fill copies the most recent
/// samples into the buffer, zero-padding the front until enough audio has
/// arrived. The source has ended once every sender has been dropped.
pub struct ChannelSource {
    receiver: Receiver<Vec<f32>>,
    history: VecDeque<f32>,
    capacity: usize,
    sample_rate: u32,
    ended: bool,
}

impl ChannelSource {
    /// # Arguments
    /// * `receiver` - Channel of raw sample chunks of any length
    /// * `sample_rate` - Sample rate of the incoming audio in Hz
    /// * `analysis_size` - Number of samples of history to keep
    pub fn new(receiver: Receiver<Vec<f32>>, sample_rate: u32, analysis_size: usize) -> Self {
        Self {
            receiver,
            history: VecDeque::with_capacity(analysis_size),
            capacity: analysis_size,
            sample_rate,
            ended: false,
        }
    }

    /// Number of samples of history currently held.
    pub fn buffered(&self) -> usize {
        self.history.len()
    }

    /// Moves every pending chunk from the channel into the history.
    fn drain(&mut self) {
        loop {
            match self.receiver.try_recv() {
                Ok(chunk) => self.push(&chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.ended {
                        debug!("sample channel disconnected");
                    }
                    self.ended = true;
                    break;
                }
            }
        }
    }

    fn push(&mut self, chunk: &[f32]) {
        let skip = chunk.len().saturating_sub(self.capacity);
        self.history.extend(&chunk[skip..]);
        let excess = self.history.len().saturating_sub(self.capacity);
        self.history.drain(..excess);
    }
}

impl SampleSource for ChannelSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_ended(&mut self) -> bool {
        self.drain();
        self.ended
    }

    fn fill(&mut self, buffer: &mut [f32]) -> Result<()> {
        self.drain();
        if self.ended {
            return Err(PitchError::StreamUnavailable);
        }

        let available = self.history.len().min(buffer.len());
        let padding = buffer.len() - available;
        buffer[..padding].fill(0.0);

        let start = self.history.len() - available;
        for (slot, &sample) in buffer[padding..].iter_mut().zip(self.history.range(start..)) {
            *slot = sample;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sine(frequency: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn channel_source_pads_until_full() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut source = ChannelSource::new(rx, 8000, 8);
        tx.send(vec![1.0, 2.0]).unwrap();

        let mut buffer = [9.0; 4];
        source.fill(&mut buffer).unwrap();
        assert_eq!(buffer, [0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn channel_source_keeps_newest_samples() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut source = ChannelSource::new(rx, 8000, 4);
        tx.send(vec![1.0, 2.0, 3.0]).unwrap();
        tx.send(vec![4.0, 5.0, 6.0]).unwrap();
        tx.send((7..=12).map(|v| v as f32).collect()).unwrap();

        let mut buffer = [0.0; 3];
        source.fill(&mut buffer).unwrap();
        assert_eq!(source.buffered(), 4);
        assert_eq!(buffer, [10.0, 11.0, 12.0]);
    }

    #[test]
    fn dropped_sender_ends_channel_source() {
        let (tx, rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        drop(tx);
        let source = ChannelSource::new(rx, 44100, 2048);
        assert!(matches!(
            PitchSession::new(source, &SessionConfig::default()),
            Err(PitchError::StreamUnavailable)
        ));
    }

    #[test]
    fn source_ending_mid_session() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut session =
            PitchSession::new(ChannelSource::new(rx, 44100, 2048), &SessionConfig::default())
                .unwrap();
        tx.send(sine(440.0, 44100, 1024)).unwrap();
        assert!(session.get_pitch().unwrap().is_confident());

        drop(tx);
        assert!(matches!(
            session.get_pitch(),
            Err(PitchError::StreamUnavailable)
        ));
    }

    #[test]
    fn channel_session_before_audio_arrives() {
        let (_tx, rx) = crossbeam_channel::unbounded::<Vec<f32>>();
        let mut session =
            PitchSession::new(ChannelSource::new(rx, 44100, 2048), &SessionConfig::default())
                .unwrap();
        assert_eq!(session.get_pitch().unwrap(), PitchResult::NoPitch);
        assert!(session.window().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn slice_source_steps_through_recording() {
        let mut source = SliceSource::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], 8000);
        let mut buffer = [0.0; 2];
        source.fill(&mut buffer).unwrap();
        assert_eq!(buffer, [1.0, 2.0]);
        source.fill(&mut buffer).unwrap();
        assert_eq!(buffer, [3.0, 4.0]);
        source.fill(&mut buffer).unwrap();
        assert_eq!(buffer, [5.0, 0.0]);
        assert!(source.is_ended());
        assert!(matches!(
            source.fill(&mut buffer),
            Err(PitchError::StreamUnavailable)
        ));
    }

    #[test]
    fn empty_recording_is_unavailable() {
        assert!(matches!(
            PitchSession::new(SliceSource::new(vec![], 44100), &SessionConfig::default()),
            Err(PitchError::StreamUnavailable)
        ));
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        assert!(matches!(
            PitchSession::new(SliceSource::new(vec![0.0; 16], 0), &SessionConfig::default()),
            Err(PitchError::InvalidConfig { field: "sample_rate", .. })
        ));
    }

    #[test]
    fn session_reads_configured_window() {
        let config = SessionConfig {
            window_length: 2048,
            ..Default::default()
        };
        let mut session =
            PitchSession::new(SliceSource::new(sine(220.0, 44100, 4096), 44100), &config).unwrap();

        for _ in 0..2 {
            let result = session.get_pitch().unwrap();
            assert_eq!(session.window().len(), 2048);
            let PitchResult::Confident { note_number, note_name, .. } = result else {
                panic!("expected a pitch");
            };
            assert_eq!(note_number, 57);
            assert_eq!(note_name, "A");
        }
        assert!(session.get_pitch().is_err());
    }
}
