//! # Audio Capture Module
//!
//! Live microphone input using CPAL (Cross-Platform Audio Library), feeding a
//! [`ChannelSource`] that a [`crate::PitchSession`] can pull windows from.
//!
//! Only compiled with the `capture` feature.

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use log::{error, info};

use crate::config::SessionConfig;
use crate::source::ChannelSource;

/// Starts audio capture from the default input device.
///
/// Every callback's samples are forwarded as one chunk; windowing is left to
/// the receiving [`ChannelSource`].
///
/// # Arguments
/// * `sender` - Channel sender for the raw sample chunks
/// * `target_rate` - Desired sample rate in Hz
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Running stream handle and the actual sample rate
/// * `Err(e)` - No device, no mono f32 format, or the stream failed to start
pub fn start_audio_capture(sender: Sender<Vec<f32>>, target_rate: u32) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, target_rate)
        .ok_or_else(|| anyhow!("No suitable mono f32 input format found"))?;

    let rate = target_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));

    let sample_rate = config.sample_rate().0;
    let config: cpal::StreamConfig = config.into();

    info!("selected sample rate: {} Hz", sample_rate);

    let err_fn = |err| error!("audio input stream error: {}", err);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // A full or disconnected channel only drops this chunk.
            let _ = sender.try_send(data.to_vec());
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Opens the default input device and wraps it in a ready [`ChannelSource`].
///
/// The returned stream must be kept alive for as long as the source is used;
/// dropping it ends the source.
pub fn open_default_input(config: &SessionConfig) -> Result<(cpal::Stream, ChannelSource)> {
    config.validate()?;
    let (sender, receiver) = crossbeam_channel::unbounded();
    let (stream, sample_rate) = start_audio_capture(sender, config.target_sample_rate)?;
    Ok((
        stream,
        ChannelSource::new(receiver, sample_rate, config.analysis_size),
    ))
}

/// Picks the mono f32 configuration whose rate range is closest to `target_rate`.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            if (min..=max).contains(&target_rate) {
                0
            } else {
                min.abs_diff(target_rate).min(max.abs_diff(target_rate))
            }
        })
}
