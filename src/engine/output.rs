//! Click sinks - where the clock thread sends clicks
//!
//! The clock thread never touches the audio device. It pushes `Click`
//! messages into an rtrb ring buffer and the audio callback pops them at the
//! start of every block.

use rtrb::Producer;

use super::click::Click;
#[cfg(feature = "audio")]
use super::{
    click::{ClickVoice, Sound},
    EngineError,
};

/// Receiver of clicks on the clock thread
pub trait ClickSink: Send {
    fn play(&mut self, click: Click);
}

impl ClickSink for Producer<Click> {
    fn play(&mut self, click: Click) {
        // Full queue: the audio thread is stalled. Never block the clock.
        if self.push(click).is_err() {
            tracing::warn!("click queue full, dropping click");
        }
    }
}

/// Sink that discards every click (headless runs, tests)
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ClickSink for Silent {
    fn play(&mut self, _click: Click) {}
}

#[cfg(feature = "audio")]
const CLICK_QUEUE_SIZE: usize = 16;

/// Open audio stream playing clicks. Dropping it closes the stream.
#[cfg(feature = "audio")]
pub struct AudioOutput {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

#[cfg(feature = "audio")]
impl AudioOutput {
    /// Open the default output device and return the stream plus the
    /// producer the clock thread should push clicks into
    pub fn open(sound: Sound) -> Result<(Self, Producer<Click>), EngineError> {
        use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let config = device.default_output_config()?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let (tx, mut rx) = rtrb::RingBuffer::<Click>::new(CLICK_QUEUE_SIZE);
        let mut voice = ClickVoice::new(sound, sample_rate as f32);
        let frame_width = channels as usize;

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                while let Ok(click) = rx.pop() {
                    voice.trigger(click);
                }
                voice.render_interleaved(data, frame_width);
            },
            |err| tracing::warn!(%err, "audio stream error"),
            None,
        )?;
        stream.play()?;

        tracing::info!(%sound, sample_rate, channels, "audio output open");

        Ok((
            Self {
                _stream: stream,
                sample_rate,
                channels,
            },
            tx,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
