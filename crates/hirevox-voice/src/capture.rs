//! Microphone capture pipeline: cpal input stream, fixed-size frames,
//! PCM encoding, and hand-off to the session loop.
//!
//! The device callback accumulates raw f32 samples into 4096-sample frames.
//! Each full frame is encoded and sent on the frame channel unless the mute
//! flag is set; muted frames are dropped before encoding while the device
//! keeps running, so unmuting has no restart latency.

use crate::error::{VoiceError, VoiceResult};
use crate::pcm::{self, CAPTURE_SAMPLE_RATE, FRAME_SAMPLES};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capture configuration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate in Hz (default: 16000).
    pub sample_rate: u32,

    /// Number of channels (default: 1 for mono).
    pub channels: u16,

    /// Samples per outbound frame (default: 4096).
    pub frame_size: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: CAPTURE_SAMPLE_RATE,
            channels: 1,
            frame_size: FRAME_SAMPLES,
        }
    }
}

/// One encoded outbound media frame, ready for the channel.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Base64 PCM payload.
    pub data: String,
    /// Format descriptor including the declared sample rate.
    pub mime_type: String,
}

/// Gate and encode one full frame. Returns `None` while muted: the frame is
/// dropped before encoding and nothing goes out on the wire.
pub(crate) fn frame_ready(samples: &[f32], muted: bool) -> Option<EncodedFrame> {
    if muted {
        return None;
    }
    Some(EncodedFrame {
        data: pcm::encode_frame(samples),
        mime_type: pcm::capture_mime_type(),
    })
}

/// Microphone capture using cpal.
pub struct MicCapture {
    config: CaptureConfig,
    device: Device,
    stream_config: StreamConfig,
}

impl MicCapture {
    /// Open the default input device. Failure here (no device, permission
    /// denied) is fatal to session start.
    pub fn open(config: CaptureConfig) -> VoiceResult<Self> {
        info!(
            "Opening microphone ({}Hz, {} channel(s), {}-sample frames)",
            config.sample_rate, config.channels, config.frame_size
        );

        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| VoiceError::AudioDevice("No input device available".to_string()))?;

        info!(
            "Using input device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        // Probing the default config surfaces permission errors up front.
        let _ = device.default_input_config()?;

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        Ok(Self {
            config,
            device,
            stream_config,
        })
    }

    /// Start capturing. Full frames are encoded and sent on `frame_tx`; a
    /// failed send means the session is gone, so the frame is dropped and
    /// capture continues. Frames are never buffered or retried — stale audio
    /// is not safe to replay out of order.
    ///
    /// Keep the returned `Stream` alive for as long as capture should run;
    /// dropping it stops the device.
    pub fn start(
        self,
        frame_tx: mpsc::UnboundedSender<EncodedFrame>,
        muted: Arc<AtomicBool>,
    ) -> VoiceResult<Stream> {
        let frame_size = self.config.frame_size;
        let mut sample_buffer: Vec<f32> = Vec::with_capacity(frame_size);

        let stream = self.device.build_input_stream(
            &self.stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    sample_buffer.push(sample);

                    if sample_buffer.len() >= frame_size {
                        if let Some(frame) = frame_ready(&sample_buffer, muted.load(Ordering::Relaxed)) {
                            if frame_tx.send(frame).is_err() {
                                warn!("Capture frame dropped: session channel closed");
                            }
                        }
                        sample_buffer.clear();
                    }
                }
            },
            move |err| {
                warn!("Capture stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;

        info!("Microphone capture started");

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_config_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.sample_rate, 16_000);
        assert_eq!(config.channels, 1);
        assert_eq!(config.frame_size, 4096);
    }

    #[test]
    fn muted_frames_are_dropped_before_encoding() {
        let samples = vec![0.5f32; 64];
        assert!(frame_ready(&samples, true).is_none());
    }

    #[test]
    fn unmuted_frames_carry_payload_and_format() {
        let samples = vec![0.5f32; 64];
        let frame = frame_ready(&samples, false).unwrap();
        assert_eq!(frame.mime_type, "audio/pcm;rate=16000");
        let decoded = crate::pcm::decode_payload(&frame.data).unwrap();
        assert_eq!(decoded.len(), 64);
    }

    #[test]
    #[ignore] // Requires audio hardware.
    fn open_default_microphone() {
        let result = MicCapture::open(CaptureConfig::default());
        if let Err(e) = result {
            println!("No usable input device in this environment: {}", e);
        }
    }
}
