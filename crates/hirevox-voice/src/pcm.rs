//! PCM wire format: float samples to int16 base64 payloads and back.
//!
//! The channel carries linear PCM, 16-bit signed, little-endian, mono.
//! Capture runs at 16 kHz; the remote peer synthesizes at 24 kHz.

use crate::error::{VoiceError, VoiceResult};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Capture (microphone) sample rate in Hz.
pub const CAPTURE_SAMPLE_RATE: u32 = 16_000;
/// Playback (synthesized speech) sample rate in Hz.
pub const PLAYBACK_SAMPLE_RATE: u32 = 24_000;
/// Samples per outbound frame.
pub const FRAME_SAMPLES: usize = 4096;

/// MIME-style descriptor for outbound capture frames.
pub fn capture_mime_type() -> String {
    format!("audio/pcm;rate={}", CAPTURE_SAMPLE_RATE)
}

/// Parse the declared sample rate out of a `audio/pcm;rate=24000` descriptor.
pub fn rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .find_map(|part| part.trim().strip_prefix("rate="))
        .and_then(|rate| rate.parse().ok())
}

/// Convert one float sample in [-1, 1] to int16. Values at or beyond the
/// range clamp instead of wrapping: 1.0 maps to 32767, not -32768.
pub fn sample_to_i16(sample: f32) -> i16 {
    (sample * 32768.0)
        .round()
        .clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encode a block of float samples as a base64 PCM payload.
pub fn encode_frame(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    BASE64.encode(bytes)
}

/// Decode an inbound base64 PCM payload into float samples. Mono only; the
/// channel declares one channel for both directions.
pub fn decode_payload(data: &str) -> VoiceResult<Vec<f32>> {
    let bytes = BASE64
        .decode(data)
        .map_err(|e| VoiceError::Decode(format!("invalid base64: {}", e)))?;
    if bytes.len() % 2 != 0 {
        return Err(VoiceError::Decode(format!(
            "odd payload length {} is not int16 PCM",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_within_quantization_tolerance() {
        let samples = vec![0.0, 0.25, -0.5, 0.9999, -1.0, 0.123_456];
        let encoded = encode_frame(&samples);
        let decoded = decode_payload(&encoded).unwrap();
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(decoded.iter()) {
            assert!((a - b).abs() <= 1.0 / 32768.0, "{} vs {}", a, b);
        }
    }

    #[test]
    fn full_scale_clamps_instead_of_overflowing() {
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(-1.0), i16::MIN);
        assert_eq!(sample_to_i16(-2.0), i16::MIN);
    }

    #[test]
    fn malformed_base64_is_a_decode_error() {
        assert!(matches!(
            decode_payload("not valid base64!!!"),
            Err(VoiceError::Decode(_))
        ));
    }

    #[test]
    fn odd_length_payload_is_a_decode_error() {
        let encoded = BASE64.encode([0u8, 1, 2]);
        assert!(matches!(
            decode_payload(&encoded),
            Err(VoiceError::Decode(_))
        ));
    }

    #[test]
    fn mime_rate_parsing() {
        assert_eq!(rate_from_mime("audio/pcm;rate=24000"), Some(24_000));
        assert_eq!(rate_from_mime("audio/pcm; rate=16000"), Some(16_000));
        assert_eq!(rate_from_mime("audio/pcm"), None);
        assert_eq!(capture_mime_type(), "audio/pcm;rate=16000");
    }
}
