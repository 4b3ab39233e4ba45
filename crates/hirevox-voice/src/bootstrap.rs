//! Session startup: open devices, connect the live channel, prime the
//! conversation.
//!
//! Startup is all-or-nothing. Any failure here (no microphone, no output
//! device, channel refused) aborts the session before it ever leaves the
//! starting state.

use crate::capture::{CaptureConfig, EncodedFrame, MicCapture};
use crate::error::VoiceResult;
use crate::live::{LiveChannel, LiveConfig, LiveEvent};
use crate::playback::RodioSink;
use crate::session::SessionConfig;
use hirevox_core::prompts;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Sent once after connect so the remote interviewer speaks first instead of
/// waiting for the candidate.
const PRIMING_MESSAGE: &str =
    "The candidate is here and ready to begin. Please introduce yourself and start the interview.";

/// Everything a running session needs, handed to the event loop in one piece.
pub(crate) struct SessionParts {
    /// Keeps the microphone running; dropping it stops capture.
    pub capture_stream: cpal::Stream,
    pub channel: LiveChannel,
    pub events: mpsc::UnboundedReceiver<LiveEvent>,
    pub frames: mpsc::UnboundedReceiver<EncodedFrame>,
    pub sink: RodioSink,
}

/// Open the microphone and output device, connect the live channel, start
/// capture, and send the priming message.
pub(crate) async fn start(
    config: &SessionConfig,
    muted: Arc<AtomicBool>,
) -> VoiceResult<SessionParts> {
    let capture = MicCapture::open(CaptureConfig::default())?;
    let sink = RodioSink::new()?;

    let live_config = LiveConfig {
        api_key: config.api_key.clone(),
        model: config.model.clone(),
        voice: config.voice.clone(),
        system_instruction: prompts::interviewer_instructions(&config.profile),
    };
    let (channel, events) = LiveChannel::connect(&live_config).await?;

    let (frame_tx, frames) = mpsc::unbounded_channel();
    let capture_stream = capture.start(frame_tx, muted)?;

    channel.send_text(PRIMING_MESSAGE)?;
    info!("Session bootstrap complete; interviewer primed");

    Ok(SessionParts {
        capture_stream,
        channel,
        events,
        frames,
        sink,
    })
}
