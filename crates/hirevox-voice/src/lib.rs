//! # HireVox Voice - Realtime Voice Interview Pipeline
//!
//! This crate implements the realtime duplex voice session: microphone
//! capture, a live bidirectional channel to the conversational model, gapless
//! playback of synthesized speech, and turn-by-turn transcript accumulation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Interview Session                       │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │   Audio In   │→ │  PCM Encode  │→ │ Live Channel │        │
//! │  │    (cpal)    │  │  (16k/i16)   │  │ (websocket)  │        │
//! │  └──────────────┘  └──────────────┘  └──────┬───────┘        │
//! │         ↓ mute gate                         ↓ events         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │  Audio Out   │← │   Playback   │← │    State     │        │
//! │  │   (rodio)    │  │  Scheduler   │  │   Machine    │        │
//! │  └──────────────┘  └──────────────┘  └──────┬───────┘        │
//! │                      ↑ kill signal          ↓                │
//! │                 Interruption          Transcript → Turns     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod bootstrap;
pub mod capture;
pub mod error;
pub mod live;
pub mod pcm;
pub mod playback;
pub mod session;
pub mod transcript;

pub use capture::{CaptureConfig, EncodedFrame, MicCapture};
pub use error::{VoiceError, VoiceResult, ERR_INCOMPATIBLE, ERR_NETWORK};
pub use live::{LiveChannel, LiveConfig, LiveEvent, LIVE_MODEL};
pub use playback::{OutputSink, PlaybackChunk, PlaybackScheduler, RodioSink};
pub use session::{
    InterviewSession, SessionCommand, SessionConfig, SessionEvent, SessionHandle, VoiceState,
};
pub use transcript::TranscriptAccumulator;
