//! Session state machine: the orchestrator that owns the channel lifecycle,
//! routes inbound events, and keeps the UI-observable state consistent.
//!
//! States: `Inactive → Thinking → (Listening ⇄ Speaking) → Inactive`.
//! Transitions outside the table are ignored, never applied. Teardown
//! (playback stop, capture stop, channel close, transcript flush) runs on
//! every exit path and the ordered turn list is moved out exactly once.

use crate::bootstrap::{self, SessionParts};
use crate::error::{user_facing_channel_error, VoiceResult};
use crate::live::{LiveEvent, LIVE_MODEL};
use crate::pcm::{self, PLAYBACK_SAMPLE_RATE};
use crate::playback::{OutputSink, PlaybackChunk, PlaybackScheduler, RodioSink};
use crate::transcript::TranscriptAccumulator;
use hirevox_core::prompts::INTERVIEWER_VOICE;
use hirevox_core::{CandidateProfile, Turn};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Conversational state exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// No session running. Initial and terminal.
    Inactive,
    /// Session starting or the model preparing to speak.
    Thinking,
    /// Capture streaming; the candidate has the floor.
    Listening,
    /// The model's synthesized speech is playing.
    Speaking,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VoiceState::Inactive => "INACTIVE",
            VoiceState::Thinking => "THINKING",
            VoiceState::Listening => "LISTENING",
            VoiceState::Speaking => "SPEAKING",
        };
        f.write_str(label)
    }
}

/// The explicit transition table. Everything not listed is ignored.
fn transition_allowed(from: VoiceState, to: VoiceState) -> bool {
    use VoiceState::*;
    matches!(
        (from, to),
        (Inactive, Thinking)
            | (Thinking, Speaking)
            | (Speaking, Listening)
            | (Listening, Speaking)
            | (Thinking, Inactive)
            | (Listening, Inactive)
            | (Speaking, Inactive)
    )
}

/// Commands from the UI/front-end to a running session.
#[derive(Debug, Clone, Copy)]
pub enum SessionCommand {
    /// Explicit user end-action: flush, finish, tear down.
    End,
}

/// Events a running session emits for rendering.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StateChanged(VoiceState),
    /// User-facing error message (already classified).
    Error { message: String },
}

/// Open parameters for one interview session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub api_key: String,
    pub profile: CandidateProfile,
    /// Remote voice identity (default: [`INTERVIEWER_VOICE`]).
    pub voice: String,
    /// Realtime model (default: [`LIVE_MODEL`]).
    pub model: String,
}

impl SessionConfig {
    pub fn new(api_key: impl Into<String>, profile: CandidateProfile) -> Self {
        Self {
            api_key: api_key.into(),
            profile,
            voice: INTERVIEWER_VOICE.to_string(),
            model: LIVE_MODEL.to_string(),
        }
    }
}

fn publish_state(
    state_tx: &watch::Sender<VoiceState>,
    event_tx: &mpsc::UnboundedSender<SessionEvent>,
    to: VoiceState,
) {
    let _ = state_tx.send(to);
    let _ = event_tx.send(SessionEvent::StateChanged(to));
    info!("Session state: {}", to);
}

/// Everything the running session owns exclusively: scheduler, transcript
/// buffers, and the current state. All cross-callback mutation goes through
/// these methods; the event loop is the only caller.
struct ActiveSession<S> {
    scheduler: PlaybackScheduler<S>,
    transcript: TranscriptAccumulator,
    state: VoiceState,
    state_tx: watch::Sender<VoiceState>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl<S: OutputSink> ActiveSession<S> {
    fn set_state(&mut self, to: VoiceState) {
        if self.state == to {
            return;
        }
        if !transition_allowed(self.state, to) {
            debug!("Ignoring transition {} -> {}", self.state, to);
            return;
        }
        self.state = to;
        publish_state(&self.state_tx, &self.event_tx, to);
    }

    /// Route one inbound event. Returns `false` when the session is over
    /// (channel error or close).
    fn dispatch(&mut self, event: LiveEvent) -> bool {
        match event {
            LiveEvent::SetupComplete => {
                debug!("Live channel setup complete");
            }
            LiveEvent::OutputTranscript { text } => {
                self.transcript.push_question_fragment(&text);
            }
            LiveEvent::InputTranscript { text } => {
                self.transcript.push_answer_fragment(&text);
            }
            LiveEvent::TurnComplete => {
                self.transcript.commit_turn();
            }
            LiveEvent::Audio { data, mime_type } => match pcm::decode_payload(&data) {
                Ok(samples) => {
                    let sample_rate = mime_type
                        .as_deref()
                        .and_then(pcm::rate_from_mime)
                        .unwrap_or(PLAYBACK_SAMPLE_RATE);
                    self.set_state(VoiceState::Speaking);
                    let chunk = PlaybackChunk {
                        samples,
                        sample_rate,
                    };
                    if let Err(e) = self.scheduler.schedule(chunk) {
                        warn!("Skipping unplayable audio chunk: {}", e);
                    }
                }
                Err(e) => {
                    warn!("Skipping malformed audio payload: {}", e);
                }
            },
            LiveEvent::Interrupted => {
                self.scheduler.interrupt();
                self.set_state(VoiceState::Listening);
            }
            LiveEvent::Error { message } => {
                let user_message = user_facing_channel_error(&message);
                warn!("Live channel error: {}", message);
                let _ = self.event_tx.send(SessionEvent::Error {
                    message: user_message.to_string(),
                });
                return false;
            }
            LiveEvent::Closed => {
                info!("Live channel closed by peer");
                return false;
            }
        }
        true
    }

    /// Playback clock fired: drop finished sources; when the active set
    /// empties the remote has finished speaking.
    fn on_playback_tick(&mut self) {
        if self.scheduler.drain_finished() == 0 && self.state == VoiceState::Speaking {
            self.set_state(VoiceState::Listening);
        }
    }

    /// Final teardown of the playback/transcript side: stop everything,
    /// flush partial content, publish `Inactive`, and move the turn list
    /// out. Consumes the session, so it runs exactly once.
    fn finish(mut self) -> Vec<Turn> {
        self.scheduler.interrupt();
        self.transcript.flush();
        self.set_state(VoiceState::Inactive);
        self.transcript.into_turns()
    }
}

/// One interview session. Create with [`InterviewSession::new`], drive with
/// the returned [`SessionHandle`], and await [`InterviewSession::run`] for
/// the committed turn list.
pub struct InterviewSession {
    config: SessionConfig,
    muted: Arc<AtomicBool>,
    state_tx: watch::Sender<VoiceState>,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
}

impl InterviewSession {
    pub fn new(config: SessionConfig) -> (Self, SessionHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(VoiceState::Inactive);
        let muted = Arc::new(AtomicBool::new(false));

        let session = Self {
            config,
            muted: Arc::clone(&muted),
            state_tx,
            event_tx,
            cmd_rx,
        };
        let handle = SessionHandle {
            cmd_tx,
            muted,
            state_rx,
            events: Some(event_rx),
        };
        (session, handle)
    }

    /// Run the session to completion and return the ordered turn list.
    ///
    /// Startup failures (microphone, output device, channel open) return an
    /// error and leave the state `Inactive`. Once running, every way the
    /// session ends — explicit end, channel close, channel error — flushes
    /// the transcript, tears down devices and channel, and returns the
    /// turns.
    ///
    /// The returned future owns the device handles and is not `Send`; await
    /// it on the task that created it rather than spawning it.
    pub async fn run(self) -> VoiceResult<Vec<Turn>> {
        let InterviewSession {
            config,
            muted,
            state_tx,
            event_tx,
            mut cmd_rx,
        } = self;

        publish_state(&state_tx, &event_tx, VoiceState::Thinking);

        let parts = match bootstrap::start(&config, Arc::clone(&muted)).await {
            Ok(parts) => parts,
            Err(e) => {
                publish_state(&state_tx, &event_tx, VoiceState::Inactive);
                return Err(e);
            }
        };
        let SessionParts {
            capture_stream,
            mut channel,
            mut events,
            mut frames,
            sink,
        } = parts;

        let mut active: ActiveSession<RodioSink> = ActiveSession {
            scheduler: PlaybackScheduler::new(sink),
            transcript: TranscriptAccumulator::new(),
            state: VoiceState::Thinking,
            state_tx,
            event_tx,
        };

        let mut frames_open = true;
        loop {
            let now = active.scheduler.now();
            let next_end = active.scheduler.next_end();

            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        if !active.dispatch(event) {
                            break;
                        }
                    }
                    None => break,
                },
                frame = frames.recv(), if frames_open => match frame {
                    Some(frame) => {
                        if let Err(e) = channel.send_audio(frame) {
                            warn!("Dropping capture frame: {}", e);
                        }
                    }
                    None => frames_open = false,
                },
                cmd = cmd_rx.recv() => match cmd {
                    Some(SessionCommand::End) | None => {
                        info!("Session end requested");
                        break;
                    }
                },
                _ = sleep_until_device(next_end, now), if next_end.is_some() => {
                    active.on_playback_tick();
                }
            }
        }

        // Unconditional teardown: capture stops when the stream drops, the
        // channel close is idempotent, and finish() handles playback and
        // transcript.
        drop(capture_stream);
        channel.close();
        Ok(active.finish())
    }
}

/// Wake just after the earliest declared end so the drain pass sees the
/// source as finished.
async fn sleep_until_device(next_end: Option<f64>, now: f64) {
    let Some(end) = next_end else {
        return;
    };
    let wait = (end - now).max(0.0) + 0.005;
    tokio::time::sleep(Duration::from_secs_f64(wait)).await;
}

/// Control surface for a running session: end, mute, and observe.
pub struct SessionHandle {
    cmd_tx: mpsc::UnboundedSender<SessionCommand>,
    muted: Arc<AtomicBool>,
    state_rx: watch::Receiver<VoiceState>,
    events: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl SessionHandle {
    /// Request an explicit session end.
    pub fn end(&self) {
        let _ = self.cmd_tx.send(SessionCommand::End);
    }

    /// Gate outbound frames. Does not change state; the device keeps
    /// running so unmuting is instant.
    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Flip the mute flag and return the new value.
    pub fn toggle_muted(&self) -> bool {
        let muted = !self.is_muted();
        self.set_muted(muted);
        muted
    }

    /// Current conversational state.
    pub fn state(&self) -> VoiceState {
        *self.state_rx.borrow()
    }

    /// Watch receiver for continuous state observation.
    pub fn state_receiver(&self) -> watch::Receiver<VoiceState> {
        self.state_rx.clone()
    }

    /// Take the session event stream. First call returns it; later calls
    /// return `None`.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<SessionEvent>> {
        self.events.take()
    }
}
