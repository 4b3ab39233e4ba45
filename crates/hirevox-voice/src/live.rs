//! Duplex channel to the conversational model (Gemini Live over WebSocket).
//!
//! One persistent bidirectional connection per session. Outbound: the setup
//! message, one priming text message, and a continuous stream of realtime
//! media frames. Inbound: server messages fanned out as tagged `LiveEvent`s
//! so the session state machine is the sole router.

use crate::capture::EncodedFrame;
use crate::error::{VoiceError, VoiceResult};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite};
use tracing::{debug, info, warn};

/// Realtime conversational model for the live interview.
pub const LIVE_MODEL: &str = "gemini-2.5-flash-native-audio-preview-12-2025";

const LIVE_HOST: &str = "generativelanguage.googleapis.com";

fn live_url(api_key: &str) -> String {
    format!(
        "wss://{}/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent?key={}",
        LIVE_HOST, api_key
    )
}

/// Open parameters for one live session.
#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub api_key: String,
    /// Model identifier (default: [`LIVE_MODEL`]).
    pub model: String,
    /// Prebuilt voice identity for the remote speaker.
    pub voice: String,
    /// Behavioral instructions built from the candidate profile.
    pub system_instruction: String,
}

/// Tagged inbound event, one variant per thing the remote peer can signal.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    /// Channel setup acknowledged; streaming may begin.
    SetupComplete,
    /// Synthesized speech chunk (base64 PCM) with its declared format.
    Audio {
        data: String,
        mime_type: Option<String>,
    },
    /// Fragment of the candidate's speech, transcribed by the peer.
    InputTranscript { text: String },
    /// Fragment of the model's own speech.
    OutputTranscript { text: String },
    /// The model finished a response turn.
    TurnComplete,
    /// Barge-in: ongoing playback must stop immediately.
    Interrupted,
    /// Channel-level error.
    Error { message: String },
    /// The channel closed.
    Closed,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerMessage {
    setup_complete: Option<serde_json::Value>,
    server_content: Option<ServerContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerContent {
    model_turn: Option<ModelTurn>,
    output_transcription: Option<Transcription>,
    input_transcription: Option<Transcription>,
    #[serde(default)]
    turn_complete: bool,
    #[serde(default)]
    interrupted: bool,
}

#[derive(Deserialize)]
struct ModelTurn {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: Option<String>,
}

#[derive(Deserialize)]
struct Transcription {
    text: Option<String>,
}

/// Parse one raw server payload into its ordered event sequence. A single
/// message may carry transcript fragments, a turn boundary, audio parts, and
/// an interruption flag all at once.
pub fn parse_server_events(raw: &str) -> serde_json::Result<Vec<LiveEvent>> {
    let message: ServerMessage = serde_json::from_str(raw)?;
    let mut events = Vec::new();

    if message.setup_complete.is_some() {
        events.push(LiveEvent::SetupComplete);
    }

    let Some(content) = message.server_content else {
        return Ok(events);
    };

    if let Some(text) = content.output_transcription.and_then(|t| t.text) {
        events.push(LiveEvent::OutputTranscript { text });
    }
    if let Some(text) = content.input_transcription.and_then(|t| t.text) {
        events.push(LiveEvent::InputTranscript { text });
    }
    if content.turn_complete {
        events.push(LiveEvent::TurnComplete);
    }
    if let Some(turn) = content.model_turn {
        for part in turn.parts {
            if let Some(inline) = part.inline_data {
                if let Some(data) = inline.data {
                    events.push(LiveEvent::Audio {
                        data,
                        mime_type: inline.mime_type,
                    });
                }
            }
        }
    }
    if content.interrupted {
        events.push(LiveEvent::Interrupted);
    }

    Ok(events)
}

fn setup_message(config: &LiveConfig) -> serde_json::Value {
    serde_json::json!({
        "setup": {
            "model": format!("models/{}", config.model),
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": config.voice }
                    }
                },
            },
            "systemInstruction": {
                "parts": [{ "text": config.system_instruction }]
            },
            "inputAudioTranscription": {},
            "outputAudioTranscription": {},
        }
    })
}

enum Outbound {
    Text(String),
    Media { data: String, mime_type: String },
    Close,
}

impl Outbound {
    fn into_ws_message(self) -> Option<tungstenite::Message> {
        let value = match self {
            Outbound::Text(text) => serde_json::json!({
                "realtimeInput": { "text": text }
            }),
            Outbound::Media { data, mime_type } => serde_json::json!({
                "realtimeInput": {
                    "mediaChunks": [{ "mimeType": mime_type, "data": data }]
                }
            }),
            Outbound::Close => return None,
        };
        Some(tungstenite::Message::Text(value.to_string()))
    }
}

/// Handle to the duplex channel. Exclusively owned by the session state
/// machine for the session's lifetime.
pub struct LiveChannel {
    outbound: mpsc::UnboundedSender<Outbound>,
    closed: bool,
}

impl LiveChannel {
    /// Connect, send the setup message, and spawn the read/write halves.
    /// Inbound events arrive on the returned receiver.
    pub async fn connect(
        config: &LiveConfig,
    ) -> VoiceResult<(Self, mpsc::UnboundedReceiver<LiveEvent>)> {
        let url = live_url(&config.api_key);
        info!("Connecting live channel (model {})", config.model);

        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut ws_tx, mut ws_rx) = ws_stream.split();

        ws_tx
            .send(tungstenite::Message::Text(
                setup_message(config).to_string(),
            ))
            .await?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();

        // Write half: forwards outbound messages until Close or sink failure.
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let Some(ws_message) = message.into_ws_message() else {
                    let _ = ws_tx.close().await;
                    break;
                };
                if let Err(e) = ws_tx.send(ws_message).await {
                    // The read half surfaces the failure; outbound frames
                    // are dropped, not retried.
                    warn!("Live channel send failed: {}", e);
                    break;
                }
            }
            debug!("Live channel write half finished");
        });

        // Read half: every server payload becomes zero or more LiveEvents.
        tokio::spawn(async move {
            while let Some(message) = ws_rx.next().await {
                let payload = match message {
                    Ok(tungstenite::Message::Text(text)) => text.to_string(),
                    Ok(tungstenite::Message::Binary(bytes)) => {
                        match String::from_utf8(bytes.to_vec()) {
                            Ok(text) => text,
                            Err(_) => {
                                warn!("Skipping non-UTF8 binary frame");
                                continue;
                            }
                        }
                    }
                    Ok(tungstenite::Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = event_tx.send(LiveEvent::Error {
                            message: e.to_string(),
                        });
                        return;
                    }
                };

                match parse_server_events(&payload) {
                    Ok(events) => {
                        for event in events {
                            if event_tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) => warn!("Skipping unparseable server message: {}", e),
                }
            }
            let _ = event_tx.send(LiveEvent::Closed);
            debug!("Live channel read half finished");
        });

        Ok((
            Self {
                outbound: outbound_tx,
                closed: false,
            },
            event_rx,
        ))
    }

    /// Send a text message (the priming message that forces the remote peer
    /// to speak first).
    pub fn send_text(&self, text: &str) -> VoiceResult<()> {
        self.outbound
            .send(Outbound::Text(text.to_string()))
            .map_err(|_| VoiceError::ChannelSend("live channel is closed".to_string()))
    }

    /// Send one realtime media frame. Errors here mean the channel is gone;
    /// the caller drops the frame and carries on.
    pub fn send_audio(&self, frame: EncodedFrame) -> VoiceResult<()> {
        self.outbound
            .send(Outbound::Media {
                data: frame.data,
                mime_type: frame.mime_type,
            })
            .map_err(|_| VoiceError::ChannelSend("live channel is closed".to_string()))
    }

    /// Close the channel. Idempotent: closing twice is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.outbound.send(Outbound::Close);
    }
}

impl Drop for LiveChannel {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_fragments_parse_to_tagged_events() {
        let raw = r#"{
            "serverContent": {
                "outputTranscription": { "text": "What is" },
                "inputTranscription": { "text": "I think" }
            }
        }"#;
        let events = parse_server_events(raw).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            LiveEvent::OutputTranscript { text } if text == "What is"
        ));
        assert!(matches!(
            &events[1],
            LiveEvent::InputTranscript { text } if text == "I think"
        ));
    }

    #[test]
    fn audio_parts_carry_payload_and_format() {
        let raw = r#"{
            "serverContent": {
                "modelTurn": {
                    "parts": [
                        { "inlineData": { "mimeType": "audio/pcm;rate=24000", "data": "AAAA" } },
                        { "inlineData": { "data": "BBBB" } },
                        {}
                    ]
                }
            }
        }"#;
        let events = parse_server_events(raw).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            LiveEvent::Audio { data, mime_type }
                if data == "AAAA" && mime_type.as_deref() == Some("audio/pcm;rate=24000")
        ));
    }

    #[test]
    fn combined_message_preserves_handling_order() {
        let raw = r#"{
            "serverContent": {
                "outputTranscription": { "text": "frag" },
                "turnComplete": true,
                "modelTurn": { "parts": [{ "inlineData": { "data": "AAAA" } }] },
                "interrupted": true
            }
        }"#;
        let events = parse_server_events(raw).unwrap();
        assert!(matches!(events[0], LiveEvent::OutputTranscript { .. }));
        assert!(matches!(events[1], LiveEvent::TurnComplete));
        assert!(matches!(events[2], LiveEvent::Audio { .. }));
        assert!(matches!(events[3], LiveEvent::Interrupted));
    }

    #[test]
    fn setup_complete_parses() {
        let events = parse_server_events(r#"{ "setupComplete": {} }"#).unwrap();
        assert!(matches!(events[0], LiveEvent::SetupComplete));
    }

    #[test]
    fn empty_message_yields_no_events() {
        assert!(parse_server_events("{}").unwrap().is_empty());
    }

    #[test]
    fn malformed_message_is_an_error_not_a_panic() {
        assert!(parse_server_events("not json").is_err());
    }

    #[test]
    fn setup_message_declares_audio_and_transcription() {
        let config = LiveConfig {
            api_key: "k".into(),
            model: LIVE_MODEL.into(),
            voice: "Puck".into(),
            system_instruction: "Interview the candidate.".into(),
        };
        let setup = setup_message(&config);
        assert_eq!(
            setup["setup"]["generationConfig"]["responseModalities"][0],
            "AUDIO"
        );
        assert_eq!(
            setup["setup"]["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Puck"
        );
        assert!(setup["setup"]["inputAudioTranscription"].is_object());
        assert!(setup["setup"]["outputAudioTranscription"].is_object());
        assert_eq!(
            setup["setup"]["model"],
            format!("models/{}", LIVE_MODEL)
        );
    }
}
