//! Real-time conversational voice-agent session.
//!
//! [`AgentSession`] holds a live WebSocket conversation with the
//! voice-agent service, seeded with a map of dynamic variables built
//! from the wizard document. Inbound frames are translated into
//! [`AgentEvent`]s on a broadcast channel; outbound user text is queued
//! through the session handle. Ending the session (or dropping the
//! handle) closes the socket.

use std::collections::BTreeMap;

use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async;

/// Default conversation WebSocket endpoint.
const DEFAULT_WS_URL: &str = "wss://api.elevenlabs.io/v1/convai/conversation";

/// Capacity of the event broadcast channel per session.
const EVENT_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the voice-agent service.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Identifier of the configured conversational agent.
    pub agent_id: String,
    /// WebSocket endpoint (agent id is appended as a query parameter).
    pub ws_url: String,
    /// Optional API key sent as the `xi-api-key` header.
    pub api_key: Option<String>,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `VOICE_AGENT_ID` is not set, signalling that
    /// the confirmation call is not configured.
    ///
    /// | Variable              | Required | Default                        |
    /// |-----------------------|----------|--------------------------------|
    /// | `VOICE_AGENT_ID`      | yes      | —                              |
    /// | `VOICE_AGENT_WS_URL`  | no       | ElevenLabs conversation URL    |
    /// | `VOICE_AGENT_API_KEY` | no       | —                              |
    pub fn from_env() -> Option<Self> {
        let agent_id = std::env::var("VOICE_AGENT_ID").ok()?;
        Some(Self {
            agent_id,
            ws_url: std::env::var("VOICE_AGENT_WS_URL")
                .unwrap_or_else(|_| DEFAULT_WS_URL.to_string()),
            api_key: std::env::var("VOICE_AGENT_API_KEY").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    User,
    Agent,
}

/// Lifecycle and message events emitted by an agent session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Connected,
    Message { source: MessageSource, text: String },
    Disconnected,
    Error { message: String },
}

/// Errors from starting or driving a session.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session already ended")]
    Ended,
}

// ---------------------------------------------------------------------------
// Wire frames
// ---------------------------------------------------------------------------

/// The session-opening frame carrying the seeded context.
fn initiation_frame(dynamic_variables: &BTreeMap<String, String>) -> String {
    serde_json::json!({
        "type": "conversation_initiation_client_data",
        "dynamic_variables": dynamic_variables,
    })
    .to_string()
}

/// A typed user text message.
fn user_message_frame(text: &str) -> String {
    serde_json::json!({ "type": "user_message", "text": text }).to_string()
}

/// What an inbound frame asks of the read loop.
#[derive(Debug, PartialEq)]
enum InboundFrame {
    Event(AgentEvent),
    /// Keepalive that must be answered with a pong carrying the same
    /// event id.
    Ping { event_id: i64 },
    Ignored,
}

/// Translate one inbound text frame. Unknown frame types are ignored
/// rather than failing the session.
fn parse_frame(raw: &str) -> InboundFrame {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return InboundFrame::Ignored;
    };
    match value["type"].as_str() {
        Some("agent_response") => value["agent_response_event"]["agent_response"]
            .as_str()
            .map(|text| {
                InboundFrame::Event(AgentEvent::Message {
                    source: MessageSource::Agent,
                    text: text.to_string(),
                })
            })
            .unwrap_or(InboundFrame::Ignored),
        Some("user_transcript") => value["user_transcript_event"]["user_transcript"]
            .as_str()
            .map(|text| {
                InboundFrame::Event(AgentEvent::Message {
                    source: MessageSource::User,
                    text: text.to_string(),
                })
            })
            .unwrap_or(InboundFrame::Ignored),
        Some("ping") => InboundFrame::Ping {
            event_id: value["ping_event"]["event_id"].as_i64().unwrap_or(0),
        },
        _ => InboundFrame::Ignored,
    }
}

fn pong_frame(event_id: i64) -> String {
    serde_json::json!({ "type": "pong", "event_id": event_id }).to_string()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

enum Command {
    Say(String),
    End,
}

/// Handle to a live voice-agent conversation.
pub struct AgentSession {
    events: broadcast::Sender<AgentEvent>,
    commands: mpsc::UnboundedSender<Command>,
}

impl AgentSession {
    /// Open the WebSocket, send the initiation frame with the seeded
    /// dynamic variables, and spawn the read/write loop.
    ///
    /// Returns the session handle together with an event receiver that
    /// already holds the `Connected` event; receivers created later via
    /// [`subscribe`](Self::subscribe) only see subsequent events.
    pub async fn start(
        config: &AgentConfig,
        dynamic_variables: BTreeMap<String, String>,
    ) -> Result<(Self, broadcast::Receiver<AgentEvent>), AgentError> {
        let url = format!("{}?agent_id={}", config.ws_url, config.agent_id);
        let mut request = url
            .clone()
            .into_client_request()
            .map_err(|e| AgentError::Connection(e.to_string()))?;
        if let Some(key) = &config.api_key {
            let header = HeaderValue::from_str(key)
                .map_err(|e| AgentError::Connection(e.to_string()))?;
            request.headers_mut().insert("xi-api-key", header);
        }

        let (mut ws_stream, _response) = connect_async(request)
            .await
            .map_err(|e| AgentError::Connection(format!("Failed to connect to {url}: {e}")))?;

        ws_stream
            .send(Message::Text(initiation_frame(&dynamic_variables)))
            .await
            .map_err(|e| AgentError::Connection(e.to_string()))?;

        tracing::info!(agent_id = %config.agent_id, "Voice-agent session started");

        let (events, initial_rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (commands, command_rx) = mpsc::unbounded_channel();

        // Buffered into `initial_rx`, which exists before the send.
        let _ = events.send(AgentEvent::Connected);
        tokio::spawn(run_session(ws_stream, command_rx, events.clone()));

        Ok((Self { events, commands }, initial_rx))
    }

    /// Subscribe to the session's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.events.subscribe()
    }

    /// Queue a user text message to the agent.
    pub fn say(&self, text: String) -> Result<(), AgentError> {
        self.commands
            .send(Command::Say(text))
            .map_err(|_| AgentError::Ended)
    }

    /// End the call: the socket is closed as a direct consequence of
    /// this command, not on a timeout.
    pub fn end(&self) {
        let _ = self.commands.send(Command::End);
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn run_session(
    ws_stream: WsStream,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: broadcast::Sender<AgentEvent>,
) {
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Say(text)) => {
                    if sink.send(Message::Text(user_message_frame(&text))).await.is_err() {
                        let _ = events.send(AgentEvent::Error {
                            message: "Failed to send message".to_string(),
                        });
                        break;
                    }
                }
                // A dropped handle ends the call the same way an
                // explicit end does.
                Some(Command::End) | None => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(raw))) => match parse_frame(&raw) {
                    InboundFrame::Event(event) => {
                        let _ = events.send(event);
                    }
                    InboundFrame::Ping { event_id } => {
                        if sink.send(Message::Text(pong_frame(event_id))).await.is_err() {
                            break;
                        }
                    }
                    InboundFrame::Ignored => {}
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "Voice-agent receive error");
                    let _ = events.send(AgentEvent::Error { message: e.to_string() });
                    break;
                }
            },
        }
    }

    let _ = events.send(AgentEvent::Disconnected);
    tracing::info!("Voice-agent session closed");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn initiation_frame_carries_variables() {
        let mut vars = BTreeMap::new();
        vars.insert("business_name".to_string(), "Acme".to_string());
        let value: serde_json::Value = serde_json::from_str(&initiation_frame(&vars)).unwrap();
        assert_eq!(value["type"], "conversation_initiation_client_data");
        assert_eq!(value["dynamic_variables"]["business_name"], "Acme");
    }

    #[test]
    fn agent_response_frame_becomes_agent_message() {
        let frame = r#"{"type":"agent_response","agent_response_event":{"agent_response":"مرحبا"}}"#;
        assert_eq!(
            parse_frame(frame),
            InboundFrame::Event(AgentEvent::Message {
                source: MessageSource::Agent,
                text: "مرحبا".to_string(),
            })
        );
    }

    #[test]
    fn user_transcript_frame_becomes_user_message() {
        let frame =
            r#"{"type":"user_transcript","user_transcript_event":{"user_transcript":"نعم"}}"#;
        assert_eq!(
            parse_frame(frame),
            InboundFrame::Event(AgentEvent::Message {
                source: MessageSource::User,
                text: "نعم".to_string(),
            })
        );
    }

    #[test]
    fn ping_frame_requests_pong_with_event_id() {
        let frame = r#"{"type":"ping","ping_event":{"event_id":7}}"#;
        assert_eq!(parse_frame(frame), InboundFrame::Ping { event_id: 7 });
        let pong: serde_json::Value = serde_json::from_str(&pong_frame(7)).unwrap();
        assert_eq!(pong["type"], "pong");
        assert_eq!(pong["event_id"], 7);
    }

    #[test]
    fn unknown_and_malformed_frames_are_ignored() {
        assert_matches!(parse_frame("not json"), InboundFrame::Ignored);
        assert_matches!(parse_frame(r#"{"type":"audio"}"#), InboundFrame::Ignored);
        assert_matches!(parse_frame(r#"{"type":"agent_response"}"#), InboundFrame::Ignored);
    }

    #[test]
    fn event_serialization_for_bridge_clients() {
        let event = AgentEvent::Message {
            source: MessageSource::Agent,
            text: "hello".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["source"], "agent");
        assert_eq!(json["text"], "hello");
    }
}
