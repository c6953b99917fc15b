//! Clients for the two external voice services: speech-to-text
//! transcription (HTTP) and the real-time conversational voice agent
//! (WebSocket).

pub mod agent;
pub mod transcribe;
