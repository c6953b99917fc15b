//! Per-question recording state machine for the voice interview.
//!
//! Models the capture / transcription / preview loop for a single
//! question as an explicit state machine. Callbacks from the audio and
//! transcription layers only ever trigger one of the named transitions
//! below; the machine itself never performs I/O. Recording is capped at
//! [`MAX_RECORDING_SECS`]: callers are expected to invoke
//! [`RecordingSession::tick`] when they observe the clock so an
//! overrunning capture is force-stopped.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Hard ceiling on a single recording, in seconds.
pub const MAX_RECORDING_SECS: i64 = 180;

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// The named states of the recording loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RecorderPhase {
    /// No capture in progress; also the state after a failed
    /// transcription (retry by starting again).
    Idle,
    /// Audio is being captured.
    Recording { started_at: Timestamp },
    /// Captured audio has been handed to the transcription collaborator.
    Transcribing,
    /// A transcript is available for review; `editing` toggles the
    /// edit affordance.
    Previewing { transcript: String, editing: bool },
}

/// The recording loop for the question currently being answered.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    phase: RecorderPhase,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self {
            phase: RecorderPhase::Idle,
        }
    }
}

impl RecordingSession {
    pub fn phase(&self) -> &RecorderPhase {
        &self.phase
    }

    /// Seconds elapsed since capture started, clamped to the ceiling.
    /// Zero outside the recording phase.
    pub fn elapsed_secs(&self, now: Timestamp) -> i64 {
        match &self.phase {
            RecorderPhase::Recording { started_at } => {
                (now - *started_at).num_seconds().clamp(0, MAX_RECORDING_SECS)
            }
            _ => 0,
        }
    }

    /// Begin capturing. Valid from idle or from a preview (discarding
    /// the pending transcript).
    pub fn start(&mut self, now: Timestamp) -> Result<(), CoreError> {
        match self.phase {
            RecorderPhase::Idle | RecorderPhase::Previewing { .. } => {
                self.phase = RecorderPhase::Recording { started_at: now };
                Ok(())
            }
            RecorderPhase::Recording { .. } => Err(CoreError::Conflict(
                "Recording is already in progress".to_string(),
            )),
            RecorderPhase::Transcribing => Err(CoreError::Conflict(
                "Transcription is still in progress".to_string(),
            )),
        }
    }

    /// Observe the clock: force-stop a capture that has reached the
    /// ceiling. Returns `true` if the capture was stopped.
    pub fn tick(&mut self, now: Timestamp) -> bool {
        if let RecorderPhase::Recording { started_at } = self.phase {
            if (now - started_at).num_seconds() >= MAX_RECORDING_SECS {
                self.phase = RecorderPhase::Transcribing;
                return true;
            }
        }
        false
    }

    /// Stop capturing and hand off to transcription. Returns the
    /// capture duration in seconds, clamped to the ceiling.
    pub fn stop(&mut self, now: Timestamp) -> Result<i64, CoreError> {
        match self.phase {
            RecorderPhase::Recording { started_at } => {
                let duration = (now - started_at).num_seconds().clamp(0, MAX_RECORDING_SECS);
                self.phase = RecorderPhase::Transcribing;
                Ok(duration)
            }
            _ => Err(CoreError::Validation(
                "No recording in progress".to_string(),
            )),
        }
    }

    /// The transcription collaborator returned text: surface it for
    /// review.
    pub fn transcription_succeeded(&mut self, transcript: String) {
        if self.phase == RecorderPhase::Transcribing {
            self.phase = RecorderPhase::Previewing {
                transcript,
                editing: false,
            };
        }
    }

    /// The transcription collaborator failed. Not an error: the user
    /// simply ends up with no transcript and may record again.
    pub fn transcription_failed(&mut self) {
        if self.phase == RecorderPhase::Transcribing {
            self.phase = RecorderPhase::Idle;
        }
    }

    /// Toggle the preview's edit affordance.
    pub fn set_editing(&mut self, editing: bool) -> Result<(), CoreError> {
        match &mut self.phase {
            RecorderPhase::Previewing { editing: e, .. } => {
                *e = editing;
                Ok(())
            }
            _ => Err(CoreError::Validation("No transcript to edit".to_string())),
        }
    }

    /// Replace the preview text. Edits touch only the in-memory
    /// preview, never the persisted wizard document.
    pub fn edit_transcript(&mut self, text: String) -> Result<(), CoreError> {
        match &mut self.phase {
            RecorderPhase::Previewing {
                transcript,
                editing: true,
            } => {
                *transcript = text;
                Ok(())
            }
            RecorderPhase::Previewing { editing: false, .. } => Err(CoreError::Validation(
                "Enable editing before changing the transcript".to_string(),
            )),
            _ => Err(CoreError::Validation("No transcript to edit".to_string())),
        }
    }

    /// Accept the preview: the machine returns to idle for the next
    /// question and yields the confirmed transcript.
    pub fn confirm(&mut self) -> Result<String, CoreError> {
        match std::mem::replace(&mut self.phase, RecorderPhase::Idle) {
            RecorderPhase::Previewing { transcript, .. } => Ok(transcript),
            other => {
                self.phase = other;
                Err(CoreError::Validation(
                    "No transcript to confirm".to_string(),
                ))
            }
        }
    }

    /// Discard whatever is in flight and begin a fresh capture
    /// immediately, with no idle layover.
    pub fn restart(&mut self, now: Timestamp) {
        self.phase = RecorderPhase::Recording { started_at: now };
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn starts_idle() {
        let session = RecordingSession::default();
        assert_eq!(*session.phase(), RecorderPhase::Idle);
        assert_eq!(session.elapsed_secs(t0()), 0);
    }

    #[test]
    fn start_stop_hands_off_to_transcription() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        assert_matches!(session.phase(), RecorderPhase::Recording { .. });

        let duration = session.stop(t0() + Duration::seconds(42)).unwrap();
        assert_eq!(duration, 42);
        assert_eq!(*session.phase(), RecorderPhase::Transcribing);
    }

    #[test]
    fn double_start_is_rejected() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        assert!(session.start(t0()).is_err());
    }

    #[test]
    fn tick_force_stops_at_ceiling() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();

        assert!(!session.tick(t0() + Duration::seconds(MAX_RECORDING_SECS - 1)));
        assert_matches!(session.phase(), RecorderPhase::Recording { .. });

        assert!(session.tick(t0() + Duration::seconds(MAX_RECORDING_SECS)));
        assert_eq!(*session.phase(), RecorderPhase::Transcribing);
    }

    #[test]
    fn stop_clamps_duration_to_ceiling() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        let duration = session.stop(t0() + Duration::seconds(500)).unwrap();
        assert_eq!(duration, MAX_RECORDING_SECS);
    }

    #[test]
    fn successful_transcription_opens_preview() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        session.stop(t0() + Duration::seconds(5)).unwrap();
        session.transcription_succeeded("hello".into());
        assert_eq!(
            *session.phase(),
            RecorderPhase::Previewing {
                transcript: "hello".into(),
                editing: false,
            }
        );
    }

    #[test]
    fn failed_transcription_returns_to_idle_with_no_transcript() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        session.stop(t0() + Duration::seconds(5)).unwrap();
        session.transcription_failed();
        assert_eq!(*session.phase(), RecorderPhase::Idle);

        // The user can retry right away.
        assert!(session.start(t0()).is_ok());
    }

    #[test]
    fn edit_requires_editing_mode() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        session.stop(t0()).unwrap();
        session.transcription_succeeded("draft".into());

        assert!(session.edit_transcript("changed".into()).is_err());

        session.set_editing(true).unwrap();
        session.edit_transcript("changed".into()).unwrap();
        assert_matches!(
            session.phase(),
            RecorderPhase::Previewing { transcript, .. } if transcript == "changed"
        );
    }

    #[test]
    fn confirm_yields_transcript_and_resets() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        session.stop(t0()).unwrap();
        session.transcription_succeeded("final answer".into());

        let transcript = session.confirm().unwrap();
        assert_eq!(transcript, "final answer");
        assert_eq!(*session.phase(), RecorderPhase::Idle);
    }

    #[test]
    fn confirm_without_preview_fails_and_preserves_state() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        assert!(session.confirm().is_err());
        assert_matches!(session.phase(), RecorderPhase::Recording { .. });
    }

    #[test]
    fn restart_discards_preview_and_records_immediately() {
        let mut session = RecordingSession::default();
        session.start(t0()).unwrap();
        session.stop(t0()).unwrap();
        session.transcription_succeeded("draft".into());

        session.restart(t0() + Duration::seconds(10));
        assert_matches!(session.phase(), RecorderPhase::Recording { .. });
        assert_eq!(session.elapsed_secs(t0() + Duration::seconds(15)), 5);
    }
}
