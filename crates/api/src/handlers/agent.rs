//! Handlers for the voice-agent confirmation call.
//!
//! The confirmation step seeds a real-time agent conversation with the
//! collected wizard data. `session` returns the seeded variables for
//! inspection; `ws` bridges the browser to a live [`AgentSession`],
//! forwarding conversation events outward and user text inward. Agent
//! messages that discuss a reviewable step carry an `edit_route` so the
//! client can offer the "jump back to step X" escape hatch.

use std::collections::BTreeMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use nexlead_core::error::CoreError;
use nexlead_core::steps::OnboardingStep;
use nexlead_core::wizard::{QuestionStatus, WizardDocument};
use nexlead_voice::agent::{AgentEvent, AgentSession, MessageSource};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::validate_token;
use crate::error::{AppError, AppResult};
use crate::handlers::wizard::load_document;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Placeholder for absent values, matching the agent's prompt language.
const NOT_PROVIDED: &str = "غير محدد";

// ---------------------------------------------------------------------------
// Dynamic variables
// ---------------------------------------------------------------------------

/// Build the string map that seeds the agent's context from the wizard
/// document.
pub(crate) fn build_dynamic_variables(doc: &WizardDocument) -> BTreeMap<String, String> {
    let mut social_links = Vec::new();
    if !doc.website.linkedin.is_empty() {
        social_links.push(format!("لينكد إن: {}", doc.website.linkedin));
    }
    if !doc.website.facebook.is_empty() {
        social_links.push(format!("فيسبوك: {}", doc.website.facebook));
    }
    if !doc.website.twitter.is_empty() {
        social_links.push(format!("تويتر: {}", doc.website.twitter));
    }
    if !doc.website.youtube.is_empty() {
        social_links.push(format!("يوتيوب: {}", doc.website.youtube));
    }

    let competitors = doc.named_competitors().join("، ");

    let answers: Vec<String> = doc
        .voice_interview
        .iter()
        .filter(|q| q.status == QuestionStatus::Completed)
        .filter_map(|q| {
            q.transcript
                .as_ref()
                .map(|t| (q.text.as_str(), t.as_str()))
        })
        .enumerate()
        .map(|(i, (text, transcript))| format!("{}. {text}: \"{transcript}\"", i + 1))
        .collect();

    BTreeMap::from([
        (
            "business_name".to_string(),
            non_empty_or(&doc.business_info.name, NOT_PROVIDED),
        ),
        (
            "website_url".to_string(),
            non_empty_or(&doc.website.url, NOT_PROVIDED),
        ),
        (
            "social_links".to_string(),
            non_empty_or(&social_links.join("، "), "غير محددة"),
        ),
        (
            "competitors".to_string(),
            non_empty_or(&competitors, "غير محددين"),
        ),
        (
            "interview_answers".to_string(),
            non_empty_or(&answers.join(" | "), "لم تكتمل"),
        ),
    ])
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Step detection
// ---------------------------------------------------------------------------

/// Keyword sets mapping an agent utterance to the step it reviews.
/// First match wins.
const REVIEW_KEYWORDS: [(&[&str], OnboardingStep); 5] = [
    (&["اسم", "نشاط", "تجاري"], OnboardingStep::BusinessInfo),
    (&["موقع", "إلكتروني", "الموقع"], OnboardingStep::Website),
    (
        &["تواصل", "اجتماعي", "لينكد", "فيسبوك", "تويتر"],
        OnboardingStep::Website,
    ),
    (&["منافس", "منافسين", "منافسون"], OnboardingStep::Competitors),
    (
        &["مقابلة", "صوتية", "إجابات"],
        OnboardingStep::VoiceInterview,
    ),
];

/// Which step, if any, an agent message is discussing -- the target of
/// the "jump back to step X" affordance.
pub(crate) fn detect_review_step(message: &str) -> Option<OnboardingStep> {
    REVIEW_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| message.contains(k)))
        .map(|(_, step)| *step)
}

// ---------------------------------------------------------------------------
// POST /onboarding/agent/session
// ---------------------------------------------------------------------------

/// Configuration handed to the confirmation page before a call.
#[derive(Debug, Serialize)]
pub struct AgentSessionInfo {
    pub agent_id: String,
    pub dynamic_variables: BTreeMap<String, String>,
}

pub async fn session(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<AgentSessionInfo>>> {
    let Some(agent) = &state.agent else {
        return Err(AppError::InternalError(
            "Voice agent is not configured".to_string(),
        ));
    };

    let document = load_document(&state.pool, auth.session_id).await?;
    Ok(Json(DataResponse {
        data: AgentSessionInfo {
            agent_id: agent.agent_id.clone(),
            dynamic_variables: build_dynamic_variables(&document),
        },
    }))
}

// ---------------------------------------------------------------------------
// GET /onboarding/agent/ws
// ---------------------------------------------------------------------------

/// Query parameters for the WebSocket upgrade. Browsers cannot set an
/// `Authorization` header on WebSocket requests, so the access token
/// travels as a query parameter.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: String,
}

/// Frames accepted from the browser side of the bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    UserMessage { text: String },
    End,
}

pub async fn ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> AppResult<impl IntoResponse> {
    let claims = validate_token(&params.token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    Ok(ws.on_upgrade(move |socket| bridge(socket, state, claims.sub, claims.sid)))
}

/// Bridge a browser socket to a live agent session: agent events flow
/// out as JSON, user text flows in. Closing either side tears down the
/// other.
async fn bridge(socket: WebSocket, state: AppState, user_id: i64, session_id: i64) {
    let (mut sink, mut stream) = socket.split();

    let Some(agent_config) = state.agent.clone() else {
        let _ = send_error(&mut sink, "Voice agent is not configured").await;
        return;
    };

    let document = match load_document(&state.pool, session_id).await {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(user_id, error = %e, "Failed to load wizard document for call");
            let _ = send_error(&mut sink, "Failed to load onboarding data").await;
            return;
        }
    };

    let variables = build_dynamic_variables(&document);
    let (agent_session, mut events) = match AgentSession::start(&agent_config, variables).await {
        Ok(started) => started,
        Err(e) => {
            tracing::warn!(user_id, error = %e, "Voice-agent connection failed");
            let _ = send_error(&mut sink, "Could not reach the voice agent").await;
            return;
        }
    };

    tracing::info!(user_id, "Voice-agent bridge opened");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let disconnected = event == AgentEvent::Disconnected;
                    let payload = render_event(&event);
                    if sink.send(Message::Text(payload.to_string().into())).await.is_err() {
                        break;
                    }
                    if disconnected {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id, skipped, "Bridge lagged behind agent events");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(raw))) => {
                    match serde_json::from_str::<ClientFrame>(raw.as_str()) {
                        Ok(ClientFrame::UserMessage { text }) => {
                            if agent_session.say(text).is_err() {
                                break;
                            }
                        }
                        Ok(ClientFrame::End) => {
                            agent_session.end();
                        }
                        Err(_) => {
                            tracing::debug!(user_id, "Ignoring malformed client frame");
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(user_id, error = %e, "Bridge receive error");
                    break;
                }
            },
        }
    }

    // Ending the call tears down the upstream socket synchronously with
    // the triggering close.
    agent_session.end();
    tracing::info!(user_id, "Voice-agent bridge closed");
}

/// Serialize an event for the browser, attaching the review escape
/// hatch to agent messages that discuss an editable step.
fn render_event(event: &AgentEvent) -> serde_json::Value {
    let mut value = serde_json::to_value(event).unwrap_or_else(|_| {
        serde_json::json!({ "type": "error", "message": "unrenderable event" })
    });
    if let AgentEvent::Message {
        source: MessageSource::Agent,
        text,
    } = event
    {
        if let Some(step) = detect_review_step(text) {
            value["edit_route"] = serde_json::json!(step.route());
        }
    }
    value
}

async fn send_error(sink: &mut SplitSink<WebSocket, Message>, message: &str) -> Result<(), ()> {
    let payload = serde_json::json!({ "type": "error", "message": message }).to_string();
    sink.send(Message::Text(payload.into())).await.map_err(|_| ())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nexlead_core::wizard::{apply, BusinessInfo, WebsiteInfo, WizardMutation};

    fn answered_doc() -> WizardDocument {
        let mut doc = WizardDocument::default();
        doc = apply(
            &doc,
            WizardMutation::SetBusinessInfo(BusinessInfo { name: "Acme".into() }),
        );
        doc = apply(
            &doc,
            WizardMutation::SetWebsiteInfo(WebsiteInfo {
                url: "https://acme.example".into(),
                linkedin: "https://linkedin.com/company/acme".into(),
                ..Default::default()
            }),
        );
        doc = apply(
            &doc,
            WizardMutation::SetCompetitors(vec!["https://rival.example".into()]),
        );
        apply(
            &doc,
            WizardMutation::UpdateQuestionTranscript {
                id: 1,
                transcript: "نساعد الشركات على النمو".into(),
            },
        )
    }

    #[test]
    fn variables_carry_collected_data() {
        let vars = build_dynamic_variables(&answered_doc());
        assert_eq!(vars["business_name"], "Acme");
        assert_eq!(vars["website_url"], "https://acme.example");
        assert!(vars["social_links"].contains("لينكد إن"));
        assert_eq!(vars["competitors"], "https://rival.example");
        assert!(vars["interview_answers"].starts_with("1. "));
        assert!(vars["interview_answers"].contains("نساعد الشركات"));
    }

    #[test]
    fn variables_fall_back_to_placeholders() {
        let vars = build_dynamic_variables(&WizardDocument::default());
        assert_eq!(vars["business_name"], NOT_PROVIDED);
        assert_eq!(vars["website_url"], NOT_PROVIDED);
        assert_eq!(vars["social_links"], "غير محددة");
        assert_eq!(vars["competitors"], "غير محددين");
        assert_eq!(vars["interview_answers"], "لم تكتمل");
    }

    #[test]
    fn review_detection_maps_topics_to_steps() {
        assert_eq!(
            detect_review_step("هل اسم نشاطك التجاري صحيح؟"),
            Some(OnboardingStep::BusinessInfo)
        );
        assert_eq!(
            detect_review_step("لنراجع الموقع الإلكتروني"),
            Some(OnboardingStep::Website)
        );
        assert_eq!(
            detect_review_step("هل قائمة المنافسين مكتملة؟"),
            Some(OnboardingStep::Competitors)
        );
        assert_eq!(
            detect_review_step("لنتحدث عن المقابلة الصوتية"),
            Some(OnboardingStep::VoiceInterview)
        );
        assert_eq!(detect_review_step("كيف حالك اليوم؟"), None);
    }

    #[test]
    fn rendered_agent_messages_include_edit_route() {
        let event = AgentEvent::Message {
            source: MessageSource::Agent,
            text: "هل تريد تعديل المنافسين؟".into(),
        };
        let value = render_event(&event);
        assert_eq!(value["edit_route"], "/onboarding/competitors");

        let user_event = AgentEvent::Message {
            source: MessageSource::User,
            text: "المنافسين".into(),
        };
        assert!(render_event(&user_event).get("edit_route").is_none());
    }
}
