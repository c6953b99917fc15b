//! The onboarding wizard document and its mutation set.
//!
//! The wizard document is the single record holding everything a user
//! enters during onboarding. Step handlers never touch the document
//! directly: they dispatch a [`WizardMutation`], and [`apply`] produces
//! the next document from the current one. Every transform is total --
//! a mutation either transitions the whole document or leaves it
//! untouched (e.g. removing a document at an out-of-range index is a
//! no-op, not an error).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Document shape
// ---------------------------------------------------------------------------

/// Business identity collected on the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub name: String,
}

/// Website and social media links. Only `url` and `linkedin` gate
/// forward progress; the rest are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteInfo {
    pub url: String,
    pub linkedin: String,
    pub facebook: String,
    pub twitter: String,
    pub youtube: String,
}

/// Metadata for an uploaded document. The binary content is never part
/// of the wizard document; `size` must reflect the originating file's
/// actual byte length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size: i64,
}

/// Lifecycle of a voice-interview question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Pending,
    Current,
    Completed,
}

/// One voice-interview question and, once answered, its transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub id: i64,
    pub text: String,
    pub status: QuestionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

/// The canonical interview questions, in their fixed order. The first
/// is seeded `current`, the rest `pending`.
pub fn initial_questions() -> Vec<InterviewQuestion> {
    const TEXTS: [&str; 4] = [
        "ما هي المشكلة الرئيسية التي يحلها منتجك أو خدمتك؟",
        "من هو عميلك المثالي؟",
        "ما الذي يميزك عن المنافسين؟",
        "ما هي أهدافك للأشهر الستة القادمة؟",
    ];
    TEXTS
        .iter()
        .enumerate()
        .map(|(i, text)| InterviewQuestion {
            id: (i + 1) as i64,
            text: (*text).to_string(),
            status: if i == 0 {
                QuestionStatus::Current
            } else {
                QuestionStatus::Pending
            },
            transcript: None,
        })
        .collect()
}

/// The complete wizard document. Serialized as-is into the session's
/// snapshot slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardDocument {
    pub business_info: BusinessInfo,
    pub website: WebsiteInfo,
    pub documents: Vec<DocumentInfo>,
    pub competitors: Vec<String>,
    pub voice_interview: Vec<InterviewQuestion>,
}

impl Default for WizardDocument {
    fn default() -> Self {
        Self {
            business_info: BusinessInfo::default(),
            website: WebsiteInfo::default(),
            documents: Vec::new(),
            // One empty row so the competitors form renders an input.
            competitors: vec![String::new()],
            voice_interview: initial_questions(),
        }
    }
}

impl WizardDocument {
    /// The question currently awaiting an answer, if any.
    pub fn current_question(&self) -> Option<&InterviewQuestion> {
        self.voice_interview
            .iter()
            .find(|q| q.status == QuestionStatus::Current)
    }

    /// True once every interview question carries a transcript.
    pub fn interview_completed(&self) -> bool {
        self.voice_interview
            .iter()
            .all(|q| q.status == QuestionStatus::Completed)
    }

    /// Competitor entries with blank rows filtered out.
    pub fn named_competitors(&self) -> Vec<&str> {
        self.competitors
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// The full mutation vocabulary of the wizard document.
#[derive(Debug, Clone)]
pub enum WizardMutation {
    SetBusinessInfo(BusinessInfo),
    SetWebsiteInfo(WebsiteInfo),
    SetDocuments(Vec<DocumentInfo>),
    AddDocument(DocumentInfo),
    RemoveDocument { index: usize },
    SetCompetitors(Vec<String>),
    SetVoiceInterview(Vec<InterviewQuestion>),
    /// Store a transcript on the matching question, mark it completed,
    /// and promote the next pending question to current. Unknown ids
    /// leave the document unchanged.
    UpdateQuestionTranscript { id: i64, transcript: String },
    Reset,
    /// Full replacement from a previously saved snapshot.
    Hydrate(WizardDocument),
}

/// Produce the next document from `doc` and one mutation.
pub fn apply(doc: &WizardDocument, mutation: WizardMutation) -> WizardDocument {
    let mut next = doc.clone();
    match mutation {
        WizardMutation::SetBusinessInfo(info) => next.business_info = info,
        WizardMutation::SetWebsiteInfo(info) => next.website = info,
        WizardMutation::SetDocuments(docs) => next.documents = docs,
        WizardMutation::AddDocument(doc_info) => next.documents.push(doc_info),
        WizardMutation::RemoveDocument { index } => {
            if index < next.documents.len() {
                next.documents.remove(index);
            }
        }
        WizardMutation::SetCompetitors(competitors) => next.competitors = competitors,
        WizardMutation::SetVoiceInterview(questions) => next.voice_interview = questions,
        WizardMutation::UpdateQuestionTranscript { id, transcript } => {
            let Some(pos) = next.voice_interview.iter().position(|q| q.id == id) else {
                return next;
            };
            next.voice_interview[pos].transcript = Some(transcript);
            next.voice_interview[pos].status = QuestionStatus::Completed;
            // Promote the next pending question so exactly one stays
            // current until the interview is done.
            if let Some(pending) = next
                .voice_interview
                .iter_mut()
                .skip(pos + 1)
                .find(|q| q.status == QuestionStatus::Pending)
            {
                pending.status = QuestionStatus::Current;
            }
        }
        WizardMutation::Reset => next = WizardDocument::default(),
        WizardMutation::Hydrate(snapshot) => next = snapshot,
    }
    next
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(mutations: Vec<WizardMutation>) -> WizardDocument {
        mutations
            .into_iter()
            .fold(WizardDocument::default(), |d, m| apply(&d, m))
    }

    /// At most one question is `current`, except when all are completed.
    fn assert_single_current(doc: &WizardDocument) {
        let current = doc
            .voice_interview
            .iter()
            .filter(|q| q.status == QuestionStatus::Current)
            .count();
        if doc.interview_completed() {
            assert_eq!(current, 0);
        } else {
            assert_eq!(current, 1, "exactly one question must be current");
        }
    }

    #[test]
    fn default_document_seeds_first_question_current() {
        let doc = WizardDocument::default();
        assert_eq!(doc.voice_interview.len(), 4);
        assert_eq!(doc.current_question().map(|q| q.id), Some(1));
        assert_single_current(&doc);
        assert_eq!(doc.competitors, vec![String::new()]);
    }

    #[test]
    fn set_business_info_replaces_name() {
        let doc = doc_with(vec![WizardMutation::SetBusinessInfo(BusinessInfo {
            name: "Acme".into(),
        })]);
        assert_eq!(doc.business_info.name, "Acme");
    }

    #[test]
    fn add_and_remove_documents() {
        let doc = doc_with(vec![
            WizardMutation::AddDocument(DocumentInfo {
                name: "deck.pdf".into(),
                size: 1024,
            }),
            WizardMutation::AddDocument(DocumentInfo {
                name: "pricing.xlsx".into(),
                size: 2048,
            }),
            WizardMutation::RemoveDocument { index: 0 },
        ]);
        assert_eq!(doc.documents.len(), 1);
        assert_eq!(doc.documents[0].name, "pricing.xlsx");
    }

    #[test]
    fn remove_document_out_of_range_is_noop() {
        let doc = doc_with(vec![WizardMutation::AddDocument(DocumentInfo {
            name: "deck.pdf".into(),
            size: 1024,
        })]);
        let after = apply(&doc, WizardMutation::RemoveDocument { index: 5 });
        assert_eq!(after, doc);
    }

    #[test]
    fn transcript_update_advances_current_question() {
        let doc = doc_with(vec![WizardMutation::UpdateQuestionTranscript {
            id: 1,
            transcript: "نساعد الشركات على النمو".into(),
        }]);
        assert_eq!(doc.voice_interview[0].status, QuestionStatus::Completed);
        assert_eq!(
            doc.voice_interview[0].transcript.as_deref(),
            Some("نساعد الشركات على النمو")
        );
        assert_eq!(doc.current_question().map(|q| q.id), Some(2));
        assert_single_current(&doc);
    }

    #[test]
    fn transcript_update_unknown_id_is_noop() {
        let doc = WizardDocument::default();
        let after = apply(
            &doc,
            WizardMutation::UpdateQuestionTranscript {
                id: 99,
                transcript: "?".into(),
            },
        );
        assert_eq!(after, doc);
    }

    #[test]
    fn answering_all_questions_completes_interview() {
        let mut doc = WizardDocument::default();
        for id in 1..=4 {
            doc = apply(
                &doc,
                WizardMutation::UpdateQuestionTranscript {
                    id,
                    transcript: format!("answer {id}"),
                },
            );
            assert_single_current(&doc);
        }
        assert!(doc.interview_completed());
        assert!(doc.current_question().is_none());
    }

    #[test]
    fn reset_restores_defaults() {
        let doc = doc_with(vec![
            WizardMutation::SetBusinessInfo(BusinessInfo {
                name: "Acme".into(),
            }),
            WizardMutation::Reset,
        ]);
        assert_eq!(doc, WizardDocument::default());
    }

    #[test]
    fn hydrate_replaces_whole_document() {
        let snapshot = doc_with(vec![WizardMutation::SetCompetitors(vec![
            "https://rival.example".into(),
        ])]);
        let doc = apply(&WizardDocument::default(), WizardMutation::Hydrate(snapshot.clone()));
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn named_competitors_filters_blank_rows() {
        let doc = doc_with(vec![WizardMutation::SetCompetitors(vec![
            " https://a.example ".into(),
            String::new(),
            "  ".into(),
            "https://b.example".into(),
        ])]);
        assert_eq!(
            doc.named_competitors(),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn serde_round_trip_is_identity() {
        let doc = doc_with(vec![
            WizardMutation::SetBusinessInfo(BusinessInfo {
                name: "Acme".into(),
            }),
            WizardMutation::SetWebsiteInfo(WebsiteInfo {
                url: "https://acme.example".into(),
                linkedin: "https://linkedin.com/company/acme".into(),
                ..Default::default()
            }),
            WizardMutation::AddDocument(DocumentInfo {
                name: "deck.pdf".into(),
                size: 512,
            }),
            WizardMutation::UpdateQuestionTranscript {
                id: 1,
                transcript: "first answer".into(),
            },
        ]);
        let json = serde_json::to_string(&doc).unwrap();
        let restored: WizardDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, doc);
    }
}
