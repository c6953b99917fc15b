//! Onboarding step sequencing and per-step completion criteria.
//!
//! Defines the fixed step order, progress derivation, and the
//! completion capability each step implements against the wizard
//! document, so navigation logic stays generic over steps.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::wizard::WizardDocument;

// ---------------------------------------------------------------------------
// Onboarding steps
// ---------------------------------------------------------------------------

/// The six steps of the onboarding wizard, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    BusinessInfo,
    Website,
    Documents,
    Competitors,
    VoiceInterview,
    Confirmation,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 6;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 6;

/// All steps in wizard order.
pub const STEPS: [OnboardingStep; TOTAL_STEPS as usize] = [
    OnboardingStep::BusinessInfo,
    OnboardingStep::Website,
    OnboardingStep::Documents,
    OnboardingStep::Competitors,
    OnboardingStep::VoiceInterview,
    OnboardingStep::Confirmation,
];

impl OnboardingStep {
    /// Convert a 1-based step number to an `OnboardingStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::BusinessInfo),
            2 => Ok(Self::Website),
            3 => Ok(Self::Documents),
            4 => Ok(Self::Competitors),
            5 => Ok(Self::VoiceInterview),
            6 => Ok(Self::Confirmation),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::BusinessInfo => 1,
            Self::Website => 2,
            Self::Documents => 3,
            Self::Competitors => 4,
            Self::VoiceInterview => 5,
            Self::Confirmation => 6,
        }
    }

    /// Human-readable label for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::BusinessInfo => "معلومات العمل",
            Self::Website => "موقعك الإلكتروني",
            Self::Documents => "المستندات",
            Self::Competitors => "المنافسون",
            Self::VoiceInterview => "المقابلة الصوتية",
            Self::Confirmation => "التأكيد",
        }
    }

    /// Frontend route for the step page.
    pub fn route(self) -> &'static str {
        match self {
            Self::BusinessInfo => "/onboarding/business-info",
            Self::Website => "/onboarding/website",
            Self::Documents => "/onboarding/documents",
            Self::Competitors => "/onboarding/competitors",
            Self::VoiceInterview => "/onboarding/voice-interview",
            Self::Confirmation => "/onboarding/confirmation",
        }
    }

    /// Steps that offer a skip affordance: advancing without meeting
    /// the completion criterion.
    pub fn is_optional(self) -> bool {
        matches!(self, Self::Documents | Self::VoiceInterview)
    }

    /// The next step in sequence, or `None` on the last step.
    pub fn next(self) -> Option<Self> {
        Self::from_number(self.to_number() + 1).ok()
    }

    /// The previous step in sequence, or `None` on the first step.
    pub fn prev(self) -> Option<Self> {
        self.to_number()
            .checked_sub(1)
            .and_then(|n| Self::from_number(n).ok())
    }

    /// Progress-bar percentage when this step is active.
    pub fn progress_percent(self) -> u8 {
        (self.to_number() as u16 * 100 / TOTAL_STEPS as u16) as u8
    }

    /// Whether the wizard document satisfies this step's forward
    /// navigation criterion. Each step is the sole authority for its
    /// own gate; optional steps are always passable via skip.
    pub fn is_complete(self, doc: &WizardDocument) -> bool {
        match self {
            Self::BusinessInfo => !doc.business_info.name.trim().is_empty(),
            Self::Website => {
                !doc.website.url.trim().is_empty() && !doc.website.linkedin.trim().is_empty()
            }
            Self::Documents => true,
            Self::Competitors => !doc.named_competitors().is_empty(),
            Self::VoiceInterview => doc.interview_completed(),
            Self::Confirmation => true,
        }
    }
}

/// The first incomplete step in wizard order, used to resume a
/// rehydrated session at the right page. A fully complete document
/// lands on the confirmation step.
pub fn resume_step(doc: &WizardDocument) -> OnboardingStep {
    STEPS
        .iter()
        .copied()
        .find(|s| !s.is_complete(doc))
        .unwrap_or(OnboardingStep::Confirmation)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{apply, BusinessInfo, WebsiteInfo, WizardMutation};

    #[test]
    fn step_from_number_roundtrip() {
        for n in MIN_STEP..=MAX_STEP {
            let step = OnboardingStep::from_number(n).unwrap();
            assert_eq!(step.to_number(), n);
        }
    }

    #[test]
    fn step_from_number_invalid() {
        assert!(OnboardingStep::from_number(0).is_err());
        assert!(OnboardingStep::from_number(7).is_err());
    }

    #[test]
    fn labels_and_routes_are_nonempty() {
        for step in STEPS {
            assert!(!step.label().is_empty());
            assert!(step.route().starts_with("/onboarding/"));
        }
    }

    #[test]
    fn next_and_prev_walk_the_sequence() {
        assert_eq!(
            OnboardingStep::BusinessInfo.next(),
            Some(OnboardingStep::Website)
        );
        assert_eq!(OnboardingStep::Confirmation.next(), None);
        assert_eq!(OnboardingStep::BusinessInfo.prev(), None);
        assert_eq!(
            OnboardingStep::Confirmation.prev(),
            Some(OnboardingStep::VoiceInterview)
        );
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_100() {
        let mut last = 0;
        for step in STEPS {
            let pct = step.progress_percent();
            assert!(pct > last);
            last = pct;
        }
        assert_eq!(OnboardingStep::Confirmation.progress_percent(), 100);
    }

    #[test]
    fn optional_steps() {
        assert!(OnboardingStep::Documents.is_optional());
        assert!(OnboardingStep::VoiceInterview.is_optional());
        assert!(!OnboardingStep::BusinessInfo.is_optional());
    }

    #[test]
    fn business_info_gate_requires_name() {
        let doc = WizardDocument::default();
        assert!(!OnboardingStep::BusinessInfo.is_complete(&doc));

        let doc = apply(
            &doc,
            WizardMutation::SetBusinessInfo(BusinessInfo { name: "Acme".into() }),
        );
        assert!(OnboardingStep::BusinessInfo.is_complete(&doc));
    }

    #[test]
    fn website_gate_requires_url_and_linkedin() {
        let mut website = WebsiteInfo {
            url: "https://acme.example".into(),
            ..Default::default()
        };
        let doc = apply(
            &WizardDocument::default(),
            WizardMutation::SetWebsiteInfo(website.clone()),
        );
        assert!(!OnboardingStep::Website.is_complete(&doc));

        website.linkedin = "https://linkedin.com/company/acme".into();
        let doc = apply(&doc, WizardMutation::SetWebsiteInfo(website));
        assert!(OnboardingStep::Website.is_complete(&doc));
    }

    #[test]
    fn competitors_gate_requires_one_nonblank_entry() {
        let doc = WizardDocument::default();
        assert!(!OnboardingStep::Competitors.is_complete(&doc));

        let doc = apply(
            &doc,
            WizardMutation::SetCompetitors(vec!["  ".into(), "https://rival.example".into()]),
        );
        assert!(OnboardingStep::Competitors.is_complete(&doc));
    }

    #[test]
    fn interview_gate_requires_all_questions_completed() {
        let mut doc = WizardDocument::default();
        assert!(!OnboardingStep::VoiceInterview.is_complete(&doc));
        for id in 1..=4 {
            doc = apply(
                &doc,
                WizardMutation::UpdateQuestionTranscript {
                    id,
                    transcript: "answer".into(),
                },
            );
        }
        assert!(OnboardingStep::VoiceInterview.is_complete(&doc));
    }

    #[test]
    fn resume_lands_on_first_incomplete_step() {
        let doc = WizardDocument::default();
        assert_eq!(resume_step(&doc), OnboardingStep::BusinessInfo);

        let doc = apply(
            &doc,
            WizardMutation::SetBusinessInfo(BusinessInfo { name: "Acme".into() }),
        );
        assert_eq!(resume_step(&doc), OnboardingStep::Website);
    }
}
