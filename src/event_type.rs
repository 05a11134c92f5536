//! Discriminator tags
//!
//! Closed sets of string tags that drive dispatch. Every other enum in the
//! payloads is declared as data alongside the entity definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Webhook event type, read from `meta.event_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "APPLICANT")]
    Applicant,
    #[serde(rename = "VACANCY")]
    Vacancy,
    #[serde(rename = "VACANCY-REQUEST")]
    VacancyRequest,
    #[serde(rename = "RESPONSE")]
    Response,
    #[serde(rename = "OFFER")]
    Offer,
    #[serde(rename = "RECRUITMENT-EVALUATION")]
    RecruitmentEvaluation,
    #[serde(rename = "SURVEY-QUESTIONARY")]
    SurveyQuestionary,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::Applicant,
        EventType::Vacancy,
        EventType::VacancyRequest,
        EventType::Response,
        EventType::Offer,
        EventType::RecruitmentEvaluation,
        EventType::SurveyQuestionary,
    ];

    /// Wire literal for this event type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Applicant => "APPLICANT",
            EventType::Vacancy => "VACANCY",
            EventType::VacancyRequest => "VACANCY-REQUEST",
            EventType::Response => "RESPONSE",
            EventType::Offer => "OFFER",
            EventType::RecruitmentEvaluation => "RECRUITMENT-EVALUATION",
            EventType::SurveyQuestionary => "SURVEY-QUESTIONARY",
        }
    }

    /// All wire literals, in declaration order
    pub fn literals() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.as_str()).collect()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the [`EventType`] literals
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type '{0}'")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Action that triggered the webhook (`meta.webhook_action`)
///
/// Applicant hooks may carry any of the three; every other event type only
/// ever sends `ADD`. The per-type restriction is enforced by the schema, not
/// by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookAction {
    Add,
    Edit,
    Delete,
}
