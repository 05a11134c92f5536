//! Event Dispatcher
//!
//! Reads the discriminators from a raw payload (`meta.event_type`,
//! `meta.version`), resolves the registered variant, validates the whole
//! payload against it and wraps the result in a [`TypedEvent`].
//!
//! Decoding has exactly two outcomes: a typed event, or an [`ErrorReport`]
//! listing every problem. Discriminator failures are reported as
//! [`ErrorKind::Envelope`] entries and stop the decode before any schema
//! is applied.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::checksum::Checksum;
use crate::error::Result;
use crate::event_type::{EventType, WebhookAction};
use crate::registry::{RegisteredVariant, VersionRegistry};
use crate::validate::{validate, ErrorKind, ErrorReport, FieldPath, Mode, ValidatedEntity};
use crate::version::VersionTag;

// =============================================================================
// Options
// =============================================================================

/// Handling of payloads without `meta.version`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingVersionPolicy {
    /// Report the missing version and stop
    #[default]
    Reject,
    /// Report the missing version, then validate against the latest
    /// registered version so the report also says what else is wrong
    DiagnoseLatest,
}

/// Per-call decode settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub mode: Mode,
    /// Version to diagnose against when the payload carries none.
    /// Never overrides a version present in the payload.
    pub version_hint: Option<String>,
    pub missing_version: MissingVersionPolicy,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self::default()
    }

    /// Unknown keys ignored; for migration and diagnostic tooling only
    pub fn lenient() -> Self {
        Self {
            mode: Mode::Lenient,
            ..Self::default()
        }
    }

    pub fn with_version_hint(mut self, version: impl Into<String>) -> Self {
        self.version_hint = Some(version.into());
        self
    }

    pub fn with_missing_version(mut self, policy: MissingVersionPolicy) -> Self {
        self.missing_version = policy;
        self
    }
}

// =============================================================================
// Typed Output
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub nick: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub meta: Option<Value>,
}

/// Validated envelope metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    pub account: Account,
    #[serde(default)]
    pub author: Option<Author>,
    pub event_type: EventType,
    pub version: String,
    pub retry: i64,
    pub event_id: String,
    /// Absent in generations that predate it
    #[serde(default)]
    pub domain: Option<String>,
    pub webhook_action: WebhookAction,
}

/// A decoded webhook: envelope, change set and validated event body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEvent {
    pub meta: EnvelopeMeta,
    pub changes: Option<Value>,
    pub event: ValidatedEntity,
    /// Variant the payload was validated against
    pub version: VersionTag,
    pub schema_checksum: Checksum,
}

/// Decoded webhook, tagged by event type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", content = "webhook")]
pub enum TypedEvent {
    #[serde(rename = "APPLICANT")]
    Applicant(WebhookEvent),
    #[serde(rename = "VACANCY")]
    Vacancy(WebhookEvent),
    #[serde(rename = "VACANCY-REQUEST")]
    VacancyRequest(WebhookEvent),
    #[serde(rename = "RESPONSE")]
    Response(WebhookEvent),
    #[serde(rename = "OFFER")]
    Offer(WebhookEvent),
    #[serde(rename = "RECRUITMENT-EVALUATION")]
    RecruitmentEvaluation(WebhookEvent),
    #[serde(rename = "SURVEY-QUESTIONARY")]
    SurveyQuestionary(WebhookEvent),
}

impl TypedEvent {
    fn tag(event_type: EventType, event: WebhookEvent) -> Self {
        match event_type {
            EventType::Applicant => TypedEvent::Applicant(event),
            EventType::Vacancy => TypedEvent::Vacancy(event),
            EventType::VacancyRequest => TypedEvent::VacancyRequest(event),
            EventType::Response => TypedEvent::Response(event),
            EventType::Offer => TypedEvent::Offer(event),
            EventType::RecruitmentEvaluation => TypedEvent::RecruitmentEvaluation(event),
            EventType::SurveyQuestionary => TypedEvent::SurveyQuestionary(event),
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            TypedEvent::Applicant(_) => EventType::Applicant,
            TypedEvent::Vacancy(_) => EventType::Vacancy,
            TypedEvent::VacancyRequest(_) => EventType::VacancyRequest,
            TypedEvent::Response(_) => EventType::Response,
            TypedEvent::Offer(_) => EventType::Offer,
            TypedEvent::RecruitmentEvaluation(_) => EventType::RecruitmentEvaluation,
            TypedEvent::SurveyQuestionary(_) => EventType::SurveyQuestionary,
        }
    }

    pub fn webhook(&self) -> &WebhookEvent {
        match self {
            TypedEvent::Applicant(e)
            | TypedEvent::Vacancy(e)
            | TypedEvent::VacancyRequest(e)
            | TypedEvent::Response(e)
            | TypedEvent::Offer(e)
            | TypedEvent::RecruitmentEvaluation(e)
            | TypedEvent::SurveyQuestionary(e) => e,
        }
    }

    pub fn into_webhook(self) -> WebhookEvent {
        match self {
            TypedEvent::Applicant(e)
            | TypedEvent::Vacancy(e)
            | TypedEvent::VacancyRequest(e)
            | TypedEvent::Response(e)
            | TypedEvent::Offer(e)
            | TypedEvent::RecruitmentEvaluation(e)
            | TypedEvent::SurveyQuestionary(e) => e,
        }
    }

    pub fn meta(&self) -> &EnvelopeMeta {
        &self.webhook().meta
    }

    pub fn event(&self) -> &ValidatedEntity {
        &self.webhook().event
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Discriminators read from the envelope
struct Envelope {
    event_type: EventType,
    version: Option<String>,
}

/// Decodes raw payloads against a [`VersionRegistry`]
#[derive(Debug, Clone, Copy)]
pub struct EventDispatcher<'r> {
    registry: &'r VersionRegistry,
}

impl<'r> EventDispatcher<'r> {
    pub fn new(registry: &'r VersionRegistry) -> Self {
        Self { registry }
    }

    /// Dispatcher over the embedded definitions
    pub fn builtin() -> Result<EventDispatcher<'static>> {
        VersionRegistry::builtin().map(EventDispatcher::new)
    }

    pub fn registry(&self) -> &'r VersionRegistry {
        self.registry
    }

    /// Decode in strict mode
    pub fn decode(&self, raw: &Value) -> std::result::Result<TypedEvent, ErrorReport> {
        self.decode_with(raw, &DecodeOptions::strict())
    }

    /// Decode a JSON document given as text
    pub fn decode_str(&self, raw: &str, options: &DecodeOptions) -> std::result::Result<TypedEvent, ErrorReport> {
        let value: Value = serde_json::from_str(raw).map_err(|e| {
            ErrorReport::single(
                FieldPath::root(),
                ErrorKind::Envelope {
                    reason: format!("payload is not valid JSON: {}", e),
                },
            )
        })?;
        self.decode_with(&value, options)
    }

    pub fn decode_with(
        &self,
        raw: &Value,
        options: &DecodeOptions,
    ) -> std::result::Result<TypedEvent, ErrorReport> {
        let envelope = read_envelope(raw)?;

        let Some(version) = envelope.version else {
            return Err(self.diagnose_missing_version(envelope.event_type, raw, options));
        };

        let variant = self.resolve(envelope.event_type, &version)?;
        let entity = validate(variant.graph(), raw, options.mode)
            .map_err(|report| report.for_variant(envelope.event_type.as_str(), version.as_str()))?;
        let event = assemble(variant, entity)?;

        debug!(
            event_type = %envelope.event_type,
            version = %version,
            event_id = %event.meta.event_id,
            "Decoded webhook"
        );
        Ok(TypedEvent::tag(envelope.event_type, event))
    }

    fn resolve(
        &self,
        event_type: EventType,
        version: &str,
    ) -> std::result::Result<&'r RegisteredVariant, ErrorReport> {
        self.registry.resolve(event_type, version).map_err(|_| {
            ErrorReport::single(
                FieldPath::from_fields(["meta", "version"]),
                ErrorKind::UnknownVariant {
                    event_type: event_type.to_string(),
                    version: version.to_string(),
                },
            )
            .for_variant(event_type.as_str(), version)
        })
    }

    /// A payload without a version never decodes; at most it is validated
    /// against a chosen version so the report is complete
    fn diagnose_missing_version(&self, event_type: EventType, raw: &Value, options: &DecodeOptions) -> ErrorReport {
        let version_path = FieldPath::from_fields(["meta", "version"]);
        let mut report = ErrorReport::single(
            version_path.clone(),
            ErrorKind::Envelope {
                reason: "missing schema version".to_string(),
            },
        );

        let target = match (&options.version_hint, options.missing_version) {
            (Some(hint), _) => Some(hint.clone()),
            (None, MissingVersionPolicy::DiagnoseLatest) => {
                self.registry.latest(event_type).map(|v| v.to_string())
            }
            (None, MissingVersionPolicy::Reject) => None,
        };
        warn!(event_type = %event_type, diagnose_with = ?target, "Payload has no schema version");

        let Some(target) = target else {
            return report;
        };
        match self.resolve(event_type, &target) {
            Ok(variant) => {
                if let Err(diagnosis) = validate(variant.graph(), raw, options.mode) {
                    report.errors.extend(
                        diagnosis
                            .errors
                            .into_iter()
                            .filter(|e| !(e.path == version_path && e.kind == ErrorKind::MissingRequiredField)),
                    );
                }
                report.for_variant(event_type.as_str(), target)
            }
            Err(unknown) => {
                report.errors.extend(unknown.errors);
                report
            }
        }
    }
}

fn envelope_error(path: FieldPath, reason: impl Into<String>) -> ErrorReport {
    ErrorReport::single(path, ErrorKind::Envelope { reason: reason.into() })
}

/// Minimal read of the discriminators; nothing else is inspected
fn read_envelope(raw: &Value) -> std::result::Result<Envelope, ErrorReport> {
    let Some(root) = raw.as_object() else {
        return Err(envelope_error(FieldPath::root(), "payload must be a JSON object"));
    };
    let meta_path = FieldPath::from_fields(["meta"]);
    let meta = match root.get("meta") {
        Some(Value::Object(meta)) => meta,
        Some(_) => return Err(envelope_error(meta_path, "meta must be an object")),
        None => return Err(envelope_error(meta_path, "missing envelope metadata")),
    };

    let type_path = meta_path.child("event_type");
    let event_type = match meta.get("event_type") {
        Some(Value::String(literal)) => literal.parse::<EventType>().map_err(|e| {
            envelope_error(
                type_path.clone(),
                format!("{}; expected one of [{}]", e, EventType::literals().join(", ")),
            )
        })?,
        Some(_) => return Err(envelope_error(type_path, "event type must be a string")),
        None => return Err(envelope_error(type_path, "missing event type")),
    };

    let version_path = meta_path.child("version");
    let version = match meta.get("version") {
        Some(Value::String(literal)) => {
            VersionTag::parse(literal)
                .map_err(|_| envelope_error(version_path, format!("malformed schema version '{}'", literal)))?;
            Some(literal.clone())
        }
        Some(Value::Null) | None => None,
        Some(_) => return Err(envelope_error(version_path, "schema version must be a string")),
    };

    Ok(Envelope { event_type, version })
}

/// Lift the typed envelope out of a validated payload
fn assemble(variant: &RegisteredVariant, entity: ValidatedEntity) -> std::result::Result<WebhookEvent, ErrorReport> {
    let shape_error = |reason: String| {
        envelope_error(FieldPath::root(), reason)
            .for_variant(variant.event_type().as_str(), variant.version().as_str())
    };

    let meta = entity
        .entity("meta")
        .ok_or_else(|| shape_error("variant has no 'meta' entity".to_string()))?
        .deserialize_into::<EnvelopeMeta>()
        .map_err(|e| shape_error(format!("meta does not match the envelope shape: {}", e)))?;
    let changes = entity
        .get("changes")
        .map(|c| c.to_json())
        .filter(|c| !c.is_null());
    let event = entity
        .entity("event")
        .cloned()
        .ok_or_else(|| shape_error("variant has no 'event' entity".to_string()))?;

    Ok(WebhookEvent {
        meta,
        changes,
        event,
        version: variant.version().clone(),
        schema_checksum: variant.checksum().clone(),
    })
}
