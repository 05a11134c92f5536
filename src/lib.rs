//! Webhook Schemas
//!
//! A versioned schema validation engine for recruiting platform webhooks.
//! Raw JSON payloads are validated against the exact schema variant their
//! envelope names and come back either as a fully typed event or as a report
//! of every problem found.
//!
//! ## Features
//!
//! - **Schema Graphs**: entity definitions with aliases, defaults, enums,
//!   unions and self-referential entities, compiled once into an arena
//! - **Exhaustive Validation**: all violations across the object graph,
//!   each with a field path such as `event.applicant.social[2].verification_date`
//! - **Version Registry**: exact (event type, version) lookup with no fallback
//! - **Strict / Lenient**: the extra-key policy is an argument, never global state
//! - **Checksums**: every registered variant carries a SHA256 fingerprint
//!
//! ## Data Flow
//!
//! ```text
//! raw JSON ─▶ EventDispatcher ─▶ VersionRegistry ─▶ validate(SchemaGraph)
//!              (meta.event_type,   (exact variant)     │
//!               meta.version)                           ├─▶ TypedEvent
//!                                                       └─▶ ErrorReport
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use webhook_schemas::{EventDispatcher, TypedEvent};
//!
//! # fn main() -> anyhow::Result<()> {
//! let payload: serde_json::Value = serde_json::from_str(r#"{"meta": {}}"#)?;
//! let dispatcher = EventDispatcher::builtin()?;
//! match dispatcher.decode(&payload) {
//!     Ok(TypedEvent::Applicant(webhook)) => println!("applicant {:?}", webhook.event.get("applicant")),
//!     Ok(other) => println!("{}", other.event_type()),
//!     Err(report) => eprintln!("{}", report.render()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event_type;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod validate;
pub mod version;

pub use checksum::Checksum;
pub use config::EngineConfig;
pub use dispatch::{
    Account, Author, DecodeOptions, EnvelopeMeta, EventDispatcher, MissingVersionPolicy, TypedEvent,
    WebhookEvent,
};
pub use error::{Result, SchemaError};
pub use event_type::{EventType, UnknownEventType, WebhookAction};
pub use registry::{RegisteredVariant, VariantSummary, VersionRegistry};
pub use schema::{
    EntityDef, EntityId, EntitySchema, EnumDef, EnumId, EnumSchema, FieldDef, FieldDescriptor,
    SchemaGraph, SchemaGraphBuilder, ValueType,
};
pub use validate::{
    validate, ErrorKind, ErrorReport, FieldPath, FieldPathSegment, Mode, ValidatedEntity,
    ValidatedField, ValidatedValue, ValidationError,
};
pub use version::VersionTag;
