//! Error types for schema construction and the version registry
//!
//! These errors surface at startup while definitions are loaded and graphs
//! are built. Per-payload problems are never reported here; they are
//! collected into a [`crate::validate::ErrorReport`].

use thiserror::Error;

/// Result type for schema operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Schema construction and registry errors
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Unresolved reference in {entity}.{field}: no entity or enum named '{target}'")]
    UnresolvedReference {
        entity: String,
        field: String,
        target: String,
    },

    #[error("Variant already registered: {event_type} version {version}")]
    DuplicateVariant { event_type: String, version: String },

    #[error("Unknown variant: {event_type} version {version}")]
    UnknownVariant { event_type: String, version: String },

    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("Duplicate field '{field}' in entity {entity}")]
    DuplicateField { entity: String, field: String },

    #[error("Duplicate wire name '{wire_name}' in entity {entity}")]
    DuplicateWireName { entity: String, wire_name: String },

    #[error("Invalid field {entity}.{field}: {reason}")]
    InvalidField {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Invalid type expression '{expr}': {reason}")]
    InvalidTypeExpr { expr: String, reason: String },

    #[error("Cyclic extends chain: {}", .0.join(" -> "))]
    CyclicExtends(Vec<String>),

    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    #[error("Invalid definition in {path}: {reason}")]
    InvalidDefinition { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}
