//! Validator / Decoder
//!
//! Walks a JSON value against an entity of a [`SchemaGraph`] and produces a
//! fully typed [`ValidatedEntity`], or an [`ErrorReport`] holding every
//! violation found anywhere in the object graph. Validation never stops at
//! the first problem and never hands back a partially populated entity.
//!
//! The walk is a pure function of its inputs: the strict/lenient policy is
//! passed in by the caller on every call.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{EntityId, FieldDescriptor, PrimitiveKind, SchemaGraph, ValueType};

/// Similarity a key needs to be offered as a "did you mean" hint
const SUGGESTION_THRESHOLD: f32 = 0.8;

// =============================================================================
// Mode
// =============================================================================

/// Policy for keys that have no matching field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unknown keys are reported as [`ErrorKind::UnexpectedField`]
    #[default]
    Strict,
    /// Unknown keys are ignored; meant for migration and diagnostic tooling
    Lenient,
}

// =============================================================================
// Field Paths
// =============================================================================

/// One step from the payload root towards a value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPathSegment {
    /// Object key, by wire name
    Field(String),
    /// List element
    Index(usize),
    /// Map entry
    Key(String),
    /// Union alternative being tried
    Alternative(usize),
}

/// Location of a value inside the payload, e.g. `event.applicant.social[2].verification_date`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<FieldPathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Path made of object keys only
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(|f| FieldPathSegment::Field(f.into())).collect())
    }

    pub fn push(&mut self, segment: FieldPathSegment) {
        self.0.push(segment);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn child(&self, field: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(FieldPathSegment::Field(field.into()));
        path
    }

    pub fn segments(&self) -> &[FieldPathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                FieldPathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                FieldPathSegment::Field(name) => write!(f, ".{}", name)?,
                FieldPathSegment::Index(idx) => write!(f, "[{}]", idx)?,
                FieldPathSegment::Key(key) => write!(f, "[{:?}]", key)?,
                FieldPathSegment::Alternative(idx) => write!(f, "<union:{}>", idx)?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// =============================================================================
// Errors
// =============================================================================

/// What went wrong at a path
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    MissingRequiredField,
    /// Strict mode only
    UnexpectedField { suggestion: Option<String> },
    InvalidEnumValue { value: String, allowed: Vec<String> },
    MalformedPrimitive { expected: PrimitiveKind, value: String },
    TypeMismatch { expected: String, found: String },
    /// Discriminator fields missing or malformed; no decode was attempted
    Envelope { reason: String },
    /// No schema registered for the payload's event type and version
    UnknownVariant { event_type: String, version: String },
}

impl ErrorKind {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingRequiredField => "missing_required_field",
            ErrorKind::UnexpectedField { .. } => "unexpected_field",
            ErrorKind::InvalidEnumValue { .. } => "invalid_enum_value",
            ErrorKind::MalformedPrimitive { .. } => "malformed_primitive",
            ErrorKind::TypeMismatch { .. } => "type_mismatch",
            ErrorKind::Envelope { .. } => "envelope_error",
            ErrorKind::UnknownVariant { .. } => "unknown_variant",
        }
    }
}

/// A single violation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub path: FieldPath,
    pub kind: ErrorKind,
}

impl ValidationError {
    pub fn new(path: FieldPath, kind: ErrorKind) -> Self {
        Self { path, kind }
    }

    /// Human-readable explanation
    pub fn detail(&self) -> String {
        match &self.kind {
            ErrorKind::MissingRequiredField => "field required".to_string(),
            ErrorKind::UnexpectedField { suggestion: Some(s) } => {
                format!("unexpected field (did you mean '{}'?)", s)
            }
            ErrorKind::UnexpectedField { suggestion: None } => "unexpected field".to_string(),
            ErrorKind::InvalidEnumValue { value, allowed } => {
                format!("'{}' is not one of [{}]", value, allowed.join(", "))
            }
            ErrorKind::MalformedPrimitive { expected, value } => {
                format!("'{}' is not a valid {}", value, expected)
            }
            ErrorKind::TypeMismatch { expected, found } => {
                format!("expected {}, found {}", expected, found)
            }
            ErrorKind::Envelope { reason } => reason.clone(),
            ErrorKind::UnknownVariant { event_type, version } => {
                format!("no schema registered for {} version {}", event_type, version)
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.path, self.kind.code(), self.detail())
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 4)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("code", self.kind.code())?;
        state.serialize_field("detail", &self.detail())?;
        state.serialize_field("error", &self.kind)?;
        state.end()
    }
}

/// Every violation found in one payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, thiserror::Error)]
#[error("{} validation error(s)", .errors.len())]
pub struct ErrorReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub errors: Vec<ValidationError>,
}

impl ErrorReport {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self {
            event_type: None,
            version: None,
            errors,
        }
    }

    /// Report with a single error
    pub fn single(path: FieldPath, kind: ErrorKind) -> Self {
        Self::new(vec![ValidationError::new(path, kind)])
    }

    /// Tag the report with the variant it was validated against
    pub fn for_variant(mut self, event_type: impl Into<String>, version: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self.version = Some(version.into());
        self
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Rendered paths, in report order
    pub fn paths(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.path.to_string()).collect()
    }

    /// First error at the given rendered path
    pub fn at(&self, path: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.path.to_string() == path)
    }
}

impl ErrorReport {
    /// Multi-line rendering, one error per line
    pub fn render(&self) -> String {
        let mut out = self.to_string();
        if let (Some(event_type), Some(version)) = (&self.event_type, &self.version) {
            out.push_str(&format!(" ({} {})", event_type, version));
        }
        for error in &self.errors {
            out.push_str(&format!("\n  - {}", error));
        }
        out
    }
}

// =============================================================================
// Validated Values
// =============================================================================

/// A value that passed validation, typed by its schema
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    /// Datetime sent without an offset
    NaiveDateTime(NaiveDateTime),
    Enum(String),
    Entity(ValidatedEntity),
    List(Vec<ValidatedValue>),
    Map(BTreeMap<String, ValidatedValue>),
    /// Untyped JSON (`any`)
    Json(Value),
}

impl ValidatedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ValidatedValue::Null | ValidatedValue::Json(Value::Null))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ValidatedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ValidatedValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String or enum literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValidatedValue::Str(v) | ValidatedValue::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ValidatedValue::Date(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&ValidatedEntity> {
        match self {
            ValidatedValue::Entity(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ValidatedValue]> {
        match self {
            ValidatedValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ValidatedValue>> {
        match self {
            ValidatedValue::Map(v) => Some(v),
            _ => None,
        }
    }

    fn to_json_with(&self, keys: KeyStyle) -> Value {
        match self {
            ValidatedValue::Null => Value::Null,
            ValidatedValue::Bool(v) => Value::Bool(*v),
            ValidatedValue::Int(v) => Value::from(*v),
            ValidatedValue::Float(v) => Value::from(*v),
            ValidatedValue::Str(v) | ValidatedValue::Enum(v) => Value::String(v.clone()),
            ValidatedValue::Date(v) => Value::String(v.format("%Y-%m-%d").to_string()),
            ValidatedValue::DateTime(v) => Value::String(v.to_rfc3339()),
            ValidatedValue::NaiveDateTime(v) => {
                Value::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            ValidatedValue::Entity(entity) => entity.to_json_with(keys),
            ValidatedValue::List(items) => {
                Value::Array(items.iter().map(|item| item.to_json_with(keys)).collect())
            }
            ValidatedValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_with(keys)))
                    .collect(),
            ),
            ValidatedValue::Json(v) => v.clone(),
        }
    }

    /// Plain JSON, entity keys by logical name
    pub fn to_json(&self) -> Value {
        self.to_json_with(KeyStyle::Logical)
    }
}

impl Serialize for ValidatedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy)]
enum KeyStyle {
    Logical,
    Wire,
}

/// A validated field of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedField {
    pub logical_name: String,
    pub wire_name: String,
    pub value: ValidatedValue,
}

/// A fully validated entity; fields in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedEntity {
    pub name: String,
    pub fields: Vec<ValidatedField>,
}

impl ValidatedEntity {
    /// Field value by logical name
    pub fn get(&self, logical_name: &str) -> Option<&ValidatedValue> {
        self.fields
            .iter()
            .find(|f| f.logical_name == logical_name)
            .map(|f| &f.value)
    }

    /// Nested entity by logical name
    pub fn entity(&self, logical_name: &str) -> Option<&ValidatedEntity> {
        self.get(logical_name).and_then(ValidatedValue::as_entity)
    }

    fn to_json_with(&self, keys: KeyStyle) -> Value {
        let mut object = Map::with_capacity(self.fields.len());
        for field in &self.fields {
            let key = match keys {
                KeyStyle::Logical => &field.logical_name,
                KeyStyle::Wire => &field.wire_name,
            };
            object.insert(key.clone(), field.value.to_json_with(keys));
        }
        Value::Object(object)
    }

    /// Plain JSON keyed by logical names
    pub fn to_json(&self) -> Value {
        self.to_json_with(KeyStyle::Logical)
    }

    /// Plain JSON keyed by wire names, defaults filled in
    pub fn to_wire_json(&self) -> Value {
        self.to_json_with(KeyStyle::Wire)
    }

    /// Convert into a caller-defined serde model (logical names)
    pub fn deserialize_into<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.to_json())
    }
}

impl Serialize for ValidatedEntity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate `input` against the graph's root entity
pub fn validate(graph: &SchemaGraph, input: &Value, mode: Mode) -> Result<ValidatedEntity, ErrorReport> {
    let mut walker = Walker::new(graph, mode, FieldPath::root());
    match walker.entity(graph.root(), input) {
        Some(validated) if walker.errors.is_empty() => Ok(validated),
        _ => Err(ErrorReport::new(walker.errors)),
    }
}

/// Errors produced by validating a standalone value of the given type
pub(crate) fn check_value(
    graph: &SchemaGraph,
    value_type: &ValueType,
    nullable: bool,
    value: &Value,
) -> Vec<ValidationError> {
    let mut walker = Walker::new(graph, Mode::Strict, FieldPath::root());
    walker.value(value_type, nullable, value);
    walker.errors
}

struct Walker<'g> {
    graph: &'g SchemaGraph,
    mode: Mode,
    path: FieldPath,
    errors: Vec<ValidationError>,
}

impl<'g> Walker<'g> {
    fn new(graph: &'g SchemaGraph, mode: Mode, path: FieldPath) -> Self {
        Self {
            graph,
            mode,
            path,
            errors: Vec::new(),
        }
    }

    fn error(&mut self, kind: ErrorKind) {
        self.errors.push(ValidationError::new(self.path.clone(), kind));
    }

    fn mismatch(&mut self, expected: String, found: &Value) {
        self.error(ErrorKind::TypeMismatch {
            expected,
            found: json_kind(found).to_string(),
        });
    }

    fn entity(&mut self, id: EntityId, input: &Value) -> Option<ValidatedEntity> {
        let schema = self.graph.entity(id);
        let Some(object) = input.as_object() else {
            self.mismatch(schema.name.clone(), input);
            return None;
        };

        let before = self.errors.len();
        let mut fields = Vec::with_capacity(schema.fields.len());
        for field in &schema.fields {
            self.path.push(FieldPathSegment::Field(field.wire_name.clone()));
            let value = match object.get(&field.wire_name) {
                Some(raw) => self.value(&field.value_type, field.nullable, raw),
                None if field.required => {
                    self.error(ErrorKind::MissingRequiredField);
                    None
                }
                None => self.absent(field),
            };
            self.path.pop();

            if let Some(value) = value {
                fields.push(ValidatedField {
                    logical_name: field.logical_name.clone(),
                    wire_name: field.wire_name.clone(),
                    value,
                });
            }
        }

        if self.mode == Mode::Strict {
            for key in object.keys() {
                if schema.field_by_wire(key).is_some() {
                    continue;
                }
                let suggestion = suggest(key, schema.wire_names());
                self.path.push(FieldPathSegment::Field(key.clone()));
                self.error(ErrorKind::UnexpectedField { suggestion });
                self.path.pop();
            }
        }

        (self.errors.len() == before).then(|| ValidatedEntity {
            name: schema.name.clone(),
            fields,
        })
    }

    /// Value bound for an optional field that is not in the payload
    fn absent(&mut self, field: &FieldDescriptor) -> Option<ValidatedValue> {
        if let Some(default) = &field.default {
            return self.value(&field.value_type, field.nullable, default);
        }
        Some(match &field.value_type {
            ValueType::List(_) => ValidatedValue::List(Vec::new()),
            ValueType::Map(_) => ValidatedValue::Map(BTreeMap::new()),
            _ => ValidatedValue::Null,
        })
    }

    fn value(&mut self, value_type: &ValueType, nullable: bool, raw: &Value) -> Option<ValidatedValue> {
        if raw.is_null() {
            if matches!(value_type, ValueType::Primitive(PrimitiveKind::Any)) {
                return Some(ValidatedValue::Json(Value::Null));
            }
            if nullable {
                return Some(ValidatedValue::Null);
            }
            self.mismatch(self.graph.describe(value_type), raw);
            return None;
        }

        match value_type {
            ValueType::Primitive(kind) => self.primitive(*kind, raw),
            ValueType::Enum(id) => {
                let schema = self.graph.enum_schema(*id);
                let Some(literal) = raw.as_str() else {
                    self.mismatch(schema.name.clone(), raw);
                    return None;
                };
                if schema.contains(literal) {
                    Some(ValidatedValue::Enum(literal.to_string()))
                } else {
                    self.error(ErrorKind::InvalidEnumValue {
                        value: literal.to_string(),
                        allowed: schema.values.clone(),
                    });
                    None
                }
            }
            ValueType::Entity(id) => self.entity(*id, raw).map(ValidatedValue::Entity),
            ValueType::List(inner) => {
                let Some(items) = raw.as_array() else {
                    self.mismatch(self.graph.describe(value_type), raw);
                    return None;
                };
                let before = self.errors.len();
                let mut out = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    self.path.push(FieldPathSegment::Index(idx));
                    if let Some(value) = self.value(inner, false, item) {
                        out.push(value);
                    }
                    self.path.pop();
                }
                (self.errors.len() == before).then_some(ValidatedValue::List(out))
            }
            ValueType::Map(inner) => {
                let Some(entries) = raw.as_object() else {
                    self.mismatch(self.graph.describe(value_type), raw);
                    return None;
                };
                let before = self.errors.len();
                let mut out = BTreeMap::new();
                for (key, item) in entries {
                    self.path.push(FieldPathSegment::Key(key.clone()));
                    if let Some(value) = self.value(inner, false, item) {
                        out.insert(key.clone(), value);
                    }
                    self.path.pop();
                }
                (self.errors.len() == before).then_some(ValidatedValue::Map(out))
            }
            ValueType::Union(alternatives) => {
                let mut attempts = Vec::new();
                for (idx, alternative) in alternatives.iter().enumerate() {
                    let mut path = self.path.clone();
                    path.push(FieldPathSegment::Alternative(idx));
                    let mut trial = Walker::new(self.graph, self.mode, path);
                    let value = trial.value(alternative, false, raw);
                    match value {
                        Some(value) if trial.errors.is_empty() => return Some(value),
                        _ => attempts.extend(trial.errors),
                    }
                }
                self.errors.extend(attempts);
                None
            }
        }
    }

    fn primitive(&mut self, kind: PrimitiveKind, raw: &Value) -> Option<ValidatedValue> {
        let expected = || kind.to_string();
        match kind {
            PrimitiveKind::Any => Some(ValidatedValue::Json(raw.clone())),
            PrimitiveKind::Str => match raw.as_str() {
                Some(s) => Some(ValidatedValue::Str(s.to_string())),
                None => {
                    self.mismatch(expected(), raw);
                    None
                }
            },
            PrimitiveKind::Bool => match raw.as_bool() {
                Some(b) => Some(ValidatedValue::Bool(b)),
                None => {
                    self.mismatch(expected(), raw);
                    None
                }
            },
            PrimitiveKind::Float => match raw.as_f64() {
                Some(f) => Some(ValidatedValue::Float(f)),
                None => {
                    self.mismatch(expected(), raw);
                    None
                }
            },
            PrimitiveKind::Int => {
                let Value::Number(number) = raw else {
                    self.mismatch(expected(), raw);
                    return None;
                };
                match parse_int(number) {
                    Some(i) => Some(ValidatedValue::Int(i)),
                    None => {
                        self.malformed(kind, number.to_string());
                        None
                    }
                }
            }
            PrimitiveKind::Date => {
                let Some(s) = raw.as_str() else {
                    self.mismatch(expected(), raw);
                    return None;
                };
                match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    Ok(date) => Some(ValidatedValue::Date(date)),
                    Err(_) => {
                        self.malformed(kind, s.to_string());
                        None
                    }
                }
            }
            PrimitiveKind::DateTime => {
                let parsed = match raw {
                    Value::String(s) => parse_datetime(s),
                    Value::Number(n) => n
                        .as_i64()
                        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                        .map(|dt| ValidatedValue::DateTime(dt.fixed_offset())),
                    _ => {
                        self.mismatch(expected(), raw);
                        return None;
                    }
                };
                if parsed.is_none() {
                    let text = raw.as_str().map(str::to_string).unwrap_or_else(|| raw.to_string());
                    self.malformed(kind, text);
                }
                parsed
            }
        }
    }

    fn malformed(&mut self, expected: PrimitiveKind, value: String) {
        self.error(ErrorKind::MalformedPrimitive { expected, value });
    }
}

/// Integers, or floats with no fractional part that fit in an `i64`
fn parse_int(number: &serde_json::Number) -> Option<i64> {
    if let Some(i) = number.as_i64() {
        return Some(i);
    }
    if number.is_u64() {
        return None;
    }
    let f = number.as_f64()?;
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

fn parse_datetime(s: &str) -> Option<ValidatedValue> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ValidatedValue::DateTime(dt));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ValidatedValue::NaiveDateTime(dt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(ValidatedValue::NaiveDateTime)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Closest declared wire name, if any is close enough
fn suggest<'a>(key: &str, candidates: impl Iterator<Item = &'a str>) -> Option<String> {
    candidates
        .map(|candidate| (candidate, similar::TextDiff::from_chars(key, candidate).ratio()))
        .filter(|(_, ratio)| *ratio >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.to_string())
}
