//! Properties that must hold for every registered variant
//!
//! Each valid fixture is walked alongside its variant's graph. Removing any
//! single required key yields exactly one `missing_required_field` at that
//! key's path, and the wire form of a successful validation reproduces the
//! input with defaults filled in.

mod common;

use common::all_payloads;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use webhook_schemas::{
    validate, ErrorKind, EventType, Mode, RegisteredVariant, SchemaGraph, ValueType, VersionRegistry,
};

#[derive(Debug, Clone)]
enum Step {
    Field(String),
    Index(usize),
    Key(String),
}

fn render(path: &[Step]) -> String {
    let mut out = String::new();
    for step in path {
        match step {
            Step::Field(name) if out.is_empty() => out.push_str(name),
            Step::Field(name) => {
                out.push('.');
                out.push_str(name);
            }
            Step::Index(i) => out.push_str(&format!("[{}]", i)),
            Step::Key(k) => out.push_str(&format!("[\"{}\"]", k)),
        }
    }
    out
}

fn variant_for(payload: &Value) -> &'static RegisteredVariant {
    let event_type: EventType = payload["meta"]["event_type"].as_str().unwrap().parse().unwrap();
    let version = payload["meta"]["version"].as_str().unwrap();
    VersionRegistry::builtin().unwrap().resolve(event_type, version).unwrap()
}

// =============================================================================
// Required Fields
// =============================================================================

/// Paths of every required key the fixture actually carries
fn required_paths(graph: &SchemaGraph, value_type: &ValueType, raw: &Value, path: &mut Vec<Step>, out: &mut Vec<Vec<Step>>) {
    match (value_type, raw) {
        (ValueType::Entity(id), Value::Object(object)) => {
            for field in &graph.entity(*id).fields {
                let Some(child) = object.get(&field.wire_name) else {
                    continue;
                };
                path.push(Step::Field(field.wire_name.clone()));
                if field.required {
                    out.push(path.clone());
                }
                required_paths(graph, &field.value_type, child, path, out);
                path.pop();
            }
        }
        (ValueType::List(inner), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                path.push(Step::Index(i));
                required_paths(graph, inner, item, path, out);
                path.pop();
            }
        }
        (ValueType::Map(inner), Value::Object(entries)) => {
            for (key, item) in entries {
                path.push(Step::Key(key.clone()));
                required_paths(graph, inner, item, path, out);
                path.pop();
            }
        }
        _ => {}
    }
}

fn remove_at(payload: &mut Value, path: &[Step]) {
    let (last, parents) = path.split_last().unwrap();
    let mut cursor = payload;
    for step in parents {
        cursor = match step {
            Step::Field(name) | Step::Key(name) => cursor.get_mut(name.as_str()).unwrap(),
            Step::Index(i) => cursor.get_mut(*i).unwrap(),
        };
    }
    let Step::Field(name) = last else {
        panic!("Only entity fields are required: {}", render(path));
    };
    assert!(cursor.as_object_mut().unwrap().remove(name).is_some());
}

#[test]
fn test_every_fixture_is_valid_for_its_variant() {
    for payload in all_payloads() {
        let variant = variant_for(&payload);
        if let Err(report) = validate(variant.graph(), &payload, Mode::Strict) {
            panic!("{} {}:\n{}", variant.event_type(), variant.version(), report.render());
        }
    }
}

#[test]
fn test_removing_one_required_field_reports_exactly_that_field() {
    let mut checked = 0;
    for payload in all_payloads() {
        let variant = variant_for(&payload);
        let graph = variant.graph();
        let mut paths = Vec::new();
        required_paths(graph, &ValueType::Entity(graph.root()), &payload, &mut Vec::new(), &mut paths);
        assert!(!paths.is_empty());

        for path in paths {
            let expected = render(&path);
            let mut broken = payload.clone();
            remove_at(&mut broken, &path);

            let report = match validate(graph, &broken, Mode::Strict) {
                Ok(_) => panic!("{} {}: removing {} still validated", variant.event_type(), variant.version(), expected),
                Err(report) => report,
            };
            assert_eq!(report.len(), 1, "{} {} without {}:\n{}", variant.event_type(), variant.version(), expected, report.render());
            assert_eq!(report.errors[0].path.to_string(), expected);
            assert_eq!(report.errors[0].kind, ErrorKind::MissingRequiredField, "{}", expected);
            checked += 1;
        }
    }
    assert!(checked > 100, "only {} required fields walked", checked);
}

// =============================================================================
// Wire Round Trip
// =============================================================================

#[derive(Debug, PartialEq)]
enum Instant {
    Offset(DateTime<chrono::FixedOffset>),
    Naive(NaiveDateTime),
}

/// Datetime strings may be re-rendered (`Z` becomes `+00:00`, a bare date gains a time)
fn instant(s: &str) -> Option<Instant> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Instant::Offset(dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Instant::Naive(dt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(Instant::Naive)
}

fn same_json(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::String(a), Value::String(b)) if a != b => match (instant(a), instant(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_json(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len() && a.iter().all(|(k, x)| b.get(k).is_some_and(|y| same_json(x, y)))
        }
        _ => expected == actual,
    }
}

fn assert_wire_matches(graph: &SchemaGraph, value_type: &ValueType, input: &Value, wire: &Value, path: &mut Vec<Step>) {
    match (value_type, input) {
        (ValueType::Entity(id), Value::Object(object)) => {
            let entity = graph.entity(*id);
            let wire_object = wire.as_object().unwrap_or_else(|| panic!("{} is not an object", render(path)));
            assert_eq!(wire_object.len(), entity.fields.len(), "{}", render(path));
            for field in &entity.fields {
                path.push(Step::Field(field.wire_name.clone()));
                let emitted = wire_object
                    .get(&field.wire_name)
                    .unwrap_or_else(|| panic!("{} missing from wire form", render(path)));
                match object.get(&field.wire_name) {
                    Some(raw) => assert_wire_matches(graph, &field.value_type, raw, emitted, path),
                    None => {
                        let filled = match (&field.default, &field.value_type) {
                            (Some(default), _) => default.clone(),
                            (None, ValueType::List(_)) => Value::Array(Vec::new()),
                            (None, ValueType::Map(_)) => Value::Object(Default::default()),
                            (None, _) => Value::Null,
                        };
                        assert!(same_json(&filled, emitted), "{}: {} != {}", render(path), filled, emitted);
                    }
                }
                path.pop();
            }
        }
        (ValueType::List(inner), Value::Array(items)) => {
            let emitted = wire.as_array().unwrap_or_else(|| panic!("{} is not a list", render(path)));
            assert_eq!(items.len(), emitted.len(), "{}", render(path));
            for (i, (item, out)) in items.iter().zip(emitted).enumerate() {
                path.push(Step::Index(i));
                assert_wire_matches(graph, inner, item, out, path);
                path.pop();
            }
        }
        (ValueType::Map(inner), Value::Object(entries)) => {
            let emitted = wire.as_object().unwrap_or_else(|| panic!("{} is not a map", render(path)));
            assert_eq!(entries.len(), emitted.len(), "{}", render(path));
            for (key, item) in entries {
                path.push(Step::Key(key.clone()));
                assert_wire_matches(graph, inner, item, &emitted[key.as_str()], path);
                path.pop();
            }
        }
        _ => assert!(same_json(input, wire), "{}: {} != {}", render(path), input, wire),
    }
}

#[test]
fn test_wire_json_reproduces_every_fixture() {
    for payload in all_payloads() {
        let variant = variant_for(&payload);
        let graph = variant.graph();
        let validated = validate(graph, &payload, Mode::Strict).unwrap();
        assert_wire_matches(graph, &ValueType::Entity(graph.root()), &payload, &validated.to_wire_json(), &mut Vec::new());
    }
}

#[test]
fn test_wire_json_revalidates_to_the_same_entity() {
    for payload in all_payloads() {
        let graph = variant_for(&payload).graph();
        let first = validate(graph, &payload, Mode::Strict).unwrap();
        let second = validate(graph, &first.to_wire_json(), Mode::Strict).unwrap();
        assert_eq!(first, second, "{}", graph.name());
    }
}
