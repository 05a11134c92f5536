//! Version Registry
//!
//! Maps an (event type, version) pair to the compiled [`SchemaGraph`] that
//! payloads of that shape are validated against. Registration happens once
//! at startup; afterwards the registry is read-only and can be shared
//! freely between threads.
//!
//! Lookups are exact. There is no "closest version" fallback: validating a
//! payload against a neighbouring version's shape would silently drop or
//! misread fields.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use tracing::{debug, warn};

use crate::checksum::Checksum;
use crate::error::{Result, SchemaError};
use crate::event_type::EventType;
use crate::loader;
use crate::schema::SchemaGraph;
use crate::version::VersionTag;

/// A compiled schema registered for one (event type, version) pair
#[derive(Debug, Clone)]
pub struct RegisteredVariant {
    event_type: EventType,
    version: VersionTag,
    graph: Arc<SchemaGraph>,
    checksum: Checksum,
}

impl RegisteredVariant {
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn version(&self) -> &VersionTag {
        &self.version
    }

    /// The envelope schema for this variant
    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    /// Shared handle to the schema, for callers that outlive the registry borrow
    pub fn shared_graph(&self) -> Arc<SchemaGraph> {
        Arc::clone(&self.graph)
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }

    pub fn summary(&self) -> VariantSummary {
        VariantSummary {
            event_type: self.event_type,
            version: self.version.to_string(),
            root: self.graph.root_entity().name.clone(),
            entities: self.graph.entities().count(),
            enums: self.graph.enums().count(),
            recursive: self
                .graph
                .recursive_entities()
                .into_iter()
                .map(String::from)
                .collect(),
            checksum: self.checksum.clone(),
        }
    }
}

/// Serializable overview of a registered variant
#[derive(Debug, Clone, Serialize)]
pub struct VariantSummary {
    pub event_type: EventType,
    pub version: String,
    pub root: String,
    pub entities: usize,
    pub enums: usize,
    pub recursive: Vec<String>,
    pub checksum: Checksum,
}

/// Registry of schema variants keyed by event type and version
#[derive(Debug, Clone, Default)]
pub struct VersionRegistry {
    variants: BTreeMap<(EventType, VersionTag), RegisteredVariant>,
}

impl VersionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every variant embedded in this crate
    ///
    /// Loaded on first use and shared for the rest of the process.
    pub fn builtin() -> Result<&'static VersionRegistry> {
        static BUILTIN: OnceLock<std::result::Result<VersionRegistry, String>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| loader::load_embedded().map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|reason| SchemaError::InvalidDefinition {
                path: "<embedded>".to_string(),
                reason: reason.clone(),
            })
    }

    /// Add a variant
    ///
    /// Fails with [`SchemaError::DuplicateVariant`] if the pair is taken.
    pub fn register(
        &mut self,
        event_type: EventType,
        version: VersionTag,
        graph: SchemaGraph,
    ) -> Result<&RegisteredVariant> {
        let key = (event_type, version);
        if self.variants.contains_key(&key) {
            return Err(SchemaError::DuplicateVariant {
                event_type: event_type.to_string(),
                version: key.1.to_string(),
            });
        }

        let checksum = graph.checksum();
        debug!(
            event_type = %event_type,
            version = %key.1,
            checksum = %checksum.short(),
            "Registered schema variant"
        );
        let variant = RegisteredVariant {
            event_type,
            version: key.1.clone(),
            graph: Arc::new(graph),
            checksum,
        };
        Ok(self.variants.entry(key).or_insert(variant))
    }

    /// Exact-match lookup
    ///
    /// A version string that is not even well formed cannot be registered,
    /// so it resolves to [`SchemaError::UnknownVariant`] as well.
    pub fn resolve(&self, event_type: EventType, version: &str) -> Result<&RegisteredVariant> {
        let unknown = || SchemaError::UnknownVariant {
            event_type: event_type.to_string(),
            version: version.to_string(),
        };
        let tag = VersionTag::parse(version).map_err(|_| unknown())?;
        self.variants.get(&(event_type, tag)).ok_or_else(|| {
            warn!(event_type = %event_type, version, "No schema variant registered");
            unknown()
        })
    }

    /// Highest registered version for an event type
    pub fn latest(&self, event_type: EventType) -> Option<&VersionTag> {
        self.versions(event_type).into_iter().last()
    }

    /// Registered versions for an event type, ascending
    pub fn versions(&self, event_type: EventType) -> Vec<&VersionTag> {
        self.variants
            .keys()
            .filter(|(t, _)| *t == event_type)
            .map(|(_, v)| v)
            .collect()
    }

    /// All variants, ordered by event type then version
    pub fn variants(&self) -> impl Iterator<Item = &RegisteredVariant> {
        self.variants.values()
    }

    /// Event types with at least one registered variant
    pub fn event_types(&self) -> Vec<EventType> {
        let mut types: Vec<EventType> = self.variants.keys().map(|(t, _)| *t).collect();
        types.dedup();
        types
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Checksum over every registered variant
    pub fn fingerprint(&self) -> Checksum {
        Checksum::combine(self.variants.values().map(|v| &v.checksum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EntityDef, FieldDef, SchemaGraphBuilder};

    fn graph(name: &str) -> SchemaGraph {
        let mut builder = SchemaGraphBuilder::new(name);
        builder
            .add_entity(EntityDef::new("Envelope").field(FieldDef::required("meta", "map")))
            .unwrap();
        builder.build("Envelope").unwrap()
    }

    fn tag(s: &str) -> VersionTag {
        s.parse().unwrap()
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = VersionRegistry::new();
        registry
            .register(EventType::Applicant, tag("1.0"), graph("a1"))
            .unwrap();
        let variant = registry.resolve(EventType::Applicant, "1.0").unwrap();
        assert_eq!(variant.event_type(), EventType::Applicant);
        assert_eq!(variant.graph().name(), "a1");
    }

    #[test]
    fn test_duplicate_variant_rejected() {
        let mut registry = VersionRegistry::new();
        registry
            .register(EventType::Offer, tag("2.0"), graph("o1"))
            .unwrap();
        let err = registry
            .register(EventType::Offer, tag("2.0"), graph("o2"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateVariant { .. }));
        assert_eq!(registry.resolve(EventType::Offer, "2.0").unwrap().graph().name(), "o1");
    }

    #[test]
    fn test_no_fallback_between_versions() {
        let mut registry = VersionRegistry::new();
        registry
            .register(EventType::Applicant, tag("2.0"), graph("a2"))
            .unwrap();
        for version in ["9.9", "2", "2.0.0", "garbage"] {
            let err = registry.resolve(EventType::Applicant, version).unwrap_err();
            assert!(matches!(err, SchemaError::UnknownVariant { .. }), "{}", version);
        }
        assert!(registry.resolve(EventType::Vacancy, "2.0").is_err());
    }

    #[test]
    fn test_latest_uses_numeric_order() {
        let mut registry = VersionRegistry::new();
        for v in ["1.0", "10.0", "2.0"] {
            registry
                .register(EventType::Applicant, tag(v), graph(v))
                .unwrap();
        }
        assert_eq!(registry.latest(EventType::Applicant).unwrap().as_str(), "10.0");
        assert!(registry.latest(EventType::Offer).is_none());
        let versions: Vec<&str> = registry
            .versions(EventType::Applicant)
            .into_iter()
            .map(VersionTag::as_str)
            .collect();
        assert_eq!(versions, vec!["1.0", "2.0", "10.0"]);
    }

    #[test]
    fn test_fingerprint_tracks_registrations() {
        let mut registry = VersionRegistry::new();
        let empty = registry.fingerprint();
        registry
            .register(EventType::Response, tag("2.0"), graph("r"))
            .unwrap();
        assert_ne!(registry.fingerprint(), empty);
        assert_eq!(registry.event_types(), vec![EventType::Response]);
    }
}
