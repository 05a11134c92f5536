//! Entity Schema Graph
//!
//! A compiled, immutable graph of entity and enum definitions for one
//! webhook variant. Entities refer to each other through [`EntityId`]
//! indexes into the graph's arena, so self-referential and mutually
//! referential entities (a vacancy's `parent` vacancy) have a finite
//! definition while still allowing arbitrarily deep data.
//!
//! Graphs are produced by [`SchemaGraphBuilder`] and never mutated after
//! construction.

pub mod builder;
pub mod types;

pub use builder::{EntityDef, EnumDef, FieldDef, SchemaGraphBuilder};
pub use types::{FieldType, PrimitiveKind, TypeExpr};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::checksum::Checksum;

// =============================================================================
// Identifiers
// =============================================================================

/// Index of an entity within its [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub(crate) usize);

/// Index of an enum within its [`SchemaGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnumId(pub(crate) usize);

// =============================================================================
// Value Types
// =============================================================================

/// Resolved type of a field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum ValueType {
    Primitive(PrimitiveKind),
    Enum(EnumId),
    Entity(EntityId),
    List(Box<ValueType>),
    Map(Box<ValueType>),
    /// Alternatives are tried in declared order; first clean match wins
    Union(Vec<ValueType>),
}

// =============================================================================
// Field Descriptor
// =============================================================================

/// Per-field metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Name used in code and in [`crate::ValidatedEntity::get`]
    pub logical_name: String,
    /// Key as it appears in JSON
    pub wire_name: String,
    pub required: bool,
    pub nullable: bool,
    /// Bound when an optional field is absent; `Some(Null)` binds null
    #[serde(default, deserialize_with = "builder::present", skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    pub value_type: ValueType,
    /// Informational only
    pub description: Option<String>,
    /// Informational only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,
}

impl FieldDescriptor {
    /// Whether the wire key differs from the logical name
    pub fn is_aliased(&self) -> bool {
        self.logical_name != self.wire_name
    }
}

// =============================================================================
// Entity & Enum Schemas
// =============================================================================

/// A named record definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub name: String,
    pub description: Option<String>,
    /// Declaration order; drives stable error ordering
    pub fields: Vec<FieldDescriptor>,
}

impl EntitySchema {
    /// Look up a field by logical name
    pub fn field(&self, logical_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.logical_name == logical_name)
    }

    /// Look up a field by wire name
    pub fn field_by_wire(&self, wire_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.wire_name == wire_name)
    }

    pub fn wire_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.wire_name.as_str())
    }
}

/// A named, closed set of string literals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumSchema {
    pub name: String,
    pub values: Vec<String>,
    pub description: Option<String>,
}

impl EnumSchema {
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

// =============================================================================
// Schema Graph
// =============================================================================

/// Compiled schema for one variant, rooted at its envelope entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaGraph {
    pub(crate) name: String,
    pub(crate) root: EntityId,
    pub(crate) entities: Vec<EntitySchema>,
    pub(crate) enums: Vec<EnumSchema>,
    /// Entities that take part in a reference cycle
    pub(crate) recursive: BTreeSet<EntityId>,
}

impl SchemaGraph {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn root_entity(&self) -> &EntitySchema {
        self.entity(self.root)
    }

    /// Get an entity by id
    ///
    /// Ids are only handed out by the graph that owns them, so indexing is
    /// always in bounds for ids obtained from this graph.
    pub fn entity(&self, id: EntityId) -> &EntitySchema {
        &self.entities[id.0]
    }

    pub fn enum_schema(&self, id: EnumId) -> &EnumSchema {
        &self.enums[id.0]
    }

    /// Find an entity by name
    pub fn entity_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities.iter().position(|e| e.name == name).map(EntityId)
    }

    /// Find an enum by name
    pub fn enum_by_name(&self, name: &str) -> Option<EnumId> {
        self.enums.iter().position(|e| e.name == name).map(EnumId)
    }

    /// All entities reachable from the root, root first
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &EntitySchema)> {
        self.entities.iter().enumerate().map(|(i, e)| (EntityId(i), e))
    }

    pub fn enums(&self) -> impl Iterator<Item = (EnumId, &EnumSchema)> {
        self.enums.iter().enumerate().map(|(i, e)| (EnumId(i), e))
    }

    /// Names of entities that take part in a reference cycle
    pub fn recursive_entities(&self) -> Vec<&str> {
        self.recursive
            .iter()
            .map(|id| self.entity(*id).name.as_str())
            .collect()
    }

    pub fn is_recursive(&self, id: EntityId) -> bool {
        self.recursive.contains(&id)
    }

    /// Human-readable rendering of a value type
    pub fn describe(&self, value_type: &ValueType) -> String {
        match value_type {
            ValueType::Primitive(kind) => kind.to_string(),
            ValueType::Enum(id) => self.enum_schema(*id).name.clone(),
            ValueType::Entity(id) => self.entity(*id).name.clone(),
            ValueType::List(inner) => format!("list<{}>", self.describe(inner)),
            ValueType::Map(inner) => format!("map<{}>", self.describe(inner)),
            ValueType::Union(alternatives) => format!(
                "union<{}>",
                alternatives
                    .iter()
                    .map(|alt| self.describe(alt))
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }

    /// Checksum over the canonical serialization of this graph
    pub fn checksum(&self) -> Checksum {
        match serde_json::to_value(self) {
            Ok(value) => Checksum::from_json(&value),
            Err(_) => Checksum::from_str(&format!("{:?}", self)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_graph() -> SchemaGraph {
        let mut builder = SchemaGraphBuilder::new("tree");
        builder
            .add_enum(EnumDef::new("Color", ["red", "green"]))
            .unwrap()
            .add_entity(
                EntityDef::new("Node")
                    .field(FieldDef::required("id", "int"))
                    .field(FieldDef::optional("color", "Color?"))
                    .field(FieldDef::optional("parent", "Node?"))
                    .field(FieldDef::optional("children", "list<Node>")),
            )
            .unwrap();
        builder.build("Node").unwrap()
    }

    #[test]
    fn test_lookup_by_name() {
        let graph = tree_graph();
        let node = graph.entity_by_name("Node").unwrap();
        assert_eq!(node, graph.root());
        assert!(graph.enum_by_name("Color").is_some());
        assert!(graph.entity_by_name("Missing").is_none());
    }

    #[test]
    fn test_describe_types() {
        let graph = tree_graph();
        let children = graph.root_entity().field("children").unwrap();
        assert_eq!(graph.describe(&children.value_type), "list<Node>");
        let color = graph.root_entity().field("color").unwrap();
        assert_eq!(graph.describe(&color.value_type), "Color");
    }

    #[test]
    fn test_self_reference_is_recursive() {
        let graph = tree_graph();
        assert_eq!(graph.recursive_entities(), vec!["Node"]);
    }

    #[test]
    fn test_checksum_is_stable() {
        assert_eq!(tree_graph().checksum(), tree_graph().checksum());
    }
}
