//! Schema Graph Construction
//!
//! Two-pass build: every entity and enum name is declared first, then
//! `extends` chains are flattened by copying fields in, field types are
//! parsed and bound, and the reachable part of the graph is laid out in an
//! arena. References to undeclared names fail the whole build.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::debug;

use super::types::{FieldType, TypeExpr};
use super::{
    EntityId, EntitySchema, EnumId, EnumSchema, FieldDescriptor, SchemaGraph, ValueType,
};
use crate::error::{Result, SchemaError};
use crate::validate;

// =============================================================================
// Definitions
// =============================================================================

/// Declared field, before its type is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Logical name
    pub name: String,
    /// Wire key, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Type expression, e.g. `"list<ApplicantSocial>"`
    #[serde(rename = "type")]
    pub type_expr: String,
    /// Defaults to `true` unless a default is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Value bound when the field is absent. `Some(Value::Null)` is an
    /// explicit null default, distinct from having no default at all.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<serde_json::Value>,
}

/// A key that is present deserializes to `Some`, even when its value is `null`
pub(crate) fn present<'de, D>(deserializer: D) -> std::result::Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl FieldDef {
    /// A field that must be present
    pub fn required(name: impl Into<String>, type_expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            type_expr: type_expr.into(),
            required: Some(true),
            default: None,
            description: None,
            examples: Vec::new(),
        }
    }

    /// A field that may be absent
    pub fn optional(name: impl Into<String>, type_expr: impl Into<String>) -> Self {
        Self {
            required: Some(false),
            ..Self::required(name, type_expr)
        }
    }

    pub fn with_alias(mut self, wire_name: impl Into<String>) -> Self {
        self.alias = Some(wire_name.into());
        self
    }

    pub fn with_default(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn wire_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn is_required(&self) -> bool {
        self.required.unwrap_or(self.default.is_none())
    }
}

/// Declared entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    /// Base entity whose fields are copied in ahead of this one's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extends: None,
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends = Some(base.into());
        self
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }
}

/// Declared enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EnumDef {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            description: None,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum Declared {
    Entity(usize),
    Enum(usize),
}

/// Entity with its flattened, parsed fields
struct Prepared {
    name: String,
    description: Option<String>,
    fields: Vec<(FieldDef, FieldType)>,
}

/// Collects definitions and compiles them into a [`SchemaGraph`]
#[derive(Debug, Clone, Default)]
pub struct SchemaGraphBuilder {
    name: String,
    entities: Vec<EntityDef>,
    enums: Vec<EnumDef>,
    declared: HashMap<String, Declared>,
}

impl SchemaGraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare an entity; names are shared with enums
    pub fn add_entity(&mut self, def: EntityDef) -> Result<&mut Self> {
        self.declare(&def.name, Declared::Entity(self.entities.len()))?;
        self.entities.push(def);
        Ok(self)
    }

    /// Declare an enum; names are shared with entities
    pub fn add_enum(&mut self, def: EnumDef) -> Result<&mut Self> {
        if def.values.is_empty() {
            return Err(SchemaError::InvalidDefinition {
                path: def.name,
                reason: "enum has no values".to_string(),
            });
        }
        self.declare(&def.name, Declared::Enum(self.enums.len()))?;
        self.enums.push(def);
        Ok(self)
    }

    fn declare(&mut self, name: &str, slot: Declared) -> Result<()> {
        if self.declared.contains_key(name) {
            return Err(SchemaError::DuplicateDefinition(name.to_string()));
        }
        self.declared.insert(name.to_string(), slot);
        Ok(())
    }

    /// Compile the graph rooted at `root`
    ///
    /// Every declared entity is checked, reachable or not; only entities
    /// reachable from the root end up in the graph.
    pub fn build(&self, root: &str) -> Result<SchemaGraph> {
        let mut cache = HashMap::new();
        let mut prepared = Vec::with_capacity(self.entities.len());
        for idx in 0..self.entities.len() {
            let fields = self.flatten(idx, &mut Vec::new(), &mut cache)?;
            prepared.push(self.prepare(&self.entities[idx], fields)?);
        }

        let root_idx = match self.declared.get(root) {
            Some(Declared::Entity(idx)) => *idx,
            _ => {
                return Err(SchemaError::UnresolvedReference {
                    entity: self.name.clone(),
                    field: "<root>".to_string(),
                    target: root.to_string(),
                })
            }
        };

        let graph = self.layout(root_idx, &prepared)?;
        self.check_defaults(&graph)?;

        debug!(
            graph = %graph.name,
            entities = graph.entities.len(),
            enums = graph.enums.len(),
            recursive = ?graph.recursive_entities(),
            "Built schema graph"
        );
        Ok(graph)
    }

    /// Copy-in composition: base fields first, overridden in place by name
    fn flatten(
        &self,
        idx: usize,
        stack: &mut Vec<String>,
        cache: &mut HashMap<usize, Vec<FieldDef>>,
    ) -> Result<Vec<FieldDef>> {
        if let Some(fields) = cache.get(&idx) {
            return Ok(fields.clone());
        }
        let def = &self.entities[idx];
        if stack.contains(&def.name) {
            let mut chain = stack.clone();
            chain.push(def.name.clone());
            return Err(SchemaError::CyclicExtends(chain));
        }
        stack.push(def.name.clone());

        let mut fields = match &def.extends {
            Some(base) => match self.declared.get(base) {
                Some(Declared::Entity(base_idx)) => self.flatten(*base_idx, stack, cache)?,
                _ => {
                    return Err(SchemaError::UnresolvedReference {
                        entity: def.name.clone(),
                        field: "<extends>".to_string(),
                        target: base.clone(),
                    })
                }
            },
            None => Vec::new(),
        };

        let mut own = HashSet::new();
        for field in &def.fields {
            if !own.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    entity: def.name.clone(),
                    field: field.name.clone(),
                });
            }
            match fields.iter().position(|f| f.name == field.name) {
                Some(pos) => fields[pos] = field.clone(),
                None => fields.push(field.clone()),
            }
        }

        stack.pop();
        cache.insert(idx, fields.clone());
        Ok(fields)
    }

    /// Parse types and enforce per-entity invariants
    fn prepare(&self, def: &EntityDef, fields: Vec<FieldDef>) -> Result<Prepared> {
        let mut wire_names = HashSet::new();
        let mut out = Vec::with_capacity(fields.len());
        for field in fields {
            if !wire_names.insert(field.wire_name().to_string()) {
                return Err(SchemaError::DuplicateWireName {
                    entity: def.name.clone(),
                    wire_name: field.wire_name().to_string(),
                });
            }
            if field.required == Some(true) && field.default.is_some() {
                return Err(SchemaError::InvalidField {
                    entity: def.name.clone(),
                    field: field.name.clone(),
                    reason: "a required field cannot carry a default".to_string(),
                });
            }
            let field_type: FieldType = field.type_expr.parse()?;
            for target in field_type.expr.names() {
                if !self.declared.contains_key(target) {
                    return Err(SchemaError::UnresolvedReference {
                        entity: def.name.clone(),
                        field: field.name.clone(),
                        target: target.to_string(),
                    });
                }
            }
            out.push((field, field_type));
        }
        Ok(Prepared {
            name: def.name.clone(),
            description: def.description.clone(),
            fields: out,
        })
    }

    /// Breadth-first layout of everything reachable from the root
    fn layout(&self, root_idx: usize, prepared: &[Prepared]) -> Result<SchemaGraph> {
        let mut ids = Ids::default();
        ids.entity(root_idx);

        let mut entities: Vec<Option<EntitySchema>> = Vec::new();
        let mut queue = VecDeque::from([root_idx]);
        let mut edges = Vec::new();

        while let Some(def_idx) = queue.pop_front() {
            let this = ids.entity(def_idx);
            let entry = &prepared[def_idx];
            let mut fields = Vec::with_capacity(entry.fields.len());
            for (def, field_type) in &entry.fields {
                let value_type = self.resolve(&field_type.expr, &mut ids, &mut queue)?;
                collect_entity_edges(&value_type, this, &mut edges);
                fields.push(FieldDescriptor {
                    logical_name: def.name.clone(),
                    wire_name: def.wire_name().to_string(),
                    required: def.is_required(),
                    nullable: field_type.nullable,
                    default: def.default.clone(),
                    value_type,
                    description: def.description.clone(),
                    examples: def.examples.clone(),
                });
            }
            if entities.len() <= this.0 {
                entities.resize(this.0 + 1, None);
            }
            entities[this.0] = Some(EntitySchema {
                name: entry.name.clone(),
                description: entry.description.clone(),
                fields,
            });
        }

        let entities: Vec<EntitySchema> = entities.into_iter().flatten().collect();
        let enums = ids
            .enum_order
            .iter()
            .map(|idx| {
                let def = &self.enums[*idx];
                EnumSchema {
                    name: def.name.clone(),
                    values: def.values.clone(),
                    description: def.description.clone(),
                }
            })
            .collect();
        let recursive = find_recursive(entities.len(), &edges);

        Ok(SchemaGraph {
            name: self.name.clone(),
            root: EntityId(0),
            entities,
            enums,
            recursive,
        })
    }

    fn resolve(
        &self,
        expr: &TypeExpr,
        ids: &mut Ids,
        queue: &mut VecDeque<usize>,
    ) -> Result<ValueType> {
        Ok(match expr {
            TypeExpr::Primitive(kind) => ValueType::Primitive(*kind),
            TypeExpr::Named(name) => match self.declared.get(name) {
                Some(Declared::Entity(idx)) => {
                    let known = ids.entities.contains_key(idx);
                    let id = ids.entity(*idx);
                    if !known {
                        queue.push_back(*idx);
                    }
                    ValueType::Entity(id)
                }
                Some(Declared::Enum(idx)) => ValueType::Enum(ids.enumeration(*idx)),
                None => {
                    return Err(SchemaError::UnresolvedReference {
                        entity: self.name.clone(),
                        field: String::new(),
                        target: name.clone(),
                    })
                }
            },
            TypeExpr::List(inner) => ValueType::List(Box::new(self.resolve(inner, ids, queue)?)),
            TypeExpr::Map(inner) => ValueType::Map(Box::new(self.resolve(inner, ids, queue)?)),
            TypeExpr::Union(alternatives) => ValueType::Union(
                alternatives
                    .iter()
                    .map(|alt| self.resolve(alt, ids, queue))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Defaults must themselves validate against the field's type
    fn check_defaults(&self, graph: &SchemaGraph) -> Result<()> {
        for (_, entity) in graph.entities() {
            for field in &entity.fields {
                let Some(default) = &field.default else {
                    continue;
                };
                let errors = validate::check_value(graph, &field.value_type, field.nullable, default);
                if let Some(first) = errors.first() {
                    return Err(SchemaError::InvalidField {
                        entity: entity.name.clone(),
                        field: field.logical_name.clone(),
                        reason: format!("default does not validate: {}", first),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Arena ids handed out in discovery order
#[derive(Default)]
struct Ids {
    entities: HashMap<usize, EntityId>,
    enums: HashMap<usize, EnumId>,
    enum_order: Vec<usize>,
}

impl Ids {
    fn entity(&mut self, def_idx: usize) -> EntityId {
        let next = EntityId(self.entities.len());
        *self.entities.entry(def_idx).or_insert(next)
    }

    fn enumeration(&mut self, def_idx: usize) -> EnumId {
        if let Some(id) = self.enums.get(&def_idx) {
            return *id;
        }
        let id = EnumId(self.enum_order.len());
        self.enums.insert(def_idx, id);
        self.enum_order.push(def_idx);
        id
    }
}

fn collect_entity_edges(value_type: &ValueType, from: EntityId, edges: &mut Vec<(EntityId, EntityId)>) {
    match value_type {
        ValueType::Entity(to) => edges.push((from, *to)),
        ValueType::List(inner) | ValueType::Map(inner) => collect_entity_edges(inner, from, edges),
        ValueType::Union(alternatives) => {
            for alt in alternatives {
                collect_entity_edges(alt, from, edges);
            }
        }
        ValueType::Primitive(_) | ValueType::Enum(_) => {}
    }
}

/// Entities in a multi-member SCC or with a self edge
fn find_recursive(count: usize, edges: &[(EntityId, EntityId)]) -> BTreeSet<EntityId> {
    let mut graph = DiGraph::<EntityId, ()>::with_capacity(count, edges.len());
    let nodes: Vec<_> = (0..count).map(|i| graph.add_node(EntityId(i))).collect();
    for (from, to) in edges {
        graph.add_edge(nodes[from.0], nodes[to.0], ());
    }

    let self_loops: HashSet<EntityId> = edges
        .iter()
        .filter(|(from, to)| from == to)
        .map(|(from, _)| *from)
        .collect();

    kosaraju_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || self_loops.contains(&graph[scc[0]]))
        .flatten()
        .map(|node| graph[node])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vacancy_builder() -> SchemaGraphBuilder {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_enum(EnumDef::new("VacancyState", ["OPEN", "CLOSED"]))
            .unwrap()
            .add_entity(
                EntityDef::new("Vacancy")
                    .field(FieldDef::required("id", "int"))
                    .field(FieldDef::required("state", "VacancyState"))
                    .field(FieldDef::optional("parent", "Vacancy?")),
            )
            .unwrap();
        builder
    }

    #[test]
    fn test_unresolved_reference_names_target() {
        let mut builder = vacancy_builder();
        builder
            .add_entity(EntityDef::new("Event").field(FieldDef::required("vacancy", "Vacancyy")))
            .unwrap();
        match builder.build("Vacancy") {
            Err(SchemaError::UnresolvedReference { entity, field, target }) => {
                assert_eq!(entity, "Event");
                assert_eq!(field, "vacancy");
                assert_eq!(target, "Vacancyy");
            }
            other => panic!("Expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_root() {
        assert!(matches!(
            vacancy_builder().build("Applicant"),
            Err(SchemaError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_required_with_default_rejected() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(
                EntityDef::new("A").field(FieldDef::required("flag", "bool").with_default(json!(false))),
            )
            .unwrap();
        assert!(matches!(builder.build("A"), Err(SchemaError::InvalidField { .. })));
    }

    #[test]
    fn test_default_must_match_type() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(
                EntityDef::new("A").field(FieldDef::optional("count", "int").with_default(json!("one"))),
            )
            .unwrap();
        assert!(matches!(builder.build("A"), Err(SchemaError::InvalidField { .. })));
    }

    #[test]
    fn test_duplicate_wire_name_rejected() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(
                EntityDef::new("A")
                    .field(FieldDef::required("schema", "str"))
                    .field(FieldDef::required("schema_", "str").with_alias("schema")),
            )
            .unwrap();
        assert!(matches!(builder.build("A"), Err(SchemaError::DuplicateWireName { .. })));
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let mut builder = vacancy_builder();
        let result = builder.add_enum(EnumDef::new("Vacancy", ["X"]));
        assert!(matches!(result, Err(SchemaError::DuplicateDefinition(_))));
    }

    #[test]
    fn test_extends_copies_and_overrides_in_place() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(
                EntityDef::new("Base")
                    .field(FieldDef::required("id", "int"))
                    .field(FieldDef::required("author", "str")),
            )
            .unwrap()
            .add_entity(
                EntityDef::new("Child")
                    .extends("Base")
                    .field(FieldDef::optional("author", "str?"))
                    .field(FieldDef::required("extra", "bool")),
            )
            .unwrap();
        let graph = builder.build("Child").unwrap();
        let names: Vec<_> = graph.root_entity().fields.iter().map(|f| f.logical_name.as_str()).collect();
        assert_eq!(names, vec!["id", "author", "extra"]);
        assert!(!graph.root_entity().field("author").unwrap().required);
        // Base is not reachable from Child's fields, so it is pruned.
        assert!(graph.entity_by_name("Base").is_none());
    }

    #[test]
    fn test_cyclic_extends_rejected() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(EntityDef::new("A").extends("B"))
            .unwrap()
            .add_entity(EntityDef::new("B").extends("A"))
            .unwrap();
        assert!(matches!(builder.build("A"), Err(SchemaError::CyclicExtends(_))));
    }

    #[test]
    fn test_unreachable_entities_pruned() {
        let mut builder = vacancy_builder();
        builder
            .add_entity(EntityDef::new("Unused").field(FieldDef::required("id", "int")))
            .unwrap();
        let graph = builder.build("Vacancy").unwrap();
        assert_eq!(graph.entities().count(), 1);
        assert!(graph.entity_by_name("Unused").is_none());
    }

    #[test]
    fn test_mutual_recursion_detected() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(EntityDef::new("Root").field(FieldDef::required("a", "A")))
            .unwrap()
            .add_entity(EntityDef::new("A").field(FieldDef::optional("b", "B?")))
            .unwrap()
            .add_entity(EntityDef::new("B").field(FieldDef::optional("a", "list<A>")))
            .unwrap();
        let graph = builder.build("Root").unwrap();
        let mut recursive = graph.recursive_entities();
        recursive.sort();
        assert_eq!(recursive, vec!["A", "B"]);
        assert!(!graph.is_recursive(graph.root()));
    }

    #[test]
    fn test_field_descriptor_flags() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(
                EntityDef::new("Survey")
                    .field(FieldDef::required("schema_", "map").with_alias("schema"))
                    .field(FieldDef::optional("type", "str").with_default(json!("type_q")))
                    .field(FieldDef::optional("values", "map")),
            )
            .unwrap();
        let graph = builder.build("Survey").unwrap();
        let entity = graph.root_entity();

        let schema = entity.field("schema_").unwrap();
        assert!(schema.is_aliased());
        assert_eq!(entity.field_by_wire("schema").unwrap().logical_name, "schema_");

        let kind = entity.field("type").unwrap();
        assert!(!kind.required);
        assert_eq!(kind.default, Some(json!("type_q")));
    }

    #[test]
    fn test_definitions_deserialize() {
        let def: EntityDef = serde_json::from_value(json!({
            "name": "AccountSurvey",
            "fields": [
                {"name": "id", "type": "int"},
                {"name": "schema_", "alias": "schema", "type": "map"},
                {"name": "stars", "type": "int?", "required": false}
            ]
        }))
        .unwrap();
        assert_eq!(def.fields.len(), 3);
        assert!(def.fields[0].is_required());
        assert_eq!(def.fields[1].wire_name(), "schema");
        assert!(!def.fields[2].is_required());
    }

    #[test]
    fn test_explicit_null_default_is_kept() {
        let def: EntityDef = serde_json::from_value(json!({
            "name": "Author",
            "fields": [
                {"name": "id", "type": "int"},
                {"name": "meta", "type": "map?", "default": null}
            ]
        }))
        .unwrap();
        assert_eq!(def.fields[0].default, None);
        assert_eq!(def.fields[1].default, Some(serde_json::Value::Null));
        assert!(!def.fields[1].is_required());

        let mut builder = SchemaGraphBuilder::new("test");
        builder.add_entity(def).unwrap();
        let graph = builder.build("Author").unwrap();
        let meta = graph.root_entity().field("meta").unwrap();
        assert_eq!(meta.default, Some(serde_json::Value::Null));

        let round_trip: FieldDescriptor =
            serde_json::from_value(serde_json::to_value(meta).unwrap()).unwrap();
        assert_eq!(round_trip.default, Some(serde_json::Value::Null));
    }

    #[test]
    fn test_null_default_needs_nullable_type() {
        let mut builder = SchemaGraphBuilder::new("test");
        builder
            .add_entity(EntityDef::new("A").field(FieldDef::optional("values", "map").with_default(json!(null))))
            .unwrap();
        assert!(matches!(builder.build("A"), Err(SchemaError::InvalidField { .. })));
    }
}
