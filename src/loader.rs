//! Definition Loading
//!
//! Schema variants are data, not code. Definitions live in JSON files laid
//! out by generation:
//!
//! ```text
//! schemas/
//! ├── 1.0/
//! │   ├── common/      entity and enum pool shared by the generation
//! │   └── events/      one file per (event type, version) variant
//! └── 2.0/
//!     ├── common/
//!     └── events/
//! ```
//!
//! Every variant is compiled on its own from its generation's pool plus
//! the entities it declares itself, then pruned to what its root reaches.
//! Generations share nothing at runtime, so editing one can never change how
//! another validates.

use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::event_type::EventType;
use crate::registry::VersionRegistry;
use crate::schema::{EntityDef, EnumDef, SchemaGraph, SchemaGraphBuilder};
use crate::version::VersionTag;

static EMBEDDED: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/schemas");

const POOL_DIR: &str = "common";
const VARIANT_DIR: &str = "events";

// =============================================================================
// File Formats
// =============================================================================

/// A pool file: entities and enums shared by one generation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionFile {
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

/// A variant file: the envelope root for one (event type, version)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantFile {
    pub event_type: EventType,
    pub version: VersionTag,
    /// Entity the payload is validated against
    pub root: String,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub entities: Vec<EntityDef>,
}

/// Files of one generation directory, keyed by relative path
#[derive(Debug, Default)]
struct Generation {
    pool: BTreeMap<String, DefinitionFile>,
    variants: BTreeMap<String, VariantFile>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Load the definitions compiled into this crate
pub fn load_embedded() -> Result<VersionRegistry> {
    let mut files = Vec::new();
    collect_embedded_files(&EMBEDDED, &mut files);
    debug!(files = files.len(), "Loading embedded schema definitions");
    compile(files)
}

/// Load definitions from a directory with the same layout as the embedded set
pub fn load_from_directory(schema_dir: &Path) -> Result<VersionRegistry> {
    let mut files = Vec::new();
    for entry in WalkDir::new(schema_dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map(|e| e != "json").unwrap_or(true) {
            continue;
        }
        let relative = path
            .strip_prefix(schema_dir)
            .map_err(|e| SchemaError::InvalidDefinition {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_path_buf();
        files.push((relative, fs::read_to_string(path)?));
    }
    debug!(dir = %schema_dir.display(), files = files.len(), "Loading schema definitions");
    compile(files)
}

/// Load from the configured directory, or the embedded set when none is set
pub fn load(config: &RegistryConfig) -> Result<VersionRegistry> {
    match &config.schema_dir {
        Some(dir) => load_from_directory(dir),
        None => load_embedded(),
    }
}

/// Compile a single variant against its generation's pool
pub fn compile_variant<'a>(
    pool: impl IntoIterator<Item = &'a DefinitionFile>,
    variant: &VariantFile,
) -> Result<SchemaGraph> {
    let mut builder = SchemaGraphBuilder::new(format!("{} {}", variant.event_type, variant.version));
    for file in pool {
        for def in &file.enums {
            builder.add_enum(def.clone())?;
        }
        for def in &file.entities {
            builder.add_entity(def.clone())?;
        }
    }
    for def in &variant.enums {
        builder.add_enum(def.clone())?;
    }
    for def in &variant.entities {
        builder.add_entity(def.clone())?;
    }
    builder.build(&variant.root)
}

// =============================================================================
// Internals
// =============================================================================

fn collect_embedded_files(dir: &Dir<'static>, files: &mut Vec<(PathBuf, String)>) {
    for file in dir.files() {
        let path = file.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Some(content) = file.contents_utf8() {
                files.push((path.to_path_buf(), content.to_string()));
            }
        }
    }
    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}

fn compile(files: Vec<(PathBuf, String)>) -> Result<VersionRegistry> {
    let mut generations: BTreeMap<String, Generation> = BTreeMap::new();
    for (path, content) in files {
        let display = path.display().to_string();
        let invalid = |reason: String| SchemaError::InvalidDefinition {
            path: display.clone(),
            reason,
        };

        let parts: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        let [generation, kind, _file] = parts.as_slice() else {
            return Err(invalid(
                "expected <version>/common/<file>.json or <version>/events/<file>.json".to_string(),
            ));
        };

        let slot = generations.entry(generation.to_string()).or_default();
        match *kind {
            POOL_DIR => {
                let file: DefinitionFile =
                    serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
                slot.pool.insert(display.clone(), file);
            }
            VARIANT_DIR => {
                let file: VariantFile =
                    serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
                if file.version.as_str() != *generation {
                    return Err(invalid(format!(
                        "variant declares version {} inside generation {}",
                        file.version, generation
                    )));
                }
                slot.variants.insert(display.clone(), file);
            }
            other => return Err(invalid(format!("unknown definition directory '{}'", other))),
        }
    }

    let mut registry = VersionRegistry::new();
    for (generation, files) in &generations {
        for (path, variant) in &files.variants {
            let graph = compile_variant(files.pool.values(), variant).map_err(|e| {
                SchemaError::InvalidDefinition {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?;
            info!(
                generation = %generation,
                event_type = %variant.event_type,
                version = %variant.version,
                entities = graph.entities().count(),
                recursive = ?graph.recursive_entities(),
                "Compiled schema variant"
            );
            registry.register(variant.event_type, variant.version.clone(), graph)?;
        }
    }
    Ok(registry)
}
