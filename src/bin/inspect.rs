//! Webhook Inspector CLI
//!
//! Decodes webhook payloads from disk and describes the registered schema
//! variants. Meant for migration and diagnostic work, not for serving traffic.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webhook_schemas::loader;
use webhook_schemas::{
    DecodeOptions, EngineConfig, EventDispatcher, EventType, MissingVersionPolicy, Mode,
    VersionRegistry,
};

#[derive(Parser)]
#[command(name = "webhook-inspect")]
#[command(about = "Decode webhook payloads and inspect schema variants")]
struct Cli {
    /// Configuration file (layered over the default locations)
    #[arg(short, long)]
    config: Option<String>,

    /// Load definitions from this directory instead of the embedded set
    #[arg(long)]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a payload and print the typed event or the error report
    Decode {
        /// JSON payload file
        file: PathBuf,
        /// Ignore undeclared keys
        #[arg(long)]
        lenient: bool,
        /// Version to diagnose against when the payload has none
        #[arg(long)]
        version_hint: Option<String>,
        /// Diagnose version-less payloads against the latest variant
        #[arg(long)]
        diagnose_latest: bool,
    },

    /// List registered variants with their checksums
    Variants {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the entity graph of one variant
    Describe {
        /// Event type, e.g. APPLICANT
        event_type: String,
        /// Version, e.g. 2.0
        version: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match EngineConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `false` when the command ran but the outcome is a failure
fn run(cli: Cli, mut config: EngineConfig) -> anyhow::Result<bool> {
    if cli.schema_dir.is_some() {
        config.registry.schema_dir = cli.schema_dir;
    }
    let registry = loader::load(&config.registry).context("Failed to load schema definitions")?;

    match cli.command {
        Commands::Decode {
            file,
            lenient,
            version_hint,
            diagnose_latest,
        } => {
            let mut options: DecodeOptions = config.decode_options();
            if lenient {
                options.mode = Mode::Lenient;
            }
            if diagnose_latest {
                options.missing_version = MissingVersionPolicy::DiagnoseLatest;
            }
            options.version_hint = version_hint;

            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            match EventDispatcher::new(&registry).decode_str(&raw, &options) {
                Ok(event) => {
                    println!("{}", serde_json::to_string_pretty(&event)?);
                    Ok(true)
                }
                Err(report) => {
                    eprintln!("❌ {}", report.render());
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok(false)
                }
            }
        }

        Commands::Variants { json } => {
            list_variants(&registry, json)?;
            Ok(true)
        }

        Commands::Describe { event_type, version } => {
            let event_type: EventType = event_type.parse()?;
            let variant = registry.resolve(event_type, &version)?;
            let graph = variant.graph();

            println!("📋 {} {} (checksum {})", event_type, version, variant.checksum().short());
            println!();
            for (id, entity) in graph.entities() {
                let marker = if graph.is_recursive(id) { " ↻" } else { "" };
                println!("{}{}", entity.name, marker);
                for field in &entity.fields {
                    let mut line = format!("  {}: {}", field.wire_name, graph.describe(&field.value_type));
                    if field.nullable {
                        line.push('?');
                    }
                    if field.required {
                        line.push_str("  [required]");
                    }
                    if let Some(default) = &field.default {
                        line.push_str(&format!("  = {}", default));
                    }
                    if field.is_aliased() {
                        line.push_str(&format!("  (as {})", field.logical_name));
                    }
                    println!("{}", line);
                }
            }
            println!();
            for (_, schema) in graph.enums() {
                println!("enum {} = [{}]", schema.name, schema.values.join(", "));
            }

            let recursive = graph.recursive_entities();
            if !recursive.is_empty() {
                println!();
                println!("Recursive entities: {}", recursive.join(", "));
            }
            Ok(true)
        }
    }
}

fn list_variants(registry: &VersionRegistry, json: bool) -> anyhow::Result<()> {
    if registry.is_empty() {
        bail!("No schema variants registered");
    }

    if json {
        let summaries: Vec<_> = registry.variants().map(|v| v.summary()).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("📦 {} variants (fingerprint {})", registry.len(), registry.fingerprint().short());
    for variant in registry.variants() {
        let summary = variant.summary();
        println!(
            "  {:<24} {:<6} root={:<36} entities={:<3} checksum={}",
            summary.event_type.as_str(),
            summary.version,
            summary.root,
            summary.entities,
            variant.checksum().short()
        );
    }
    Ok(())
}
