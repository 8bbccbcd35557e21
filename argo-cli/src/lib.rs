//! Command definitions and handlers for the `argo` binary.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use argo_storage::MemoryStorage;
use argo_translate::{ArgoConfig, ArgoService, TranslationPayload, TranslationsById};
use argo_types::{EntityUuid, Langcode, RevisionId};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "argo")]
#[command(about = "Export and translate content entities")]
pub struct Cli {
    /// Store snapshot (JSON) to operate on
    #[arg(short, long)]
    pub store: PathBuf,

    /// Argo configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Export an entity's translatable properties
    Export {
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        uuid: EntityUuid,
        /// Export this revision instead of the default one
        #[arg(long)]
        revision: Option<RevisionId>,
    },
    /// Import translated values for an entity and its references
    Translate {
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        uuid: EntityUuid,
        /// Payload file: one payload, or payloads keyed by entity UUID
        #[arg(long)]
        payload: PathBuf,
        /// Write the updated store back to the snapshot file
        #[arg(long)]
        write: bool,
    },
    /// Show a field's values in the given languages
    GetField {
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        id: u64,
        #[arg(long)]
        field: String,
        #[arg(long = "lang", required = true)]
        languages: Vec<Langcode>,
        /// Bundles whose unpublished translations are hidden
        #[arg(long)]
        published_only: Vec<String>,
    },
    /// Look up an entity's UUID by numeric id
    Uuid {
        #[arg(long)]
        entity_type: String,
        #[arg(long)]
        id: u64,
    },
}

/// Runs a command and returns its JSON output.
pub fn run(cli: &Cli) -> Result<Value> {
    let config = match &cli.config {
        Some(path) => ArgoConfig::from_file(path).with_context(|| format!("reading config {}", path.display()))?,
        None => ArgoConfig::default(),
    };
    let storage =
        MemoryStorage::open(&cli.store).with_context(|| format!("opening store {}", cli.store.display()))?;
    let mut service = ArgoService::new(storage, config);

    match &cli.command {
        Command::Export {
            entity_type,
            uuid,
            revision,
        } => {
            let bundle = service.export(entity_type, uuid, *revision)?;
            Ok(serde_json::to_value(bundle)?)
        }
        Command::Translate {
            entity_type,
            uuid,
            payload,
            write,
        } => {
            let translations = read_payloads(payload)?;
            let report = service.translate(entity_type, uuid, &translations)?;
            if *write {
                service.storage().write_to(&cli.store)?;
                info!(store = %cli.store.display(), "Store updated");
            }
            Ok(serde_json::to_value(report)?)
        }
        Command::GetField {
            entity_type,
            id,
            field,
            languages,
            published_only,
        } => {
            let values = service.get_field(entity_type, *id, field, languages, published_only)?;
            Ok(serde_json::to_value(values)?)
        }
        Command::Uuid { entity_type, id } => {
            let uuid = service.entity_uuid(entity_type, *id)?;
            Ok(json!({ "uuid": uuid }))
        }
    }
}

/// Reads a payload file holding either a single payload or a map of
/// payloads keyed by entity UUID.
pub fn read_payloads(path: &Path) -> Result<TranslationsById> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading payload {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)?;
    if value.get("items").is_some() {
        let payload: TranslationPayload = serde_json::from_value(value)?;
        return Ok(BTreeMap::from([(payload.entity_id, payload)]));
    }
    let translations: TranslationsById = serde_json::from_value(value)?;
    if translations.is_empty() {
        bail!("payload file {} holds no translations", path.display());
    }
    Ok(translations)
}
