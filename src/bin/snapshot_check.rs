//! Snapshot Check Binary
//!
//! Loads a historic snapshot file, verifies every record, and prints a JSON
//! digest to stdout.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `SNAPSHOT_PATH`: snapshot file to check (required)
//! - `SECONDARY_SNAPSHOT_PATH`: snapshot consulted for hierarchies the first one lacks (optional)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! SNAPSHOT_PATH=release_20240101.tsv cargo run --bin snapshot_check
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use release_lifecycle_kernel::{
    verify_index, HierarchyAttributor, HierarchyLookup, InMemoryTerminologyGraph, IntegrityError,
    LookupSource, SnapshotError, SnapshotIndex, SNAPSHOT_SCHEMA_VERSION,
};

#[derive(Debug, thiserror::Error)]
enum CheckError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

#[derive(Debug, Default, Serialize)]
struct SnapshotDigest {
    schema_version: &'static str,
    path: String,
    fingerprint: String,
    concepts: usize,
    active: usize,
    fully_defined: usize,
    intermediate_primitives: usize,
    by_hierarchy: BTreeMap<String, usize>,
    unknown_hierarchy: usize,
    resolved_from_secondary: usize,
}

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "snapshot_check=info,release_lifecycle_kernel=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true).flatten_event(true))
            .init();
    }
}

fn load(path: &PathBuf) -> Result<SnapshotIndex, CheckError> {
    let file = File::open(path).map_err(|source| CheckError::Open {
        path: path.clone(),
        source,
    })?;
    let index = SnapshotIndex::load(BufReader::new(file))?;
    verify_index(&index)?;
    Ok(index)
}

fn check() -> Result<SnapshotDigest, CheckError> {
    let path: PathBuf = std::env::var("SNAPSHOT_PATH")
        .map_err(|_| CheckError::MissingEnv("SNAPSHOT_PATH"))?
        .into();
    let secondary = std::env::var("SECONDARY_SNAPSHOT_PATH")
        .ok()
        .map(PathBuf::from)
        .map(|p| load(&p))
        .transpose()?;

    let start = Instant::now();
    let index = load(&path)?;

    let mut digest = SnapshotDigest {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        path: path.display().to_string(),
        fingerprint: index.fingerprint(),
        concepts: index.len(),
        ..SnapshotDigest::default()
    };

    // Nothing is live here, so every lookup falls through to the snapshots.
    let graph = InMemoryTerminologyGraph::new();
    let attributor = HierarchyAttributor::new(&graph);
    let mut lookup = HierarchyLookup::new(&attributor, &index);
    if let Some(secondary) = secondary.as_ref() {
        lookup = lookup.with_secondary(secondary);
    }

    for datum in index.iter() {
        if datum.active {
            digest.active += 1;
        }
        if datum.definition_status.is_fully_defined() {
            digest.fully_defined += 1;
        }
        if datum.is_intermediate_primitive {
            digest.intermediate_primitives += 1;
        }

        let resolution = lookup.resolve_id(datum.concept_id)?;
        if resolution.source == LookupSource::Secondary {
            digest.resolved_from_secondary += 1;
        }
        if !resolution.bucket.is_known() {
            digest.unknown_hierarchy += 1;
        }
        *digest.by_hierarchy.entry(resolution.bucket.key()).or_default() += 1;
    }

    info!(
        path = %digest.path,
        concepts = digest.concepts,
        unknown_hierarchy = digest.unknown_hierarchy,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "snapshot verified"
    );
    Ok(digest)
}

fn main() -> ExitCode {
    init_tracing();

    match check() {
        Ok(digest) => match serde_json::to_string_pretty(&digest) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "failed to serialize digest");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!(error = %e, "snapshot check failed");
            eprintln!("snapshot_check: {e}");
            ExitCode::FAILURE
        }
    }
}
