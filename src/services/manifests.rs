//! Merging of scattered `sounds.json` / `fonts.json` manifests.
//!
//! Packs assembled from several namespaces tend to carry one manifest per
//! namespace. The merged manifest lives at the pack root; every other
//! manifest with the same name is a source and is left where it is.

use crate::error::{ReorganizeError, Result};
use crate::utils::list_files_recursive;
use serde::Serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SOUNDS_MANIFEST: &str = "sounds.json";
pub const FONTS_MANIFEST: &str = "fonts.json";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sounds: Option<MergedManifest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fonts: Option<MergedManifest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedManifest {
    pub target: String,
    pub sources: usize,
    pub invalid: usize,
    pub written: bool,
}

/// Merges every nested manifest into its root-level counterpart.
pub fn merge_manifests(root: &Path, dry_run: bool) -> Result<ManifestReport> {
    let files = list_files_recursive(root).files;

    let sounds_target = root.join(SOUNDS_MANIFEST);
    let sounds_sources = find_sources(&files, SOUNDS_MANIFEST, &sounds_target);
    let fonts_target = root.join(FONTS_MANIFEST);
    let fonts_sources = find_sources(&files, FONTS_MANIFEST, &fonts_target);

    Ok(ManifestReport {
        sounds: merge_into(&sounds_target, &sounds_sources, json!({}), merge_sounds, dry_run)?,
        fonts: merge_into(
            &fonts_target,
            &fonts_sources,
            json!({ "providers": [] }),
            merge_fonts,
            dry_run,
        )?,
    })
}

fn find_sources(files: &[PathBuf], name: &str, target: &Path) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|path| path.as_path() != target)
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Sound events are keyed by name; a later source replaces an earlier one.
pub fn merge_sounds(base: &mut Value, incoming: Value) -> bool {
    let (Some(base), Value::Object(incoming)) = (base.as_object_mut(), incoming) else {
        return false;
    };
    base.extend(incoming);
    true
}

/// Providers are appended in order, skipping exact duplicates.
pub fn merge_fonts(base: &mut Value, incoming: Value) -> bool {
    let Value::Object(mut incoming) = incoming else {
        return false;
    };
    let Some(base) = base.as_object_mut() else {
        return false;
    };

    let providers = base
        .entry("providers")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !providers.is_array() {
        *providers = Value::Array(Vec::new());
    }

    if let (Some(existing), Some(Value::Array(new))) =
        (providers.as_array_mut(), incoming.remove("providers"))
    {
        for provider in new {
            if !existing.contains(&provider) {
                existing.push(provider);
            }
        }
    }
    true
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    use anyhow::Context;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn merge_into(
    target: &Path,
    sources: &[PathBuf],
    empty: Value,
    merge: fn(&mut Value, Value) -> bool,
    dry_run: bool,
) -> Result<Option<MergedManifest>> {
    if sources.is_empty() {
        return Ok(None);
    }

    let existing = if target.is_file() {
        Some(fs::read_to_string(target).map_err(|e| ReorganizeError::Manifest {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })?)
    } else {
        None
    };

    let mut merged = match &existing {
        Some(content) => serde_json::from_str(content).map_err(|e| ReorganizeError::Manifest {
            path: target.to_path_buf(),
            reason: format!("existing manifest is not valid JSON: {}", e),
        })?,
        None => empty,
    };

    let mut invalid = 0;
    for source in sources {
        match read_json(source) {
            Ok(value) => {
                if !merge(&mut merged, value) {
                    warn!("Ignoring {}: unexpected manifest shape", source.display());
                    invalid += 1;
                }
            }
            Err(e) => {
                warn!("Ignoring {:#}", e);
                invalid += 1;
            }
        }
    }

    let rendered = serde_json::to_string_pretty(&merged).map_err(|e| ReorganizeError::Manifest {
        path: target.to_path_buf(),
        reason: e.to_string(),
    })? + "\n";

    let changed = existing.as_deref() != Some(rendered.as_str());
    let written = changed && !dry_run;
    if written {
        fs::write(target, rendered).map_err(|e| ReorganizeError::Manifest {
            path: target.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(
            "Merged {} manifests into {}",
            sources.len() - invalid,
            target.display()
        );
    }

    Ok(Some(MergedManifest {
        target: target.to_string_lossy().to_string(),
        sources: sources.len(),
        invalid,
        written,
    }))
}
