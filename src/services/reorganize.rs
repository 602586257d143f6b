use crate::error::{ReorganizeError, Result};
use crate::models::{create_file_entry, Classification, FileEntry, Role};
use crate::services::manifests::{merge_manifests, ManifestReport};
use crate::utils::{
    list_files_recursive, prune_empty_dirs, transfer_file_safe, CollisionPolicy, TransferMode,
    TransferOptions, TransferResult,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Configuration for a reorganization run
#[derive(Debug, Clone, Default)]
pub struct ReorganizeConfig {
    pub mode: TransferMode,
    pub collision: CollisionPolicy,
    pub dry_run: bool,
    pub merge_manifests: bool,
    pub keep_empty_dirs: bool,
}

impl ReorganizeConfig {
    fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            mode: self.mode,
            collision: self.collision,
            dry_run: self.dry_run,
        }
    }
}

/// A file that has to leave its current location.
#[derive(Debug, Clone)]
pub struct PlannedTransfer {
    pub entry: FileEntry,
    pub destination: PathBuf,
}

/// Everything a run would do, computed before any file is touched.
#[derive(Debug, Default)]
pub struct ReorganizationPlan {
    pub transfers: Vec<PlannedTransfer>,
    pub in_place: usize,
    pub unrecognized: Vec<PathBuf>,
    pub reserved: Vec<PathBuf>,
    pub errors: Vec<ReorganizeError>,
}

/// Fails unless `root` is an existing, readable directory.
pub fn check_root(root: &Path) -> Result<()> {
    let metadata = match fs::metadata(root) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ReorganizeError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(ReorganizeError::RootUnreadable {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    if !metadata.is_dir() {
        return Err(ReorganizeError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }

    fs::read_dir(root).map_err(|e| ReorganizeError::RootUnreadable {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(())
}

/// Walks the pack and classifies every file. Read-only.
pub fn plan_reorganization(root: &Path, config: &ReorganizeConfig) -> Result<ReorganizationPlan> {
    check_root(root)?;

    let listing = list_files_recursive(root);
    let mut plan = ReorganizationPlan {
        errors: listing.errors,
        ..ReorganizationPlan::default()
    };

    for path in listing.files {
        match create_file_entry(root, &path, config.merge_manifests) {
            Classification::Asset(entry) if entry.is_in_place() => {
                plan.in_place += 1;
            }
            Classification::Asset(entry) => {
                let destination = entry.destination(root);
                plan.transfers.push(PlannedTransfer { entry, destination });
            }
            Classification::Unrecognized(path) => {
                debug!("Leaving unrecognized file {}", path.display());
                plan.unrecognized.push(path);
            }
            Classification::Reserved(path) => {
                debug!("Leaving reserved file {}", path.display());
                plan.reserved.push(path);
            }
        }
    }

    Ok(plan)
}

/// Reorganizes the pack at `root` into its role subtrees.
///
/// Only root-level problems are returned as errors. Per-file failures are
/// logged, collected in the report, and the run carries on.
pub fn reorganize_pack(root: &Path, config: &ReorganizeConfig) -> Result<ReorganizeReport> {
    info!("Reorganizing pack at {}", root.display());

    let plan = plan_reorganization(root, config)?;

    info!(
        "Found {} files to relocate, {} already in place, {} unrecognized",
        plan.transfers.len(),
        plan.in_place,
        plan.unrecognized.len()
    );

    let options = config.transfer_options();
    let mut vacated = BTreeSet::new();
    let results: Vec<(Role, TransferResult)> = plan
        .transfers
        .iter()
        .map(|transfer| {
            let result = transfer_file_safe(&transfer.entry.path, &transfer.destination, &options);
            if result.source_removed(config.mode) {
                if let Some(parent) = transfer.entry.path.parent() {
                    vacated.insert(parent.to_path_buf());
                }
            }
            (transfer.entry.role, result)
        })
        .collect();

    let pruned_dirs: usize = if config.mode == TransferMode::Move && !config.keep_empty_dirs {
        // deepest first
        vacated.iter().rev().map(|dir| prune_empty_dirs(dir, root)).sum()
    } else {
        0
    };

    let mut report = create_reorganize_report(root, config, results);
    report.in_place = plan.in_place;
    report.unrecognized = plan.unrecognized.len();
    report.reserved = plan.reserved.len();
    report.pruned_dirs = pruned_dirs;
    for err in plan.errors {
        error!("{}", err);
        report.errors.push(TransferError::from_error(&err, None));
    }

    if config.merge_manifests {
        match merge_manifests(root, config.dry_run) {
            Ok(manifests) => report.manifests = Some(manifests),
            Err(e) => {
                error!("Manifest merge failed: {}", e);
                report.errors.push(TransferError::from_error(&e, None));
            }
        }
    }

    info!(
        "Reorganization completed. Relocated: {}, Identical: {}, Skipped: {}, Errors: {}",
        report.relocated,
        report.identical,
        report.skipped,
        report.errors.len()
    );

    Ok(report)
}

/// Builds the report from per-file transfer results
fn create_reorganize_report(
    root: &Path,
    config: &ReorganizeConfig,
    results: Vec<(Role, TransferResult)>,
) -> ReorganizeReport {
    let mut report = ReorganizeReport::empty(root, config);

    for (role, result) in results {
        match result {
            TransferResult::Transferred { source, destination } => {
                info!("Relocated {} {} -> {}", role, source.display(), destination.display());
                report.relocated += 1;
                report.relocated_files.push(RelocatedFile::new(&source, &destination, role));
            }
            TransferResult::Identical { source, destination } => {
                debug!(
                    "{} already present at {}",
                    source.display(),
                    destination.display()
                );
                report.identical += 1;
            }
            TransferResult::Skipped { source, destination, reason } => {
                warn!(
                    "Skipped {} -> {}: {}",
                    source.display(),
                    destination.display(),
                    reason
                );
                report.skipped += 1;
            }
            TransferResult::Planned { source, destination } => {
                info!("Would move {} -> {}", source.display(), destination.display());
                report.planned += 1;
                report.relocated_files.push(RelocatedFile::new(&source, &destination, role));
            }
            TransferResult::Error { source, destination, error } => {
                error!(
                    "Failed to relocate {} to {}: {}",
                    source.display(),
                    destination.display(),
                    error
                );
                report
                    .errors
                    .push(TransferError::from_error(&error, Some(&destination)));
            }
        }
    }

    report
}

/// Summary of a reorganization run
#[derive(Debug, Clone, Serialize)]
pub struct ReorganizeReport {
    pub root: String,
    pub mode: TransferMode,
    pub collision: CollisionPolicy,
    pub dry_run: bool,
    pub relocated: usize,
    pub identical: usize,
    pub skipped: usize,
    pub planned: usize,
    pub in_place: usize,
    pub unrecognized: usize,
    pub reserved: usize,
    pub pruned_dirs: usize,
    pub relocated_files: Vec<RelocatedFile>,
    pub errors: Vec<TransferError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifests: Option<ManifestReport>,
}

impl ReorganizeReport {
    pub fn empty(root: &Path, config: &ReorganizeConfig) -> Self {
        Self {
            root: root.to_string_lossy().to_string(),
            mode: config.mode,
            collision: config.collision,
            dry_run: config.dry_run,
            relocated: 0,
            identical: 0,
            skipped: 0,
            planned: 0,
            in_place: 0,
            unrecognized: 0,
            reserved: 0,
            pruned_dirs: 0,
            relocated_files: Vec::new(),
            errors: Vec::new(),
            manifests: None,
        }
    }

    /// Files that had a role, whatever happened to them.
    pub fn total_processed(&self) -> usize {
        self.relocated + self.identical + self.skipped + self.planned + self.in_place
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RelocatedFile {
    pub source: String,
    pub destination: String,
    pub role: Role,
}

impl RelocatedFile {
    fn new(source: &Path, destination: &Path, role: Role) -> Self {
        Self {
            source: source.to_string_lossy().to_string(),
            destination: destination.to_string_lossy().to_string(),
            role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferError {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub error: String,
}

impl TransferError {
    fn from_error(error: &ReorganizeError, destination: Option<&Path>) -> Self {
        Self {
            kind: error.kind(),
            destination: destination.map(|d| d.to_string_lossy().to_string()),
            error: error.to_string(),
        }
    }
}
