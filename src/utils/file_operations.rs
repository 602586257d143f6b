use crate::error::ReorganizeError;
use crate::models::Role;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// How a file reaches its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    #[default]
    Move,
    Copy,
}

/// What to do when the destination already holds a different file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Last writer wins.
    #[default]
    Overwrite,
    /// Pick `<stem>_<n>.<ext>` with the smallest free `n`.
    Rename,
    /// Leave the source where it is.
    Skip,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "rename" => Ok(CollisionPolicy::Rename),
            "skip" => Ok(CollisionPolicy::Skip),
            other => Err(format!("unknown collision policy: {}", other)),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollisionPolicy::Overwrite => "overwrite",
            CollisionPolicy::Rename => "rename",
            CollisionPolicy::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// Options for a single transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferOptions {
    pub mode: TransferMode,
    pub collision: CollisionPolicy,
    pub dry_run: bool,
}

/// Files found under a directory, plus whatever could not be read on the way.
#[derive(Debug, Default)]
pub struct DirectoryListing {
    pub files: Vec<PathBuf>,
    pub errors: Vec<ReorganizeError>,
}

/// Recursively lists regular files under `root`, sorted by name.
/// Hidden entries below the root are not visited.
pub fn list_files_recursive(root: &Path) -> DirectoryListing {
    let mut listing = DirectoryListing::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => listing.files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                warn!("Failed to read {}: {}", path.display(), e);
                let error = match e.io_error().map(io::Error::kind) {
                    Some(io::ErrorKind::PermissionDenied) => ReorganizeError::PermissionDenied { path },
                    _ => ReorganizeError::Traversal {
                        path,
                        reason: e.to_string(),
                    },
                };
                listing.errors.push(error);
            }
        }
    }

    listing
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Create the parent directory of `path` if it is missing.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Moves or copies `source` to `destination`, replacing whatever is there.
pub fn transfer_file(source: &Path, destination: &Path, mode: TransferMode) -> io::Result<()> {
    ensure_parent_dir(destination)?;

    match mode {
        TransferMode::Copy => fs::copy(source, destination).map(|_| ()),
        TransferMode::Move => match fs::rename(source, destination) {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.kind(), io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound) => Err(e),
            Err(e) => {
                // rename cannot cross filesystems
                debug!("rename failed ({}), falling back to copy", e);
                fs::copy(source, destination)?;
                fs::remove_file(source)
            }
        },
    }
}

/// SHA-256 of a file's contents, hex encoded.
pub fn file_digest(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 128 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Byte-for-byte equality, checked by size first and digest second.
/// Anything that is not a regular file is never identical.
pub fn files_identical(a: &Path, b: &Path) -> io::Result<bool> {
    let (meta_a, meta_b) = (fs::metadata(a)?, fs::metadata(b)?);
    if !meta_a.is_file() || !meta_b.is_file() || meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    Ok(file_digest(a)? == file_digest(b)?)
}

/// `dir/bar.png` -> `dir/bar_<n>.png`
pub fn numbered_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };
    path.with_file_name(name)
}

enum CollisionOutcome {
    Free(PathBuf),
    Identical(PathBuf),
    Occupied,
}

fn resolve_collision(
    source: &Path,
    destination: &Path,
    policy: CollisionPolicy,
) -> io::Result<CollisionOutcome> {
    if !destination.exists() {
        return Ok(CollisionOutcome::Free(destination.to_path_buf()));
    }
    if files_identical(source, destination)? {
        return Ok(CollisionOutcome::Identical(destination.to_path_buf()));
    }

    match policy {
        CollisionPolicy::Overwrite => Ok(CollisionOutcome::Free(destination.to_path_buf())),
        CollisionPolicy::Skip => Ok(CollisionOutcome::Occupied),
        CollisionPolicy::Rename => {
            let mut n = 1;
            loop {
                let candidate = numbered_path(destination, n);
                if !candidate.exists() {
                    return Ok(CollisionOutcome::Free(candidate));
                }
                if files_identical(source, &candidate)? {
                    return Ok(CollisionOutcome::Identical(candidate));
                }
                n += 1;
            }
        }
    }
}

/// Transfers one file, applying the collision policy. Never panics and never
/// aborts: failures come back as [`TransferResult::Error`].
pub fn transfer_file_safe(source: &Path, destination: &Path, options: &TransferOptions) -> TransferResult {
    if options.dry_run {
        return TransferResult::Planned {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        };
    }

    let target = match resolve_collision(source, destination, options.collision) {
        Ok(CollisionOutcome::Free(target)) => target,
        Ok(CollisionOutcome::Identical(existing)) => {
            if options.mode == TransferMode::Move {
                if let Err(e) = fs::remove_file(source) {
                    return TransferResult::Error {
                        source: source.to_path_buf(),
                        destination: existing.clone(),
                        error: ReorganizeError::from_transfer(source, &existing, &e),
                    };
                }
            }
            return TransferResult::Identical {
                source: source.to_path_buf(),
                destination: existing,
            };
        }
        Ok(CollisionOutcome::Occupied) => {
            return TransferResult::Skipped {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                reason: "destination already exists".to_string(),
            };
        }
        Err(e) => {
            return TransferResult::Error {
                source: source.to_path_buf(),
                destination: destination.to_path_buf(),
                error: ReorganizeError::from_transfer(source, destination, &e),
            };
        }
    };

    match transfer_file(source, &target, options.mode) {
        Ok(()) => TransferResult::Transferred {
            source: source.to_path_buf(),
            destination: target,
        },
        Err(e) => TransferResult::Error {
            source: source.to_path_buf(),
            destination: target.clone(),
            error: ReorganizeError::from_transfer(source, &target, &e),
        },
    }
}

/// Removes `start` and its ancestors while they are empty. Stops at `root`
/// and never removes a role directory directly under it.
pub fn prune_empty_dirs(start: &Path, root: &Path) -> usize {
    let mut removed = 0;
    let mut current = start.to_path_buf();

    while current != root && current.starts_with(root) {
        let is_role_dir = current.parent() == Some(root)
            && current
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(Role::from_directory)
                .is_some();
        if is_role_dir {
            break;
        }
        // remove_dir refuses non-empty directories
        if fs::remove_dir(&current).is_err() {
            break;
        }
        debug!("Removed empty directory {}", current.display());
        removed += 1;

        current = match current.parent() {
            Some(parent) => parent.to_path_buf(),
            None => break,
        };
    }

    removed
}

/// Result of a single file transfer
#[derive(Debug)]
pub enum TransferResult {
    Transferred {
        source: PathBuf,
        destination: PathBuf,
    },
    /// The destination already held the same bytes.
    Identical {
        source: PathBuf,
        destination: PathBuf,
    },
    Skipped {
        source: PathBuf,
        destination: PathBuf,
        reason: String,
    },
    Planned {
        source: PathBuf,
        destination: PathBuf,
    },
    Error {
        source: PathBuf,
        destination: PathBuf,
        error: ReorganizeError,
    },
}

impl TransferResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferResult::Transferred { .. } | TransferResult::Identical { .. })
    }

    /// Whether the source file is gone after this result.
    pub fn source_removed(&self, mode: TransferMode) -> bool {
        mode == TransferMode::Move && self.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        ensure_parent_dir(&path).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn options(mode: TransferMode, collision: CollisionPolicy) -> TransferOptions {
        TransferOptions {
            mode,
            collision,
            dry_run: false,
        }
    }

    #[test]
    fn test_list_files_recursive_skips_hidden() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b/two.png", "2");
        write(temp.path(), "a/one.json", "1");
        write(temp.path(), ".git/config", "x");

        let listing = list_files_recursive(temp.path());
        let relative: Vec<PathBuf> = listing
            .files
            .iter()
            .map(|p| p.strip_prefix(temp.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(relative, vec![PathBuf::from("a/one.json"), PathBuf::from("b/two.png")]);
        assert!(listing.errors.is_empty());
    }

    #[test]
    fn test_move_creates_parent_dirs() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "pixels");
        let destination = temp.path().join("textures/foo/bar.png");

        let result = transfer_file_safe(&source, &destination, &options(TransferMode::Move, CollisionPolicy::Overwrite));

        assert!(result.is_success());
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "pixels");
    }

    #[test]
    fn test_copy_keeps_source() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "pixels");
        let destination = temp.path().join("textures/foo/bar.png");

        let result = transfer_file_safe(&source, &destination, &options(TransferMode::Copy, CollisionPolicy::Overwrite));

        assert!(matches!(result, TransferResult::Transferred { .. }));
        assert!(source.exists());
        assert!(destination.exists());
    }

    #[test]
    fn test_overwrite_replaces_destination() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "new");
        let destination = write(temp.path(), "textures/foo/bar.png", "old");

        let result = transfer_file_safe(&source, &destination, &options(TransferMode::Move, CollisionPolicy::Overwrite));

        assert!(result.is_success());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "new");
    }

    #[test]
    fn test_rename_picks_next_free_name() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "third");
        let destination = write(temp.path(), "textures/foo/bar.png", "first");
        write(temp.path(), "textures/foo/bar_1.png", "second");

        let result = transfer_file_safe(&source, &destination, &options(TransferMode::Move, CollisionPolicy::Rename));

        match result {
            TransferResult::Transferred { destination: target, .. } => {
                assert_eq!(target, temp.path().join("textures/foo/bar_2.png"));
                assert_eq!(fs::read_to_string(&target).unwrap(), "third");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(fs::read_to_string(&destination).unwrap(), "first");
    }

    #[test]
    fn test_rename_reuses_identical_candidate() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "second");
        let destination = write(temp.path(), "textures/foo/bar.png", "first");
        write(temp.path(), "textures/foo/bar_1.png", "second");

        let result = transfer_file_safe(&source, &destination, &options(TransferMode::Copy, CollisionPolicy::Rename));

        assert!(matches!(result, TransferResult::Identical { .. }));
        assert!(!temp.path().join("textures/foo/bar_2.png").exists());
    }

    #[test]
    fn test_skip_leaves_source() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "new");
        let destination = write(temp.path(), "textures/foo/bar.png", "old");

        let result = transfer_file_safe(&source, &destination, &options(TransferMode::Move, CollisionPolicy::Skip));

        assert!(matches!(result, TransferResult::Skipped { .. }));
        assert!(source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
    }

    #[test]
    fn test_identical_destination_removes_source_on_move() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "same");
        let destination = write(temp.path(), "textures/foo/bar.png", "same");

        let result = transfer_file_safe(&source, &destination, &options(TransferMode::Move, CollisionPolicy::Skip));

        assert!(matches!(result, TransferResult::Identical { .. }));
        assert!(!source.exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "pixels");
        let destination = temp.path().join("textures/foo/bar.png");
        let opts = TransferOptions {
            dry_run: true,
            ..TransferOptions::default()
        };

        let result = transfer_file_safe(&source, &destination, &opts);

        assert!(matches!(result, TransferResult::Planned { .. }));
        assert!(source.exists());
        assert!(!temp.path().join("textures").exists());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("gone.png");
        let destination = temp.path().join("textures/gone.png");

        let result = transfer_file_safe(&source, &destination, &TransferOptions::default());

        assert!(matches!(result, TransferResult::Error { .. }));
    }

    #[test]
    fn test_numbered_path() {
        assert_eq!(numbered_path(Path::new("t/bar.png"), 1), PathBuf::from("t/bar_1.png"));
        assert_eq!(numbered_path(Path::new("t/bar.png.mcmeta"), 2), PathBuf::from("t/bar.png_2.mcmeta"));
    }

    #[test]
    fn test_directory_destination_is_an_error() {
        let temp = TempDir::new().unwrap();
        let source = write(temp.path(), "foo/bar.png", "png");
        write(temp.path(), "textures/foo/bar.png/inner.txt", "x");
        let destination = temp.path().join("textures/foo/bar.png");

        assert!(!files_identical(&source, &destination).unwrap());
        let result = transfer_file_safe(&source, &destination, &TransferOptions::default());

        assert!(matches!(result, TransferResult::Error { .. }));
        assert!(source.is_file());
    }

    #[test]
    fn test_files_identical() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a.png", "abc");
        let b = write(temp.path(), "b.png", "abc");
        let c = write(temp.path(), "c.png", "abd");
        assert!(files_identical(&a, &b).unwrap());
        assert!(!files_identical(&a, &c).unwrap());
    }

    #[test]
    fn test_prune_stops_at_role_dir_and_non_empty() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("foo/bar/baz")).unwrap();
        write(root, "foo/keep.txt", "x");
        fs::create_dir_all(root.join("textures")).unwrap();

        assert_eq!(prune_empty_dirs(&root.join("foo/bar/baz"), root), 2);
        assert!(root.join("foo").exists());
        assert!(!root.join("foo/bar").exists());

        assert_eq!(prune_empty_dirs(&root.join("textures"), root), 0);
        assert!(root.join("textures").exists());
    }

    #[test]
    fn test_collision_policy_from_str() {
        assert_eq!("rename".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Rename));
        assert_eq!("SKIP".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Skip));
        assert!("merge".parse::<CollisionPolicy>().is_err());
    }

    #[test]
    fn test_collision_policy_display_parses_back() {
        for policy in [CollisionPolicy::Overwrite, CollisionPolicy::Rename, CollisionPolicy::Skip] {
            assert_eq!(policy.to_string().parse::<CollisionPolicy>(), Ok(policy));
        }
    }
}
