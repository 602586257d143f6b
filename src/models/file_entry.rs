use super::role::{classify_extension, is_companion_extension, Role, EXTENSION_ROLES};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

/// Pack metadata that lives at the pack root and must never be relocated.
pub const RESERVED_ROOT_FILES: &[&str] = &["pack.mcmeta", "pack.png", "manifest.json", "pack_icon.png"];

/// Manifests merged by the manifest pass instead of being moved as models.
pub const MANIFEST_FILE_NAMES: &[&str] = &["sounds.json", "fonts.json"];

/// A discovered pack file that has a role and therefore a canonical home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub relative: PathBuf,
    pub extension: String,
    pub role: Role,
}

impl FileEntry {
    /// `<root>/<role dir>/<relative path>`
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(self.role.directory()).join(&self.relative)
    }

    /// True when the file already sits under its role's subtree.
    pub fn is_in_place(&self) -> bool {
        first_component(&self.relative).and_then(Role::from_directory) == Some(self.role)
    }
}

/// Outcome of looking at one discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Asset(FileEntry),
    /// Extension outside the table; left untouched.
    Unrecognized(PathBuf),
    /// Pack metadata or a manifest; left untouched.
    Reserved(PathBuf),
}

/// Classifies a file found under `root`.
///
/// `reserve_manifests` keeps `sounds.json`/`fonts.json` out of the model
/// subtree so the manifest pass can find them.
pub fn create_file_entry(root: &Path, path: &Path, reserve_manifests: bool) -> Classification {
    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    let file_name = path
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default();

    let at_root = relative.components().count() == 1;
    if at_root && RESERVED_ROOT_FILES.iter().any(|name| name.eq_ignore_ascii_case(file_name)) {
        return Classification::Reserved(path.to_path_buf());
    }
    if reserve_manifests && MANIFEST_FILE_NAMES.iter().any(|name| name.eq_ignore_ascii_case(file_name)) {
        return Classification::Reserved(path.to_path_buf());
    }

    let Some(extension) = path.extension().and_then(OsStr::to_str) else {
        return Classification::Unrecognized(path.to_path_buf());
    };

    let role = if is_companion_extension(extension) {
        Some(resolve_companion_role(path, &relative))
    } else {
        classify_extension(extension)
    };

    match role {
        Some(role) => Classification::Asset(FileEntry {
            path: path.to_path_buf(),
            relative,
            extension: extension.to_ascii_lowercase(),
            role,
        }),
        None => Classification::Unrecognized(path.to_path_buf()),
    }
}

/// Works out which asset a `.mcmeta` file belongs to.
fn resolve_companion_role(path: &Path, relative: &Path) -> Role {
    // bar.png.mcmeta
    let inner = path
        .file_stem()
        .map(Path::new)
        .and_then(Path::extension)
        .and_then(OsStr::to_str)
        .and_then(classify_extension);
    if let Some(role) = inner {
        return role;
    }

    if let Some(role) = first_component(relative).and_then(Role::from_directory) {
        return role;
    }

    // bar.mcmeta next to bar.png
    for (ext, role) in EXTENSION_ROLES {
        if path.with_extension(ext).is_file() {
            return *role;
        }
    }

    let hinted = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .find_map(Role::from_directory);

    hinted.unwrap_or(Role::Texture)
}

/// The leading path component, if it is a plain UTF-8 name.
fn first_component(relative: &Path) -> Option<&str> {
    match relative.components().next() {
        Some(Component::Normal(name)) => name.to_str(),
        _ => None,
    }
}
