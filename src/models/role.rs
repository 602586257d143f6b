use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a pack file; decides which subtree it belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Texture,
    Model,
    Sound,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Texture, Role::Model, Role::Sound];

    /// Canonical subdirectory under the pack root.
    pub fn directory(self) -> &'static str {
        match self {
            Role::Texture => "textures",
            Role::Model => "models",
            Role::Sound => "sounds",
        }
    }

    /// Inverse of [`Role::directory`], ignoring ASCII case. `Textures/` is the
    /// same directory as `textures/` on case-insensitive filesystems.
    pub fn from_directory(name: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| role.directory().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Texture => "texture",
            Role::Model => "model",
            Role::Sound => "sound",
        };
        f.write_str(name)
    }
}

/// Extension to role table. Order matters for sibling lookups of companion
/// files: the first matching sibling wins.
pub const EXTENSION_ROLES: &[(&str, Role)] = &[
    ("png", Role::Texture),
    ("tga", Role::Texture),
    ("ogg", Role::Sound),
    ("json", Role::Model),
];

/// Extensions that carry no role of their own and follow the asset they annotate.
pub const COMPANION_EXTENSIONS: &[&str] = &["mcmeta"];

/// Looks up the role for an extension (without the dot), ignoring case.
pub fn classify_extension(extension: &str) -> Option<Role> {
    EXTENSION_ROLES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, role)| *role)
}

pub fn is_companion_extension(extension: &str) -> bool {
    COMPANION_EXTENSIONS
        .iter()
        .any(|ext| ext.eq_ignore_ascii_case(extension))
}
