pub mod file_entry;
pub mod role;

pub use file_entry::{
    create_file_entry, Classification, FileEntry, MANIFEST_FILE_NAMES, RESERVED_ROOT_FILES,
};
pub use role::{classify_extension, is_companion_extension, Role, COMPANION_EXTENSIONS, EXTENSION_ROLES};
