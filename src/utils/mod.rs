pub mod file_operations;

pub use file_operations::{
    ensure_parent_dir, file_digest, files_identical, list_files_recursive, prune_empty_dirs,
    transfer_file, transfer_file_safe, CollisionPolicy, DirectoryListing, TransferMode,
    TransferOptions, TransferResult,
};
