pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use error::ReorganizeError;
pub use models::{classify_extension, create_file_entry, Classification, FileEntry, Role};
pub use services::{
    merge_manifests, plan_reorganization, reorganize_pack, ManifestReport, ReorganizeConfig,
    ReorganizeReport,
};
pub use utils::{CollisionPolicy, TransferMode};

use std::path::PathBuf;

// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub root: PathBuf,
    pub reorganize: ReorganizeConfig,
    pub log_level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            reorganize: ReorganizeConfig::default(),
            log_level: "info".to_string(),
            json: false,
        }
    }
}
