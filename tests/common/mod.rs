//! Shared helpers for pack-reorganizer integration tests

use std::path::PathBuf;
use tempfile::TempDir;
use walkdir::WalkDir;

/// A scratch resource pack
pub struct TestPack {
    #[allow(dead_code)]
    pub temp: TempDir,
    pub path: PathBuf,
}

impl TestPack {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let path = temp.path().join("pack");
        std::fs::create_dir_all(&path).expect("Failed to create pack directory");
        Self { temp, path }
    }

    /// Write a file relative to the pack root
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path.join(path)).expect("Failed to read file")
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.path.join(path).exists()
    }

    /// Every file under the pack, relative and sorted
    pub fn tree(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(&self.path)
            .into_iter()
            .map(|entry| entry.expect("Failed to read entry"))
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| {
                let relative = entry.path().strip_prefix(&self.path).expect("Path outside root");
                relative.to_string_lossy().replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }
}
