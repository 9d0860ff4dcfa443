use std::path::{Path, PathBuf};

use path_clean::PathClean;

#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub extname: String,
    pub content: String,
    pub is_entry: bool,
}

impl File {
    pub fn new(path: PathBuf, content: String) -> Self {
        let path = normalize(&path);
        let extname = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        File {
            path,
            extname,
            content,
            is_entry: false,
        }
    }

    pub fn new_entry(path: PathBuf, content: String) -> Self {
        let mut file = File::new(path, content);
        file.is_entry = true;
        file
    }

    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}

/// Lexically normalized path: `.` and `..` segments removed, no filesystem access.
pub fn normalize(path: &Path) -> PathBuf {
    path.clean()
}
