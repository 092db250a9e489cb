use std::path::PathBuf;
use std::sync::Arc;

use crate::context::Context;

#[derive(Debug, Clone)]
pub struct File {
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub extname: String,
    pub content: Option<String>,
}

impl Default for File {
    fn default() -> Self {
        File {
            path: PathBuf::new(),
            relative_path: PathBuf::new(),
            extname: "".to_string(),
            content: None,
        }
    }
}

impl File {
    pub fn new(path: String, context: Arc<Context>) -> Self {
        let path = PathBuf::from(path);
        let relative_path = path
            .strip_prefix(&context.root)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| path.clone());
        let extname = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        File {
            path,
            relative_path,
            extname,
            ..Default::default()
        }
    }

    pub fn set_content(&mut self, content: String) {
        self.content = Some(content);
    }

    pub fn get_content_raw(&self) -> String {
        self.content.clone().unwrap_or_default()
    }

    /// The identity the exclusion rules and the per-file state are keyed by.
    pub fn identity(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    pub fn is_typescript(&self) -> bool {
        self.extname == "ts" || self.extname == "tsx" || self.extname == "mts" || self.extname == "cts"
    }
}
