//! Prompt Loader - Read prompt overrides from a directory
//!
//! A prompts directory holds `<name>.md` files that replace the built-in
//! templates of the same name.

use std::path::{Path, PathBuf};

use crate::error::{Result, TaskpilotError};

/// Reads prompt overrides from a directory
pub struct PromptLoader {
    templates_dir: PathBuf,
}

impl PromptLoader {
    pub fn new(templates_dir: impl AsRef<Path>) -> Self {
        Self {
            templates_dir: templates_dir.as_ref().to_path_buf(),
        }
    }

    /// The override for `name` if one exists on disk, otherwise `default`
    pub fn load_or(&self, name: &str, default: &str) -> Result<String> {
        let path = self.template_path(name);
        if !path.exists() {
            return Ok(default.to_string());
        }

        log::debug!("Using prompt override {:?}", path);
        std::fs::read_to_string(&path).map_err(|e| {
            TaskpilotError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to load template '{}' from {:?}: {}", name, path, e),
            ))
        })
    }

    fn template_path(&self, name: &str) -> PathBuf {
        self.templates_dir.join(format!("{}.md", name))
    }
}
