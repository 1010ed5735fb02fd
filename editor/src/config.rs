use std::path::Path;

use common::FileFormat;
use graph::prelude::UndoConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ui_manager::UpdateMode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub update_mode: UpdateMode,
    pub undo: UndoConfig,
    pub log_level: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            update_mode: UpdateMode::Automatic,
            undo: UndoConfig {
                format: FileFormat::Json,
                max_stack_bytes: Some(64 * 1024 * 1024),
            },
            log_level: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// Missing or unreadable files fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "failed to load config, using defaults");
            Self::default()
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let format = FileFormat::from_file_name(&path.to_string_lossy())?;
        let serialized = std::fs::read_to_string(path)?;
        Ok(common::deserialize(&serialized, format)?)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let format = FileFormat::from_file_name(&path.to_string_lossy())?;
        std::fs::write(path, common::serialize(self, format)?)?;
        Ok(())
    }
}
