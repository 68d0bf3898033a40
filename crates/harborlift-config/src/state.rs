//! 前回のビルド状態の保存
//!
//! 最後に成功したイメージタグを `<config_dir>/harborlift/state.json` に保持し、
//! 次回の `lift build` でタグ省略時のデフォルトとして使います。

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_IMAGE_TAG: &str = "your-app-name:latest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    pub last_image_tag: String,
}

impl Default for BuildState {
    fn default() -> Self {
        Self {
            last_image_tag: DEFAULT_IMAGE_TAG.to_string(),
        }
    }
}

impl BuildState {
    /// ファイルが無い、または壊れている場合はデフォルト値
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(state) => state,
            Err(e) => {
                tracing::debug!("Using default build state: {}", e);
                Self::default()
            }
        }
    }

    fn try_load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|source| ConfigError::State {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::State {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_default() {
        let dir = tempdir().unwrap();
        let state = BuildState::load_from(&dir.path().join("state.json"));
        assert_eq!(state.last_image_tag, DEFAULT_IMAGE_TAG);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/state.json");
        let state = BuildState {
            last_image_tag: "shop-api:2.1".to_string(),
        };
        state.save_to(&path).unwrap();
        assert_eq!(BuildState::load_from(&path), state);
    }

    #[test]
    fn test_corrupt_file_gives_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(BuildState::load_from(&path), BuildState::default());
    }
}
