pub mod error;
pub mod settings;
pub mod state;

pub use error::*;
pub use settings::{RegistrySettings, Settings, SshSettings};
pub use state::{BuildState, DEFAULT_IMAGE_TAG};

use std::path::{Path, PathBuf};

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_ENV: &str = "HARBORLIFT_CONFIG";

const LOCAL_CANDIDATES: [&str; 2] = ["harborlift.local.yaml", "harborlift.yaml"];
const EXAMPLE_FILE: &str = "harborlift.yaml.example";

/// HarborLiftの設定ディレクトリを取得
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("harborlift");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// ビルド状態ファイルのパス
pub fn state_file_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("state.json"))
}

/// カレントディレクトリを起点に設定ファイルを探す
pub fn find_config_file() -> Result<PathBuf> {
    find_config_file_in(&std::env::current_dir()?)
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 HARBORLIFT_CONFIG (直接パス指定)
/// 2. `dir` 直下: harborlift.local.yaml, harborlift.yaml
/// 3. ~/.config/harborlift/config.yaml (グローバル設定)
/// 4. `dir` 直下の harborlift.yaml.example を harborlift.yaml としてコピー
pub fn find_config_file_in(dir: &Path) -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!("{} points at a missing file: {}", CONFIG_ENV, path.display());
    }

    // 2. 作業ディレクトリ
    for filename in &LOCAL_CANDIDATES {
        let path = dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. グローバル設定
    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("harborlift").join("config.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    // 4. テンプレートから作成
    let example = dir.join(EXAMPLE_FILE);
    if example.exists() {
        let target = dir.join("harborlift.yaml");
        std::fs::copy(&example, &target)?;
        tracing::info!(
            "Created {} from {}",
            target.display(),
            example.display()
        );
        return Ok(target);
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// 設定ファイルを読み込む
pub fn load_settings(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings.normalized())
}

/// 明示パスがあればそれを、無ければ探索して読み込む
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    match explicit {
        Some(path) => load_settings(path),
        None => load_settings(&find_config_file()?),
    }
}
