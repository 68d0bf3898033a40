pub mod build;
pub mod convert;
pub mod download;
pub mod preheat;
pub mod rewrite;

use crate::output;
use anyhow::Context;
use harborlift_config::{ConfigError, RegistrySettings, Settings};
use harborlift_image::{Registries, Rewriter};
use harborlift_remote::RemoteSession;

/// 設定エラーをユーザー向けのメッセージに変換
pub fn config_error(err: ConfigError) -> anyhow::Error {
    match err {
        ConfigError::ConfigFileNotFound => anyhow::anyhow!(
            "No configuration file found.\n\
             Create harborlift.yaml (see harborlift.yaml.example), \
             or point {} at one.",
            harborlift_config::CONFIG_ENV
        ),
        other => other.into(),
    }
}

pub fn rewriter(registry: &RegistrySettings) -> Rewriter {
    Rewriter::new(Registries::new(
        registry.cache_registry.clone(),
        registry.private_registry.clone(),
    ))
}

/// ビルドホストに接続したセッションを返す
pub fn connect(settings: &Settings) -> anyhow::Result<RemoteSession> {
    let mut session = RemoteSession::new(settings.ssh.clone(), output::console_sink());
    session
        .connect()
        .with_context(|| format!("Failed to connect to {}", settings.ssh.target()))?;
    Ok(session)
}
