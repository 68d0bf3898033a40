//! 設定ファイルの構造
//!
//! ```yaml
//! registry:
//!   private_registry: registry.example.com
//!   cache_registry: cache.example.com
//!   username: builder
//!   password: secret
//! ssh:
//!   host: build.example.com
//!   port: 22
//!   user: deploy
//!   key_path: ~/.ssh/id_ed25519
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// HarborLift 全体の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub ssh: SshSettings,
}

/// レジストリ関連の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// ビルドしたイメージの公開先
    pub private_registry: String,
    /// pull-through キャッシュとして動くミラー
    pub cache_registry: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl RegistrySettings {
    /// ユーザー名とパスワードが両方そろっている場合のみ返す
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// ビルドホストへの SSH 接続設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshSettings {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub key_path: PathBuf,
    #[serde(default)]
    pub key_passphrase: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_command_timeout() -> u64 {
    3600
}

impl SshSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// `user@host:port`
    pub fn target(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

impl Settings {
    /// 空文字の任意項目を未設定として扱い、`~/` をホームディレクトリに展開する
    pub fn normalized(mut self) -> Self {
        self.registry.username = non_empty(self.registry.username);
        self.registry.password = non_empty(self.registry.password);
        self.ssh.key_passphrase = non_empty(self.ssh.key_passphrase);
        self.ssh.key_path = expand_home(self.ssh.key_path);
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn expand_home(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or(path),
        Err(_) => path,
    }
}
