//! HarborLift リモートホスト操作
//!
//! 論理的な操作1つにつき SSH セッションを1つ使います。セッションはリモートコマンドを
//! 1つずつ実行して出力を [`LogSink`] へ流し、SFTP で固定サイズのチャンクごとに
//! 進捗を通知しながらファイルを転送します。
//!
//! ワークフロー側は [`RemoteSession`] ではなく [`RemoteHost`] トレイトに依存します。

pub mod error;
pub mod host;
pub mod log;
pub mod output;
pub mod session;
pub mod transfer;

pub use error::{RemoteError, Result};
pub use host::{EXIT_FAILURE_SENTINEL, RemoteHost};
pub use log::LogSink;
pub use output::{forward_output, signal_exit_status};
pub use session::{RemoteSession, SessionState};
pub use transfer::{DEFAULT_CHUNK_SIZE, ProgressFn, percent};
