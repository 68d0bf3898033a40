//! HarborLift リモートワークフロー
//!
//! - [`BuildOrchestrator`]: プロジェクトを固めてリモートでビルドし、
//!   プライベートレジストリへ push する
//! - [`PreheatWorkflow`]: キャッシュミラー経由で pull してミラーを温める
//!
//! どちらも任意の [`harborlift_remote::RemoteHost`] 上で動きます。
//! セッションの接続と切断は呼び出し側の責務です。

pub mod commands;
pub mod error;
pub mod job;
pub mod orchestrator;
pub mod packer;
pub mod preheat;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{BuildError, Result};
pub use job::{BuildJob, DEFAULT_SCRATCH_ROOT, JobWorkspace};
pub use orchestrator::{BuildOrchestrator, BuildOutcome, BuildStep};
pub use preheat::{PreheatItem, PreheatReport, PreheatSource, PreheatWorkflow};
