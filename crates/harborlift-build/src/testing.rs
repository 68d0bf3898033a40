//! ワークフローのテスト用のインメモリなビルドホスト

use harborlift_remote::{ProgressFn, RemoteError, RemoteHost, Result};
use std::path::Path;

/// 実行したコマンドを記録し、指定した終了ステータスを返す
#[derive(Debug, Default)]
pub struct ScriptedHost {
    pub commands: Vec<String>,
    /// コマンドごとの標準入力
    pub inputs: Vec<Vec<u8>>,
    pub logs: Vec<String>,
    pub uploads: Vec<(String, u64)>,
    failures: Vec<(String, i32)>,
    fail_upload: bool,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pattern` を含むコマンドは `status` で終了する
    pub fn fail_on(mut self, pattern: &str, status: i32) -> Self {
        self.failures.push((pattern.to_string(), status));
        self
    }

    pub fn fail_upload(mut self) -> Self {
        self.fail_upload = true;
        self
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.commands.iter().filter(|c| c.contains(pattern)).count()
    }

    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.commands.iter().position(|c| c.contains(pattern))
    }
}

impl RemoteHost for ScriptedHost {
    fn log(&mut self, line: &str) {
        self.logs.push(line.to_string());
    }

    fn run_with_stdin(&mut self, command: &str, stdin: &[u8]) -> i32 {
        self.commands.push(command.to_string());
        self.inputs.push(stdin.to_vec());
        self.failures
            .iter()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, status)| *status)
            .unwrap_or(0)
    }

    fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()> {
        if self.fail_upload {
            return Err(RemoteError::Transfer {
                path: local.display().to_string(),
                source: std::io::Error::other("connection reset"),
            });
        }
        let size = std::fs::metadata(local)?.len();
        if let Some(cb) = on_progress {
            cb(size, size);
        }
        self.uploads.push((remote.to_string(), size));
        Ok(())
    }

    fn download(
        &mut self,
        _remote: &str,
        local: &Path,
        _on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()> {
        std::fs::write(local, b"")?;
        Ok(())
    }
}
