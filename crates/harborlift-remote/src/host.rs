//! ワークフローがビルドホストに求める操作

use crate::error::Result;
use crate::transfer::ProgressFn;
use std::path::Path;

/// コマンドを実行できなかった場合の終了ステータス。リモートの終了コードとは重ならない
pub const EXIT_FAILURE_SENTINEL: i32 = -1;

/// コマンドを1つずつ実行するビルドホスト
pub trait RemoteHost {
    /// ユーザー向けのログを1行出力
    fn log(&mut self, line: &str);

    /// `command` を完了まで実行して終了ステータスを返す。
    /// 実行できなかった場合は [`EXIT_FAILURE_SENTINEL`]。
    fn run(&mut self, command: &str) -> i32 {
        self.run_with_stdin(command, &[])
    }

    /// `stdin` をリモートプロセスの標準入力に渡して実行する。
    /// パスワードなどの秘密情報はコマンド文字列に含めず、こちらで渡す。
    fn run_with_stdin(&mut self, command: &str, stdin: &[u8]) -> i32;

    fn upload(
        &mut self,
        local: &Path,
        remote: &str,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()>;

    fn download(
        &mut self,
        remote: &str,
        local: &Path,
        on_progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<()>;
}
