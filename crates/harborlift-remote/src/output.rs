//! リモートコマンドの出力をログへ流す

use crate::host::EXIT_FAILURE_SENTINEL;
use crate::log::LogSink;
use std::io::{self, BufRead, BufReader, Read};

/// stdout を届いた順に1行ずつ `logger` へ流し、その後 stderr 全体を
/// `Remote stderr:` で始まる1つのブロックとして出力する
///
/// 行末の空白と `\r` は取り除き、UTF-8 として不正なバイトは置換文字にします。
pub fn forward_output<O, E>(stdout: O, mut stderr: E, logger: &mut LogSink) -> io::Result<()>
where
    O: Read,
    E: Read,
{
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    while reader.read_until(b'\n', &mut buf)? > 0 {
        logger.emit(String::from_utf8_lossy(&buf).trim_end());
        buf.clear();
    }

    let mut raw = Vec::new();
    stderr.read_to_end(&mut raw)?;
    let text = String::from_utf8_lossy(&raw);
    let text = text.trim();
    if !text.is_empty() {
        logger.emit(&format!("Remote stderr: {}", text));
    }

    Ok(())
}

/// シグナルで終了したプロセスの終了ステータス（シェルと同じ `128 + n`）
///
/// SSH の `exit-signal` は `SIG` を除いた名前で届きます。
/// 番号の分からないシグナルは [`EXIT_FAILURE_SENTINEL`]。
pub fn signal_exit_status(signal: &str) -> i32 {
    let number = match signal.trim_start_matches("SIG") {
        "HUP" => 1,
        "INT" => 2,
        "QUIT" => 3,
        "ILL" => 4,
        "ABRT" => 6,
        "FPE" => 8,
        "KILL" => 9,
        "SEGV" => 11,
        "PIPE" => 13,
        "ALRM" => 14,
        "TERM" => 15,
        _ => return EXIT_FAILURE_SENTINEL,
    };
    128 + number
}
