//! 進捗付きのチャンク単位 SFTP 転送
//!
//! 転送は全体として成功するか失敗するかのどちらかです。途中まで書かれた
//! ファイルはそのまま残り、再開や一時ファイルからのリネームは行いません。

use crate::error::{RemoteError, Result};
use ssh2::Sftp;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

/// SFTP 呼び出し1回あたり 2 MiB
pub const DEFAULT_CHUNK_SIZE: usize = 2 * 1024 * 1024;

/// 進捗コールバック: `(転送済みバイト数, 総バイト数)`
pub type ProgressFn<'a> = dyn FnMut(u64, u64) + 'a;

/// 表示用のパーセンテージ（総量が不明または0なら0）
pub fn percent(moved: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        moved as f64 / total as f64 * 100.0
    }
}

/// `reader` から `writer` へ `chunk_size` ずつコピーし、
/// チャンクを書き込むたびに `on_progress` を呼ぶ
pub fn copy_chunked<R, W>(
    reader: &mut R,
    writer: &mut W,
    total: u64,
    chunk_size: usize,
    mut on_progress: Option<&mut ProgressFn<'_>>,
) -> io::Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut moved = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..n])?;
        moved += n as u64;
        if let Some(cb) = on_progress.as_mut() {
            cb(moved, total);
        }
    }

    writer.flush()?;
    Ok(moved)
}

/// `remote` を `local` へダウンロード（総量はリモートの stat から取得）
pub fn download(
    sftp: &Sftp,
    remote: &str,
    local: &Path,
    chunk_size: usize,
    on_progress: Option<&mut ProgressFn<'_>>,
) -> Result<u64> {
    let remote_path = Path::new(remote);
    let err = |source: io::Error| RemoteError::Transfer {
        path: remote.to_string(),
        source,
    };

    let total = sftp
        .stat(remote_path)
        .map_err(|e| err(e.into()))?
        .size
        .unwrap_or(0);
    let mut src = sftp.open(remote_path).map_err(|e| err(e.into()))?;
    let mut dst = File::create(local).map_err(err)?;

    tracing::debug!("Downloading {} ({} bytes) to {}", remote, total, local.display());
    copy_chunked(&mut src, &mut dst, total, chunk_size, on_progress).map_err(err)
}

/// `local` を `remote` へアップロード（総量はローカルのファイルサイズ）
pub fn upload(
    sftp: &Sftp,
    local: &Path,
    remote: &str,
    chunk_size: usize,
    on_progress: Option<&mut ProgressFn<'_>>,
) -> Result<u64> {
    let err = |source: io::Error| RemoteError::Transfer {
        path: local.display().to_string(),
        source,
    };

    let total = fs::metadata(local).map_err(err)?.len();
    let mut src = File::open(local).map_err(err)?;
    let mut dst = sftp.create(Path::new(remote)).map_err(|e| err(e.into()))?;

    tracing::debug!("Uploading {} ({} bytes) to {}", local.display(), total, remote);
    copy_chunked(&mut src, &mut dst, total, chunk_size, on_progress).map_err(err)
}
