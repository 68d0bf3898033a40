//! コンソール出力（色付きのログ出力と転送の進捗バー）

use colored::Colorize;
use harborlift_remote::{LogSink, percent};
use indicatif::{ProgressBar, ProgressStyle};

/// ワークフローのログを標準出力へ表示する
pub fn console_sink() -> LogSink {
    LogSink::new(|line| println!("{}", colorize(line)))
}

fn colorize(line: &str) -> String {
    if line.starts_with("!!!") {
        line.red().bold().to_string()
    } else if line.starts_with("---") {
        line.cyan().bold().to_string()
    } else if line.starts_with("-->") {
        line.blue().to_string()
    } else if line.starts_with("Remote stderr:") || line.contains("failed") {
        line.yellow().to_string()
    } else {
        line.to_string()
    }
}

/// 転送の進捗バー（バイト単位）
pub struct TransferProgress {
    progress_bar: ProgressBar,
}

impl TransferProgress {
    pub fn new(label: &str) -> Self {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(label.to_string());

        Self { progress_bar: pb }
    }

    /// `(moved, total)` コールバックから呼ぶ
    pub fn update(&self, moved: u64, total: u64) {
        if self.progress_bar.length() != Some(total) {
            self.progress_bar.set_length(total);
        }
        self.progress_bar.set_position(moved);
        tracing::trace!("transfer {:.1}%", percent(moved, total));
    }

    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_keeps_text() {
        colored::control::set_override(false);
        assert_eq!(colorize("--> Packing"), "--> Packing");
        assert_eq!(colorize("!!! Preflight failed"), "!!! Preflight failed");
    }

    #[test]
    fn test_progress_tracks_total() {
        let progress = TransferProgress::new("upload");
        progress.update(512, 2048);
        assert_eq!(progress.progress_bar.length(), Some(2048));
        assert_eq!(progress.progress_bar.position(), 512);
        progress.finish();
    }
}
