use crate::output::TransferProgress;
use anyhow::Context;
use colored::Colorize;
use harborlift_config::Settings;
use harborlift_remote::RemoteHost;
use std::path::PathBuf;

/// リモートのファイルを取得
pub async fn handle(settings: Settings, remote: String, local: PathBuf) -> anyhow::Result<()> {
    let destination = local.clone();
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let mut session = super::connect(&settings)?;
        let progress = TransferProgress::new("download");
        let mut on_progress = |moved: u64, total: u64| progress.update(moved, total);

        let result = session.download(&remote, &local, Some(&mut on_progress));
        progress.finish();
        session.close();
        result.with_context(|| format!("Failed to download {}", remote))
    })
    .await
    .context("Download worker stopped unexpectedly")??;

    println!(
        "{} {}",
        "✓ Saved to".green(),
        destination.display().to_string().cyan()
    );
    Ok(())
}
