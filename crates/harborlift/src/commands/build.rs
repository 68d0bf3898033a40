use crate::output::TransferProgress;
use anyhow::Context;
use colored::Colorize;
use harborlift_build::{BuildOrchestrator, BuildOutcome};
use harborlift_config::{BuildState, Settings};
use harborlift_image::pull_command;
use std::path::PathBuf;

/// リモートでビルドして push
pub async fn handle(
    settings: Settings,
    project_dir: PathBuf,
    tag: Option<String>,
) -> anyhow::Result<()> {
    let state_path = harborlift_config::state_file_path()?;
    let tag = match tag {
        Some(tag) => tag,
        None => {
            let state = BuildState::load_from(&state_path);
            println!(
                "{} {}",
                "No --tag given, using the last tag:".yellow(),
                state.last_image_tag.cyan()
            );
            state.last_image_tag
        }
    };

    let image_tag = tag.clone();
    let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<BuildOutcome> {
        let mut session = super::connect(&settings)?;
        let progress = TransferProgress::new("upload");
        let mut on_progress = |moved: u64, total: u64| progress.update(moved, total);

        let orchestrator = BuildOrchestrator::new(settings.registry.clone());
        let outcome = orchestrator.run(
            &mut session,
            &project_dir,
            &image_tag,
            Some(&mut on_progress),
        );

        progress.finish();
        session.close();
        Ok(outcome)
    })
    .await
    .context("Build worker stopped unexpectedly")??;

    if let Some(step) = outcome.failed_step {
        anyhow::bail!(
            "Build of {} failed at the {} step (job {})",
            outcome.image,
            step,
            outcome.job_id
        );
    }

    let state = BuildState {
        last_image_tag: tag,
    };
    if let Err(e) = state.save_to(&state_path) {
        tracing::warn!("Failed to save build state: {}", e);
    }

    println!();
    println!("{}", "✓ Image built and pushed".green().bold());
    println!("Pull it anywhere with:");
    println!("  {}", pull_command(&outcome.image).cyan());
    Ok(())
}
