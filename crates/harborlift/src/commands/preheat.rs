use anyhow::Context;
use colored::Colorize;
use harborlift_build::{PreheatReport, PreheatSource, PreheatWorkflow};
use harborlift_config::Settings;
use harborlift_image::ImageReference;
use std::path::Path;

/// 1つのイメージを予熱
pub async fn handle(settings: Settings, input: String) -> anyhow::Result<()> {
    let references = PreheatSource::Freeform(&input)
        .references()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let report = run(settings, references, None).await?;
    print_summary(&report);
    ensure_warmed(&report)
}

/// Dockerfile のベースイメージをすべて予熱
pub async fn handle_file(
    settings: Settings,
    dockerfile: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(dockerfile)
        .with_context(|| format!("Failed to read {}", dockerfile.display()))?;
    let references = PreheatSource::Dockerfile(&content)
        .references()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!(
        "{} {} base image(s) in {}",
        "Found".green(),
        references.len(),
        dockerfile.display().to_string().cyan()
    );

    let report = run(settings, references, Some(content)).await?;
    print_summary(&report);
    ensure_warmed(&report)?;

    if let Some(document) = &report.rewritten_document {
        match output {
            Some(path) => {
                std::fs::write(path, document)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "{} {}",
                    "Rewritten Dockerfile written to".green(),
                    path.display().to_string().cyan()
                );
            }
            None => {
                println!();
                println!("{}", "Rewritten Dockerfile:".bold());
                println!("{}", document);
            }
        }
    }
    if let Some(command) = &report.build_command {
        println!();
        println!("{}", "One-shot build command:".bold());
        println!("{}", command);
    }

    Ok(())
}

async fn run(
    settings: Settings,
    references: Vec<ImageReference>,
    document: Option<String>,
) -> anyhow::Result<PreheatReport> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<PreheatReport> {
        let mut session = super::connect(&settings)?;
        let workflow = PreheatWorkflow::new(super::rewriter(&settings.registry));
        let report = workflow.run(&mut session, &references, document.as_deref());
        session.close();
        Ok(report)
    })
    .await
    .context("Preheat worker stopped unexpectedly")?
}

fn print_summary(report: &PreheatReport) {
    println!();
    for item in &report.items {
        if item.warmed {
            println!("  {} {} -> {}", "✓".green(), item.reference, item.target.cyan());
        } else {
            println!("  {} {} -> {}", "✗".red(), item.reference, item.target);
        }
    }
}

fn ensure_warmed(report: &PreheatReport) -> anyhow::Result<()> {
    if !report.all_warmed {
        anyhow::bail!(
            "Preheat incomplete: {}/{} image(s) warmed",
            report.warmed_count(),
            report.items.len()
        );
    }
    println!("{}", "✓ All images are warm in the mirror".green().bold());
    Ok(())
}

