use anyhow::Context;
use harborlift_config::Settings;
use std::path::Path;

pub fn handle(settings: &Settings, dockerfile: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(dockerfile)
        .with_context(|| format!("Failed to read {}", dockerfile.display()))?;

    let rewriter = super::rewriter(&settings.registry);
    print!("{}", rewriter.rewrite_dockerfile(&content));
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}
