use harborlift_config::Settings;

pub fn handle(settings: &Settings, input: &str) -> anyhow::Result<()> {
    let rewriter = super::rewriter(&settings.registry);
    println!("{}", rewriter.accelerate_command(input));
    Ok(())
}
