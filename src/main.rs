use clap::Parser;

use flagstone::cli::{Cli, execute_command, load_config};
use flagstone::logger::init_logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, environment) = load_config(&cli)?;
    init_logger(&settings.logger, cli.verbose)?;
    tracing::debug!(
        environment = %environment,
        application = %settings.application.name,
        "Configuration loaded"
    );

    let report = execute_command(&cli, settings, environment).await?;
    if !report.is_empty() {
        println!("{}", report);
    }

    Ok(())
}
