mod cli;
mod commands;
mod host;
mod messaging;
mod settings;

use clap::Parser;

use crate::cli::AssistCli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = AssistCli::parse();
    let config = settings::load_config(cli.config.as_deref())?;
    assist_logging::initialize(&config.logging);
    commands::run(cli.command, config).await
}
