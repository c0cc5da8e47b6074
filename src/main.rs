use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cost_estimator::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    let mut cfg = config::load_config(&args.config)?;
    if let Some(base_url) = &args.base_url {
        cfg.api.base_url = base_url.clone();
        config::validate_config(&cfg)?;
    }

    init_tracing(&cfg.logging.level, cfg.logging.format == "json");

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Shell { region, account } => {
            commands::shell::execute(&cfg, region, account).await?;
        }
        cli::Commands::Estimate {
            plan,
            region,
            account,
            json,
        } => {
            commands::estimate::execute(&cfg, &plan, region, account, json).await?;
        }
        cli::Commands::Services => {
            commands::services::execute(&cfg).await?;
        }
        cli::Commands::Attributes { service, all } => {
            commands::attributes::execute(&cfg, &service, all).await?;
        }
        cli::Commands::Regions => {
            commands::regions::execute();
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&cfg)?,
            cli::ConfigCommands::Validate => commands::config::validate(&cfg, &args.config)?,
        },
        cli::Commands::Version => {
            println!("Cost Estimator v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
