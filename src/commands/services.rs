use anyhow::Result;
use colored::Colorize;
use cost_estimator::client::{HttpPricingClient, PricingApi};
use cost_estimator::config::Config;
use tracing::info;

/// Execute the services command
///
/// Prints every service code the pricing API knows about
pub async fn execute(cfg: &Config) -> Result<()> {
    let client = HttpPricingClient::new(&cfg.api)?;
    info!(base_url = %client.base_url(), "Fetching service list");

    let services = client.list_services().await?;
    if services.is_empty() {
        println!("{}", "The pricing API returned no services".yellow());
        return Ok(());
    }

    for service in &services {
        println!("{}", service);
    }
    println!();
    println!("{} {}", services.len().to_string().bold(), "services".dimmed());
    Ok(())
}
