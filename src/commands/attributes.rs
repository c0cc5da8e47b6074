use anyhow::Result;
use colored::Colorize;
use cost_estimator::catalog::PriorityAttributes;
use cost_estimator::client::{HttpPricingClient, PricingApi};
use cost_estimator::config::Config;
use cost_estimator::editor::fetch_configuration;
use cost_estimator::state::AttributeInput;
use tracing::info;

/// Execute the attributes command
///
/// Shows the priority attributes of a service with their allowed values,
/// or every attribute name with `--all`
pub async fn execute(cfg: &Config, service: &str, all: bool) -> Result<()> {
    let client = HttpPricingClient::new(&cfg.api)?;
    info!(service = service, all = all, "Fetching attributes");

    if all {
        let attributes = client.list_attributes(service).await?;
        for attribute in &attributes {
            println!("{}", attribute);
        }
        println!();
        println!("{} {}", attributes.len().to_string().bold(), "attributes".dimmed());
        return Ok(());
    }

    let priorities =
        PriorityAttributes::with_extra(cfg.estimator.extra_priority_attributes.iter().cloned());
    let configuration = fetch_configuration(&client, &priorities, service).await?;

    println!(
        "{} ({} of {} attributes)",
        service.bold(),
        configuration.attributes.len(),
        configuration.all_attributes.len()
    );
    if configuration.attributes.is_empty() {
        println!("  {}", "No priority attributes; use --all to list every attribute".dimmed());
    }

    for attribute in &configuration.attributes {
        println!("  {}", attribute.cyan());
        match configuration.value_options.get(attribute) {
            Some(AttributeInput::Choices(values)) => {
                for value in values {
                    println!("    {}", value);
                }
            }
            _ => println!("    {}", "(free text)".dimmed()),
        }
    }
    Ok(())
}
