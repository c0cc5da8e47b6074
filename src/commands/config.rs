use anyhow::Result;
use colored::Colorize;
use cost_estimator::config::Config;
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration (file, environment and flags merged)
pub fn show(cfg: &Config) -> Result<()> {
    info!("Displaying configuration");

    println!("{}", "Current Configuration:".green().bold());
    println!();

    // Serialize to TOML format
    let toml_string = toml::to_string_pretty(cfg)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
///
/// Configuration is validated while loading; reaching this point means it
/// passed
pub fn validate(cfg: &Config, path: &Path) -> Result<()> {
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  {}: {}", "Source".cyan(), source);
    println!("  {}: {}", "Pricing API".cyan(), cfg.api.base_url);
    println!(
        "  {}: {}",
        "Timeout".cyan(),
        cfg.api
            .timeout_seconds
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "none".to_string())
    );
    println!(
        "  {}: {} ({})",
        "Default Region".cyan(),
        cfg.session.default_region.code(),
        cfg.session.default_region.display_name()
    );
    println!(
        "  {}: {}",
        "Extra Priority Attributes".cyan(),
        cfg.estimator.extra_priority_attributes.len()
    );

    info!("Configuration validation successful");
    Ok(())
}
