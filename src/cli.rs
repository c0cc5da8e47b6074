use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cost-estimator", version, about = "Self-service cloud cost estimator")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "cost-estimator.toml", global = true)]
    pub config: PathBuf,

    /// Pricing API base URL (overrides the configuration file)
    #[arg(long, global = true, env = "COST_ESTIMATOR_BASE_URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Interactive resource list editor (default)
    Shell {
        /// Region to price in
        #[arg(short, long)]
        region: Option<String>,

        /// Account ID shown in the summary
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Estimate the resources described in a plan file
    Estimate {
        /// Plan file (TOML)
        #[arg(short, long)]
        plan: PathBuf,

        /// Region to price in (overrides the plan)
        #[arg(short, long)]
        region: Option<String>,

        /// Account ID shown in the summary (overrides the plan)
        #[arg(short, long)]
        account: Option<String>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the services offered by the pricing API
    Services,

    /// Show the configuration attributes of a service
    Attributes {
        /// Service code, e.g. AmazonEC2
        service: String,

        /// List every attribute instead of the priority ones
        #[arg(short, long)]
        all: bool,
    },

    /// List supported regions
    Regions,

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,

    /// Validate configuration file
    Validate,
}

impl Cli {
    /// Get the command to execute, defaulting to Shell if none provided
    pub fn get_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Shell {
            region: None,
            account: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_shell() {
        let cli = Cli {
            config: PathBuf::from("cost-estimator.toml"),
            base_url: None,
            command: None,
        };

        match cli.get_command() {
            Commands::Shell { region, account } => {
                assert!(region.is_none());
                assert!(account.is_none());
            }
            _ => panic!("Expected Shell command"),
        }
    }

    #[test]
    fn test_cli_parsing_estimate() {
        let args = vec![
            "cost-estimator",
            "estimate",
            "--plan",
            "plan.toml",
            "--region",
            "eu-central-1",
            "--json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Estimate {
                plan, region, json, ..
            } => {
                assert_eq!(plan, PathBuf::from("plan.toml"));
                assert_eq!(region.as_deref(), Some("eu-central-1"));
                assert!(json);
            }
            _ => panic!("Expected Estimate command"),
        }
    }

    #[test]
    fn test_cli_parsing_attributes_all() {
        let args = vec!["cost-estimator", "attributes", "AmazonEC2", "--all"];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.get_command() {
            Commands::Attributes { service, all } => {
                assert_eq!(service, "AmazonEC2");
                assert!(all);
            }
            _ => panic!("Expected Attributes command"),
        }
    }

    #[test]
    fn test_cli_parsing_global_base_url() {
        let args = vec!["cost-estimator", "services", "--base-url", "http://pricing:9000"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://pricing:9000"));
        assert!(matches!(cli.get_command(), Commands::Services));
    }

    #[test]
    fn test_estimate_requires_plan() {
        let args = vec!["cost-estimator", "estimate"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
