//! Command implementations for the CLI
//!
//! This module contains the implementation of all CLI commands:
//! - shell: Interactive resource list editor
//! - estimate: Estimate a plan file
//! - services: List services offered by the pricing API
//! - attributes: Show a service's configuration attributes
//! - regions: List supported regions
//! - config: Configuration display and validation

pub mod attributes;
pub mod config;
pub mod estimate;
pub mod regions;
pub mod services;
pub mod shell;

use anyhow::Result;
use cost_estimator::catalog::PriorityAttributes;
use cost_estimator::client::HttpPricingClient;
use cost_estimator::config::Config;
use cost_estimator::editor::Editor;
use cost_estimator::region::Region;
use cost_estimator::state::{Action, Session};

/// Build an editor from configuration, applying command-line overrides
pub fn build_editor(
    cfg: &Config,
    region: Option<&str>,
    account: Option<&str>,
) -> Result<Editor<HttpPricingClient>> {
    let region = match region {
        Some(code) => code.parse::<Region>()?,
        None => cfg.session.default_region,
    };

    let mut session = Session::new(region);
    if let Some(account_id) = account.or(cfg.session.account_id.as_deref()) {
        session.apply(Action::SetAccount(account_id.to_string()));
    }

    let client = HttpPricingClient::new(&cfg.api)?;
    let priorities =
        PriorityAttributes::with_extra(cfg.estimator.extra_priority_attributes.iter().cloned());

    Ok(Editor::new(client, session).with_priorities(priorities))
}
