//! Plan files
//!
//! A plan describes a whole session in TOML so an estimate can be produced
//! without the interactive shell.

use crate::catalog::LOCATION_ATTRIBUTE;
use crate::client::PricingApi;
use crate::editor::{Editor, Outcome};
use crate::error::EstimatorError;
use crate::region::Region;
use crate::state::LineItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Plan {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub resources: Vec<PlannedResource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlannedResource {
    pub service: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub selections: BTreeMap<String, String>,
}

fn default_quantity() -> u32 {
    1
}

/// Problem found while applying a plan to an editor
#[derive(Debug, Clone, PartialEq)]
pub enum PlanIssue {
    /// The service could not be configured
    Configuration { index: usize, outcome: Outcome },
    /// Selection names an attribute the service does not have
    UnknownAttribute { index: usize, attribute: String },
    /// `location` was given explicitly; it always follows the region
    LocationIgnored { index: usize },
}

impl std::fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration { index, outcome } => match outcome {
                Outcome::Failed(failure) => write!(f, "resource #{}: {}", index + 1, failure),
                other => write!(f, "resource #{}: not configured ({:?})", index + 1, other),
            },
            Self::UnknownAttribute { index, attribute } => {
                write!(f, "resource #{}: unknown attribute '{}'", index + 1, attribute)
            }
            Self::LocationIgnored { index } => write!(
                f,
                "resource #{}: location is set from the region, selection ignored",
                index + 1
            ),
        }
    }
}

impl Plan {
    pub fn parse(content: &str) -> Result<Self, EstimatorError> {
        let plan: Plan = toml::from_str(content)
            .map_err(|e| EstimatorError::Plan(format!("Failed to parse plan: {}", e)))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self, EstimatorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EstimatorError::Plan(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    fn validate(&self) -> Result<(), EstimatorError> {
        for (index, resource) in self.resources.iter().enumerate() {
            if resource.service.trim().is_empty() {
                return Err(EstimatorError::Plan(format!(
                    "resource #{} has an empty service",
                    index + 1
                )));
            }
            if resource.quantity == 0 {
                return Err(EstimatorError::Plan(format!(
                    "resource #{} must have a positive quantity",
                    index + 1
                )));
            }
        }
        Ok(())
    }

    /// Build line items in `editor` for every planned resource.
    ///
    /// Resources that cannot be configured stay in the list unconfigured so
    /// the summary shows them; the issues are returned for reporting.
    pub async fn apply<P: PricingApi>(
        &self,
        editor: &mut Editor<P>,
    ) -> (Vec<LineItemId>, Vec<PlanIssue>) {
        if let Some(account_id) = &self.account_id {
            editor.set_account(account_id.clone());
        }
        if let Some(region) = self.region {
            editor.set_region(region);
        }

        let mut ids = Vec::with_capacity(self.resources.len());
        let mut issues = Vec::new();

        for (index, resource) in self.resources.iter().enumerate() {
            let id = editor.add_item();
            ids.push(id);
            editor.set_quantity(id, resource.quantity);

            let outcome = editor.select_service(id, &resource.service).await;
            if !outcome.is_applied() {
                warn!(service = %resource.service, "Planned resource could not be configured");
                issues.push(PlanIssue::Configuration { index, outcome });
                continue;
            }

            for (attribute, value) in &resource.selections {
                if attribute == LOCATION_ATTRIBUTE {
                    issues.push(PlanIssue::LocationIgnored { index });
                } else if !editor.update_selection(id, attribute, value) {
                    issues.push(PlanIssue::UnknownAttribute {
                        index,
                        attribute: attribute.clone(),
                    });
                }
            }
        }

        info!(resources = ids.len(), issues = issues.len(), "Plan applied");
        (ids, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan() {
        let plan = Plan::parse(
            r#"
account_id = "123456789012"
region = "eu-central-1"

[[resources]]
service = "AmazonEC2"
quantity = 2
[resources.selections]
instanceType = "t3.medium"
operatingSystem = "Linux"

[[resources]]
service = "AmazonS3"
"#,
        )
        .unwrap();

        assert_eq!(plan.account_id.as_deref(), Some("123456789012"));
        assert_eq!(plan.region, Some(Region::EuCentral1));
        assert_eq!(plan.resources.len(), 2);
        assert_eq!(plan.resources[0].quantity, 2);
        assert_eq!(plan.resources[0].selections["instanceType"], "t3.medium");
        assert_eq!(plan.resources[1].quantity, 1);
        assert!(plan.resources[1].selections.is_empty());
    }

    #[test]
    fn test_parse_rejects_zero_quantity() {
        let err = Plan::parse("[[resources]]\nservice = \"AmazonEC2\"\nquantity = 0\n").unwrap_err();
        assert!(err.to_string().contains("positive quantity"));
    }

    #[test]
    fn test_parse_rejects_empty_service() {
        assert!(Plan::parse("[[resources]]\nservice = \" \"\n").is_err());
    }

    #[test]
    fn test_parse_rejects_unknown_region() {
        let err = Plan::parse("region = \"mars-north-1\"\n").unwrap_err();
        assert!(matches!(err, EstimatorError::Plan(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Plan::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_issue_display() {
        let issue = PlanIssue::UnknownAttribute {
            index: 0,
            attribute: "color".to_string(),
        };
        assert_eq!(issue.to_string(), "resource #1: unknown attribute 'color'");

        let issue = PlanIssue::LocationIgnored { index: 2 };
        assert!(issue.to_string().starts_with("resource #3: location"));
    }
}
