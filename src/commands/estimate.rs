use super::build_editor;
use anyhow::Result;
use colored::Colorize;
use cost_estimator::config::Config;
use cost_estimator::editor::EstimateReport;
use cost_estimator::plan::Plan;
use cost_estimator::region::Region;
use cost_estimator::render;
use std::path::Path;
use tracing::info;

/// Execute the estimate command
///
/// Builds a session from a plan file, configures every resource against the
/// pricing API, recomputes all estimates and prints the summary. Exits with
/// an error when any estimate failed.
pub async fn execute(
    cfg: &Config,
    plan_path: &Path,
    region: Option<String>,
    account: Option<String>,
    json: bool,
) -> Result<()> {
    info!(plan = %plan_path.display(), "Loading plan");
    let mut plan = Plan::load(plan_path)?;

    // Command-line flags win over the plan
    if let Some(code) = region {
        plan.region = Some(code.parse::<Region>()?);
    }
    if let Some(account_id) = account {
        plan.account_id = Some(account_id);
    }

    let mut editor = build_editor(cfg, None, None)?;
    let (_, issues) = plan.apply(&mut editor).await;

    let report = editor.recompute_estimates().await;

    for issue in &issues {
        eprintln!("{} {}", "warning:".yellow().bold(), issue);
    }

    if json {
        let summary = render::summary_json(editor.session(), &issues);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        if !issues.is_empty() {
            eprintln!();
        }
        print!("{}", render::summary(editor.session()));
    }

    ensure_all_estimated(&report)
}

/// Fail when any estimate request failed so scripts can check the exit code
fn ensure_all_estimated(report: &EstimateReport) -> Result<()> {
    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{} of {} estimates failed", failed, report.results.len());
    }
    Ok(())
}
