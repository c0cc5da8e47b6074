//! Terminal rendering of a session

use crate::plan::PlanIssue;
use crate::state::{AttributeInput, LineItem, Phase, Session};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

pub const DISCLAIMER: &str =
    "Approximate amount only: enterprise discounts are not applied, actual price may vary.";

pub fn format_cost(cost: f64) -> String {
    format!("${:.2}", cost)
}

fn phase_cell(item: &LineItem) -> Cell {
    if item.last_failure.is_some() {
        return Cell::new("failed").fg(Color::Red);
    }
    match item.phase() {
        Phase::Empty => Cell::new("new").fg(Color::DarkGrey),
        Phase::Loading => Cell::new("loading").fg(Color::Yellow),
        Phase::Configured => Cell::new("configured").fg(Color::Cyan),
        Phase::Estimated => Cell::new("estimated").fg(Color::Green),
    }
}

fn service_label(item: &LineItem) -> String {
    match (&item.service, &item.pending_service) {
        (_, Some(pending)) => format!("{} …", pending),
        (Some(service), None) => service.clone(),
        (None, None) => "New resource".to_string(),
    }
}

fn selections_label(item: &LineItem) -> String {
    item.selections
        .iter()
        .filter(|(k, _)| k.as_str() != crate::catalog::LOCATION_ATTRIBUTE)
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Line items table with the running total as last row
pub fn summary_table(session: &Session) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Service", "Configuration", "Qty", "Status", "Monthly"]);

    for (index, item) in session.items.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(service_label(item)),
            Cell::new(selections_label(item)),
            Cell::new(item.quantity).set_alignment(CellAlignment::Right),
            phase_cell(item),
            Cell::new(format_cost(item.estimated_cost)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.add_row(vec![
        Cell::new(""),
        Cell::new("Estimated total").fg(Color::White),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{}/mo", format_cost(session.total())))
            .fg(Color::Green)
            .set_alignment(CellAlignment::Right),
    ]);

    table
}

/// Full cost summary: header, items table, failures and disclaimer
pub fn summary(session: &Session) -> String {
    let mut out = String::new();
    let account = if session.account_id.is_empty() {
        "not set".dimmed().to_string()
    } else {
        session.account_id.clone()
    };

    let _ = writeln!(out, "{}", "Cost Summary".bold());
    let _ = writeln!(out, "  {}: {}", "Account ID".cyan(), account);
    let _ = writeln!(
        out,
        "  {}: {} ({})",
        "Region".cyan(),
        session.region.display_name(),
        session.region.code()
    );
    let _ = writeln!(out);

    if session.items.is_empty() {
        let _ = writeln!(out, "  {}", "Add a resource to start".dimmed());
    } else {
        let _ = writeln!(out, "{}", summary_table(session));
    }

    let failures: Vec<_> = session
        .items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item.last_failure.as_ref().map(|f| (i, f)))
        .collect();
    if !failures.is_empty() {
        let _ = writeln!(out);
        for (index, failure) in failures {
            let _ = writeln!(out, "  {} #{}: {}", "✗".red(), index + 1, failure);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} {}",
        "Estimated Total:".bold(),
        format!("{}/mo", format_cost(session.total())).green().bold()
    );
    let _ = writeln!(out, "{}", DISCLAIMER.dimmed());
    out
}

/// Attribute-level view of one line item
pub fn item_detail(item: &LineItem) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) x{}  {}",
        service_label(item).bold(),
        item.id.short(),
        item.quantity,
        format_cost(item.estimated_cost)
    );

    if let Some(unit_price) = item.unit_price {
        let unit = item.unit_type.as_deref().unwrap_or("unit");
        let _ = writeln!(out, "  unit price: ${} per {}", unit_price, unit);
    }

    let attributes = item.visible_attributes();
    if attributes.is_empty() {
        let _ = writeln!(out, "  {}", "Select a service to see options...".dimmed());
    }

    for attribute in attributes {
        let selected = item
            .selections
            .get(attribute)
            .map(|v| v.green().to_string())
            .unwrap_or_else(|| "-".dimmed().to_string());
        let options = match item.value_options.get(attribute) {
            Some(AttributeInput::Choices(values)) => {
                let shown: Vec<&str> = values.iter().take(8).map(String::as_str).collect();
                let more = values.len().saturating_sub(shown.len());
                if more > 0 {
                    format!("[{}, +{} more]", shown.join(", "), more)
                } else {
                    format!("[{}]", shown.join(", "))
                }
            }
            Some(AttributeInput::FreeText) => "(free text)".to_string(),
            None => "(free text, `values` to load)".to_string(),
        };
        let _ = writeln!(out, "  {:<20} {} {}", attribute, selected, options.dimmed());
    }

    if item.advanced {
        let _ = writeln!(out, "  {}", "advanced view".yellow());
    }
    if let Some(failure) = &item.last_failure {
        let _ = writeln!(out, "  {} {}", "✗".red(), failure);
    }
    out
}

#[derive(Debug, Serialize)]
pub struct ItemSummary<'a> {
    pub id: String,
    pub service: Option<&'a str>,
    pub quantity: u32,
    pub selections: &'a BTreeMap<String, String>,
    pub phase: Phase,
    pub monthly_estimate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary<'a> {
    pub account_id: &'a str,
    pub region: &'static str,
    pub location: &'static str,
    pub items: Vec<ItemSummary<'a>>,
    pub total: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Machine-readable summary for `--json`, with any problems found while
/// applying a plan
pub fn summary_json<'a>(session: &'a Session, issues: &[PlanIssue]) -> SessionSummary<'a> {
    SessionSummary {
        account_id: &session.account_id,
        region: session.region.code(),
        location: session.region.display_name(),
        items: session
            .items
            .iter()
            .map(|item| ItemSummary {
                id: item.id.to_string(),
                service: item.service.as_deref(),
                quantity: item.quantity,
                selections: &item.selections,
                phase: item.phase(),
                monthly_estimate: item.estimated_cost,
                unit_price: item.unit_price,
                unit_type: item.unit_type.as_deref(),
                failure: item.last_failure.as_ref().map(|f| f.to_string()),
            })
            .collect(),
        total: session.total(),
        issues: issues.iter().map(ToString::to_string).collect(),
    }
}
