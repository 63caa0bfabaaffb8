//! CLI presentation: text and json formatters per command.

use crate::activation::ActivationOutcome;
use crate::orchestrator::SourceSummary;
use crate::types::UnifiedRecord;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

fn format_position(record: &UnifiedRecord) -> String {
    match (record.window_index, record.tab_index) {
        (Some(window), Some(tab)) => format!("{}:{}", window, tab),
        (Some(window), None) => window.to_string(),
        (None, Some(tab)) => format!("-:{}", tab),
        (None, None) => "-".to_string(),
    }
}

pub fn format_items_text(records: &[UnifiedRecord]) -> String {
    if records.is_empty() {
        return "No open items found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Application", "Kind", "Position", "Title", "URL"]);
    for record in records {
        table.add_row(vec![
            record.source_label.clone(),
            record.kind.as_str().to_string(),
            format_position(record),
            record.title.clone(),
            record.url.clone().unwrap_or_default(),
        ]);
    }
    format!("{}\n\nTotal: {} item(s)", table, records.len())
}

pub fn format_items_json(records: &[UnifiedRecord]) -> String {
    let out = json!({ "items": records, "total": records.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_sources_text(sources: &[SourceSummary]) -> String {
    if sources.is_empty() {
        return "No sources configured.\n\nAdd [[sources]] entries to config/config.toml."
            .to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Source", "Kind", "Applications", "Timeout"]);
    for source in sources {
        let applications = if source.applications.is_empty() {
            "(any)".to_string()
        } else {
            source.applications.join(", ")
        };
        table.add_row(vec![
            source.id.clone(),
            source.kind.as_str().to_string(),
            applications,
            format!("{} ms", source.timeout_ms),
        ]);
    }
    format!("{}\n\nTotal: {} source(s)", table, sources.len())
}

pub fn format_sources_json(sources: &[SourceSummary]) -> String {
    let out = json!({ "sources": sources, "total": sources.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_activation_text(target: &UnifiedRecord, outcome: &ActivationOutcome) -> String {
    match outcome {
        ActivationOutcome::Direct => format!(
            "{} {} ({})",
            "Activated".green().bold(),
            target.title,
            target.source_label
        ),
        ActivationOutcome::Resolved { matched, criterion } => format!(
            "{} {} ({}) at {} after matching by {}",
            "Activated".green().bold(),
            matched.title,
            matched.source_label,
            format_position(matched),
            criterion
        ),
        ActivationOutcome::InvalidTarget(reason) => {
            format!("{} {}", "Invalid target:".red().bold(), reason)
        }
        ActivationOutcome::NotFound => format!(
            "{} {} ({}) is no longer open",
            "Not found:".yellow().bold(),
            target.title,
            target.source_label
        ),
        ActivationOutcome::RetryFailed { matched } => format!(
            "{} found {} at {} but could not activate it",
            "Failed:".red().bold(),
            matched.title,
            format_position(matched)
        ),
    }
}

pub fn format_activation_json(outcome: &ActivationOutcome) -> String {
    let out = match outcome {
        ActivationOutcome::Direct => json!({ "activated": true, "outcome": "direct" }),
        ActivationOutcome::Resolved { matched, criterion } => json!({
            "activated": true,
            "outcome": "resolved",
            "criterion": criterion.to_string(),
            "matched": matched,
        }),
        ActivationOutcome::InvalidTarget(reason) => json!({
            "activated": false,
            "outcome": "invalid_target",
            "reason": reason,
        }),
        ActivationOutcome::NotFound => json!({ "activated": false, "outcome": "not_found" }),
        ActivationOutcome::RetryFailed { matched } => json!({
            "activated": false,
            "outcome": "retry_failed",
            "matched": matched,
        }),
    };
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
