use notebook_bundle::bundle::{BundleInspection, ImportReport, ItemStatus, SkipReason};
use notebook_bundle::sinks::StoreSummary;

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::MetaEntry => "meta companion".to_string(),
        SkipReason::EntryMissing => "entry missing from archive".to_string(),
        SkipReason::NoMetaCompanion => "no meta item in manifest".to_string(),
        SkipReason::MetaEntryMissing => "meta entry missing from archive".to_string(),
        SkipReason::UnknownKind(kind) => format!("no store for kind '{}'", kind),
    }
}

/// One line per manifest item, then a totals line
pub fn render_report(report: &ImportReport, use_color: bool) -> String {
    let mut lines = Vec::new();

    if let Some(reason) = &report.aborted {
        lines.push(format!("{} {}", paint("Import failed:", Color::RED, use_color), reason));
        return lines.join("\n");
    }

    if let Some(version) = &report.manifest_version {
        lines.push(paint(&format!("Manifest version {}", version), Color::BOLD, use_color));
    }

    for outcome in &report.items {
        let line = match &outcome.status {
            ItemStatus::Loaded => format!(
                "  {} {} ({})",
                paint("loaded ", Color::GREEN, use_color),
                outcome.name,
                outcome.key
            ),
            ItemStatus::Skipped(reason) => format!(
                "  {} {} {}",
                paint("skipped", Color::GRAY, use_color),
                outcome.name,
                paint(&format!("- {}", describe_skip(reason)), Color::DIM, use_color)
            ),
            ItemStatus::Failed(message) => format!(
                "  {} {} - {}",
                paint("failed ", Color::RED, use_color),
                outcome.name,
                message
            ),
        };
        lines.push(line);
    }

    let failed = report.failures().count();
    let summary = format!("{} loaded, {} failed", report.loaded_count(), failed);
    let color = if failed == 0 { Color::GREEN } else { Color::YELLOW };
    lines.push(paint(&summary, color, use_color));

    lines.join("\n")
}

pub fn render_summary(summary: &StoreSummary, use_color: bool) -> String {
    let sources = if summary.data_sources.is_empty() {
        "(none)".to_string()
    } else {
        summary.data_sources.join(", ")
    };
    [
        paint("Stores", Color::BOLD, use_color),
        format!("  data sources: {}", sources),
        format!("  collections:  {}", summary.collection_count),
        format!(
            "  causal model: {}",
            if summary.has_causal_model { "yes" } else { "no" }
        ),
        format!("  dashboards:   {}", summary.dashboard_count),
    ]
    .join("\n")
}

pub fn render_inspection(inspection: &BundleInspection, use_color: bool) -> String {
    let mut lines = vec![paint(
        &format!("Manifest version {}", inspection.manifest_version),
        Color::BOLD,
        use_color,
    )];

    for entry in &inspection.items {
        let marker = if entry.present {
            paint("✓", Color::GREEN, use_color)
        } else {
            paint("✗", Color::RED, use_color)
        };
        lines.push(format!(
            "  {} {:<32} key={:<12} type={}",
            marker, entry.item.name, entry.item.key, entry.item.item_type
        ));
    }

    match &inspection.meta_companion {
        Some(name) => lines.push(format!("Data items pair with {}", name)),
        None => lines.push(paint("No meta item: data items will be skipped", Color::YELLOW, use_color)),
    }

    if !inspection.unreferenced.is_empty() {
        lines.push("Not in manifest:".to_string());
        for name in &inspection.unreferenced {
            lines.push(format!("  {}", paint(name, Color::GRAY, use_color)));
        }
    }

    lines.join("\n")
}
