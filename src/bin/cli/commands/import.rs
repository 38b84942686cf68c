use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use notebook_bundle::bundle::{ImportReport, NotebookImporter};
use notebook_bundle::notify::{Notification, RecordingNotifier};
use notebook_bundle::Stores;

use crate::app::App;
use crate::render::terminal::{render_report, render_summary};
use crate::OutputFormat;

pub fn run(
    app: &App,
    archive: &Path,
    out: Option<&Path>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let mut stores = Stores::new();
    let notifier = RecordingNotifier::new();
    let report = NotebookImporter::new(stores.targets(), &notifier).import_path(archive);
    let notifications = app.forward_notifications(&notifier);

    finish(&stores, &report, &notifications, out, format, use_color)
}

/// Print the outcome of an import and optionally dump the stores
pub fn finish(
    stores: &Stores,
    report: &ImportReport,
    notifications: &[Notification],
    out: Option<&Path>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    if let Some(dir) = out {
        if !report.is_aborted() {
            write_stores(stores, dir)?;
        }
    }

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "report": report,
                "stores": stores.summary(),
                "notifications": notifications,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", render_report(report, use_color));
            if !report.is_aborted() {
                println!();
                println!("{}", render_summary(&stores.summary(), use_color));
            }
            if let Some(dir) = out {
                if !report.is_aborted() {
                    println!();
                    println!("Stores written to {}", dir.display());
                }
            }
        }
    }

    if let Some(reason) = &report.aborted {
        bail!("Import aborted: {}", reason);
    }
    Ok(())
}

/// One JSON file per store
fn write_stores(stores: &Stores, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let files = [
        (
            "datasources.json",
            serde_json::to_value(stores.data_sources.sources())?,
        ),
        (
            "collections.json",
            serde_json::Value::Array(stores.collections.collections().to_vec()),
        ),
        (
            "causal.json",
            stores.causal.model().cloned().unwrap_or(serde_json::Value::Null),
        ),
        (
            "dashboards.json",
            serde_json::Value::Array(stores.dashboards.dashboards().to_vec()),
        ),
    ];

    for (name, value) in files {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}
