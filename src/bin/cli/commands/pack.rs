use std::path::Path;

use anyhow::{bail, Context, Result};

use notebook_bundle::bundle::{export_stores_to_path, pack_directory, NotebookImporter};
use notebook_bundle::notify::RecordingNotifier;
use notebook_bundle::Stores;

use crate::app::App;
use crate::OutputFormat;

pub fn run_pack(dir: &Path, output: &Path, format: &OutputFormat) -> Result<()> {
    let summary = pack_directory(dir, output)
        .with_context(|| format!("Failed to pack {}", dir.display()))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Plain => {
            println!(
                "Packed {} files into {} (manifest version {})",
                summary.file_count,
                output.display(),
                summary.manifest_version
            );
            if !summary.missing.is_empty() {
                println!("Listed in manifest but not found:");
                for name in &summary.missing {
                    println!("  - {}", name);
                }
            }
        }
    }

    Ok(())
}

/// Import `archive`, then write the resulting stores as a fresh bundle
pub fn run_export(app: &App, archive: &Path, output: &Path, format: &OutputFormat) -> Result<()> {
    let mut stores = Stores::new();
    let notifier = RecordingNotifier::new();
    let report = NotebookImporter::new(stores.targets(), &notifier).import_path(archive);
    app.forward_notifications(&notifier);

    if let Some(reason) = &report.aborted {
        bail!("Import aborted: {}", reason);
    }

    let manifest = export_stores_to_path(&stores, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    match format {
        OutputFormat::Json => {
            let result = serde_json::json!({
                "report": report,
                "manifest": manifest,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => {
            let failed = report.failures().count();
            println!(
                "Wrote {} items to {} ({} loaded, {} failed on import)",
                manifest.items.len(),
                output.display(),
                report.loaded_count(),
                failed
            );
        }
    }

    Ok(())
}
