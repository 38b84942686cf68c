use std::path::Path;

use anyhow::{Context, Result};

use notebook_bundle::bundle::{inspect, BundleArchive};

use crate::render::terminal::render_inspection;
use crate::OutputFormat;

pub fn run(archive: &Path, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut bundle = BundleArchive::open_path(archive)
        .with_context(|| format!("Failed to open {}", archive.display()))?;
    let inspection = inspect(&mut bundle).context("Failed to read bundle manifest")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&inspection)?),
        OutputFormat::Plain => println!("{}", render_inspection(&inspection, use_color)),
    }

    Ok(())
}
