//! Import and export command handlers.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tablesmith::codec::services::{ExportOptions, ImportOptions};
use tablesmith::config::TablesmithConfig;
use tablesmith::{Error, ExportService, ImportService, Result};

use super::{load_schemas, open_store, parse_kind};

/// Executes the export command.
pub fn cmd_export(config: &TablesmithConfig, kind: &str, output: Option<PathBuf>) -> Result<()> {
    let kind = parse_kind(kind)?;
    let service = export_service(config)?;

    match output {
        Some(path) => {
            let result = service.export_to_file(kind, &path)?;
            eprintln!(
                "Exported {} {} rows ({} columns) to {}",
                result.exported,
                kind,
                result.columns,
                path.display()
            );
        },
        None => {
            let stdout = std::io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            service.export_to_writer(kind, &mut writer)?;
            writer.flush().map_err(|e| Error::OperationFailed {
                operation: "flush_stdout".to_string(),
                cause: e.to_string(),
            })?;
        },
    }

    Ok(())
}

/// Executes the export-all command.
pub fn cmd_export_all(config: &TablesmithConfig, dir: &Path) -> Result<()> {
    let results = export_service(config)?.export_all(dir)?;

    println!("Export completed:");
    for result in &results {
        println!("  {:<24}{:>6} rows", result.kind.as_str(), result.exported);
    }
    println!("  Output: {}", dir.display());

    Ok(())
}

/// Executes the import command.
pub fn cmd_import(config: &TablesmithConfig, kind: &str, file: &Path, dry_run: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    let service = ImportService::new(open_store(config)?, load_schemas(config)?)
        .with_options(ImportOptions::default().with_dry_run(dry_run));

    let summary = service.import_from_file(kind, file)?;

    if dry_run {
        println!("Dry run completed (no changes made):");
    } else {
        println!("Import completed:");
    }
    println!("  Table:    {kind}");
    println!("  Imported: {}", summary.imported);
    println!("  Deleted:  {}", summary.deleted);

    Ok(())
}

fn export_service(config: &TablesmithConfig) -> Result<ExportService> {
    Ok(
        ExportService::new(open_store(config)?, load_schemas(config)?).with_options(
            ExportOptions::default().with_row_key_header(config.row_key_header.clone()),
        ),
    )
}
