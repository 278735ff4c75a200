//! Subcommand implementations.

use std::path::{Path, PathBuf};

use mmexport_core::{
    ExportHandle, ExportJob, ExportLock, ExporterConfig, JobStatus, JsonCatalog,
    PROGRESS_FILE_NAME, PackageExport, PackageExportsStore, ProgressEntry, read_progress,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::CliError;

/// Run an export in the background, printing progress as it arrives.
///
/// Ctrl-C asks the job to stop before its next archive.
pub async fn export(
    config: ExporterConfig,
    catalog_path: PathBuf,
    slug: Option<String>,
) -> Result<JobStatus, CliError> {
    let handle = ExportHandle::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEntry>();

    let signal_handle = handle.clone();
    let signals = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Cancellation requested, stopping after the current archive");
            signal_handle.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            println!("{}", format_entry(&entry));
        }
    });

    let job_handle = handle.clone();
    let result = tokio::task::spawn_blocking(move || {
        let catalog = JsonCatalog::load(&catalog_path)?.with_base_url(config.site_url.clone());
        ExportJob::new(config, &catalog)
            .with_handle(job_handle)
            .with_progress_sender(tx)
            .run(slug.as_deref())
    })
    .await?;

    printer.await?;
    signals.abort();

    match result {
        Ok(summary) => {
            info!(
                "Run {} wrote {} archive(s) for {} package(s)",
                summary.run_id,
                summary.archives.len(),
                summary.packages.len()
            );
            Ok(handle.status())
        }
        Err(mmexport_core::Error::Cancelled) => Ok(handle.status()),
        Err(e) => Err(e.into()),
    }
}

/// Print every archive, sorted by package name.
pub fn list(config: &ExporterConfig, catalog_path: &Path, json: bool) -> Result<(), CliError> {
    let catalog = JsonCatalog::load_or_empty(catalog_path)?;
    let store = PackageExportsStore::from_config(config, &catalog);
    let exports = store.list_by_package_name()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exports)?);
        return Ok(());
    }
    if exports.is_empty() {
        println!("No exports found in {}", store.dir().display());
        return Ok(());
    }
    for export in &exports {
        println!("{}", format_export(export));
    }
    Ok(())
}

/// Delete one archive by file name.
pub fn delete(config: &ExporterConfig, catalog_path: &Path, file_name: &str) -> Result<(), CliError> {
    let catalog = JsonCatalog::load_or_empty(catalog_path)?;
    PackageExportsStore::from_config(config, &catalog).delete_file(file_name)?;
    println!("Deleted {file_name}");
    Ok(())
}

/// Delete every archive of a package.
pub fn delete_package(
    config: &ExporterConfig,
    catalog_path: &Path,
    slug: &str,
) -> Result<(), CliError> {
    let catalog = JsonCatalog::load_or_empty(catalog_path)?;
    let cleared = PackageExportsStore::from_config(config, &catalog).destroy(slug)?;
    if cleared {
        println!("Deleted all exports of {slug}");
    } else {
        println!("Some exports of {slug} could not be deleted");
    }
    Ok(())
}

/// Move every archive of a package to a new slug.
pub fn rename(
    config: &ExporterConfig,
    catalog_path: &Path,
    old_slug: &str,
    new_slug: &str,
) -> Result<(), CliError> {
    let catalog = JsonCatalog::load_or_empty(catalog_path)?;
    let renamed = PackageExportsStore::from_config(config, &catalog).update_slug(old_slug, new_slug)?;
    println!("Renamed {} archive(s) from {old_slug} to {new_slug}", renamed.len());
    Ok(())
}

/// Print the progress journal of the last (or current) run.
pub fn status(config: &ExporterConfig) -> Result<(), CliError> {
    let exports_dir = config.exports_dir();
    if let Some(run_id) = ExportLock::holder(&exports_dir)? {
        println!("Export run {run_id} is in progress");
    }
    let entries = read_progress(&exports_dir.join(PROGRESS_FILE_NAME))?;
    if entries.is_empty() {
        println!("No export progress recorded");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", format_entry(entry));
    }
    Ok(())
}

fn format_entry(entry: &ProgressEntry) -> String {
    let marker = if entry.is_error {
        "ERROR"
    } else if entry.completed {
        "DONE"
    } else {
        "..."
    };
    format!("[{:>3}] {:<5} {}", entry.counter, marker, entry.message)
}

fn format_export(export: &PackageExport) -> String {
    let kind = if export.is_slim { "slim" } else { "full" };
    format!(
        "{:<24} {:<4} {:<22} {}",
        export.package.name, kind, export.date, export.file_name
    )
}
