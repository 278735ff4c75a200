//! The background export command.
//!
//! An [`ExportJob`] exports one package (or all of them) in full and slim
//! mode, replacing the archives of earlier runs. It reports every step to
//! the progress journal and exposes an [`ExportHandle`] for cancellation and
//! status polling from another thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::archive::ArchiveSummary;
use crate::collection::Collection;
use crate::config::ExporterConfig;
use crate::error::{Error, Result};
use crate::exporter::PackageExporter;
use crate::exports::PackageExportsStore;
use crate::fs::ensure_dir;
use crate::lock::{ExportLock, RunId};
use crate::package::{Package, PackageInfo};
use crate::progress::{PROGRESS_FILE_NAME, ProgressEntry, ProgressJournal};
use crate::projection::ExportMode;
use crate::single::Single;
use crate::source::ContentSource;

/// Process name reported when a run completes.
pub const PROCESS_NAME: &str = "Content Exporter";

/// Lifecycle state of an export job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum JobStatus {
    /// Not started yet.
    #[default]
    Pending,
    /// Exporting.
    Running,
    /// Finished successfully.
    Completed,
    /// Stopped by an error.
    Failed(String),
    /// Stopped on request.
    Cancelled,
}

impl JobStatus {
    /// Has the job stopped, successfully or not?
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_) | Self::Cancelled)
    }
}

/// Shared cancellation flag and status of a running job.
#[derive(Debug, Clone, Default)]
pub struct ExportHandle {
    cancelled: Arc<AtomicBool>,
    status: Arc<Mutex<JobStatus>>,
}

impl ExportHandle {
    /// Create a handle for a job that has not started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the job to stop before its next archive.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Has cancellation been requested?
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Current job status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        match self.status.lock() {
            Ok(status) => status.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_status(&self, status: JobStatus) {
        match self.status.lock() {
            Ok(mut current) => *current = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    /// Identifier of the run.
    pub run_id: RunId,
    /// Slugs of the exported packages, in export order.
    pub packages: Vec<String>,
    /// Archives written.
    pub archives: Vec<ArchiveSummary>,
    /// Exports whose archive could not be written.
    pub failed_archives: usize,
}

/// Exports packages from a content source.
pub struct ExportJob<'a, S: ContentSource + ?Sized> {
    config: ExporterConfig,
    source: &'a S,
    handle: ExportHandle,
    sender: Option<mpsc::UnboundedSender<ProgressEntry>>,
}

impl<'a, S: ContentSource + ?Sized> ExportJob<'a, S> {
    /// Create a job.
    pub fn new(config: ExporterConfig, source: &'a S) -> Self {
        Self {
            config,
            source,
            handle: ExportHandle::new(),
            sender: None,
        }
    }

    /// Use an existing handle, e.g. one already wired to a signal handler.
    #[must_use]
    pub fn with_handle(mut self, handle: ExportHandle) -> Self {
        self.handle = handle;
        self
    }

    /// Also send every progress entry over `sender`.
    #[must_use]
    pub fn with_progress_sender(mut self, sender: mpsc::UnboundedSender<ProgressEntry>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Handle for cancelling and polling this job.
    #[must_use]
    pub fn handle(&self) -> ExportHandle {
        self.handle.clone()
    }

    /// Path of the progress journal this job writes.
    #[must_use]
    pub fn progress_path(&self) -> PathBuf {
        self.config.exports_dir().join(PROGRESS_FILE_NAME)
    }

    /// Export `target` (a package slug) or every package when `None`.
    ///
    /// Old archives of the exported packages are removed first. The first
    /// error stops the run and is recorded in the journal.
    pub fn run(&self, target: Option<&str>) -> Result<JobSummary> {
        self.handle.set_status(JobStatus::Running);
        let result = self.execute(target);
        let status = match &result {
            Ok(_) => JobStatus::Completed,
            Err(Error::Cancelled) => JobStatus::Cancelled,
            Err(e) => JobStatus::Failed(e.to_string()),
        };
        self.handle.set_status(status);
        result
    }

    fn execute(&self, target: Option<&str>) -> Result<JobSummary> {
        let exports_dir = self.config.exports_dir();
        ensure_dir(&exports_dir)?;

        let run_id = RunId::new();
        let _lock = if self.config.guard_concurrent_runs {
            Some(ExportLock::acquire(&exports_dir, run_id)?)
        } else {
            None
        };

        let mut journal = ProgressJournal::new(exports_dir.join(PROGRESS_FILE_NAME));
        if let Some(sender) = &self.sender {
            journal = journal.with_sender(sender.clone());
        }
        let mut exporter = PackageExporter::new(self.config.clone(), journal)?;
        info!("Export run {} started", run_id);

        let available = match self.resolve(target) {
            Ok(available) if !available.is_empty() => available,
            Ok(_) => {
                exporter.journal_mut().log_error(Error::NoPackages.to_string());
                return Err(Error::NoPackages);
            }
            Err(e @ Error::PackageNotFound { .. }) => {
                exporter.journal_mut().log_error(Error::NoPackages.to_string());
                return Err(e);
            }
            Err(e) => {
                exporter.journal_mut().log_error(e.to_string());
                return Err(e);
            }
        };

        match self.export_all(&mut exporter, target, &available, run_id) {
            Ok(summary) => {
                exporter.journal_mut().log_finished(PROCESS_NAME);
                info!(
                    "Export run {} completed: {} archive(s)",
                    run_id,
                    summary.archives.len()
                );
                Ok(summary)
            }
            Err(e) => {
                exporter.journal_mut().log_error(e.to_string());
                warn!("Export run {} stopped: {}", run_id, e);
                Err(e)
            }
        }
    }

    fn resolve(&self, target: Option<&str>) -> Result<Vec<PackageInfo>> {
        match target {
            Some(slug) => match self.source.find_package(slug)? {
                Some(info) => Ok(vec![info]),
                None => Err(Error::PackageNotFound {
                    slug: slug.to_string(),
                }),
            },
            None => self.source.packages(),
        }
    }

    fn export_all(
        &self,
        exporter: &mut PackageExporter,
        target: Option<&str>,
        available: &[PackageInfo],
        run_id: RunId,
    ) -> Result<JobSummary> {
        let store = PackageExportsStore::from_config(&self.config, self.source);
        let cleared = match target {
            Some(slug) => store.destroy(slug)?,
            None => store.destroy_all()?,
        };
        if !cleared {
            warn!("Some old archives could not be removed");
        }

        let packages = self.build_packages(available)?;
        let mut summary = JobSummary {
            run_id,
            packages: Vec::new(),
            archives: Vec::new(),
            failed_archives: 0,
        };

        for package in &packages {
            exporter
                .journal_mut()
                .log(format!("Creating package: {}", package.name));
            for mode in [ExportMode::Full, ExportMode::Slim] {
                if self.handle.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                match exporter.export(package, mode)?.archive {
                    Some(archive) => summary.archives.push(archive),
                    None => summary.failed_archives += 1,
                }
            }
            exporter
                .journal_mut()
                .log(format!("Completed package: {}", package.name));
            summary.packages.push(package.slug.clone());
        }

        Ok(summary)
    }

    /// Attach content to each package; packages left empty are dropped.
    fn build_packages(&self, available: &[PackageInfo]) -> Result<Vec<Package>> {
        let mut content: Vec<(String, Vec<Collection>, Vec<Single>)> = Vec::new();
        for lang in &self.config.supported_languages {
            content.push((
                lang.locale.clone(),
                self.source.collections(&lang.locale)?,
                self.source.singles(&lang.locale)?,
            ));
        }

        let mut packages = Vec::new();
        for info in available {
            let mut package = Package::new(info.slug.clone(), info.name.clone());
            for (locale, collections, singles) in &content {
                for collection in collections.iter().filter(|c| c.belongs_to(&info.slug)) {
                    package.add_collection(locale, collection.clone());
                }
                for single in singles.iter().filter(|s| s.belongs_to(&info.slug)) {
                    package.add_single(locale, single.clone());
                }
            }
            if package.is_empty() {
                info!("Skipping package {} without content", info.slug);
            } else {
                packages.push(package);
            }
        }
        Ok(packages)
    }
}
