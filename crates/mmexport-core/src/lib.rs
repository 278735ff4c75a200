//! `mmexport` Core Library
//!
//! This crate turns packages of media content into portable zip archives
//! for the offline interface app:
//! - Content model (packages, collections, singles, episodes) with validated assets
//! - Full and slim JSON projections of content
//! - Archive naming, listing and housekeeping of past exports
//! - The export pipeline with a file-backed progress journal
//! - A cancellable background export job
//!
//! # Error Handling
//!
//! Every fallible operation returns the crate's [`Result`]. See the
//! [`error`] module for the error types.
//!
//! ```rust,ignore
//! use mmexport_core::{ExportJob, ExporterConfig, JsonCatalog, Result};
//!
//! fn export_sports(config: ExporterConfig, catalog: &JsonCatalog) -> Result<()> {
//!     let summary = ExportJob::new(config, catalog).run(Some("sports"))?;
//!     println!("{} archive(s) written", summary.archives.len());
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod asset;
pub mod catalog;
pub mod collection;
pub mod config;
pub mod episode;
pub mod error;
pub mod exporter;
pub mod exports;
pub mod filename;
pub mod fs;
pub mod job;
pub mod language;
pub mod lock;
pub mod package;
pub mod progress;
pub mod projection;
pub mod single;
pub mod source;

pub use archive::{ARCHIVE_ROOT, ArchiveSummary, zip_tree};
pub use asset::{Asset, mime_type_for};
pub use catalog::JsonCatalog;
pub use collection::{COLLECTION_SLUG_PREFIX, Collection};
pub use config::{
    APP_LOGO_KEY, CONFIG_FILE_NAME, DEFAULT_PUBLIC_PATH, ExporterConfig, InterfaceMap,
    SupportedLanguage, default_config_path,
};
pub use episode::Episode;
pub use error::{ArchiveError, AssetKind, ContentError, Error, FileSystemError, Result};
pub use exporter::{ExportOutcome, ExportRun, LocaleWriter, PackageExporter};
pub use exports::{DISPLAY_DATE_FORMAT, PackageExport, PackageExportsStore};
pub use filename::{DEFAULT_FILE_DATE_FORMAT, DecodedFilename};
pub use job::{ExportHandle, ExportJob, JobStatus, JobSummary};
pub use language::Language;
pub use lock::{ExportLock, LOCK_FILE_NAME, RunId};
pub use package::{Package, PackageInfo};
pub use progress::{PROGRESS_FILE_NAME, ProgressEntry, ProgressJournal, read_progress};
pub use projection::ExportMode;
pub use single::Single;
pub use source::ContentSource;
