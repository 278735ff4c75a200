//! Builds one package archive.
//!
//! An export walks through a fixed sequence, each stage held by a handle
//! that borrows the previous one:
//!
//! ```text
//! PackageExporter::start ──► ExportRun ──start_locale──► LocaleWriter
//!                              ▲                           │ add_collection / add_single
//!                              └──────── finish_locale ◄───┘
//!                            ExportRun::finish ──► ExportOutcome
//! ```
//!
//! The working tree lives next to the archives in the exports directory and
//! is removed once the archive has been written (or has failed to be).
//!
//! # Example
//!
//! ```rust,ignore
//! let mut exporter = PackageExporter::new(config, journal)?;
//! let full = exporter.export(&package, ExportMode::Full)?;
//! let slim = exporter.export(&package, ExportMode::Slim)?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::archive::{ARCHIVE_ROOT, ArchiveSummary, zip_tree};
use crate::asset::Asset;
use crate::collection::Collection;
use crate::config::{APP_LOGO_KEY, ExporterConfig, InterfaceMap};
use crate::error::Result;
use crate::filename::{self, ARCHIVE_EXTENSION};
use crate::fs::{copy_into, ensure_dir, file_name_of, remove_tree, write_error, write_json};
use crate::language::Language;
use crate::package::{Package, push_unique};
use crate::progress::ProgressJournal;
use crate::projection::{self, ExportMode, LocaleManifest};
use crate::single::Single;

/// Root-level file listing the exported languages.
pub const LANGUAGES_FILE: &str = "languages.json";
/// Per-locale manifest file.
pub const MANIFEST_FILE: &str = "main.json";
/// Per-locale interface strings file.
pub const INTERFACE_FILE: &str = "interface.json";

const DATA_DIR: &str = "data";
const IMAGES_DIR: &str = "images";
const MEDIA_DIR: &str = "media";

/// Result of a finished export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Mode of the run.
    pub mode: ExportMode,
    /// Locales that were written, in order.
    pub locales: Vec<String>,
    /// The archive, or `None` when it could not be written.
    pub archive: Option<ArchiveSummary>,
}

/// Turns packages into archives in the configured exports directory.
#[derive(Debug)]
pub struct PackageExporter {
    config: ExporterConfig,
    exports_dir: PathBuf,
    logo: Option<PathBuf>,
    journal: ProgressJournal,
}

impl PackageExporter {
    /// Create an exporter, creating the exports directory if needed.
    pub fn new(config: ExporterConfig, journal: ProgressJournal) -> Result<Self> {
        let exports_dir = config.exports_dir();
        ensure_dir(&exports_dir)?;
        let logo = config.logo_path();
        if logo.is_none() && config.logo_public_path.is_some() {
            warn!("Configured logo not found, exporting without branding");
        }
        Ok(Self {
            config,
            exports_dir,
            logo,
            journal,
        })
    }

    /// The exporter configuration.
    #[must_use]
    pub const fn config(&self) -> &ExporterConfig {
        &self.config
    }

    /// Directory archives are written to.
    #[must_use]
    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    /// The progress journal.
    #[must_use]
    pub const fn journal(&self) -> &ProgressJournal {
        &self.journal
    }

    /// The progress journal, for callers logging around an export.
    pub const fn journal_mut(&mut self) -> &mut ProgressJournal {
        &mut self.journal
    }

    /// Give back the progress journal.
    #[must_use]
    pub fn into_journal(self) -> ProgressJournal {
        self.journal
    }

    /// Export `package` in `mode`, one locale per supported language with content.
    pub fn export(&mut self, package: &Package, mode: ExportMode) -> Result<ExportOutcome> {
        let plan: Vec<(String, Language, InterfaceMap)> = self
            .config
            .supported_languages
            .iter()
            .filter(|lang| package.has_content_for(&lang.locale))
            .map(|lang| {
                (
                    lang.locale.clone(),
                    lang.to_language(),
                    self.config.interface_for(&lang.locale),
                )
            })
            .collect();

        let mut run = self.start(&package.name, &package.slug, mode)?;
        for (locale, language, interface) in plan {
            let mut writer = run.start_locale(&locale, interface)?;
            writer.add_language(language);
            for collection in package.collections_for(&locale) {
                writer.add_collection(collection)?;
            }
            for single in package.singles_for(&locale) {
                writer.add_single(single)?;
            }
            writer.finish_locale()?;
        }
        Ok(run.finish())
    }

    /// Open a new working tree for `package_slug`.
    pub fn start(
        &mut self,
        package_name: &str,
        package_slug: &str,
        mode: ExportMode,
    ) -> Result<ExportRun<'_>> {
        self.journal.log("Export started!");

        let file_name = filename::encode(package_slug, &self.config.file_date_suffix, mode.is_slim());
        let root = self.exports_dir.join(filename::stem(&file_name));
        ensure_dir(&root)?;

        let logo_file_name = match &self.logo {
            Some(logo) => {
                let name = file_name_of(logo);
                if let Some(name) = &name {
                    copy_into(logo, &root, name)?;
                }
                name
            }
            None => None,
        };

        self.journal.log("Setup complete.");
        debug!("Export root {}", root.display());

        Ok(ExportRun {
            exporter: self,
            mode,
            item_name: package_name.to_string(),
            root,
            logo_file_name,
            languages: Vec::new(),
            locales: Vec::new(),
        })
    }
}

/// An export with its working tree open.
#[derive(Debug)]
pub struct ExportRun<'a> {
    exporter: &'a mut PackageExporter,
    mode: ExportMode,
    item_name: String,
    root: PathBuf,
    logo_file_name: Option<String>,
    languages: Vec<Language>,
    locales: Vec<String>,
}

impl<'a> ExportRun<'a> {
    /// Mode of this run.
    #[must_use]
    pub const fn mode(&self) -> ExportMode {
        self.mode
    }

    /// Working tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Locales started so far.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    /// Archive path this run produces.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        let mut name = self.root.as_os_str().to_os_string();
        name.push(ARCHIVE_EXTENSION);
        PathBuf::from(name)
    }

    /// Add a language to `languages.json`, ignoring repeated display texts.
    pub fn add_language(&mut self, language: Language) {
        if self.languages.iter().any(|l| l.text == language.text) {
            return;
        }
        self.languages.push(language);
    }

    /// Create the directories for `locale` and write its interface file.
    pub fn start_locale(
        &mut self,
        locale: &str,
        mut interface: InterfaceMap,
    ) -> Result<LocaleWriter<'_, 'a>> {
        self.log(format!("Start Locale: {locale}"));
        push_unique(&mut self.locales, locale.to_string());

        let locale_root = self.root.join(locale);
        let data_dir = locale_root.join(DATA_DIR);
        ensure_dir(&data_dir)?;

        if let Some(logo) = &self.logo_file_name {
            interface.insert(
                APP_LOGO_KEY.to_string(),
                serde_json::Value::String(format!("{ARCHIVE_ROOT}/{logo}")),
            );
        }
        write_json(&data_dir.join(INTERFACE_FILE), &interface)?;

        let (images_dir, media_dir) = if self.mode.is_slim() {
            (None, None)
        } else {
            let images = locale_root.join(IMAGES_DIR);
            let media = locale_root.join(MEDIA_DIR);
            ensure_dir(&images)?;
            ensure_dir(&media)?;
            (Some(images), Some(media))
        };

        self.log("Locale set up.");
        Ok(LocaleWriter {
            run: self,
            locale: locale.to_string(),
            data_dir,
            images_dir,
            media_dir,
            manifest: Vec::new(),
        })
    }

    /// Write `languages.json`, pack the tree and remove the working directories.
    ///
    /// Archive failures are reported through the journal and leave
    /// [`ExportOutcome::archive`] empty; the working tree is removed either way.
    pub fn finish(mut self) -> ExportOutcome {
        self.log("Completing export!");
        let zip_path = self.archive_path();

        let archive = match self.pack(&zip_path) {
            Ok(summary) if zip_path.is_file() => {
                self.exporter.journal.increase_counter();
                self.log("Archive has been zipped up. Doing some clean up.");
                Some(summary)
            }
            Ok(_) => {
                self.log_error(format!(
                    "For some reason the zip was not created: {}",
                    zip_path.display()
                ));
                None
            }
            Err(e) => {
                self.log_error(format!(
                    "For some reason the zip was not created: {} ({e})",
                    zip_path.display()
                ));
                None
            }
        };

        self.clean_up();
        self.log("Completed export.");

        ExportOutcome {
            mode: self.mode,
            locales: self.locales,
            archive,
        }
    }

    fn pack(&mut self, zip_path: &Path) -> Result<ArchiveSummary> {
        self.log(format!("Creating languages file: {LANGUAGES_FILE}"));
        write_json(&self.root.join(LANGUAGES_FILE), &self.languages)?;
        self.log("Zipping up the archive.");
        zip_tree(&self.root, zip_path, ARCHIVE_ROOT)
    }

    fn clean_up(&mut self) {
        let mut dirs: Vec<PathBuf> = self.locales.iter().map(|l| self.root.join(l)).collect();
        dirs.push(self.root.clone());
        for dir in dirs {
            if let Err(e) = remove_tree(&dir) {
                self.log_error(e.to_string());
            }
        }
    }

    fn log(&mut self, message: impl Into<String>) {
        self.exporter.journal.log(message);
    }

    fn log_error(&mut self, message: impl Into<String>) {
        self.exporter.journal.log_error(message);
    }
}

/// Writes the content of one locale.
#[derive(Debug)]
pub struct LocaleWriter<'r, 'a> {
    run: &'r mut ExportRun<'a>,
    locale: String,
    data_dir: PathBuf,
    images_dir: Option<PathBuf>,
    media_dir: Option<PathBuf>,
    manifest: Vec<serde_json::Value>,
}

impl LocaleWriter<'_, '_> {
    /// Locale being written.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Number of manifest entries so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    /// True before the first item is added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Add a language to `languages.json`.
    pub fn add_language(&mut self, language: Language) {
        self.run.add_language(language);
    }

    /// Write a collection's detail file, add it to the manifest and, in full
    /// mode, bundle its images and episode media.
    pub fn add_collection(&mut self, collection: &Collection) -> Result<()> {
        let mode = self.run.mode;
        self.run
            .log(format!("Adding a new collection: {}", collection.title));
        self.write_data_file(
            &collection.slug,
            &projection::collection_detail(collection, mode)?,
        )?;
        self.manifest
            .push(projection::collection_summary(collection, mode)?);

        if let (Some(images), Some(media)) = (self.images_dir.clone(), self.media_dir.clone()) {
            self.run.log("Adding media files to package.");
            self.bundle(collection.image(), &images)?;
            for episode in collection.episodes() {
                self.run
                    .log(format!("Adding a new episode: {}", episode.title));
                self.bundle(episode.image(), &images)?;
                self.bundle(episode.media(), &media)?;
            }
        }

        self.run.log("Collection added!");
        Ok(())
    }

    /// Write a single's detail file, add it to the manifest and, in full
    /// mode, bundle its image and media.
    pub fn add_single(&mut self, single: &Single) -> Result<()> {
        let mode = self.run.mode;
        self.run.log(format!("Adding a new single: {}", single.title));
        self.write_data_file(&single.slug, &projection::single_detail(single, mode)?)?;
        self.manifest.push(projection::single_summary(single, mode)?);

        if let (Some(images), Some(media)) = (self.images_dir.clone(), self.media_dir.clone()) {
            self.run.log("Adding media files to package.");
            self.bundle(single.image(), &images)?;
            self.bundle(single.media(), &media)?;
        }

        self.run.log("Single added!");
        Ok(())
    }

    /// Write the locale manifest. Returns the number of entries written.
    pub fn finish_locale(self) -> Result<usize> {
        let Self {
            run,
            locale,
            data_dir,
            manifest,
            ..
        } = self;
        run.log(format!("Completing the current locale: {locale}"));
        run.log(format!("Creating data file: {MANIFEST_FILE}"));
        write_json(
            &data_dir.join(MANIFEST_FILE),
            &LocaleManifest {
                item_name: &run.item_name,
                content: &manifest,
            },
        )?;
        run.log("Locale completed.");
        Ok(manifest.len())
    }

    fn write_data_file(&mut self, slug: &str, json: &str) -> Result<()> {
        let file_name = format!("{slug}.json");
        self.run.log(format!("Creating data file: {file_name}"));
        let path = self.data_dir.join(file_name);
        fs::write(&path, json).map_err(|e| write_error(&path, e))
    }

    fn bundle(&mut self, asset: &Asset, dir: &Path) -> Result<()> {
        self.run
            .log(format!("Copying file: {}", asset.file_name()));
        copy_into(asset.local_path(), dir, asset.file_name())?;
        Ok(())
    }
}
