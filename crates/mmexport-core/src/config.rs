//! Exporter configuration.
//!
//! Loaded from a JSON file. Every field has a default, so a partial file
//! (or no file at all) yields a usable configuration.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, FileSystemError, Result};
use crate::filename::DEFAULT_FILE_DATE_FORMAT;
use crate::fs::ensure_dir;
use crate::language::Language;

/// Public path under which archives are served.
pub const DEFAULT_PUBLIC_PATH: &str = "/files/exports/";

/// Name of the default configuration file.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Interface key that receives the archive-relative logo path.
pub const APP_LOGO_KEY: &str = "APP_LOGO";

/// Locale used when a locale has no interface strings of its own.
pub const FALLBACK_LOCALE: &str = "en";

/// Interface settings of one locale, passed through to `interface.json` as is.
pub type InterfaceMap = BTreeMap<String, serde_json::Value>;

/// A language the exporter produces content for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupportedLanguage {
    /// Display text, e.g. `English`.
    pub text: String,
    /// Locale directory name, e.g. `en`.
    pub locale: String,
    /// Language codes understood by the interface.
    #[serde(default)]
    pub codes: Vec<String>,
    /// Whether the interface should start in this language.
    #[serde(default)]
    pub default: bool,
}

impl SupportedLanguage {
    /// The [`Language`] entry written to `languages.json`.
    #[must_use]
    pub fn to_language(&self) -> Language {
        Language::new(self.codes.clone(), self.text.clone(), self.default)
    }
}

fn default_supported_languages() -> Vec<SupportedLanguage> {
    vec![SupportedLanguage {
        text: "English".to_string(),
        locale: FALLBACK_LOCALE.to_string(),
        codes: vec!["en-US".to_string(), "en".to_string()],
        default: true,
    }]
}

/// Configuration of the package exporter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExporterConfig {
    /// Root of the public files directory. Archives go to `<public_dir>/exports`.
    pub public_dir: PathBuf,
    /// URL path archives are served from.
    pub public_path: String,
    /// chrono format appended to archive names.
    pub file_date_suffix: String,
    /// Branding logo relative to `public_dir`.
    pub logo_public_path: Option<String>,
    /// Base URL of the site, used to build remote asset URLs.
    pub site_url: String,
    /// Languages content is exported for, in export order.
    pub supported_languages: Vec<SupportedLanguage>,
    /// Interface settings per locale.
    pub interface: HashMap<String, InterfaceMap>,
    /// Refuse to start while another run holds the lock file.
    pub guard_concurrent_runs: bool,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            file_date_suffix: DEFAULT_FILE_DATE_FORMAT.to_string(),
            logo_public_path: None,
            site_url: String::new(),
            supported_languages: default_supported_languages(),
            interface: HashMap::new(),
            guard_concurrent_runs: false,
        }
    }
}

impl ExporterConfig {
    /// Load configuration from `path`, or the defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::FileSystem(FileSystemError::ReadFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to read config file: {e}"),
            })
        })?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {e}")))?;
        config.validate()?;

        info!("Loaded config from {}", path.display());
        debug!("Exports directory: {}", config.exports_dir().display());
        Ok(config)
    }

    /// Save configuration to `path` as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_dir(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            Error::FileSystem(FileSystemError::WriteFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write config file: {e}"),
            })
        })?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Check values that serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for an empty date format or language list.
    pub fn validate(&self) -> Result<()> {
        if self.file_date_suffix.trim().is_empty() {
            return Err(Error::Configuration(
                "file_date_suffix must not be empty".to_string(),
            ));
        }
        if self.file_date_suffix.contains('_') {
            return Err(Error::Configuration(
                "file_date_suffix must not contain '_'".to_string(),
            ));
        }
        if self.supported_languages.is_empty() {
            return Err(Error::Configuration(
                "at least one supported language is required".to_string(),
            ));
        }
        Ok(())
    }

    /// Directory holding archives and the progress file.
    #[must_use]
    pub fn exports_dir(&self) -> PathBuf {
        self.public_dir.join("exports")
    }

    /// The branding logo on disk, if configured and present.
    #[must_use]
    pub fn logo_path(&self) -> Option<PathBuf> {
        let relative = self.logo_public_path.as_deref()?;
        let path = self.public_dir.join(relative.trim_start_matches('/'));
        path.is_file().then_some(path)
    }

    /// Interface settings for `locale`, falling back to English.
    #[must_use]
    pub fn interface_for(&self, locale: &str) -> InterfaceMap {
        self.interface
            .get(locale)
            .or_else(|| self.interface.get(FALLBACK_LOCALE))
            .cloned()
            .unwrap_or_default()
    }
}

fn default_public_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mmexport")
        .join("public")
}

/// Default location of the configuration file.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mmexport")
        .join(CONFIG_FILE_NAME)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ExporterConfig::default();
        assert_eq!(config.public_path, DEFAULT_PUBLIC_PATH);
        assert_eq!(config.file_date_suffix, DEFAULT_FILE_DATE_FORMAT);
        assert!(!config.guard_concurrent_runs);
        assert_eq!(config.supported_languages.len(), 1);
        let english = &config.supported_languages[0];
        assert_eq!(english.locale, "en");
        assert_eq!(english.codes, ["en-US", "en"]);
        assert!(english.default);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp = TempDir::new().expect("temp dir");
        let config = ExporterConfig::load(&temp.path().join("none.json")).expect("load");
        assert_eq!(config, ExporterConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);
        let config = ExporterConfig {
            public_dir: temp.path().to_path_buf(),
            site_url: "https://example.org".to_string(),
            guard_concurrent_runs: true,
            ..ExporterConfig::default()
        };
        config.save(&path).expect("save");

        let loaded = ExporterConfig::load(&path).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, r#"{"site_url": "https://example.org"}"#).expect("write");

        let config = ExporterConfig::load(&path).expect("load");
        assert_eq!(config.site_url, "https://example.org");
        assert_eq!(config.public_path, DEFAULT_PUBLIC_PATH);
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "{not json").expect("write");
        assert!(matches!(
            ExporterConfig::load(&path),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_validate_rejects_underscore_date_format() {
        let config = ExporterConfig {
            file_date_suffix: "%Y_%m".to_string(),
            ..ExporterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logo_path_requires_existing_file() {
        let temp = TempDir::new().expect("temp dir");
        let mut config = ExporterConfig {
            public_dir: temp.path().to_path_buf(),
            logo_public_path: Some("/images/logo.png".to_string()),
            ..ExporterConfig::default()
        };
        assert_eq!(config.logo_path(), None);

        fs::create_dir_all(temp.path().join("images")).expect("mkdir");
        fs::write(temp.path().join("images").join("logo.png"), "png").expect("write");
        assert_eq!(
            config.logo_path(),
            Some(temp.path().join("images").join("logo.png"))
        );

        config.logo_public_path = None;
        assert_eq!(config.logo_path(), None);
    }

    #[test]
    fn test_interface_for_falls_back_to_english() {
        let mut config = ExporterConfig::default();
        let mut en = InterfaceMap::new();
        en.insert("TITLE".to_string(), "Library".into());
        let mut fr = InterfaceMap::new();
        fr.insert("TITLE".to_string(), "Bibliothèque".into());
        config.interface.insert("en".to_string(), en);
        config.interface.insert("fr".to_string(), fr);

        assert_eq!(config.interface_for("fr")["TITLE"], "Bibliothèque");
        assert_eq!(config.interface_for("es")["TITLE"], "Library");
    }

    #[test]
    fn test_interface_values_keep_their_json_types() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            r#"{"interface":{"en":{"TITLE":"Lib","SHOW_TAGS":true,"PAGE_SIZE":20,"MENU":["a","b"],"THEME":{"dark":false}}}}"#,
        )
        .expect("write");

        let config = ExporterConfig::load(&path).expect("load");
        let en = config.interface_for("en");
        assert_eq!(en["TITLE"], "Lib");
        assert_eq!(en["SHOW_TAGS"], true);
        assert_eq!(en["PAGE_SIZE"], 20);
        assert_eq!(en["MENU"], serde_json::json!(["a", "b"]));
        assert_eq!(en["THEME"]["dark"], false);

        config.save(&path).expect("save");
        assert_eq!(ExporterConfig::load(&path).expect("reload"), config);
    }

    #[test]
    fn test_exports_dir() {
        let config = ExporterConfig {
            public_dir: PathBuf::from("/srv/public"),
            ..ExporterConfig::default()
        };
        assert_eq!(config.exports_dir(), PathBuf::from("/srv/public/exports"));
    }
}
