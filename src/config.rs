//! Configuration file loading.
//!
//! ```toml
//! [api]
//! url = "https://paperless.example.com/api"
//! token = "..."
//! auth_scheme = "Token"      # optional
//!
//! [export]
//! directory = "/srv/paperless-export"
//! currency_locale = "de_DE"  # optional
//!
//! [log]
//! directory = "/var/log/tag-exporter"  # optional, defaults to the export directory
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tag_exporter_core::CurrencyLocale;
use tag_exporter_core::api::{CONNECT_TIMEOUT_SECS, DEFAULT_AUTH_SCHEME, READ_TIMEOUT_SECS};
use url::Url;

use crate::cli::Args;

/// File names looked up in the working directory, in order.
pub const LOCAL_CONFIG_NAMES: &[&str] = &["tag-exporter.local.toml", "tag-exporter.toml"];

/// The config file as written on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api: ApiSection,
    pub export: ExportSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    pub url: String,
    pub token: String,
    #[serde(default)]
    pub auth_scheme: Option<String>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub read_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSection {
    pub directory: PathBuf,
    #[serde(default)]
    pub currency_locale: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Validated settings of one run, file values merged with CLI overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub token: String,
    pub auth_scheme: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
    pub currency_locale: CurrencyLocale,
    /// The file the settings were read from.
    pub source: PathBuf,
}

impl FileConfig {
    /// Parses a config file's content.
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid config syntax")
    }

    /// Validates values that TOML typing cannot express.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(self.api.url.trim())
            .with_context(|| format!("Invalid config value for `api.url`: '{}'", self.api.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "Invalid config value for `api.url`: '{}'. Expected an http(s) URL",
                self.api.url
            );
        }
        if self.api.token.trim().is_empty() {
            bail!("Invalid config value for `api.token`: must not be empty");
        }
        if let Some(scheme) = &self.api.auth_scheme
            && scheme.trim().is_empty()
        {
            bail!("Invalid config value for `api.auth_scheme`: must not be empty");
        }
        validate_timeout_secs("api.connect_timeout_secs", self.api.connect_timeout_secs)?;
        validate_timeout_secs("api.read_timeout_secs", self.api.read_timeout_secs)?;
        self.currency_locale()?;
        Ok(())
    }

    fn currency_locale(&self) -> Result<CurrencyLocale> {
        match &self.export.currency_locale {
            Some(tag) => tag
                .parse()
                .with_context(|| "Invalid config value for `export.currency_locale`"),
            None => Ok(CurrencyLocale::default()),
        }
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Resolves the user-level config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/tag-exporter/config.toml`
/// 2. `$HOME/.config/tag-exporter/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("tag-exporter")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("tag-exporter")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Finds the config file: explicit path, then `working_dir` candidates, then
/// the user-level default. Only existing files are returned, except for an
/// explicit path, which is returned as given.
#[must_use]
pub fn find_config_path(
    explicit: Option<&Path>,
    working_dir: &Path,
    user_default: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    LOCAL_CONFIG_NAMES
        .iter()
        .map(|name| working_dir.join(name))
        .chain(user_default)
        .find(|path| path.is_file())
}

/// Reads and validates a config file.
pub fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    let config = FileConfig::parse(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file '{}'", path.display()))?;
    Ok(config)
}

/// Loads the config for this run and applies the CLI overrides.
pub fn load_settings(args: &Args) -> Result<Settings> {
    let working_dir = env::current_dir().context("Failed to determine working directory")?;
    let Some(path) = find_config_path(
        args.config.as_deref(),
        &working_dir,
        resolve_default_config_path(),
    ) else {
        bail!(
            "No config file found. Pass --config or create {} in the working directory",
            LOCAL_CONFIG_NAMES.join(" or ")
        );
    };
    let config = load_file_config(&path)?;
    settings_from(config, args, path)
}

/// Merges a validated file config with CLI overrides.
pub fn settings_from(config: FileConfig, args: &Args, source: PathBuf) -> Result<Settings> {
    let currency_locale = config.currency_locale()?;
    let export_dir = args
        .export_dir
        .clone()
        .unwrap_or(config.export.directory);
    if !export_dir.is_dir() {
        bail!("Export directory '{}' does not exist", export_dir.display());
    }
    let log_dir = args
        .log_dir
        .clone()
        .or(config.log.directory)
        .unwrap_or_else(|| export_dir.clone());

    Ok(Settings {
        api_url: config.api.url.trim().to_string(),
        token: config.api.token.trim().to_string(),
        auth_scheme: config
            .api
            .auth_scheme
            .unwrap_or_else(|| DEFAULT_AUTH_SCHEME.to_string()),
        connect_timeout_secs: config.api.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: config.api.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
        export_dir,
        log_dir,
        currency_locale,
        source,
    })
}
