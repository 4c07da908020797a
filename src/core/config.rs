//! Environment and file based configuration.
//!
//! `MonitorConfig` is the immutable snapshot the monitor runs against; a
//! restart builds a fresh one and swaps it in. Telegram credentials live in
//! `TelegramSettings` and are only read at startup.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::core::messages::MessageCatalog;
use crate::error::{PagewatchError, Result};

pub const DEFAULT_PAGES_CONFIG: &str = "pages_config.json";
pub const DEFAULT_MESSAGES_CONFIG: &str = "messages.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// A page to watch: its path below the base URL and the class to count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDescriptor {
    pub id: String,
    pub selector: String,
}

/// Where configuration is read from
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// `.env` file to load before reading the environment. `None` means the
    /// default lookup (`.env` in the working directory, if present).
    pub env_file: Option<PathBuf>,
    /// Overrides `PAGES_CONFIG`
    pub pages_path: Option<PathBuf>,
    /// Overrides `MESSAGES_CONFIG`
    pub messages_path: Option<PathBuf>,
}

impl ConfigSources {
    /// Load the `.env` file into the process environment.
    ///
    /// A missing default `.env` is fine; a missing explicit one is an error.
    pub fn load_env_file(&self) -> Result<()> {
        match &self.env_file {
            Some(path) => {
                dotenvy::from_path_override(path).map_err(|e| {
                    PagewatchError::config(format!(
                        "Failed to load env file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
            None => match dotenvy::dotenv_override() {
                Ok(path) => log::debug!("Loaded environment from {}", path.display()),
                Err(e) if e.not_found() => log::debug!("No .env file found, using process environment"),
                Err(e) => {
                    return Err(PagewatchError::config(format!(
                        "Failed to load .env file: {}",
                        e
                    )))
                }
            },
        }
        Ok(())
    }

    /// Read the `.env` file into a map without touching the process environment.
    ///
    /// Same lookup rules as [`load_env_file`](Self::load_env_file).
    pub fn read_env_file(&self) -> Result<HashMap<String, String>> {
        let entries = match &self.env_file {
            Some(path) => dotenvy::from_path_iter(path).map_err(|e| {
                PagewatchError::config(format!(
                    "Failed to load env file {}: {}",
                    path.display(),
                    e
                ))
            })?,
            None => match dotenvy::from_filename_iter(".env") {
                Ok(entries) => entries,
                Err(e) if e.not_found() => return Ok(HashMap::new()),
                Err(e) => {
                    return Err(PagewatchError::config(format!(
                        "Failed to load .env file: {}",
                        e
                    )))
                }
            },
        };

        entries
            .map(|entry| {
                entry.map_err(|e| PagewatchError::config(format!("Invalid env file entry: {}", e)))
            })
            .collect()
    }

    /// Settings from the `.env` file layered over the process environment.
    pub fn env_settings(&self) -> Result<EnvSettings> {
        let file = self.read_env_file()?;
        EnvSettings::from_lookup(|key| {
            file.get(key)
                .cloned()
                .or_else(|| std::env::var(key).ok())
        })
    }
}

/// Values read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSettings {
    pub base_url: String,
    pub interval: Duration,
    pub language: String,
    pub token: String,
    pub chat_id: i64,
    pub pages_path: PathBuf,
    pub messages_path: PathBuf,
    pub request_timeout: Duration,
}

impl EnvSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse settings through `lookup` so callers decide where values come from.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PagewatchError::config(format!("{} is not set", key)))
        };

        let base_url = required("BASE_URL")?;
        Url::parse(&base_url)
            .map_err(|e| PagewatchError::config(format!("BASE_URL is not a valid URL: {}", e)))?;

        let interval = parse_positive_secs("DELAY", &required("DELAY")?)?;

        let chat_id_raw = required("CHAT_ID")?;
        let chat_id = chat_id_raw.parse::<i64>().map_err(|_| {
            PagewatchError::config(format!("CHAT_ID must be an integer, got '{}'", chat_id_raw))
        })?;

        let request_timeout = match lookup("REQUEST_TIMEOUT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_positive_secs("REQUEST_TIMEOUT", raw.trim())?,
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            base_url,
            interval,
            language: required("LANGUAGE")?,
            token: required("TOKEN")?,
            chat_id,
            pages_path: lookup("PAGES_CONFIG")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PAGES_CONFIG)),
            messages_path: lookup("MESSAGES_CONFIG")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MESSAGES_CONFIG)),
            request_timeout,
        })
    }
}

fn parse_positive_secs(key: &str, raw: &str) -> Result<Duration> {
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(PagewatchError::config(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, raw
        ))),
    }
}

/// Read the pages file: a JSON object mapping page path to class token.
pub fn load_pages(path: &Path) -> Result<Vec<PageDescriptor>> {
    let data = fs::read_to_string(path).map_err(|e| {
        PagewatchError::config(format!(
            "Failed to read pages file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_pages(&data).map_err(|e| {
        PagewatchError::config(format!(
            "Invalid pages file {}: {}",
            path.display(),
            e
        ))
    })
}

pub fn parse_pages(data: &str) -> Result<Vec<PageDescriptor>> {
    let pages: BTreeMap<String, String> = serde_json::from_str(data)?;
    if pages.is_empty() {
        return Err(PagewatchError::config("no pages configured"));
    }

    Ok(pages
        .into_iter()
        .map(|(id, selector)| PageDescriptor { id, selector })
        .collect())
}

/// Settings the monitor loop runs against
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub base_url: String,
    pub pages: Vec<PageDescriptor>,
    pub interval: Duration,
    pub language: String,
    pub messages: MessageCatalog,
}

impl MonitorConfig {
    /// Assemble and validate a config from parsed parts.
    pub fn new(
        base_url: String,
        pages: Vec<PageDescriptor>,
        interval: Duration,
        language: String,
        messages: MessageCatalog,
    ) -> Result<Self> {
        if pages.is_empty() {
            return Err(PagewatchError::config("no pages configured"));
        }
        if interval.is_zero() {
            return Err(PagewatchError::config("polling interval must be positive"));
        }
        if !messages.has_locale(&language) {
            return Err(PagewatchError::config(format!(
                "language '{}' not found in messages (available: {})",
                language,
                messages.locales().join(", ")
            )));
        }

        Ok(Self {
            base_url,
            pages,
            interval,
            language,
            messages,
        })
    }

    pub fn from_env_settings(settings: &EnvSettings) -> Result<Self> {
        let pages = load_pages(&settings.pages_path)?;
        let messages = MessageCatalog::load(&settings.messages_path)?;
        Self::new(
            settings.base_url.clone(),
            pages,
            settings.interval,
            settings.language.clone(),
            messages,
        )
    }

    pub fn page_url(&self, page: &PageDescriptor) -> String {
        format!("{}{}", self.base_url, page.id)
    }
}

/// Telegram credentials, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramSettings {
    pub token: String,
    pub chat_id: i64,
}

/// Everything needed to start the service
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub monitor: MonitorConfig,
    pub telegram: TelegramSettings,
    pub request_timeout: Duration,
}

impl LoadedConfig {
    /// Load `.env` into the process environment, then read the environment
    /// and the JSON files. Only call this before any other thread is running.
    pub fn load(sources: &ConfigSources) -> Result<Self> {
        sources.load_env_file()?;
        Self::from_settings(sources, EnvSettings::from_env()?)
    }

    /// Re-read every source for a restart. The process environment is only
    /// read, never written.
    pub fn reload(sources: &ConfigSources) -> Result<Self> {
        Self::from_settings(sources, sources.env_settings()?)
    }

    fn from_settings(sources: &ConfigSources, mut settings: EnvSettings) -> Result<Self> {
        if let Some(path) = &sources.pages_path {
            settings.pages_path = path.clone();
        }
        if let Some(path) = &sources.messages_path {
            settings.messages_path = path.clone();
        }

        let monitor = MonitorConfig::from_env_settings(&settings)?;
        Ok(Self {
            monitor,
            telegram: TelegramSettings {
                token: settings.token,
                chat_id: settings.chat_id,
            },
            request_timeout: settings.request_timeout,
        })
    }
}
