use crate::calendar::WeekMode;
use crate::session::SessionSettings;
use crate::store::{HttpStore, RemoteStore, SqliteStore};
use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = ".attendance-tracker";
const CONFIG_FILE: &str = "config.json";
pub const REMOTE_API_KEY_ENV: &str = "ATTENDANCE_REMOTE_API_KEY";
const MIN_REMOTE_TIMEOUT_SECONDS: u64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Http,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Sqlite => write!(f, "sqlite"),
            StoreKind::Http => write!(f, "http"),
        }
    }
}

impl FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "local" => Ok(StoreKind::Sqlite),
            "http" | "remote" => Ok(StoreKind::Http),
            other => bail!("store must be sqlite or http, got: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub user_id: Option<String>,
    pub db_path: PathBuf,
    pub report_dir: PathBuf,
    pub api_port: u16,
    pub week_mode: WeekMode,
    pub store: StoreKind,
    pub remote_base_url: Option<String>,
    pub remote_api_key: Option<String>,
    pub remote_timeout_seconds: u64,
    pub extra_lectures: bool,
    pub seed_default_timetable: bool,
}

impl Default for Config {
    fn default() -> Self {
        let root = default_root_dir();

        Self {
            user_id: None,
            db_path: root.join("db").join("attendance.db"),
            report_dir: default_report_dir(),
            api_port: 7891,
            week_mode: WeekMode::Five,
            store: StoreKind::Sqlite,
            remote_base_url: None,
            remote_api_key: None,
            remote_timeout_seconds: 20,
            extra_lectures: true,
            seed_default_timetable: true,
        }
    }
}

impl Config {
    pub fn root_dir() -> Result<PathBuf> {
        Ok(default_root_dir())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(default_root_dir().join(CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.remote_timeout_seconds = config
            .remote_timeout_seconds
            .max(MIN_REMOTE_TIMEOUT_SECONDS);

        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        set_mode_600(config_path)?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir()?;
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        fs::create_dir_all(&self.report_dir).with_context(|| {
            format!(
                "Failed to create report directory: {}",
                self.report_dir.display()
            )
        })?;

        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            week_mode: self.week_mode,
            extra_lectures: self.extra_lectures,
        }
    }

    pub fn remote_api_key(&self) -> Option<String> {
        env::var(REMOTE_API_KEY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| self.remote_api_key.clone())
    }

    pub fn build_store(&self) -> Result<Box<dyn RemoteStore>> {
        match self.store {
            StoreKind::Sqlite => Ok(Box::new(SqliteStore::open(&self.db_path)?)),
            StoreKind::Http => {
                let base_url = self.remote_base_url.as_deref().ok_or_else(|| {
                    anyhow!(
                        "store is http but remote.base_url is not set. Run `attendance config set remote.base_url <URL>`"
                    )
                })?;

                Ok(Box::new(HttpStore::new(
                    base_url,
                    self.remote_api_key(),
                    self.remote_timeout_seconds,
                )?))
            }
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let normalized = normalize_config_key(key);

        match normalized {
            "user_id" => {
                self.user_id = non_empty(value);
            }
            "db_path" => {
                self.db_path = expand_home(value);
            }
            "report_dir" => {
                self.report_dir = expand_home(value);
            }
            "api_port" => {
                self.api_port = value
                    .parse::<u16>()
                    .map_err(|_| anyhow!("api_port must be a number"))?;
            }
            "week_mode" => {
                self.week_mode = value.parse::<WeekMode>().map_err(|error| anyhow!("{error}"))?;
            }
            "store" => {
                self.store = value.parse::<StoreKind>()?;
            }
            "remote_base_url" => {
                self.remote_base_url = non_empty(value.trim().trim_end_matches('/'));
            }
            "remote_api_key" => {
                self.remote_api_key = non_empty(value);
            }
            "remote_timeout_seconds" => {
                self.remote_timeout_seconds = value
                    .parse::<u64>()
                    .map_err(|_| anyhow!("remote_timeout_seconds must be a number"))?
                    .max(MIN_REMOTE_TIMEOUT_SECONDS);
            }
            "extra_lectures" => {
                self.extra_lectures = value
                    .parse::<bool>()
                    .map_err(|_| anyhow!("extra_lectures must be true/false"))?;
            }
            "seed_default_timetable" => {
                self.seed_default_timetable = value
                    .parse::<bool>()
                    .map_err(|_| anyhow!("seed_default_timetable must be true/false"))?;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: user_id|user.id, db_path|db.path, report_dir|report.dir, api_port|api.port, week_mode|week.mode, store, remote_base_url|remote.base_url, remote_api_key|remote.api_key, remote_timeout_seconds|remote.timeout_seconds, extra_lectures|lectures.extra, seed_default_timetable|timetable.seed_default"
                );
            }
        }

        if normalized == "report_dir" {
            fs::create_dir_all(&self.report_dir).with_context(|| {
                format!(
                    "Failed to create report directory: {}",
                    self.report_dir.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match normalize_config_key(key) {
            "user_id" => Some(
                self.user_id
                    .clone()
                    .unwrap_or_else(|| "not_set".to_string()),
            ),
            "db_path" => Some(self.db_path.display().to_string()),
            "report_dir" => Some(self.report_dir.display().to_string()),
            "api_port" => Some(self.api_port.to_string()),
            "week_mode" => Some(self.week_mode.to_string()),
            "store" => Some(self.store.to_string()),
            "remote_base_url" => Some(
                self.remote_base_url
                    .clone()
                    .unwrap_or_else(|| "not_set".to_string()),
            ),
            "remote_api_key" => Some(
                self.remote_api_key
                    .as_ref()
                    .map(|_| "***set***".to_string())
                    .unwrap_or_else(|| "not_set".to_string()),
            ),
            "remote_timeout_seconds" => Some(self.remote_timeout_seconds.to_string()),
            "extra_lectures" => Some(self.extra_lectures.to_string()),
            "seed_default_timetable" => Some(self.seed_default_timetable.to_string()),
            _ => None,
        }
    }
}

fn normalize_config_key(key: &str) -> &str {
    match key {
        "user_id" | "user.id" => "user_id",
        "db_path" | "db.path" => "db_path",
        "report_dir" | "report.dir" => "report_dir",
        "api_port" | "api.port" => "api_port",
        "week_mode" | "week.mode" => "week_mode",
        "store" | "store.kind" => "store",
        "remote_base_url" | "remote.base_url" => "remote_base_url",
        "remote_api_key" | "remote.api_key" => "remote_api_key",
        "remote_timeout_seconds" | "remote.timeout_seconds" => "remote_timeout_seconds",
        "extra_lectures" | "lectures.extra" => "extra_lectures",
        "seed_default_timetable" | "timetable.seed_default" => "seed_default_timetable",
        _ => key,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|stripped| home_dir().map(|home| home.join(stripped)))
        .unwrap_or_else(|| PathBuf::from(raw))
}

pub fn default_report_dir() -> PathBuf {
    default_root_dir().join("reports")
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn set_mode_600(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set file permissions: {}", path.display()))?;
    }

    Ok(())
}
