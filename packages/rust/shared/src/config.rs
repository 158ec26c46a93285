//! Application configuration for BurgerWatch.
//!
//! User config lives at `~/.burgerwatch/burgerwatch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{BurgerWatchError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "burgerwatch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".burgerwatch";

/// Default database file name inside the config directory.
const DB_FILE_NAME: &str = "burgerwatch.db";

// ---------------------------------------------------------------------------
// Config structs (matching burgerwatch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub browser: BrowserSection,

    #[serde(default)]
    pub crawl: CrawlSection,

    #[serde(default)]
    pub schedule: ScheduleSection,

    #[serde(default)]
    pub persist: PersistSection,
}

/// `[database]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file. Defaults to `~/.burgerwatch/burgerwatch.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `[browser]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSection {
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Explicit browser executable. Resolved automatically when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,

    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout_secs: u64,

    /// Upper bound for element lookups that wait for the DOM to settle.
    #[serde(default = "default_implicit_wait")]
    pub implicit_wait_secs: u64,

    /// Pool of user agents; one is picked at random per session.
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            page_load_timeout_secs: default_page_load_timeout(),
            implicit_wait_secs: default_implicit_wait(),
            user_agents: default_user_agents(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_page_load_timeout() -> u64 {
    10
}
fn default_implicit_wait() -> u64 {
    3
}
fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36".into(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/128.0.0.0 Safari/537.36".into(),
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36".into(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36 Edg/129.0.0.0".into(),
    ]
}

/// `[crawl]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSection {
    /// Politeness delay between brands in a sweep.
    #[serde(default = "default_request_delay")]
    pub request_delay_secs: u64,

    /// Whether adapters visit per-product detail pages for nutrition facts.
    #[serde(default = "default_true")]
    pub visit_detail_pages: bool,

    /// Names containing any of these are bundle/derived products and are dropped.
    #[serde(default = "default_exclusion_keywords")]
    pub exclusion_keywords: Vec<String>,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            request_delay_secs: default_request_delay(),
            visit_detail_pages: true,
            exclusion_keywords: default_exclusion_keywords(),
        }
    }
}

fn default_request_delay() -> u64 {
    1
}
fn default_exclusion_keywords() -> Vec<String> {
    ["세트", "콤보", "더블", "팩", "set", "combo", "double", "pack"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Recurring sweep interval.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u64,

    /// Fixed local wall-clock times (`HH:MM`) for daily sweeps.
    #[serde(default = "default_daily_at")]
    pub daily_at: Vec<String>,

    /// How often the scheduler loop re-checks pending jobs.
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            interval_hours: default_interval_hours(),
            daily_at: default_daily_at(),
            tick_secs: default_tick(),
        }
    }
}

fn default_interval_hours() -> u64 {
    6
}
fn default_daily_at() -> Vec<String> {
    vec!["09:00".into(), "18:00".into()]
}
fn default_tick() -> u64 {
    60
}

/// Whether new items need operator confirmation before they are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Ask an operator for each new item.
    #[default]
    Confirm,
    /// Insert every new item unconditionally.
    Auto,
}

/// `[persist]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistSection {
    /// Mode for operator-initiated single-brand runs. Scheduled sweeps are always `auto`.
    #[serde(default)]
    pub mode: PersistMode,
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime browser session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub executable: Option<PathBuf>,
    pub page_load_timeout: Duration,
    pub implicit_wait: Duration,
    /// Interval between DOM snapshots while waiting for an element.
    pub poll_interval: Duration,
    pub user_agents: Vec<String>,
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            headless: config.browser.headless,
            executable: config.browser.executable.as_deref().map(expand_home),
            page_load_timeout: Duration::from_secs(config.browser.page_load_timeout_secs),
            implicit_wait: Duration::from_secs(config.browser.implicit_wait_secs),
            poll_interval: Duration::from_millis(250),
            user_agents: config.browser.user_agents.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runtime crawl configuration shared by all adapters.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub visit_detail_pages: bool,
    pub exclusion_keywords: Vec<String>,
    /// Delay between brands during a sweep.
    pub brand_delay: Duration,
}

impl From<&AppConfig> for CrawlConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            visit_detail_pages: config.crawl.visit_detail_pages,
            exclusion_keywords: config.crawl.exclusion_keywords.clone(),
            brand_delay: Duration::from_secs(config.crawl.request_delay_secs),
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

/// Runtime sweep schedule configuration.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub interval: Duration,
    pub daily_at: Vec<NaiveTime>,
    pub tick: Duration,
}

impl TryFrom<&AppConfig> for ScheduleConfig {
    type Error = BurgerWatchError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let section = &config.schedule;
        if section.interval_hours == 0 {
            return Err(BurgerWatchError::config(
                "schedule.interval_hours must be greater than zero",
            ));
        }

        let daily_at = section
            .daily_at
            .iter()
            .map(|s| {
                NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| {
                    BurgerWatchError::config(format!("invalid schedule.daily_at entry '{s}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let interval_secs = section
            .interval_hours
            .checked_mul(3600)
            .ok_or_else(|| BurgerWatchError::config("schedule.interval_hours is too large"))?;

        Ok(Self {
            interval: Duration::from_secs(interval_secs),
            daily_at,
            tick: Duration::from_secs(section.tick_secs.max(1)),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.burgerwatch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BurgerWatchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.burgerwatch/burgerwatch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve the database path: configured value, or the default under the config dir.
pub fn database_path(config: &AppConfig) -> Result<PathBuf> {
    match config.database.path.as_deref() {
        Some(p) => Ok(expand_home(p)),
        None => Ok(config_dir()?.join(DB_FILE_NAME)),
    }
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BurgerWatchError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BurgerWatchError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BurgerWatchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BurgerWatchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BurgerWatchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
