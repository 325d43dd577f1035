// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use orgdesk_app::{DEFAULT_MAX_KNOWN, DEFAULT_THRESHOLD, ROWS_PER_PAGE_OPTIONS, Route, TabKind};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "orgdesk";

const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub visitors: Visitors,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            visitors: Visitors::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(orgdesk_api::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub rows_per_page: Option<usize>,
    pub start_tab: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            rows_per_page: Some(orgdesk_app::DEFAULT_ROWS_PER_PAGE),
            start_tab: Some("company".to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Visitors {
    pub feed_path: Option<String>,
    pub threshold: Option<f32>,
    pub max_known: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub file: Option<String>,
    pub level: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("ORGDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set ORGDESK_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [api], [ui], [visitors] and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(rows) = self.ui.rows_per_page
            && !ROWS_PER_PAGE_OPTIONS.contains(&rows)
        {
            bail!(
                "ui.rows_per_page in {} must be one of {:?}, got {}",
                path.display(),
                ROWS_PER_PAGE_OPTIONS,
                rows
            );
        }

        if let Some(tab) = &self.ui.start_tab
            && TabKind::parse(tab).is_none()
        {
            bail!(
                "ui.start_tab in {} must name an entity or \"visitors\", got {:?}",
                path.display(),
                tab
            );
        }

        if let Some(threshold) = self.visitors.threshold
            && !(threshold.is_finite() && threshold > 0.0)
        {
            bail!(
                "visitors.threshold in {} must be a positive number, got {}",
                path.display(),
                threshold
            );
        }

        if self.visitors.max_known == Some(0) {
            bail!(
                "visitors.max_known in {} must be at least 1",
                path.display()
            );
        }

        Ok(())
    }

    /// `ORGDESK_API_URL` wins over the file so a single run can point
    /// elsewhere.
    pub fn api_base_url(&self) -> String {
        if let Ok(url) = env::var("ORGDESK_API_URL")
            && !url.trim().is_empty()
        {
            return url.trim().trim_end_matches('/').to_owned();
        }
        self.api
            .base_url
            .as_deref()
            .unwrap_or(orgdesk_api::DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_owned()
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn rows_per_page(&self) -> usize {
        self.ui
            .rows_per_page
            .unwrap_or(orgdesk_app::DEFAULT_ROWS_PER_PAGE)
    }

    pub fn start_route(&self) -> Route {
        self.ui
            .start_tab
            .as_deref()
            .and_then(TabKind::parse)
            .map_or(Route::HOME, TabKind::route)
    }

    pub fn feed_path(&self) -> Option<PathBuf> {
        self.visitors.feed_path.as_deref().map(PathBuf::from)
    }

    pub fn visitor_threshold(&self) -> f32 {
        self.visitors.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn visitor_max_known(&self) -> usize {
        self.visitors.max_known.unwrap_or(DEFAULT_MAX_KNOWN)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join(format!("{APP_NAME}.log"))),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# orgdesk config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[ui]\n# One of 5, 10, 25\nrows_per_page = {}\n# company, branch, department, employee, role, user or visitors\nstart_tab = \"company\"\n\n[visitors]\n# JSON-lines file: one array of face descriptors per frame\n# feed_path = \"/absolute/path/to/descriptors.jsonl\"\nthreshold = {}\nmax_known = {}\n\n[log]\n# Optional. Default is the platform data dir (for example ~/.local/share/orgdesk/orgdesk.log)\n# file = \"/absolute/path/to/orgdesk.log\"\nlevel = \"{}\"\n",
            path.display(),
            orgdesk_api::DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            orgdesk_app::DEFAULT_ROWS_PER_PAGE,
            DEFAULT_THRESHOLD,
            DEFAULT_MAX_KNOWN,
            DEFAULT_LOG_LEVEL,
        )
    }
}

/// Platform data directory for the session file and the log.
pub fn data_dir() -> Result<PathBuf> {
    let root = dirs::data_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set ORGDESK_SESSION_PATH and [log].file")
    })?;
    Ok(root.join(APP_NAME))
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("timeout {raw:?} is too large; use a smaller value"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
