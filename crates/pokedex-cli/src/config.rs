// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use pokedex_app::{
    BattleTiming, DEFAULT_CAPTURE_PROBABILITY, DEFAULT_CATALOG_SIZE, DEFAULT_LEAVE_DELAY,
    DEFAULT_PAGE_SIZE, DEFAULT_THROW_DURATION,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_CATALOG_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub battle: Battle,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            catalog: Catalog::default(),
            battle: Battle::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub page_size: Option<usize>,
    pub total_entries: Option<usize>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            base_url: Some(pokedex_api::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_CATALOG_TIMEOUT.to_owned()),
            page_size: Some(DEFAULT_PAGE_SIZE),
            total_entries: Some(DEFAULT_CATALOG_SIZE),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Battle {
    pub capture_chance: Option<f64>,
    pub throw_duration: Option<String>,
    pub leave_delay: Option<String>,
    pub seed: Option<u64>,
}

impl Default for Battle {
    fn default() -> Self {
        Self {
            capture_chance: Some(DEFAULT_CAPTURE_PROBABILITY),
            throw_duration: Some(format!("{}ms", DEFAULT_THROW_DURATION.as_millis())),
            leave_delay: Some(format!("{}ms", DEFAULT_LEAVE_DELAY.as_millis())),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("POKEDEX_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set POKEDEX_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(pokedex_db::APP_NAME);
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
                    "config file {} has no version. Add `version = 1` and put values under [storage], [catalog], [battle], and [log]",
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
        if let Some(db_path) = &self.storage.db_path {
            pokedex_db::validate_db_path(db_path)?;
        }

        if let Some(timeout) = &self.catalog.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "catalog.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if self.catalog.page_size == Some(0) {
            bail!("catalog.page_size in {} must be positive", path.display());
        }
        if self.catalog.total_entries == Some(0) {
            bail!(
                "catalog.total_entries in {} must be positive",
                path.display()
            );
        }

        if let Some(chance) = self.battle.capture_chance
            && !(0.0..=1.0).contains(&chance)
        {
            bail!(
                "battle.capture_chance in {} must be between 0.0 and 1.0, got {}",
                path.display(),
                chance
            );
        }
        if let Some(raw) = &self.battle.throw_duration {
            parse_duration(raw)
                .with_context(|| format!("battle.throw_duration in {}", path.display()))?;
        }
        if let Some(raw) = &self.battle.leave_delay {
            parse_duration(raw)
                .with_context(|| format!("battle.leave_delay in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).with_context(|| {
                format!(
                    "log.level {level:?} in {} is not a valid filter (try \"info\" or \"pokedex_db=debug\")",
                    path.display()
                )
            })?;
        }

        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => pokedex_db::default_db_path(),
        }
    }

    pub fn catalog_base_url(&self) -> &str {
        self.catalog
            .base_url
            .as_deref()
            .unwrap_or(pokedex_api::DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn catalog_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.catalog
                .timeout
                .as_deref()
                .unwrap_or(DEFAULT_CATALOG_TIMEOUT),
        )
    }

    pub fn page_size(&self) -> usize {
        self.catalog.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn total_entries(&self) -> usize {
        self.catalog.total_entries.unwrap_or(DEFAULT_CATALOG_SIZE)
    }

    pub fn capture_chance(&self) -> f64 {
        self.battle
            .capture_chance
            .unwrap_or(DEFAULT_CAPTURE_PROBABILITY)
    }

    pub fn battle_timing(&self) -> Result<BattleTiming> {
        let throw_duration = match &self.battle.throw_duration {
            Some(raw) => parse_duration(raw)?,
            None => DEFAULT_THROW_DURATION,
        };
        let leave_delay = match &self.battle.leave_delay {
            Some(raw) => parse_duration(raw)?,
            None => DEFAULT_LEAVE_DELAY,
        };
        Ok(BattleTiming {
            throw_duration,
            leave_delay,
        })
    }

    pub fn battle_seed(&self) -> Option<u64> {
        self.battle.seed
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match &self.log.file {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(pokedex_db::data_dir()?.join("pokedex.log")),
        }
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# pokedex config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/pokedex/pokedex.db)\n# db_path = \"/absolute/path/to/pokedex.db\"\n\n[catalog]\nbase_url = \"{}\"\ntimeout = \"{}\"\npage_size = {}\ntotal_entries = {}\n\n[battle]\ncapture_chance = {:.1}\nthrow_duration = \"{}ms\"\nleave_delay = \"{}ms\"\n# Optional. Fixes the capture rolls for reproducible sessions.\n# seed = 42\n\n[log]\n# Overridden by POKEDEX_LOG when set.\nlevel = \"{}\"\n# file = \"/absolute/path/to/pokedex.log\"\n",
            path.display(),
            pokedex_api::DEFAULT_BASE_URL,
            DEFAULT_CATALOG_TIMEOUT,
            DEFAULT_PAGE_SIZE,
            DEFAULT_CATALOG_SIZE,
            DEFAULT_CAPTURE_PROBABILITY,
            DEFAULT_THROW_DURATION.as_millis(),
            DEFAULT_LEAVE_DELAY.as_millis(),
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 5s)")
}
