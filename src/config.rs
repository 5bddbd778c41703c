use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub(crate) const DEFAULT_LOG_LEVEL: &str = "warn";
pub(crate) const DEFAULT_RECENT_EXPENSES: u32 = 5;
pub(crate) const DEFAULT_DASHBOARD_GOALS: usize = 3;

/// `config.toml` as written by the user. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    user: Option<String>,
    database: Option<PathBuf>,
    log_level: Option<String>,
    recent_expenses: Option<u32>,
    dashboard_goals: Option<usize>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Overrides {
    pub(crate) user: Option<String>,
    pub(crate) database: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Config {
    /// Owner of every record read or written in this session.
    pub(crate) user: String,
    pub(crate) database: PathBuf,
    pub(crate) log_level: String,
    pub(crate) recent_expenses: u32,
    pub(crate) dashboard_goals: usize,
    pub(crate) data_dir: PathBuf,
}

impl Config {
    /// Read `<config_dir>/config.toml` when present and apply `overrides`.
    pub(crate) fn load(overrides: Overrides) -> Result<Self> {
        let dirs = directories::ProjectDirs::from("com", "cashcraft", "cashcraft")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let data_dir = dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir).with_context(|| {
            format!("Failed to create data directory: {}", data_dir.display())
        })?;

        let path = dirs.config_dir().join("config.toml");
        let content = if path.exists() {
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?
        } else {
            String::new()
        };

        let config = Self::parse(&content, data_dir, std::env::var("USER").ok(), overrides)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        if let Some(parent) = config.database.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }
        Ok(config)
    }

    fn parse(
        content: &str,
        data_dir: PathBuf,
        env_user: Option<String>,
        overrides: Overrides,
    ) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content).context("Failed to parse TOML")?;

        let user = overrides
            .user
            .or(raw.user)
            .or(env_user)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "default".into());
        let database = overrides
            .database
            .or(raw.database)
            .map(|p| expand_home(&p))
            .unwrap_or_else(|| data_dir.join("cashcraft.db"));

        Ok(Self {
            user,
            database,
            log_level: raw.log_level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.into()),
            recent_expenses: raw.recent_expenses.unwrap_or(DEFAULT_RECENT_EXPENSES),
            dashboard_goals: raw.dashboard_goals.unwrap_or(DEFAULT_DASHBOARD_GOALS),
            data_dir,
        })
    }

    pub(crate) fn log_file(&self) -> PathBuf {
        self.data_dir.join("cashcraft.log")
    }
}

/// Pull `--user <id>` and `--db <path>` out of `args`, wherever they appear.
/// Returns the overrides and the remaining arguments in order.
pub(crate) fn split_global_flags(args: &[String]) -> Result<(Overrides, Vec<String>)> {
    let mut overrides = Overrides::default();
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--user" => {
                let value = iter.next().context("--user needs a value")?;
                overrides.user = Some(value.clone());
            }
            "--db" => {
                let value = iter.next().context("--db needs a path")?;
                overrides.database = Some(PathBuf::from(value));
            }
            _ => rest.push(arg.clone()),
        }
    }

    Ok((overrides, rest))
}

pub(crate) fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => directories::UserDirs::new()
            .map(|d| d.home_dir().join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
