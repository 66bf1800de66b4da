// config.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

use crate::persist::HistoryFormat;

const CONFIG_FILE_NAME: &str = "calcshell.toml";
const ENV_PREFIX: &str = "CALCULATOR_";
const MAX_PRECISION: u32 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
            LogLevel::Critical => "critical",
        }
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            other => Err(format!(
                "'{other}' is not one of debug, info, warning, error, critical"
            )),
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(value: String) -> Result<Self, <LogLevel as TryFrom<String>>::Error> {
        value.parse()
    }
}

/// Validated calculator settings.
///
/// ```toml
/// max_history_size = 100
/// history_file = "history/calculator_history.csv"
/// precision = 6
/// max_input_value = 1e15
/// enable_logging = true
/// log_level = "info"
/// log_file = "logs/calculator.log"
/// enable_auto_save = false
/// enable_undo_redo = true
/// # max_undo_depth = 50
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculatorConfig {
    pub max_history_size: usize,
    pub history_file: PathBuf,
    pub precision: u32,
    pub max_input_value: f64,
    pub enable_logging: bool,
    pub log_level: LogLevel,
    pub log_file: PathBuf,
    pub enable_auto_save: bool,
    pub enable_undo_redo: bool,
    /// Unbounded when unset.
    pub max_undo_depth: Option<usize>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            max_history_size: 100,
            history_file: PathBuf::from("history").join("calculator_history.csv"),
            precision: 6,
            max_input_value: 1e15,
            enable_logging: true,
            log_level: LogLevel::Info,
            log_file: PathBuf::from("logs").join("calculator.log"),
            enable_auto_save: false,
            enable_undo_redo: true,
            max_undo_depth: None,
        }
    }
}

impl CalculatorConfig {
    /// Loads the TOML file (explicit path, else the first default location
    /// that exists), applies `CALCULATOR_*` environment overrides and
    /// validates the result. A missing file means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_paths().into_iter().find(|p| p.exists()),
        };
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// `./calcshell.toml`, then `<config dir>/calcshell/config.toml`.
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("calcshell").join("config.toml"));
        }
        paths
    }

    /// Overrides fields from `CALCULATOR_<FIELD>` variables. `lookup` is the
    /// environment; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| {
            let key = format!("{ENV_PREFIX}{}", field.to_uppercase());
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, v)) = get("max_history_size") {
            self.max_history_size = parse_value(&key, &v)?;
        }
        if let Some((_, v)) = get("history_file") {
            self.history_file = PathBuf::from(v);
        }
        if let Some((key, v)) = get("precision") {
            self.precision = parse_value(&key, &v)?;
        }
        if let Some((key, v)) = get("max_input_value") {
            self.max_input_value = parse_value(&key, &v)?;
        }
        if let Some((key, v)) = get("enable_logging") {
            self.enable_logging = parse_bool(&key, &v)?;
        }
        if let Some((key, v)) = get("log_level") {
            self.log_level = v.parse().map_err(|e: String| ConfigError::invalid(&key, e))?;
        }
        if let Some((_, v)) = get("log_file") {
            self.log_file = PathBuf::from(v);
        }
        if let Some((key, v)) = get("enable_auto_save") {
            self.enable_auto_save = parse_bool(&key, &v)?;
        }
        if let Some((key, v)) = get("enable_undo_redo") {
            self.enable_undo_redo = parse_bool(&key, &v)?;
        }
        if let Some((key, v)) = get("max_undo_depth") {
            self.max_undo_depth = match v.trim() {
                "" | "none" | "unbounded" => None,
                n => Some(parse_value(&key, n)?),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_size == 0 {
            return Err(ConfigError::invalid("max_history_size", "must be at least 1"));
        }
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::invalid(
                "precision",
                format!("must be between 0 and {MAX_PRECISION}"),
            ));
        }
        if !(self.max_input_value.is_finite() && self.max_input_value > 0.0) {
            return Err(ConfigError::invalid(
                "max_input_value",
                "must be a positive finite number",
            ));
        }
        if self.max_undo_depth == Some(0) {
            return Err(ConfigError::invalid(
                "max_undo_depth",
                "must be at least 1 (leave unset for no limit)",
            ));
        }
        if self.history_file.as_os_str().is_empty() {
            return Err(ConfigError::invalid("history_file", "must not be empty"));
        }
        if self.enable_auto_save && HistoryFormat::from_path(&self.history_file).is_none() {
            return Err(ConfigError::invalid(
                "history_file",
                format!(
                    "'{}' needs a .csv, .json or .xlsx extension for auto-save",
                    self.history_file.display()
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CalculatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "max_history_size = {}", self.max_history_size)?;
        writeln!(f, "history_file     = {}", self.history_file.display())?;
        writeln!(f, "precision        = {}", self.precision)?;
        writeln!(f, "max_input_value  = {:e}", self.max_input_value)?;
        writeln!(f, "enable_logging   = {}", self.enable_logging)?;
        writeln!(f, "log_level        = {}", self.log_level)?;
        writeln!(f, "log_file         = {}", self.log_file.display())?;
        writeln!(f, "enable_auto_save = {}", self.enable_auto_save)?;
        writeln!(f, "enable_undo_redo = {}", self.enable_undo_redo)?;
        match self.max_undo_depth {
            Some(depth) => write!(f, "max_undo_depth   = {depth}"),
            None => write!(f, "max_undo_depth   = unbounded"),
        }
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, format!("'{value}': {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        other => Err(ConfigError::invalid(key, format!("'{other}' is not a boolean"))),
    }
}
