// logging.rs

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{CalculatorConfig, LogLevel};

/// Installs the global subscriber. Output only ever goes to the log file so
/// the REPL stays clean; when logging is disabled or the file cannot be
/// opened nothing is installed. Returns the reasons a file could not be used.
pub fn init(config: &CalculatorConfig, level_override: Option<LogLevel>) -> Vec<String> {
    if !config.enable_logging {
        return Vec::new();
    }
    let level = level_override.unwrap_or(config.log_level);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.level_filter().into()));

    match open_log_file(&config.log_file) {
        Ok(file) => {
            let installed = tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .try_init();
            if installed.is_ok() {
                tracing::info!(path = %config.log_file.display(), %level, "Logging initialized");
            }
            Vec::new()
        }
        Err(e) => vec![format!(
            "Failed to open log file {}: {e}",
            config.log_file.display()
        )],
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_logging_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = CalculatorConfig {
            enable_logging: false,
            log_file: dir.path().join("logs").join("calc.log"),
            ..Default::default()
        };
        assert!(init(&config, None).is_empty());
        assert!(!config.log_file.exists());
    }

    #[test]
    fn log_file_and_parent_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("calc.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
