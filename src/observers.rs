// observers.rs

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::calculation::CalculationRecord;
use crate::history::HistoryLog;
use crate::persist::{self, HistoryFormat};

/// A change the calculator has just made to its history.
#[derive(Debug, Clone, Copy)]
pub enum CalculatorEvent<'a> {
    Calculated(&'a CalculationRecord),
    Undone,
    Redone,
    Cleared,
    Loaded(&'a Path),
}

impl CalculatorEvent<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            CalculatorEvent::Calculated(_) => "calculation",
            CalculatorEvent::Undone => "undo",
            CalculatorEvent::Redone => "redo",
            CalculatorEvent::Cleared => "clear",
            CalculatorEvent::Loaded(_) => "load",
        }
    }
}

/// Callback invoked synchronously after every successful state change.
pub trait CalculatorObserver {
    fn name(&self) -> &str;

    fn notify(&mut self, event: &CalculatorEvent<'_>, history: &HistoryLog) -> anyhow::Result<()>;
}

/// Writes one log line per event through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl CalculatorObserver for LoggingObserver {
    fn name(&self) -> &str {
        "logging"
    }

    fn notify(&mut self, event: &CalculatorEvent<'_>, history: &HistoryLog) -> anyhow::Result<()> {
        match event {
            CalculatorEvent::Calculated(record) => tracing::info!(
                operation = %record.operation,
                operand_a = record.operand_a,
                operand_b = record.operand_b,
                result = record.result,
                "Calculation: {record}"
            ),
            CalculatorEvent::Loaded(path) => tracing::info!(
                path = %path.display(),
                entries = history.len(),
                "History loaded"
            ),
            other => tracing::info!(event = other.kind(), entries = history.len(), "History changed"),
        }
        Ok(())
    }
}

/// Rewrites the whole history file after every event.
#[derive(Debug)]
pub struct AutoSaveObserver {
    path: PathBuf,
    format: HistoryFormat,
    saves: usize,
}

impl AutoSaveObserver {
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let format = persist::resolve_format(&path, None)?;
        Ok(Self {
            path,
            format,
            saves: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> HistoryFormat {
        self.format
    }

    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl CalculatorObserver for AutoSaveObserver {
    fn name(&self) -> &str {
        "auto-save"
    }

    fn notify(&mut self, event: &CalculatorEvent<'_>, history: &HistoryLog) -> anyhow::Result<()> {
        history
            .export_to(&self.path, self.format)
            .with_context(|| format!("auto-save after {}", event.kind()))?;
        self.saves += 1;
        tracing::debug!(path = %self.path.display(), saves = self.saves, "History auto-saved");
        Ok(())
    }
}
