// calculator.rs

use std::path::Path;

use crate::calculation::{round_to, CalculationRecord};
use crate::config::CalculatorConfig;
use crate::error::CalcError;
use crate::history::{HistoryLog, HistoryQuery, HistoryStats, Snapshot};
use crate::observers::{AutoSaveObserver, CalculatorEvent, CalculatorObserver, LoggingObserver};
use crate::operations::{Operation, OperationRegistry};
use crate::persist::{self, HistoryFormat};
use crate::undo::UndoRedoManager;

/// Single entry point over the registry, the history log and the undo
/// manager. Owns all three exclusively.
pub struct Calculator {
    config: CalculatorConfig,
    registry: OperationRegistry,
    history: HistoryLog,
    undo: UndoRedoManager,
    observers: Vec<Box<dyn CalculatorObserver>>,
}

impl Calculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self::with_observers(config, Vec::new())
    }

    pub fn with_observers(
        config: CalculatorConfig,
        observers: Vec<Box<dyn CalculatorObserver>>,
    ) -> Self {
        Self {
            registry: OperationRegistry::with_builtins(),
            history: HistoryLog::new(config.max_history_size),
            undo: UndoRedoManager::with_limit(config.max_undo_depth),
            observers,
            config,
        }
    }

    /// Attaches the logging and auto-save observers the configuration asks
    /// for. With auto-save on, an existing history file is loaded first so
    /// the next save extends it; that load is not an undoable step.
    pub fn from_config(config: CalculatorConfig) -> anyhow::Result<Self> {
        let mut observers: Vec<Box<dyn CalculatorObserver>> = Vec::new();
        if config.enable_logging {
            observers.push(Box::new(LoggingObserver));
        }
        let mut history = HistoryLog::new(config.max_history_size);
        if config.enable_auto_save {
            let auto_save = AutoSaveObserver::new(&config.history_file)?;
            if auto_save.path().exists() {
                match history.import_from(auto_save.path(), auto_save.format()) {
                    Ok(count) => tracing::info!(
                        path = %auto_save.path().display(),
                        count,
                        "Restored saved history"
                    ),
                    Err(e) => tracing::warn!("could not restore saved history: {e}"),
                }
            }
            observers.push(Box::new(auto_save));
        }
        let mut calc = Self::with_observers(config, observers);
        calc.history = history;
        Ok(calc)
    }

    pub fn calculate(&mut self, name: &str, a: f64, b: f64) -> Result<CalculationRecord, CalcError> {
        let record = self.evaluate(name, a, b).map_err(|e| {
            tracing::debug!(operation = name, a, b, error = %e, "calculation rejected");
            e
        })?;
        self.checkpoint();
        self.history.append(record.clone());
        self.notify(CalculatorEvent::Calculated(&record));
        Ok(record)
    }

    pub fn undo(&mut self) -> Result<(), CalcError> {
        self.ensure_undo_enabled()?;
        let previous = self.undo.undo(self.history.snapshot())?;
        self.history.restore(previous);
        self.notify(CalculatorEvent::Undone);
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), CalcError> {
        self.ensure_undo_enabled()?;
        let next = self.undo.redo(self.history.snapshot())?;
        self.history.restore(next);
        self.notify(CalculatorEvent::Redone);
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.checkpoint();
        self.history.clear();
        self.notify(CalculatorEvent::Cleared);
    }

    pub fn export_history(&self, path: &Path, format: Option<HistoryFormat>) -> Result<(), CalcError> {
        let format = persist::resolve_format(path, format)?;
        self.history.export_to(path, format)
    }

    /// Replaces the history with the file's records. Returns how many were
    /// kept after applying the size bound. Undoable; a failed read changes
    /// nothing.
    pub fn load_history(&mut self, path: &Path, format: Option<HistoryFormat>) -> Result<usize, CalcError> {
        let format = persist::resolve_format(path, format)?;
        let mut loaded = HistoryLog::new(self.history.max_size());
        let count = loaded.import_from(path, format)?;
        self.checkpoint();
        self.history = loaded;
        self.notify(CalculatorEvent::Loaded(path));
        Ok(count)
    }

    pub fn register_operation(&mut self, operation: Operation) -> Result<(), CalcError> {
        self.registry.register(operation)
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn statistics(&self) -> HistoryStats {
        self.history.statistics()
    }

    pub fn search(&self, query: &HistoryQuery) -> Vec<&CalculationRecord> {
        self.history.search(query)
    }

    /// Renders a record with its operation's symbol.
    pub fn describe(&self, record: &CalculationRecord) -> String {
        self.registry.describe(record)
    }

    /// What `undo` would restore, or `None` when it would fail.
    pub fn undo_preview(&self) -> Option<String> {
        if !self.can_undo() {
            return None;
        }
        self.undo.peek_undo().map(|s| self.preview(s))
    }

    /// What `redo` would restore, or `None` when it would fail.
    pub fn redo_preview(&self) -> Option<String> {
        if !self.can_redo() {
            return None;
        }
        self.undo.peek_redo().map(|s| self.preview(s))
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    pub fn can_undo(&self) -> bool {
        self.config.enable_undo_redo && self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.config.enable_undo_redo && self.undo.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.undo.redo_depth()
    }

    pub fn observer_names(&self) -> Vec<&str> {
        self.observers.iter().map(|o| o.name()).collect()
    }

    fn preview(&self, snapshot: &Snapshot) -> String {
        if snapshot.is_empty() {
            return "empty history".to_string();
        }
        let last = snapshot.last().map(|r| self.describe(r)).unwrap_or_default();
        format!("{} calculation(s), last {last}", snapshot.len())
    }

    fn evaluate(&self, name: &str, a: f64, b: f64) -> Result<CalculationRecord, CalcError> {
        let operation = self.registry.resolve(name)?;
        self.check_range(operation.name(), a)?;
        self.check_range(operation.name(), b)?;
        let result = round_to(operation.evaluate(a, b)?, self.config.precision);
        Ok(CalculationRecord::new(operation.name(), a, b, result))
    }

    fn check_range(&self, operation: &str, value: f64) -> Result<(), CalcError> {
        if !value.is_finite() {
            return Err(CalcError::invalid(operation, format!("{value} is not a finite number")));
        }
        let max = self.config.max_input_value;
        if value.abs() > max {
            return Err(CalcError::invalid(
                operation,
                format!("{value} is outside the allowed range [-{max}, {max}]"),
            ));
        }
        Ok(())
    }

    fn ensure_undo_enabled(&self) -> Result<(), CalcError> {
        if self.config.enable_undo_redo {
            Ok(())
        } else {
            Err(CalcError::UndoRedoDisabled)
        }
    }

    fn checkpoint(&mut self) {
        if self.config.enable_undo_redo {
            self.undo.record_state(self.history.snapshot());
        }
    }

    fn notify(&mut self, event: CalculatorEvent<'_>) {
        for observer in &mut self.observers {
            if let Err(e) = observer.notify(&event, &self.history) {
                tracing::warn!(observer = observer.name(), "observer failed: {e:#}");
            }
        }
    }
}
