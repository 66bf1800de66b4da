//! Interactive command-line calculator: a registry of binary operations, a
//! bounded calculation history with undo/redo, file persistence in CSV, JSON
//! and XLSX, and a line-editing REPL on top.

pub mod calculation;
pub mod calculator;
pub mod commands;
pub mod completion;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod observers;
pub mod operations;
pub mod parser;
pub mod persist;
pub mod repl;
pub mod undo;
pub mod util;

pub use calculation::CalculationRecord;
pub use calculator::Calculator;
pub use config::{CalculatorConfig, ConfigError, LogLevel};
pub use error::CalcError;
pub use history::{HistoryLog, HistoryStats, Snapshot};
pub use observers::{CalculatorEvent, CalculatorObserver};
pub use operations::{Operation, OperationRegistry};
pub use persist::HistoryFormat;
pub use undo::UndoRedoManager;
