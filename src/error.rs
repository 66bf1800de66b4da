// error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything the calculator core can fail with. All variants are
/// recoverable at the REPL boundary.
#[derive(Debug, Error)]
pub enum CalcError {
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    #[error("operation '{0}' is already registered")]
    DuplicateOperation(String),
    #[error("division by zero in '{operation}' ({a}, {b})")]
    DivisionByZero { operation: String, a: f64, b: f64 },
    #[error("invalid operand for '{operation}': {reason}")]
    InvalidOperand { operation: String, reason: String },
    #[error("result of '{operation}' exceeds the representable range")]
    Overflow { operation: String },
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
    #[error("undo/redo is disabled in the configuration")]
    UndoRedoDisabled,
    #[error("history {action} failed for '{}': {source}", .path.display())]
    HistoryIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: BoxError,
    },
}

impl CalcError {
    pub(crate) fn invalid(operation: &str, reason: impl Into<String>) -> Self {
        CalcError::InvalidOperand {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn history_io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: impl Into<BoxError>,
    ) -> Self {
        CalcError::HistoryIo {
            action,
            path: path.into(),
            source: source.into(),
        }
    }
}
