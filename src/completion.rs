// completion.rs

use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Helper};

use crate::commands::COMMANDS;
use crate::operations::OperationRegistry;

/// Completes the command word from the shell commands and the registered
/// operation names, and file paths for `save` and `load`.
pub struct CommandCompleter {
    words: Vec<String>,
    operations: Vec<String>,
    files: FilenameCompleter,
}

impl CommandCompleter {
    pub fn new(registry: &OperationRegistry) -> Self {
        let operations: Vec<String> = registry.list_names().into_iter().map(String::from).collect();
        let mut words: Vec<String> = COMMANDS
            .iter()
            .filter_map(|(usage, _)| usage.split(' ').next())
            .chain(["quit"])
            .map(String::from)
            .chain(operations.iter().cloned())
            .collect();
        words.sort();
        words.dedup();
        Self {
            words,
            operations,
            files: FilenameCompleter::new(),
        }
    }

    /// Candidates for the first word of `line`, or `None` once the cursor is
    /// past it.
    pub fn command_candidates(&self, line: &str, pos: usize) -> Option<Vec<Pair>> {
        let prefix = line[..pos].trim_start();
        if prefix.contains(char::is_whitespace) {
            return None;
        }
        let prefix = prefix.to_lowercase();
        let pairs = self
            .words
            .iter()
            .filter(|w| w.starts_with(&prefix))
            .map(|w| Pair {
                display: w.clone(),
                replacement: format!("{w} "),
            })
            .collect();
        Some(pairs)
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        if let Some(pairs) = self.command_candidates(line, pos) {
            let start = line.len() - line.trim_start().len();
            return Ok((start, pairs));
        }
        let command = line.split_whitespace().next().unwrap_or("").to_lowercase();
        if command == "save" || command == "load" {
            return self.files.complete(line, pos, ctx);
        }
        Ok((pos, Vec::new()))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;

    // Shows the operand placeholders after an operation name.
    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        let word = line.strip_suffix(' ')?.trim();
        self.operations
            .iter()
            .any(|op| op.eq_ignore_ascii_case(word))
            .then(|| "<a> <b>".to_string())
    }
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {
    fn validate(&self, _ctx: &mut ValidationContext) -> Result<ValidationResult, ReadlineError> {
        Ok(ValidationResult::Valid(None))
    }
}

impl Helper for CommandCompleter {}
