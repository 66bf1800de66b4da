// repl.rs

use std::io;

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{CompletionType, Config, Editor};

use crate::calculator::Calculator;
use crate::commands::{execute_line, Outcome};
use crate::completion::CommandCompleter;
use crate::util::writeln_ignore_broken_pipe;

const PROMPT: &str = "calc> ";

pub fn welcome(calc: &Calculator) -> String {
    format!(
        "Calculator ready: {} operations available.\n\
         Type 'help' for commands, 'exit' to quit.",
        calc.registry().len()
    )
}

/// Reads lines until `exit`, end of input or Ctrl-C. Command failures are
/// printed and the loop keeps going; only a broken terminal ends it early.
pub fn start_repl(calc: &mut Calculator, show_welcome: bool) -> anyhow::Result<()> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();
    let mut rl = Editor::<CommandCompleter, DefaultHistory>::with_config(config)?;
    rl.set_helper(Some(CommandCompleter::new(calc.registry())));

    if show_welcome {
        writeln_ignore_broken_pipe(io::stdout(), welcome(calc))?;
    }
    tracing::info!("Session started");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                match execute_line(calc, &line) {
                    Outcome::Continue(text) => {
                        if !text.is_empty() {
                            writeln_ignore_broken_pipe(io::stdout(), text)?;
                        }
                    }
                    Outcome::Exit(text) => {
                        writeln_ignore_broken_pipe(io::stdout(), text)?;
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                writeln_ignore_broken_pipe(io::stdout(), "Goodbye!")?;
                break;
            }
            Err(err) => {
                tracing::error!("line editor failed: {err}");
                return Err(err.into());
            }
        }
    }
    tracing::info!(calculations = calc.history().len(), "Session ended");
    Ok(())
}
