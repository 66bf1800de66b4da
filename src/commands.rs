// commands.rs

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;

use crate::calculation::{format_number, CalculationRecord};
use crate::calculator::Calculator;
use crate::history::HistoryQuery;
use crate::parser::{parse_infix, parse_number, split_args};
use crate::persist::HistoryFormat;

const DEFAULT_HISTORY_COUNT: usize = 10;

/// Shell commands other than operation names: (usage, description).
pub const COMMANDS: &[(&str, &str)] = &[
    ("history [op] [n]", "Show the last n calculations (default 10), optionally of one operation"),
    ("search [key=value..]", "Filter history by op, min, max, since, until, limit"),
    ("clear", "Clear the calculation history"),
    ("undo", "Undo the last change to the history"),
    ("redo", "Redo the last undone change"),
    ("save [path] [format]", "Export history as csv, json or xlsx"),
    ("load <path> [format]", "Replace history with a saved file"),
    ("stats", "Summarise the history"),
    ("operations", "List available operations"),
    ("config", "Show the active configuration"),
    ("help", "Show this help"),
    ("exit", "Leave the calculator"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue(String),
    Exit(String),
}

/// Runs one input line against the calculator. Every error is turned into a
/// printable message; nothing here ends the session except `exit`.
pub fn execute_line(calc: &mut Calculator, line: &str) -> Outcome {
    match dispatch(calc, line.trim()) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::debug!(input = line, "command failed: {e:#}");
            Outcome::Continue(format!("Error: {e:#}"))
        }
    }
}

fn dispatch(calc: &mut Calculator, line: &str) -> anyhow::Result<Outcome> {
    if line.is_empty() {
        return Ok(Outcome::Continue(String::new()));
    }
    if let Some((operation, a, b)) = parse_infix(line) {
        let record = calc.calculate(operation, a, b)?;
        return Ok(Outcome::Continue(calc.describe(&record)));
    }

    let tokens = split_args(line).map_err(|e| anyhow!("cannot parse command: {e}"))?;
    let Some((command, args)) = tokens.split_first() else {
        return Ok(Outcome::Continue(String::new()));
    };
    let command = command.to_lowercase();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let text = match (command.as_str(), args.as_slice()) {
        ("exit" | "quit", []) => return Ok(Outcome::Exit("Goodbye!".to_string())),
        ("help", []) => help(calc),
        ("history", rest) => history(calc, rest)?,
        ("search", rest) => search(calc, rest)?,
        ("clear", []) => {
            calc.clear_history();
            "History cleared.".to_string()
        }
        ("undo", []) => {
            calc.undo()?;
            describe_last(calc, "Undone")
        }
        ("redo", []) => {
            calc.redo()?;
            describe_last(calc, "Redone")
        }
        ("save", rest) => save(calc, rest)?,
        ("load", rest) => load(calc, rest)?,
        ("stats", []) => stats(calc),
        ("operations" | "ops", []) => operations(calc),
        ("config", []) => calc.config().to_string(),
        (name, rest) if calc.registry().contains(name) => {
            let [a, b] = rest else {
                bail!("usage: {name} <a> <b>");
            };
            let a = parse_number(a).map_err(anyhow::Error::msg)?;
            let b = parse_number(b).map_err(anyhow::Error::msg)?;
            let record = calc.calculate(name, a, b)?;
            calc.describe(&record)
        }
        (name, _) if COMMANDS.iter().any(|(usage, _)| usage.split(' ').next() == Some(name)) => {
            bail!("wrong arguments for '{name}'; type 'help' for usage")
        }
        (name, _) => bail!("unknown command '{name}'; type 'help' to list commands"),
    };
    Ok(Outcome::Continue(text))
}

fn help(calc: &Calculator) -> String {
    let mut out = String::from("Commands:\n");
    for (usage, description) in COMMANDS {
        out.push_str(&format!("  {usage:<24} {description}\n"));
    }
    out.push_str("Operations (usage: <op> <a> <b>, or infix like 5 + 3):\n");
    let lines = calc
        .registry()
        .iter()
        .map(|op| format!("  {:<24} {}", op.name(), op.description()))
        .join("\n");
    out.push_str(&lines);
    out
}

fn operations(calc: &Calculator) -> String {
    calc.registry()
        .iter()
        .map(|op| format!("{:<12} {:<5} {}", op.name(), op.symbol(), op.description()))
        .join("\n")
}

fn history(calc: &Calculator, args: &[&str]) -> anyhow::Result<String> {
    let (operation, count) = match args {
        [] => (None, DEFAULT_HISTORY_COUNT),
        [n] if n.parse::<usize>().is_ok() => (None, positive_count(n)?),
        [op] => (Some(*op), DEFAULT_HISTORY_COUNT),
        [op, n] => (Some(*op), positive_count(n)?),
        _ => bail!("usage: history [op] [n]"),
    };
    let history = calc.history();
    if history.is_empty() {
        return Ok("History is empty.".to_string());
    }
    if let Some(op) = operation {
        let operation = calc.registry().resolve(op)?.name().to_string();
        let records = calc.search(&HistoryQuery::operation(&operation).with_limit(count));
        if records.is_empty() {
            return Ok(format!("No '{operation}' calculations in history."));
        }
        return Ok(listing(calc, &records));
    }
    let first = history.len().saturating_sub(count) + 1;
    let lines = history
        .recent(count)
        .into_iter()
        .enumerate()
        .map(|(i, record)| format!("{:>5}  {}", first + i, calc.describe(record)))
        .join("\n");
    Ok(lines)
}

fn search(calc: &Calculator, args: &[&str]) -> anyhow::Result<String> {
    let mut query = HistoryQuery::default();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got '{arg}'"))?;
        match key.to_lowercase().as_str() {
            "op" | "operation" => {
                query.operation = Some(calc.registry().resolve(value)?.name().to_string())
            }
            "min" => query.min_result = Some(parse_number(value).map_err(anyhow::Error::msg)?),
            "max" => query.max_result = Some(parse_number(value).map_err(anyhow::Error::msg)?),
            "since" => query.since = Some(parse_time(value, false)?),
            "until" => query.until = Some(parse_time(value, true)?),
            "limit" => query.limit = Some(positive_count(value)?),
            other => bail!("unknown search key '{other}' (use op, min, max, since, until, limit)"),
        }
    }
    let records = calc.search(&query);
    if records.is_empty() {
        return Ok("No matching calculations.".to_string());
    }
    Ok(listing(calc, &records))
}

// Newest first, stamped with the time of each calculation.
fn listing(calc: &Calculator, records: &[&CalculationRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}  {}", r.timestamp.format("%Y-%m-%d %H:%M:%S"), calc.describe(r)))
        .join("\n")
}

fn positive_count(text: &str) -> anyhow::Result<usize> {
    text.parse::<usize>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| anyhow!("count must be a positive integer, got '{text}'"))
}

/// RFC 3339 timestamp or a plain `YYYY-MM-DD` date. A bare date as an upper
/// bound covers the whole day.
fn parse_time(text: &str, end_of_day: bool) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(stamp.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("'{text}' is not a date (YYYY-MM-DD) or RFC 3339 timestamp"))?;
    let time = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| anyhow!("'{text}' is out of range"))
}

fn save(calc: &Calculator, args: &[&str]) -> anyhow::Result<String> {
    let (path, format) = path_and_format(args, Some(calc.config().history_file.clone()))?;
    calc.export_history(&path, format)?;
    Ok(format!(
        "Saved {} calculation(s) to {}",
        calc.history().len(),
        path.display()
    ))
}

fn load(calc: &mut Calculator, args: &[&str]) -> anyhow::Result<String> {
    let (path, format) = path_and_format(args, None)?;
    let count = calc.load_history(&path, format)?;
    Ok(format!("Loaded {count} calculation(s) from {}", path.display()))
}

fn path_and_format(
    args: &[&str],
    default_path: Option<PathBuf>,
) -> anyhow::Result<(PathBuf, Option<HistoryFormat>)> {
    let parse_format = |s: &str| s.parse::<HistoryFormat>().map_err(anyhow::Error::msg);
    match args {
        [] => default_path
            .map(|p| (p, None))
            .context("a file path is required"),
        [path] => Ok((PathBuf::from(path), None)),
        [path, format] => Ok((PathBuf::from(path), Some(parse_format(format)?))),
        _ => bail!("expected <path> [format]"),
    }
}

fn describe_last(calc: &Calculator, verb: &str) -> String {
    match calc.history().last() {
        Some(record) => format!("{verb}. Last calculation: {}", calc.describe(record)),
        None => format!("{verb}. History is empty."),
    }
}

fn stats(calc: &Calculator) -> String {
    let stats = calc.statistics();
    if stats.total == 0 {
        return "History is empty.".to_string();
    }
    let mut out = format!("Calculations: {}\n", stats.total);
    let per_op = stats
        .per_operation
        .iter()
        .map(|(op, n)| format!("{op}={n}"))
        .join(", ");
    out.push_str(&format!("By operation: {per_op}\n"));
    if let Some(avg) = stats.average_result {
        out.push_str(&format!("Average result: {}\n", format_number(avg)));
    }
    if let (Some(first), Some(last)) = (stats.earliest, stats.latest) {
        out.push_str(&format!(
            "Span: {} .. {}\n",
            first.format("%Y-%m-%d %H:%M:%S"),
            last.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out.push_str(&format!(
        "Undo steps: {}  Redo steps: {}\n",
        calc.undo_depth(),
        calc.redo_depth()
    ));
    let none = || "nothing".to_string();
    out.push_str(&format!(
        "Undo would restore: {}\nRedo would restore: {}",
        calc.undo_preview().unwrap_or_else(none),
        calc.redo_preview().unwrap_or_else(none)
    ));
    out
}
