// persist.rs

use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_xlsxwriter::Workbook;

use crate::calculation::CalculationRecord;
use crate::error::{BoxError, CalcError};

const SHEET_NAME: &str = "history";
static EMPTY_CELL: Data = Data::Empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    Csv,
    Json,
    Xlsx,
}

impl HistoryFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HistoryFormat::Csv => "csv",
            HistoryFormat::Json => "json",
            HistoryFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for HistoryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(HistoryFormat::Csv),
            "json" => Ok(HistoryFormat::Json),
            "xlsx" | "excel" => Ok(HistoryFormat::Xlsx),
            other => Err(format!(
                "unsupported history format '{other}' (expected csv, json or xlsx)"
            )),
        }
    }
}

/// Picks the explicit format if given, otherwise infers it from the file
/// extension.
pub fn resolve_format(path: &Path, explicit: Option<HistoryFormat>) -> Result<HistoryFormat, CalcError> {
    explicit
        .or_else(|| HistoryFormat::from_path(path))
        .ok_or_else(|| {
            CalcError::history_io(
                "format detection",
                path,
                "cannot infer a format from the file extension; name one of csv, json or xlsx",
            )
        })
}

pub fn export(
    path: &Path,
    format: HistoryFormat,
    records: &[&CalculationRecord],
) -> Result<(), CalcError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| CalcError::history_io("export", path, e))?;
        }
    }
    let written = match format {
        HistoryFormat::Csv => write_csv(path, records),
        HistoryFormat::Json => write_json(path, records),
        HistoryFormat::Xlsx => write_xlsx(path, records),
    };
    written.map_err(|e| CalcError::history_io("export", path, e))?;
    tracing::debug!(path = %path.display(), %format, count = records.len(), "history exported");
    Ok(())
}

pub fn import(path: &Path, format: HistoryFormat) -> Result<Vec<CalculationRecord>, CalcError> {
    if !path.exists() {
        return Err(CalcError::history_io("import", path, "file does not exist"));
    }
    let read = match format {
        HistoryFormat::Csv => read_csv(path),
        HistoryFormat::Json => read_json(path),
        HistoryFormat::Xlsx => read_xlsx(path),
    };
    let records = read.map_err(|e| CalcError::history_io("import", path, e))?;
    tracing::debug!(path = %path.display(), %format, count = records.len(), "history imported");
    Ok(records)
}

fn write_csv(path: &Path, records: &[&CalculationRecord]) -> Result<(), BoxError> {
    let mut writer = csv::Writer::from_path(path)?;
    if records.is_empty() {
        writer.write_record(CalculationRecord::COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_csv(path: &Path) -> Result<Vec<CalculationRecord>, BoxError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

fn write_json(path: &Path, records: &[&CalculationRecord]) -> Result<(), BoxError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_json(path: &Path) -> Result<Vec<CalculationRecord>, BoxError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&content)?)
}

fn write_xlsx(path: &Path, records: &[&CalculationRecord]) -> Result<(), BoxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, name) in CalculationRecord::COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, record.operation.as_str())?;
        sheet.write_number(row, 1, record.operand_a)?;
        sheet.write_number(row, 2, record.operand_b)?;
        sheet.write_number(row, 3, record.result)?;
        let stamp = record.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        sheet.write_string(row, 4, stamp.as_str())?;
    }
    workbook.save(path)?;
    Ok(())
}

fn read_xlsx(path: &Path) -> Result<Vec<CalculationRecord>, BoxError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(Vec::new()),
    };
    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(row) => row.iter().map(|cell| cell_text(cell).to_lowercase()).collect(),
        None => return Ok(Vec::new()),
    };
    let column = |name: &str| -> Result<usize, BoxError> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| format!("missing column '{name}'").into())
    };
    let (op, a, b, result, stamp) = (
        column("operation")?,
        column("operand_a")?,
        column("operand_b")?,
        column("result")?,
        column("timestamp")?,
    );

    let mut records = Vec::new();
    for (i, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let line = i + 2;
        let get = |col: usize| row.get(col).unwrap_or(&EMPTY_CELL);
        let timestamp = DateTime::parse_from_rfc3339(cell_text(get(stamp)).trim())
            .map_err(|e| format!("row {line}: bad timestamp: {e}"))?
            .with_timezone(&Utc);
        records.push(CalculationRecord {
            operation: cell_text(get(op)),
            operand_a: cell_number(get(a)).map_err(|e| format!("row {line}: {e}"))?,
            operand_b: cell_number(get(b)).map_err(|e| format!("row {line}: {e}"))?,
            result: cell_number(get(result)).map_err(|e| format!("row {line}: {e}"))?,
            timestamp,
        });
    }
    Ok(records)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => format!("{other:?}"),
    }
}

fn cell_number(cell: &Data) -> Result<f64, String> {
    match cell {
        Data::Float(f) => Ok(*f),
        Data::Int(i) => Ok(*i as f64),
        Data::String(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a number")),
        other => Err(format!("expected a number, found {other:?}")),
    }
}
