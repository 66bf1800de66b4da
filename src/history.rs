// history.rs

use std::collections::VecDeque;
use std::path::Path;

use chrono::{DateTime, Utc};
use itertools::Itertools;

use crate::calculation::CalculationRecord;
use crate::error::CalcError;
use crate::persist::{self, HistoryFormat};

/// Saved copy of a history's entries. Opaque outside this module: the only
/// thing callers can do with one is hand it back to [`HistoryLog::restore`].
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    entries: VecDeque<CalculationRecord>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newest record in the saved state.
    pub fn last(&self) -> Option<&CalculationRecord> {
        self.entries.back()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub per_operation: Vec<(String, usize)>,
    pub average_result: Option<f64>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

/// Filters for [`HistoryLog::search`]. Unset fields match everything; the
/// result and date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    pub operation: Option<String>,
    pub min_result: Option<f64>,
    pub max_result: Option<f64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    pub fn operation(name: &str) -> Self {
        Self {
            operation: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, record: &CalculationRecord) -> bool {
        self.operation
            .as_deref()
            .map_or(true, |op| record.operation.eq_ignore_ascii_case(op.trim()))
            && self.min_result.map_or(true, |min| record.result >= min)
            && self.max_result.map_or(true, |max| record.result <= max)
            && self.since.map_or(true, |since| record.timestamp >= since)
            && self.until.map_or(true, |until| record.timestamp <= until)
    }
}

/// Calculation log bounded to `max_size` entries; the oldest are evicted
/// first.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<CalculationRecord>,
    max_size: usize,
}

impl HistoryLog {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: VecDeque::with_capacity(max_size.min(1024)),
            max_size,
        }
    }

    pub fn append(&mut self, record: CalculationRecord) {
        self.entries.push_back(record);
        self.enforce_bound();
    }

    /// Last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&CalculationRecord> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.entries.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.entries = snapshot.entries;
        self.enforce_bound();
    }

    /// Replaces every entry, keeping the newest `max_size` of `records`.
    pub fn replace(&mut self, records: Vec<CalculationRecord>) {
        self.entries = records.into();
        self.enforce_bound();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn last(&self) -> Option<&CalculationRecord> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalculationRecord> {
        self.entries.iter()
    }

    /// Records matching `query`, newest first.
    pub fn search(&self, query: &HistoryQuery) -> Vec<&CalculationRecord> {
        self.entries
            .iter()
            .rev()
            .filter(|r| query.matches(r))
            .sorted_by(|x, y| y.timestamp.cmp(&x.timestamp))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect()
    }

    pub fn statistics(&self) -> HistoryStats {
        let per_operation = self
            .entries
            .iter()
            .map(|r| r.operation.as_str())
            .unique()
            .map(|op| {
                let count = self.entries.iter().filter(|r| r.operation == op).count();
                (op.to_string(), count)
            })
            .collect();
        let average_result = if self.entries.is_empty() {
            None
        } else {
            let sum: f64 = self.entries.iter().map(|r| r.result).sum();
            Some(sum / self.entries.len() as f64)
        };
        let (earliest, latest) = match self.entries.iter().map(|r| r.timestamp).minmax() {
            itertools::MinMaxResult::NoElements => (None, None),
            itertools::MinMaxResult::OneElement(t) => (Some(t), Some(t)),
            itertools::MinMaxResult::MinMax(lo, hi) => (Some(lo), Some(hi)),
        };
        HistoryStats {
            total: self.entries.len(),
            per_operation,
            average_result,
            earliest,
            latest,
        }
    }

    pub fn export_to(&self, path: &Path, format: HistoryFormat) -> Result<(), CalcError> {
        let records: Vec<&CalculationRecord> = self.entries.iter().collect();
        persist::export(path, format, &records)
    }

    /// Replaces the entries with the file's records, keeping the newest
    /// `max_size`. The log is untouched if the file cannot be read.
    pub fn import_from(&mut self, path: &Path, format: HistoryFormat) -> Result<usize, CalcError> {
        let records = persist::import(path, format)?;
        self.replace(records);
        Ok(self.entries.len())
    }

    fn enforce_bound(&mut self) {
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(a: f64) -> CalculationRecord {
        CalculationRecord::new("add", a, 1.0, a + 1.0)
    }

    #[test]
    fn append_evicts_oldest_first() {
        let mut log = HistoryLog::new(3);
        for i in 0..5 {
            log.append(record(i as f64));
        }
        assert_eq!(log.len(), 3);
        let kept: Vec<f64> = log.iter().map(|r| r.operand_a).collect();
        assert_eq!(kept, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn recent_is_chronological() {
        let mut log = HistoryLog::new(10);
        for i in 0..4 {
            log.append(record(i as f64));
        }
        let recent: Vec<f64> = log.recent(2).iter().map(|r| r.operand_a).collect();
        assert_eq!(recent, vec![2.0, 3.0]);
        assert_eq!(log.recent(100).len(), 4);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn snapshot_is_independent_of_later_changes() {
        let mut log = HistoryLog::new(10);
        log.append(record(1.0));
        let snap = log.snapshot();
        log.append(record(2.0));
        log.clear();
        assert_eq!(snap.len(), 1);
        log.restore(snap);
        assert_eq!(log.len(), 1);
        assert_eq!(log.last().map(|r| r.operand_a), Some(1.0));
    }

    #[test]
    fn replace_keeps_newest_within_bound() {
        let mut log = HistoryLog::new(2);
        log.replace((0..5).map(|i| record(i as f64)).collect());
        let kept: Vec<f64> = log.iter().map(|r| r.operand_a).collect();
        assert_eq!(kept, vec![3.0, 4.0]);
    }

    #[test]
    fn statistics_count_per_operation() {
        let mut log = HistoryLog::new(10);
        log.append(CalculationRecord::new("add", 1.0, 1.0, 2.0));
        log.append(CalculationRecord::new("multiply", 2.0, 3.0, 6.0));
        log.append(CalculationRecord::new("add", 2.0, 2.0, 4.0));
        let stats = log.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(
            stats.per_operation,
            vec![("add".to_string(), 2), ("multiply".to_string(), 1)]
        );
        assert_eq!(stats.average_result, Some(4.0));
        assert!(stats.earliest <= stats.latest);
    }

    #[test]
    fn export_then_import_into_a_smaller_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut log = HistoryLog::new(10);
        for i in 0..4 {
            log.append(record(i as f64));
        }
        log.export_to(&path, HistoryFormat::Json).unwrap();

        let mut small = HistoryLog::new(3);
        small.append(record(99.0));
        assert_eq!(small.import_from(&path, HistoryFormat::Json).unwrap(), 3);
        let kept: Vec<f64> = small.iter().map(|r| r.operand_a).collect();
        assert_eq!(kept, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn failed_import_leaves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = HistoryLog::new(3);
        log.append(record(1.0));
        assert!(log
            .import_from(&dir.path().join("absent.csv"), HistoryFormat::Csv)
            .is_err());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn search_filters_and_orders_newest_first() {
        let t0 = Utc::now();
        let at = |op: &str, result: f64, secs: i64| {
            CalculationRecord::at(op, 0.0, 0.0, result, t0 + chrono::Duration::seconds(secs))
        };
        let mut log = HistoryLog::new(10);
        log.append(at("add", 2.0, 0));
        log.append(at("multiply", 6.0, 10));
        log.append(at("add", 9.0, 20));
        log.append(at("add", 40.0, 30));

        let adds: Vec<f64> = log
            .search(&HistoryQuery::operation("ADD"))
            .iter()
            .map(|r| r.result)
            .collect();
        assert_eq!(adds, vec![40.0, 9.0, 2.0]);

        let query = HistoryQuery {
            min_result: Some(5.0),
            max_result: Some(10.0),
            ..Default::default()
        };
        let ranged: Vec<f64> = log.search(&query).iter().map(|r| r.result).collect();
        assert_eq!(ranged, vec![9.0, 6.0]);

        let query = HistoryQuery {
            since: Some(t0 + chrono::Duration::seconds(10)),
            until: Some(t0 + chrono::Duration::seconds(20)),
            ..Default::default()
        };
        assert_eq!(log.search(&query).len(), 2);

        let limited = log.search(&HistoryQuery::operation("add").with_limit(1));
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].result, 40.0);
        assert!(log.search(&HistoryQuery::operation("divide")).is_empty());
    }

    #[test]
    fn statistics_of_empty_log() {
        let stats = HistoryLog::new(5).statistics();
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_result, None);
        assert_eq!(stats.earliest, None);
    }
}
