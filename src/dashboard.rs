use crate::store::StudentRecord;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeSet;

pub const NO_DATA_MESSAGE: &str = "No student data available.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_students: usize,
    pub total_classes: usize,
    pub total_fee_paid: i64,
    pub total_fee_balance: i64,
}

/// Zero totals for an empty slice; callers decide whether to show them.
/// Fee totals saturate at `i64::MAX` since imported rows are not range checked.
pub fn summarize(records: &[StudentRecord]) -> Summary {
    let classes: BTreeSet<&str> = records.iter().map(|r| r.class.as_str()).collect();
    Summary {
        total_students: records.len(),
        total_classes: classes.len(),
        total_fee_paid: saturating_total(records.iter().map(|r| r.fee_paid)),
        total_fee_balance: saturating_total(records.iter().map(|r| r.fee_balance)),
    }
}

fn saturating_total(amounts: impl Iterator<Item = i64>) -> i64 {
    amounts.fold(0i64, |acc, n| acc.saturating_add(n))
}

/// Calendar month (1-12) of the record timestamp, no timezone adjustment.
pub fn record_month(record: &StudentRecord) -> u32 {
    record.created_at.month()
}

/// Sorted distinct months present in `records`; empty when there are none.
pub fn month_options(records: &[StudentRecord]) -> Vec<u32> {
    records
        .iter()
        .map(record_month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn filter_by_month(records: &[StudentRecord], month: u32) -> Vec<&StudentRecord> {
    records.iter().filter(|r| record_month(r) == month).collect()
}
