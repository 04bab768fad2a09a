//! Hours-by-dimension aggregation for the chart views.

use crate::schema::{FieldCategory, HoursByLabel, WorkRecord};
use std::collections::BTreeMap;

fn aggregate_hours(records: &[WorkRecord], category: FieldCategory) -> Vec<HoursByLabel> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *totals.entry(category.get(record)).or_insert(0.0) += record.minutes_spent / 60.0;
    }

    let mut rows: Vec<HoursByLabel> = totals
        .into_iter()
        .map(|(label, hours)| HoursByLabel {
            label: label.to_string(),
            hours,
        })
        .collect();

    // Descending by hours; the stable sort keeps ties alphabetical.
    rows.sort_by(|a, b| b.hours.partial_cmp(&a.hours).unwrap_or(std::cmp::Ordering::Equal));
    rows
}

pub fn hours_by_collaborator(records: &[WorkRecord]) -> Vec<HoursByLabel> {
    aggregate_hours(records, FieldCategory::Collaborator)
}

pub fn hours_by_client(records: &[WorkRecord]) -> Vec<HoursByLabel> {
    aggregate_hours(records, FieldCategory::Client)
}

pub fn hours_by_department(records: &[WorkRecord]) -> Vec<HoursByLabel> {
    aggregate_hours(records, FieldCategory::Department)
}

pub fn hours_by_macro_activity(records: &[WorkRecord]) -> Vec<HoursByLabel> {
    aggregate_hours(records, FieldCategory::MacroActivity)
}

/// Like the other aggregators, but records with a blank micro-activity are
/// discarded first: an unspecified micro-activity is not a reportable
/// category.
pub fn hours_by_micro_activity(records: &[WorkRecord]) -> Vec<HoursByLabel> {
    let with_micro: Vec<WorkRecord> = records
        .iter()
        .filter(|record| !record.micro_activity.trim().is_empty())
        .cloned()
        .collect();

    aggregate_hours(&with_micro, FieldCategory::MicroActivity)
}
