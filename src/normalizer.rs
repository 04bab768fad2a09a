//! Turns raw spreadsheet rows into canonical [`WorkRecord`]s.
//!
//! Dates come in as free text in the `DD/MM/YYYY` convention with a handful
//! of stragglers in other layouts; rows whose date cannot be parsed are
//! dropped before anything downstream sees them.

use crate::canonicalizer::canonicalize;
use crate::error::{AnalyticsError, Result};
use crate::overrides::MappingOverrides;
use crate::schema::{FieldCategory, RawRecord, WorkRecord};
use crate::utils::month_label;
use chrono::NaiveDate;
use log::{debug, info};

// DD/MM/YYYY is tried first: it is the dominant input convention and generic
// parsing is ambiguous for it. The remaining layouts are fallbacks seen in
// real exports.
const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d"];

/// Parses a raw date cell. Returns `None` for blank cells, layouts outside
/// the accepted set, and day overflow such as `31/02/2024`.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

fn parse_minutes(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|m| m.is_finite() && *m >= 0.0)
        .unwrap_or(0.0)
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&threshold) {
        return Err(AnalyticsError::InvalidThreshold(threshold));
    }
    Ok(())
}

/// Parses and canonicalizes a raw dataset.
///
/// Rows with unparseable dates are dropped (and counted in the log, never
/// surfaced per-row). Each of the five label categories is then clustered
/// independently over the surviving rows and every field is rewritten to
/// its canonical value.
pub fn normalize_records(
    raw_records: &[RawRecord],
    threshold: f64,
    overrides: &MappingOverrides,
) -> Result<Vec<WorkRecord>> {
    validate_threshold(threshold)?;

    let mut records = Vec::with_capacity(raw_records.len());
    let mut dropped = 0usize;

    for raw in raw_records {
        let Some(date) = parse_record_date(&raw.date) else {
            dropped += 1;
            continue;
        };

        records.push(WorkRecord {
            collaborator: raw.collaborator.clone(),
            date,
            department: raw.department.clone(),
            macro_activity: raw.macro_activity.clone(),
            micro_activity: raw.micro_activity.clone(),
            client: raw.client.clone(),
            note: raw.note.clone(),
            minutes_spent: parse_minutes(&raw.minutes),
            month_label: month_label(date).to_string(),
        });
    }

    if dropped > 0 {
        info!(
            "Dropped {} of {} rows with unparseable dates",
            dropped,
            raw_records.len()
        );
    }

    for category in FieldCategory::ALL {
        let mapping = {
            let labels: Vec<&str> = records.iter().map(|r| category.get(r)).collect();
            canonicalize(&labels, threshold, overrides.for_category(category))
        };

        let mut rewritten = 0usize;
        for record in records.iter_mut() {
            let current = category.get(record);
            if let Some(canonical) = mapping.get(current) {
                if canonical != current {
                    category.set(record, canonical.clone());
                    rewritten += 1;
                }
            }
        }

        if rewritten > 0 {
            debug!(
                "Canonicalized {} field values in category {}",
                rewritten,
                category.name()
            );
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, collaborator: &str, minutes: &str) -> RawRecord {
        RawRecord {
            collaborator: collaborator.to_string(),
            date: date.to_string(),
            department: "Design".to_string(),
            macro_activity: "Grafica".to_string(),
            micro_activity: "Logo".to_string(),
            client: "Acme".to_string(),
            note: String::new(),
            minutes: minutes.to_string(),
        }
    }

    #[test]
    fn test_parse_date_dd_mm_yyyy_first() {
        // 01/02 is the first of February, never January 2nd.
        assert_eq!(
            parse_record_date("01/02/2024"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(
            parse_record_date("7/3/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 7)
        );
    }

    #[test]
    fn test_parse_date_fallback_layouts() {
        assert_eq!(
            parse_record_date("2024-02-01"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(
            parse_record_date("01-02-2024"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(
            parse_record_date("2024/02/01"),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
    }

    #[test]
    fn test_parse_date_rejects_overflow_and_garbage() {
        assert_eq!(parse_record_date("31/02/2024"), None);
        assert_eq!(parse_record_date(""), None);
        assert_eq!(parse_record_date("yesterday"), None);
        assert_eq!(parse_record_date("13/13/2024"), None);
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        let rows = vec![
            raw("01/02/2024", "Mario Rossi", "60"),
            raw("31/02/2024", "Mario Rossi", "60"),
            raw("", "Mario Rossi", "60"),
        ];

        let records =
            normalize_records(&rows, 85.0, &MappingOverrides::default()).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(records[0].month_label, "Febbraio");
    }

    #[test]
    fn test_minutes_lenient_parse() {
        let rows = vec![
            raw("01/02/2024", "Mario Rossi", "90"),
            raw("01/02/2024", "Mario Rossi", "12.5"),
            raw("01/02/2024", "Mario Rossi", "not a number"),
            raw("01/02/2024", "Mario Rossi", "-30"),
        ];

        let records =
            normalize_records(&rows, 85.0, &MappingOverrides::default()).unwrap();
        let minutes: Vec<f64> = records.iter().map(|r| r.minutes_spent).collect();

        assert_eq!(minutes, vec![90.0, 12.5, 0.0, 0.0]);
    }

    #[test]
    fn test_fields_rewritten_to_canonical() {
        let mut rows = vec![raw("01/02/2024", "Jhon Doe", "30"); 3];
        rows.extend(vec![raw("02/02/2024", "John Doe", "30"); 7]);

        let records = normalize_records(&rows, 70.0, &MappingOverrides::default()).unwrap();

        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r.collaborator == "John Doe"));
    }

    #[test]
    fn test_categories_normalized_independently() {
        let mut row_a = raw("01/02/2024", "Mario Rossi", "30");
        row_a.client = "Acme Srl".to_string();
        let mut row_b = raw("01/02/2024", "mario rossi", "30");
        row_b.client = "ACME SRL".to_string();
        row_b.department = "design".to_string();

        let records =
            normalize_records(&[row_a, row_b], 85.0, &MappingOverrides::default()).unwrap();

        // Each category collapses on its own first-seen spelling.
        assert!(records.iter().all(|r| r.collaborator == "Mario Rossi"));
        assert!(records.iter().all(|r| r.client == "Acme Srl"));
        assert!(records.iter().all(|r| r.department == "Design"));
    }

    #[test]
    fn test_overrides_rewrite_exact_labels() {
        let rows = vec![raw("01/02/2024", "J. Doe", "30")];
        let mut overrides = MappingOverrides::default();
        overrides
            .collaborators
            .insert("J. Doe".to_string(), "John Doe".to_string());

        let records = normalize_records(&rows, 85.0, &overrides).unwrap();
        assert_eq!(records[0].collaborator, "John Doe");
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let rows = vec![raw("01/02/2024", "Mario Rossi", "30")];

        let result = normalize_records(&rows, 180.0, &MappingOverrides::default());
        assert!(matches!(
            result,
            Err(AnalyticsError::InvalidThreshold(t)) if t == 180.0
        ));

        assert!(normalize_records(&rows, -1.0, &MappingOverrides::default()).is_err());
    }
}
