//! Date-range and set filtering over canonical records.

use crate::schema::{FieldCategory, FilterCriteria, WorkRecord};
use std::collections::BTreeSet;

fn dimension_allows(restriction: &Option<BTreeSet<String>>, value: &str) -> bool {
    match restriction {
        Some(set) if !set.is_empty() => set.contains(value),
        _ => true,
    }
}

/// True when the record survives every dimension of the criteria: date in
/// the inclusive range, and membership in each restricted set. Dimensions
/// are ANDed; values within one dimension are ORed.
pub fn record_passes(record: &WorkRecord, criteria: &FilterCriteria) -> bool {
    criteria.date_in_range(record.date)
        && dimension_allows(&criteria.collaborators, &record.collaborator)
        && dimension_allows(&criteria.departments, &record.department)
        && dimension_allows(&criteria.macro_activities, &record.macro_activity)
        && dimension_allows(&criteria.clients, &record.client)
}

/// The subset of `records` passing `criteria`, in input order.
pub fn filter_records(records: &[WorkRecord], criteria: &FilterCriteria) -> Vec<WorkRecord> {
    records
        .iter()
        .filter(|record| record_passes(record, criteria))
        .cloned()
        .collect()
}

/// Sorted distinct non-blank values of one category, for the filter
/// dropdowns in the presentation layer.
pub fn unique_values(records: &[WorkRecord], category: FieldCategory) -> Vec<String> {
    let set: BTreeSet<&str> = records
        .iter()
        .map(|record| category.get(record))
        .filter(|value| !value.trim().is_empty())
        .collect();

    set.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(date: (i32, u32, u32), collaborator: &str, department: &str, client: &str) -> WorkRecord {
        let date = NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap();
        WorkRecord {
            collaborator: collaborator.to_string(),
            date,
            department: department.to_string(),
            macro_activity: "Grafica".to_string(),
            micro_activity: String::new(),
            client: client.to_string(),
            note: String::new(),
            minutes_spent: 60.0,
            month_label: crate::utils::month_label(date).to_string(),
        }
    }

    fn set(values: &[&str]) -> Option<BTreeSet<String>> {
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let records = vec![
            record((2024, 1, 1), "Mario", "Design", "Acme"),
            record((2024, 1, 15), "Mario", "Design", "Acme"),
            record((2024, 1, 31), "Mario", "Design", "Acme"),
            record((2024, 2, 1), "Mario", "Design", "Acme"),
        ];
        let criteria = FilterCriteria::for_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );

        let filtered = filter_records(&records, &criteria);
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_dimensions_are_conjunctive() {
        let records = vec![
            record((2024, 1, 10), "Mario", "Design", "Acme"),
            record((2024, 1, 10), "Mario", "Web", "Acme"),
            record((2024, 1, 10), "Luigi", "Design", "Acme"),
        ];
        let mut criteria = FilterCriteria::for_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        criteria.collaborators = set(&["Mario"]);
        criteria.departments = set(&["Design"]);

        let filtered = filter_records(&records, &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].collaborator, "Mario");
        assert_eq!(filtered[0].department, "Design");
    }

    #[test]
    fn test_within_dimension_is_disjunctive() {
        let records = vec![
            record((2024, 1, 10), "Mario", "Design", "Acme"),
            record((2024, 1, 10), "Luigi", "Web", "Globex"),
            record((2024, 1, 10), "Anna", "Web", "Initech"),
        ];
        let mut criteria = FilterCriteria::for_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        criteria.clients = set(&["Acme", "Globex"]);

        let filtered = filter_records(&records, &criteria);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_empty_set_means_unrestricted() {
        let records = vec![record((2024, 1, 10), "Mario", "Design", "Acme")];
        let mut criteria = FilterCriteria::for_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        criteria.collaborators = Some(BTreeSet::new());

        assert_eq!(filter_records(&records, &criteria).len(), 1);
    }

    #[test]
    fn test_removing_a_restriction_only_grows_the_result() {
        let records = vec![
            record((2024, 1, 10), "Mario", "Design", "Acme"),
            record((2024, 1, 11), "Luigi", "Web", "Globex"),
            record((2024, 1, 12), "Anna", "Design", "Acme"),
        ];
        let mut restricted = FilterCriteria::for_range(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        );
        restricted.departments = set(&["Design"]);
        restricted.clients = set(&["Acme"]);

        let mut relaxed = restricted.clone();
        relaxed.departments = None;

        let narrow = filter_records(&records, &restricted);
        let wide = filter_records(&records, &relaxed);

        assert!(wide.len() >= narrow.len());
        for record in &narrow {
            assert!(wide.contains(record));
        }
    }

    #[test]
    fn test_unique_values_sorted_and_deduplicated() {
        let records = vec![
            record((2024, 1, 10), "Mario", "Web", "Globex"),
            record((2024, 1, 11), "Mario", "Design", "Acme"),
            record((2024, 1, 12), "Luigi", "Design", "Acme"),
        ];

        assert_eq!(
            unique_values(&records, FieldCategory::Collaborator),
            vec!["Luigi".to_string(), "Mario".to_string()]
        );
        assert_eq!(
            unique_values(&records, FieldCategory::Department),
            vec!["Design".to_string(), "Web".to_string()]
        );
        // Blank micro-activities never show up as options.
        assert!(unique_values(&records, FieldCategory::MicroActivity).is_empty());
    }
}
