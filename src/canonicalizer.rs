//! Clusters near-duplicate free-text labels into canonical representatives.
//!
//! Labels are compared through [`crate::similarity::similarity`] against the
//! key of each existing cluster; the first cluster at or above the threshold
//! absorbs the label. Within a cluster the most frequent member (over the
//! full input multiset) becomes canonical. Manual overrides are applied last
//! and always win.

use crate::overrides::MappingOverrides;
use crate::schema::{FieldCategory, WorkRecord};
use crate::similarity::{normalize_for_comparison, similarity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Threshold used throughout the system unless a caller picks its own.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 85.0;

struct Cluster<'a> {
    /// Normalized form of the first member; every candidate is compared
    /// against this key, never against later members.
    key: String,
    members: Vec<&'a str>,
}

/// Maps every distinct label in `labels` to one canonical label.
///
/// `labels` is the full multiset (duplicates included): occurrence counts
/// drive which member of a cluster becomes canonical, with ties keeping the
/// first-seen member. Distinct labels are clustered in first-appearance
/// order and the first sufficiently-similar cluster wins; a later, closer
/// cluster is never reconsidered. This greedy order dependence is part of
/// the output contract.
///
/// Cost is O(D² · L) over D distinct labels of average length L, which is
/// acceptable for vocabularies in the low thousands.
pub fn canonicalize(
    labels: &[&str],
    threshold: f64,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut distinct: Vec<&str> = Vec::new();
    for &label in labels {
        let count = counts.entry(label).or_insert(0);
        if *count == 0 {
            distinct.push(label);
        }
        *count += 1;
    }

    let mut clusters: Vec<Cluster> = Vec::new();
    for label in distinct {
        let normalized = normalize_for_comparison(label);

        let mut absorbed = false;
        for cluster in clusters.iter_mut() {
            if similarity(&normalized, &cluster.key) >= threshold {
                cluster.members.push(label);
                absorbed = true;
                break;
            }
        }

        if !absorbed {
            clusters.push(Cluster {
                key: normalized,
                members: vec![label],
            });
        }
    }

    let mut mapping = BTreeMap::new();
    for cluster in &clusters {
        let mut canonical = cluster.members[0];
        let mut max_count = counts[canonical];
        for &member in &cluster.members {
            if counts[member] > max_count {
                max_count = counts[member];
                canonical = member;
            }
        }

        for &member in &cluster.members {
            mapping.insert(member.to_string(), canonical.to_string());
        }
    }

    for (raw, forced) in overrides {
        mapping.insert(raw.clone(), forced.clone());
    }

    mapping
}

/// Per-category canonicalization statistics plus the non-identity mappings,
/// for the mapping-inspection view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub distinct_labels: usize,
    pub canonical_labels: usize,
    pub mappings_applied: usize,
    /// Only the entries that actually change a label.
    pub mappings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    pub threshold: f64,
    pub categories: BTreeMap<String, CategoryMapping>,
}

/// Runs the canonicalizer over all five categories of a record set and
/// reports what it would change. Blank labels are skipped.
pub fn build_mapping_report(
    records: &[WorkRecord],
    threshold: f64,
    overrides: &MappingOverrides,
) -> MappingReport {
    let mut categories = BTreeMap::new();

    for category in FieldCategory::ALL {
        let labels: Vec<&str> = records
            .iter()
            .map(|r| category.get(r))
            .filter(|label| !label.trim().is_empty())
            .collect();

        let mapping = canonicalize(&labels, threshold, overrides.for_category(category));

        let canonical_labels: BTreeSet<&String> = mapping.values().collect();
        let non_identity: BTreeMap<String, String> = mapping
            .iter()
            .filter(|(raw, canonical)| raw != canonical)
            .map(|(raw, canonical)| (raw.clone(), canonical.clone()))
            .collect();

        categories.insert(
            category.name().to_string(),
            CategoryMapping {
                distinct_labels: mapping.len(),
                canonical_labels: canonical_labels.len(),
                mappings_applied: non_identity.len(),
                mappings: non_identity,
            },
        );
    }

    MappingReport {
        threshold,
        categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn test_frequency_picks_canonical() {
        // "Jhon Doe" three times, "John Doe" seven times; at a threshold
        // they cluster under, every variant maps to the frequent spelling.
        let mut labels = vec!["Jhon Doe"; 3];
        labels.extend(vec!["John Doe"; 7]);

        let mapping = canonicalize(&labels, 70.0, &no_overrides());

        assert_eq!(mapping["Jhon Doe"], "John Doe");
        assert_eq!(mapping["John Doe"], "John Doe");
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_casing_variants_cluster_at_default_threshold() {
        let labels = ["acme srl", "ACME SRL", "Acme Srl", "ACME SRL"];
        let mapping = canonicalize(&labels, DEFAULT_SIMILARITY_THRESHOLD, &no_overrides());

        // "ACME SRL" appears twice and wins the count.
        for label in labels {
            assert_eq!(mapping[label], "ACME SRL");
        }
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let labels = ["Acme Srl", "ACME SRL"];
        let mapping = canonicalize(&labels, DEFAULT_SIMILARITY_THRESHOLD, &no_overrides());

        assert_eq!(mapping["Acme Srl"], "Acme Srl");
        assert_eq!(mapping["ACME SRL"], "Acme Srl");
    }

    #[test]
    fn test_distant_labels_get_own_clusters() {
        let labels = ["Acme", "Globex", "Initech"];
        let mapping = canonicalize(&labels, DEFAULT_SIMILARITY_THRESHOLD, &no_overrides());

        for label in labels {
            assert_eq!(mapping[label], label);
        }
    }

    #[test]
    fn test_idempotent_on_canonical_set() {
        let labels = ["Mario Rossi", "Luigi Verdi", "Anna Bianchi"];
        let first = canonicalize(&labels, DEFAULT_SIMILARITY_THRESHOLD, &no_overrides());

        let canonical: Vec<&str> = first.values().map(String::as_str).collect();
        let second = canonicalize(&canonical, DEFAULT_SIMILARITY_THRESHOLD, &no_overrides());

        for (raw, canonical) in &second {
            assert_eq!(raw, canonical);
        }
    }

    #[test]
    fn test_overrides_always_win() {
        let labels = ["Jhon Doe", "John Doe", "John Doe"];
        let mut overrides = BTreeMap::new();
        overrides.insert("Jhon Doe".to_string(), "Dr. John Doe".to_string());

        let mapping = canonicalize(&labels, 70.0, &overrides);

        assert_eq!(mapping["Jhon Doe"], "Dr. John Doe");
        // Non-overridden members keep the clustering result.
        assert_eq!(mapping["John Doe"], "John Doe");
    }

    #[test]
    fn test_override_applies_regardless_of_threshold() {
        let labels = ["Acme"];
        let mut overrides = BTreeMap::new();
        overrides.insert("Acme".to_string(), "Acme Medica".to_string());

        for threshold in [0.0, 50.0, 100.0] {
            let mapping = canonicalize(&labels, threshold, &overrides);
            assert_eq!(mapping["Acme"], "Acme Medica");
        }
    }

    #[test]
    fn test_first_match_wins_over_closer_later_cluster() {
        // "bcdef" is 40% similar to "abcd" and 80% similar to "cdef", but
        // "abcd" was clustered first and clears the threshold, so it absorbs
        // the label. Order decides, not best score.
        let labels = ["abcd", "cdef", "bcdef"];
        let mapping = canonicalize(&labels, 40.0, &no_overrides());

        assert_eq!(mapping["bcdef"], "abcd");
    }

    #[test]
    fn test_every_input_label_is_mapped() {
        let labels = ["a", "bb", "ccc", "a", "bb"];
        let mapping = canonicalize(&labels, DEFAULT_SIMILARITY_THRESHOLD, &no_overrides());

        for label in labels {
            assert!(mapping.contains_key(label));
        }
    }

    #[test]
    fn test_mapping_report_counts() {
        use chrono::NaiveDate;

        let record = |collaborator: &str| WorkRecord {
            collaborator: collaborator.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            department: "Design".to_string(),
            macro_activity: "Grafica".to_string(),
            micro_activity: String::new(),
            client: "Acme".to_string(),
            note: String::new(),
            minutes_spent: 30.0,
            month_label: "Gennaio".to_string(),
        };

        let records = vec![
            record("John Doe"),
            record("John Doe"),
            record("Jhon Doe"),
        ];

        let report = build_mapping_report(&records, 70.0, &MappingOverrides::default());
        let collaborators = &report.categories["collaborators"];

        assert_eq!(collaborators.distinct_labels, 2);
        assert_eq!(collaborators.canonical_labels, 1);
        assert_eq!(collaborators.mappings_applied, 1);
        assert_eq!(collaborators.mappings["Jhon Doe"], "John Doe");

        // Blank micro-activities are skipped entirely.
        let micro = &report.categories["micro_activities"];
        assert_eq!(micro.distinct_labels, 0);
    }
}
