//! # Logbook Analytics
//!
//! A library for turning inconsistently-typed time-log spreadsheets into
//! reliable hours, cost, revenue and margin figures.
//!
//! ## Core Concepts
//!
//! - **Canonicalization**: near-duplicate free-text labels ("Jhon Doe",
//!   "John Doe") are clustered by edit-distance similarity so aggregation is
//!   not fragmented by typos, casing or spacing variants
//! - **Filtering**: an inclusive date range plus optional collaborator /
//!   department / macro-activity / client restrictions, ANDed together
//! - **Proportional allocation**: shared compensation and shared revenue are
//!   split across collaborators, departments and clients in proportion to
//!   the hours each logged, never by identity alone
//!
//! Every stage is a pure function over immutable inputs: recomputing with
//! the same dataset, filter and overrides reproduces identical output.
//!
//! ## Example
//!
//! ```rust,ignore
//! use logbook_analytics::*;
//! use chrono::NaiveDate;
//!
//! let raw: Vec<RawRecord> = fetch_rows();
//! let overrides = MappingOverrides::load("mapping-overrides.json")?;
//! let records = normalize_records(&raw, DEFAULT_SIMILARITY_THRESHOLD, &overrides)?;
//!
//! let criteria = FilterCriteria::for_range(
//!     NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
//! );
//! let report = build_dashboard_report(
//!     &records,
//!     &criteria,
//!     &compensation,
//!     &revenue,
//!     &ClientNameRemap::default(),
//! );
//! println!("margin: {}", format_currency(report.kpis.margin));
//! ```

pub mod aggregate;
pub mod canonicalizer;
pub mod error;
pub mod filter;
pub mod kpi;
pub mod normalizer;
pub mod overrides;
pub mod schema;
pub mod similarity;
pub mod utils;

pub use aggregate::{
    hours_by_client, hours_by_collaborator, hours_by_department, hours_by_macro_activity,
    hours_by_micro_activity,
};
pub use canonicalizer::{
    build_mapping_report, canonicalize, CategoryMapping, MappingReport,
    DEFAULT_SIMILARITY_THRESHOLD,
};
pub use error::{AnalyticsError, Result};
pub use filter::{filter_records, record_passes, unique_values};
pub use kpi::{
    calculate_kpis, client_summary, collaborator_summary, department_summary,
    monthly_revenue_matrix, selected_months, COMPENSATED_ZERO_HOURS_RATE,
};
pub use normalizer::{normalize_records, parse_record_date};
pub use overrides::MappingOverrides;
pub use schema::*;
pub use similarity::{levenshtein_distance, normalize_for_comparison, similarity};
pub use utils::{format_currency, month_label, parse_eu_amount};

use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Everything the presentation layer renders for one filter selection,
/// computed in a single pass over the canonical record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub kpis: KpiSummary,
    pub hours_by_collaborator: Vec<HoursByLabel>,
    pub hours_by_client: Vec<HoursByLabel>,
    pub hours_by_department: Vec<HoursByLabel>,
    pub hours_by_macro_activity: Vec<HoursByLabel>,
    pub hours_by_micro_activity: Vec<HoursByLabel>,
    pub collaborator_summary: Vec<CollaboratorSummaryRow>,
    pub department_summary: Vec<DepartmentSummaryRow>,
    pub client_summary: Vec<ClientSummaryRow>,
    pub revenue_matrix: MonthlyRevenueMatrix,
    pub record_count: usize,
}

/// Filters the canonical record set and computes the full dashboard:
/// global KPIs, the five hours aggregations, the three summaries and the
/// monthly revenue matrix.
pub fn build_dashboard_report(
    records: &[WorkRecord],
    criteria: &FilterCriteria,
    compensation: &CompensationTable,
    revenue: &RevenueTable,
    remap: &ClientNameRemap,
) -> DashboardReport {
    let filtered = filter_records(records, criteria);
    info!(
        "Building dashboard report over {} of {} records ({} - {})",
        filtered.len(),
        records.len(),
        criteria.start_date,
        criteria.end_date
    );

    let kpis = calculate_kpis(&filtered, records, criteria, compensation, revenue, remap);
    debug!(
        "KPIs: {:.2} hours, cost {:.2}, revenue {:.2}",
        kpis.total_hours, kpis.filtered_hours_cost, kpis.total_revenue
    );

    DashboardReport {
        kpis,
        hours_by_collaborator: hours_by_collaborator(&filtered),
        hours_by_client: hours_by_client(&filtered),
        hours_by_department: hours_by_department(&filtered),
        hours_by_macro_activity: hours_by_macro_activity(&filtered),
        hours_by_micro_activity: hours_by_micro_activity(&filtered),
        collaborator_summary: collaborator_summary(&filtered, records, compensation, criteria),
        department_summary: department_summary(
            &filtered,
            records,
            compensation,
            revenue,
            remap,
            criteria,
        ),
        client_summary: client_summary(
            &filtered,
            records,
            compensation,
            revenue,
            remap,
            criteria,
        ),
        revenue_matrix: monthly_revenue_matrix(&filtered, revenue, remap),
        record_count: filtered.len(),
    }
}
