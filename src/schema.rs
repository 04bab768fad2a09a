use crate::utils::parse_eu_amount;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A raw spreadsheet row as the fetch adapter hands it over: every field is
/// still text, including the date and the minutes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    pub collaborator: String,
    pub date: String,
    pub department: String,
    pub macro_activity: String,
    pub micro_activity: String,
    pub client: String,
    pub note: String,
    pub minutes: String,
}

/// A validated, canonicalized time-log record. Only rows whose date parsed
/// successfully become `WorkRecord`s, so `date` is always a real calendar
/// day and `month_label` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkRecord {
    pub collaborator: String,
    pub date: NaiveDate,
    pub department: String,
    pub macro_activity: String,
    pub micro_activity: String,
    pub client: String,
    pub note: String,
    pub minutes_spent: f64,
    pub month_label: String,
}

/// The five free-text categories that go through fuzzy canonicalization.
/// Each category is normalized independently of the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Client,
    Collaborator,
    Department,
    MacroActivity,
    MicroActivity,
}

impl FieldCategory {
    pub const ALL: [FieldCategory; 5] = [
        FieldCategory::Client,
        FieldCategory::Collaborator,
        FieldCategory::Department,
        FieldCategory::MacroActivity,
        FieldCategory::MicroActivity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FieldCategory::Client => "clients",
            FieldCategory::Collaborator => "collaborators",
            FieldCategory::Department => "departments",
            FieldCategory::MacroActivity => "macro_activities",
            FieldCategory::MicroActivity => "micro_activities",
        }
    }

    pub fn get<'a>(&self, record: &'a WorkRecord) -> &'a str {
        match self {
            FieldCategory::Client => &record.client,
            FieldCategory::Collaborator => &record.collaborator,
            FieldCategory::Department => &record.department,
            FieldCategory::MacroActivity => &record.macro_activity,
            FieldCategory::MicroActivity => &record.micro_activity,
        }
    }

    pub fn set(&self, record: &mut WorkRecord, value: String) {
        match self {
            FieldCategory::Client => record.client = value,
            FieldCategory::Collaborator => record.collaborator = value,
            FieldCategory::Department => record.department = value,
            FieldCategory::MacroActivity => record.macro_activity = value,
            FieldCategory::MicroActivity => record.micro_activity = value,
        }
    }
}

/// Monthly compensation per collaborator. Sparse: a missing month means no
/// compensation that month. Amounts are numeric because the sheet adapter
/// parses compensation cells eagerly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompensationTable {
    pub rows: BTreeMap<String, BTreeMap<String, f64>>,
}

impl CompensationTable {
    pub fn insert(&mut self, collaborator: &str, month: &str, amount: f64) {
        self.rows
            .entry(collaborator.to_string())
            .or_default()
            .insert(month.to_string(), amount);
    }

    pub fn amount(&self, collaborator: &str, month: &str) -> f64 {
        self.rows
            .get(collaborator)
            .and_then(|months| months.get(month))
            .copied()
            .unwrap_or(0.0)
    }

    /// Total compensation for one collaborator across a set of month labels.
    pub fn total_for(&self, collaborator: &str, months: &BTreeSet<String>) -> f64 {
        months.iter().map(|m| self.amount(collaborator, m)).sum()
    }
}

/// Monthly revenue per (billing-side) client name. Cells stay in their raw
/// display form (`"1.234,56"`, `"€ 10,00"`, sometimes plain numbers) and are
/// parsed at lookup; absent or unparsable cells count as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueTable {
    pub rows: BTreeMap<String, BTreeMap<String, String>>,
}

impl RevenueTable {
    pub fn insert(&mut self, client: &str, month: &str, raw_amount: &str) {
        self.rows
            .entry(client.to_string())
            .or_default()
            .insert(month.to_string(), raw_amount.to_string());
    }

    pub fn amount(&self, client: &str, month: &str) -> f64 {
        self.rows
            .get(client)
            .and_then(|months| months.get(month))
            .map(|raw| parse_eu_amount(raw))
            .unwrap_or(0.0)
    }

    pub fn total_for(&self, client: &str, months: &BTreeSet<String>) -> f64 {
        months.iter().map(|m| self.amount(client, m)).sum()
    }
}

// Billing-system names paired with the names used in the logbook. Applied
// when the billing sheet is fetched without its own mapping tab.
static DEFAULT_CLIENT_REMAP: Lazy<Vec<(&str, &str)>> = Lazy::new(|| {
    vec![
        ("ACOS MEDICA", "Acos Medica"),
        ("Bovo Garden Srl", "Flobflower"),
        ("Business Gates S.r.l.", "Business Gates"),
        ("CARL ZEISS VISION ITALIA S.P.A.", "Zeiss"),
        ("CAROVILLA PIERLUIGI (SONIT)", "Sonit"),
        ("Cisa S.p.a.", "Cisa"),
        ("CoLibrì System S.p.A.", "Colibrì"),
        ("CURCAPIL DI CARLUCCI DONATO SNC", "Curcapil"),
        ("Elettrocasa S.r.l.", "Elettrocasa"),
        ("FIDELIA - S.R.L.", "Casaviva"),
        ("FLO.MAR. S.R.L.S.", "Flomar"),
        ("Fratelli Bonella", "Fratelli Bonella"),
        ("HOMIT S.R.L.", "Divani Store"),
        ("NOWAVE", "Nowave"),
        ("PATRIZIO BRESEGHELLO", "Patrizio Breseghello"),
        ("POLONORD ADESTE", "Polonord"),
        ("SAIET", "Saiet"),
        ("SAN PIETRO LAB", "San Pietro Lab"),
        ("Sivec Srl", "Passione Fiori"),
        ("STILMAR DI MARISE RICCARDO (COCCOLE)", "Coccole"),
        ("TOMAINO SRL", "Tomaino"),
    ]
});

/// Maps logbook client names to the names the billing system uses, so
/// revenue lookups hit the right `RevenueTable` row. Names without an entry
/// resolve to themselves. Only revenue resolution uses this; record grouping
/// never does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClientNameRemap {
    to_billing: BTreeMap<String, String>,
}

impl ClientNameRemap {
    /// Builds a remap from (billing name, logbook name) pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let to_billing = pairs
            .into_iter()
            .map(|(billing, record)| (record.into(), billing.into()))
            .collect();
        Self { to_billing }
    }

    /// An identity remap with no entries.
    pub fn empty() -> Self {
        Self {
            to_billing: BTreeMap::new(),
        }
    }

    /// Resolves a logbook client name to its billing-system name.
    pub fn resolve<'a>(&'a self, record_name: &'a str) -> &'a str {
        self.to_billing
            .get(record_name)
            .map(String::as_str)
            .unwrap_or(record_name)
    }
}

impl Default for ClientNameRemap {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_CLIENT_REMAP.iter().copied())
    }
}

/// Date range plus optional per-dimension restrictions. The range is
/// inclusive at both ends. A dimension that is `None` or holds an empty set
/// places no restriction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub collaborators: Option<BTreeSet<String>>,
    pub departments: Option<BTreeSet<String>>,
    pub macro_activities: Option<BTreeSet<String>>,
    pub clients: Option<BTreeSet<String>>,
}

impl FilterCriteria {
    /// A criteria covering a date range with no dimension restrictions.
    pub fn for_range(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            collaborators: None,
            departments: None,
            macro_activities: None,
            clients: None,
        }
    }

    pub(crate) fn date_in_range(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Global KPIs over the filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub total_hours: f64,
    pub average_hourly_cost: f64,
    pub filtered_hours_cost: f64,
    pub total_revenue: f64,
    pub margin: f64,
    pub margin_percentage: f64,
}

/// One collaborator's row in the per-collaborator summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaboratorSummaryRow {
    pub collaborator: String,
    pub total_compensation: f64,
    pub total_period_hours: f64,
    /// Compensation divided by period hours; -1.0 flags "compensated with
    /// zero logged hours", 0.0 means neither hours nor compensation.
    pub effective_hourly_rate: f64,
    pub filtered_hours: f64,
    pub clients_served: usize,
}

/// One department's row: hours, descriptive counts, and proportionally
/// allocated cost/revenue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentSummaryRow {
    pub department: String,
    pub total_period_hours: f64,
    pub filtered_hours: f64,
    pub clients_served: usize,
    pub collaborators: usize,
    pub macro_activities: usize,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub margin: f64,
    pub margin_percentage: f64,
}

/// One client's row: hours, collaborator count, allocated cost, and the
/// client's own revenue over the selected months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummaryRow {
    pub client: String,
    pub total_period_hours: f64,
    pub filtered_hours: f64,
    pub collaborators: usize,
    pub total_cost: f64,
    pub total_revenue: f64,
    pub margin: f64,
    pub margin_percentage: f64,
}

/// A (label, hours) pair produced by the hours-by-dimension aggregators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoursByLabel {
    pub label: String,
    pub hours: f64,
}

/// One client's row in the monthly revenue matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenueRow {
    pub client: String,
    pub monthly: BTreeMap<String, f64>,
    pub total: f64,
}

/// Client × month revenue matrix for the export view, with per-month totals
/// and a grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRevenueMatrix {
    pub months: Vec<String>,
    pub rows: Vec<MonthlyRevenueRow>,
    pub monthly_totals: BTreeMap<String, f64>,
    pub grand_total: f64,
}

impl MonthlyRevenueMatrix {
    /// Renders the matrix as CSV: a header row, one row per client with
    /// two-decimal amounts, and a final `TOTALE` row. Client names are
    /// quoted as in the original export.
    pub fn to_csv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);

        let mut header = vec!["Cliente".to_string()];
        header.extend(self.months.iter().cloned());
        header.push("Totale".to_string());
        lines.push(header.join(","));

        for row in &self.rows {
            let mut cells = vec![format!("\"{}\"", row.client)];
            for month in &self.months {
                let value = row.monthly.get(month).copied().unwrap_or(0.0);
                cells.push(format!("{:.2}", value));
            }
            cells.push(format!("{:.2}", row.total));
            lines.push(cells.join(","));
        }

        let mut totals = vec!["\"TOTALE\"".to_string()];
        for month in &self.months {
            let value = self.monthly_totals.get(month).copied().unwrap_or(0.0);
            totals.push(format!("{:.2}", value));
        }
        totals.push(format!("{:.2}", self.grand_total));
        lines.push(totals.join(","));

        lines.join("\n")
    }
}
