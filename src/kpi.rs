//! Financial KPIs over a filtered record set.
//!
//! Cost attribution always routes through a collaborator's own effective
//! hourly rate; revenue attribution splits each client's revenue across
//! entities in proportion to the filtered hours logged against that client.
//! The shares across every department that touched a client sum back to the
//! client's own total.

use crate::schema::{
    ClientNameRemap, ClientSummaryRow, CollaboratorSummaryRow, CompensationTable,
    DepartmentSummaryRow, FilterCriteria, KpiSummary, MonthlyRevenueMatrix, MonthlyRevenueRow,
    RevenueTable, WorkRecord,
};
use std::collections::{BTreeMap, BTreeSet};

/// Sentinel rate for a collaborator who was compensated in the selected
/// months but logged zero hours in the whole period.
pub const COMPENSATED_ZERO_HOURS_RATE: f64 = -1.0;

fn hours_of<'a>(records: impl Iterator<Item = &'a WorkRecord>) -> f64 {
    records.map(|r| r.minutes_spent).sum::<f64>() / 60.0
}

/// Distinct month labels present in the filtered set; these are the time
/// buckets every compensation and revenue lookup uses.
pub fn selected_months(filtered: &[WorkRecord]) -> BTreeSet<String> {
    filtered.iter().map(|r| r.month_label.clone()).collect()
}

fn distinct_values<'a, F>(records: &'a [WorkRecord], field: F) -> BTreeSet<&'a str>
where
    F: Fn(&'a WorkRecord) -> &'a str,
{
    records.iter().map(field).collect()
}

/// Hours per collaborator over ALL records inside the date range,
/// unfiltered by the other dimensions. This is the denominator for every
/// hourly-rate computation, so a narrow filter cannot distort it.
fn period_hours_by_collaborator<'a>(
    all_records: &'a [WorkRecord],
    criteria: &FilterCriteria,
) -> BTreeMap<&'a str, f64> {
    let mut hours: BTreeMap<&str, f64> = BTreeMap::new();
    for record in all_records {
        if criteria.date_in_range(record.date) {
            *hours.entry(record.collaborator.as_str()).or_insert(0.0) +=
                record.minutes_spent / 60.0;
        }
    }
    hours
}

/// Effective hourly cost per collaborator present in the filtered set:
/// compensation over the selected months divided by period hours, 0 when no
/// hours were logged.
fn hourly_cost_by_collaborator(
    filtered: &[WorkRecord],
    all_records: &[WorkRecord],
    compensation: &CompensationTable,
    criteria: &FilterCriteria,
) -> BTreeMap<String, f64> {
    let months = selected_months(filtered);
    let period_hours = period_hours_by_collaborator(all_records, criteria);

    let mut rates = BTreeMap::new();
    for name in distinct_values(filtered, |r| r.collaborator.as_str()) {
        let total_compensation = compensation.total_for(name, &months);
        let hours = period_hours.get(name).copied().unwrap_or(0.0);
        let rate = if hours > 0.0 {
            total_compensation / hours
        } else {
            0.0
        };
        rates.insert(name.to_string(), rate);
    }
    rates
}

/// Filtered hours per client across the entire filtered set; the
/// denominator of every proportional revenue split.
fn filtered_hours_by_client(filtered: &[WorkRecord]) -> BTreeMap<&str, f64> {
    let mut hours: BTreeMap<&str, f64> = BTreeMap::new();
    for record in filtered {
        *hours.entry(record.client.as_str()).or_insert(0.0) += record.minutes_spent / 60.0;
    }
    hours
}

fn margin_percentage(total_revenue: f64, margin: f64) -> f64 {
    if total_revenue > 0.0 {
        100.0 * margin / total_revenue
    } else {
        0.0
    }
}

/// Global KPIs for the current filter.
///
/// The hourly-cost denominator spans the full date-range activity of the
/// relevant collaborators (not just the filtered rows), and revenue lookups
/// go through the client remap.
pub fn calculate_kpis(
    filtered: &[WorkRecord],
    all_records: &[WorkRecord],
    criteria: &FilterCriteria,
    compensation: &CompensationTable,
    revenue: &RevenueTable,
    remap: &ClientNameRemap,
) -> KpiSummary {
    let total_hours = hours_of(filtered.iter());
    let months = selected_months(filtered);

    let relevant_collaborators: BTreeSet<String> = match &criteria.collaborators {
        Some(set) if !set.is_empty() => set.clone(),
        _ => distinct_values(filtered, |r| r.collaborator.as_str())
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let total_cost: f64 = relevant_collaborators
        .iter()
        .map(|name| compensation.total_for(name, &months))
        .sum();

    let total_company_hours = hours_of(all_records.iter().filter(|r| {
        criteria.date_in_range(r.date) && relevant_collaborators.contains(&r.collaborator)
    }));

    let average_hourly_cost = if total_company_hours > 0.0 {
        total_cost / total_company_hours
    } else {
        0.0
    };
    let filtered_hours_cost = total_hours * average_hourly_cost;

    let relevant_clients: BTreeSet<String> = match &criteria.clients {
        Some(set) if !set.is_empty() => set.clone(),
        _ => distinct_values(filtered, |r| r.client.as_str())
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let total_revenue: f64 = relevant_clients
        .iter()
        .map(|client| revenue.total_for(remap.resolve(client), &months))
        .sum();

    let margin = total_revenue - filtered_hours_cost;

    KpiSummary {
        total_hours,
        average_hourly_cost,
        filtered_hours_cost,
        total_revenue,
        margin,
        margin_percentage: margin_percentage(total_revenue, margin),
    }
}

/// Per-collaborator rows over the filtered set, alphabetical by name.
pub fn collaborator_summary(
    filtered: &[WorkRecord],
    all_records: &[WorkRecord],
    compensation: &CompensationTable,
    criteria: &FilterCriteria,
) -> Vec<CollaboratorSummaryRow> {
    let months = selected_months(filtered);
    let period_hours = period_hours_by_collaborator(all_records, criteria);

    distinct_values(filtered, |r| r.collaborator.as_str())
        .into_iter()
        .map(|name| {
            let own_rows: Vec<&WorkRecord> =
                filtered.iter().filter(|r| r.collaborator == name).collect();
            let filtered_hours = hours_of(own_rows.iter().copied());
            let clients_served = own_rows
                .iter()
                .map(|r| r.client.as_str())
                .collect::<BTreeSet<_>>()
                .len();

            let total_compensation = compensation.total_for(name, &months);
            let total_period_hours = period_hours.get(name).copied().unwrap_or(0.0);

            let effective_hourly_rate = if total_period_hours > 0.0 {
                total_compensation / total_period_hours
            } else if total_compensation > 0.0 {
                COMPENSATED_ZERO_HOURS_RATE
            } else {
                0.0
            };

            CollaboratorSummaryRow {
                collaborator: name.to_string(),
                total_compensation,
                total_period_hours,
                effective_hourly_rate,
                filtered_hours,
                clients_served,
            }
        })
        .collect()
}

/// Per-department rows with proportionally allocated cost and revenue,
/// alphabetical by department.
pub fn department_summary(
    filtered: &[WorkRecord],
    all_records: &[WorkRecord],
    compensation: &CompensationTable,
    revenue: &RevenueTable,
    remap: &ClientNameRemap,
    criteria: &FilterCriteria,
) -> Vec<DepartmentSummaryRow> {
    let months = selected_months(filtered);
    let rates = hourly_cost_by_collaborator(filtered, all_records, compensation, criteria);
    let client_hours = filtered_hours_by_client(filtered);

    distinct_values(filtered, |r| r.department.as_str())
        .into_iter()
        .map(|department| {
            let dept_rows: Vec<&WorkRecord> = filtered
                .iter()
                .filter(|r| r.department == department)
                .collect();

            let filtered_hours = hours_of(dept_rows.iter().copied());
            let clients_served: BTreeSet<&str> =
                dept_rows.iter().map(|r| r.client.as_str()).collect();
            let collaborators: BTreeSet<&str> =
                dept_rows.iter().map(|r| r.collaborator.as_str()).collect();
            let macro_activities: BTreeSet<&str> =
                dept_rows.iter().map(|r| r.macro_activity.as_str()).collect();

            let total_period_hours = hours_of(
                all_records
                    .iter()
                    .filter(|r| r.department == department && criteria.date_in_range(r.date)),
            );

            // Cost: each contributing collaborator's own hourly rate times
            // the hours they logged for this department.
            let total_cost: f64 = collaborators
                .iter()
                .map(|name| {
                    let hours = hours_of(
                        dept_rows
                            .iter()
                            .copied()
                            .filter(|r| r.collaborator == *name),
                    );
                    rates.get(*name).copied().unwrap_or(0.0) * hours
                })
                .sum();

            // Revenue: this department's share of each client's revenue,
            // proportional to the hours it logged against that client.
            let total_revenue: f64 = clients_served
                .iter()
                .map(|client| {
                    let department_hours = hours_of(
                        dept_rows.iter().copied().filter(|r| r.client == *client),
                    );
                    let all_hours = client_hours.get(*client).copied().unwrap_or(0.0);
                    if all_hours > 0.0 {
                        let client_revenue = revenue.total_for(remap.resolve(client), &months);
                        client_revenue * department_hours / all_hours
                    } else {
                        0.0
                    }
                })
                .sum();

            let margin = total_revenue - total_cost;

            DepartmentSummaryRow {
                department: department.to_string(),
                total_period_hours,
                filtered_hours,
                clients_served: clients_served.len(),
                collaborators: collaborators.len(),
                macro_activities: macro_activities.len(),
                total_cost,
                total_revenue,
                margin,
                margin_percentage: margin_percentage(total_revenue, margin),
            }
        })
        .collect()
}

/// Per-client rows, alphabetical by client. Cost is allocated through each
/// contributing collaborator's hourly rate; revenue is the client's own
/// total over the selected months.
pub fn client_summary(
    filtered: &[WorkRecord],
    all_records: &[WorkRecord],
    compensation: &CompensationTable,
    revenue: &RevenueTable,
    remap: &ClientNameRemap,
    criteria: &FilterCriteria,
) -> Vec<ClientSummaryRow> {
    let months = selected_months(filtered);
    let rates = hourly_cost_by_collaborator(filtered, all_records, compensation, criteria);

    distinct_values(filtered, |r| r.client.as_str())
        .into_iter()
        .map(|client| {
            let client_rows: Vec<&WorkRecord> =
                filtered.iter().filter(|r| r.client == client).collect();

            let filtered_hours = hours_of(client_rows.iter().copied());
            let collaborators: BTreeSet<&str> =
                client_rows.iter().map(|r| r.collaborator.as_str()).collect();

            let total_period_hours = hours_of(
                all_records
                    .iter()
                    .filter(|r| r.client == client && criteria.date_in_range(r.date)),
            );

            let total_cost: f64 = collaborators
                .iter()
                .map(|name| {
                    let hours = hours_of(
                        client_rows
                            .iter()
                            .copied()
                            .filter(|r| r.collaborator == *name),
                    );
                    rates.get(*name).copied().unwrap_or(0.0) * hours
                })
                .sum();

            let total_revenue = revenue.total_for(remap.resolve(client), &months);
            let margin = total_revenue - total_cost;

            ClientSummaryRow {
                client: client.to_string(),
                total_period_hours,
                filtered_hours,
                collaborators: collaborators.len(),
                total_cost,
                total_revenue,
                margin,
                margin_percentage: margin_percentage(total_revenue, margin),
            }
        })
        .collect()
}

/// Client × month revenue matrix over the filtered set, with per-month
/// totals and a grand total. Month columns sort lexicographically, as the
/// export view does.
pub fn monthly_revenue_matrix(
    filtered: &[WorkRecord],
    revenue: &RevenueTable,
    remap: &ClientNameRemap,
) -> MonthlyRevenueMatrix {
    let months: Vec<String> = selected_months(filtered).into_iter().collect();
    let clients = distinct_values(filtered, |r| r.client.as_str());

    let mut rows = Vec::with_capacity(clients.len());
    let mut monthly_totals: BTreeMap<String, f64> =
        months.iter().map(|m| (m.clone(), 0.0)).collect();
    let mut grand_total = 0.0;

    for client in clients {
        let billing_name = remap.resolve(client);
        let mut monthly = BTreeMap::new();
        let mut total = 0.0;

        for month in &months {
            let amount = revenue.amount(billing_name, month);
            monthly.insert(month.clone(), amount);
            total += amount;
            *monthly_totals.entry(month.clone()).or_insert(0.0) += amount;
        }

        grand_total += total;
        rows.push(MonthlyRevenueRow {
            client: client.to_string(),
            monthly,
            total,
        });
    }

    MonthlyRevenueMatrix {
        months,
        rows,
        monthly_totals,
        grand_total,
    }
}
