use chrono::{Datelike, NaiveDate};
use num_format::{Locale, ToFormattedString};

/// Parses a display-formatted European monetary string into a number.
///
/// Accepts values like `"1.234,56"` or `"€ 10,00"`: the currency symbol is
/// stripped, `.` is treated as a thousands separator and `,` as the decimal
/// separator. A plain decimal-point number (`"10.5"`) is accepted as-is.
/// Anything unparsable yields 0.0, never an error.
pub fn parse_eu_amount(amount: &str) -> f64 {
    let mut clean = amount.replace('€', "").trim().to_string();

    // Dots are separators only when a decimal comma is present; a bare
    // "10.5" stays a decimal-point number.
    if clean.contains(',') {
        clean = clean.replace('.', "").replace(',', ".");
    }

    clean.parse::<f64>().unwrap_or(0.0)
}

/// Returns the Italian month name for a date. Compensation and revenue
/// tables are keyed by these labels.
pub fn month_label(date: NaiveDate) -> &'static str {
    match date.month() {
        1 => "Gennaio",
        2 => "Febbraio",
        3 => "Marzo",
        4 => "Aprile",
        5 => "Maggio",
        6 => "Giugno",
        7 => "Luglio",
        8 => "Agosto",
        9 => "Settembre",
        10 => "Ottobre",
        11 => "Novembre",
        _ => "Dicembre",
    }
}

/// Formats a monetary value in the Italian convention: grouped integer part,
/// decimal comma, trailing euro sign (`1.234,56 €`).
pub fn format_currency(value: f64) -> String {
    let neg = value < 0.0;
    let abs = value.abs();

    let fixed = format!("{:.2}", abs);
    let mut parts = fixed.split('.');
    let int_part: i64 = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let frac_part = parts.next().unwrap_or("00");

    let grouped = int_part.to_formatted_string(&Locale::it);
    if neg {
        format!("-{},{} €", grouped, frac_part)
    } else {
        format!("{},{} €", grouped, frac_part)
    }
}
