//! Display formatting shared by tooltips, labels and exports.

use crate::data::MonthName;
use chrono::NaiveDate;

/// Colombian-peso amount in es-CO style: `$ 1.234.567,89`.
pub fn format_cop(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u128;
    let units = (cents / 100).to_string();
    let decimals = cents % 100;

    let mut grouped = String::with_capacity(units.len() + units.len() / 3);
    for (i, digit) in units.chars().enumerate() {
        if i > 0 && (units.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}$ {grouped},{decimals:02}")
}

/// Round to `decimals` places with ties away from zero. `format!` alone
/// rounds ties to even, so `12.5` would print as `12`.
fn round_half_away(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Whole percentage of a 0..1 share, `0.6667 -> "67%"`, `0.125 -> "13%"`.
pub fn format_percent(share: f64) -> String {
    format!("{:.0}%", round_half_away(share * 100.0, 0))
}

/// ICV value with two decimals, `12.3456 -> "12.35%"`.
pub fn format_icv(icv: f64) -> String {
    format!("{:.2}%", round_half_away(icv, 2))
}

/// Day-first local date, `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Axis label for a timeline tick, e.g. `"Marzo 2024"`.
pub fn format_month_year(date: NaiveDate) -> String {
    format!("{} {}", MonthName::from_date(date), date.format("%Y"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cop_groups_thousands_with_dots() {
        assert_eq!(format_cop(1234567.891), "$ 1.234.567,89");
        assert_eq!(format_cop(999.5), "$ 999,50");
        assert_eq!(format_cop(0.0), "$ 0,00");
        assert_eq!(format_cop(1000.0), "$ 1.000,00");
        assert_eq!(format_cop(-2500.25), "-$ 2.500,25");
    }

    #[test]
    fn percent_and_icv() {
        assert_eq!(format_percent(2.0 / 3.0), "67%");
        assert_eq!(format_percent(1.0), "100%");
        assert_eq!(format_icv(7.0), "7.00%");
    }

    #[test]
    fn ties_round_away_from_zero() {
        assert_eq!(format_percent(0.125), "13%");
        assert_eq!(format_percent(0.625), "63%");
        assert_eq!(format_percent(0.375), "38%");
        assert_eq!(format_icv(0.125), "0.13%");
        assert_eq!(format_icv(2.5), "2.50%");
    }

    #[test]
    fn dates() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_date(date), "05/03/2024");
        assert_eq!(format_month_year(date), "Marzo 2024");
    }
}
