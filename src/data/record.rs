//! Loan Record Model
//! One immutable row of the credit portfolio plus its ordinal categories.

use chrono::{Datelike, Month, NaiveDate};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Spanish calendar month names, January first.
const MONTH_NAMES_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Calendar month of a control date, ordered January to December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthName(Month);

impl MonthName {
    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_number(date.month()).unwrap_or(MonthName(Month::January))
    }

    /// Build from a 1-based month number.
    pub fn from_number(number: u32) -> Option<Self> {
        u8::try_from(number)
            .ok()
            .and_then(|n| Month::try_from(n).ok())
            .map(MonthName)
    }

    /// Parse a Spanish month name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        MONTH_NAMES_ES
            .iter()
            .position(|m| m.eq_ignore_ascii_case(name))
            .and_then(|idx| Self::from_number(idx as u32 + 1))
    }

    /// 1-based month number.
    pub fn number(&self) -> u32 {
        self.0.number_from_month()
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES_ES[(self.number() - 1) as usize]
    }
}

impl Ord for MonthName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number().cmp(&other.number())
    }
}

impl PartialOrd for MonthName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MonthName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Risk classification such as `"A. Bajo"`.
///
/// The leading rank is stripped for display but kept so levels sort in
/// their ordinal order instead of alphabetically by label. Numeric ranks
/// compare as numbers, so `"10"` follows `"2"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RiskLevel {
    rank: String,
    label: String,
}

impl RiskLevel {
    /// Split `"<rank>. <label>"` at the first dot. Raw values without a
    /// dot keep the whole trimmed text as label and an empty rank.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((rank, label)) => Self {
                rank: rank.trim().to_string(),
                label: label.trim().to_string(),
            },
            None => Self {
                rank: String::new(),
                label: raw.trim().to_string(),
            },
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rank(&self) -> &str {
        &self.rank
    }
}

impl Ord for RiskLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_rank = match (self.rank.parse::<u64>(), other.rank.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        };
        by_rank
            .then_with(|| self.rank.cmp(&other.rank))
            .then_with(|| self.label.cmp(&other.label))
    }
}

impl PartialOrd for RiskLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Days-past-due category such as `"B. 1 - 30 dias"`. The labels carry a
/// leading letter, so lexical order is ordinal order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DelinquencyBucket(String);

impl DelinquencyBucket {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into().trim().to_string())
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DelinquencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single loan observation at one control date.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    pub control_date: NaiveDate,
    pub month: MonthName,
    pub region: String,
    pub credit_type: String,
    pub risk_level: RiskLevel,
    pub bucket: DelinquencyBucket,
    pub delinquency_days: i64,
    pub balance: f64,
    /// Good/bad indicator, `"Buenos"` or `"Malos"` in the source data.
    pub standing: String,
}

impl LoanRecord {
    /// Whether this balance counts toward the portfolio at risk.
    pub fn is_delinquent(&self) -> bool {
        self.delinquency_days > 0
    }
}

/// The loaded portfolio. Cloning is cheap and never copies the rows.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[LoanRecord]>,
    skipped_rows: usize,
}

impl Dataset {
    pub fn new(records: Vec<LoanRecord>, skipped_rows: usize) -> Self {
        Self {
            records: records.into(),
            skipped_rows,
        }
    }

    pub fn records(&self) -> &[LoanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Source rows that could not be parsed.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_names_follow_calendar_order() {
        let enero = MonthName::parse("Enero").unwrap();
        let febrero = MonthName::parse("febrero").unwrap();
        let diciembre = MonthName::parse("Diciembre").unwrap();

        assert!(enero < febrero);
        assert!(febrero < diciembre);
        assert_eq!(diciembre.number(), 12);
        assert_eq!(enero.to_string(), "Enero");
        assert!(MonthName::parse("January").is_none());
    }

    #[test]
    fn month_from_date() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        assert_eq!(MonthName::from_date(date).name(), "Septiembre");
    }

    #[test]
    fn risk_level_strips_rank() {
        let level = RiskLevel::parse("B. Medio ");
        assert_eq!(level.label(), "Medio");
        assert_eq!(level.rank(), "B");
        assert_eq!(level.to_string(), "Medio");

        let bare = RiskLevel::parse("Alto");
        assert_eq!(bare.label(), "Alto");
        assert_eq!(bare.rank(), "");
    }

    #[test]
    fn risk_levels_sort_by_rank() {
        let mut levels = vec![
            RiskLevel::parse("C. Alto"),
            RiskLevel::parse("A. Bajo"),
            RiskLevel::parse("B. Medio"),
        ];
        levels.sort();
        let labels: Vec<&str> = levels.iter().map(|l| l.label()).collect();
        assert_eq!(labels, vec!["Bajo", "Medio", "Alto"]);
    }

    #[test]
    fn numeric_ranks_sort_as_numbers() {
        let mut levels = vec![
            RiskLevel::parse("10. Y"),
            RiskLevel::parse("B. Medio"),
            RiskLevel::parse("2. X"),
            RiskLevel::parse("A. Bajo"),
        ];
        levels.sort();
        let labels: Vec<&str> = levels.iter().map(|l| l.label()).collect();
        assert_eq!(labels, vec!["X", "Y", "Bajo", "Medio"]);
    }

    #[test]
    fn buckets_sort_by_leading_letter() {
        let mut buckets = vec![
            DelinquencyBucket::new("D. Mayor a 60 dias"),
            DelinquencyBucket::new("A. Al dia"),
            DelinquencyBucket::new("C. 31 - 60 dias"),
        ];
        buckets.sort();
        assert_eq!(buckets[0].label(), "A. Al dia");
        assert_eq!(buckets[2].label(), "D. Mayor a 60 dias");
    }
}
