//! CSV Data Loader Module
//! Reads the loan dataset with Polars and normalizes it into `LoanRecord`s.

use crate::data::record::{Dataset, DelinquencyBucket, LoanRecord, MonthName, RiskLevel};
use chrono::NaiveDate;
use polars::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Source date format, month/day/year.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub const COL_CONTROL_DATE: &str = "FechaControl";
pub const COL_REGION: &str = "Departamento";
pub const COL_CREDIT_TYPE: &str = "Tipo_credito";
pub const COL_RISK_LEVEL: &str = "Nivel_Riesgo";
pub const COL_BUCKET: &str = "RDiasMora";
pub const COL_DELINQUENCY_DAYS: &str = "DiasMora";
pub const COL_BALANCE: &str = "SaldoCapital";
pub const COL_STANDING: &str = "INDBYM";

const REQUIRED_COLUMNS: [&str; 8] = [
    COL_CONTROL_DATE,
    COL_REGION,
    COL_CREDIT_TYPE,
    COL_RISK_LEVEL,
    COL_BUCKET,
    COL_DELINQUENCY_DAYS,
    COL_BALANCE,
    COL_STANDING,
];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("No data loaded")]
    NoData,
}

/// Why a single row was dropped.
#[derive(Debug, Clone, PartialEq)]
enum RowError {
    Missing(&'static str),
    BadDate(String),
    BadNumber(&'static str, String),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::Missing(col) => write!(f, "missing {col}"),
            RowError::BadDate(raw) => write!(f, "unparseable date {raw:?}"),
            RowError::BadNumber(col, raw) => write!(f, "unparseable {col} {raw:?}"),
        }
    }
}

/// Loads the loan dataset from a delimited file.
pub struct DataLoader {
    separator: u8,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl DataLoader {
    pub fn new(separator: u8) -> Self {
        Self { separator }
    }

    /// Load and normalize every row of the dataset.
    ///
    /// All columns are read as text so numeric and date parsing stays under
    /// our control. Rows with unparseable dates or numbers are skipped and
    /// counted in `Dataset::skipped_rows`.
    pub fn load_csv(&self, file_path: &Path) -> Result<Dataset, LoaderError> {
        let path_str = file_path.to_string_lossy().to_string();
        info!(path = %path_str, "loading loan dataset");

        let df = LazyCsvReader::new(path_str.as_str())
            .with_has_header(true)
            .with_separator(self.separator)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        let dataset = Self::records_from_dataframe(&df)?;
        info!(
            rows = dataset.len(),
            skipped = dataset.skipped_rows(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Convert a text-typed DataFrame into the normalized dataset.
    pub fn records_from_dataframe(df: &DataFrame) -> Result<Dataset, LoaderError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        for required in REQUIRED_COLUMNS {
            if !names.iter().any(|n| n == required) {
                return Err(LoaderError::MissingColumn(required.to_string()));
            }
        }

        let text_column = |name: &str| -> Result<Column, LoaderError> {
            Ok(df.column(name)?.cast(&DataType::String)?)
        };
        let dates = text_column(COL_CONTROL_DATE)?;
        let regions = text_column(COL_REGION)?;
        let credit_types = text_column(COL_CREDIT_TYPE)?;
        let risk_levels = text_column(COL_RISK_LEVEL)?;
        let buckets = text_column(COL_BUCKET)?;
        let days = text_column(COL_DELINQUENCY_DAYS)?;
        let balances = text_column(COL_BALANCE)?;
        let standings = text_column(COL_STANDING)?;

        let dates = dates.as_materialized_series().str()?;
        let regions = regions.as_materialized_series().str()?;
        let credit_types = credit_types.as_materialized_series().str()?;
        let risk_levels = risk_levels.as_materialized_series().str()?;
        let buckets = buckets.as_materialized_series().str()?;
        let days = days.as_materialized_series().str()?;
        let balances = balances.as_materialized_series().str()?;
        let standings = standings.as_materialized_series().str()?;

        let mut records = Vec::with_capacity(df.height());
        let mut skipped = 0usize;

        for i in 0..df.height() {
            let row = RawRow {
                control_date: dates.get(i),
                region: regions.get(i),
                credit_type: credit_types.get(i),
                risk_level: risk_levels.get(i),
                bucket: buckets.get(i),
                delinquency_days: days.get(i),
                balance: balances.get(i),
                standing: standings.get(i),
            };
            match row.parse() {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!(row = i + 1, "skipping row: {}", e);
                }
            }
        }

        if records.is_empty() {
            return Err(LoaderError::NoData);
        }
        debug!(parsed = records.len(), skipped, "rows normalized");

        Ok(Dataset::new(records, skipped))
    }
}

/// Borrowed text cells of one source row.
struct RawRow<'a> {
    control_date: Option<&'a str>,
    region: Option<&'a str>,
    credit_type: Option<&'a str>,
    risk_level: Option<&'a str>,
    bucket: Option<&'a str>,
    delinquency_days: Option<&'a str>,
    balance: Option<&'a str>,
    standing: Option<&'a str>,
}

impl RawRow<'_> {
    fn parse(&self) -> Result<LoanRecord, RowError> {
        let raw_date = required(self.control_date, COL_CONTROL_DATE)?;
        let control_date = parse_control_date(raw_date)
            .ok_or_else(|| RowError::BadDate(raw_date.to_string()))?;

        let raw_days = required(self.delinquency_days, COL_DELINQUENCY_DAYS)?;
        let delinquency_days = parse_days(raw_days)
            .ok_or_else(|| RowError::BadNumber(COL_DELINQUENCY_DAYS, raw_days.to_string()))?;

        let raw_balance = required(self.balance, COL_BALANCE)?;
        let balance = raw_balance
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RowError::BadNumber(COL_BALANCE, raw_balance.to_string()))?;

        Ok(LoanRecord {
            control_date,
            month: MonthName::from_date(control_date),
            region: self.region.unwrap_or_default().trim().to_string(),
            credit_type: self.credit_type.unwrap_or_default().trim().to_string(),
            risk_level: RiskLevel::parse(self.risk_level.unwrap_or_default()),
            bucket: DelinquencyBucket::new(self.bucket.unwrap_or_default()),
            delinquency_days,
            balance,
            standing: self.standing.unwrap_or_default().trim().to_string(),
        })
    }
}

fn required<'a>(cell: Option<&'a str>, column: &'static str) -> Result<&'a str, RowError> {
    cell.filter(|s| !s.trim().is_empty())
        .ok_or(RowError::Missing(column))
}

/// Parse a `month/day/year` control date.
pub fn parse_control_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Days past due, accepting `"15"` as well as `"15.0"`.
fn parse_days(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(rows: &[[&str; 8]]) -> DataFrame {
        let column = |idx: usize, name: &str| {
            Column::new(
                name.into(),
                rows.iter().map(|r| r[idx].to_string()).collect::<Vec<String>>(),
            )
        };
        DataFrame::new(vec![
            column(0, COL_CONTROL_DATE),
            column(1, COL_REGION),
            column(2, COL_CREDIT_TYPE),
            column(3, COL_RISK_LEVEL),
            column(4, COL_BUCKET),
            column(5, COL_DELINQUENCY_DAYS),
            column(6, COL_BALANCE),
            column(7, COL_STANDING),
        ])
        .unwrap()
    }

    #[test]
    fn normalizes_dates_and_labels() {
        let df = frame(&[[
            "02/15/2024",
            "Antioquia",
            "Consumo",
            "B. Medio",
            "A. Al dia",
            "0",
            "1500000.5",
            "Buenos",
        ]]);
        let dataset = DataLoader::records_from_dataframe(&df).unwrap();
        let record = &dataset.records()[0];

        assert_eq!(record.control_date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(record.month.name(), "Febrero");
        assert_eq!(record.risk_level.label(), "Medio");
        assert_eq!(record.bucket.label(), "A. Al dia");
        assert_eq!(record.balance, 1500000.5);
        assert!(!record.is_delinquent());
    }

    #[test]
    fn skips_unparseable_rows() {
        let df = frame(&[
            ["13/45/2024", "Cauca", "Vivienda", "A. Bajo", "A. Al dia", "0", "10", "Buenos"],
            ["01/31/2024", "Cauca", "Vivienda", "A. Bajo", "B. 1 - 30 dias", "12.0", "10", "Malos"],
            ["01/31/2024", "Cauca", "Vivienda", "A. Bajo", "A. Al dia", "0", "n/a", "Buenos"],
        ]);
        let dataset = DataLoader::records_from_dataframe(&df).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.skipped_rows(), 2);
        assert_eq!(dataset.records()[0].delinquency_days, 12);
    }

    #[test]
    fn missing_column_is_an_error() {
        let df = DataFrame::new(vec![Column::new(
            COL_CONTROL_DATE.into(),
            vec!["01/01/2024".to_string()],
        )])
        .unwrap();
        let err = DataLoader::records_from_dataframe(&df).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn(_)));
    }

    #[test]
    fn all_rows_bad_means_no_data() {
        let df = frame(&[["bad", "X", "Y", "A. Z", "A. Al dia", "0", "1", "Buenos"]]);
        let err = DataLoader::records_from_dataframe(&df).unwrap_err();
        assert!(matches!(err, LoaderError::NoData));
    }

    #[test]
    fn parses_unpadded_dates() {
        assert_eq!(
            parse_control_date("3/7/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 7)
        );
        assert!(parse_control_date("2024-03-07").is_none());
    }
}
