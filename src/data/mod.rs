//! Data module - CSV loading, records and filtering

mod filter;
mod loader;
mod record;

pub use filter::{FilterOptions, FilterState, Selection, ALL_LABEL};
pub use loader::{parse_control_date, DataLoader, LoaderError};
pub use record::{Dataset, DelinquencyBucket, LoanRecord, MonthName, RiskLevel};
