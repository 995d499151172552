//! Cross-filter Module
//! Month, region and credit-type filters combined by logical AND.

use crate::data::record::{LoanRecord, MonthName};
use std::collections::BTreeSet;
use std::fmt;

/// Label of the identity selection in every filter.
pub const ALL_LABEL: &str = "Todos";

/// One categorical filter: either everything or a single value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL_LABEL),
            Selection::Only(value) => value.fmt(f),
        }
    }
}

/// Current state of the three dashboard filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub month: Selection<MonthName>,
    pub region: Selection<String>,
    pub credit_type: Selection<String>,
}

impl FilterState {
    /// Filters with every dimension set to "Todos".
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, record: &LoanRecord) -> bool {
        self.month.accepts(&record.month)
            && self.region.accepts(&record.region)
            && self.credit_type.accepts(&record.credit_type)
    }

    /// Read-only view of the records passing every filter.
    pub fn apply<'a>(&self, records: &'a [LoanRecord]) -> Vec<&'a LoanRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Values offered by each filter drop-down, without the "Todos" entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    /// Calendar order.
    pub months: Vec<MonthName>,
    /// Lexical order.
    pub regions: Vec<String>,
    /// Lexical order.
    pub credit_types: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[LoanRecord]) -> Self {
        let mut months = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut credit_types = BTreeSet::new();

        for record in records {
            months.insert(record.month);
            regions.insert(record.region.clone());
            credit_types.insert(record.credit_type.clone());
        }

        Self {
            months: months.into_iter().collect(),
            regions: regions.into_iter().collect(),
            credit_types: credit_types.into_iter().collect(),
        }
    }
}
