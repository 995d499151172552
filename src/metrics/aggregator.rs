//! Risk Aggregator Module
//! Map-reduce routines behind the four dashboard panels.

use crate::data::{Dataset, DelinquencyBucket, FilterState, LoanRecord, MonthName, RiskLevel};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Share of one category within a stacked row.
#[derive(Debug, Clone, PartialEq)]
pub struct Share<C> {
    pub category: C,
    pub count: usize,
    pub fraction: f64,
}

/// One bar of a 100% stacked chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedRow<K, C> {
    pub key: K,
    pub count: usize,
    /// One entry per panel category, in the panel's category order.
    pub shares: Vec<Share<C>>,
}

impl<K, C> StackedRow<K, C> {
    /// Cumulative `[start, end)` extents of each share, bottom to top.
    pub fn segments(&self) -> Vec<(&Share<C>, f64, f64)> {
        let mut start = 0.0;
        self.shares
            .iter()
            .map(|share| {
                let end = start + share.fraction;
                let segment = (share, start, end);
                start = end;
                segment
            })
            .collect()
    }

    pub fn fraction_of(&self, category: &C) -> f64
    where
        C: PartialEq,
    {
        self.shares
            .iter()
            .find(|s| &s.category == category)
            .map(|s| s.fraction)
            .unwrap_or(0.0)
    }
}

/// A 100% stacked chart: legend categories plus one row per key.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedPanel<K, C> {
    pub categories: Vec<C>,
    pub rows: Vec<StackedRow<K, C>>,
}

impl<K, C> Default for StackedPanel<K, C> {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Delinquency-bucket share per month.
pub type BucketShareByMonth = StackedPanel<MonthName, DelinquencyBucket>;
/// Good/bad share per delinquency bucket.
pub type DeteriorationByBucket = StackedPanel<DelinquencyBucket, String>;

/// Balance sums feeding an ICV ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BalanceTotals {
    pub total: f64,
    pub delinquent: f64,
}

impl BalanceTotals {
    pub fn add(&mut self, record: &LoanRecord) {
        self.total += record.balance;
        if record.is_delinquent() {
            self.delinquent += record.balance;
        }
    }

    /// Portfolio at risk as a percentage, `None` when there is no balance.
    pub fn icv(&self) -> Option<f64> {
        if self.total == 0.0 {
            None
        } else {
            Some(self.delinquent / self.total * 100.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyIcv {
    pub month: MonthName,
    pub icv: f64,
}

/// ICV line for one risk level.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskSeries {
    pub level: RiskLevel,
    /// Calendar order.
    pub points: Vec<MonthlyIcv>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IcvByRiskLevel {
    /// Every month with at least one point, calendar order.
    pub months: Vec<MonthName>,
    /// Ordered by risk rank.
    pub series: Vec<RiskSeries>,
}

impl IcvByRiskLevel {
    pub fn max_icv(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.icv))
            .fold(0.0, f64::max)
    }

    /// Position of a month on the categorical x axis.
    pub fn month_index(&self, month: MonthName) -> Option<usize> {
        self.months.iter().position(|m| *m == month)
    }
}

/// ICV at a single control date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub icv: f64,
    pub delinquent_balance: f64,
    pub total_balance: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IcvTimeline {
    /// Sorted by date.
    pub points: Vec<TimelinePoint>,
}

impl IcvTimeline {
    pub fn max_icv(&self) -> f64 {
        self.points.iter().map(|p| p.icv).fold(0.0, f64::max)
    }
}

/// Everything the four panels draw for one filter state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub filters: FilterState,
    pub row_count: usize,
    pub bucket_share: BucketShareByMonth,
    pub deterioration: DeteriorationByBucket,
    pub icv_by_risk: IcvByRiskLevel,
    pub icv_timeline: IcvTimeline,
}

impl DashboardView {
    /// Filter the dataset and aggregate every panel.
    pub fn build(dataset: &Dataset, filters: &FilterState) -> Self {
        let rows = filters.apply(dataset.records());
        let view = Self::from_rows(&rows, filters.clone());
        debug!(
            rows = view.row_count,
            months = view.bucket_share.rows.len(),
            "dashboard view rebuilt"
        );
        view
    }

    /// Aggregate an already filtered view. The panels are independent, so
    /// they are computed on the rayon pool.
    pub fn from_rows(rows: &[&LoanRecord], filters: FilterState) -> Self {
        let ((bucket_share, deterioration), (icv_by_risk, icv_timeline)) = rayon::join(
            || {
                rayon::join(
                    || RiskAggregator::bucket_share_by_month(rows),
                    || RiskAggregator::deterioration_by_bucket(rows),
                )
            },
            || {
                rayon::join(
                    || RiskAggregator::icv_by_risk_level(rows),
                    || RiskAggregator::icv_timeline(rows),
                )
            },
        );

        Self {
            filters,
            row_count: rows.len(),
            bucket_share,
            deterioration,
            icv_by_risk,
            icv_timeline,
        }
    }
}

/// Grouping and ratio computations over filtered loan records.
pub struct RiskAggregator;

impl RiskAggregator {
    /// Count rows per `(key, category)` and normalize each key's counts to
    /// sum to 1. Every row lists every category seen in the view.
    pub fn stacked_shares<K, C>(
        rows: &[&LoanRecord],
        key: impl Fn(&LoanRecord) -> K,
        category: impl Fn(&LoanRecord) -> C,
    ) -> StackedPanel<K, C>
    where
        K: Ord + Clone,
        C: Ord + Clone,
    {
        let mut counts: BTreeMap<K, BTreeMap<C, usize>> = BTreeMap::new();
        let mut categories: BTreeSet<C> = BTreeSet::new();

        for &record in rows {
            let cat = category(record);
            categories.insert(cat.clone());
            *counts.entry(key(record)).or_default().entry(cat).or_insert(0) += 1;
        }

        let categories: Vec<C> = categories.into_iter().collect();
        let rows = counts
            .into_iter()
            .map(|(row_key, by_category)| {
                let total: usize = by_category.values().sum();
                let shares = categories
                    .iter()
                    .map(|c| {
                        let count = by_category.get(c).copied().unwrap_or(0);
                        Share {
                            category: c.clone(),
                            count,
                            fraction: count as f64 / total as f64,
                        }
                    })
                    .collect();
                StackedRow {
                    key: row_key,
                    count: total,
                    shares,
                }
            })
            .collect();

        StackedPanel { categories, rows }
    }

    /// Panel 1: delinquency-bucket distribution per month.
    pub fn bucket_share_by_month(rows: &[&LoanRecord]) -> BucketShareByMonth {
        Self::stacked_shares(rows, |r| r.month, |r| r.bucket.clone())
    }

    /// Panel 2: good/bad split per delinquency bucket.
    pub fn deterioration_by_bucket(rows: &[&LoanRecord]) -> DeteriorationByBucket {
        Self::stacked_shares(rows, |r| r.bucket.clone(), |r| r.standing.clone())
    }

    /// Panel 3: ICV per risk level and month. Groups with zero total
    /// balance produce no point.
    pub fn icv_by_risk_level(rows: &[&LoanRecord]) -> IcvByRiskLevel {
        let mut totals: BTreeMap<RiskLevel, BTreeMap<MonthName, BalanceTotals>> = BTreeMap::new();
        for &record in rows {
            totals
                .entry(record.risk_level.clone())
                .or_default()
                .entry(record.month)
                .or_default()
                .add(record);
        }

        let mut months = BTreeSet::new();
        let series: Vec<RiskSeries> = totals
            .into_iter()
            .filter_map(|(level, by_month)| {
                let points: Vec<MonthlyIcv> = by_month
                    .into_iter()
                    .filter_map(|(month, t)| t.icv().map(|icv| MonthlyIcv { month, icv }))
                    .collect();
                if points.is_empty() {
                    return None;
                }
                months.extend(points.iter().map(|p| p.month));
                Some(RiskSeries { level, points })
            })
            .collect();

        IcvByRiskLevel {
            months: months.into_iter().collect(),
            series,
        }
    }

    /// Panel 4: ICV per control date, no risk split, sorted by date.
    pub fn icv_timeline(rows: &[&LoanRecord]) -> IcvTimeline {
        let mut totals: BTreeMap<NaiveDate, BalanceTotals> = BTreeMap::new();
        for &record in rows {
            totals.entry(record.control_date).or_default().add(record);
        }

        let points = totals
            .into_iter()
            .filter_map(|(date, t)| {
                t.icv().map(|icv| TimelinePoint {
                    date,
                    icv,
                    delinquent_balance: t.delinquent,
                    total_balance: t.total,
                })
            })
            .collect();

        IcvTimeline { points }
    }
}
