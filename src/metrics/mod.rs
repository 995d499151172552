//! Metrics module - risk aggregation and display formatting

mod aggregator;
pub mod format;

pub use aggregator::{
    BalanceTotals, BucketShareByMonth, DashboardView, DeteriorationByBucket, IcvByRiskLevel,
    IcvTimeline, MonthlyIcv, RiskAggregator, RiskSeries, Share, StackedPanel, StackedRow,
    TimelinePoint,
};
