//! Cartera Riesgo - Credit-Risk Dashboard
//!
//! Loads a loan portfolio, cross-filters it by month, region and credit
//! type, and charts delinquency distribution, deterioration and the
//! portfolio-at-risk index (ICV).

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod metrics;
