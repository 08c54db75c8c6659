//! Dashboard metric models.

use crate::models::ResultSet;
use serde::Serialize;

/// A dashboard value that either came from the store or was defaulted
/// after its query failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Metric<T> {
    Measured { value: T },
    Defaulted { value: T, error: String },
}

impl<T> Metric<T> {
    pub fn measured(value: T) -> Self {
        Self::Measured { value }
    }

    pub fn defaulted(value: T, error: impl Into<String>) -> Self {
        Self::Defaulted {
            value,
            error: error.into(),
        }
    }

    /// The value, whether measured or defaulted.
    pub fn value(&self) -> &T {
        match self {
            Self::Measured { value } | Self::Defaulted { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Measured { value } | Self::Defaulted { value, .. } => value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted { .. })
    }

    /// The error that caused the default, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Measured { .. } => None,
            Self::Defaulted { error, .. } => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Self::Measured { value } => Metric::Measured { value: f(value) },
            Self::Defaulted { value, error } => Metric::Defaulted {
                value: f(value),
                error,
            },
        }
    }
}

/// Headline counters for the landing dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStats {
    pub total_accounts: Metric<i64>,
    pub active_policies: Metric<i64>,
    pub total_premium: Metric<f64>,
    pub total_claims: Metric<i64>,
    pub pending_claims: Metric<i64>,
    pub total_approved_claims: Metric<f64>,
    pub ongoing_claims: Metric<i64>,
    pub total_quoted_policies: Metric<i64>,
    pub total_issued_policies: Metric<i64>,
}

impl QuickStats {
    /// Names of the metrics that fell back to their default.
    pub fn defaulted_fields(&self) -> Vec<&'static str> {
        let flags = [
            ("total_accounts", self.total_accounts.is_defaulted()),
            ("active_policies", self.active_policies.is_defaulted()),
            ("total_premium", self.total_premium.is_defaulted()),
            ("total_claims", self.total_claims.is_defaulted()),
            ("pending_claims", self.pending_claims.is_defaulted()),
            (
                "total_approved_claims",
                self.total_approved_claims.is_defaulted(),
            ),
            ("ongoing_claims", self.ongoing_claims.is_defaulted()),
            (
                "total_quoted_policies",
                self.total_quoted_policies.is_defaulted(),
            ),
            (
                "total_issued_policies",
                self.total_issued_policies.is_defaulted(),
            ),
        ];
        flags
            .into_iter()
            .filter_map(|(name, defaulted)| defaulted.then_some(name))
            .collect()
    }
}

/// Quote-to-issue conversion figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ConversionMetrics {
    pub total_quotes: i64,
    pub accepted_quotes: i64,
    /// Percentage, rounded to 2 decimals
    pub conversion_rate: f64,
}

impl ConversionMetrics {
    pub fn new(total_quotes: i64, accepted_quotes: i64) -> Self {
        Self {
            total_quotes,
            accepted_quotes,
            conversion_rate: conversion_rate(total_quotes, accepted_quotes),
        }
    }
}

/// accepted / total * 100, rounded to 2 decimals; 0 when there are no quotes.
pub fn conversion_rate(total_quotes: i64, accepted_quotes: i64) -> f64 {
    if total_quotes <= 0 {
        return 0.0;
    }
    let rate = accepted_quotes as f64 / total_quotes as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

/// Full landing-dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub quick_stats: QuickStats,
    pub market_distribution: Metric<ResultSet>,
    pub policy_type_distribution: Metric<ResultSet>,
    pub top_agents: Metric<ResultSet>,
    pub claims_summary: Metric<ResultSet>,
    pub ongoing_claims_summary: Metric<ResultSet>,
    pub quote_conversion: Metric<ConversionMetrics>,
}
