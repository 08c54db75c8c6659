//! Dashboard metrics.
//!
//! Every accessor runs fixed aggregate SQL. A failing query never fails the
//! dashboard: the metric falls back to zero (or an empty table) and is marked
//! `Defaulted` so callers can tell it apart from a measured zero.

use crate::db::QueryExecutor;
use crate::error::{InsightError, InsightResult};
use crate::models::{
    ConversionMetrics, DashboardSnapshot, Metric, QuickStats, ResultSet, value_as_f64,
    value_as_i64,
};
use serde_json::Value as JsonValue;
use tracing::warn;

mod queries {
    pub const TOTAL_ACCOUNTS: &str = "SELECT COUNT(*) FROM accounts";
    pub const ACTIVE_POLICIES: &str = "SELECT COUNT(*) FROM policies WHERE status = 'Active'";
    pub const TOTAL_PREMIUM: &str =
        "SELECT COALESCE(SUM(premium_amount), 0) FROM policies WHERE status = 'Active'";
    pub const TOTAL_CLAIMS: &str = "SELECT COUNT(*) FROM claims";
    pub const PENDING_CLAIMS: &str = "SELECT COUNT(*) FROM claims WHERE status = 'Pending'";
    pub const TOTAL_APPROVED_CLAIMS: &str =
        "SELECT COALESCE(SUM(approved_amount), 0) FROM claims WHERE status = 'Approved'";
    pub const ONGOING_CLAIMS: &str = "SELECT COUNT(*) FROM ongoing_claims";
    pub const TOTAL_QUOTED_POLICIES: &str = "SELECT COUNT(*) FROM quoted_policies";
    pub const TOTAL_ISSUED_POLICIES: &str = "SELECT COUNT(*) FROM issued_policies";

    pub const MARKET_DISTRIBUTION: &str = r#"
        SELECT market_type, COUNT(*) AS count, SUM(premium_amount) AS total_premium
        FROM policies
        WHERE status = 'Active'
        GROUP BY market_type
        ORDER BY count DESC
        "#;

    pub const POLICY_TYPE_DISTRIBUTION: &str = r#"
        SELECT policy_type, policy_type_name, COUNT(*) AS count, SUM(premium_amount) AS total_premium
        FROM policies
        WHERE status = 'Active'
        GROUP BY policy_type, policy_type_name
        ORDER BY count DESC
        "#;

    /// `{limit}` is substituted with an unsigned integer.
    pub const TOP_AGENTS: &str = r#"
        SELECT a.name, COUNT(p.policy_id) AS total_policies, SUM(p.premium_amount) AS total_premium
        FROM agents a
        JOIN policies p ON a.agent_id = p.agent_id
        GROUP BY a.name
        ORDER BY total_premium DESC
        LIMIT {limit}
        "#;

    pub const CLAIMS_SUMMARY: &str = r#"
        SELECT status, COUNT(*) AS count,
               SUM(claim_amount) AS total_requested,
               SUM(approved_amount) AS total_approved
        FROM claims
        GROUP BY status
        "#;

    pub const ONGOING_CLAIMS_SUMMARY: &str = r#"
        SELECT current_status, COUNT(*) AS count, SUM(reserve_amount) AS total_amount
        FROM ongoing_claims
        GROUP BY current_status
        ORDER BY count DESC
        "#;

    pub const QUOTE_CONVERSION: &str = r#"
        SELECT COUNT(*) AS total_quotes,
               SUM(CASE WHEN status = 'Accepted' THEN 1 ELSE 0 END) AS accepted_quotes
        FROM quoted_policies
        "#;
}

/// Named dashboard metrics over the store.
#[derive(Clone)]
pub struct MetricsAggregator {
    executor: QueryExecutor,
}

impl MetricsAggregator {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub async fn quick_stats(&self) -> QuickStats {
        QuickStats {
            total_accounts: self.count("total_accounts", queries::TOTAL_ACCOUNTS).await,
            active_policies: self.count("active_policies", queries::ACTIVE_POLICIES).await,
            total_premium: self.amount("total_premium", queries::TOTAL_PREMIUM).await,
            total_claims: self.count("total_claims", queries::TOTAL_CLAIMS).await,
            pending_claims: self.count("pending_claims", queries::PENDING_CLAIMS).await,
            total_approved_claims: self
                .amount("total_approved_claims", queries::TOTAL_APPROVED_CLAIMS)
                .await,
            ongoing_claims: self.count("ongoing_claims", queries::ONGOING_CLAIMS).await,
            total_quoted_policies: self
                .count("total_quoted_policies", queries::TOTAL_QUOTED_POLICIES)
                .await,
            total_issued_policies: self
                .count("total_issued_policies", queries::TOTAL_ISSUED_POLICIES)
                .await,
        }
    }

    pub async fn market_distribution(&self) -> Metric<ResultSet> {
        self.table("market_distribution", queries::MARKET_DISTRIBUTION)
            .await
    }

    pub async fn policy_type_distribution(&self) -> Metric<ResultSet> {
        self.table("policy_type_distribution", queries::POLICY_TYPE_DISTRIBUTION)
            .await
    }

    /// Agents ranked by written premium.
    pub async fn top_agents(&self, limit: u32) -> Metric<ResultSet> {
        let sql = queries::TOP_AGENTS.replace("{limit}", &limit.to_string());
        self.table("top_agents", &sql).await
    }

    pub async fn claims_summary(&self) -> Metric<ResultSet> {
        self.table("claims_summary", queries::CLAIMS_SUMMARY).await
    }

    pub async fn ongoing_claims_summary(&self) -> Metric<ResultSet> {
        self.table("ongoing_claims_summary", queries::ONGOING_CLAIMS_SUMMARY)
            .await
    }

    pub async fn quote_conversion_metrics(&self) -> Metric<ConversionMetrics> {
        let measured = async {
            let result = self.executor.run(queries::QUOTE_CONVERSION).await?;
            let total = cell_i64(result.rows.first().and_then(|r| r.first()))?;
            let accepted = cell_i64(result.rows.first().and_then(|r| r.get(1)))?;
            Ok::<_, InsightError>(ConversionMetrics::new(total, accepted))
        };
        settle("quote_conversion", measured.await, ConversionMetrics::default())
    }

    /// Run caller-supplied SQL. Failures propagate.
    pub async fn run_custom(&self, sql: &str) -> InsightResult<ResultSet> {
        self.executor.run(sql).await
    }

    /// Every dashboard metric, with `top_agents` limited to `top_agents_limit`.
    pub async fn dashboard(&self, top_agents_limit: u32) -> DashboardSnapshot {
        DashboardSnapshot {
            quick_stats: self.quick_stats().await,
            market_distribution: self.market_distribution().await,
            policy_type_distribution: self.policy_type_distribution().await,
            top_agents: self.top_agents(top_agents_limit).await,
            claims_summary: self.claims_summary().await,
            ongoing_claims_summary: self.ongoing_claims_summary().await,
            quote_conversion: self.quote_conversion_metrics().await,
        }
    }

    async fn count(&self, name: &'static str, sql: &str) -> Metric<i64> {
        let measured = async {
            let result = self.executor.run(sql).await?;
            cell_i64(result.scalar())
        };
        settle(name, measured.await, 0)
    }

    async fn amount(&self, name: &'static str, sql: &str) -> Metric<f64> {
        let measured = async {
            let result = self.executor.run(sql).await?;
            cell_f64(result.scalar())
        };
        settle(name, measured.await, 0.0)
    }

    async fn table(&self, name: &'static str, sql: &str) -> Metric<ResultSet> {
        settle(name, self.executor.run(sql).await, ResultSet::default())
    }
}

fn settle<T>(name: &'static str, outcome: InsightResult<T>, default: T) -> Metric<T> {
    match outcome {
        Ok(value) => Metric::measured(value),
        Err(e) => {
            warn!(metric = name, error = %e, "Metric query failed, using default");
            Metric::defaulted(default, e.to_string())
        }
    }
}

/// Missing values and SQL NULL count as zero.
fn cell_i64(value: Option<&JsonValue>) -> InsightResult<i64> {
    match value {
        None | Some(JsonValue::Null) => Ok(0),
        Some(v) => value_as_i64(v)
            .ok_or_else(|| InsightError::database(format!("Expected an integer, got {v}"))),
    }
}

fn cell_f64(value: Option<&JsonValue>) -> InsightResult<f64> {
    match value {
        None | Some(JsonValue::Null) => Ok(0.0),
        Some(v) => value_as_f64(v)
            .ok_or_else(|| InsightError::database(format!("Expected a number, got {v}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_cells_are_zero() {
        assert_eq!(cell_i64(None).unwrap(), 0);
        assert_eq!(cell_i64(Some(&JsonValue::Null)).unwrap(), 0);
        assert_eq!(cell_f64(Some(&JsonValue::Null)).unwrap(), 0.0);
    }

    #[test]
    fn test_decimal_strings_parse() {
        assert_eq!(cell_f64(Some(&json!("1250.50"))).unwrap(), 1250.5);
        assert_eq!(cell_i64(Some(&json!("12"))).unwrap(), 12);
    }

    #[test]
    fn test_non_numeric_cell_is_error() {
        assert!(cell_i64(Some(&json!("n/a"))).is_err());
    }

    #[test]
    fn test_settle() {
        let ok = settle("m", Ok(3_i64), 0);
        assert_eq!(ok, Metric::measured(3));
        let failed = settle("m", Err(InsightError::database("no such table: x")), 0_i64);
        assert!(failed.is_defaulted());
        assert_eq!(*failed.value(), 0);
    }

    #[test]
    fn test_top_agents_limit_substitution() {
        let sql = queries::TOP_AGENTS.replace("{limit}", &7_u32.to_string());
        assert!(sql.contains("LIMIT 7"));
    }
}
