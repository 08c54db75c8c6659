//! Shared fixture: a temporary SQLite insurance database.

#![allow(dead_code)]

use async_trait::async_trait;
use insightiq::db::{QueryExecutor, SqliteBackend};
use insightiq::error::{InsightError, InsightResult};
use insightiq::llm::CompletionClient;
use sqlx::{Connection, SqliteConnection};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const SCHEMA_SQL: &str = r#"
CREATE TABLE accounts (
    account_id INTEGER PRIMARY KEY,
    account_name VARCHAR(100) NOT NULL,
    market_type VARCHAR(50),
    industry VARCHAR(50),
    city VARCHAR(50),
    state VARCHAR(2),
    created_date DATE
);
CREATE TABLE agents (
    agent_id INTEGER PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    email VARCHAR(100),
    region VARCHAR(50),
    commission_rate DECIMAL(5,2),
    join_date DATE,
    status VARCHAR(20)
);
CREATE TABLE policies (
    policy_id INTEGER PRIMARY KEY,
    account_id INTEGER REFERENCES accounts(account_id),
    agent_id INTEGER REFERENCES agents(agent_id),
    policy_number VARCHAR(20),
    market_type VARCHAR(50),
    policy_type VARCHAR(2),
    policy_type_name VARCHAR(50),
    premium_amount DECIMAL(12,2),
    coverage_amount DECIMAL(14,2),
    start_date DATE,
    end_date DATE,
    status VARCHAR(20)
);
CREATE TABLE quoted_policies (
    quote_id INTEGER PRIMARY KEY,
    account_id INTEGER REFERENCES accounts(account_id),
    agent_id INTEGER REFERENCES agents(agent_id),
    market_type VARCHAR(50),
    policy_type VARCHAR(2),
    quoted_premium DECIMAL(12,2),
    quote_date DATE,
    valid_until DATE,
    status VARCHAR(20)
);
CREATE TABLE issued_policies (
    issued_id INTEGER PRIMARY KEY,
    quote_id INTEGER REFERENCES quoted_policies(quote_id),
    policy_id INTEGER REFERENCES policies(policy_id),
    account_id INTEGER REFERENCES accounts(account_id),
    issue_date DATE,
    issued_premium DECIMAL(12,2)
);
CREATE TABLE claims (
    claim_id INTEGER PRIMARY KEY,
    policy_id INTEGER REFERENCES policies(policy_id),
    account_id INTEGER REFERENCES accounts(account_id),
    claim_number VARCHAR(20),
    claim_date DATE,
    claim_amount DECIMAL(12,2),
    approved_amount DECIMAL(12,2),
    claim_type VARCHAR(50),
    status VARCHAR(20)
);
CREATE TABLE ongoing_claims (
    ongoing_claim_id INTEGER PRIMARY KEY,
    claim_id INTEGER REFERENCES claims(claim_id),
    account_id INTEGER REFERENCES accounts(account_id),
    adjuster VARCHAR(100),
    current_status VARCHAR(30),
    reserve_amount DECIMAL(12,2),
    opened_date DATE,
    last_updated DATE
);
"#;

pub const SEED_SQL: &str = r#"
INSERT INTO accounts VALUES
    (1, 'Harbor Logistics', 'Middle Market', 'Transportation', 'Seattle', 'WA', '2021-03-14'),
    (2, 'Summit Foods', 'Middle Market', 'Food Processing', 'Denver', 'CO', '2020-07-02'),
    (3, 'Keystone Builders Program', 'National Program', 'Construction', 'Pittsburgh', 'PA', '2019-11-20'),
    (4, 'County of Marin', 'Public Sector', 'Government', 'San Rafael', 'CA', '2022-01-09');

INSERT INTO agents VALUES
    (1, 'Alice Carter', 'alice.carter@example.com', 'West', 8.50, '2018-05-01', 'Active'),
    (2, 'Ben Okafor', 'ben.okafor@example.com', 'Central', 7.25, '2019-09-15', 'Active'),
    (3, 'Chloe Nguyen', 'chloe.nguyen@example.com', 'East', 6.00, '2021-02-01', 'Active');

INSERT INTO policies VALUES
    (1, 1, 1, 'POL-0001', 'Middle Market', 'GC', 'Guaranteed Cost', 1000.50, 500000, '2024-01-01', '2024-12-31', 'Active'),
    (2, 2, 1, 'POL-0002', 'Middle Market', 'LS', 'Loss Sensitive', 2000, 750000, '2024-02-01', '2025-01-31', 'Active'),
    (3, 3, 2, 'POL-0003', 'National Program', 'GC', 'Guaranteed Cost', 1500, 900000, '2024-03-01', '2025-02-28', 'Active'),
    (4, 4, 3, 'POL-0004', 'Public Sector', 'GC', 'Guaranteed Cost', 500, 250000, '2024-04-01', '2025-03-31', 'Active'),
    (5, 3, 2, 'POL-0005', 'National Account', 'LS', 'Loss Sensitive', 700, 300000, '2022-01-01', '2022-12-31', 'Expired');

INSERT INTO quoted_policies VALUES
    (1, 1, 1, 'Middle Market', 'GC', 1000.50, '2023-12-01', '2024-01-31', 'Accepted'),
    (2, 2, 1, 'Middle Market', 'LS', 2100, '2024-01-05', '2024-02-05', 'Pending'),
    (3, 3, 2, 'National Program', 'GC', 1600, '2024-02-10', '2024-03-10', 'Pending'),
    (4, 4, 3, 'Public Sector', 'GC', 550, '2024-03-01', '2024-04-01', 'Declined');

INSERT INTO issued_policies VALUES
    (1, 1, 1, 1, '2024-01-01', 1000.50);

INSERT INTO claims VALUES
    (1, 1, 1, 'CLM-0001', '2024-03-02', 1000, 800, 'Property', 'Approved'),
    (2, 2, 2, 'CLM-0002', '2024-04-11', 1500, 1200, 'Liability', 'Approved'),
    (3, 3, 3, 'CLM-0003', '2024-05-20', 3000, NULL, 'Workers Comp', 'Pending'),
    (4, 4, 4, 'CLM-0004', '2024-06-03', 400, 0, 'Auto', 'Rejected');

INSERT INTO ongoing_claims VALUES
    (1, 3, 3, 'Dana Whitfield', 'Under Review', 2500, '2024-05-21', '2024-06-01'),
    (2, 2, 2, 'Eli Brooks', 'Investigation', 300, '2024-04-12', '2024-05-30');
"#;

/// A seeded database file that lives as long as this value.
pub struct TestDb {
    _file: NamedTempFile,
    pub path: String,
}

impl TestDb {
    pub fn executor(&self) -> QueryExecutor {
        let backend = SqliteBackend::new(self.path.clone()).unwrap();
        QueryExecutor::new(Arc::new(backend))
    }

    /// Run arbitrary setup SQL directly against the file.
    pub async fn exec(&self, sql: &str) {
        let mut conn = SqliteConnection::connect(&format!("sqlite:{}", self.path))
            .await
            .unwrap();
        sqlx::raw_sql(sql).execute(&mut conn).await.unwrap();
        conn.close().await.unwrap();
    }
}

/// Create a temporary database with the insurance schema and sample rows.
pub async fn seeded_db() -> TestDb {
    let db = empty_db();
    db.exec(SCHEMA_SQL).await;
    db.exec(SEED_SQL).await;
    db
}

/// Create a temporary database with no tables.
pub fn empty_db() -> TestDb {
    let file = NamedTempFile::new().unwrap();
    let path = file.path().to_str().unwrap().to_string();
    TestDb { _file: file, path }
}

/// Completion client returning a canned reply and recording prompts.
pub struct StubClient {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubClient {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, prompt: &str) -> InsightResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(InsightError::translation)
    }

    fn model(&self) -> &str {
        "stub"
    }
}
