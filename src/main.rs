//! InsightIQ - Main entry point.
//!
//! Command-line front end: wires the store backend, the schema describer,
//! the translator and the metrics aggregator together and prints results.

use insightiq::config::{Command, Config, analytics_request};
use insightiq::db::{QueryExecutor, connect_backend};
use insightiq::error::InsightResult;
use insightiq::llm::prompts::render_catalogue;
use insightiq::llm::{CompletionClient, GeminiClient};
use insightiq::models::{DashboardSnapshot, Metric, ResultSet};
use insightiq::tools::format::{
    OutputFormat, format_result_set, format_value, render_result, to_records,
};
use insightiq::tools::{MetricsAggregator, PromptTranslator, SchemaDescriber};
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout carries only results.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

/// Components shared by every command.
struct App {
    executor: QueryExecutor,
    describer: SchemaDescriber,
    metrics: MetricsAggregator,
    format: OutputFormat,
}

impl App {
    fn new(config: &Config) -> InsightResult<Self> {
        // Fail on a missing API key before touching the store
        if config.command.needs_translator() {
            config.gemini_config()?;
        }
        let backend = connect_backend(&config.store_config()?)?;
        let executor = QueryExecutor::new(backend);
        Ok(Self {
            describer: SchemaDescriber::new(executor.clone()),
            metrics: MetricsAggregator::new(executor.clone()),
            executor,
            format: config.format,
        })
    }

    async fn translator(&self, config: &Config) -> InsightResult<PromptTranslator> {
        let client: Arc<dyn CompletionClient> =
            Arc::new(GeminiClient::new(config.gemini_config()?));
        PromptTranslator::from_describer(client, &self.describer).await
    }

    async fn dispatch(&self, config: &Config) -> InsightResult<()> {
        match &config.command {
            Command::Schema => {
                println!("{}", self.describer.full_schema_prompt().await?);
            }
            Command::Stats => {
                let stats = self.describer.database_stats().await?;
                let result = ResultSet::new(
                    vec!["table".to_string(), "row_count".to_string()],
                    stats
                        .into_iter()
                        .map(|s| vec![json!(s.name), json!(s.row_count)])
                        .collect(),
                );
                self.print_result(&result);
            }
            Command::Sample { table, limit } => {
                let result = self.describer.sample_rows(table, *limit).await?;
                self.print_result(&result);
            }
            Command::Run { sql } => {
                let result = self.executor.run(sql).await?;
                self.print_result(&result);
            }
            Command::Ask { question, dry_run } => {
                let translator = self.translator(config).await?;
                let sql = translator.translate(question).await?;
                self.print_generated(&sql, *dry_run).await?;
            }
            Command::Analytics {
                request,
                preset,
                dry_run,
            } => {
                let request = analytics_request(request.as_deref(), *preset)?;
                let translator = self.translator(config).await?;
                let sql = translator.translate_for_analytics(request).await?;
                self.print_generated(&sql, *dry_run).await?;
            }
            Command::Dashboard { top_agents } => {
                let snapshot = self.metrics.dashboard(*top_agents).await;
                self.print_dashboard(&snapshot);
            }
            Command::Examples => print!("{}", render_catalogue()),
        }
        Ok(())
    }

    async fn print_generated(&self, sql: &str, dry_run: bool) -> InsightResult<()> {
        if dry_run {
            println!("{sql}");
            return Ok(());
        }
        let result = self.executor.run(sql).await?;
        if self.format == OutputFormat::Json {
            let body = json!({ "sql": sql, "rows": to_records(&result) });
            println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
            return Ok(());
        }
        println!("Generated SQL:\n{sql}\n");
        self.print_result(&result);
        Ok(())
    }

    fn print_result(&self, result: &ResultSet) {
        println!("{}", render_result(result, self.format));
    }

    fn print_dashboard(&self, snapshot: &DashboardSnapshot) {
        if self.format == OutputFormat::Json {
            println!(
                "{}",
                serde_json::to_string_pretty(snapshot).unwrap_or_default()
            );
            return;
        }

        let stats = &snapshot.quick_stats;
        let rows = vec![
            stat_row("Total accounts", &stats.total_accounts),
            stat_row("Active policies", &stats.active_policies),
            stat_row("Total premium", &stats.total_premium),
            stat_row("Total claims", &stats.total_claims),
            stat_row("Pending claims", &stats.pending_claims),
            stat_row("Approved claim amount", &stats.total_approved_claims),
            stat_row("Ongoing claims", &stats.ongoing_claims),
            stat_row("Quoted policies", &stats.total_quoted_policies),
            stat_row("Issued policies", &stats.total_issued_policies),
            stat_row(
                "Quote conversion rate (%)",
                &snapshot
                    .quote_conversion
                    .clone()
                    .map(|c| c.conversion_rate),
            ),
        ];

        println!("Key metrics");
        let headline = ResultSet::new(
            vec!["metric".to_string(), "value".to_string(), "status".to_string()],
            rows,
        );
        println!("{}", format_result_set(&headline, self.format));

        for (title, metric) in [
            ("Market distribution", &snapshot.market_distribution),
            ("Policy types", &snapshot.policy_type_distribution),
            ("Top agents", &snapshot.top_agents),
            ("Claims by status", &snapshot.claims_summary),
            ("Ongoing claims by status", &snapshot.ongoing_claims_summary),
        ] {
            println!("\n{title}");
            match metric {
                Metric::Defaulted { error, .. } => println!("(unavailable: {error})"),
                Metric::Measured { value } => self.print_result(value),
            }
        }
    }
}

/// One headline row: label, value, measured/defaulted.
fn stat_row<T: Clone + Into<JsonValue>>(label: &str, metric: &Metric<T>) -> Vec<JsonValue> {
    let status = if metric.is_defaulted() {
        "defaulted"
    } else {
        "measured"
    };
    let value: JsonValue = metric.value().clone().into();
    vec![json!(label), json!(format_value(&value)), json!(status)]
}

#[tokio::main]
async fn main() {
    // Parse configuration from .env, environment and command line
    let config = Config::load();

    // Initialize logging
    init_tracing(&config);

    info!(
        backend = %config.backend,
        "Starting InsightIQ v{}",
        env!("CARGO_PKG_VERSION")
    );

    if !config.command.needs_store() {
        print!("{}", render_catalogue());
        return;
    }

    let outcome = match App::new(&config) {
        Ok(app) => app.dispatch(&config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        for hint in e.hints() {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }
}
