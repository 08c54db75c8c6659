//! Configuration handling for InsightIQ.
//!
//! This module provides configuration management via CLI arguments and environment
//! variables. A `.env` file in the working directory is loaded before parsing.

use crate::error::{InsightError, InsightResult};
use crate::llm::prompts::{ANALYTICS_PRESETS, AnalyticsPreset, find_preset};
use crate::tools::format::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

pub const DEFAULT_SQLITE_PATH: &str = "insurance.db";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_DATABRICKS_CATALOG: &str = "main";
pub const DEFAULT_DATABRICKS_SCHEMA: &str = "default";
pub const DEFAULT_SAMPLE_LIMIT: u32 = 5;
pub const DEFAULT_TOP_AGENTS_LIMIT: u32 = 5;

/// Store backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendKind {
    /// Local SQLite database file
    #[default]
    Sqlite,
    /// PostgreSQL server
    Postgres,
    /// MySQL server
    Mysql,
    /// Databricks SQL warehouse
    Databricks,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::Postgres => write!(f, "postgres"),
            Self::Mysql => write!(f, "mysql"),
            Self::Databricks => write!(f, "databricks"),
        }
    }
}

/// Databricks SQL warehouse connection parameters.
#[derive(Clone)]
pub struct DatabricksConfig {
    /// Workspace host, e.g. "dbc-1234.cloud.databricks.com"
    pub server_hostname: String,
    /// Warehouse HTTP path, e.g. "/sql/1.0/warehouses/abc123"
    pub http_path: String,
    /// Personal access token (sensitive - not logged).
    pub access_token: String,
    pub catalog: String,
    pub schema: String,
}

impl DatabricksConfig {
    /// Warehouse ID: the last segment of the HTTP path.
    pub fn warehouse_id(&self) -> InsightResult<String> {
        self.http_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                InsightError::config(format!(
                    "Cannot derive a warehouse ID from HTTP path '{}'",
                    self.http_path
                ))
            })
    }

    /// Base URL of the workspace REST API.
    pub fn base_url(&self) -> InsightResult<Url> {
        let host = self.server_hostname.trim().trim_end_matches('/');
        let with_scheme = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };
        Url::parse(&with_scheme)
            .map_err(|e| InsightError::config(format!("Invalid Databricks host '{host}': {e}")))
    }
}

impl std::fmt::Debug for DatabricksConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabricksConfig")
            .field("server_hostname", &self.server_hostname)
            .field("http_path", &self.http_path)
            .field("access_token", &"<redacted>")
            .field("catalog", &self.catalog)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Validated store configuration, one variant per backend.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Sqlite { path: String },
    Postgres { url: String },
    MySql { url: String },
    Databricks(DatabricksConfig),
}

impl StoreConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Sqlite { .. } => BackendKind::Sqlite,
            Self::Postgres { .. } => BackendKind::Postgres,
            Self::MySql { .. } => BackendKind::Mysql,
            Self::Databricks(_) => BackendKind::Databricks,
        }
    }
}

/// Completion endpoint configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key (sensitive - not logged).
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Operations exposed at the presentation boundary.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the schema description used to ground the AI prompt
    Schema,
    /// List tables with their row counts
    Stats,
    /// Show a few rows from a table
    Sample {
        table: String,
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_LIMIT)]
        limit: u32,
    },
    /// Execute a SQL statement verbatim
    Run { sql: String },
    /// Translate a question to SQL and execute it
    Ask {
        question: String,
        /// Only print the generated SQL
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate chart-ready aggregate SQL for an analysis request and execute it
    Analytics {
        #[arg(required_unless_present = "preset")]
        request: Option<String>,
        /// Use a named preset request instead (see `examples`)
        #[arg(long, conflicts_with = "request", value_parser = parse_preset)]
        preset: Option<&'static AnalyticsPreset>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List example questions and analytics presets
    Examples,
    /// Print the landing dashboard metrics
    Dashboard {
        #[arg(long, default_value_t = DEFAULT_TOP_AGENTS_LIMIT)]
        top_agents: u32,
    },
}

impl Command {
    /// True if the command needs the completion endpoint.
    pub fn needs_translator(&self) -> bool {
        matches!(self, Self::Ask { .. } | Self::Analytics { .. })
    }

    /// True if the command needs a store connection.
    pub fn needs_store(&self) -> bool {
        !matches!(self, Self::Examples)
    }
}

/// Resolve the analysis request text: a preset wins over free text.
pub fn analytics_request<'a>(
    request: Option<&'a str>,
    preset: Option<&'static AnalyticsPreset>,
) -> InsightResult<&'a str> {
    preset
        .map(|p| p.request)
        .or(request)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| InsightError::invalid_input("Analytics needs a request or --preset"))
}

fn parse_preset(name: &str) -> Result<&'static AnalyticsPreset, String> {
    find_preset(name).ok_or_else(|| {
        let names: Vec<&str> = ANALYTICS_PRESETS.iter().map(|p| p.name).collect();
        format!("unknown preset '{name}' (expected one of: {})", names.join(", "))
    })
}

/// Configuration for InsightIQ.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "insightiq",
    about = "Ask an insurance database questions in plain language",
    version,
    author
)]
pub struct Config {
    /// Store backend
    #[arg(
        long,
        value_enum,
        default_value = "sqlite",
        env = "INSIGHT_DB_BACKEND",
        global = true
    )]
    pub backend: BackendKind,

    /// SQLite database file (sqlite backend)
    #[arg(long, default_value = DEFAULT_SQLITE_PATH, env = "INSIGHT_SQLITE_PATH", global = true)]
    pub sqlite_path: String,

    /// Connection URL (postgres and mysql backends)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    pub database_url: Option<String>,

    /// Databricks workspace host
    #[arg(long, env = "DATABRICKS_SERVER_HOSTNAME", global = true)]
    pub databricks_host: Option<String>,

    /// Databricks SQL warehouse HTTP path
    #[arg(long, env = "DATABRICKS_HTTP_PATH", global = true)]
    pub databricks_http_path: Option<String>,

    /// Databricks personal access token
    #[arg(long, env = "DATABRICKS_TOKEN", hide_env_values = true, global = true)]
    pub databricks_token: Option<String>,

    /// Databricks catalog
    #[arg(long, default_value = DEFAULT_DATABRICKS_CATALOG, env = "DATABRICKS_CATALOG", global = true)]
    pub databricks_catalog: String,

    /// Databricks schema
    #[arg(long, default_value = DEFAULT_DATABRICKS_SCHEMA, env = "DATABRICKS_SCHEMA", global = true)]
    pub databricks_schema: String,

    /// Google AI API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    pub google_api_key: Option<String>,

    /// Gemini model identifier
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL, env = "GEMINI_MODEL", global = true)]
    pub model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, default_value = DEFAULT_GEMINI_BASE_URL, env = "GEMINI_BASE_URL", global = true)]
    pub gemini_base_url: String,

    /// Output format for result sets
    #[arg(long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "INSIGHT_LOG_LEVEL", global = true)]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "INSIGHT_JSON_LOGS", global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Load `.env` (if present) and parse configuration from the command line.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::parse()
    }

    /// Build the validated store configuration for the selected backend.
    pub fn store_config(&self) -> InsightResult<StoreConfig> {
        match self.backend {
            BackendKind::Sqlite => {
                if self.sqlite_path.trim().is_empty() {
                    return Err(InsightError::config("SQLite backend requires --sqlite-path"));
                }
                Ok(StoreConfig::Sqlite {
                    path: self.sqlite_path.clone(),
                })
            }
            BackendKind::Postgres => Ok(StoreConfig::Postgres {
                url: self.server_url(&["postgres", "postgresql"])?,
            }),
            BackendKind::Mysql => Ok(StoreConfig::MySql {
                url: self.server_url(&["mysql", "mariadb"])?,
            }),
            BackendKind::Databricks => {
                let server_hostname = required(&self.databricks_host, "--databricks-host")?;
                let http_path = required(&self.databricks_http_path, "--databricks-http-path")?;
                let access_token = required(&self.databricks_token, "--databricks-token")?;
                let config = DatabricksConfig {
                    server_hostname,
                    http_path,
                    access_token,
                    catalog: self.databricks_catalog.clone(),
                    schema: self.databricks_schema.clone(),
                };
                config.warehouse_id()?;
                config.base_url()?;
                Ok(StoreConfig::Databricks(config))
            }
        }
    }

    /// Build the completion endpoint configuration.
    pub fn gemini_config(&self) -> InsightResult<GeminiConfig> {
        let api_key = required(&self.google_api_key, "--google-api-key (GOOGLE_API_KEY)")?;
        Url::parse(&self.gemini_base_url).map_err(|e| {
            InsightError::config(format!(
                "Invalid Gemini base URL '{}': {e}",
                self.gemini_base_url
            ))
        })?;
        Ok(GeminiConfig {
            api_key,
            model: self.model.clone(),
            base_url: self.gemini_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Validate the connection URL for a server backend against its expected schemes.
    fn server_url(&self, schemes: &[&str]) -> InsightResult<String> {
        let raw = required(&self.database_url, "--database-url (DATABASE_URL)")?;
        let url = Url::parse(&raw)
            .map_err(|e| InsightError::config(format!("Invalid database URL: {e}")))?;
        if !schemes.contains(&url.scheme()) {
            return Err(InsightError::config(format!(
                "Database URL scheme '{}' does not match backend {} (expected {})",
                url.scheme(),
                self.backend,
                schemes.join(" or ")
            )));
        }
        Ok(raw)
    }
}

fn required(value: &Option<String>, flag: &str) -> InsightResult<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| InsightError::config(format!("Missing required setting {flag}")))
}
