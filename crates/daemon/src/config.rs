//! Daemon configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `LEDGER_RPC_*` environment variables, then command-line flags.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ledger_rpc_api::compose::{GlobalLimits, MethodLimits};
use ledger_rpc_api::server::{MethodLimitTable, RpcServerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "LEDGER_RPC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Parser, Debug, Default)]
#[command(name = "ledger-rpc")]
#[command(about = "JSON-RPC server for ingested ledger history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long)]
    pub config_path: Option<PathBuf>,

    /// Address the JSON-RPC server listens on
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Address serving Prometheus metrics at /metrics; empty disables it
    #[arg(long)]
    pub admin_endpoint: Option<String>,

    /// SQLite database file
    #[arg(long)]
    pub db_path: Option<String>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Default filter when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,

    #[arg(long)]
    pub network_passphrase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub admin_endpoint: Option<String>,
    pub db_path: String,
    pub network_passphrase: String,
    pub friendbot_url: Option<String>,

    pub history_retention_window: u32,
    pub classic_fee_stats_retention_window: u32,
    pub soroban_fee_stats_retention_window: u32,
    pub max_healthy_ledger_latency_ms: u64,

    pub request_backlog_global_queue_limit: u64,
    pub request_execution_warning_threshold_ms: u64,
    pub max_request_execution_duration_ms: u64,

    pub request_backlog_get_health_queue_limit: u64,
    pub max_get_health_execution_duration_ms: u64,
    pub request_backlog_get_network_queue_limit: u64,
    pub max_get_network_execution_duration_ms: u64,
    pub request_backlog_get_version_info_queue_limit: u64,
    pub max_get_version_info_execution_duration_ms: u64,
    pub request_backlog_get_latest_ledger_queue_limit: u64,
    pub max_get_latest_ledger_execution_duration_ms: u64,
    pub request_backlog_get_ledgers_queue_limit: u64,
    pub max_get_ledgers_execution_duration_ms: u64,
    pub request_backlog_get_fee_stats_queue_limit: u64,
    pub max_get_fee_stats_execution_duration_ms: u64,

    pub max_ledgers_limit: u32,
    pub default_ledgers_limit: u32,

    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: "127.0.0.1:8000".to_string(),
            admin_endpoint: None,
            db_path: "ledger_rpc.sqlite".to_string(),
            network_passphrase: String::new(),
            friendbot_url: None,
            history_retention_window: 120_960,
            classic_fee_stats_retention_window: 10,
            soroban_fee_stats_retention_window: 50,
            max_healthy_ledger_latency_ms: 30_000,
            request_backlog_global_queue_limit: 5000,
            request_execution_warning_threshold_ms: 5000,
            max_request_execution_duration_ms: 25_000,
            request_backlog_get_health_queue_limit: 1000,
            max_get_health_execution_duration_ms: 5000,
            request_backlog_get_network_queue_limit: 1000,
            max_get_network_execution_duration_ms: 5000,
            request_backlog_get_version_info_queue_limit: 1000,
            max_get_version_info_execution_duration_ms: 5000,
            request_backlog_get_latest_ledger_queue_limit: 1000,
            max_get_latest_ledger_execution_duration_ms: 5000,
            request_backlog_get_ledgers_queue_limit: 1000,
            max_get_ledgers_execution_duration_ms: 10_000,
            request_backlog_get_fee_stats_queue_limit: 100,
            max_get_fee_stats_execution_duration_ms: 5000,
            max_ledgers_limit: 200,
            default_ledgers_limit: 50,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Full layering including the process environment and CLI flags
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = Self::from_sources(cli.config_path.as_deref(), None)?;
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// File and environment layers. `env` replaces the process environment
    /// when given.
    pub fn from_sources(
        config_path: Option<&Path>,
        env: Option<::config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(true),
            );
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .source(env),
        );

        builder
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("failed to parse configuration")
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(endpoint) = &cli.endpoint {
            self.endpoint = endpoint.clone();
        }
        if let Some(admin_endpoint) = &cli.admin_endpoint {
            self.admin_endpoint = Some(admin_endpoint.clone());
        }
        if let Some(db_path) = &cli.db_path {
            self.db_path = db_path.clone();
        }
        if let Some(log_format) = cli.log_format {
            self.log_format = log_format;
        }
        if let Some(log_level) = &cli.log_level {
            self.log_level = log_level.clone();
        }
        if let Some(passphrase) = &cli.network_passphrase {
            self.network_passphrase = passphrase.clone();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.network_passphrase.trim().is_empty() {
            bail!("network_passphrase is required");
        }
        if self.admin_endpoint() == Some(self.endpoint.as_str()) {
            bail!("admin_endpoint must differ from endpoint ({})", self.endpoint);
        }
        if self.classic_fee_stats_retention_window == 0 {
            bail!("classic_fee_stats_retention_window must be positive");
        }
        if self.soroban_fee_stats_retention_window == 0 {
            bail!("soroban_fee_stats_retention_window must be positive");
        }
        if self.history_retention_window == 0 {
            bail!("history_retention_window must be positive");
        }
        if self.default_ledgers_limit > self.max_ledgers_limit {
            bail!(
                "default_ledgers_limit ({}) must not exceed max_ledgers_limit ({})",
                self.default_ledgers_limit,
                self.max_ledgers_limit
            );
        }
        if self.request_backlog_global_queue_limit == 0 {
            bail!("request_backlog_global_queue_limit must be positive");
        }
        if self.max_request_execution_duration_ms != 0
            && self.request_execution_warning_threshold_ms >= self.max_request_execution_duration_ms
        {
            bail!(
                "request_execution_warning_threshold_ms ({}) must be below max_request_execution_duration_ms ({})",
                self.request_execution_warning_threshold_ms,
                self.max_request_execution_duration_ms
            );
        }
        Ok(())
    }

    /// Metrics listener address, `None` when unset or blank
    pub fn admin_endpoint(&self) -> Option<&str> {
        self.admin_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
    }

    /// Ledgers replayed into the fee windows at startup
    pub fn fee_backfill_window(&self) -> u32 {
        self.classic_fee_stats_retention_window
            .max(self.soroban_fee_stats_retention_window)
    }

    pub fn rpc_server_config(&self) -> RpcServerConfig {
        let method =
            |queue_limit, max_ms| MethodLimits::new(queue_limit, Duration::from_millis(max_ms));
        RpcServerConfig {
            endpoint: self.endpoint.clone(),
            global: GlobalLimits {
                queue_limit: self.request_backlog_global_queue_limit,
                warning_threshold: Duration::from_millis(self.request_execution_warning_threshold_ms),
                max_execution_duration: Duration::from_millis(self.max_request_execution_duration_ms),
            },
            methods: MethodLimitTable {
                get_health: method(
                    self.request_backlog_get_health_queue_limit,
                    self.max_get_health_execution_duration_ms,
                ),
                get_network: method(
                    self.request_backlog_get_network_queue_limit,
                    self.max_get_network_execution_duration_ms,
                ),
                get_version_info: method(
                    self.request_backlog_get_version_info_queue_limit,
                    self.max_get_version_info_execution_duration_ms,
                ),
                get_latest_ledger: method(
                    self.request_backlog_get_latest_ledger_queue_limit,
                    self.max_get_latest_ledger_execution_duration_ms,
                ),
                get_ledgers: method(
                    self.request_backlog_get_ledgers_queue_limit,
                    self.max_get_ledgers_execution_duration_ms,
                ),
                get_fee_stats: method(
                    self.request_backlog_get_fee_stats_queue_limit,
                    self.max_get_fee_stats_execution_duration_ms,
                ),
            },
            network_passphrase: self.network_passphrase.clone(),
            friendbot_url: self.friendbot_url.clone(),
            history_retention_window: self.history_retention_window,
            max_healthy_ledger_latency: Duration::from_millis(self.max_healthy_ledger_latency_ms),
            max_ledgers_limit: self.max_ledgers_limit,
            default_ledgers_limit: self.default_ledgers_limit,
            build_timestamp: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PASSPHRASE: &str = "Test SDF Network ; September 2015";

    fn env(pairs: &[(&str, &str)]) -> Option<::config::Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn valid() -> Config {
        Config {
            network_passphrase: PASSPHRASE.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = Config::from_sources(None, env(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.endpoint, "127.0.0.1:8000");
        assert_eq!(config.fee_backfill_window(), 50);
    }

    #[test]
    fn test_file_then_env_layering() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
endpoint = "0.0.0.0:9000"
network_passphrase = "{PASSPHRASE}"
request_backlog_get_fee_stats_queue_limit = 7
log_format = "json"
"#
        )
        .unwrap();

        let config = Config::from_sources(
            Some(file.path()),
            env(&[
                ("LEDGER_RPC_ENDPOINT", "127.0.0.1:9100"),
                ("LEDGER_RPC_MAX_LEDGERS_LIMIT", "300"),
            ]),
        )
        .unwrap();

        assert_eq!(config.endpoint, "127.0.0.1:9100");
        assert_eq!(config.network_passphrase, PASSPHRASE);
        assert_eq!(config.request_backlog_get_fee_stats_queue_limit, 7);
        assert_eq!(config.max_ledgers_limit, 300);
        assert_eq!(config.log_format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Config::from_sources(Some(&missing), env(&[])).is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = valid();
        config.apply_cli(&Cli {
            endpoint: Some("127.0.0.1:1".to_string()),
            log_format: Some(LogFormat::Json),
            log_level: Some("debug".to_string()),
            ..Default::default()
        });
        assert_eq!(config.endpoint, "127.0.0.1:1");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.db_path, "ledger_rpc.sqlite");
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "ledger-rpc",
            "--endpoint",
            "127.0.0.1:8001",
            "--log-format",
            "json",
            "--db-path",
            "/tmp/ledgers.sqlite",
        ]);
        assert_eq!(cli.endpoint.as_deref(), Some("127.0.0.1:8001"));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert_eq!(cli.db_path.as_deref(), Some("/tmp/ledgers.sqlite"));
    }

    #[test]
    fn test_admin_endpoint_layering() {
        let config = Config::from_sources(None, env(&[])).unwrap();
        assert_eq!(config.admin_endpoint(), None);

        let config =
            Config::from_sources(None, env(&[("LEDGER_RPC_ADMIN_ENDPOINT", "127.0.0.1:8001")]))
                .unwrap();
        assert_eq!(config.admin_endpoint(), Some("127.0.0.1:8001"));

        let mut config = valid();
        let cli = Cli::parse_from(["ledger-rpc", "--admin-endpoint", "0.0.0.0:9090"]);
        config.apply_cli(&cli);
        assert_eq!(config.admin_endpoint(), Some("0.0.0.0:9090"));
        assert!(config.validate().is_ok());

        // Blank means disabled
        config.admin_endpoint = Some("  ".to_string());
        assert_eq!(config.admin_endpoint(), None);
        assert!(config.validate().is_ok());

        config.admin_endpoint = Some(config.endpoint.clone());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation() {
        assert!(valid().validate().is_ok());
        assert!(Config::default().validate().is_err());

        let cases: [fn(&mut Config); 6] = [
            |c| c.classic_fee_stats_retention_window = 0,
            |c| c.soroban_fee_stats_retention_window = 0,
            |c| c.default_ledgers_limit = c.max_ledgers_limit + 1,
            |c| c.request_backlog_global_queue_limit = 0,
            |c| c.request_execution_warning_threshold_ms = c.max_request_execution_duration_ms,
            |c| c.history_retention_window = 0,
        ];
        for breaks in cases {
            let mut config = valid();
            breaks(&mut config);
            assert!(config.validate().is_err(), "{config:?}");
        }

        let mut unbounded = valid();
        unbounded.max_request_execution_duration_ms = 0;
        assert!(unbounded.validate().is_ok());
    }

    #[test]
    fn test_rpc_server_config_mapping() {
        let server = valid().rpc_server_config();
        assert_eq!(server.global.queue_limit, 5000);
        assert_eq!(server.global.warning_threshold, Duration::from_secs(5));
        assert_eq!(
            server.methods.get_ledgers,
            MethodLimits::new(1000, Duration::from_secs(10))
        );
        assert_eq!(server.methods.get_fee_stats.queue_limit, 100);
        assert_eq!(
            server.methods.get_fee_stats.warning_threshold(),
            Duration::from_millis(5000) / 3
        );
    }
}
