//! JSON-RPC Server
//!
//! Builds the composed handler tree once at startup and exposes it over a
//! jsonrpsee HTTP/WebSocket server. Every registered method funnels through
//! the same root handler, so the global limiters see all calls.

use crate::compose::{compose_global, compose_method, GlobalLimits, MethodLimits};
use crate::decorate::{Instrumented, RequestIds, JSON_RPC_SUBSYSTEM};
use crate::dispatch::Dispatcher;
use crate::error::{RpcError, ServerError};
use crate::handler::{Handler, Request};
use crate::methods::{
    self, GetFeeStats, GetHealth, GetLatestLedger, GetLedgers, GetNetwork, GetVersionInfo,
};
use crate::metrics::Metrics;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use ledger_rpc_core::feewindow::FeeWindows;
use ledger_rpc_core::port::{LedgerReader, TimeProvider};
use prometheus::HistogramVec;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:8000";
pub const MAX_REQUEST_BODY_SIZE: u32 = 512 * 1024;

/// Queue limit and hard execution limit of every method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodLimitTable {
    pub get_health: MethodLimits,
    pub get_network: MethodLimits,
    pub get_version_info: MethodLimits,
    pub get_latest_ledger: MethodLimits,
    pub get_ledgers: MethodLimits,
    pub get_fee_stats: MethodLimits,
}

impl Default for MethodLimitTable {
    fn default() -> Self {
        let five_secs = MethodLimits::new(1000, Duration::from_secs(5));
        Self {
            get_health: five_secs,
            get_network: five_secs,
            get_version_info: five_secs,
            get_latest_ledger: five_secs,
            get_ledgers: MethodLimits::new(1000, Duration::from_secs(10)),
            get_fee_stats: MethodLimits::new(100, Duration::from_secs(5)),
        }
    }
}

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub endpoint: String,
    pub global: GlobalLimits,
    pub methods: MethodLimitTable,
    pub network_passphrase: String,
    pub friendbot_url: Option<String>,
    pub history_retention_window: u32,
    pub max_healthy_ledger_latency: Duration,
    pub max_ledgers_limit: u32,
    pub default_ledgers_limit: u32,
    pub build_timestamp: Option<String>,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            global: GlobalLimits {
                queue_limit: 5000,
                warning_threshold: Duration::from_secs(5),
                max_execution_duration: Duration::from_secs(25),
            },
            methods: MethodLimitTable::default(),
            network_passphrase: String::new(),
            friendbot_url: None,
            history_retention_window: 120_960,
            max_healthy_ledger_latency: Duration::from_secs(30),
            max_ledgers_limit: 200,
            default_ledgers_limit: 50,
            build_timestamp: None,
        }
    }
}

/// Ports the method handlers read from
#[derive(Clone)]
pub struct RpcDeps {
    pub ledger_reader: Arc<dyn LedgerReader>,
    pub fee_windows: Arc<FeeWindows>,
    pub clock: Arc<dyn TimeProvider>,
}

/// RPC Server
pub struct RpcServer {
    endpoint: String,
    metrics: Metrics,
    method_names: Vec<&'static str>,
    root: Arc<dyn Handler>,
}

struct MethodTree<'a> {
    metrics: &'a Metrics,
    ids: Arc<RequestIds>,
    durations: HistogramVec,
    dispatcher: Dispatcher,
    names: Vec<&'static str>,
}

impl MethodTree<'_> {
    fn add<H: Handler>(
        &mut self,
        name: &'static str,
        handler: H,
        limits: MethodLimits,
    ) -> Result<(), ServerError> {
        let limited = compose_method(self.metrics, name, handler, limits)?;
        let decorated = Instrumented::new(limited, Arc::clone(&self.ids), self.durations.clone());
        if !self.dispatcher.insert(name, Arc::new(decorated)) {
            return Err(ServerError::Register(format!("method {name} registered twice")));
        }
        self.names.push(name);
        Ok(())
    }
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, deps: RpcDeps) -> Result<Self, ServerError> {
        Self::with_metrics(config, deps, Metrics::default())
    }

    pub fn with_metrics(
        config: RpcServerConfig,
        deps: RpcDeps,
        metrics: Metrics,
    ) -> Result<Self, ServerError> {
        let durations = metrics.histogram_vec(
            JSON_RPC_SUBSYSTEM,
            "request_duration_seconds",
            "JSON RPC request duration",
            &["endpoint", "status"],
        )?;
        let mut tree = MethodTree {
            metrics: &metrics,
            ids: Arc::new(RequestIds::default()),
            durations,
            dispatcher: Dispatcher::new(),
            names: Vec::new(),
        };

        let limits = config.methods;
        let reader = &deps.ledger_reader;
        tree.add(
            methods::GET_HEALTH,
            GetHealth::new(
                Arc::clone(reader),
                Arc::clone(&deps.clock),
                config.history_retention_window,
                config.max_healthy_ledger_latency,
            ),
            limits.get_health,
        )?;
        tree.add(
            methods::GET_NETWORK,
            GetNetwork::new(
                Arc::clone(reader),
                config.network_passphrase.clone(),
                config.friendbot_url.clone(),
            ),
            limits.get_network,
        )?;
        tree.add(
            methods::GET_VERSION_INFO,
            GetVersionInfo::new(
                Arc::clone(reader),
                ledger_rpc_core::VERSION,
                config.build_timestamp.clone(),
            ),
            limits.get_version_info,
        )?;
        tree.add(
            methods::GET_LATEST_LEDGER,
            GetLatestLedger::new(Arc::clone(reader)),
            limits.get_latest_ledger,
        )?;
        tree.add(
            methods::GET_LEDGERS,
            GetLedgers::new(
                Arc::clone(reader),
                config.max_ledgers_limit,
                config.default_ledgers_limit,
            ),
            limits.get_ledgers,
        )?;
        tree.add(
            methods::GET_FEE_STATS,
            GetFeeStats::new(Arc::clone(&deps.fee_windows), Arc::clone(reader)),
            limits.get_fee_stats,
        )?;

        let MethodTree {
            dispatcher, names, ..
        } = tree;
        let root = compose_global(&metrics, dispatcher, config.global)?;

        Ok(Self {
            endpoint: config.endpoint,
            metrics,
            method_names: names,
            root: Arc::new(root),
        })
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn method_names(&self) -> &[&'static str] {
        &self.method_names
    }

    /// Entry point of the full handler tree, global limiters included
    pub fn root_handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.root)
    }

    fn rpc_module(&self) -> Result<RpcModule<()>, ServerError> {
        let mut module = RpcModule::new(());
        for &name in &self.method_names {
            let root = Arc::clone(&self.root);
            module
                .register_async_method(name, move |params, _, _| {
                    let root = Arc::clone(&root);
                    async move {
                        let params = match params.as_str() {
                            Some(raw) => serde_json::from_str::<Value>(raw).map_err(|e| {
                                ErrorObjectOwned::from(RpcError::InvalidParams(e.to_string()))
                            })?,
                            None => Value::Null,
                        };
                        root.handle(Request::new(name, params))
                            .await
                            .map_err(ErrorObjectOwned::from)
                    }
                })
                .map_err(|e| ServerError::Register(e.to_string()))?;
        }
        Ok(module)
    }

    /// Start the JSON-RPC server, returning the bound address and its handle
    pub async fn start(&self) -> Result<(SocketAddr, ServerHandle), ServerError> {
        let module = self.rpc_module()?;

        let bind_err = |source: std::io::Error| ServerError::Bind {
            addr: self.endpoint.clone(),
            source,
        };
        let server = Server::builder()
            .max_request_body_size(MAX_REQUEST_BODY_SIZE)
            .build(self.endpoint.as_str())
            .await
            .map_err(bind_err)?;
        let addr = server.local_addr().map_err(bind_err)?;

        info!(
            endpoint = %addr,
            methods = self.method_names.len(),
            "Starting JSON-RPC server"
        );
        Ok((addr, server.start(module)))
    }
}
