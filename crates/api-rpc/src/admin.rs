//! Admin HTTP endpoint
//!
//! A plain HTTP listener running beside the JSON-RPC server. It answers
//! `GET /metrics` with the Prometheus text exposition of the server's
//! registry and nothing else.

use crate::error::ServerError;
use crate::metrics::Metrics;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const METRICS_PATH: &str = "/metrics";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";
const MAX_REQUEST_HEAD: usize = 4096;

/// Running admin listener
#[derive(Debug)]
pub struct AdminHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AdminHandle {
    /// Ask the accept loop to exit. Connections already accepted finish on their own.
    pub fn stop(&self) {
        // Fails only when the loop has already exited
        let _ = self.shutdown.send(true);
    }

    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "Admin server task failed");
        }
    }
}

/// Bind `endpoint` and serve the metrics of `metrics` until stopped
pub async fn start_admin(
    endpoint: &str,
    metrics: Metrics,
) -> Result<(SocketAddr, AdminHandle), ServerError> {
    let bind_err = |source: std::io::Error| ServerError::Bind {
        addr: endpoint.to_string(),
        source,
    };
    let listener = TcpListener::bind(endpoint).await.map_err(bind_err)?;
    let addr = listener.local_addr().map_err(bind_err)?;

    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(accept_loop(listener, metrics, shutdown_rx));

    info!(endpoint = %addr, path = METRICS_PATH, "Starting admin server");
    Ok((addr, AdminHandle { shutdown, task }))
}

async fn accept_loop(
    listener: TcpListener,
    metrics: Metrics,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("Admin server stopped");
                    return;
                }
            }
            accept = listener.accept() => {
                match accept {
                    Ok((stream, peer)) => {
                        let metrics = metrics.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &metrics).await {
                                debug!(peer = %peer, error = %e, "Admin connection failed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Admin accept failed"),
                }
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, metrics: &Metrics) -> std::io::Result<()> {
    let mut buf = vec![0u8; MAX_REQUEST_HEAD];
    let n = stream.read(&mut buf).await?;
    let head = String::from_utf8_lossy(&buf[..n]);
    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default();
    let target = request_line.next().unwrap_or("/");
    let path = target.split('?').next().unwrap_or(target);

    let (status, content_type, body) = route(method, path, metrics);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await
}

fn route(method: &str, path: &str, metrics: &Metrics) -> (&'static str, &'static str, String) {
    match (method, path) {
        ("GET", METRICS_PATH) => match metrics.encode() {
            Ok(text) => ("200 OK", PROMETHEUS_CONTENT_TYPE, text),
            Err(e) => {
                warn!(error = %e, "Metrics encoding failed");
                ("500 Internal Server Error", "text/plain", format!("{e}\n"))
            }
        },
        (_, METRICS_PATH) => (
            "405 Method Not Allowed",
            "text/plain",
            "method not allowed\n".to_string(),
        ),
        _ => ("404 Not Found", "text/plain", "not found\n".to_string()),
    }
}
