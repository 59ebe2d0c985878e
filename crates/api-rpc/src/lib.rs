//! JSON-RPC API Layer
//!
//! Method handlers behind per-method and global backlog gates and
//! execution-duration limiters, served over jsonrpsee.

pub mod admin;
pub mod compose;
pub mod decorate;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod methods;
pub mod metrics;
pub mod network;
pub mod server;
pub mod types;

pub use admin::{start_admin, AdminHandle};
pub use error::{RpcError, ServerError};
pub use handler::{Handler, HandlerResult, Request};
pub use metrics::Metrics;
pub use server::{RpcDeps, RpcServer, RpcServerConfig};
