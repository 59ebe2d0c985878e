// Ledger RPC Core - Domain Logic, Fee Windows & Ports
// NO infrastructure dependencies: storage and transport live in adapter crates

pub mod application;
pub mod domain;
pub mod error;
pub mod feewindow;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
