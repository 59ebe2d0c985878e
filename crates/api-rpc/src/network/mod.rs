//! Request admission and execution-time governance
//!
//! Both limiters wrap any [`Handler`](crate::handler::Handler) and are
//! themselves handlers, so one instance guards a single method or, wrapped
//! around the dispatcher, the whole server.

pub mod backlog;
pub mod duration;

pub use backlog::BacklogQueueLimiter;
pub use duration::RequestDurationLimiter;
