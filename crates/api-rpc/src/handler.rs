//! Uniform request handler interface
//!
//! Method implementations, backlog gates, duration governors, the request
//! decorator and the dispatcher all implement [`Handler`], so they compose by
//! wrapping one another.

use crate::error::RpcError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub type HandlerResult = Result<Value, RpcError>;

/// One JSON-RPC call
#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub params: Value,
}

impl Request {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Deserialize params, treating absent params like an empty object
    pub fn parse_params<T: DeserializeOwned>(&self) -> Result<T, RpcError> {
        let params = match &self.params {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
    }
}

#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, request: Request) -> HandlerResult;
}

#[async_trait]
impl<H: Handler + ?Sized> Handler for Arc<H> {
    async fn handle(&self, request: Request) -> HandlerResult {
        (**self).handle(request).await
    }
}

/// Adapts an async closure into a [`Handler`]
pub struct FnHandler<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, request: Request) -> HandlerResult {
        (self.0)(request).await
    }
}

/// Serialize a method response into the handler result
pub fn to_result<T: Serialize>(response: T) -> HandlerResult {
    serde_json::to_value(response).map_err(|e| RpcError::App(e.into()))
}
