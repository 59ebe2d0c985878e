// Method dispatcher: routes a request to its composed method chain

use crate::error::RpcError;
use crate::handler::{Handler, HandlerResult, Request};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct Dispatcher {
    methods: HashMap<String, Arc<dyn Handler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the name was already taken; the first chain stays
    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn Handler>) -> bool {
        match self.methods.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(handler);
                true
            }
        }
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[async_trait]
impl Handler for Dispatcher {
    async fn handle(&self, request: Request) -> HandlerResult {
        let Some(handler) = self.methods.get(&request.method) else {
            return Err(RpcError::MethodNotFound(request.method));
        };
        handler.handle(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_routes_by_method_name() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.insert("getHealth", Arc::new(handler_fn(|_| async { Ok(json!("h")) }))));
        assert!(dispatcher.insert("getNetwork", Arc::new(handler_fn(|_| async { Ok(json!("n")) }))));

        let result = dispatcher
            .handle(Request::new("getNetwork", Value::Null))
            .await
            .unwrap();
        assert_eq!(result, json!("n"));
        assert_eq!(dispatcher.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let dispatcher = Dispatcher::new();
        let err = dispatcher
            .handle(Request::new("getEvents", Value::Null))
            .await
            .unwrap_err();
        assert!(matches!(err, RpcError::MethodNotFound(name) if name == "getEvents"));
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let mut dispatcher = Dispatcher::new();
        assert!(dispatcher.insert("getHealth", Arc::new(handler_fn(|_| async { Ok(Value::Null) }))));
        assert!(!dispatcher.insert("getHealth", Arc::new(handler_fn(|_| async { Ok(Value::Null) }))));
        assert_eq!(dispatcher.method_names().collect::<Vec<_>>(), vec!["getHealth"]);
    }
}
