//! Canned HTTP adapter.

use async_trait::async_trait;
use pokedex_store::adapter::{AdapterError, HttpAdapter};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections;
use std::sync::{Arc, Mutex};

/// Answers from a fixed url to JSON map and records every requested url.
#[derive(Clone, Debug, Default)]
pub struct CannedAdapter {
    responses: collections::HashMap<String, Value>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedAdapter {
    /// Answer `url` with `body`.
    pub fn with_response(mut self, url: &str, body: Value) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    /// Urls requested so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl HttpAdapter for CannedAdapter {
    async fn get<T>(&self, url: &str) -> Result<T, AdapterError>
    where
        T: DeserializeOwned + Send,
    {
        self.requests
            .lock()
            .expect("requests lock")
            .push(url.to_string());
        let body = self.responses.get(url).cloned().ok_or(AdapterError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        serde_json::from_value(body).map_err(|error| AdapterError::InvalidResponse {
            url: url.to_string(),
            message: error.to_string(),
        })
    }
}
