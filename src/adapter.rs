//! Outbound HTTP fetch capability.
//!
//! [`HttpAdapter`] is the port; [`ReqwestAdapter`] implements it over `reqwest`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every request issued by [`ReqwestAdapter::new`].
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from outbound fetches.
///
/// Transport specific errors are mapped onto these.
#[derive(Debug, Error, PartialEq)]
pub enum AdapterError {
    /// The request could not be sent or no response arrived.
    #[error("network error fetching {url}: {message}")]
    Network {
        /// Requested url.
        url: String,
        /// Description of the failure.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("{url} answered with status {status}")]
    Status {
        /// Requested url.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// The body could not be decoded into the requested type.
    #[error("invalid response from {url}: {message}")]
    InvalidResponse {
        /// Requested url.
        url: String,
        /// What was invalid.
        message: String,
    },
}

/// Fetch a JSON document and decode it.
#[async_trait]
pub trait HttpAdapter: Send + Sync {
    /// GET `url` and decode its JSON body into `T`.
    async fn get<T>(&self, url: &str) -> Result<T, AdapterError>
    where
        T: DeserializeOwned + Send;
}

/// [`HttpAdapter`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct ReqwestAdapter {
    client: reqwest::Client,
}

impl ReqwestAdapter {
    /// Adapter with a fresh client and the default timeout.
    pub fn new() -> Result<Self, AdapterError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|error| AdapterError::Network {
                url: String::new(),
                message: error.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Adapter reusing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpAdapter for ReqwestAdapter {
    #[tracing::instrument(name = "pokedex_store.http_get", skip(self))]
    async fn get<T>(&self, url: &str) -> Result<T, AdapterError>
    where
        T: DeserializeOwned + Send,
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| AdapterError::Network {
                url: url.to_string(),
                message: error.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|error| AdapterError::InvalidResponse {
                url: url.to_string(),
                message: error.to_string(),
            })
    }
}
