//! External dependency clients and their breaker-guarded wrappers.
//!
//! # Responsibilities
//! - Define the two-method surface every dependency exposes (`call`, `health_check`)
//! - Provide an HTTP implementation over hyper-util
//! - Route both methods through the dependency's named circuit breaker
//!
//! # Design Decisions
//! - The breaker wraps the trait, not the wire protocol; store, cache,
//!   document-AI, LLM and chat-notification clients all look the same here
//! - Non-2xx responses are failures

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::{AppConfig, DependencyConfig};
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::error::DependencyError;
use crate::resilience::registry::BreakerRegistry;

/// Largest dependency response body accepted.
const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

/// Failure reported by a dependency client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("health check failed")]
    Unhealthy,
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

/// Contract shared by every external dependency.
#[async_trait]
pub trait ExternalClient: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, args: Value) -> Result<Value, ClientError>;

    async fn health_check(&self) -> bool;
}

/// A dependency reached with JSON over HTTP.
pub struct HttpDependency {
    name: String,
    call_uri: Uri,
    health_uri: Uri,
    client: Client<HttpConnector, Body>,
}

impl HttpDependency {
    pub fn new(config: &DependencyConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", config.base_url, e)))?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            name: config.name.clone(),
            call_uri: join(&base, &config.call_path)?,
            health_uri: join(&base, &config.health_path)?,
            client,
        })
    }
}

fn join(base: &Url, path: &str) -> Result<Uri, ClientError> {
    let url = base
        .join(path)
        .map_err(|e| ClientError::InvalidEndpoint(format!("{}{}: {}", base, path, e)))?;
    url.as_str()
        .parse()
        .map_err(|e| ClientError::InvalidEndpoint(format!("{}: {}", url, e)))
}

#[async_trait]
impl ExternalClient for HttpDependency {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, args: Value) -> Result<Value, ClientError> {
        let request = Request::builder()
            .method(Method::POST)
            .uri(self.call_uri.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&args)?))
            .map_err(|e| ClientError::InvalidEndpoint(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let bytes = axum::body::to_bytes(Body::new(response.into_body()), MAX_RESPONSE_BYTES)
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn health_check(&self) -> bool {
        let request = match Request::builder()
            .method(Method::GET)
            .uri(self.health_uri.clone())
            .header(header::USER_AGENT, "lending-resilience-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(dependency = %self.name, error = %e, "Failed to build health check request");
                return false;
            }
        };

        match self.client.request(request).await {
            Ok(response) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(dependency = %self.name, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Err(e) => {
                tracing::warn!(dependency = %self.name, error = %e, "Health check failed: connection error");
                false
            }
        }
    }
}

/// A dependency client whose calls all pass through its circuit breaker.
#[derive(Clone)]
pub struct GuardedClient {
    client: Arc<dyn ExternalClient>,
    breaker: Arc<CircuitBreaker>,
}

impl GuardedClient {
    pub fn new(client: Arc<dyn ExternalClient>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { client, breaker }
    }

    pub fn name(&self) -> &str {
        self.breaker.name()
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub async fn call(&self, args: Value) -> Result<Value, DependencyError> {
        let client = self.client.clone();
        self.breaker
            .execute(|| async move { client.call(args).await })
            .await
    }

    /// False when the probe fails, times out, or the breaker rejects it.
    pub async fn health_check(&self) -> bool {
        let client = self.client.clone();
        self.breaker
            .execute(|| async move {
                if client.health_check().await {
                    Ok(())
                } else {
                    Err(ClientError::Unhealthy)
                }
            })
            .await
            .is_ok()
    }
}

impl std::fmt::Debug for GuardedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedClient")
            .field("name", &self.client.name())
            .field("breaker", &self.breaker)
            .finish()
    }
}

#[derive(Debug, Clone)]
struct Entry {
    client: GuardedClient,
    required: bool,
}

/// The named, guarded dependency clients of this deployment.
#[derive(Debug, Clone, Default)]
pub struct DependencySet {
    entries: BTreeMap<String, Entry>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP clients for every configured dependency.
    pub fn from_config(config: &AppConfig, breakers: &BreakerRegistry) -> Result<Self, ClientError> {
        let mut set = Self::new();
        for dep in &config.dependencies {
            let client = Arc::new(HttpDependency::new(dep)?);
            set.insert(client, breakers, dep.required);
        }
        Ok(set)
    }

    /// Register `client` under its own name with the registry's breaker.
    pub fn insert(&mut self, client: Arc<dyn ExternalClient>, breakers: &BreakerRegistry, required: bool) {
        let name = client.name().to_string();
        let breaker = breakers.get_or_create(&name);
        self.entries.insert(
            name,
            Entry {
                client: GuardedClient::new(client, breaker),
                required,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&GuardedClient> {
        self.entries.get(name).map(|e| &e.client)
    }

    /// Dependencies whose startup probe gates live mode.
    pub fn required(&self) -> impl Iterator<Item = &GuardedClient> {
        self.entries.values().filter(|e| e.required).map(|e| &e.client)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
