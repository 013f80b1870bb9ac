//! HTTP contract with the pattern-mining backend.

pub mod wire;

use std::future::Future;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use thiserror::Error;

use crate::form::pattern::PatternQuery;
use crate::form::sample::FormState;

pub use wire::{DeleteResponse, ErrorBody, PatternsResponse};

pub const LOAD_DATA_PATH: &str = "load-data-submit";
pub const FIND_PATTERNS_PATH: &str = "find-patterns-submit";
pub const DELETE_SAMPLE_PATH: &str = "delete-sample";

/// Banner text when a failure carries no usable message.
pub const FALLBACK_ERROR: &str = "Ошибка сервера";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("failed to build http client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid proxy URL {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server answered {status}: {}", .message.as_deref().unwrap_or("<no message>"))]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("unreadable response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// Text for the shared error banner. Only server-supplied messages are
    /// shown verbatim; everything else collapses into one fallback line.
    pub fn banner_message(&self) -> &str {
        match self {
            ClientError::Server {
                message: Some(message),
                ..
            } => message.as_str(),
            _ => FALLBACK_ERROR,
        }
    }
}

/// Calls the submission controllers make. [`ApiClient`] is the real
/// implementation.
pub trait Backend {
    fn load_data_submit(&self, state: &FormState) -> impl Future<Output = Result<(), ClientError>>;

    fn find_patterns_submit(
        &self,
        query: &PatternQuery,
    ) -> impl Future<Output = Result<PatternsResponse, ClientError>>;

    fn delete_sample(&self, id: &str) -> impl Future<Output = Result<DeleteResponse, ClientError>>;
}

#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub base_url: String,
    /// `None` keeps the transport default.
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            timeout_seconds: None,
            proxy: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(options: &ClientOptions) -> Result<Self, ClientError> {
        let base = normalize_base_url(&options.base_url)?;
        let http = build_http_client(options)?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base.join(path).map_err(|e| ClientError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            message: e.to_string(),
        })
    }

    async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, "POST");
        let response = self
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        tracing::debug!(url = %url, status = %response.status(), "response");
        ensure_success(response).await
    }
}

impl Backend for ApiClient {
    async fn load_data_submit(&self, state: &FormState) -> Result<(), ClientError> {
        let response = self.post_json(LOAD_DATA_PATH, state).await?;
        let url = response.url().to_string();
        // Success bodies are not inspected but still have to be JSON.
        response
            .json::<serde_json::Value>()
            .await
            .map(|_| ())
            .map_err(|e| ClientError::Decode { url, source: e })
    }

    async fn find_patterns_submit(
        &self,
        query: &PatternQuery,
    ) -> Result<PatternsResponse, ClientError> {
        let response = self.post_json(FIND_PATTERNS_PATH, query).await?;
        let url = response.url().to_string();
        response
            .json::<PatternsResponse>()
            .await
            .map_err(|e| ClientError::Decode { url, source: e })
    }

    /// The delete endpoint reports failure in its body, so the status code
    /// is not checked here.
    async fn delete_sample(&self, id: &str) -> Result<DeleteResponse, ClientError> {
        let url = self.endpoint(&format!("{DELETE_SAMPLE_PATH}/{id}"))?;
        tracing::debug!(url = %url, "DELETE");
        let response = self
            .http
            .delete(url.clone())
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                url: url.to_string(),
                source: e,
            })?;
        response
            .json::<DeleteResponse>()
            .await
            .map_err(|e| ClientError::Decode {
                url: url.to_string(),
                source: e,
            })
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response
        .json::<ErrorBody>()
        .await
        .map_err(|e| ClientError::Decode { url, source: e })?;
    Err(ClientError::Server {
        status,
        message: body.message().map(str::to_string),
    })
}

/// Parses the server URL and makes sure it ends with `/` so relative
/// endpoint paths join below it instead of replacing its last segment.
pub fn normalize_base_url(raw: &str) -> Result<Url, ClientError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ClientError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme {other}"),
        }),
    }
}

fn build_http_client(options: &ClientOptions) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder();

    if let Some(seconds) = options.timeout_seconds.filter(|s| *s > 0) {
        builder = builder.timeout(Duration::from_secs(seconds));
    }

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy_setting = reqwest::Proxy::all(proxy).map_err(|e| ClientError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy_setting);
    }

    builder
        .build()
        .map_err(|e| ClientError::HttpClientBuild { source: e })
}
