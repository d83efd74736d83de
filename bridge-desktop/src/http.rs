//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm, MultipartPart},
};
use reqwest::{multipart, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Default per-request ceiling
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - A fixed per-request timeout ceiling
/// - TLS support by default (rustls)
/// - Multipart uploads
///
/// Statuses are never turned into errors here; retry and throttling policy is
/// left to the caller.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with the default timeout and no user agent
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_TIMEOUT, None)
    }

    /// Create a new HTTP client with custom timeout and user agent
    pub fn with_config(timeout: Duration, user_agent: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10);

        if let Some(agent) = user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|e| {
            BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self { client })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Convert bridge multipart form to a reqwest form
    fn convert_form(form: MultipartForm) -> Result<multipart::Form> {
        let mut out = multipart::Form::new();

        for part in form.parts {
            out = match part {
                MultipartPart::Text { name, value } => out.text(name, value),
                MultipartPart::File {
                    name,
                    filename,
                    content_type,
                    data,
                } => {
                    let length = data.len() as u64;
                    let file_part =
                        multipart::Part::stream_with_length(reqwest::Body::from(data), length)
                            .file_name(filename)
                            .mime_str(&content_type)
                            .map_err(|e| {
                                BridgeError::OperationFailed(format!(
                                    "Invalid content type {}: {}",
                                    content_type, e
                                ))
                            })?;
                    out.part(name, file_part)
                }
            };
        }

        Ok(out)
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> Result<reqwest::RequestBuilder> {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        // Add headers
        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        // Multipart takes precedence over a raw body
        if let Some(form) = request.multipart {
            req = req.multipart(Self::convert_form(form)?);
        } else if let Some(body) = request.body {
            req = req.body(body);
        }

        // Add timeout if specified
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        Ok(req)
    }

    fn map_send_error(error: reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Transport("Request timed out".to_string())
        } else if error.is_connect() {
            BridgeError::Transport(format!("Connection failed: {}", error))
        } else {
            BridgeError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, url = %request.url, "Executing HTTP request");

        let response = self
            .build_request(request)?
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "HTTP request failed");
                Self::map_send_error(e)
            })?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::Transport(format!("Failed to read body: {}", e)))?;

        debug!(status, bytes = body.len(), "HTTP response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
