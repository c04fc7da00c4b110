//! Blocking `reqwest` implementation of [`HttpClient`].

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpClient, HttpRequest, HttpResponse, Method};
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;

/// HTTP client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with the configured timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(map_error)?;
        Ok(Self { client })
    }
}

fn map_error(error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout
    } else if error.is_decode() {
        ApiError::Decode(error.to_string())
    } else {
        ApiError::Connection(error.to_string())
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: &HttpRequest) -> ApiResult<HttpResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
        };

        let mut builder = self
            .client
            .request(method, &request.url)
            .basic_auth(&request.username, Some(&request.password))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(map_error)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        let body = response.text().map_err(map_error)?;

        Ok(HttpResponse {
            status,
            body,
            retry_after,
        })
    }
}
