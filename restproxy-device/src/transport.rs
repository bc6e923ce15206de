//! JSON-over-HTTP transport to the REST backend
//!
//! One pooled `reqwest::Client` behind an explicitly built [`HttpTransport`],
//! shared by every stream and the reservation call. Each `request` issues
//! exactly one outbound call; retrying is the caller's business.

use crate::cancel::CancelToken;
use crate::config::Settings;
use crate::error::{ProxyError, Result};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| ProxyError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base: settings.address.clone(),
            timeout: settings.request_timeout,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Append the endpoint's path segments to the base address, keeping its path
    pub fn url(&self, endpoint: &str) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| ProxyError::RequestBuild {
                endpoint: endpoint.to_string(),
                reason: format!("{} cannot be used as a base URL", self.base),
            })?;
            segments.pop_if_empty();
            segments.extend(endpoint.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    /// Send `input` (if any) as JSON and decode the response body into `O`.
    ///
    /// When `cancel` is given the call races it; losing the race drops the
    /// in-flight request.
    pub async fn request<I, O>(
        &self,
        method: Method,
        endpoint: &str,
        input: Option<&I>,
        cancel: Option<&CancelToken>,
    ) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let call = self.execute(method, endpoint, input);
        match cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(ProxyError::Cancelled { endpoint: endpoint.to_string() }),
                    res = call => res,
                }
            }
            None => call.await,
        }
    }

    async fn execute<I, O>(&self, method: Method, endpoint: &str, input: Option<&I>) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = self.url(endpoint)?;
        let mut builder = self.client.request(method.clone(), url).timeout(self.timeout);

        if let Some(input) = input {
            let body = serde_json::to_vec(input).map_err(|e| ProxyError::RequestBuild {
                endpoint: endpoint.to_string(),
                reason: format!("failed to marshal request: {}", e),
            })?;
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let request = builder.build().map_err(|e| ProxyError::RequestBuild {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        debug!(%method, url = %request.url(), "sending request");
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        if status.as_u16() >= 400 {
            return Err(ProxyError::Remote {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body: serde_json::from_slice(&bytes).ok(),
            });
        }

        serde_json::from_slice(&bytes).map_err(|source| ProxyError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    fn transport_error(&self, endpoint: &str, err: reqwest::Error) -> ProxyError {
        if err.is_timeout() {
            ProxyError::TimedOut {
                endpoint: endpoint.to_string(),
                timeout: self.timeout,
            }
        } else {
            ProxyError::Transport {
                endpoint: endpoint.to_string(),
                source: err,
            }
        }
    }
}
