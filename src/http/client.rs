use async_trait::async_trait;
use reqwest::{Client, Method, Response, redirect::Policy};
use std::collections::BTreeMap;
use std::error::Error as StdError;
use tracing::debug;

use super::transport::{HttpTransport, ProbeRequest, RawResponse};
use crate::error::{ConfigError, TransportFailure};
use crate::models::{HttpMethod, TransportErrorKind};

pub const DEFAULT_BODY_CAP: usize = 64 * 1024;
const MAX_REDIRECTS: usize = 10;

/// reqwest-backed transport. Certificate verification cannot be toggled per
/// request, so one client is kept for each mode.
pub struct HttpClient {
    verifying: Client,
    lenient: Client,
    body_cap: usize,
}

impl HttpClient {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            verifying: Self::build(false)?,
            lenient: Self::build(true)?,
            body_cap: DEFAULT_BODY_CAP,
        })
    }

    pub fn with_body_cap(mut self, body_cap: usize) -> Self {
        self.body_cap = body_cap;
        self
    }

    fn build(accept_invalid_certs: bool) -> Result<Client, ConfigError> {
        Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))
    }

    async fn read_capped(&self, response: &mut Response) -> Vec<u8> {
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let room = self.body_cap.saturating_sub(body.len());
                    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
                    if body.len() >= self.body_cap {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("body read aborted after {} bytes: {}", body.len(), e);
                    break;
                }
            }
        }
        body
    }

    fn collect_headers(response: &Response) -> BTreeMap<String, String> {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        headers
    }

    fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Options => Method::OPTIONS,
            HttpMethod::Trace => Method::TRACE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Connect => Method::CONNECT,
        }
    }

    pub fn classify_error(err: &reqwest::Error) -> TransportErrorKind {
        if err.is_timeout() {
            return TransportErrorKind::Timeout;
        }
        if err.is_redirect() {
            return TransportErrorKind::TooManyRedirects;
        }
        if err.is_builder() {
            return TransportErrorKind::InvalidRequest;
        }

        // The top-level message embeds the URL, so only the causes are inspected.
        let causes = source_chain(err).to_lowercase();
        if causes.contains("certificate")
            || causes.contains("tls")
            || causes.contains("ssl")
            || causes.contains("handshake")
        {
            TransportErrorKind::Tls
        } else if causes.contains("dns") || causes.contains("failed to lookup") {
            TransportErrorKind::Dns
        } else if causes.contains("refused") {
            TransportErrorKind::ConnectionRefused
        } else if err.is_connect() {
            TransportErrorKind::ConnectionFailed
        } else {
            TransportErrorKind::Other
        }
    }
}

fn source_chain(err: &dyn StdError) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn send(&self, request: &ProbeRequest) -> Result<RawResponse, TransportFailure> {
        let client = if request.verify_tls {
            &self.verifying
        } else {
            &self.lenient
        };

        let mut builder = client
            .request(Self::to_reqwest_method(request.method), request.url.clone())
            .timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let mut response = builder.send().await.map_err(|e| {
            let kind = Self::classify_error(&e);
            let causes = source_chain(&e);
            let message = if causes.is_empty() {
                e.to_string()
            } else {
                format!("{}: {}", e, causes)
            };
            TransportFailure::new(kind, message)
        })?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(&response);
        let body = if request.method == HttpMethod::Head {
            Vec::new()
        } else {
            self.read_capped(&mut response).await
        };

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}
