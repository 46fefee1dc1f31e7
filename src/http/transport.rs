use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use crate::error::TransportFailure;
use crate::models::HttpMethod;

#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub verify_tls: bool,
}

impl ProbeRequest {
    pub fn new(method: HttpMethod, url: Url, timeout: Duration, verify_tls: bool) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            timeout,
            verify_tls,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    /// Lower-cased names; repeated headers joined with ", ".
    pub headers: BTreeMap<String, String>,
    /// Capped body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// The single seam between the audit core and the network.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &ProbeRequest) -> Result<RawResponse, TransportFailure>;
}
