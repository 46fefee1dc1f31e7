use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::transport::{HttpTransport, ProbeRequest, RawResponse};
use crate::error::TransportFailure;
use crate::models::{HttpMethod, TransportErrorKind};

type Reply = Result<RawResponse, TransportFailure>;

/// In-memory transport for unit tests. Unscripted requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: HashMap<(HttpMethod, String), Reply>,
    fallback: HashMap<HttpMethod, Reply>,
    calls: Mutex<Vec<ProbeRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, method: HttpMethod, url: &str, reply: Reply) -> Self {
        self.replies.insert((method, url.to_string()), reply);
        self
    }

    /// Reply used for `method` on any URL without a specific script.
    pub fn on_any(mut self, method: HttpMethod, reply: Reply) -> Self {
        self.fallback.insert(method, reply);
        self
    }

    pub fn calls(&self) -> Vec<ProbeRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, method: HttpMethod, url: &str) -> usize {
        self.calls()
            .iter()
            .filter(|r| r.method == method && r.url.as_str() == url)
            .count()
    }
}

pub fn status(status: u16) -> Reply {
    Ok(RawResponse {
        status,
        ..RawResponse::default()
    })
}

pub fn with_headers(status: u16, headers: &[(&str, &str)]) -> Reply {
    Ok(RawResponse {
        status,
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect(),
        body: Vec::new(),
    })
}

pub fn html(body: &str) -> Reply {
    Ok(RawResponse {
        status: 200,
        headers: [("content-type".to_string(), "text/html".to_string())]
            .into_iter()
            .collect(),
        body: body.as_bytes().to_vec(),
    })
}

pub fn fail(kind: TransportErrorKind) -> Reply {
    Err(TransportFailure::new(kind, kind.to_string()))
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &ProbeRequest) -> Result<RawResponse, TransportFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        self.replies
            .get(&(request.method, request.url.to_string()))
            .or_else(|| self.fallback.get(&request.method))
            .cloned()
            .unwrap_or_else(|| status(404))
    }
}
