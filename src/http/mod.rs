mod client;
mod transport;

#[cfg(test)]
pub(crate) mod scripted;

pub use client::{DEFAULT_BODY_CAP, HttpClient};
pub use transport::{HttpTransport, ProbeRequest, RawResponse};
