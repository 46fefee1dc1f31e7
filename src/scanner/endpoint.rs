use crate::error::ConfigError;
use crate::models::{Endpoint, QueryPolicy};

pub struct EndpointParser;

impl EndpointParser {
    /// Parses an explicit endpoint list. Each entry is a path starting with
    /// '/' or an absolute http(s) URL; paths resolve against `base`.
    pub fn parse(
        input: &str,
        base: &Endpoint,
        policy: QueryPolicy,
    ) -> Result<Vec<Endpoint>, ConfigError> {
        let mut endpoints = Vec::new();

        for part in input.split(|c: char| c == ',' || c.is_whitespace()) {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }

            let endpoint = Self::parse_single(trimmed, base, policy)?;
            if !endpoints.contains(&endpoint) {
                endpoints.push(endpoint);
            }
        }

        if endpoints.is_empty() {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: input.to_string(),
                reason: "no endpoints found in list".to_string(),
            });
        }

        Ok(endpoints)
    }

    fn parse_single(
        input: &str,
        base: &Endpoint,
        policy: QueryPolicy,
    ) -> Result<Endpoint, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidEndpoint {
            endpoint: input.to_string(),
            reason,
        };

        if input.starts_with('/') {
            base.join(input, policy).map_err(|e| invalid(e.to_string()))
        } else if input.contains("://") {
            Endpoint::parse(input, policy).map_err(|e| invalid(e.to_string()))
        } else {
            Err(invalid("expected '/path' or an absolute http(s) URL".to_string()))
        }
    }
}
