use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::Url;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPolicy {
    #[default]
    Preserve,
    Strip,
}

/// A normalized absolute http(s) URL. Equality, ordering and hashing all go
/// through the normalized serialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn parse(input: &str, policy: QueryPolicy) -> Result<Self, ConfigError> {
        let url = Url::parse(input.trim()).map_err(|e| ConfigError::InvalidUrl {
            url: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(url, policy)
    }

    pub fn from_url(mut url: Url, policy: QueryPolicy) -> Result<Self, ConfigError> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    url: url.to_string(),
                    scheme: other.to_string(),
                });
            }
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                reason: "missing host".to_string(),
            });
        }

        url.set_fragment(None);
        if policy == QueryPolicy::Strip || url.query() == Some("") {
            url.set_query(None);
        }

        Ok(Self { url })
    }

    /// Resolves `reference` (absolute URL or path) against this endpoint.
    pub fn join(&self, reference: &str, policy: QueryPolicy) -> Result<Self, ConfigError> {
        let joined = self.url.join(reference.trim()).map_err(|e| ConfigError::InvalidUrl {
            url: reference.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(joined, policy)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn is_same_origin(&self, other: &Url) -> bool {
        self.url.origin() == other.origin()
    }

    pub fn display_path(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.url.as_str())
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Endpoint::parse(&raw, QueryPolicy::Preserve).map_err(serde::de::Error::custom)
    }
}
