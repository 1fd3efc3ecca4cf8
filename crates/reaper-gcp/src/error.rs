//! Error types for Google API calls.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for collaborator calls.
pub type GcpResult<T> = Result<T, GcpError>;

#[derive(Debug, Error)]
pub enum GcpError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("operation {name} failed: {message}")]
    Operation { name: String, message: String },

    #[error("operation {name} not done after {waited:?}")]
    Timeout { name: String, waited: Duration },
}

impl GcpError {
    /// Whether the failure means the credentials themselves are unusable.
    ///
    /// These abort a sweep; everything else is scoped to one call.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Status { status: 401, .. })
    }

    pub(crate) fn decode(url: &str, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_classification() {
        assert!(GcpError::Auth("no token".to_string()).is_auth());
        assert!(
            GcpError::Status {
                url: "u".to_string(),
                status: 401,
                body: String::new()
            }
            .is_auth()
        );
        // Permission denied on one project is scoped to that project.
        assert!(
            !GcpError::Status {
                url: "u".to_string(),
                status: 403,
                body: String::new()
            }
            .is_auth()
        );
        assert!(!GcpError::decode("u", "bad json").is_auth());
    }
}
