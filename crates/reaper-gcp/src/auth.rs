//! Access-token sources.
//!
//! Every Google API call carries a bearer token scoped to
//! `cloud-platform`. By default the token comes from Application Default
//! Credentials: `GOOGLE_APPLICATION_CREDENTIALS` key files, gcloud user
//! credentials, then the GCE / Cloud Run metadata server. A pre-minted
//! token supplied through `GOOGLE_OAUTH_ACCESS_TOKEN` bypasses the chain.

use std::sync::Arc;

use async_trait::async_trait;
use google_cloud_auth::project::Config;
use google_cloud_auth::token::DefaultTokenSourceProvider;
use google_cloud_token::TokenSourceProvider;
use tokio::sync::OnceCell;
use tracing::debug;

use reaper_core::ReaperConfig;

use crate::error::{GcpError, GcpResult};

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const SCOPES: [&str; 1] = [CLOUD_PLATFORM_SCOPE];

/// Produces bearer tokens for Google API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> GcpResult<String>;
}

/// A fixed, externally minted token.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> GcpResult<String> {
        Ok(self.0.clone())
    }
}

/// Application Default Credentials, resolved on first use.
///
/// The underlying source caches tokens and refreshes them before they
/// expire.
#[derive(Default)]
pub struct DefaultCredentials {
    source: OnceCell<Arc<dyn google_cloud_token::TokenSource>>,
}

impl DefaultCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    async fn source(&self) -> GcpResult<&Arc<dyn google_cloud_token::TokenSource>> {
        self.source
            .get_or_try_init(|| async {
                let provider = DefaultTokenSourceProvider::new(Config::default().with_scopes(&SCOPES))
                    .await
                    .map_err(|e| GcpError::Auth(format!("no application default credentials: {e}")))?;
                debug!("resolved application default credentials");
                Ok::<_, GcpError>(provider.token_source())
            })
            .await
    }
}

#[async_trait]
impl TokenSource for DefaultCredentials {
    async fn token(&self) -> GcpResult<String> {
        let header = self
            .source()
            .await?
            .token()
            .await
            .map_err(|e| GcpError::Auth(format!("token refresh failed: {e}")))?;
        Ok(bare_token(&header).to_string())
    }
}

/// Strip the `Bearer ` token type the credential chain prefixes.
fn bare_token(header: &str) -> &str {
    match header.split_once(' ') {
        Some((kind, token)) if kind.eq_ignore_ascii_case("bearer") => token.trim(),
        _ => header.trim(),
    }
}

/// Pick the token source a config asks for.
pub fn token_source(config: &ReaperConfig) -> Arc<dyn TokenSource> {
    match &config.access_token {
        Some(token) => {
            debug!("using access token from environment");
            Arc::new(StaticToken::new(token.clone()))
        }
        None => Arc::new(DefaultCredentials::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_is_returned_verbatim() {
        let source = StaticToken::new("ya29.abc");
        assert_eq!(source.token().await.unwrap(), "ya29.abc");
    }

    #[test]
    fn token_type_prefix_is_stripped() {
        assert_eq!(bare_token("Bearer ya29.abc"), "ya29.abc");
        assert_eq!(bare_token("bearer ya29.abc"), "ya29.abc");
        assert_eq!(bare_token("ya29.abc"), "ya29.abc");
    }

    #[tokio::test]
    async fn configured_token_wins_over_default_credentials() {
        let config = ReaperConfig {
            access_token: Some("ya29.env".to_string()),
            ..ReaperConfig::default()
        };
        assert_eq!(token_source(&config).token().await.unwrap(), "ya29.env");
    }
}
