//! OAuth access token state held by an OAuth-capable module.

use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Deserialize;

/// Static OAuth endpoints for a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OAuthConfig {
    pub authorization_url: String,
    pub access_token_url: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub callback_path: Option<String>,
}

#[derive(Debug)]
struct Token {
    value: String,
    expires_at: Option<Instant>,
}

/// The current access token, if any.
#[derive(Debug, Default)]
pub struct OAuthState {
    config: OAuthConfig,
    token: RwLock<Option<Token>>,
}

impl OAuthState {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            token: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Store a token; `expires_in` of `None` never expires.
    pub fn set_access_token(&self, token: impl Into<String>, expires_in: Option<Duration>) {
        *self.token.write() = Some(Token {
            value: token.into(),
            expires_at: expires_in.map(|d| Instant::now() + d),
        });
    }

    /// The token, unless none is set or it has expired.
    pub fn access_token(&self) -> Option<String> {
        let token = self.token.read();
        token
            .as_ref()
            .filter(|t| t.expires_at.is_none_or(|at| Instant::now() < at))
            .map(|t| t.value.clone())
    }

    pub fn is_authorized(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn clear(&self) {
        self.token.write().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lifecycle() {
        let state = OAuthState::new(OAuthConfig::default());
        assert!(!state.is_authorized());

        state.set_access_token("abc", None);
        assert_eq!(state.access_token().as_deref(), Some("abc"));

        state.clear();
        assert_eq!(state.access_token(), None);
    }

    #[test]
    fn test_expired_token_is_hidden() {
        let state = OAuthState::default();
        state.set_access_token("abc", Some(Duration::ZERO));
        assert!(!state.is_authorized());
    }
}
