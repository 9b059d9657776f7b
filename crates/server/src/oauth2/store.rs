//! In-memory authorization state: codes, access tokens and refresh tokens.
//!
//! Each mapping is a [`DashMap`], so every access is serialized per shard. Codes are
//! consumed with `remove`, which hands the record to exactly one caller even when the
//! same code is exchanged concurrently.

use crate::error::OAuth2Error;
use crate::oauth2::identity::IdentityId;
use dashmap::DashMap;

/// Record behind an authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub identity_id: IdentityId,
}

/// Record behind an access or refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub identity_id: IdentityId,
    pub scope: String,
}

/// Result of a successful code exchange or refresh.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub grant: TokenGrant,
}

#[derive(Debug, Default)]
pub struct TokenStore {
    codes: DashMap<String, AuthorizationCode>,
    access_tokens: DashMap<String, TokenGrant>,
    refresh_tokens: DashMap<String, TokenGrant>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opaque random identifier used for codes and tokens.
    pub fn generate_token() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Stores a new authorization code and returns its value.
    pub fn issue_code(&self, record: AuthorizationCode) -> String {
        let code = Self::generate_token();
        tracing::debug!(
            code = %code,
            client_id = %record.client_id,
            identity_id = %record.identity_id,
            "issued authorization code"
        );
        self.codes.insert(code.clone(), record);
        code
    }

    /// Consumes an authorization code and mints an access/refresh token pair for it.
    pub fn exchange_code(&self, code: &str) -> Result<IssuedTokens, OAuth2Error> {
        let Some((_, record)) = self.codes.remove(code) else {
            tracing::debug!(code, "invalid or already used authorization code");
            return Err(OAuth2Error::InvalidAuthorizationCode);
        };

        let grant = TokenGrant {
            identity_id: record.identity_id,
            scope: record.scope,
        };
        let access_token = Self::generate_token();
        let refresh_token = Self::generate_token();

        self.access_tokens
            .insert(access_token.clone(), grant.clone());
        self.refresh_tokens
            .insert(refresh_token.clone(), grant.clone());

        tracing::debug!(
            access_token = %access_token,
            refresh_token = %refresh_token,
            identity_id = %grant.identity_id,
            "issued token pair"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token,
            grant,
        })
    }

    /// Mints a new access token from a refresh token. The refresh token is not rotated.
    pub fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, OAuth2Error> {
        let grant = match self.refresh_tokens.get(refresh_token) {
            Some(entry) => entry.value().clone(),
            None => {
                tracing::debug!(refresh_token, "invalid refresh token");
                return Err(OAuth2Error::InvalidRefreshToken);
            }
        };

        let access_token = Self::generate_token();
        self.access_tokens
            .insert(access_token.clone(), grant.clone());

        tracing::debug!(
            access_token = %access_token,
            identity_id = %grant.identity_id,
            "refreshed access token"
        );

        Ok(IssuedTokens {
            access_token,
            refresh_token: refresh_token.to_string(),
            grant,
        })
    }

    pub fn resolve_access_token(&self, access_token: &str) -> Option<TokenGrant> {
        self.access_tokens
            .get(access_token)
            .map(|entry| entry.value().clone())
    }

    pub fn resolve_refresh_token(&self, refresh_token: &str) -> Option<TokenGrant> {
        self.refresh_tokens
            .get(refresh_token)
            .map(|entry| entry.value().clone())
    }

    /// Looks at a pending code without consuming it.
    pub fn peek_code(&self, code: &str) -> Option<AuthorizationCode> {
        self.codes.get(code).map(|entry| entry.value().clone())
    }

    pub fn pending_codes(&self) -> usize {
        self.codes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(identity: &str) -> AuthorizationCode {
        AuthorizationCode {
            client_id: "11111".into(),
            redirect_uri: "http://localhost:3333/callback".into(),
            scope: "identify email".into(),
            identity_id: identity.parse().unwrap(),
        }
    }

    #[test]
    fn code_is_single_use() {
        let store = TokenStore::new();
        let code = store.issue_code(record("999999999"));
        assert_eq!(store.pending_codes(), 1);

        let issued = store.exchange_code(&code).unwrap();
        assert_eq!(issued.grant.identity_id.as_str(), "999999999");
        assert_eq!(issued.grant.scope, "identify email");
        assert_eq!(store.pending_codes(), 0);

        assert_eq!(
            store.exchange_code(&code).unwrap_err(),
            OAuth2Error::InvalidAuthorizationCode
        );
    }

    #[test]
    fn exchanged_tokens_resolve_to_code_identity() {
        let store = TokenStore::new();
        let code = store.issue_code(record("80351110224678912"));
        let issued = store.exchange_code(&code).unwrap();

        let access = store.resolve_access_token(&issued.access_token).unwrap();
        let refresh = store.resolve_refresh_token(&issued.refresh_token).unwrap();
        assert_eq!(access, refresh);
        assert_eq!(access.identity_id.as_str(), "80351110224678912");
        assert_ne!(issued.access_token, issued.refresh_token);
    }

    #[test]
    fn refresh_keeps_refresh_token_and_mints_new_access_token() {
        let store = TokenStore::new();
        let code = store.issue_code(record("999999999"));
        let first = store.exchange_code(&code).unwrap();

        let second = store.refresh(&first.refresh_token).unwrap();
        assert_eq!(second.refresh_token, first.refresh_token);
        assert_ne!(second.access_token, first.access_token);
        assert_eq!(second.grant, first.grant);

        // Both access tokens stay valid.
        assert!(store.resolve_access_token(&first.access_token).is_some());
        assert!(store.resolve_access_token(&second.access_token).is_some());

        let third = store.refresh(&first.refresh_token).unwrap();
        assert_eq!(third.refresh_token, first.refresh_token);
    }

    #[test]
    fn unknown_refresh_token_is_rejected() {
        let store = TokenStore::new();
        assert_eq!(
            store.refresh("nope").unwrap_err(),
            OAuth2Error::InvalidRefreshToken
        );
    }

    #[test]
    fn tokens_are_not_interchangeable() {
        let store = TokenStore::new();
        let code = store.issue_code(record("999999999"));
        let issued = store.exchange_code(&code).unwrap();

        assert!(store.resolve_access_token(&issued.refresh_token).is_none());
        assert!(store.refresh(&issued.access_token).is_err());
        assert!(store.resolve_access_token(&code).is_none());
    }

    #[test]
    fn concurrent_exchanges_of_one_code_succeed_once() {
        let store = Arc::new(TokenStore::new());
        let code = store.issue_code(record("999999999"));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                let code = code.clone();
                std::thread::spawn(move || store.exchange_code(&code).is_ok())
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
    }
}
