//! OAuth2 state management.
//!
//! Provides the state shared by the mock provider's handlers.

use crate::config::ProviderConfig;
use crate::oauth2::identity::{IdentityMode, IdentityRegistry};
use crate::oauth2::store::TokenStore;
use std::sync::Arc;

/// Everything the provider endpoints need. Cheap to clone; all clones share one store.
#[derive(Clone)]
pub struct OAuth2State {
    pub store: Arc<TokenStore>,
    pub identities: Arc<IdentityRegistry>,
    pub identity_mode: IdentityMode,
    /// Advertised access token lifetime in seconds
    pub access_token_lifetime: u64,
}

impl OAuth2State {
    pub fn new(identity_mode: IdentityMode) -> Self {
        Self {
            store: Arc::new(TokenStore::new()),
            identities: Arc::new(IdentityRegistry::default()),
            identity_mode,
            access_token_lifetime: 604_800, // 7 days
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            access_token_lifetime: config.access_token_lifetime,
            ..Self::new(config.identity_mode)
        }
    }
}
