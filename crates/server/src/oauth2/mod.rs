//! Mock OAuth2 authorization server.
//!
//! Simulates the Discord OAuth2 authorization-code flow entirely in memory.
//!
//! ## Supported Flows
//!
//! - Authorization Code (single-identity or account-picker mode)
//! - Refresh Token (the refresh token is never rotated)
//!
//! ## Endpoints
//!
//! - `GET /oauth2/authorize` - Authorization endpoint
//! - `POST /api/oauth2/token` - Token endpoint
//! - `GET /api/users/@me` - Current user
//! - `GET /api/users/@me/guilds` - Current user's guilds

pub mod account_picker;
pub mod endpoints;
pub mod identity;
mod state;
pub mod store;

pub use endpoints::router;
pub use identity::{Identity, IdentityId, IdentityMode, IdentityRegistry};
pub use state::OAuth2State;
pub use store::TokenStore;

/// OpenAPI tag for OAuth2 endpoints
pub const OAUTH2_TAG: &str = "OAuth2";
