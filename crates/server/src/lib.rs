//! A local mock of the Discord OAuth2 authorization-code flow.
//!
//! The mock provider issues single-use authorization codes, exchanges them for
//! access/refresh token pairs and serves `/api/users/@me` behind bearer tokens, all
//! from in-memory state. The relying client drives that flow from the other side.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod oauth2;

/// Installs the `tracing` subscriber used by both binaries.
///
/// `RUST_LOG` overrides the default directives.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default_directives = "discord_oauth2_mock=info,tower_http=info,hyper=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_level(true))
        .init();
}
