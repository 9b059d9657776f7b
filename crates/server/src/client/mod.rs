//! Relying client for the mock provider.
//!
//! - `GET /login` opens the provider's authorize page
//! - `GET /callback` exchanges the code and returns the logged-in user

mod browser;
mod flow;

pub use browser::{BrowserLauncher, LogOnly, SystemBrowser};
pub use flow::{GrantedTokens, authorize_url, complete_login, exchange_code, fetch_user};

use crate::config::ClientConfig;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct ClientState {
    pub http: reqwest::Client,
    pub config: Arc<ClientConfig>,
    pub browser: Arc<dyn BrowserLauncher>,
}

impl ClientState {
    pub fn new(config: ClientConfig) -> Self {
        let browser: Arc<dyn BrowserLauncher> = if config.open_browser {
            Arc::new(SystemBrowser)
        } else {
            Arc::new(LogOnly)
        };
        Self {
            http: reqwest::Client::new(),
            config: Arc::new(config),
            browser,
        }
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginSuccess {
    pub message: &'static str,
    pub user: serde_json::Value,
}

pub fn router(state: ClientState) -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tracing::instrument(skip(state))]
async fn login(State(state): State<ClientState>) -> Response {
    let url = match authorize_url(&state.config) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!("Invalid authorize URL: {}", e);
            return authorization_failed();
        }
    };

    if let Err(e) = state.browser.open(url.as_str()) {
        tracing::warn!(error = %e, url = %url, "could not open a browser, visit the URL manually");
    }

    tracing::info!(url = %url, "opened authorization window");
    "Authorization window opened".into_response()
}

#[tracing::instrument(skip(state))]
async fn callback(State(state): State<ClientState>, Query(query): Query<CallbackQuery>) -> Response {
    tracing::debug!(
        code_present = query.code.is_some(),
        state = ?query.state,
        "callback received"
    );
    match complete_login(&state.http, &state.config, query.code.as_deref()).await {
        Ok(user) => {
            tracing::info!(user_id = ?user.get("id"), "authorization successful");
            Json(LoginSuccess {
                message: "Authorization successful",
                user,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "authorization failed");
            authorization_failed()
        }
    }
}

fn authorization_failed() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Authorization failed").into_response()
}

/// Serves the client on `bind_address` until the process exits.
pub async fn start_client(state: ClientState, bind_address: &str) -> color_eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!(addr = %bind_address, "OAuth2 client listening, visit /login to start");
    axum::serve(listener, router(state))
        .await
        .map_err(|e| color_eyre::Report::msg(format!("Failed to start client: {e}")))?;
    Ok(())
}
