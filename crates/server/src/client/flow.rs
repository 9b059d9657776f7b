//! Outbound half of the relying client: building the authorize URL, exchanging the
//! code and fetching the user.

use crate::config::ClientConfig;
use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use url::Url;

const USER_AGENT: &str = concat!("discord-oauth2-mock-client/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct CodeExchange<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    code: &'a str,
    redirect_uri: &'a str,
}

/// Token endpoint response as seen by the client.
#[derive(Debug, Deserialize)]
pub struct GrantedTokens {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

pub fn authorize_url(config: &ClientConfig) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &config.authorize_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", config.scope.as_str()),
        ],
    )
}

#[tracing::instrument(skip(http, config))]
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &ClientConfig,
    code: &str,
) -> Result<GrantedTokens, ClientError> {
    let tokens = http
        .post(&config.token_url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .json(&CodeExchange {
            client_id: &config.client_id,
            client_secret: &config.client_secret,
            grant_type: "authorization_code",
            code,
            redirect_uri: &config.redirect_uri,
        })
        .send()
        .await?
        .error_for_status()?
        .json::<GrantedTokens>()
        .await?;

    tracing::debug!(token_type = %tokens.token_type, scope = ?tokens.scope, "code exchanged");
    Ok(tokens)
}

/// Fetches the user profile. The body is kept as raw JSON so ids stay strings.
#[tracing::instrument(skip(http, config, access_token))]
pub async fn fetch_user(
    http: &reqwest::Client,
    config: &ClientConfig,
    access_token: &str,
) -> Result<serde_json::Value, ClientError> {
    let user = http
        .get(&config.user_url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?
        .json::<serde_json::Value>()
        .await?;
    Ok(user)
}

/// Exchange the callback's code and look up who logged in.
pub async fn complete_login(
    http: &reqwest::Client,
    config: &ClientConfig,
    code: Option<&str>,
) -> Result<serde_json::Value, ClientError> {
    let code = code
        .filter(|c| !c.is_empty())
        .ok_or(ClientError::MissingCode)?;
    let tokens = exchange_code(http, config, code).await?;
    fetch_user(http, config, &tokens.access_token).await
}
