use serde::Deserialize;
use thiserror::Error;

use crate::oauth2::IdentityMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Settings for the mock authorization/token service.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_bind_address")]
    pub bind_address: String,
    /// `single` binds every code to the default identity, `multi` shows an account picker.
    #[serde(default)]
    pub identity_mode: IdentityMode,
    /// Advertised `expires_in` of access tokens, in seconds. Not enforced.
    #[serde(default = "default_access_token_lifetime")]
    pub access_token_lifetime: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            bind_address: default_provider_bind_address(),
            identity_mode: IdentityMode::default(),
            access_token_lifetime: default_access_token_lifetime(),
        }
    }
}

/// Settings for the relying client that drives the flow against the provider.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_client_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_client_secret")]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_user_url")]
    pub user_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Launch the system browser on `/login`. Disable on headless machines.
    #[serde(default = "default_true")]
    pub open_browser: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            bind_address: default_client_bind_address(),
            client_id: default_client_id(),
            client_secret: default_client_secret(),
            redirect_uri: default_redirect_uri(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            user_url: default_user_url(),
            scope: default_scope(),
            open_browser: true,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.access_token_lifetime == 0 {
            return Err(ConfigError::Validation(
                "provider.access_token_lifetime must be > 0".into(),
            ));
        }

        for (key, value) in [
            ("client.redirect_uri", &self.client.redirect_uri),
            ("client.authorize_url", &self.client.authorize_url),
            ("client.token_url", &self.client.token_url),
            ("client.user_url", &self.client.user_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| ConfigError::Validation(format!("{key} is not a valid URL: {e}")))?;
        }

        if self.client.client_id.is_empty() {
            return Err(ConfigError::Validation(
                "client.client_id must not be empty".into(),
            ));
        }

        Ok(())
    }
}

fn default_provider_bind_address() -> String {
    "0.0.0.0:8081".into()
}

fn default_access_token_lifetime() -> u64 {
    604_800
}

fn default_client_bind_address() -> String {
    "0.0.0.0:3333".into()
}

fn default_client_id() -> String {
    "11111".into()
}

fn default_client_secret() -> String {
    "1111111".into()
}

fn default_redirect_uri() -> String {
    "http://localhost:3333/callback".into()
}

fn default_authorize_url() -> String {
    "http://localhost:8081/oauth2/authorize".into()
}

fn default_token_url() -> String {
    "http://localhost:8081/api/oauth2/token".into()
}

fn default_user_url() -> String {
    "http://localhost:8081/api/users/@me".into()
}

fn default_scope() -> String {
    "identify email".into()
}

fn default_true() -> bool {
    true
}

/// Load application configuration from an optional `config.yaml` + environment overrides.
///
/// Environment variables use the key path separated by double underscores, e.g.
/// `PROVIDER__IDENTITY_MODE=multi` or `CLIENT__OPEN_BROWSER=false`. Every key has a
/// default, so running without a file is fine.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml").required(false))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;

    Ok(app)
}

/// Convenience helper for binaries wanting panic-on-error behaviour.
pub fn load_config_or_panic() -> AppConfig {
    match load_config() {
        Ok(c) => c,
        Err(e) => panic!("Failed to load configuration: {e}"),
    }
}
