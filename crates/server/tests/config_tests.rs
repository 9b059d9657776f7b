use config::Config;
use discord_oauth2_mock::config::{AppConfig, ClientConfig, ConfigError, ProviderConfig};
use discord_oauth2_mock::oauth2::{IdentityMode, OAuth2State};

fn from_yaml(yaml_content: &str) -> Config {
    Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config")
}

#[test]
fn test_provider_config_deserialization() {
    let yaml_content = r#"
bind_address: "127.0.0.1:9000"
identity_mode: "multi"
access_token_lifetime: 3600
"#;

    let provider: ProviderConfig = from_yaml(yaml_content)
        .try_deserialize()
        .expect("Failed to deserialize provider config");
    assert_eq!(provider.bind_address, "127.0.0.1:9000");
    assert_eq!(provider.identity_mode, IdentityMode::Multi);
    assert_eq!(provider.access_token_lifetime, 3600);
}

#[test]
fn test_client_config_deserialization() {
    let yaml_content = r#"
client_id: "42"
client_secret: "hunter2"
redirect_uri: "http://localhost:4000/callback"
authorize_url: "http://mock.test/oauth2/authorize"
token_url: "http://mock.test/api/oauth2/token"
user_url: "http://mock.test/api/users/@me"
scope: "identify"
open_browser: false
"#;

    let client: ClientConfig = from_yaml(yaml_content)
        .try_deserialize()
        .expect("Failed to deserialize client config");
    assert_eq!(client.client_id, "42");
    assert_eq!(client.client_secret, "hunter2");
    assert_eq!(client.redirect_uri, "http://localhost:4000/callback");
    assert_eq!(client.token_url, "http://mock.test/api/oauth2/token");
    assert_eq!(client.scope, "identify");
    assert!(!client.open_browser);
    // Unset keys keep their defaults.
    assert_eq!(client.bind_address, "0.0.0.0:3333");
}

#[test]
fn test_app_config_partial_sections_use_defaults() {
    let yaml_content = r#"
provider:
  identity_mode: "multi"
"#;

    let app_config: AppConfig = from_yaml(yaml_content)
        .try_deserialize()
        .expect("Failed to deserialize app config");
    assert_eq!(app_config.provider.identity_mode, IdentityMode::Multi);
    assert_eq!(app_config.provider.bind_address, "0.0.0.0:8081");
    assert_eq!(app_config.provider.access_token_lifetime, 604_800);
    assert_eq!(app_config.client.client_id, "11111");
    assert_eq!(
        app_config.client.redirect_uri,
        "http://localhost:3333/callback"
    );
    assert!(app_config.validate().is_ok());
}

#[test]
fn test_empty_config_is_all_defaults() {
    let app_config: AppConfig = Config::builder()
        .build()
        .expect("Failed to build config")
        .try_deserialize()
        .expect("Failed to deserialize empty config");
    assert_eq!(app_config.provider.identity_mode, IdentityMode::Single);
    assert!(app_config.client.open_browser);
    assert!(app_config.validate().is_ok());
}

#[test]
fn test_override_wins_over_file() {
    let yaml_content = r#"
provider:
  identity_mode: "single"
"#;

    let app_config: AppConfig = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .set_override("provider.identity_mode", "multi")
        .expect("Failed to set override")
        .build()
        .expect("Failed to build config")
        .try_deserialize()
        .expect("Failed to deserialize app config");
    assert_eq!(app_config.provider.identity_mode, IdentityMode::Multi);
}

#[test]
fn test_unknown_identity_mode_is_rejected() {
    let yaml_content = r#"
identity_mode: "everyone"
"#;

    let result: Result<ProviderConfig, _> = from_yaml(yaml_content).try_deserialize();
    assert!(result.is_err());
}

#[test]
fn test_validation_rejects_bad_urls() {
    let yaml_content = r#"
client:
  authorize_url: "not a url"
"#;

    let app_config: AppConfig = from_yaml(yaml_content)
        .try_deserialize()
        .expect("Failed to deserialize app config");
    let err = app_config.validate().expect_err("invalid URL must be rejected");
    assert!(matches!(err, ConfigError::Validation(_)));
    assert!(err.to_string().contains("client.authorize_url"));
}

#[test]
fn test_validation_rejects_empty_client_id() {
    let mut app_config = AppConfig::default();
    app_config.client.client_id = String::new();
    assert!(matches!(
        app_config.validate(),
        Err(ConfigError::Validation(msg)) if msg.contains("client_id")
    ));
}

#[test]
fn test_provider_state_from_config() {
    let provider = ProviderConfig {
        identity_mode: IdentityMode::Multi,
        access_token_lifetime: 60,
        ..ProviderConfig::default()
    };

    let state = OAuth2State::from_config(&provider);
    assert_eq!(state.identity_mode, IdentityMode::Multi);
    assert_eq!(state.access_token_lifetime, 60);
    assert_eq!(state.store.pending_codes(), 0);
}
