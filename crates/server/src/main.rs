use discord_oauth2_mock::api::start_webserver;
use discord_oauth2_mock::config::load_config_or_panic;
use discord_oauth2_mock::init_tracing;
use discord_oauth2_mock::oauth2::OAuth2State;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    init_tracing();

    let config = load_config_or_panic();
    tracing::info!(
        identity_mode = ?config.provider.identity_mode,
        access_token_lifetime = config.provider.access_token_lifetime,
        "provider configuration"
    );

    let state = OAuth2State::from_config(&config.provider);
    start_webserver(state, &config.provider.bind_address).await?;
    Ok(())
}
