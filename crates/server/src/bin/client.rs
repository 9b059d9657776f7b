use discord_oauth2_mock::client::{ClientState, start_client};
use discord_oauth2_mock::config::load_config_or_panic;
use discord_oauth2_mock::init_tracing;

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    init_tracing();

    let config = load_config_or_panic();
    let bind_address = config.client.bind_address.clone();
    tracing::info!(
        client_id = %config.client.client_id,
        authorize_url = %config.client.authorize_url,
        open_browser = config.client.open_browser,
        "client configuration"
    );

    start_client(ClientState::new(config.client), &bind_address).await?;
    Ok(())
}
