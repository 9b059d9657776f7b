use goose::prelude::*;
use serde_json::Value;
use std::env;

/// Per-user state carried between the transactions of one login flow.
#[derive(Debug, Default)]
struct FlowSession {
    code: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
}

fn client_id() -> String {
    env::var("CLIENT_ID").unwrap_or_else(|_| "11111".to_string())
}

async fn start_session(user: &mut GooseUser) -> TransactionResult {
    user.set_session_data(FlowSession::default());
    Ok(())
}

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

/// Redirects back to `/healthz` so the followed redirect lands on the provider itself
/// and the final URL carries the code.
async fn authorize(user: &mut GooseUser) -> TransactionResult {
    let path = format!(
        "/oauth2/authorize?client_id={}&redirect_uri=%2Fhealthz&response_type=code&scope=identify%20email",
        client_id()
    );
    let mut goose = user.get(&path).await?;

    let code = match &goose.response {
        Ok(response) => response
            .url()
            .query_pairs()
            .find(|(key, _)| key == "code")
            .map(|(_, value)| value.into_owned()),
        Err(_) => None,
    };

    match code {
        Some(code) => {
            if let Some(session) = user.get_session_data_mut::<FlowSession>() {
                session.code = Some(code);
            }
            Ok(())
        }
        None => user.set_failure("authorize returned no code", &mut goose.request, None, None),
    }
}

async fn exchange_code(user: &mut GooseUser) -> TransactionResult {
    let Some(code) = user
        .get_session_data_mut::<FlowSession>()
        .and_then(|session| session.code.take())
    else {
        return Ok(());
    };

    let params = [
        ("client_id", client_id()),
        ("client_secret", "1111111".to_string()),
        ("grant_type", "authorization_code".to_string()),
        ("code", code),
    ];
    let mut goose = user.post_form("/api/oauth2/token", &params).await?;

    let body = match goose.response {
        Ok(response) => response.text().await.ok(),
        Err(_) => None,
    };
    let tokens = body.and_then(|b| serde_json::from_str::<Value>(&b).ok());

    match tokens {
        Some(tokens) if tokens["access_token"].is_string() => {
            let Some(session) = user.get_session_data_mut::<FlowSession>() else {
                return Ok(());
            };
            session.access_token = tokens["access_token"].as_str().map(str::to_string);
            session.refresh_token = tokens["refresh_token"].as_str().map(str::to_string);
            Ok(())
        }
        _ => user.set_failure("token exchange failed", &mut goose.request, None, None),
    }
}

async fn current_user(user: &mut GooseUser) -> TransactionResult {
    let Some(access_token) = user
        .get_session_data::<FlowSession>()
        .and_then(|session| session.access_token.clone())
    else {
        return Ok(());
    };

    let request_builder = user
        .get_request_builder(&GooseMethod::Get, "/api/users/@me")?
        .bearer_auth(access_token);
    let goose_request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .build();
    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

async fn refresh(user: &mut GooseUser) -> TransactionResult {
    let Some(refresh_token) = user
        .get_session_data::<FlowSession>()
        .and_then(|session| session.refresh_token.clone())
    else {
        return Ok(());
    };

    let params = [
        ("grant_type", "refresh_token".to_string()),
        ("refresh_token", refresh_token),
    ];
    let _goose_metrics = user.post_form("/api/oauth2/token", &params).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    println!("Client id for authorize calls: {}", client_id());

    GooseAttack::initialize()?
        .register_scenario(
            scenario!("HealthCheck").register_transaction(transaction!(health_check)),
        )
        .register_scenario(
            scenario!("LoginFlow")
                .register_transaction(transaction!(start_session).set_on_start())
                .register_transaction(transaction!(authorize))
                .register_transaction(transaction!(exchange_code))
                .register_transaction(transaction!(current_user))
                .register_transaction(transaction!(refresh)),
        )
        .execute()
        .await?;

    Ok(())
}
