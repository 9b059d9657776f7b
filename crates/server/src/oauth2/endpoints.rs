//! OAuth2 HTTP endpoints.
//!
//! Implements the Discord-shaped surface of the mock provider:
//! - Authorization endpoint
//! - Token endpoint (authorization code and refresh token grants)
//! - Current user and current user guilds

use crate::error::{ErrorResponse, OAuth2Error};
use crate::oauth2::account_picker::{PickerParams, account_picker_page};
use crate::oauth2::identity::{IdentityId, IdentityMode};
use crate::oauth2::store::{AuthorizationCode, IssuedTokens, TokenGrant};
use crate::oauth2::{OAUTH2_TAG, state::OAuth2State};
use axum::{
    Form, Json,
    extract::{FromRequest, Query, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Creates the OAuth2 router.
pub fn router(state: OAuth2State) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(authorize))
        .routes(routes!(token))
        .routes(routes!(current_user))
        .routes(routes!(current_user_guilds))
        .with_state(state)
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// OAuth2 authorization request parameters.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizeRequest {
    /// Client identifier. Recorded on the code, never validated.
    pub client_id: Option<String>,
    /// Where to send the user back to with the code
    pub redirect_uri: Option<String>,
    /// Must be "code"
    pub response_type: Option<String>,
    /// Space-separated scopes, passed through unmodified
    pub scope: Option<String>,
    /// Opaque value echoed back in the redirect
    pub state: Option<String>,
    /// Identity key chosen on the account picker (multi-identity mode only)
    pub selected_user: Option<String>,
}

/// Token request body. Scalar values of any JSON type are read as strings, so a numeric
/// `client_id` does not reject an otherwise valid exchange.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TokenRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub grant_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub refresh_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub redirect_uri: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub client_secret: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(scalar @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => {
            Some(scalar.to_string())
        }
        _ => None,
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub scope: String,
}

impl TokenResponse {
    fn bearer(issued: IssuedTokens, expires_in: u64) -> Self {
        Self {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token: issued.refresh_token,
            scope: issued.grant.scope,
        }
    }
}

/// Profile returned by `/api/users/@me`. Only `id` depends on the token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: IdentityId,
    pub username: String,
    pub discriminator: String,
    pub avatar: String,
    pub email: String,
    pub verified: bool,
    pub locale: String,
    pub mfa_enabled: bool,
    pub flags: u64,
    pub banner: Option<String>,
    pub accent_color: Option<u32>,
    pub premium_type: u8,
    pub public_flags: u64,
}

impl UserProfile {
    pub fn canned(id: IdentityId) -> Self {
        Self {
            id,
            username: "MockedUser".to_string(),
            discriminator: "0420".to_string(),
            avatar: "mocked_avatar.png".to_string(),
            email: "mock@localhost".to_string(),
            verified: true,
            locale: "en-US".to_string(),
            mfa_enabled: false,
            flags: 0,
            banner: None,
            accent_color: None,
            premium_type: 1,
            public_flags: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Guild {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub owner: bool,
    pub permissions: String,
    pub features: Vec<String>,
}

impl Guild {
    pub fn mock() -> Self {
        Self {
            id: "1234567890".to_string(),
            name: "Mock Guild".to_string(),
            icon: None,
            owner: true,
            permissions: "2147483647".to_string(),
            features: Vec::new(),
        }
    }
}

/// Token request body, accepted either form-encoded or as JSON.
pub struct TokenParams(pub TokenRequest);

impl<S: Send + Sync> FromRequest<S> for TokenParams {
    type Rejection = OAuth2Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Some(content_type) = req.headers().get(header::CONTENT_TYPE) else {
            // No declared body format, so no parameters.
            return Ok(Self(TokenRequest::default()));
        };
        let is_json = content_type
            .to_str()
            .is_ok_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(params) = Json::<TokenRequest>::from_request(req, state)
                .await
                .map_err(|e| OAuth2Error::MalformedTokenRequest(e.body_text()))?;
            Ok(Self(params))
        } else {
            let Form(params) = Form::<TokenRequest>::from_request(req, state)
                .await
                .map_err(|e| OAuth2Error::MalformedTokenRequest(e.body_text()))?;
            Ok(Self(params))
        }
    }
}

// =============================================================================
// Endpoints
// =============================================================================

/// OAuth2 Authorization endpoint.
///
/// In single-identity mode the code is minted immediately. In multi-identity mode the
/// first request renders the account picker and the picker's submission mints the code.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/oauth2/authorize",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Authorize",
    summary = "Issue an authorization code",
    description = "Issues a single-use authorization code bound to a test identity and redirects back \
                   to `redirect_uri` with `code` (and `state`, when given) appended to the query.\n\n\
                   When the provider runs in multi-identity mode and no `selected_user` is present, \
                   an HTML account picker is returned instead. Submitting it calls this endpoint again \
                   with the same parameters plus `selected_user`. Unknown keys bind the sentinel identity `0`.",
    params(AuthorizeRequest),
    responses(
        (status = 302, description = "Redirect back to the client with an authorization code"),
        (status = 200, description = "Account picker HTML (multi-identity mode)", body = String, content_type = "text/html"),
        (status = 400, description = "response_type is not `code` or redirect_uri is missing", body = str, content_type = "text/plain"),
    )
)]
pub async fn authorize(
    State(state): State<OAuth2State>,
    Query(params): Query<AuthorizeRequest>,
) -> Result<Response, OAuth2Error> {
    if params.response_type.as_deref() != Some("code") {
        tracing::debug!(response_type = ?params.response_type, "invalid response_type");
        return Err(OAuth2Error::UnsupportedResponseType);
    }

    let redirect_uri = params
        .redirect_uri
        .as_deref()
        .filter(|uri| !uri.is_empty())
        .ok_or(OAuth2Error::MissingRedirectUri)?;
    if HeaderValue::from_str(redirect_uri).is_err() {
        return Err(OAuth2Error::InvalidRedirectUri);
    }
    // An empty state is treated as absent and not echoed.
    let oauth_state = params.state.as_deref().filter(|s| !s.is_empty());

    let identity_id = match (state.identity_mode, params.selected_user.as_deref()) {
        (IdentityMode::Single, _) => state.identities.default_identity(),
        (IdentityMode::Multi, Some(key)) => state.identities.resolve(key),
        (IdentityMode::Multi, None) => {
            tracing::debug!("no identity selected yet, rendering account picker");
            return Ok(account_picker_page(
                PickerParams {
                    client_id: params.client_id.as_deref().unwrap_or_default(),
                    redirect_uri,
                    response_type: "code",
                    scope: params.scope.as_deref(),
                    state: oauth_state,
                },
                state.identities.identities(),
            ));
        }
    };

    let code = state.store.issue_code(AuthorizationCode {
        client_id: params.client_id.clone().unwrap_or_default(),
        redirect_uri: redirect_uri.to_string(),
        scope: params.scope.clone().unwrap_or_default(),
        identity_id,
    });

    let location = redirect_with_code(redirect_uri, &code, oauth_state);
    tracing::debug!(location = %location, "redirecting back to client");
    found(location)
}

/// OAuth2 Token endpoint.
#[tracing::instrument(skip(state, params))]
#[utoipa::path(
    post,
    path = "/api/oauth2/token",
    tag = OAUTH2_TAG,
    operation_id = "OAuth2 Token",
    summary = "Exchange an authorization code or refresh token for an access token",
    description = "**Supported grant types:**\n\
                   - `authorization_code`: consumes the code and issues an access and a refresh token\n\
                   - `refresh_token`: issues a new access token; the refresh token is returned unchanged\n\n\
                   Client credentials and `redirect_uri` are accepted but not checked. \
                   The body may be form-encoded or JSON.",
    request_body(
        content = TokenRequest,
        content_type = "application/x-www-form-urlencoded",
        description = "Token request parameters"
    ),
    responses(
        (status = 200, description = "Tokens issued successfully", body = TokenResponse),
        (status = 400, description = "invalid_grant, unsupported_grant_type or invalid_request", body = ErrorResponse),
    )
)]
pub async fn token(
    State(state): State<OAuth2State>,
    TokenParams(params): TokenParams,
) -> Result<Json<TokenResponse>, OAuth2Error> {
    tracing::debug!(
        grant_type = ?params.grant_type,
        client_id = ?params.client_id,
        redirect_uri = ?params.redirect_uri,
        client_secret_present = params.client_secret.is_some(),
        "token request"
    );

    let issued = match params.grant_type.as_deref() {
        Some("authorization_code") => state
            .store
            .exchange_code(params.code.as_deref().unwrap_or_default()),
        Some("refresh_token") => state
            .store
            .refresh(params.refresh_token.as_deref().unwrap_or_default()),
        other => {
            tracing::debug!(grant_type = ?other, "unsupported grant_type");
            Err(OAuth2Error::UnsupportedGrantType)
        }
    }
    .inspect_err(|e| tracing::info!(error = %e, "token request rejected"))?;

    tracing::info!(
        identity_id = %issued.grant.identity_id,
        scope = %issued.grant.scope,
        "issued access token"
    );

    Ok(Json(TokenResponse::bearer(
        issued,
        state.access_token_lifetime,
    )))
}

/// Current user profile.
#[tracing::instrument(skip(state, headers))]
#[utoipa::path(
    get,
    path = "/api/users/@me",
    tag = OAUTH2_TAG,
    operation_id = "Get Current User",
    summary = "Get the profile bound to the access token",
    description = "Returns a canned Discord user whose `id` is the identity the access token was issued for, \
                   rendered as a decimal string.",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Missing Authorization header or unknown token", body = ErrorResponse),
    )
)]
pub async fn current_user(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, OAuth2Error> {
    let grant = bearer_grant(&state, &headers)?;
    tracing::debug!(identity_id = %grant.identity_id, "returning user info");
    Ok(Json(UserProfile::canned(grant.identity_id)))
}

/// Guilds of the current user.
#[tracing::instrument(skip(state, headers))]
#[utoipa::path(
    get,
    path = "/api/users/@me/guilds",
    tag = OAUTH2_TAG,
    operation_id = "Get Current User Guilds",
    summary = "List the guilds of the token's user",
    description = "Returns one fixed mock guild for every valid access token.",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Guild list", body = [Guild]),
        (status = 401, description = "Missing Authorization header or unknown token", body = ErrorResponse),
    )
)]
pub async fn current_user_guilds(
    State(state): State<OAuth2State>,
    headers: HeaderMap,
) -> Result<Json<Vec<Guild>>, OAuth2Error> {
    let grant = bearer_grant(&state, &headers)?;
    tracing::debug!(identity_id = %grant.identity_id, "returning guilds");
    Ok(Json(vec![Guild::mock()]))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Resolves the access token in the `Authorization` header.
///
/// The token is the second whitespace-separated word of the header, so the scheme name
/// itself is not checked.
fn bearer_grant(state: &OAuth2State, headers: &HeaderMap) -> Result<TokenGrant, OAuth2Error> {
    let Some(auth) = headers.get(header::AUTHORIZATION) else {
        tracing::debug!("missing Authorization header");
        return Err(OAuth2Error::MissingAuthorization);
    };

    let token = auth
        .to_str()
        .ok()
        .and_then(|v| v.split_whitespace().nth(1))
        .ok_or(OAuth2Error::InvalidToken)?;

    state.store.resolve_access_token(token).ok_or_else(|| {
        tracing::debug!(token, "invalid or expired token");
        OAuth2Error::InvalidToken
    })
}

/// Appends `code` and, if present, `state` to the query of the client's redirect URI.
///
/// Any `#fragment` stays at the end. Relative URIs are allowed.
pub fn redirect_with_code(redirect_uri: &str, code: &str, state: Option<&str>) -> String {
    let (base, fragment) = match redirect_uri.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (redirect_uri, None),
    };

    let mut redirect_url = base.to_string();
    redirect_url.push_str(if redirect_url.contains('?') { "&" } else { "?" });
    redirect_url.push_str(&format!("code={}", urlencoding::encode(code)));
    if let Some(state) = state {
        redirect_url.push_str(&format!("&state={}", urlencoding::encode(state)));
    }
    if let Some(fragment) = fragment {
        redirect_url.push('#');
        redirect_url.push_str(fragment);
    }
    redirect_url
}

/// 302 with a short text body, the way Discord answers the authorize request.
fn found(location: String) -> Result<Response, OAuth2Error> {
    let value = HeaderValue::from_str(&location).map_err(|_| OAuth2Error::InvalidRedirectUri)?;
    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, value)],
        format!("Found. Redirecting to {location}"),
    )
        .into_response())
}
