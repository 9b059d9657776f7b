use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Protocol errors raised by the mock provider.
///
/// Every variant maps to a fixed OAuth2 error code and HTTP status; handlers return
/// them directly and the `IntoResponse` impl renders the body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OAuth2Error {
    #[error("Unsupported response_type")]
    UnsupportedResponseType,
    #[error("Missing redirect_uri")]
    MissingRedirectUri,
    #[error("Invalid redirect_uri")]
    InvalidRedirectUri,
    #[error("Invalid or expired authorization code.")]
    InvalidAuthorizationCode,
    #[error("Invalid or expired refresh token.")]
    InvalidRefreshToken,
    #[error("Only authorization_code and refresh_token are supported.")]
    UnsupportedGrantType,
    #[error("Malformed token request: {0}")]
    MalformedTokenRequest(String),
    #[error("Missing Authorization header.")]
    MissingAuthorization,
    #[error("Invalid or expired token.")]
    InvalidToken,
}

impl OAuth2Error {
    /// The `error` field of the OAuth2 error body.
    pub fn error_code(&self) -> &'static str {
        match self {
            OAuth2Error::UnsupportedResponseType => "unsupported_response_type",
            OAuth2Error::MissingRedirectUri
            | OAuth2Error::InvalidRedirectUri
            | OAuth2Error::MalformedTokenRequest(_)
            | OAuth2Error::MissingAuthorization => "invalid_request",
            OAuth2Error::InvalidAuthorizationCode | OAuth2Error::InvalidRefreshToken => {
                "invalid_grant"
            }
            OAuth2Error::UnsupportedGrantType => "unsupported_grant_type",
            OAuth2Error::InvalidToken => "invalid_token",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            OAuth2Error::MissingAuthorization | OAuth2Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Authorize-endpoint failures are answered in plain text, like the browser-facing
    /// page they stand in for. Everything else is a JSON error body.
    fn is_plain_text(&self) -> bool {
        matches!(
            self,
            OAuth2Error::UnsupportedResponseType
                | OAuth2Error::MissingRedirectUri
                | OAuth2Error::InvalidRedirectUri
        )
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: String,
}

impl From<&OAuth2Error> for ErrorResponse {
    fn from(err: &OAuth2Error) -> Self {
        Self {
            error: err.error_code().to_string(),
            error_description: err.to_string(),
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        if self.is_plain_text() {
            return (self.status(), self.to_string()).into_response();
        }
        (self.status(), Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Failures of the relying client's code-exchange / identity-fetch chain.
///
/// These are logged and then collapsed into a single generic 500 for the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("callback request carried no authorization code")]
    MissingCode,
    #[error("HTTP error talking to the provider: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_errors_share_invalid_grant_code() {
        assert_eq!(
            OAuth2Error::InvalidAuthorizationCode.error_code(),
            "invalid_grant"
        );
        assert_eq!(OAuth2Error::InvalidRefreshToken.error_code(), "invalid_grant");
        assert_eq!(
            OAuth2Error::InvalidRefreshToken.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn bearer_errors_are_unauthorized() {
        assert_eq!(
            OAuth2Error::MissingAuthorization.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(OAuth2Error::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(OAuth2Error::InvalidToken.error_code(), "invalid_token");
    }

    #[test]
    fn error_body_uses_display_as_description() {
        let body = ErrorResponse::from(&OAuth2Error::UnsupportedGrantType);
        assert_eq!(body.error, "unsupported_grant_type");
        assert_eq!(
            body.error_description,
            "Only authorization_code and refresh_token are supported."
        );
    }
}
