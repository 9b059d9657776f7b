//! "Choose an account" page for multi-identity mode.
//!
//! The page is a plain GET form that re-submits every authorize parameter as a hidden
//! field together with the chosen `selected_user`, so no server-side session is needed.

use crate::oauth2::identity::Identity;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

#[derive(Template)]
#[template(path = "select_identity.html")]
struct AccountPickerTemplate<'a> {
    client_id: &'a str,
    redirect_uri: &'a str,
    response_type: &'a str,
    scope: Option<&'a str>,
    state: Option<&'a str>,
    identities: &'a [Identity],
}

/// Authorize parameters carried through the form round trip.
#[derive(Debug, Clone, Copy)]
pub struct PickerParams<'a> {
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub response_type: &'a str,
    pub scope: Option<&'a str>,
    pub state: Option<&'a str>,
}

pub fn render_account_picker(
    params: PickerParams<'_>,
    identities: &[Identity],
) -> Result<String, askama::Error> {
    AccountPickerTemplate {
        client_id: params.client_id,
        redirect_uri: params.redirect_uri,
        response_type: params.response_type,
        scope: params.scope,
        state: params.state,
        identities,
    }
    .render()
}

pub fn account_picker_page(params: PickerParams<'_>, identities: &[Identity]) -> Response {
    match render_account_picker(params, identities) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render account picker template: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth2::identity::IdentityRegistry;

    fn params<'a>(state: Option<&'a str>) -> PickerParams<'a> {
        PickerParams {
            client_id: "11111",
            redirect_uri: "http://localhost:3333/callback",
            response_type: "code",
            scope: Some("identify email"),
            state,
        }
    }

    #[test]
    fn lists_every_identity_as_a_choice() {
        let registry = IdentityRegistry::default();
        let html = render_account_picker(params(None), registry.identities()).unwrap();

        for identity in registry.identities() {
            assert!(html.contains(&format!("value=\"{}\"", identity.key)));
            assert!(html.contains(identity.id.as_str()));
        }
        assert_eq!(html.matches("name=\"selected_user\"").count(), 3);
    }

    #[test]
    fn carries_hidden_authorize_parameters() {
        let registry = IdentityRegistry::default();
        let html = render_account_picker(params(Some("xyz")), registry.identities()).unwrap();

        assert!(html.contains("name=\"client_id\" value=\"11111\""));
        assert!(html.contains("name=\"redirect_uri\""));
        assert!(html.contains("name=\"response_type\" value=\"code\""));
        assert!(html.contains("name=\"scope\" value=\"identify email\""));
        assert!(html.contains("name=\"state\" value=\"xyz\""));
    }

    #[test]
    fn omits_state_field_when_absent() {
        let registry = IdentityRegistry::default();
        let html = render_account_picker(params(None), registry.identities()).unwrap();
        assert!(!html.contains("name=\"state\""));
    }

    #[test]
    fn escapes_untrusted_values() {
        let registry = IdentityRegistry::default();
        let html = render_account_picker(
            params(Some("\"><script>alert(1)</script>")),
            registry.identities(),
        )
        .unwrap();
        assert!(!html.contains("<script>"));
    }
}
