//! Health check endpoint.

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

/// Liveness probe for scripts that wait for the mock provider to come up.
#[tracing::instrument()]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Mock provider health check",
    description = "Returns `ok` once the mock provider accepts requests. Test harnesses can poll this \
                   before starting the OAuth2 flow.",
    responses(
        (status = 200, description = "Provider is up", body = str, content_type = "text/plain", example = "ok")
    )
)]
pub async fn health() -> &'static str {
    "ok"
}
