use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use crate::state::AppState;
use std::sync::Arc;

/// Proof that the webhook caller presented the shared gateway secret.
/// Payload contents are only trusted after this check passes.
pub struct WebhookCaller;

impl<S> FromRequestParts<S> for WebhookCaller
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("X-Webhook-Token")
            .and_then(|v| v.to_str().ok())
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        if token != app_state.config.webhook_secret {
            return Err(StatusCode::UNAUTHORIZED);
        }

        Ok(WebhookCaller)
    }
}
