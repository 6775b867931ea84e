use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
};
use crate::state::AppState;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Qari,
    Student,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub role: String,
    pub exp: usize,
}

/// Authenticated caller, resolved from the identity provider's bearer JWT.
/// The scheduling core trusts this identity unconditionally for ownership
/// checks.
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn require_qari(&self) -> Result<(), crate::error::AppError> {
        match self.role {
            Role::Qari => Ok(()),
            Role::Student => Err(crate::error::AppError::Forbidden("Qari role required".into())),
        }
    }

    pub fn require_student(&self) -> Result<(), crate::error::AppError> {
        match self.role {
            Role::Student => Ok(()),
            Role::Qari => Err(crate::error::AppError::Forbidden("Student role required".into())),
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(StatusCode::UNAUTHORIZED)?;

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        let decoding_key = DecodingKey::from_secret(app_state.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(bearer, &decoding_key, &validation)
            .map_err(|_| StatusCode::UNAUTHORIZED)?;

        let role = match token_data.claims.role.as_str() {
            "qari" => Role::Qari,
            "student" => Role::Student,
            _ => return Err(StatusCode::UNAUTHORIZED),
        };

        Span::current().record("user_id", token_data.claims.user_id);

        Ok(AuthUser {
            user_id: token_data.claims.user_id,
            role,
        })
    }
}
