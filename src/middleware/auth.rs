use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::{errors::AppError, handlers::AppState, models::Tier};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: String,
    pub tier: Tier,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Auth("Authentication required".to_string()))?;

        let claims = state.jwt.verify_access_token(token.trim()).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            AppError::Auth("Invalid or expired token".to_string())
        })?;

        Ok(AuthenticatedUser {
            id: claims.sub,
            tier: claims.tier,
        })
    }
}
