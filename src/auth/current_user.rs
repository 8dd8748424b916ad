//! Request extractors carrying the authenticated account.
//!
//! Handlers take the caller as an explicit argument instead of reading
//! ambient session state: `CurrentUser` for any authenticated account,
//! `AdminUser` for superuser-only routes.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::Json,
};
use tracing::warn;

use crate::auth::session;
use crate::schemas::{AppState, ErrorResponse};

/// The authenticated account behind a request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account_id: i32,
    pub email: String,
    pub is_superuser: bool,
}

fn unauthenticated() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Authentication required".to_string(),
            code: "UNAUTHENTICATED".to_string(),
            success: false,
        }),
    )
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(unauthenticated)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or_else(unauthenticated)?;

        let claims =
            session::verify_session_token(token, &state.secret_key).ok_or_else(unauthenticated)?;

        Ok(CurrentUser {
            account_id: claims.sub,
            email: claims.email,
            is_superuser: claims.is_superuser,
        })
    }
}

/// Gate for catalog and student administration routes.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_superuser {
            warn!(
                "Account {} attempted to access an admin route",
                user.account_id
            );
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse {
                    error: "Administrator access required".to_string(),
                    code: "FORBIDDEN".to_string(),
                    success: false,
                }),
            ));
        }

        Ok(AdminUser(user))
    }
}
