use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::{error::AppError, models::User, state::AppState};

/// Session key holding the authenticated steam id.
pub const SESSION_STEAM_ID_KEY: &str = "steam_id";

/// The resolved identity for this request. The user row (including the
/// admin flag) is re-read from storage on every request; nothing about the
/// identity is cached between requests.
#[derive(Debug, Clone)]
pub struct SessionUser(pub User);

/// Like [`SessionUser`] but never rejects; endpoints such as the admin
/// check must answer even for anonymous callers.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<User>);

pub fn ensure_admin(user: &User) -> Result<(), AppError> {
    if user.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

async fn session_steam_id(parts: &mut Parts) -> Option<String> {
    // SessionManagerLayer puts the session into request extensions.
    let session = parts.extensions.get::<Session>()?;
    session.get::<String>(SESSION_STEAM_ID_KEY).await.ok().flatten()
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let steam_id = session_steam_id(parts)
            .await
            .ok_or(AppError::Unauthorized)?;

        let user = state
            .storage
            .user_by_steam_id(&steam_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        Ok(SessionUser(user))
    }
}

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(steam_id) = session_steam_id(parts).await else {
            return Ok(OptionalUser(None));
        };

        let user = match state.storage.user_by_steam_id(&steam_id).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "failed to resolve session user");
                None
            }
        };

        Ok(OptionalUser(user))
    }
}
