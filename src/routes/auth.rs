use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::Redirect,
    routing::get,
};
use serde::Serialize;
use tower_sessions::Session;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{OptionalUser, SESSION_STEAM_ID_KEY, SessionUser},
    models::User,
    routes::MessageResponse,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthStatusResponse {
    #[serde(rename = "isAuthenticated")]
    pub is_authenticated: bool,
    pub user: Option<User>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/steam", get(steam_login))
        .route("/steam/return", get(steam_return))
        .route("/user", get(current_user))
        .route("/logout", get(logout))
        .route("/status", get(auth_status))
}

#[utoipa::path(
    get,
    path = "/auth/steam",
    responses(
        (status = 303, description = "Redirect to the Steam OpenID endpoint"),
    ),
    tag = "Auth"
)]
pub async fn steam_login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.steam.login_url())
}

/// Callback target for the Steam OpenID round-trip. Every outcome is a
/// redirect back into the frontend; errors are carried in the query string.
#[utoipa::path(
    get,
    path = "/auth/steam/return",
    responses(
        (status = 303, description = "Redirect into the frontend with the login outcome"),
    ),
    tag = "Auth"
)]
pub async fn steam_return(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<HashMap<String, String>>,
) -> Redirect {
    let client_url = &state.config.client_url;

    let steam_id = match state.steam.verify_assertion(&params).await {
        Ok(steam_id) => steam_id,
        Err(err) => {
            tracing::warn!(error = %err, "steam assertion verification failed");
            return Redirect::to(&format!("{client_url}/login?error=auth"));
        }
    };

    let profile = match state.steam.player_summary(&steam_id).await {
        Ok(profile) => profile,
        Err(err) => {
            tracing::warn!(error = %err, steam_id, "failed to fetch steam profile");
            return Redirect::to(&format!("{client_url}/login?error=steam"));
        }
    };

    if let Err(err) = state.storage.upsert_user(&profile).await {
        tracing::error!(error = %err, steam_id, "failed to persist user at login");
        return Redirect::to(&format!("{client_url}/login?error=database"));
    }

    if let Err(err) = session.insert(SESSION_STEAM_ID_KEY, steam_id).await {
        tracing::error!(error = %err, "failed to store session");
        return Redirect::to(&format!("{client_url}/login?error=session"));
    }

    Redirect::to(&format!("{client_url}/account?login=success"))
}

#[utoipa::path(
    get,
    path = "/auth/user",
    responses(
        (status = 200, description = "Current user row", body = User),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_cookie" = [])),
    tag = "Auth"
)]
pub async fn current_user(SessionUser(user): SessionUser) -> Json<User> {
    Json(user)
}

#[utoipa::path(
    get,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cleared", body = MessageResponse),
    ),
    tag = "Auth"
)]
pub async fn logout(session: Session) -> AppResult<Json<MessageResponse>> {
    session
        .flush()
        .await
        .map_err(|err| AppError::Internal(anyhow::Error::new(err)))?;
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

#[utoipa::path(
    get,
    path = "/auth/status",
    responses(
        (status = 200, description = "Authentication status; never fails", body = AuthStatusResponse),
    ),
    tag = "Auth"
)]
pub async fn auth_status(OptionalUser(user): OptionalUser) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        is_authenticated: user.is_some(),
        user,
    })
}
