use axum::extract::{FromRef, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::CookieJar;
use serde_json::json;
use tracing::{error, instrument};

use crate::auth::extractors::GuestUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::service as auth_service;
use crate::oauth::dto::{CallbackQuery, ProviderProfile};
use crate::oauth::service;
use crate::response::{respond_with, session_cookie, ApiResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/google", get(google_auth_url))
        .route("/google/callback", get(google_auth_callback))
        .route("/figma", get(figma_auth_url))
        .route("/figma/callback", get(figma_auth_callback))
}

fn require_code(query: CallbackQuery) -> Result<String, ApiResponse> {
    query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| ApiResponse::bad_request().with_error("code is required"))
}

/// GET /oauth/google — redirect to Google's consent screen.
#[instrument(skip(state))]
pub async fn google_auth_url(
    State(state): State<AppState>,
    _guest: GuestUser,
) -> Result<Redirect, ApiResponse> {
    let url = service::google_authorization_url(&state.config)?;
    Ok(Redirect::temporary(&url))
}

/// GET /oauth/google/callback
#[instrument(skip(state, jar, query))]
pub async fn google_auth_callback(
    State(state): State<AppState>,
    _guest: GuestUser,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiResponse> {
    let code = require_code(query)?;

    let tokens = service::get_google_oauth_tokens(&state.http, &state.config, &code)
        .await
        .map_err(|err| {
            error!(error = %err, "error fetching google oauth tokens");
            ApiResponse::internal().with_error("Error fetching tokens")
        })?;

    let profile = service::get_google_profile(&state.http, &tokens.access_token, &tokens.id_token)
        .await
        .map_err(|err| {
            error!(error = %err, "error fetching google profile");
            ApiResponse::internal()
                .with_error("An error occurred while authenticating user profile")
        })?;

    let keys = JwtKeys::from_ref(&state);
    let auth =
        service::authenticate_user_profile(&state, &keys, &ProviderProfile::Google(profile))
            .await?;

    auth_service::check_user_archived_state(&state.db, &auth.user.email).await?;

    Ok((
        jar.add(session_cookie(&state.config, &auth.token, false)),
        respond_with(
            ApiResponse::success(),
            json!({
                "message": "Google profile authenticated successfully",
                "data": { "user": auth.user, "token": auth.token },
            }),
        ),
    )
        .into_response())
}

/// GET /oauth/figma — redirect to Figma's consent screen.
#[instrument(skip(state))]
pub async fn figma_auth_url(
    State(state): State<AppState>,
    _guest: GuestUser,
) -> Result<Redirect, ApiResponse> {
    let url = service::figma_authorization_url(&state.config)?;
    Ok(Redirect::temporary(&url))
}

/// GET /oauth/figma/callback
#[instrument(skip(state, jar, query))]
pub async fn figma_auth_callback(
    State(state): State<AppState>,
    _guest: GuestUser,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiResponse> {
    let code = require_code(query)?;

    let tokens = service::get_figma_oauth_tokens(&state.http, &state.config, &code)
        .await
        .map_err(|err| {
            error!(error = %err, "error fetching figma oauth tokens");
            ApiResponse::internal().with_error("Error fetching tokens")
        })?;

    let profile = service::get_figma_profile(&state.http, &tokens.access_token)
        .await
        .map_err(|err| {
            error!(error = %err, "error fetching figma profile");
            ApiResponse::internal()
                .with_error("An error occurred while authenticating user profile")
        })?;

    let keys = JwtKeys::from_ref(&state);
    let auth = service::authenticate_user_profile(&state, &keys, &ProviderProfile::Figma(profile))
        .await?;

    auth_service::check_user_archived_state(&state.db, &auth.user.email).await?;

    Ok((
        jar.add(session_cookie(&state.config, &auth.token, false)),
        respond_with(
            ApiResponse::success(),
            json!({
                "message": "Figma profile authenticated successfully",
                "data": { "user": auth.user, "token": auth.token },
            }),
        ),
    )
        .into_response())
}
