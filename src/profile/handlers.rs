use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::auth::dto::UserPayload;
use crate::auth::extractors::AuthUser;
use crate::auth::repo_types::{User, UserType};
use crate::config::FILE_SIZE_BASE;
use crate::profile::dto::{PageQuery, UserDataRequest, UserTypeRequest};
use crate::response::{respond_with, ApiResponse};
use crate::state::AppState;
use crate::validation::{json_body, UploadedFile, Validator};

const AVATAR_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user-role", put(update_user_role))
        .route("/user-goal", put(update_user_goal))
        .route("/user-preference", put(update_user_preference))
        .route("/user-type", put(update_user_type))
        .route("/user-avatar", put(update_user_avatar))
        .route("/users", get(list_users))
        // One megabyte of headroom so oversized files reach the validator
        // instead of the framework's 413.
        .layer(DefaultBodyLimit::max((FILE_SIZE_BASE + 1) * 1024 * 1024))
}

fn user_not_found() -> ApiResponse {
    ApiResponse::not_found().with_error("User was not found")
}

fn validated_user_data(body: Value) -> Result<UserDataRequest, ApiResponse> {
    let mut validate = Validator::new();
    validate
        .body(body.get("user_data"), "user data")
        .required()
        .not_empty();
    validate.finish()?;

    serde_json::from_value(body)
        .map_err(|err| ApiResponse::bad_request().with_error(err.to_string()))
}

/// PUT /profile/user-role
#[instrument(skip(state, session, payload))]
pub async fn update_user_role(
    State(state): State<AppState>,
    session: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let request = validated_user_data(json_body(payload)?)?;

    let updated = User::set_roles(&state.db, &session.current_user.email, &request.user_data)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(respond_with(
        ApiResponse::success(),
        json!({
            "message": "Your profile role has been updated",
            "data": updated.user_role,
        }),
    ))
}

/// PUT /profile/user-goal
#[instrument(skip(state, session, payload))]
pub async fn update_user_goal(
    State(state): State<AppState>,
    session: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let request = validated_user_data(json_body(payload)?)?;

    let updated = User::set_goals(&state.db, &session.current_user.email, &request.user_data)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(respond_with(
        ApiResponse::success(),
        json!({
            "message": "Your profile goal has been updated",
            "data": updated.user_goal,
        }),
    ))
}

/// PUT /profile/user-preference
#[instrument(skip(state, session, payload))]
pub async fn update_user_preference(
    State(state): State<AppState>,
    session: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let request = validated_user_data(json_body(payload)?)?;

    let updated = User::set_preferences(
        &state.db,
        &session.current_user.email,
        &request.user_data,
    )
    .await?
    .ok_or_else(user_not_found)?;

    Ok(respond_with(
        ApiResponse::success(),
        json!({
            "message": "Your profile preference has been updated",
            "data": updated.user_preference,
        }),
    ))
}

/// PUT /profile/user-type
#[instrument(skip(state, session, payload))]
pub async fn update_user_type(
    State(state): State<AppState>,
    session: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let body = json_body(payload)?;

    let mut validate = Validator::new();
    validate
        .body(body.get("user_type"), "user type")
        .required()
        .is_string()
        .contains_one(UserType::ALLOWED);
    validate.finish()?;

    let request: UserTypeRequest = serde_json::from_value(body)
        .map_err(|err| ApiResponse::bad_request().with_error(err.to_string()))?;
    let user_type = UserType::parse(&request.user_type).ok_or_else(|| {
        ApiResponse::bad_request()
            .with_error(format!("{} is not a valid user type item", request.user_type))
    })?;

    let updated = User::set_user_type(&state.db, &session.current_user.email, user_type)
        .await?
        .ok_or_else(user_not_found)?;

    Ok(respond_with(
        ApiResponse::success(),
        json!({
            "message": "Your profile type has been updated",
            "data": updated.user_type,
        }),
    ))
}

/// PUT /profile/user-avatar (multipart, field `avatar`)
#[instrument(skip(state, session, multipart))]
pub async fn update_user_avatar(
    State(state): State<AppState>,
    session: AuthUser,
    mut multipart: Multipart,
) -> Result<Response, ApiResponse> {
    let mut avatar: Option<UploadedFile> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("avatar") {
            let name = field.file_name().unwrap_or("avatar").to_string();
            let content_type = field
                .content_type()
                .map(|ct| ct.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ApiResponse::bad_request().with_error("Unable to process image"))?;
            avatar = Some(UploadedFile {
                name,
                content_type,
                bytes,
            });
        }
    }

    let mut validate = Validator::new();
    validate
        .file(avatar.as_ref(), "avatar")
        .required()
        .file_size(FILE_SIZE_BASE * 1024 * 1024)
        .file_type(AVATAR_EXTENSIONS);
    validate.finish()?;

    let Some(avatar) = avatar else {
        return Err(ApiResponse::bad_request().with_error("avatar is required"));
    };

    let user = User::find_by_email(&state.db, &session.current_user.email)
        .await?
        .ok_or_else(user_not_found)?;

    // Replace, never accumulate: the previous object goes first.
    if let Some(previous) = &user.image_id {
        if let Err(err) = state.storage.delete(previous).await {
            warn!(error = %err, key = %previous, "failed to remove previous avatar");
        }
    }

    let key = format!("avatars/{}-{}{}", user.id, Uuid::new_v4(), avatar.extension());
    state
        .storage
        .upload(&key, avatar.bytes.clone(), &avatar.content_type)
        .await
        .map_err(|err| {
            error!(error = %err, "avatar upload failed");
            ApiResponse::bad_request().with_error("Unable to upload image")
        })?;

    let url = state.storage.public_url(&key);
    let updated = User::set_image(&state.db, &user.email, Some(&key), Some(&url))
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, "avatar updated");
    Ok(respond_with(
        ApiResponse::success(),
        json!({
            "message": "Your profile photo has been updated",
            "data": { "image": updated.image_url },
        }),
    ))
}

/// GET /profile/users?page=
#[instrument(skip(state, _session))]
pub async fn list_users(
    State(state): State<AppState>,
    _session: AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Response, ApiResponse> {
    let page = User::paginate(&state.db, query.page).await?;
    let page = page.map(|user| UserPayload::from_user(&user));

    Ok(respond_with(
        ApiResponse::success(),
        json!({
            "message": "Users retrieved successfully",
            "data": page,
        }),
    ))
}
