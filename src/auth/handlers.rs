use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRef, State};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::auth::dto::AuthPayload;
use crate::auth::extractors::{AuthUser, GuestUser};
use crate::auth::jwt::{blacklist_key, JwtKeys};
use crate::auth::repo::CreateUserError;
use crate::auth::repo_types::{ExperienceLevel, NewUser, User};
use crate::auth::{otp, service};
use crate::email::{self, EmailTemplate};
use crate::response::{respond_with, session_cookie, ApiResponse};
use crate::sanitize::Sanitize;
use crate::state::AppState;
use crate::validation::{json_body, str_field, Validator};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup_user))
        .route("/login", post(login_user))
        .route("/verify-otp", post(verify_user_otp))
        .route("/resend-otp", post(resend_user_otp))
        .route("/request-password", post(request_user_password))
        .route("/reset-password", post(reset_user_password))
        .route("/logout", post(logout_user))
}

fn experience_level_for(state: &AppState, email: &str) -> ExperienceLevel {
    let super_admin = &state.config.super_admin_email;
    if !super_admin.is_empty() && email == super_admin {
        ExperienceLevel::SuperAdmin
    } else {
        ExperienceLevel::Regular
    }
}

/// POST /auth/signup
#[instrument(skip(state, jar, payload))]
pub async fn signup_user(
    State(state): State<AppState>,
    _guest: GuestUser,
    jar: CookieJar,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let body = json_body(payload)?;

    let mut validate = Validator::new();
    validate
        .body(body.get("firstName"), "firstname")
        .required()
        .min_length(2);
    validate
        .body(body.get("lastName"), "lastname")
        .required()
        .min_length(2);
    validate.body(body.get("email"), "email").required().email();
    validate
        .body(body.get("password"), "password")
        .required()
        .min_length(6)
        .strong_pwd();
    validate.finish()?;

    let first_name = Sanitize::new(str_field(&body, "firstName"))
        .trim()
        .capitalize()
        .into_inner();
    let last_name = Sanitize::new(str_field(&body, "lastName"))
        .trim()
        .capitalize()
        .into_inner();
    let email = Sanitize::new(str_field(&body, "email"))
        .trim()
        .lower()
        .into_inner();
    let password_hash =
        Sanitize::new(str_field(&body, "password")).into_hash(state.config.hash_cost)?;

    if service::check_email_exists(&state.db, &email).await?.is_some() {
        return Err(ApiResponse::conflict().with_error(format!("{} already exists!", email)));
    }

    let user = User::create(
        &state.db,
        NewUser {
            first_name,
            last_name,
            email: email.clone(),
            password_hash,
            image_id: None,
            image_url: None,
            experience_level: experience_level_for(&state, &email),
            is_verified: false,
        },
    )
    .await
    .map_err(|err| match err {
        // Creation may race another signup; the store's constraint decides.
        CreateUserError::DuplicateEmail => {
            ApiResponse::conflict().with_error(format!("{} already exists!", email))
        }
        CreateUserError::Database(err) => {
            error!(error = %err, "create user failed");
            ApiResponse::internal().with_error(err.to_string())
        }
    })?;

    let user_otp =
        otp::generate_user_otp(state.cache.as_ref(), &user.email, state.config.otp_ttl).await?;

    let fullname = format!("{} {}", user.first_name, user.last_name);
    email::send_email(
        state.mailer.as_ref(),
        &user.email,
        "Welcome to Moospire",
        EmailTemplate::Welcome,
        &[("fullName", fullname.as_str()), ("otp", user_otp.as_str())],
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let auth = service::generate_user_payload(&keys, &user)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        jar.add(session_cookie(&state.config, &auth.token, false)),
        respond_with(
            ApiResponse::created(),
            json!({
                "message": "User created successfully",
                "data": { "user": auth.user, "token": auth.token },
            }),
        ),
    )
        .into_response())
}

/// POST /auth/login
#[instrument(skip(state, jar, payload))]
pub async fn login_user(
    State(state): State<AppState>,
    _guest: GuestUser,
    jar: CookieJar,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let body = json_body(payload)?;

    let mut validate = Validator::new();
    validate.body(body.get("email"), "email").required().email();
    validate
        .body(body.get("password"), "password")
        .required()
        .min_length(6);
    validate.finish()?;

    let email = Sanitize::new(str_field(&body, "email"))
        .trim()
        .lower()
        .into_inner();
    let password = str_field(&body, "password");

    let keys = JwtKeys::from_ref(&state);
    let AuthPayload { user, token } =
        service::validate_user_sign_in(&state.db, &keys, &email, &password).await?;

    service::check_user_archived_state(&state.db, &email).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok((
        jar.add(session_cookie(&state.config, &token, false)),
        respond_with(
            ApiResponse::success(),
            json!({
                "message": "User login was successful",
                "data": { "user": user, "token": token },
            }),
        ),
    )
        .into_response())
}

/// POST /auth/request-password
#[instrument(skip(state, payload))]
pub async fn request_user_password(
    State(state): State<AppState>,
    _guest: GuestUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let body = json_body(payload)?;

    let mut validate = Validator::new();
    validate.body(body.get("email"), "email").required().email();
    validate.finish()?;

    let email = Sanitize::new(str_field(&body, "email"))
        .trim()
        .lower()
        .into_inner();

    let Some(user) = service::check_email_exists(&state.db, &email).await? else {
        return Ok(respond_with(
            ApiResponse::not_found(),
            json!({
                "message": format!("The email {} does not exist in our records", email),
            }),
        ));
    };

    let keys = JwtKeys::from_ref(&state);
    let signed = keys.sign_reset(&user.email)?;
    let reset_link = format!("{}/reset-password/{}", state.config.domain_url, signed);
    let fullname = format!("{} {}", user.first_name, user.last_name);

    email::send_email(
        state.mailer.as_ref(),
        &user.email,
        "Password Reset",
        EmailTemplate::RequestPassword,
        &[
            ("fullName", fullname.as_str()),
            ("resetLink", reset_link.as_str()),
        ],
    )
    .await?;

    Ok(respond_with(
        ApiResponse::success(),
        json!({ "message": "Password reset link sent to email" }),
    ))
}

/// POST /auth/reset-password
#[instrument(skip(state, payload))]
pub async fn reset_user_password(
    State(state): State<AppState>,
    _guest: GuestUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let body = json_body(payload)?;

    let mut validate = Validator::new();
    validate.body(body.get("token"), "token").required();
    validate
        .body(body.get("password"), "password")
        .required()
        .min_length(6)
        .strong_pwd();
    validate.finish()?;

    let keys = JwtKeys::from_ref(&state);
    let claims = match keys.verify_reset(&str_field(&body, "token")) {
        Ok(claims) => claims,
        Err(_) => {
            return Err(
                ApiResponse::unauthorized().with_error("Reset token is either invalid or expired")
            );
        }
    };

    let password_hash =
        Sanitize::new(str_field(&body, "password")).into_hash(state.config.hash_cost)?;

    match User::set_password(&state.db, &claims.email, &password_hash).await? {
        Some(_) => Ok(respond_with(
            ApiResponse::success(),
            json!({ "message": "Password has been updated successfully" }),
        )),
        None => Ok(respond_with(
            ApiResponse::not_found(),
            json!({ "message": "User was not found" }),
        )),
    }
}

/// POST /auth/verify-otp
#[instrument(skip(state, session, payload))]
pub async fn verify_user_otp(
    State(state): State<AppState>,
    session: AuthUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiResponse> {
    let body = json_body(payload)?;
    let email = session.current_user.email.clone();
    let email_value = Value::String(email.clone());

    let mut validate = Validator::new();
    validate
        .body(body.get("otp"), "otp")
        .required()
        .min_length(6);
    validate.body(Some(&email_value), "email").required().email();
    validate.finish()?;

    let user_otp = str_field(&body, "otp");

    let stored = state.cache.get(&otp::otp_key(&email)).await?;
    match stored {
        Some(stored) if stored == user_otp => {
            User::set_verified(&state.db, &email).await?;
            info!(email = %email, "account verified");
            Ok(respond_with(
                ApiResponse::success(),
                json!({ "message": "Your account has been successfully verified" }),
            ))
        }
        _ => Ok(respond_with(
            ApiResponse::not_found(),
            json!({ "message": "Invalid or expired OTP token" }),
        )),
    }
}

/// POST /auth/resend-otp
#[instrument(skip(state, session))]
pub async fn resend_user_otp(
    State(state): State<AppState>,
    session: AuthUser,
) -> Result<Response, ApiResponse> {
    let email = session.current_user.email;
    let fullname = session.current_user.fullname;

    let user_otp =
        otp::generate_user_otp(state.cache.as_ref(), &email, state.config.otp_ttl).await?;

    email::send_email(
        state.mailer.as_ref(),
        &email,
        "Account verification OTP",
        EmailTemplate::OtpResend,
        &[("fullName", fullname.as_str()), ("otp", user_otp.as_str())],
    )
    .await?;

    Ok(respond_with(
        ApiResponse::success(),
        json!({ "message": "OTP email re-sent successfully" }),
    ))
}

/// POST /auth/logout
#[instrument(skip(state, session, jar))]
pub async fn logout_user(
    State(state): State<AppState>,
    session: AuthUser,
    jar: CookieJar,
) -> Result<Response, ApiResponse> {
    state
        .cache
        .set_ex(&blacklist_key(&session.token), "true", session.ttl)
        .await?;

    info!(email = %session.current_user.email, "user logged out");
    Ok((
        jar.add(session_cookie(&state.config, "", true)),
        respond_with(
            ApiResponse::success(),
            json!({ "message": "User logout was successful" }),
        ),
    )
        .into_response())
}
