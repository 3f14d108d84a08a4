use sqlx::PgPool;

use crate::auth::dto::{AuthPayload, UserPayload};
use crate::auth::jwt::JwtKeys;
use crate::auth::password;
use crate::auth::repo_types::User;
use crate::response::ApiResponse;

/// Looks up the account for an email, if any.
pub async fn check_email_exists(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
    User::find_by_email(db, email).await
}

/// Projects a user and signs a session token embedding the projection.
pub fn generate_user_payload(keys: &JwtKeys, user: &User) -> anyhow::Result<AuthPayload> {
    let user = UserPayload::from_user(user);
    let token = keys.sign_session(&user)?;
    Ok(AuthPayload { user, token })
}

/// Validates a sign-in attempt. Unknown email, wrong password and internal
/// failure are three distinct outcomes; the two 401s carry different
/// messages on purpose.
pub async fn validate_user_sign_in(
    db: &PgPool,
    keys: &JwtKeys,
    email: &str,
    password_plain: &str,
) -> Result<AuthPayload, ApiResponse> {
    let user = check_email_exists(db, email)
        .await?
        .ok_or_else(|| ApiResponse::unauthorized().with_error("User email does not exist"))?;

    let is_password_valid = password::verify_password(password_plain, &user.password_hash)?;
    if !is_password_valid {
        return Err(ApiResponse::unauthorized().with_error("User password is not correct"));
    }

    Ok(generate_user_payload(keys, &user)?)
}

/// Blocks authentication for soft-deleted accounts.
pub async fn check_user_archived_state(db: &PgPool, email: &str) -> Result<(), ApiResponse> {
    let archived = check_email_exists(db, email)
        .await?
        .map(|user| user.is_archived)
        .unwrap_or(false);

    if archived {
        return Err(ApiResponse::unauthorized()
            .with_error("Please contact support to activate your account"));
    }
    Ok(())
}
