use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::auth::dto::UserPayload;
use crate::state::AppState;

/// Password-reset links die fast regardless of the session lifetime.
pub const RESET_TOKEN_LIFE: Duration = Duration::from_secs(5 * 60);

/// Cache key marking a token as revoked before its natural expiry.
pub fn blacklist_key(token: &str) -> String {
    format!("black-list-{}", token)
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("jwt expired")]
    Expired,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("invalid token structure")]
    Malformed(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => return TokenError::Expired,
            ErrorKind::InvalidSignature => return TokenError::InvalidSignature,
            _ => {}
        }
        TokenError::Malformed(err)
    }
}

/// Claims carried by the session cookie: the user id plus a snapshot of the
/// user at issuance time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub current_user: UserPayload,
    pub iat: usize,
    pub exp: usize,
}

/// Short-lived claims embedded in password-reset links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetClaims {
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    token_life: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.app_secret, state.config.token_life)
    }
}

impl JwtKeys {
    pub fn new(secret: &str, token_life: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            token_life,
        }
    }

    pub fn sign_session(&self, current_user: &UserPayload) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = SessionClaims {
            sub: current_user.id,
            current_user: current_user.clone(),
            iat: now,
            exp: now + self.token_life.as_secs() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %current_user.id, "session token signed");
        Ok(token)
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let data = decode::<SessionClaims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }

    pub fn sign_reset(&self, email: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = ResetClaims {
            email: email.to_string(),
            iat: now,
            exp: now + RESET_TOKEN_LIFE.as_secs() as usize,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify_reset(&self, token: &str) -> Result<ResetClaims, TokenError> {
        let data = decode::<ResetClaims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::{sample_user, UserPayload};

    fn make_keys() -> JwtKeys {
        JwtKeys::new("dev-secret", Duration::from_secs(3600))
    }

    fn payload() -> UserPayload {
        UserPayload::from_user(&sample_user())
    }

    #[test]
    fn session_token_roundtrips_the_user_id() {
        let keys = make_keys();
        let user = payload();
        let token = keys.sign_session(&user).expect("sign session");
        let claims = keys.verify_session(&token).expect("verify session");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.current_user.email, user.email);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_tokens_are_classified_as_expired() {
        let keys = make_keys();
        let user = payload();
        let past = OffsetDateTime::now_utc().unix_timestamp() as usize - 7200;
        let claims = SessionClaims {
            sub: user.id,
            current_user: user,
            iat: past,
            exp: past + 60,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"dev-secret"),
        )
        .unwrap();
        assert!(matches!(
            keys.verify_session(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn wrong_secret_is_an_invalid_signature() {
        let keys = make_keys();
        let other = JwtKeys::new("other-secret", Duration::from_secs(3600));
        let token = other.sign_session(&payload()).expect("sign session");
        assert!(matches!(
            keys.verify_session(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = make_keys();
        assert!(matches!(
            keys.verify_session("not.a.token"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn reset_token_roundtrips_the_email() {
        let keys = make_keys();
        let token = keys.sign_reset("jane@example.com").expect("sign reset");
        let claims = keys.verify_reset(&token).expect("verify reset");
        assert_eq!(claims.email, "jane@example.com");
        assert_eq!(claims.exp - claims.iat, RESET_TOKEN_LIFE.as_secs() as usize);
    }

    #[test]
    fn session_token_is_not_a_reset_token() {
        let keys = make_keys();
        let token = keys.sign_session(&payload()).expect("sign session");
        assert!(matches!(
            keys.verify_reset(&token),
            Err(TokenError::Malformed(_))
        ));
    }
}
