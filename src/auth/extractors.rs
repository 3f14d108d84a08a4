use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use time::OffsetDateTime;

use crate::auth::dto::UserPayload;
use crate::auth::jwt::{blacklist_key, JwtKeys, TokenError};
use crate::response::ApiResponse;
use crate::state::AppState;

async fn cookie_jar(parts: &mut Parts, state: &AppState) -> CookieJar {
    match CookieJar::from_request_parts(parts, state).await {
        Ok(jar) => jar,
        Err(never) => match never {},
    }
}

/// Gate for routes only unauthenticated callers may use. A missing, empty or
/// literal "null" cookie passes; anything else is already a session.
#[derive(Debug)]
pub struct GuestUser;

#[async_trait]
impl FromRequestParts<AppState> for GuestUser {
    type Rejection = ApiResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = cookie_jar(parts, state).await;
        match jar.get("token") {
            None => Ok(GuestUser),
            Some(cookie) if cookie.value().is_empty() || cookie.value() == "null" => Ok(GuestUser),
            Some(_) => Err(ApiResponse::un_processable()
                .with_error("Authenticated users cannot access this route")),
        }
    }
}

/// Session attached to authenticated requests. Exactly four terminal
/// outcomes: 401 (no cookie), 403 (expired or bad signature), 401
/// (blacklisted), 403 (anything else undecodable); otherwise the request
/// proceeds with the raw token, its remaining lifetime and the user snapshot.
pub struct AuthUser {
    pub token: String,
    pub ttl: u64,
    pub current_user: UserPayload,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = cookie_jar(parts, state).await;
        let Some(cookie) = jar.get("token") else {
            return Err(ApiResponse::unauthorized());
        };
        let token = cookie.value().to_string();

        let keys = JwtKeys::from_ref(state);
        let claims = match keys.verify_session(&token) {
            Ok(claims) => claims,
            Err(TokenError::Expired) | Err(TokenError::InvalidSignature) => {
                return Err(ApiResponse::forbidden());
            }
            Err(TokenError::Malformed(_)) => {
                return Err(ApiResponse::forbidden().with_error("Invalid token structure"));
            }
        };

        // Blacklist is consulted only for tokens that verified.
        match state.cache.exists(&blacklist_key(&token)).await {
            Ok(true) => return Err(ApiResponse::unauthorized()),
            Ok(false) => {}
            Err(err) => return Err(ApiResponse::from(err)),
        }

        let now = OffsetDateTime::now_utc().unix_timestamp().max(0) as usize;
        let ttl = claims.exp.saturating_sub(now).max(1) as u64;

        Ok(AuthUser {
            token,
            ttl,
            current_user: claims.current_user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::dto::sample_user;
    use crate::cache::CacheStore;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;

    fn parts_with_cookie(token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(token) = token {
            builder = builder.header("cookie", format!("token={}", token));
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn guest_gate_passes_without_a_token() {
        let state = AppState::fake();
        for cookie in [None, Some("null"), Some("")] {
            let mut parts = parts_with_cookie(cookie);
            assert!(GuestUser::from_request_parts(&mut parts, &state)
                .await
                .is_ok());
        }
    }

    #[tokio::test]
    async fn guest_gate_blocks_existing_sessions() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("some-session-token"));
        let err = GuestUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, 422);
        assert_eq!(
            err.error.as_deref(),
            Some("Authenticated users cannot access this route")
        );
    }

    #[tokio::test]
    async fn auth_gate_requires_a_cookie() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(None);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, 401);
    }

    #[tokio::test]
    async fn auth_gate_rejects_garbage_as_invalid_structure() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("not-a-jwt"));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, 403);
        assert_eq!(err.error.as_deref(), Some("Invalid token structure"));
    }

    #[tokio::test]
    async fn auth_gate_rejects_wrong_signatures_as_forbidden() {
        let state = AppState::fake();
        let other_keys = JwtKeys::new("other-secret", Duration::from_secs(3600));
        let token = other_keys
            .sign_session(&crate::auth::dto::UserPayload::from_user(&sample_user()))
            .unwrap();
        let mut parts = parts_with_cookie(Some(&token));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, 403);
        assert_eq!(err.error, None);
    }

    #[tokio::test]
    async fn auth_gate_accepts_a_valid_session() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user = crate::auth::dto::UserPayload::from_user(&sample_user());
        let token = keys.sign_session(&user).unwrap();

        let mut parts = parts_with_cookie(Some(&token));
        let session = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(session.current_user.id, user.id);
        assert_eq!(session.token, token);
        assert!(session.ttl > 0 && session.ttl <= 3600);
    }

    #[tokio::test]
    async fn auth_gate_rejects_blacklisted_tokens_despite_valid_signatures() {
        struct BlacklistedCache;
        #[async_trait::async_trait]
        impl CacheStore for BlacklistedCache {
            async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
                Ok(Some("true".into()))
            }
            async fn set_ex(&self, _key: &str, _value: &str, _ttl_secs: u64) -> anyhow::Result<()> {
                Ok(())
            }
            async fn del(&self, _key: &str) -> anyhow::Result<()> {
                Ok(())
            }
            async fn exists(&self, _key: &str) -> anyhow::Result<bool> {
                Ok(true)
            }
        }

        let mut state = AppState::fake();
        state.cache = Arc::new(BlacklistedCache);

        let keys = JwtKeys::from_ref(&state);
        let token = keys
            .sign_session(&crate::auth::dto::UserPayload::from_user(&sample_user()))
            .unwrap();
        let mut parts = parts_with_cookie(Some(&token));
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .err()
            .unwrap();
        assert_eq!(err.code, 401);
    }
}
