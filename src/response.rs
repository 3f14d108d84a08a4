use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::Cookie;
use serde_json::{Map, Value};

use crate::config::AppConfig;

/// The closed catalogue of API outcomes. Every response the service emits
/// maps to one of these (code, message) pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Success,
    Created,
    NoContent,
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    NoMethod,
    Conflict,
    UnProcessable,
    ManyRequest,
    Internal,
}

impl ApiStatus {
    pub fn code(self) -> u16 {
        match self {
            ApiStatus::Success => 200,
            ApiStatus::Created => 201,
            ApiStatus::NoContent => 204,
            ApiStatus::BadRequest => 400,
            ApiStatus::Unauthorized => 401,
            ApiStatus::Forbidden => 403,
            ApiStatus::NotFound => 404,
            ApiStatus::NoMethod => 405,
            ApiStatus::Conflict => 409,
            ApiStatus::UnProcessable => 422,
            ApiStatus::ManyRequest => 429,
            ApiStatus::Internal => 500,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ApiStatus::Success => "Successful",
            ApiStatus::Created => "Resource created",
            ApiStatus::NoContent => "No content",
            ApiStatus::BadRequest => "Bad request",
            ApiStatus::Unauthorized => "Unauthorized access",
            ApiStatus::Forbidden => "Forbidden",
            ApiStatus::NotFound => "Resource not found",
            ApiStatus::NoMethod => "Method not allowed",
            ApiStatus::Conflict => "Conflict",
            ApiStatus::UnProcessable => "Unprocessable entity",
            ApiStatus::ManyRequest => "Too many requests",
            ApiStatus::Internal => "Internal server error",
        }
    }
}

/// Uniform response envelope. Doubles as the error type handlers return
/// early with, so every failure path renders the same JSON shape.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ApiResponse {
    pub status: &'static str,
    pub code: u16,
    pub message: String,
    pub error: Option<String>,
}

impl ApiResponse {
    fn render(status: ApiStatus) -> Self {
        Self {
            status: if status.code() >= 400 { "error" } else { "success" },
            code: status.code(),
            message: status.message().to_string(),
            error: None,
        }
    }

    pub fn success() -> Self {
        Self::render(ApiStatus::Success)
    }
    pub fn created() -> Self {
        Self::render(ApiStatus::Created)
    }
    pub fn no_content() -> Self {
        Self::render(ApiStatus::NoContent)
    }
    pub fn bad_request() -> Self {
        Self::render(ApiStatus::BadRequest)
    }
    pub fn unauthorized() -> Self {
        Self::render(ApiStatus::Unauthorized)
    }
    pub fn forbidden() -> Self {
        Self::render(ApiStatus::Forbidden)
    }
    pub fn not_found() -> Self {
        Self::render(ApiStatus::NotFound)
    }
    pub fn no_method() -> Self {
        Self::render(ApiStatus::NoMethod)
    }
    pub fn conflict() -> Self {
        Self::render(ApiStatus::Conflict)
    }
    pub fn un_processable() -> Self {
        Self::render(ApiStatus::UnProcessable)
    }
    pub fn many_request() -> Self {
        Self::render(ApiStatus::ManyRequest)
    }
    pub fn internal() -> Self {
        Self::render(ApiStatus::Internal)
    }

    /// Attaches a descriptive error detail to the envelope.
    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.error = Some(detail.into());
        self
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert("status".into(), Value::String(self.status.to_string()));
        payload.insert("code".into(), Value::Number(self.code.into()));
        payload.insert("message".into(), Value::String(self.message.clone()));
        if let Some(error) = &self.error {
            payload.insert("error".into(), Value::String(error.clone()));
        }
        payload
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        if self.code >= 500 {
            tracing::error!(code = self.code, message = %self.message, error = ?self.error, "request failed");
        } else if self.code >= 400 {
            tracing::warn!(code = self.code, message = %self.message, error = ?self.error, "request rejected");
        }
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(Value::Object(self.to_map()))).into_response()
    }
}

impl From<anyhow::Error> for ApiResponse {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "service error");
        Self::internal().with_error(err.to_string())
    }
}

/// Sends a formatted envelope with handler-specific keys merged in. Keys in
/// `extra` (typically `message` and `data`) override the catalogue entry.
pub fn respond_with(response: ApiResponse, extra: Value) -> Response {
    let status =
        StatusCode::from_u16(response.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut payload = response.to_map();
    if let Value::Object(extra) = extra {
        for (key, value) in extra {
            payload.insert(key, value);
        }
    }
    (status, Json(Value::Object(payload))).into_response()
}

/// Builds the httpOnly session cookie. With `expire` set the cookie is
/// rewritten empty with a zero max-age, which drops it client-side.
pub fn session_cookie(config: &AppConfig, token: &str, expire: bool) -> Cookie<'static> {
    let policy = &config.cookie;
    let mut cookie = Cookie::new("token", token.to_string());
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_secure(policy.secure);
    cookie.set_same_site(policy.same_site);
    if let Some(domain) = &policy.domain {
        cookie.set_domain(domain.clone());
    }
    cookie.set_max_age(if expire {
        time::Duration::ZERO
    } else {
        time::Duration::seconds(policy.max_age.as_secs() as i64)
    });
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_flag_follows_the_error_threshold() {
        assert_eq!(ApiResponse::success().status, "success");
        assert_eq!(ApiResponse::created().status, "success");
        assert_eq!(ApiResponse::no_content().status, "success");
        assert_eq!(ApiResponse::bad_request().status, "error");
        assert_eq!(ApiResponse::internal().status, "error");
    }

    #[test]
    fn catalogue_codes_are_fixed() {
        assert_eq!(ApiResponse::success().code, 200);
        assert_eq!(ApiResponse::created().code, 201);
        assert_eq!(ApiResponse::unauthorized().code, 401);
        assert_eq!(ApiResponse::forbidden().code, 403);
        assert_eq!(ApiResponse::not_found().code, 404);
        assert_eq!(ApiResponse::no_method().code, 405);
        assert_eq!(ApiResponse::conflict().code, 409);
        assert_eq!(ApiResponse::un_processable().code, 422);
        assert_eq!(ApiResponse::many_request().code, 429);
    }

    #[test]
    fn error_detail_is_optional_in_the_envelope() {
        let plain = ApiResponse::bad_request().to_map();
        assert!(!plain.contains_key("error"));

        let detailed = ApiResponse::bad_request().with_error("email is required").to_map();
        assert_eq!(
            detailed.get("error").and_then(Value::as_str),
            Some("email is required")
        );
    }

    #[test]
    fn expired_session_cookie_has_zero_max_age() {
        let config = crate::state::test_config();
        let cookie = session_cookie(&config, "", true);
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
        assert_eq!(cookie.name(), "token");
        assert!(cookie.http_only().unwrap_or(false));
    }
}
