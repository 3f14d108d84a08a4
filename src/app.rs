use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::net::SocketAddr;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::response::{respond_with, ApiResponse};
use crate::state::AppState;
use crate::{auth, oauth, profile};

pub fn build_app(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth::router())
        .nest("/oauth", oauth::router())
        .nest("/profile", profile::router());

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ]);

    Router::new()
        .nest(&format!("/{}", config.api_version), api)
        .fallback(not_found)
        .method_not_allowed_fallback(no_method)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /health
async fn health() -> Response {
    respond_with(
        ApiResponse::success(),
        json!({ "message": "API is in a good state today, Hurray!!!" }),
    )
}

/// Unknown path: the 404 envelope instead of the framework default.
async fn not_found() -> ApiResponse {
    ApiResponse::not_found()
}

/// Known path, wrong verb: the 405 envelope.
async fn no_method() -> ApiResponse {
    ApiResponse::no_method()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_assembles_with_a_fake_state() {
        let _app = build_app(AppState::fake());
    }
}
