pub mod handlers;
pub mod page;
pub mod state;

pub use state::AppState;

use axum::routing::get;
use axum::Router;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// `GET /` 顯示表單，`POST /` 產生地圖。
///
/// 逾時由 handler 處理，回應仍是完整頁面。
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let state = state.with_request_timeout(request_timeout);

    Router::new()
        .route("/", get(handlers::index).post(handlers::create_map))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
