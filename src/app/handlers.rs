use crate::app::page::{render_page, PageContext};
use crate::app::state::AppState;
use crate::core::style::MapStyle;
use crate::domain::model::RenderedMap;
use crate::utils::error::{ErrorCategory, MapError, Result};
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MapForm {
    pub location: String,
    pub style: String,
}

/// GET /
pub async fn index() -> Response {
    page_response(StatusCode::OK, &PageContext::default())
}

/// POST /
///
/// 錯誤一律以同一頁面呈現，狀態碼依錯誤分類決定。
/// 無法解析的表單視為空表單。
pub async fn create_map(
    State(state): State<AppState>,
    form: std::result::Result<Form<MapForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!("⚠️  Unreadable form submission, treating as empty: {}", rejection);
            MapForm::default()
        }
    };
    let location = form.location.trim();
    let style = MapStyle::from_name(&form.style);

    match generate(&state, location, style).await {
        Ok(map) => {
            tracing::info!("✅ Map generated for '{}' ({} bytes)", map.label, map.png.len());
            page_response(
                StatusCode::OK,
                &PageContext {
                    location,
                    style,
                    error: None,
                    map: Some(&map),
                },
            )
        }
        Err(e) => {
            match e.category() {
                ErrorCategory::Input | ErrorCategory::NotFound => {
                    tracing::info!("Rejected request for '{}': {}", location, e)
                }
                ErrorCategory::Unavailable => {
                    tracing::warn!("⚠️  Service unavailable for '{}': {}", location, e)
                }
                _ => tracing::error!(
                    "❌ Map generation failed for '{}': {} (Category: {:?})",
                    location,
                    e,
                    e.category()
                ),
            }

            page_response(
                status_for(&e),
                &PageContext {
                    location,
                    style,
                    error: Some(e.user_friendly_message()),
                    map: None,
                },
            )
        }
    }
}

/// 整個請求受 `request_timeout` 限制
async fn generate(state: &AppState, location: &str, style: MapStyle) -> Result<RenderedMap> {
    let work = async {
        let resolved = state.resolver.resolve(location).await?;
        state.renderer.render_with_style(&resolved, style).await
    };

    match tokio::time::timeout(state.request_timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(MapError::RequestTimeout {
            seconds: state.request_timeout.as_secs(),
        }),
    }
}

fn page_response(status: StatusCode, ctx: &PageContext<'_>) -> Response {
    match render_page(ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("❌ Failed to render page: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(FALLBACK_PAGE.to_string()),
            )
                .into_response()
        }
    }
}

const FALLBACK_PAGE: &str = "<!DOCTYPE html>\n<html lang=\"en\"><body><h1>Pretty Maps</h1>\
<p class=\"error\">An unexpected error occurred.</p></body></html>\n";

pub fn status_for(err: &MapError) -> StatusCode {
    match err.category() {
        ErrorCategory::Input => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCategory::Rendering | ErrorCategory::Configuration | ErrorCategory::Unexpected => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
