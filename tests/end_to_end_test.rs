use anyhow::Result;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use pretty_map::{AppConfig, AppState};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

fn oslo_polygon() -> serde_json::Value {
    json!({
        "type": "Polygon",
        "coordinates": [[[10.70, 59.90], [10.80, 59.90], [10.80, 59.95], [10.70, 59.95], [10.70, 59.90]]]
    })
}

fn config_for(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.geocoder.endpoint = server.base_url();
    config.geocoder.user_agent = "pretty-map-tests".to_string();
    config.features.endpoint = server.url("/api/interpreter");
    config.render.image_size = 256;
    config
}

fn build_router(config: &AppConfig) -> Router {
    let state = AppState::from_config(config).unwrap();
    pretty_map::router(state, config.request_timeout())
}

async fn post_form(router: Router, body: &str) -> Result<(StatusCode, String)> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))?;

    let response = router.oneshot(request).await?;
    let status = response.status();
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8(bytes.to_vec())?))
}

/// 從頁面中取出 base64 圖片並解碼
fn embedded_png(html: &str) -> Vec<u8> {
    let marker = "data:image/png;base64,";
    let start = html.find(marker).expect("page has no image") + marker.len();
    let end = start + html[start..].find('"').expect("unterminated data uri");
    STANDARD.decode(&html[start..end]).unwrap()
}

#[tokio::test]
async fn test_place_name_end_to_end() -> Result<()> {
    let server = MockServer::start();

    let geocode_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "Oslo")
            .query_param("limit", "1");
        then.status(200).json_body(json!([
            {"display_name": "Oslo, Norway", "lat": "59.9133301", "lon": "10.7389701"}
        ]));
    });

    let boundary_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "Oslo, Norway")
            .query_param("polygon_geojson", "1");
        then.status(200).json_body(json!([
            {"display_name": "Oslo, Norway", "lat": "59.91", "lon": "10.74", "geojson": oslo_polygon()}
        ]));
    });

    let overpass_mock = server.mock(|when, then| {
        when.method(POST).path("/api/interpreter");
        then.status(200).json_body(json!({
            "elements": [
                {"type": "way", "id": 11, "tags": {"building": "yes"},
                 "geometry": [
                    {"lat": 59.92, "lon": 10.72}, {"lat": 59.92, "lon": 10.73},
                    {"lat": 59.93, "lon": 10.73}, {"lat": 59.93, "lon": 10.72},
                    {"lat": 59.92, "lon": 10.72}
                 ]},
                {"type": "way", "id": 12, "tags": {"natural": "water"},
                 "geometry": [
                    {"lat": 59.91, "lon": 10.75}, {"lat": 59.91, "lon": 10.78},
                    {"lat": 59.94, "lon": 10.78}, {"lat": 59.91, "lon": 10.75}
                 ]},
                {"type": "node", "id": 13, "lat": 59.92, "lon": 10.75}
            ]
        }));
    });

    let config = config_for(&server);
    let router = build_router(&config);

    let (status, html) = post_form(router.clone(), "location=Oslo&style=vintage").await?;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Map of Oslo, Norway"));
    geocode_mock.assert();
    boundary_mock.assert();
    overpass_mock.assert();

    let png = embedded_png(&html);
    let img = image::load_from_memory(&png)?;
    assert_eq!((img.width(), img.height()), (256, 256));

    // 同一地點第二次請求走快取，不再呼叫地理編碼
    let (status, _) = post_form(router, "location=%20oslo%20&style=vintage").await?;
    assert_eq!(status, StatusCode::OK);
    geocode_mock.assert_hits(1);
    boundary_mock.assert_hits(2);

    Ok(())
}

#[tokio::test]
async fn test_coordinates_use_reverse_lookup() -> Result<()> {
    let server = MockServer::start();

    let search_mock = server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200).json_body(json!([]));
    });

    let reverse_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/reverse")
            .query_param("lat", "59.92")
            .query_param("lon", "10.75");
        then.status(200).json_body(json!({
            "display_name": "Oslo, Norway", "lat": "59.92", "lon": "10.75", "geojson": oslo_polygon()
        }));
    });

    let mut config = config_for(&server);
    config.features.enabled = false;
    let router = build_router(&config);

    let (status, html) = post_form(router, "location=59.92%2C10.75").await?;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Map of 59.92,10.75"));
    search_mock.assert_hits(0);
    reverse_mock.assert();

    Ok(())
}

#[tokio::test]
async fn test_unknown_place_reports_not_found() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200).json_body(json!([]));
    });

    let router = build_router(&config_for(&server));
    let (status, html) = post_form(router, "location=Atlantis").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(html.contains("Location not found."));

    Ok(())
}

#[tokio::test]
async fn test_slow_geocoder_reports_unavailable() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!([]));
    });

    let mut config = config_for(&server);
    config.geocoder.timeout_seconds = 1;
    let router = build_router(&config);

    let (status, html) = post_form(router, "location=Oslo").await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(html.contains("Geocoding service is currently unavailable. Please try again later."));

    Ok(())
}

#[tokio::test]
async fn test_missing_boundary_is_render_error_unless_fallback() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(json!({"error": "Unable to geocode"}));
    });

    let mut config = config_for(&server);
    config.features.enabled = false;

    let (status, html) = post_form(build_router(&config), "location=0%2C0").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(html.contains("Error generating map:"));

    config.boundary.fallback_radius_meters = Some(1000.0);
    let (status, html) = post_form(build_router(&config), "location=0%2C0").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("data:image/png;base64,"));

    Ok(())
}

#[tokio::test]
async fn test_boundary_backend_outage_is_render_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/search").query_param("limit", "1");
        then.status(200).json_body(json!([
            {"display_name": "Oslo, Norway", "lat": "59.9133301", "lon": "10.7389701"}
        ]));
    });
    let boundary_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("polygon_geojson", "1");
        then.status(503);
    });

    let mut config = config_for(&server);
    config.features.enabled = false;

    let (status, html) = post_form(build_router(&config), "location=Oslo").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(html.contains("Error generating map:"));
    assert!(!html.contains("Geocoding service is currently unavailable"));
    boundary_mock.assert();

    Ok(())
}

#[tokio::test]
async fn test_feature_backend_failure_is_render_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(json!({
            "display_name": "Oslo, Norway", "lat": "59.92", "lon": "10.75", "geojson": oslo_polygon()
        }));
    });
    let overpass_mock = server.mock(|when, then| {
        when.method(POST).path("/api/interpreter");
        then.status(502);
    });

    let router = build_router(&config_for(&server));
    let (status, html) = post_form(router, "location=59.92%2C10.75").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(html.contains("Error generating map:"));
    assert!(!html.contains("data:image/png"));
    overpass_mock.assert();

    Ok(())
}

#[tokio::test]
async fn test_slow_feature_backend_is_render_error() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(json!({
            "display_name": "Oslo, Norway", "lat": "59.92", "lon": "10.75", "geojson": oslo_polygon()
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path("/api/interpreter");
        then.status(200)
            .delay(Duration::from_secs(3))
            .json_body(json!({"elements": []}));
    });

    let mut config = config_for(&server);
    config.features.timeout_seconds = 1;

    let (status, html) = post_form(build_router(&config), "location=59.92%2C10.75").await?;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(html.contains("Error generating map:"));

    Ok(())
}

#[tokio::test]
async fn test_wide_boundary_draws_without_features() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reverse");
        then.status(200).json_body(json!({
            "display_name": "Norway", "lat": "62.0", "lon": "10.0",
            "geojson": {
                "type": "Polygon",
                "coordinates": [[[5.0, 58.0], [15.0, 58.0], [15.0, 66.0], [5.0, 66.0], [5.0, 58.0]]]
            }
        }));
    });
    let overpass_mock = server.mock(|when, then| {
        when.method(POST).path("/api/interpreter");
        then.status(200).json_body(json!({"elements": []}));
    });

    let router = build_router(&config_for(&server));
    let (status, html) = post_form(router, "location=62%2C10").await?;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("data:image/png;base64,"));
    overpass_mock.assert_hits(0);

    Ok(())
}
