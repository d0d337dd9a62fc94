use crate::adapters::geojson::to_multi_polygon;
use crate::domain::model::{Boundary, Coordinates, GeocodeMatch, LocationSource, ResolvedLocation};
use crate::domain::ports::{BoundaryProvider, Geocoder};
use crate::utils::error::{MapError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// 邊界查詢時最多比對的候選筆數
const BOUNDARY_CANDIDATES: usize = 5;

/// Nominatim 相容 API 的客戶端，同時負責地理編碼與邊界查詢
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
    reverse_zoom: u8,
}

#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    geojson: Option<Value>,
}

impl Place {
    fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            lat: self.lat.trim().parse().ok()?,
            lon: self.lon.trim().parse().ok()?,
        })
    }
}

impl NominatimClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        // Nominatim 使用政策要求辨識用的 User-Agent
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            reverse_zoom: 12,
        })
    }

    pub fn with_reverse_zoom(mut self, zoom: u8) -> Self {
        self.reverse_zoom = zoom;
        self
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!("Nominatim request: {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        tracing::debug!("Nominatim response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(MapError::GeocoderUnavailable {
                reason: format!("{} returned {}", path, status),
            });
        }

        let response = response.error_for_status()?;
        response.json().await.map_err(classify_request_error)
    }

    async fn search(&self, query: &str, limit: usize, with_polygon: bool) -> Result<Vec<Place>> {
        let mut params = vec![
            ("q", query.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", limit.to_string()),
        ];
        if with_polygon {
            params.push(("polygon_geojson", "1".to_string()));
        }

        let body = self.get_json("search", &params).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn reverse_boundary(&self, point: Coordinates) -> Result<Boundary> {
        let params = [
            ("lat", point.lat.to_string()),
            ("lon", point.lon.to_string()),
            ("zoom", self.reverse_zoom.to_string()),
            ("format", "jsonv2".to_string()),
            ("polygon_geojson", "1".to_string()),
        ];

        let body = self.get_json("reverse", &params).await?;
        if let Some(error) = body.get("error").and_then(Value::as_str) {
            return Err(MapError::BoundaryError {
                message: format!("reverse lookup failed: {}", error),
            });
        }

        body.get("geojson")
            .and_then(to_multi_polygon)
            .ok_or_else(|| MapError::BoundaryError {
                message: format!("no polygon boundary at {},{}", point.lat, point.lon),
            })
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>> {
        let places = self.search(query, 1, false).await?;

        Ok(places.into_iter().find_map(|place| {
            let coordinates = place.coordinates()?;
            Some(GeocodeMatch {
                address: place.display_name,
                coordinates,
            })
        }))
    }
}

#[async_trait]
impl BoundaryProvider for NominatimClient {
    async fn boundary(&self, location: &ResolvedLocation) -> Result<Boundary> {
        if let (LocationSource::Coordinates, Some(point)) = (location.source, location.point) {
            return self.reverse_boundary(point).await;
        }

        // 取第一筆有面狀幾何的結果
        let places = self
            .search(&location.label, BOUNDARY_CANDIDATES, true)
            .await?;
        places
            .iter()
            .filter_map(|place| place.geojson.as_ref())
            .find_map(to_multi_polygon)
            .ok_or_else(|| MapError::BoundaryError {
                message: format!("no polygon boundary for '{}'", location.label),
            })
    }
}

/// 逾時與連線失敗視為服務不可用
fn classify_request_error(err: reqwest::Error) -> MapError {
    if err.is_timeout() || err.is_connect() {
        MapError::GeocoderUnavailable {
            reason: err.to_string(),
        }
    } else {
        MapError::ApiError(err)
    }
}
