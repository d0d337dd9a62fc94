use crate::domain::model::{FeatureKind, MapFeature};
use crate::domain::ports::FeatureSource;
use crate::utils::error::{MapError, Result};
use async_trait::async_trait;
use geo_types::{Coord, LineString, Polygon, Rect};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OverpassClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    max_span_degrees: f64,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
struct Element {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    geometry: Vec<NodePosition>,
}

#[derive(Debug, Deserialize)]
struct NodePosition {
    lat: f64,
    lon: f64,
}

impl OverpassClient {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            timeout_seconds: timeout.as_secs().max(1),
            max_span_degrees: 0.5,
        })
    }

    /// 超過此範圍的區域不抓圖層，只畫邊界
    pub fn with_max_span(mut self, degrees: f64) -> Self {
        self.max_span_degrees = degrees;
        self
    }

    pub fn build_query(&self, area: Rect<f64>) -> String {
        // Overpass bbox 順序為 south,west,north,east
        let bbox = format!(
            "{},{},{},{}",
            area.min().y,
            area.min().x,
            area.max().y,
            area.max().x
        );

        format!(
            r#"[out:json][timeout:{timeout}];
(
  way["building"]({bbox});
  way["natural"~"^(water|bay|wood|grassland|heath)$"]({bbox});
  way["waterway"="riverbank"]({bbox});
  way["landuse"~"^(reservoir|basin|forest|grass|meadow|recreation_ground|village_green)$"]({bbox});
  way["leisure"~"^(park|garden|pitch|playground|nature_reserve)$"]({bbox});
);
out geom;"#,
            timeout = self.timeout_seconds,
            bbox = bbox
        )
    }
}

#[async_trait]
impl FeatureSource for OverpassClient {
    async fn features(&self, area: Rect<f64>) -> Result<Vec<MapFeature>> {
        if area.width() > self.max_span_degrees || area.height() > self.max_span_degrees {
            tracing::info!(
                "Area {:.3}°x{:.3}° exceeds feature span limit, drawing boundary only",
                area.width(),
                area.height()
            );
            return Ok(vec![]);
        }

        let query = self.build_query(area);
        tracing::debug!("Overpass request to {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("data", query)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapError::FeatureError {
                message: format!("Overpass returned {}", status),
            });
        }

        let body: OverpassResponse = response.json().await?;
        let features: Vec<MapFeature> = body.elements.into_iter().filter_map(to_feature).collect();
        tracing::debug!("Overpass returned {} usable features", features.len());

        Ok(features)
    }
}

/// 停用圖層時使用，永遠回傳空集合
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFeatures;

#[async_trait]
impl FeatureSource for NoFeatures {
    async fn features(&self, _area: Rect<f64>) -> Result<Vec<MapFeature>> {
        Ok(vec![])
    }
}

fn to_feature(element: Element) -> Option<MapFeature> {
    if element.kind != "way" {
        return None;
    }
    let kind = classify(&element.tags)?;

    let coords: Vec<Coord<f64>> = element
        .geometry
        .iter()
        .map(|node| Coord {
            x: node.lon,
            y: node.lat,
        })
        .collect();

    // 只收封閉的 way
    if coords.len() < 4 || coords.first() != coords.last() {
        return None;
    }

    Some(MapFeature {
        id: element.id,
        kind,
        polygon: Polygon::new(LineString::new(coords), vec![]),
    })
}

pub fn classify(tags: &HashMap<String, String>) -> Option<FeatureKind> {
    let tag = |key: &str| tags.get(key).map(String::as_str);

    if tag("building").is_some() {
        return Some(FeatureKind::Building);
    }

    match (tag("natural"), tag("landuse"), tag("leisure"), tag("waterway")) {
        (Some("water" | "bay"), _, _, _)
        | (_, Some("reservoir" | "basin"), _, _)
        | (_, _, _, Some("riverbank")) => Some(FeatureKind::Water),
        (Some("wood"), _, _, _) | (_, Some("forest"), _, _) => Some(FeatureKind::Forest),
        (Some("grassland" | "heath"), _, _, _)
        | (_, Some("grass" | "meadow" | "recreation_ground" | "village_green"), _, _)
        | (_, _, Some("park" | "garden" | "pitch" | "playground" | "nature_reserve"), _) => {
            Some(FeatureKind::Green)
        }
        _ => None,
    }
}
