use geo_types::{MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// 地理編碼服務回傳的第一筆結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeMatch {
    pub address: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Coordinates,
    Geocoded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// 座標輸入時為原字串，否則為正規地址
    pub label: String,
    pub point: Option<Coordinates>,
    pub source: LocationSource,
}

impl ResolvedLocation {
    pub fn from_coordinates(input: &str, coordinates: Coordinates) -> Self {
        Self {
            label: input.to_string(),
            point: Some(coordinates),
            source: LocationSource::Coordinates,
        }
    }

    pub fn from_match(found: GeocodeMatch) -> Self {
        Self {
            label: found.address,
            point: Some(found.coordinates),
            source: LocationSource::Geocoded,
        }
    }
}

pub type Boundary = MultiPolygon<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Water,
    Green,
    Forest,
    Building,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature {
    pub id: u64,
    pub kind: FeatureKind,
    pub polygon: Polygon<f64>,
}

/// 交給繪圖器的一次渲染內容
#[derive(Debug, Clone)]
pub struct MapScene {
    pub boundary: Boundary,
    pub features: Vec<MapFeature>,
}

#[derive(Debug, Clone)]
pub struct RenderedMap {
    pub label: String,
    pub png: Vec<u8>,
}
