use crate::core::style::StylePreset;
use crate::domain::model::{Boundary, GeocodeMatch, MapFeature, MapScene, ResolvedLocation};
use crate::utils::error::Result;
use async_trait::async_trait;
use geo_types::Rect;

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// 只取第一筆結果，查無資料回傳 `None`
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeMatch>>;
}

#[async_trait]
pub trait BoundaryProvider: Send + Sync {
    async fn boundary(&self, location: &ResolvedLocation) -> Result<Boundary>;
}

#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn features(&self, area: Rect<f64>) -> Result<Vec<MapFeature>>;
}

pub trait MapPlotter: Send + Sync {
    /// 回傳 PNG 位元組
    fn plot(&self, scene: &MapScene, style: &StylePreset) -> Result<Vec<u8>>;
}
