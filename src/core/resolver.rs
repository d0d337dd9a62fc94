use crate::core::cache::{normalize_key, GeocodeCache};
use crate::core::coordinates::parse_coordinates;
use crate::domain::model::ResolvedLocation;
use crate::domain::ports::Geocoder;
use crate::utils::error::{MapError, Result};
use std::sync::Arc;

pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    cache: GeocodeCache,
}

impl LocationResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, cache_size: usize) -> Self {
        Self {
            geocoder,
            cache: GeocodeCache::new(cache_size),
        }
    }

    /// 座標字串原樣回傳；其他文字送地理編碼，取第一筆的正規地址。
    ///
    /// 每個請求只呼叫一次服務，不重試。
    pub async fn resolve(&self, input: &str) -> Result<ResolvedLocation> {
        let query = input.trim();
        if query.is_empty() {
            return Err(MapError::MissingLocation);
        }

        if let Some(coordinates) = parse_coordinates(query) {
            tracing::debug!("Input '{}' is a coordinate pair, skipping geocoder", query);
            return Ok(ResolvedLocation::from_coordinates(query, coordinates));
        }

        let key = normalize_key(query);
        let found = match self.cache.get(&key) {
            Some(cached) => {
                tracing::debug!("Geocode cache hit for '{}'", key);
                cached
            }
            None => {
                let found = self.geocoder.geocode(query).await?;
                self.cache.insert(key, found.clone());
                found
            }
        };

        match found {
            Some(found) => {
                tracing::info!("📍 Resolved '{}' to '{}'", query, found.address);
                Ok(ResolvedLocation::from_match(found))
            }
            None => Err(MapError::LocationNotFound {
                query: query.to_string(),
            }),
        }
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}
