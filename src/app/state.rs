use crate::adapters::{NoFeatures, NominatimClient, OverpassClient, RasterPlotter};
use crate::config::AppConfig;
use crate::core::renderer::MapRenderer;
use crate::core::resolver::LocationResolver;
use crate::domain::ports::FeatureSource;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// 所有 handler 共用的狀態，clone 只複製 `Arc`
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<LocationResolver>,
    pub renderer: Arc<MapRenderer>,
    /// 單一 POST 請求（地理編碼 + 繪圖）的時間上限
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(resolver: LocationResolver, renderer: MapRenderer) -> Self {
        Self {
            resolver: Arc::new(resolver),
            renderer: Arc::new(renderer),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let nominatim = Arc::new(
            NominatimClient::new(
                &config.geocoder.endpoint,
                &config.geocoder.user_agent,
                config.geocoder_timeout(),
            )?
            .with_reverse_zoom(config.boundary.reverse_zoom),
        );

        let features: Arc<dyn FeatureSource> = if config.features.enabled {
            Arc::new(
                OverpassClient::new(
                    &config.features.endpoint,
                    &config.geocoder.user_agent,
                    config.features_timeout(),
                )?
                .with_max_span(config.features.max_span_degrees),
            )
        } else {
            tracing::info!("Feature layers disabled, maps will show the boundary only");
            Arc::new(NoFeatures)
        };

        let plotter = Arc::new(RasterPlotter::new(
            config.render.image_size,
            config.render.margin,
        ));

        let resolver = LocationResolver::new(nominatim.clone(), config.geocoder.cache_size);
        let renderer = MapRenderer::new(nominatim, features, plotter)
            .with_fallback_radius(config.boundary.fallback_radius_meters);

        Ok(Self::new(resolver, renderer).with_request_timeout(config.request_timeout()))
    }
}
