use crate::core::style::MapStyle;
use crate::domain::model::{Boundary, Coordinates, MapScene, RenderedMap, ResolvedLocation};
use crate::domain::ports::{BoundaryProvider, FeatureSource, MapPlotter};
use crate::utils::error::{MapError, Result};
use geo::BoundingRect;
use geo_types::{LineString, MultiPolygon, Polygon};
use std::sync::Arc;

const METERS_PER_DEGREE: f64 = 111_320.0;
const CIRCLE_SEGMENTS: usize = 64;

pub struct MapRenderer {
    boundaries: Arc<dyn BoundaryProvider>,
    features: Arc<dyn FeatureSource>,
    plotter: Arc<dyn MapPlotter>,
    fallback_radius_meters: Option<f64>,
}

impl MapRenderer {
    pub fn new(
        boundaries: Arc<dyn BoundaryProvider>,
        features: Arc<dyn FeatureSource>,
        plotter: Arc<dyn MapPlotter>,
    ) -> Self {
        Self {
            boundaries,
            features,
            plotter,
            fallback_radius_meters: None,
        }
    }

    /// 邊界查詢失敗時改用以該點為圓心的圓形範圍；`None` 表示直接失敗
    pub fn with_fallback_radius(mut self, radius_meters: Option<f64>) -> Self {
        self.fallback_radius_meters = radius_meters;
        self
    }

    pub async fn render(&self, location: &ResolvedLocation, style_name: &str) -> Result<RenderedMap> {
        let style = MapStyle::from_name(style_name);
        self.render_with_style(location, style).await
    }

    pub async fn render_with_style(
        &self,
        location: &ResolvedLocation,
        style: MapStyle,
    ) -> Result<RenderedMap> {
        tracing::info!("🗺️  Rendering '{}' with {} style", location.label, style.name());

        let boundary = self.lookup_boundary(location).await?;
        let area = boundary.bounding_rect().ok_or_else(|| MapError::RenderError {
            message: "boundary has no extent".to_string(),
        })?;

        let features = self
            .features
            .features(area)
            .await
            .map_err(MapError::into_render_error)?;
        tracing::debug!("Fetched {} map features", features.len());

        let scene = MapScene { boundary, features };
        let plotter = Arc::clone(&self.plotter);
        let preset = style.preset();

        // 點陣化屬於 CPU 工作，移出 async 執行緒
        let png = tokio::task::spawn_blocking(move || plotter.plot(&scene, preset))
            .await
            .map_err(|e| MapError::RenderError {
                message: format!("render task failed: {}", e),
            })?
            .map_err(MapError::into_render_error)?;

        tracing::debug!("Rendered PNG ({} bytes)", png.len());

        Ok(RenderedMap {
            label: location.label.clone(),
            png,
        })
    }

    async fn lookup_boundary(&self, location: &ResolvedLocation) -> Result<Boundary> {
        match self.boundaries.boundary(location).await {
            Ok(boundary) if !boundary.0.is_empty() => Ok(boundary),
            Ok(_) => self.fallback(
                location,
                MapError::BoundaryError {
                    message: format!("no boundary polygon for '{}'", location.label),
                },
            ),
            Err(e) => self.fallback(location, e),
        }
    }

    fn fallback(&self, location: &ResolvedLocation, err: MapError) -> Result<Boundary> {
        match (self.fallback_radius_meters, location.point) {
            (Some(radius), Some(point)) => {
                tracing::warn!(
                    "⚠️  Boundary lookup for '{}' failed ({}), using {}m radius",
                    location.label,
                    err,
                    radius
                );
                Ok(circle_boundary(point, radius))
            }
            _ => Err(err.into_render_error()),
        }
    }
}

pub fn circle_boundary(center: Coordinates, radius_meters: f64) -> Boundary {
    let dlat = radius_meters / METERS_PER_DEGREE;
    let dlon = radius_meters / (METERS_PER_DEGREE * center.lat.to_radians().cos().max(0.01));

    let mut ring: Vec<(f64, f64)> = (0..CIRCLE_SEGMENTS)
        .map(|i| {
            let theta = i as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
            (center.lon + dlon * theta.cos(), center.lat + dlat * theta.sin())
        })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }

    MultiPolygon::new(vec![Polygon::new(LineString::from(ring), vec![])])
}
