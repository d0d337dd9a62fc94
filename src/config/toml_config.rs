use crate::utils::error::{MapError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub geocoder: GeocoderConfig,
    pub boundary: BoundaryConfig,
    pub features: FeaturesConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub reverse_zoom: u8,
    /// 設定後，邊界查詢失敗時改畫此半徑的圓形範圍
    pub fallback_radius_meters: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub timeout_seconds: u64,
    pub max_span_degrees: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub image_size: u32,
    pub margin: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            request_timeout_seconds: 120,
        }
    }
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("pretty-map/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 10,
            cache_size: 100,
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            reverse_zoom: 12,
            fallback_radius_meters: None,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://overpass-api.de/api/interpreter".to_string(),
            timeout_seconds: 60,
            max_span_degrees: 0.5,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            image_size: 1200,
            margin: 0.05,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MapError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NOMINATIM_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MapError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder.timeout_seconds)
    }

    pub fn features_timeout(&self) -> Duration {
        Duration::from_secs(self.features.timeout_seconds)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_positive_number(
            "server.request_timeout_seconds",
            self.server.request_timeout_seconds,
            1,
        )?;

        validate_url("geocoder.endpoint", &self.geocoder.endpoint)?;
        validate_non_empty_string("geocoder.user_agent", &self.geocoder.user_agent)?;
        validate_positive_number("geocoder.timeout_seconds", self.geocoder.timeout_seconds, 1)?;

        validate_range("boundary.reverse_zoom", self.boundary.reverse_zoom, 3, 18)?;
        if let Some(radius) = self.boundary.fallback_radius_meters {
            validate_range("boundary.fallback_radius_meters", radius, 10.0, 50_000.0)?;
        }

        if self.features.enabled {
            validate_url("features.endpoint", &self.features.endpoint)?;
            validate_positive_number("features.timeout_seconds", self.features.timeout_seconds, 1)?;
            validate_range("features.max_span_degrees", self.features.max_span_degrees, 0.0, 10.0)?;
        }

        validate_range("render.image_size", self.render.image_size, 64, 4096)?;
        validate_range("render.margin", self.render.margin, 0.0, 0.45)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}
