use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Location is required.")]
    MissingLocation,

    #[error("Location not found: {query}")]
    LocationNotFound { query: String },

    #[error("Geocoding service unavailable: {reason}")]
    GeocoderUnavailable { reason: String },

    #[error("Boundary lookup failed: {message}")]
    BoundaryError { message: String },

    #[error("Feature lookup failed: {message}")]
    FeatureError { message: String },

    #[error("Rendering failed: {message}")]
    RenderError { message: String },

    #[error("Request timed out after {seconds}s")]
    RequestTimeout { seconds: u64 },

    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    #[error("Image encoding failed: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

/// 錯誤分類，決定回應狀態碼與使用者訊息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    NotFound,
    Unavailable,
    Rendering,
    Configuration,
    Unexpected,
}

impl MapError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::MissingLocation => ErrorCategory::Input,
            MapError::LocationNotFound { .. } => ErrorCategory::NotFound,
            MapError::GeocoderUnavailable { .. } | MapError::RequestTimeout { .. } => {
                ErrorCategory::Unavailable
            }
            MapError::BoundaryError { .. }
            | MapError::FeatureError { .. }
            | MapError::RenderError { .. }
            | MapError::ImageError(_) => ErrorCategory::Rendering,
            MapError::ConfigError { .. } | MapError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
            MapError::ApiError(_)
            | MapError::IoError(_)
            | MapError::SerializationError(_)
            | MapError::TemplateError(_) => ErrorCategory::Unexpected,
        }
    }

    /// 顯示在頁面上的錯誤訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            MapError::MissingLocation => "Location is required.".to_string(),
            MapError::LocationNotFound { .. } => "Location not found.".to_string(),
            MapError::GeocoderUnavailable { .. } => {
                "Geocoding service is currently unavailable. Please try again later.".to_string()
            }
            MapError::RequestTimeout { .. } => {
                "The request took too long. Please try again later.".to_string()
            }
            MapError::RenderError { message } => format!("Error generating map: {}", message),
            other if other.category() == ErrorCategory::Rendering => {
                format!("Error generating map: {}", other)
            }
            other => format!("An unexpected error occurred: {}", other),
        }
    }

    /// 將渲染階段的任何失敗收斂為 `RenderError`，包含邊界查詢時的服務逾時
    pub fn into_render_error(self) -> MapError {
        match self {
            MapError::RenderError { .. } => self,
            other => MapError::RenderError {
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;
