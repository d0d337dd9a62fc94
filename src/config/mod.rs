#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliArgs;
pub use toml_config::{
    AppConfig, BoundaryConfig, FeaturesConfig, GeocoderConfig, RenderConfig, ServerConfig,
};
