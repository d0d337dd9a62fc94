pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliArgs;

pub use app::{router, AppState};
pub use config::AppConfig;
pub use crate::core::{renderer::MapRenderer, resolver::LocationResolver, style::MapStyle};
pub use utils::error::{MapError, Result};
