pub mod cache;
pub mod coordinates;
pub mod renderer;
pub mod resolver;
pub mod style;

pub use crate::domain::model::{
    Boundary, Coordinates, GeocodeMatch, MapFeature, MapScene, RenderedMap, ResolvedLocation,
};
pub use crate::domain::ports::{BoundaryProvider, FeatureSource, Geocoder, MapPlotter};
pub use crate::utils::error::Result;
