// Adapters layer: 外部服務的具體實作 (Nominatim、Overpass、點陣繪圖)

pub mod geojson;
pub mod nominatim;
pub mod overpass;
pub mod raster;

pub use nominatim::NominatimClient;
pub use overpass::{NoFeatures, OverpassClient};
pub use raster::RasterPlotter;
