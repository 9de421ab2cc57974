//! GHG Geo - Geocoding and map plotting
//!
//! Resolves record locations to coordinates and renders them as markers
//! on a standalone Leaflet HTML page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use ghg_core::Result;

pub mod map;
pub mod nominatim;

pub use map::{plot_records, MapDocument, Marker};
pub use nominatim::NominatimGeocoder;

/// A point on the globe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Place-name to coordinates lookup
///
/// `Ok(None)` means the place could not be resolved; the record is then
/// left off the map.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str) -> Result<Option<Coordinates>>;
}
