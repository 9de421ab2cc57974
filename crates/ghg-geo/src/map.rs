//! Map plotting
//!
//! Geocodes each record's location and renders one marker per resolved
//! record on a Leaflet map.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use ghg_core::{FinalRecord, GhgError, MapConfig, Result};

use crate::{Coordinates, Geocoder};

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>Company Emissions Map</title>
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<style>html, body, #map { height: 100%; margin: 0; }</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map("map").setView([__CENTER_LAT__, __CENTER_LON__], __ZOOM__);
L.tileLayer("https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png", {
  attribution: "&copy; OpenStreetMap contributors"
}).addTo(map);
var markers = __MARKERS__;
markers.forEach(function (m) {
  L.marker([m.lat, m.lon]).bindPopup(m.popup).addTo(map);
});
</script>
</body>
</html>
"#;

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// One plotted record
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub coordinates: Coordinates,
    pub record: FinalRecord,
}

impl Marker {
    /// Popup body with every field HTML-escaped
    pub fn popup_html(&self) -> String {
        format!(
            "<b>Company:</b> {}<br><b>Location:</b> {}<br><b>Year:</b> {}<br><b>CO\u{2082} Emission:</b> {}",
            escape_html(&self.record.company),
            escape_html(&self.record.location),
            escape_html(&self.record.year),
            escape_html(&self.record.emission),
        )
    }
}

#[derive(Serialize)]
struct MarkerJs {
    lat: f64,
    lon: f64,
    popup: String,
}

/// A map ready to be written as HTML
#[derive(Debug, Clone)]
pub struct MapDocument {
    config: MapConfig,
    markers: Vec<Marker>,
}

impl MapDocument {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            markers: Vec::new(),
        }
    }

    pub fn add_marker(&mut self, marker: Marker) {
        self.markers.push(marker);
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Render a standalone Leaflet page
    pub fn to_html(&self) -> Result<String> {
        let markers: Vec<MarkerJs> = self
            .markers
            .iter()
            .map(|m| MarkerJs {
                lat: m.coordinates.lat,
                lon: m.coordinates.lon,
                popup: m.popup_html(),
            })
            .collect();

        // `</` inside a script block would close it early
        let markers_json = serde_json::to_string(&markers)
            .map_err(|e| GhgError::ExportError(e.to_string()))?
            .replace("</", "<\\/");

        Ok(TEMPLATE
            .replace("__CENTER_LAT__", &self.config.center_lat.to_string())
            .replace("__CENTER_LON__", &self.config.center_lon.to_string())
            .replace("__ZOOM__", &self.config.zoom.to_string())
            .replace("__MARKERS__", &markers_json))
    }

    /// Write the page to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_html()?)?;
        Ok(())
    }
}

/// Geocode records and build a map
///
/// Records without a location are skipped without a lookup. Each distinct
/// location is looked up once; unresolved locations are left off the map.
pub async fn plot_records(
    records: &[FinalRecord],
    geocoder: &dyn Geocoder,
    config: &MapConfig,
) -> Result<MapDocument> {
    let mut map = MapDocument::new(config.clone());
    let mut resolved: HashMap<String, Option<Coordinates>> = HashMap::new();

    for record in records {
        let place = record.location.trim();
        if place.is_empty() {
            tracing::debug!("No location for {:?}, not plotted", record.company);
            continue;
        }

        let coordinates = match resolved.get(place) {
            Some(cached) => *cached,
            None => {
                let found = geocoder.geocode(place).await?;
                resolved.insert(place.to_string(), found);
                found
            }
        };

        match coordinates {
            Some(coordinates) => map.add_marker(Marker {
                coordinates,
                record: record.clone(),
            }),
            None => tracing::debug!("Could not place {:?} at {:?}", record.company, place),
        }
    }

    tracing::info!(
        "Plotted {} of {} records ({} distinct locations)",
        map.markers.len(),
        records.len(),
        resolved.len()
    );

    Ok(map)
}
