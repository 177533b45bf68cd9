//! Point markers for requests and kiosks. No geospatial logic.

use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use cleanify_types::models::{Kiosk, RequestStatus, WasteRequest};

/// Karachi city centre.
pub const DEFAULT_CENTER: (f64, f64) = (24.8607, 67.0011);
pub const DEFAULT_ZOOM: u8 = 12;

pub const COMPLETED_COLOR: &str = "#22c55e";
pub const ASSIGNED_COLOR: &str = "#f59e0b";
pub const OPEN_COLOR: &str = "#3b82f6";
pub const KIOSK_COLOR: &str = "#8b5cf6";

pub fn status_color(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Completed => COMPLETED_COLOR,
        RequestStatus::Assigned => ASSIGNED_COLOR,
        _ => OPEN_COLOR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Request,
    Kiosk,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: Uuid,
    pub kind: MarkerKind,
    pub latitude: f64,
    pub longitude: f64,
    pub color: &'static str,
    pub label: String,
}

/// Requests without both coordinates are skipped.
pub fn request_markers(requests: &[WasteRequest]) -> Vec<MapMarker> {
    requests
        .iter()
        .filter_map(|r| {
            let (latitude, longitude) = r.location()?;
            let label = match &r.address {
                Some(addr) => format!("{} bags - {} - {}", r.number_of_bags, r.status, addr),
                None => format!("{} bags - {}", r.number_of_bags, r.status),
            };
            Some(MapMarker {
                id: r.id,
                kind: MarkerKind::Request,
                latitude,
                longitude,
                color: status_color(r.status),
                label,
            })
        })
        .collect()
}

/// Inactive kiosks are left off the map.
pub fn kiosk_markers(kiosks: &[Kiosk]) -> Vec<MapMarker> {
    kiosks
        .iter()
        .filter(|k| k.is_active != Some(false))
        .map(|k| MapMarker {
            id: k.id,
            kind: MarkerKind::Kiosk,
            latitude: k.latitude,
            longitude: k.longitude,
            color: KIOSK_COLOR,
            label: format!("{} - {}", k.name, k.address),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: (f64, f64),
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

impl Default for MapView {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MapView {
    pub fn new(markers: Vec<MapMarker>) -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            markers,
        }
    }

    /// GeoJSON `FeatureCollection`. Coordinates are `[longitude, latitude]`.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .markers
            .iter()
            .map(|m| {
                json!({
                    "type": "Feature",
                    "id": m.id,
                    "geometry": {
                        "type": "Point",
                        "coordinates": [m.longitude, m.latitude],
                    },
                    "properties": {
                        "kind": m.kind,
                        "color": m.color,
                        "label": m.label,
                    },
                })
            })
            .collect();

        json!({
            "type": "FeatureCollection",
            "features": features,
        })
    }
}
