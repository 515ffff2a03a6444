//! Conversion between geographic coordinates and map-image percentages
//!
//! The map image is framed by [`MapBounds`]. Percentages follow image
//! conventions: `x` runs west to east, `y` runs north to south, and both live
//! in `[0, 100]`. Both directions clamp, so the result always lies on the map.
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PERCENT_MIN: f64 = 0.0;
pub const PERCENT_MAX: f64 = 100.0;

#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("map bounds must be finite numbers")]
    NonFinite,

    #[error("north ({north}) must be greater than south ({south})")]
    InvertedLatitude { north: f64, south: f64 },

    #[error("east ({east}) must be greater than west ({west})")]
    InvertedLongitude { east: f64, west: f64 },
}

/// Geographic frame of the map image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPercent {
    pub x: f64,
    pub y: f64,
}

impl MapBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, CoordinateError> {
        if ![north, south, east, west].iter().all(|v| v.is_finite()) {
            return Err(CoordinateError::NonFinite);
        }
        if north <= south {
            return Err(CoordinateError::InvertedLatitude { north, south });
        }
        if east <= west {
            return Err(CoordinateError::InvertedLongitude { east, west });
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Percent-of-image frame, the default for maps without real geography
    pub fn image_frame() -> Self {
        Self {
            north: PERCENT_MAX,
            south: PERCENT_MIN,
            east: PERCENT_MAX,
            west: PERCENT_MIN,
        }
    }

    fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    fn lng_span(&self) -> f64 {
        self.east - self.west
    }
}

/// Clamp a percentage into `[0, 100]`; NaN becomes 0
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return PERCENT_MIN;
    }
    value.clamp(PERCENT_MIN, PERCENT_MAX)
}

/// Round to `places` decimals for response payloads
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Geographic point to map percentage, clamped onto the image
pub fn to_percent(bounds: &MapBounds, point: LatLng) -> MapPercent {
    let x = (point.lng - bounds.west) / bounds.lng_span() * PERCENT_MAX;
    let y = (bounds.north - point.lat) / bounds.lat_span() * PERCENT_MAX;

    MapPercent {
        x: clamp_percent(x),
        y: clamp_percent(y),
    }
}

/// Map percentage to geographic point; input is clamped first
pub fn to_lat_lng(bounds: &MapBounds, percent: MapPercent) -> LatLng {
    let x = clamp_percent(percent.x) / PERCENT_MAX;
    let y = clamp_percent(percent.y) / PERCENT_MAX;

    LatLng {
        lat: bounds.north - y * bounds.lat_span(),
        lng: bounds.west + x * bounds.lng_span(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn world() -> MapBounds {
        MapBounds::new(85.0, -85.0, 180.0, -180.0).unwrap()
    }

    #[test]
    fn rejects_degenerate_bounds() {
        assert_eq!(
            MapBounds::new(10.0, 10.0, 5.0, 0.0),
            Err(CoordinateError::InvertedLatitude {
                north: 10.0,
                south: 10.0
            })
        );
        assert!(matches!(
            MapBounds::new(10.0, 0.0, -5.0, 0.0),
            Err(CoordinateError::InvertedLongitude { .. })
        ));
        assert_eq!(
            MapBounds::new(f64::NAN, 0.0, 1.0, 0.0),
            Err(CoordinateError::NonFinite)
        );
        assert_eq!(
            MapBounds::new(f64::INFINITY, 0.0, 1.0, 0.0),
            Err(CoordinateError::NonFinite)
        );
    }

    #[test]
    fn corners_map_to_image_corners() {
        let bounds = world();
        let top_left = to_percent(&bounds, LatLng { lat: 85.0, lng: -180.0 });
        assert_eq!(top_left, MapPercent { x: 0.0, y: 0.0 });

        let bottom_right = to_percent(&bounds, LatLng { lat: -85.0, lng: 180.0 });
        assert_eq!(bottom_right, MapPercent { x: 100.0, y: 100.0 });

        let centre = to_percent(&bounds, LatLng { lat: 0.0, lng: 0.0 });
        assert!((centre.x - 50.0).abs() < EPS);
        assert!((centre.y - 50.0).abs() < EPS);
    }

    #[test]
    fn transform_is_its_own_inverse_inside_bounds() {
        let bounds = MapBounds::new(62.5, 12.25, 40.0, -17.75).unwrap();
        let samples = [
            LatLng { lat: 12.25, lng: -17.75 },
            LatLng { lat: 62.5, lng: 40.0 },
            LatLng { lat: 33.3333, lng: 1.0 },
            LatLng { lat: 50.0, lng: -10.123456 },
        ];

        for point in samples {
            let back = to_lat_lng(&bounds, to_percent(&bounds, point));
            assert!((back.lat - point.lat).abs() < EPS, "{point:?} -> {back:?}");
            assert!((back.lng - point.lng).abs() < EPS, "{point:?} -> {back:?}");
        }
    }

    #[test]
    fn percent_round_trip() {
        let bounds = world();
        let percent = MapPercent { x: 12.5, y: 87.25 };
        let back = to_percent(&bounds, to_lat_lng(&bounds, percent));
        assert!((back.x - percent.x).abs() < EPS);
        assert!((back.y - percent.y).abs() < EPS);
    }

    #[test]
    fn points_outside_bounds_clamp_to_edges() {
        let bounds = world();
        let p = to_percent(&bounds, LatLng { lat: 90.0, lng: 200.0 });
        assert_eq!(p, MapPercent { x: 100.0, y: 0.0 });

        let q = to_lat_lng(&bounds, MapPercent { x: -20.0, y: 140.0 });
        assert_eq!(q, LatLng { lat: -85.0, lng: -180.0 });
    }

    #[test]
    fn image_frame_is_identity_on_axes() {
        let bounds = MapBounds::image_frame();
        let p = to_percent(&bounds, LatLng { lat: 25.0, lng: 40.0 });
        assert!((p.x - 40.0).abs() < EPS);
        assert!((p.y - 75.0).abs() < EPS);
    }

    #[test]
    fn clamp_and_round_helpers() {
        assert_eq!(clamp_percent(-1.0), 0.0);
        assert_eq!(clamp_percent(100.5), 100.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(round_to(12.3456789, 6), 12.345679);
        assert_eq!(round_to(-0.125, 2), -0.13);
    }
}
