//! Pixel to geographic conversion for a circular viewport over a horizontally
//! scrolling equirectangular texture.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Size of one globe viewport and the texture scrolled behind it.
///
/// Always non-degenerate: construction rejects zero or non-finite sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportGeometry {
    width_px: f64,
    height_px: f64,
    texture_width_px: f64,
    texture_height_px: f64,
}

impl ViewportGeometry {
    pub fn new(
        width_px: f64,
        height_px: f64,
        texture_width_px: f64,
        texture_height_px: f64,
    ) -> Result<Self, GeometryError> {
        if !is_positive(width_px) || !is_positive(height_px) {
            return Err(GeometryError::EmptyViewport {
                width: width_px,
                height: height_px,
            });
        }
        if !is_positive(texture_width_px) || !is_positive(texture_height_px) {
            return Err(GeometryError::EmptyTexture {
                width: texture_width_px,
                height: texture_height_px,
            });
        }

        Ok(Self {
            width_px,
            height_px,
            texture_width_px,
            texture_height_px,
        })
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    pub fn texture_width_px(&self) -> f64 {
        self.texture_width_px
    }

    pub fn texture_height_px(&self) -> f64 {
        self.texture_height_px
    }

    /// Radius of the circle inscribed in the viewport width.
    pub fn radius_px(&self) -> f64 {
        self.width_px / 2.0
    }

    /// Whether a viewport-relative point lies on the circular globe face.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.width_px / 2.0;
        let dy = y - self.height_px / 2.0;
        dx.hypot(dy) <= self.radius_px()
    }
}

fn is_positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Resolve a click on the globe face to latitude/longitude.
///
/// `click_x`/`click_y` are relative to the viewport's top-left corner and
/// `scroll_offset_px` is the texture column drawn at the viewport's left edge.
/// Returns `None` for clicks outside the inscribed circle.
pub fn pixel_to_lat_lon(
    click_x: f64,
    click_y: f64,
    scroll_offset_px: f64,
    geometry: &ViewportGeometry,
) -> Option<GeoPoint> {
    if !geometry.contains(click_x, click_y) {
        return None;
    }

    let texture_x = wrap_offset(scroll_offset_px + click_x, geometry.texture_width_px);
    let lon = normalize_longitude((texture_x / geometry.texture_width_px) * 360.0 - 180.0);
    let lat = (90.0 - (click_y / geometry.texture_height_px) * 180.0).clamp(-90.0, 90.0);

    Some(GeoPoint { lat, lon })
}

/// Bring a longitude into [-180, 180], unwrapping across the antimeridian.
pub fn normalize_longitude(lon: f64) -> f64 {
    if !lon.is_finite() || (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Non-negative modulo, `((x % m) + m) % m`, kept strictly below `modulus`.
pub fn wrap_offset(x: f64, modulus: f64) -> f64 {
    let wrapped = x.rem_euclid(modulus);
    // rem_euclid rounds tiny negative inputs up to `modulus` itself
    if wrapped >= modulus { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thumbnail() -> ViewportGeometry {
        ViewportGeometry::new(250.0, 250.0, 500.0, 250.0).expect("valid geometry")
    }

    #[test]
    fn zero_sized_geometry_is_rejected() {
        assert!(matches!(
            ViewportGeometry::new(0.0, 250.0, 500.0, 250.0),
            Err(GeometryError::EmptyViewport { .. })
        ));
        assert!(matches!(
            ViewportGeometry::new(250.0, 250.0, 500.0, 0.0),
            Err(GeometryError::EmptyTexture { .. })
        ));
        assert!(ViewportGeometry::new(f64::NAN, 250.0, 500.0, 250.0).is_err());
    }

    #[test]
    fn clicks_outside_the_face_are_rejected() {
        let g = thumbnail();
        // corners of the square viewport
        for (x, y) in [(0.0, 0.0), (250.0, 0.0), (0.0, 250.0), (250.0, 250.0), (5.0, 5.0)] {
            assert_eq!(pixel_to_lat_lon(x, y, 0.0, &g), None, "({x}, {y})");
        }
        // just past the edge along the horizontal axis
        assert_eq!(pixel_to_lat_lon(250.5, 125.0, 0.0, &g), None);
        assert_eq!(pixel_to_lat_lon(-0.5, 125.0, 0.0, &g), None);
    }

    #[test]
    fn center_click_without_scroll() {
        let g = thumbnail();
        let p = pixel_to_lat_lon(125.0, 125.0, 0.0, &g).expect("inside face");
        assert!((p.lon - -90.0).abs() < 1e-9);
        assert!(p.lat.abs() < 1e-9);
    }

    #[test]
    fn scroll_offset_shifts_longitude() {
        let g = thumbnail();
        // 250 px of a 500 px texture is half a turn
        let p = pixel_to_lat_lon(125.0, 125.0, 250.0, &g).expect("inside face");
        assert!((p.lon - 90.0).abs() < 1e-9);
    }

    #[test]
    fn texture_wrap_lands_in_range() {
        let g = thumbnail();
        let p = pixel_to_lat_lon(125.0, 125.0, 499.0, &g).expect("inside face");
        assert!((-180.0..=180.0).contains(&p.lon));
        assert!((p.lon - (-180.0 + 124.0 / 500.0 * 360.0)).abs() < 1e-9);
    }

    #[test]
    fn longitude_always_in_range_for_any_offset() {
        let g = thumbnail();
        let mut offset = -12_345.5;
        while offset < 12_345.5 {
            for x in [0.0, 40.0, 125.0, 210.0, 250.0] {
                if let Some(p) = pixel_to_lat_lon(x, 125.0, offset, &g) {
                    assert!((-180.0..=180.0).contains(&p.lon), "offset {offset} x {x}");
                }
            }
            offset += 97.3;
        }
    }

    #[test]
    fn latitude_spans_poles() {
        let g = thumbnail();
        let north = pixel_to_lat_lon(125.0, 0.0, 0.0, &g).expect("top of face");
        let south = pixel_to_lat_lon(125.0, 250.0, 0.0, &g).expect("bottom of face");
        assert!((north.lat - 90.0).abs() < 1e-9);
        assert!((south.lat + 90.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_longitude_unwraps() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-190.0), 170.0);
        assert_eq!(normalize_longitude(540.0), -180.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(-180.0), -180.0);
        assert_eq!(normalize_longitude(45.0), 45.0);
    }

    #[test]
    fn wrap_offset_is_non_negative() {
        assert_eq!(wrap_offset(-10.0, 500.0), 490.0);
        assert_eq!(wrap_offset(510.0, 500.0), 10.0);
        assert_eq!(wrap_offset(-1e-17, 500.0), 0.0);
        assert_eq!(wrap_offset(500.0, 500.0), 0.0);
    }
}
