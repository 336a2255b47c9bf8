//! Local metric frames for buffering geographic coordinates.
//!
//! Buffer distances are given in metres, but geographic layers store
//! degrees. Each geometry is projected into an equirectangular frame
//! centred on its own bounding box, buffered there, and projected back.
//! Distortion stays small for features spanning a few degrees of
//! latitude, which covers the census point and line classes this tool
//! targets.

use geo::{BoundingRect, Coord, Geometry, MapCoords, MultiPolygon};

/// Mean earth radius (IUGG), in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Equirectangular projection centred on a longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    lon0: f64,
    lat0: f64,
    cos_lat0: f64,
}

impl LocalFrame {
    /// Frame centred on `(lon0, lat0)`, in degrees.
    #[must_use]
    pub fn new(lon0: f64, lat0: f64) -> Self {
        Self {
            lon0,
            lat0,
            cos_lat0: lat0.to_radians().cos().max(1e-6),
        }
    }

    /// Frame centred on the bounding box of `geometry`.
    #[must_use]
    pub fn centred_on(geometry: &Geometry<f64>) -> Option<Self> {
        let rect = geometry.bounding_rect()?;
        let centre = rect.center();
        Some(Self::new(centre.x, centre.y))
    }

    /// Degrees to metres.
    #[must_use]
    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: EARTH_RADIUS_M * (c.x - self.lon0).to_radians() * self.cos_lat0,
            y: EARTH_RADIUS_M * (c.y - self.lat0).to_radians(),
        }
    }

    /// Metres back to degrees.
    #[must_use]
    pub fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: self.lon0 + (c.x / (EARTH_RADIUS_M * self.cos_lat0)).to_degrees(),
            y: self.lat0 + (c.y / EARTH_RADIUS_M).to_degrees(),
        }
    }

    /// `geometry` expressed in this frame.
    #[must_use]
    pub fn to_local(&self, geometry: &Geometry<f64>) -> Geometry<f64> {
        geometry.map_coords(|c| self.project(c))
    }

    /// `polygons` expressed back in geographic coordinates.
    #[must_use]
    pub fn to_geographic(&self, polygons: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        polygons.map_coords(|c| self.unproject(c))
    }
}

/// Returns `true` if every coordinate of `rect` lies within lon/lat bounds.
#[must_use]
pub fn looks_geographic(rect: &geo::Rect<f64>) -> bool {
    rect.min().x >= -180.0 && rect.max().x <= 180.0 && rect.min().y >= -90.0 && rect.max().y <= 90.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Buffer as _, point};

    #[test]
    fn project_round_trips() {
        let frame = LocalFrame::new(-75.7, 45.4);
        let c = Coord { x: -75.65, y: 45.43 };
        let back = frame.unproject(frame.project(c));
        assert!((back.x - c.x).abs() < 1e-9);
        assert!((back.y - c.y).abs() < 1e-9);
    }

    #[test]
    fn five_km_buffer_spans_about_a_tenth_of_a_degree() {
        let point: Geometry<f64> = point!(x: -75.7, y: 45.4).into();
        let frame = LocalFrame::centred_on(&point).unwrap();

        let buffered = frame.to_geographic(&frame.to_local(&point).buffer(5000.0));
        let rect = buffered.bounding_rect().unwrap();

        // 10 km of latitude is ~0.0899 degrees.
        assert!((rect.height() - 0.0899).abs() < 0.001, "{}", rect.height());
        assert!(rect.width() > rect.height());
    }

    #[test]
    fn lon_lat_bounds() {
        let inside = geo::Rect::new(
            Coord { x: -141.0, y: 41.0 },
            Coord { x: -52.0, y: 83.0 },
        );
        let outside = geo::Rect::new(
            Coord { x: 1_000_000.0, y: 500_000.0 },
            Coord { x: 2_000_000.0, y: 900_000.0 },
        );
        assert!(looks_geographic(&inside));
        assert!(!looks_geographic(&outside));
    }
}
