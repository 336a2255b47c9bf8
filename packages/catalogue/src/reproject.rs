//! Reprojection of projected shapefile coordinates to WGS 84.
//!
//! The projection of a `.prj` is rebuilt as a geodesy operator and run in
//! inverse. Lambert conformal conic and transverse Mercator references are
//! understood. No datum shift is applied, so NAD 83 coordinates land
//! within about a metre of their WGS 84 position.

use geo::{Coord, Geometry, MapCoords as _};
use geodesy::Direction;
use geodesy::prelude::*;
use gdb_coverage_models::SpatialReference;

/// Inverse projection from one projected reference to WGS 84 degrees.
pub struct ToWgs84 {
    context: Minimal,
    operation: OpHandle,
    definition: String,
    unit_metres: f64,
}

impl std::fmt::Debug for ToWgs84 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToWgs84")
            .field("definition", &self.definition)
            .field("unit_metres", &self.unit_metres)
            .finish_non_exhaustive()
    }
}

impl ToWgs84 {
    /// Builds the inverse projection for `spatial_ref`.
    ///
    /// Returns `Ok(None)` for geographic or unknown references, which need
    /// no reprojection.
    ///
    /// # Errors
    ///
    /// Returns [`ReprojectError::UnsupportedProjection`] for projections
    /// other than Lambert conformal conic and transverse Mercator, and
    /// [`ReprojectError::Definition`] if geodesy rejects the parameters.
    pub fn from_spatial_ref(spatial_ref: &SpatialReference) -> Result<Option<Self>, ReprojectError> {
        if spatial_ref.is_geographic() != Some(false) {
            return Ok(None);
        }
        let Some(wkt) = spatial_ref.wkt.as_deref() else {
            return Ok(None);
        };

        let unit_metres = spatial_ref.linear_unit_metres();
        let definition = definition(wkt, unit_metres)?;
        log::debug!(
            "Reprojecting {} with `{definition}`",
            spatial_ref.name().unwrap_or("<unnamed>")
        );

        let mut context = Minimal::new();
        let operation = context
            .op(&definition)
            .map_err(|e| ReprojectError::Definition(format!("{definition}: {e}")))?;

        Ok(Some(Self {
            context,
            operation,
            definition,
            unit_metres,
        }))
    }

    /// Converts one projected coordinate to lon/lat degrees.
    ///
    /// # Errors
    ///
    /// Returns [`ReprojectError::Coordinate`] if the inverse has no finite
    /// result for `coord`.
    pub fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>, ReprojectError> {
        let mut data = [Coor2D([coord.x * self.unit_metres, coord.y * self.unit_metres])];
        let converted = self
            .context
            .apply(self.operation, Direction::Inv, &mut data)
            .map_err(|e| ReprojectError::Definition(e.to_string()))?;

        let [lon, lat] = data[0].0;
        if converted != 1 || !lon.is_finite() || !lat.is_finite() {
            return Err(ReprojectError::Coordinate {
                x: coord.x,
                y: coord.y,
            });
        }

        Ok(Coord {
            x: lon.to_degrees(),
            y: lat.to_degrees(),
        })
    }

    /// Converts every coordinate of `geometry`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first coordinate that cannot be converted.
    pub fn geometry(&self, geometry: &Geometry<f64>) -> Result<Geometry<f64>, ReprojectError> {
        geometry.try_map_coords(|c| self.coord(c))
    }
}

/// Errors from reprojecting shapefile coordinates.
#[derive(Debug, thiserror::Error)]
pub enum ReprojectError {
    /// The `.prj` names a projection with no inverse here.
    #[error("Unsupported projection {0}")]
    UnsupportedProjection(String),

    /// geodesy rejected the operator built from the `.prj`.
    #[error("Invalid projection definition {0}")]
    Definition(String),

    /// A coordinate has no WGS 84 position.
    #[error("Coordinate ({x}, {y}) cannot be reprojected")]
    Coordinate {
        /// Projected x.
        x: f64,
        /// Projected y.
        y: f64,
    },
}

/// geodesy operator for the `PROJCS` in `wkt`, with false origins in
/// metres.
fn definition(wkt: &str, unit_metres: f64) -> Result<String, ReprojectError> {
    let projection = quoted_after(wkt, "PROJECTION[")
        .ok_or_else(|| ReprojectError::UnsupportedProjection("<missing>".to_string()))?;
    let params = parameters(wkt);
    let param = |keys: &[&str], default: f64| {
        params
            .iter()
            .find(|(name, _)| keys.contains(&name.as_str()))
            .map_or(default, |(_, value)| *value)
    };

    let lat_0 = param(
        &["latitudeoforigin", "latitudeofcenter", "latitudeofnaturalorigin"],
        0.0,
    );
    let lon_0 = param(
        &[
            "centralmeridian",
            "longitudeoforigin",
            "longitudeofcenter",
            "longitudeofnaturalorigin",
        ],
        0.0,
    );
    let k_0 = param(&["scalefactor", "scalefactoratnaturalorigin"], 1.0);
    let x_0 = param(&["falseeasting"], 0.0) * unit_metres;
    let y_0 = param(&["falsenorthing"], 0.0) * unit_metres;
    let ellps = ellipsoid(wkt);

    match normalize(&projection).as_str() {
        "lambertconformalconic" | "lambertconformalconic2sp" | "lambertconformalconic1sp" => {
            let lat_1 = param(&["standardparallel1"], lat_0);
            let lat_2 = param(&["standardparallel2"], lat_1);
            Ok(format!(
                "lcc lat_1={lat_1} lat_2={lat_2} lat_0={lat_0} lon_0={lon_0} k_0={k_0} \
                 x_0={x_0} y_0={y_0} ellps={ellps}"
            ))
        }
        "transversemercator" => Ok(format!(
            "tmerc lat_0={lat_0} lon_0={lon_0} k_0={k_0} x_0={x_0} y_0={y_0} ellps={ellps}"
        )),
        _ => Err(ReprojectError::UnsupportedProjection(projection)),
    }
}

/// Every `PARAMETER["name",value]` of `wkt`, names normalized.
fn parameters(wkt: &str) -> Vec<(String, f64)> {
    let upper = wkt.to_ascii_uppercase();
    upper
        .match_indices("PARAMETER[")
        .filter_map(|(idx, _)| {
            let rest = &wkt[idx + "PARAMETER[".len()..];
            let name = quoted_after(rest, "")?;
            let value = rest
                .split(',')
                .nth(1)?
                .split(']')
                .next()?
                .trim()
                .parse::<f64>()
                .ok()?;
            Some((normalize(&name), value))
        })
        .collect()
}

fn ellipsoid(wkt: &str) -> &'static str {
    let name = quoted_after(wkt, "SPHEROID[")
        .or_else(|| quoted_after(wkt, "ELLIPSOID["))
        .map(|n| normalize(&n))
        .unwrap_or_default();
    match name.as_str() {
        "wgs1984" | "wgs84" => "WGS84",
        "grs1980" | "grs80" | "" => "GRS80",
        other => {
            log::warn!("Ellipsoid {other} is approximated by GRS80");
            "GRS80"
        }
    }
}

/// First quoted string after the first case-insensitive `marker`.
fn quoted_after(wkt: &str, marker: &str) -> Option<String> {
    let start = wkt.to_ascii_uppercase().find(marker)? + marker.len();
    let rest = &wkt[start..];
    let open = rest.find('"')? + 1;
    let len = rest[open..].find('"')?;
    Some(rest[open..open + len].to_string())
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;

    const STATCAN_LAMBERT_WKT: &str = "PROJCS[\"NAD_1983_Statistics_Canada_Lambert\",\
GEOGCS[\"GCS_North_American_1983\",DATUM[\"D_North_American_1983\",\
SPHEROID[\"GRS_1980\",6378137.0,298.257222101]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]],PROJECTION[\"Lambert_Conformal_Conic\"],\
PARAMETER[\"False_Easting\",6200000.0],PARAMETER[\"False_Northing\",3000000.0],\
PARAMETER[\"Central_Meridian\",-91.86666666666666],\
PARAMETER[\"Standard_Parallel_1\",49.0],PARAMETER[\"Standard_Parallel_2\",77.0],\
PARAMETER[\"Latitude_Of_Origin\",63.390675],UNIT[\"Meter\",1.0]]";

    const UTM_17N_WKT: &str = "PROJCS[\"NAD_1983_UTM_Zone_17N\",\
GEOGCS[\"GCS_North_American_1983\",DATUM[\"D_North_American_1983\",\
SPHEROID[\"GRS_1980\",6378137.0,298.257222101]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]],PROJECTION[\"Transverse_Mercator\"],\
PARAMETER[\"False_Easting\",500000.0],PARAMETER[\"False_Northing\",0.0],\
PARAMETER[\"Central_Meridian\",-81.0],PARAMETER[\"Scale_Factor\",0.9996],\
PARAMETER[\"Latitude_Of_Origin\",0.0],UNIT[\"Meter\",1.0]]";

    fn to_wgs84(wkt: &str) -> ToWgs84 {
        ToWgs84::from_spatial_ref(&SpatialReference::from_wkt(wkt))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn lambert_false_origin_maps_to_projection_origin() {
        let c = to_wgs84(STATCAN_LAMBERT_WKT)
            .coord(Coord {
                x: 6_200_000.0,
                y: 3_000_000.0,
            })
            .unwrap();

        assert!((c.x - -91.866_666_666_666_66).abs() < 1e-6, "{c:?}");
        assert!((c.y - 63.390_675).abs() < 1e-6, "{c:?}");
    }

    #[test]
    fn transverse_mercator_inverse() {
        let utm = to_wgs84(UTM_17N_WKT);

        let origin = utm.coord(Coord { x: 500_000.0, y: 0.0 }).unwrap();
        assert!((origin.x - -81.0).abs() < 1e-6);
        assert!(origin.y.abs() < 1e-6);

        // 45N on the central meridian: k0 times the GRS80 meridian arc
        let north = utm
            .coord(Coord {
                x: 500_000.0,
                y: 4_982_950.4,
            })
            .unwrap();
        assert!((north.x - -81.0).abs() < 1e-6);
        assert!((north.y - 45.0).abs() < 1e-4, "{north:?}");
    }

    #[test]
    fn geometry_is_converted_coordinate_by_coordinate() {
        let geometry = Geometry::Point(point!(x: 500_000.0, y: 0.0));
        let converted = to_wgs84(UTM_17N_WKT).geometry(&geometry).unwrap();

        let Geometry::Point(p) = converted else {
            panic!("expected a point, got {converted:?}");
        };
        assert!((p.x() - -81.0).abs() < 1e-6);
    }

    #[test]
    fn geographic_and_unknown_references_need_nothing() {
        assert!(ToWgs84::from_spatial_ref(&SpatialReference::wgs84()).unwrap().is_none());
        assert!(ToWgs84::from_spatial_ref(&SpatialReference::unknown()).unwrap().is_none());
    }

    #[test]
    fn unsupported_projection_is_named() {
        let albers = STATCAN_LAMBERT_WKT.replace("Lambert_Conformal_Conic", "Albers");
        let err = ToWgs84::from_spatial_ref(&SpatialReference::from_wkt(albers)).unwrap_err();

        assert!(matches!(err, ReprojectError::UnsupportedProjection(ref name) if name == "Albers"));
    }

    #[test]
    fn parameters_are_read_case_insensitively() {
        let params = parameters(STATCAN_LAMBERT_WKT);

        assert!(params.contains(&("falseeasting".to_string(), 6_200_000.0)));
        assert!(params.contains(&("standardparallel2".to_string(), 77.0)));
        assert_eq!(params.len(), 6);
    }
}
