//! Spatial reference descriptors carried alongside feature classes.
//!
//! Only the WKT text is stored. The pipeline needs just enough of it to
//! tell geographic from projected references, to find the linear unit of
//! a projected reference, and to check that two layers can be appended
//! together.

use serde::{Deserialize, Serialize};

/// WKT for WGS 84 geographic coordinates, as written by Esri tools.
pub const WGS84_WKT: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",\
SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

/// A coordinate reference system, described by its WKT (if known).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialReference {
    /// Well-known text, `None` when the container did not declare one.
    pub wkt: Option<String>,
}

impl SpatialReference {
    /// A reference the container did not declare.
    #[must_use]
    pub const fn unknown() -> Self {
        Self { wkt: None }
    }

    /// Wraps a WKT string. Blank input is treated as unknown.
    #[must_use]
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        if wkt.trim().is_empty() {
            Self::unknown()
        } else {
            Self {
                wkt: Some(wkt.trim().to_string()),
            }
        }
    }

    /// WGS 84 geographic coordinates.
    #[must_use]
    pub fn wgs84() -> Self {
        Self::from_wkt(WGS84_WKT)
    }

    /// Returns `true` if a WKT was declared.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        self.wkt.is_some()
    }

    /// Returns `Some(true)` for geographic (lon/lat) references,
    /// `Some(false)` for projected ones and `None` when unknown.
    #[must_use]
    pub fn is_geographic(&self) -> Option<bool> {
        let wkt = self.wkt.as_deref()?;
        let head = wkt.trim_start().to_ascii_uppercase();
        Some(
            head.starts_with("GEOGCS")
                || head.starts_with("GEOGCRS")
                || head.starts_with("GEODCRS"),
        )
    }

    /// The CRS name (first quoted string of the WKT).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        let wkt = self.wkt.as_deref()?;
        let start = wkt.find('"')? + 1;
        let len = wkt[start..].find('"')?;
        Some(&wkt[start..start + len])
    }

    /// Metres per unit of a projected reference.
    ///
    /// Reads the last `UNIT[...]` entry, which in WKT1 `PROJCS` is the
    /// linear unit (the angular unit sits inside the nested `GEOGCS`).
    /// Falls back to `1.0` for geographic, unknown or unparseable input.
    #[must_use]
    pub fn linear_unit_metres(&self) -> f64 {
        if self.is_geographic() != Some(false) {
            return 1.0;
        }
        let Some(wkt) = self.wkt.as_deref() else {
            return 1.0;
        };
        let upper = wkt.to_ascii_uppercase();
        let Some(idx) = upper.rfind("UNIT[") else {
            return 1.0;
        };
        wkt[idx..]
            .split(',')
            .nth(1)
            .map(|factor| factor.trim_end_matches(']').trim())
            .and_then(|factor| factor.parse::<f64>().ok())
            .filter(|factor| *factor > 0.0)
            .unwrap_or(1.0)
    }

    /// Whether geometries in `other` can be appended to a layer in `self`
    /// without reprojection.
    ///
    /// Unknown references are accepted either way. Known references match
    /// when their WKT is identical ignoring whitespace, or when both are
    /// geographic with equivalent names (`GCS_WGS_1984` vs `WGS 84`).
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        let (Some(a), Some(b)) = (self.wkt.as_deref(), other.wkt.as_deref()) else {
            return true;
        };
        if strip_whitespace(a) == strip_whitespace(b) {
            return true;
        }
        self.is_geographic() == Some(true)
            && other.is_geographic() == Some(true)
            && self.name().map(normalize_name) == other.name().map(normalize_name)
    }
}

fn strip_whitespace(wkt: &str) -> String {
    wkt.chars().filter(|c| !c.is_whitespace()).collect()
}

fn normalize_name(name: &str) -> String {
    let alnum: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    let alnum = alnum.strip_prefix("gcs").unwrap_or(&alnum);
    alnum.replace("wgs1984", "wgs84")
}
