//! Pipeline configuration.
//!
//! Every path, URL and distance used by a run lives here. Values can be
//! read from a TOML file; fields left out of the file keep their defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Geodatabase downloaded when no URL is configured.
pub const DEFAULT_URL: &str = "http://ftp.maps.canada.ca/pub/statcan_statcan/Census_Recensement/census_subdivisions_2016/census_subdivisions_2016_en.gdb.zip";

/// Buffer radius applied to point and line feature classes.
pub const DEFAULT_BUFFER_METRES: f64 = 5000.0;

/// When the working files of a run are deleted.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CleanupPolicy {
    /// Keep everything.
    #[default]
    Never,
    /// Remove working files after a successful run only.
    OnSuccess,
    /// Remove working files whether the run succeeded or failed.
    Always,
}

impl CleanupPolicy {
    /// Whether cleanup should run given the outcome of the run.
    #[must_use]
    pub const fn applies(self, succeeded: bool) -> bool {
        match self {
            Self::Never => false,
            Self::OnSuccess => succeeded,
            Self::Always => true,
        }
    }
}

/// Configuration for one coverage run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    /// URL of the zipped geodatabase.
    pub url: String,
    /// Use this local archive instead of downloading `url`.
    pub archive: Option<PathBuf>,
    /// Directory holding the download, extraction and intermediates.
    pub work_dir: PathBuf,
    /// File name of the downloaded archive inside `work_dir`.
    pub archive_name: String,
    /// Container name inside the extracted archive (e.g.
    /// `census_subdivisions_2016_en.gdb`). Discovered when `None`.
    pub container: Option<String>,
    /// Where the GeoJSON document is written.
    pub output: PathBuf,
    /// Buffer radius for point feature classes, in metres.
    pub point_buffer_m: f64,
    /// Buffer radius for line feature classes, in metres.
    pub line_buffer_m: f64,
    /// Write each transform's intermediate layers as GeoJSON.
    pub keep_intermediates: bool,
    /// When to remove the working files.
    pub cleanup: CleanupPolicy,
    /// Reproject feature classes to WGS 84 while reading, when the
    /// container backend supports it.
    pub reproject_to_wgs84: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            archive: None,
            work_dir: PathBuf::from("data/work"),
            archive_name: "download.zip".to_string(),
            container: None,
            output: PathBuf::from("data/output/coverage.geojson"),
            point_buffer_m: DEFAULT_BUFFER_METRES,
            line_buffer_m: DEFAULT_BUFFER_METRES,
            keep_intermediates: false,
            cleanup: CleanupPolicy::Never,
            reproject_to_wgs84: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_policy_applies() {
        assert!(!CleanupPolicy::Never.applies(true));
        assert!(!CleanupPolicy::Never.applies(false));
        assert!(CleanupPolicy::OnSuccess.applies(true));
        assert!(!CleanupPolicy::OnSuccess.applies(false));
        assert!(CleanupPolicy::Always.applies(false));
    }

    #[test]
    fn cleanup_policy_parses_snake_case() {
        assert_eq!(
            "on_success".parse::<CleanupPolicy>().unwrap(),
            CleanupPolicy::OnSuccess
        );
        assert_eq!(CleanupPolicy::Always.to_string(), "always");
    }

    #[test]
    fn unknown_cleanup_policy_is_a_parse_error() {
        assert_eq!(
            "sometimes".parse::<CleanupPolicy>().unwrap_err(),
            strum::ParseError::VariantNotFound
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: CoverageConfig = toml::from_str(
            r#"
            url = "https://example.com/places.gdb.zip"
            point_buffer_m = 2500.0
            cleanup = "on_success"
            "#,
        )
        .unwrap();

        assert_eq!(config.url, "https://example.com/places.gdb.zip");
        assert!((config.point_buffer_m - 2500.0).abs() < f64::EPSILON);
        assert!((config.line_buffer_m - DEFAULT_BUFFER_METRES).abs() < f64::EPSILON);
        assert_eq!(config.cleanup, CleanupPolicy::OnSuccess);
        assert_eq!(config.archive_name, "download.zip");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = toml::from_str::<CoverageConfig>("buffer = 10.0");
        assert!(result.is_err());
    }
}
