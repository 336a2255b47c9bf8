//! Loading and checking [`CoverageConfig`] values.

use std::path::Path;

use gdb_coverage_catalogue::FILE_GEODATABASE_SUPPORTED;
use gdb_coverage_models::CoverageConfig;

use crate::CoverageError;

/// Parses a TOML configuration. Missing fields keep their defaults.
///
/// # Errors
///
/// Returns [`CoverageError::Config`] if the TOML is malformed, has
/// unknown keys, or fails [`validate`].
pub fn parse_config(toml_str: &str) -> Result<CoverageConfig, CoverageError> {
    let config: CoverageConfig =
        toml::de::from_str(toml_str).map_err(|e| CoverageError::Config(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

/// Reads and parses the TOML configuration at `path`.
///
/// # Errors
///
/// Returns [`CoverageError::Io`] if the file cannot be read and
/// [`CoverageError::Config`] if it is not a valid configuration.
pub fn load_config(path: &Path) -> Result<CoverageConfig, CoverageError> {
    let contents = std::fs::read_to_string(path).map_err(|e| CoverageError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_config(&contents).map_err(|e| match e {
        CoverageError::Config(message) => {
            CoverageError::Config(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Checks values serde cannot express constraints for.
///
/// # Errors
///
/// Returns [`CoverageError::Config`] describing the first bad field.
pub fn validate(config: &CoverageConfig) -> Result<(), CoverageError> {
    for (field, value) in [
        ("point_buffer_m", config.point_buffer_m),
        ("line_buffer_m", config.line_buffer_m),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(CoverageError::Config(format!(
                "{field} must be a positive number of metres, got {value}"
            )));
        }
    }

    if config.archive.is_none() && config.url.trim().is_empty() {
        return Err(CoverageError::Config(
            "either url or archive must be set".to_string(),
        ));
    }

    if config.archive_name.trim().is_empty() {
        return Err(CoverageError::Config("archive_name is empty".to_string()));
    }

    Ok(())
}

/// Rejects a File Geodatabase source up front when this build has no
/// reader for it, before anything is downloaded.
///
/// The source counts as a geodatabase when the configured container ends
/// in `.gdb` or the archive (local path or URL) is named `*.gdb.zip`.
///
/// # Errors
///
/// Returns [`CoverageError::Config`] naming the `gdal` feature.
pub fn check_container_support(config: &CoverageConfig) -> Result<(), CoverageError> {
    check_container_support_with(config, FILE_GEODATABASE_SUPPORTED)
}

fn check_container_support_with(
    config: &CoverageConfig,
    geodatabase_supported: bool,
) -> Result<(), CoverageError> {
    if geodatabase_supported {
        return Ok(());
    }

    let source = config
        .archive
        .as_ref()
        .map_or_else(|| config.url.clone(), |path| path.display().to_string());
    let source = source.trim_end_matches('/').to_ascii_lowercase();
    let container_is_gdb = config
        .container
        .as_deref()
        .is_some_and(|name| name.trim_end_matches('/').to_ascii_lowercase().ends_with(".gdb"));

    if container_is_gdb || source.ends_with(".gdb.zip") {
        return Err(CoverageError::Config(format!(
            "{source} is a File Geodatabase, which this build cannot read; \
             rebuild with `--features gdal` or point url/archive at a zipped shapefile bundle"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdb_coverage_models::CleanupPolicy;

    #[test]
    fn empty_document_is_the_default_config() {
        assert_eq!(parse_config("").unwrap(), CoverageConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse_config(
            r#"
            archive = "fixtures/places.gdb.zip"
            keep_intermediates = true
            cleanup = "always"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.archive.as_deref(),
            Some(Path::new("fixtures/places.gdb.zip"))
        );
        assert!(config.keep_intermediates);
        assert_eq!(config.cleanup, CleanupPolicy::Always);
    }

    #[test]
    fn non_positive_buffer_is_rejected() {
        let err = parse_config("line_buffer_m = 0.0").unwrap_err();
        assert!(
            matches!(&err, CoverageError::Config(message) if message.contains("line_buffer_m"))
        );
    }

    #[test]
    fn unknown_key_is_a_config_error() {
        assert!(matches!(
            parse_config("outptu = \"x.geojson\""),
            Err(CoverageError::Config(_))
        ));
    }

    #[test]
    fn blank_url_needs_an_archive() {
        assert!(parse_config("url = \"\"").is_err());
        assert!(parse_config("url = \"\"\narchive = \"local.zip\"").is_ok());
    }

    #[test]
    fn load_reports_the_file_path() {
        let tmp = std::env::temp_dir().join("gdb_coverage_load_config");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        let path = tmp.join("coverage.toml");
        std::fs::write(&path, "point_buffer_m = \"far\"").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("coverage.toml"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn geodatabase_source_needs_a_geodatabase_reader() {
        let default = CoverageConfig::default();
        assert!(matches!(
            check_container_support_with(&default, false),
            Err(CoverageError::Config(message)) if message.contains("gdal")
        ));
        assert!(check_container_support_with(&default, true).is_ok());

        let named_container = CoverageConfig {
            archive: Some("bundle.zip".into()),
            container: Some("places.gdb".to_string()),
            ..CoverageConfig::default()
        };
        assert!(check_container_support_with(&named_container, false).is_err());

        let local_gdb = CoverageConfig {
            archive: Some("fixtures/Places.GDB.zip".into()),
            ..CoverageConfig::default()
        };
        assert!(check_container_support_with(&local_gdb, false).is_err());
    }

    #[test]
    fn shapefile_bundle_is_readable_by_every_build() {
        let bundle = CoverageConfig {
            archive: Some("fixtures/bundle.zip".into()),
            ..CoverageConfig::default()
        };
        assert!(check_container_support_with(&bundle, false).is_ok());
        assert!(check_container_support(&bundle).is_ok());

        let url = CoverageConfig {
            url: "https://example.com/hydro_shp.zip".to_string(),
            ..CoverageConfig::default()
        };
        assert!(check_container_support_with(&url, false).is_ok());
    }
}
