//! Zip extraction into the working directory.

use std::path::Path;

/// Extracts every entry of the zip at `archive_path` into `dest_dir`.
///
/// `dest_dir` is created if it does not exist; existing files are
/// overwritten. Entries whose names would resolve outside `dest_dir`
/// (absolute paths, `..` components) are skipped with a warning.
///
/// Returns the number of files written (directories are not counted).
///
/// # Errors
///
/// Returns [`ArchiveError::Corrupt`] if the archive or one of its entries
/// cannot be decoded, and [`ArchiveError::Io`] if a file cannot be
/// written.
pub fn extract_all(archive_path: &Path, dest_dir: &Path) -> Result<u64, ArchiveError> {
    if !archive_path.exists() {
        return Err(ArchiveError::ArchiveNotFound(
            archive_path.display().to_string(),
        ));
    }

    log::info!(
        "Extracting {} -> {}",
        archive_path.display(),
        dest_dir.display()
    );

    let file = std::fs::File::open(archive_path).map_err(|e| ArchiveError::Io {
        path: archive_path.display().to_string(),
        source: e,
    })?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| ArchiveError::Corrupt {
        path: archive_path.display().to_string(),
        message: e.to_string(),
    })?;

    std::fs::create_dir_all(dest_dir).map_err(|e| ArchiveError::Io {
        path: dest_dir.display().to_string(),
        source: e,
    })?;

    let mut written = 0u64;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| ArchiveError::Corrupt {
            path: archive_path.display().to_string(),
            message: format!("entry {i}: {e}"),
        })?;

        let Some(relative) = entry.enclosed_name() else {
            log::warn!("  skipping unsafe zip entry name: {}", entry.name());
            continue;
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| ArchiveError::Io {
                path: out_path.display().to_string(),
                source: e,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ArchiveError::Io {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|e| ArchiveError::Io {
            path: out_path.display().to_string(),
            source: e,
        })?;

        std::io::copy(&mut entry, &mut out).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                ArchiveError::Corrupt {
                    path: archive_path.display().to_string(),
                    message: format!("{}: {e}", out_path.display()),
                }
            } else {
                ArchiveError::Io {
                    path: out_path.display().to_string(),
                    source: e,
                }
            }
        })?;

        written += 1;
    }

    log::info!("Zip file folder extracted to: {} ({written} files)", dest_dir.display());

    Ok(written)
}

/// Errors from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Archive file not found.
    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    /// The archive is not a readable zip.
    #[error("Corrupt archive {path}: {message}")]
    Corrupt {
        /// Archive path.
        path: String,
        /// Decoder message.
        message: String,
    },

    /// I/O error during extraction.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write as _;

    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    #[test]
    fn extracts_nested_container() {
        let tmp = std::env::temp_dir().join("gdb_coverage_extract_nested");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let archive = tmp.join("download.zip");
        write_zip(
            &archive,
            &[
                ("places.gdb/", b""),
                ("places.gdb/a00000001.gdbtable", b"\x03\x00\x00\x00"),
                ("places.gdb/gdb", b"\x05\x00"),
            ],
        );

        let dest = tmp.join("extracted");
        let count = extract_all(&archive, &dest).unwrap();

        assert_eq!(count, 2);
        assert!(dest.join("places.gdb").is_dir());
        assert_eq!(
            fs::read(dest.join("places.gdb/a00000001.gdbtable")).unwrap(),
            b"\x03\x00\x00\x00"
        );

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn skips_entries_escaping_destination() {
        let tmp = std::env::temp_dir().join("gdb_coverage_extract_escape");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let archive = tmp.join("download.zip");
        write_zip(
            &archive,
            &[("../evil.txt", b"nope"), ("ok.txt", b"fine")],
        );

        let dest = tmp.join("extracted");
        let count = extract_all(&archive, &dest).unwrap();

        assert_eq!(count, 1);
        assert!(dest.join("ok.txt").exists());
        assert!(!tmp.join("evil.txt").exists());

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn garbage_is_reported_as_corrupt() {
        let tmp = std::env::temp_dir().join("gdb_coverage_extract_corrupt");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        let archive = tmp.join("download.zip");
        fs::write(&archive, b"<html>not a zip</html>").unwrap();

        let err = extract_all(&archive, &tmp.join("extracted")).unwrap_err();
        assert!(matches!(err, ArchiveError::Corrupt { .. }));

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_archive_is_reported() {
        let err = extract_all(
            Path::new("/definitely/not/here.zip"),
            &std::env::temp_dir().join("gdb_coverage_extract_missing"),
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::ArchiveNotFound(_)));
    }
}
