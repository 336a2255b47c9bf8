//! Removal of working files after a run.

use std::path::{Component, Path, PathBuf};

use crate::artifacts::ArtifactPaths;

/// Removes the extraction directory, the intermediates and, when it was
/// downloaded by this run, the archive.
///
/// The output document is never removed, even when it sits inside one of
/// those directories. Failures are logged and otherwise ignored.
pub fn remove_working_files(artifacts: &ArtifactPaths, remove_archive: bool) {
    let output = &resolve(artifacts.output());

    if remove_archive {
        remove(artifacts.archive(), output);
    }
    remove(artifacts.extract_dir(), output);
    remove(artifacts.intermediate_dir(), output);
}

fn remove(path: &Path, output: &Path) {
    if output.starts_with(resolve(path)) {
        log::warn!(
            "Not removing {}: it contains the output {}",
            path.display(),
            output.display()
        );
        return;
    }

    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => log::info!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Failed to remove {}: {e}", path.display()),
    }
}

/// Absolute form of `path` with `.`/`..` folded and symlinks of its
/// existing ancestors resolved, so differently spelled paths compare equal.
fn resolve(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .into_iter()
                .rev()
                .fold(canonical, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return lexical,
        }
    }
}
