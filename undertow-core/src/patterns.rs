//! Glob pattern expansion against the local filesystem
//!
//! Patterns follow shell conventions: `*`, `?` and character classes stay
//! within one path component, `**` crosses directories, and relative
//! patterns resolve against a base directory. Hidden files and directories
//! are skipped unless the pattern names them with a leading dot.

use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use walkdir::WalkDir;

use crate::config::{ConfigError, FILES_KEY};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Expands one glob pattern into the regular files it matches.
///
/// Results are ordered by directory walk with entries sorted by file name.
/// Relative patterns yield paths relative to `base_dir` when it is `.`,
/// otherwise paths joined onto `base_dir`.
///
/// # Errors
/// - `ConfigError::Invalid` - Pattern is not a valid glob
pub fn expand_pattern(pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut normalized = pattern.trim();
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest;
    }

    if !normalized.contains(GLOB_META) {
        let resolved = resolve(base_dir, PathBuf::from(normalized));
        let matches = if resolved.is_file() { vec![resolved] } else { Vec::new() };
        return Ok(matches);
    }

    let matcher = GlobBuilder::new(normalized)
        .literal_separator(true)
        .build()
        .map_err(|e| ConfigError::Invalid {
            key: FILES_KEY,
            reason: format!("{pattern}: {e}"),
        })?
        .compile_matcher();

    let components: Vec<&str> = normalized.split('/').collect();
    let literal_count = components
        .iter()
        .take_while(|component| !component.contains(GLOB_META))
        .count();
    let prefix = components[..literal_count].join("/");
    let prefix = if prefix.is_empty() && normalized.starts_with('/') {
        "/".to_string()
    } else {
        prefix
    };

    let walk_root = if prefix.is_empty() {
        base_dir.to_path_buf()
    } else {
        base_dir.join(&prefix)
    };

    let glob_components = &components[literal_count..];
    let recursive = normalized.contains("**");
    let mut walker = WalkDir::new(&walk_root).follow_links(true).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(glob_components.len());
    }

    let mut matches = Vec::new();
    let entries = walker.into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_name().to_string_lossy().starts_with('.')
            || dot_allowed(glob_components, entry.depth(), recursive)
    });
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable path while expanding {pattern}: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(below_root) = entry.path().strip_prefix(&walk_root) else {
            continue;
        };
        let candidate = Path::new(&prefix).join(below_root);
        if matcher.is_match(&candidate) {
            matches.push(resolve(base_dir, candidate));
        }
    }

    tracing::debug!("Pattern {pattern} matched {} files", matches.len());
    Ok(matches)
}

/// Hidden names only match a glob component that itself starts with a dot.
fn dot_allowed(glob_components: &[&str], depth: usize, recursive: bool) -> bool {
    if recursive {
        glob_components.iter().any(|component| component.starts_with('.'))
    } else {
        glob_components
            .get(depth - 1)
            .is_some_and(|component| component.starts_with('.'))
    }
}

fn resolve(base_dir: &Path, relative: PathBuf) -> PathBuf {
    if base_dir == Path::new(".") {
        relative
    } else {
        base_dir.join(relative)
    }
}
