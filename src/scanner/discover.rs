//! File discovery: expand include globs minus ignore globs under each root.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Builds a glob set, skipping (and logging) patterns that do not parse.
fn build_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => warn!(pattern = %pattern, error = %e, "ignoring invalid glob pattern"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "failed to compile glob patterns");
        GlobSet::empty()
    })
}

/// Walks `roots` and returns matching files in a deterministic order.
///
/// Paths are matched relative to their root. A root that is itself a file
/// is returned as-is. Files reachable from more than one root appear once.
pub fn discover_files(roots: &[PathBuf], patterns: &[String], ignore: &[String]) -> Vec<PathBuf> {
    let include = build_globset(patterns);
    let exclude = build_globset(ignore);
    let excluded_dirs = build_globset(&directory_globs(ignore));

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for root in roots {
        if root.is_file() {
            if seen.insert(root.clone()) {
                files.push(root.clone());
            }
            continue;
        }

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_ignored_dir(e, root, &excluded_dirs));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = relative(entry.path(), root);
            if include.is_match(rel) && !exclude.is_match(rel) && seen.insert(entry.path().to_path_buf()) {
                files.push(entry.into_path());
            }
        }
    }

    debug!(files = files.len(), "discovery finished");
    files
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// Directory patterns from ignore globs that exclude a whole subtree:
/// `**/node_modules/**` becomes `**/node_modules`. File-level globs such as
/// `**/_*` yield nothing and never prune.
fn directory_globs(ignore: &[String]) -> Vec<String> {
    ignore
        .iter()
        .filter_map(|pattern| pattern.strip_suffix("/**"))
        .filter(|dir| !dir.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prunes directories matched by `excluded_dirs` so they are never walked.
fn is_ignored_dir(entry: &DirEntry, root: &Path, excluded_dirs: &GlobSet) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    excluded_dirs.is_match(relative(entry.path(), root))
}
