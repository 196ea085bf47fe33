// src/crawl/walk.rs
// =============================================================================
// Finds the HTML files under the crawl root.
//
// Every regular file ending in .html or .htm (any case) is a document. The
// walk goes arbitrarily deep and does not follow symlinks. A directory that
// cannot be read is reported and the walk carries on with its siblings.
// =============================================================================

use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

/// Something the walk turned up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovered {
    Document(PathBuf),
    Failed { path: PathBuf, message: String },
}

// Walks `root` and returns every HTML document plus every entry that failed
//
// Blocking: call it from spawn_blocking in async code.
pub fn find_html_files(root: &Path) -> Vec<Discovered> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) if entry.file_type().is_file() && is_html(entry.path()) => {
                Some(Discovered::Document(entry.into_path()))
            }
            Ok(_) => None,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                warn!(path = %path.display(), error = %e, "could not walk entry");
                Some(Discovered::Failed {
                    path,
                    message: e.to_string(),
                })
            }
        })
        .collect()
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}
