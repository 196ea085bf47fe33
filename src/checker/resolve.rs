// src/checker/resolve.rs
// =============================================================================
// This module turns raw attribute values into absolute URLs.
//
// The HTML files on disk are not served from where they live on disk: the
// crawl root is mapped onto the server base URL. A page at
// <root>/guide/intro.html is served as <server>/guide/intro.html, so a link
// "../img/logo.png" inside it points at <server>/img/logo.png.
//
// Resolution is a pure function. It never touches the network or the disk,
// so calling it twice with the same inputs always gives the same answer.
//
// Rust concepts:
// - LazyLock: A static that is built the first time it is used
// - Result<Option<T>, E>: "failed", "nothing to do" and "got one" in one type
// =============================================================================

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::ResolveError;

// Links of the form "//host/..." or "http(s)://..."
static ABSOLUTE_HTTP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(https?:)?//").unwrap());

// Any other "scheme:" prefix (mailto:, tel:, javascript:, data:, ...)
static OTHER_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap());

/// Whether a link stays on the configured server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locality {
    Local,
    Outgoing,
}

/// A link found in a document, resolved to an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// Normalized absolute URL, without fragment
    pub url: Url,
    /// The document the link was found in
    pub source: PathBuf,
    pub locality: Locality,
}

// Resolves one raw link found in `source`
//
// Returns:
//   Ok(None) for fragment-only links and non-http schemes
//   Ok(Some(link)) with the absolute URL and its locality
//   Err(...) when no valid URL can be built from the link
//
// Examples (server_base = "http://example.com/", crawl_root = "docs/"):
//   "#top"              -> None
//   "mailto:a@b.com"    -> None
//   "//example.com/x"   -> Local    http://example.com/x
//   "//other.com/x"     -> Outgoing http://other.com/x
//   "/x"                -> Local    http://example.com/x
//   "../x" from docs/sub/page.html -> Local http://example.com/x
pub fn resolve_link(
    source: &Path,
    raw: &str,
    server_base: &Url,
    crawl_root: &Path,
) -> Result<Option<ResolvedLink>, ResolveError> {
    let link = raw.trim();

    if link.starts_with('#') {
        return Ok(None);
    }

    let (mut url, locality) = if ABSOLUTE_HTTP.is_match(link) {
        let absolute = if link.starts_with("//") {
            // Protocol-relative links inherit the server's scheme
            format!("{}:{}", server_base.scheme(), link)
        } else {
            link.to_string()
        };
        (parse(&absolute)?, None)
    } else if OTHER_SCHEME.is_match(link) {
        return Ok(None);
    } else if let Some(rooted) = link.strip_prefix('/') {
        // "./" keeps a colon in the first segment ("/Special:Search") from
        // reading as a scheme
        (join(server_base, &format!("./{}", rooted))?, Some(Locality::Local))
    } else {
        let dir = document_dir_url(source, server_base, crawl_root)?;
        (join(&dir, link)?, Some(Locality::Local))
    };

    // Fragments are never sent to the server, so they must not split the cache
    url.set_fragment(None);
    fold_empty_segments(&mut url);

    let locality = locality.unwrap_or_else(|| locality_of(&url, server_base));

    Ok(Some(ResolvedLink {
        url,
        source: source.to_path_buf(),
        locality,
    }))
}

// Local iff the normalized URL starts with the server base
pub fn locality_of(url: &Url, server_base: &Url) -> Locality {
    if url.as_str().starts_with(server_base.as_str()) {
        Locality::Local
    } else {
        Locality::Outgoing
    }
}

// Collapses duplicate slashes in the path: /a//b.html -> /a/b.html
//
// A trailing slash is kept, so /docs/ and /docs stay distinct.
fn fold_empty_segments(url: &mut Url) {
    if !url.path().contains("//") {
        return;
    }

    let trailing = url.path().ends_with('/');
    let segments: Vec<String> = match url.path_segments() {
        Some(segments) => segments
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => return,
    };

    let mut path = format!("/{}", segments.join("/"));
    if trailing && !segments.is_empty() {
        path.push('/');
    }
    url.set_path(&path);
}

// Builds the URL of the directory the document is served from
//
// <crawl_root>/a/b/page.html -> <server_base>a/b/
fn document_dir_url(
    source: &Path,
    server_base: &Url,
    crawl_root: &Path,
) -> Result<Url, ResolveError> {
    let outside = || ResolveError::OutsideRoot {
        path: source.to_path_buf(),
    };

    let dir = source.parent().ok_or_else(outside)?;
    let relative = dir.strip_prefix(crawl_root).map_err(|_| outside())?;

    let mut url = server_base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| ResolveError::Malformed {
            url: server_base.to_string(),
            source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
        })?;
        segments.pop_if_empty();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    segments.push(&name.to_string_lossy());
                }
                Component::ParentDir => {
                    segments.pop();
                }
                _ => {}
            }
        }
        segments.push("");
    }

    Ok(url)
}

fn parse(link: &str) -> Result<Url, ResolveError> {
    Url::parse(link).map_err(|source| ResolveError::Malformed {
        url: link.to_string(),
        source,
    })
}

fn join(base: &Url, link: &str) -> Result<Url, ResolveError> {
    base.join(link).map_err(|source| ResolveError::Malformed {
        url: format!("{}{}", base, link),
        source,
    })
}
