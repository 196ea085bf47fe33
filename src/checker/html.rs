// src/checker/html.rs
// =============================================================================
// This module extracts links from HTML documents.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// Attributes we look at:
// - <a href>, <link href>
// - <img src>, <script src>
//
// Elements without the attribute are skipped (an empty attribute is kept,
// it points at the page's own directory). Links come back in document order.
// Turning them into absolute URLs is the job of resolve.rs.
// =============================================================================

use std::path::Path;
use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::DocumentError;

// One selector for all four tags keeps the results in document order
static LINK_ELEMENTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href], link[href], img[src], script[src]").unwrap());

// Reads a document from disk
//
// html5ever never rejects markup, so the only parse failures are an
// unreadable file or bytes that are not UTF-8.
pub async fn read_document(path: &Path) -> Result<String, DocumentError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8(bytes)?)
}

// Extracts the raw link attribute values from an HTML document
//
// Example:
//   html = "<a href='/docs'>Docs</a><img src='logo.png'>"
//   result = ["/docs", "logo.png"]
pub fn extract_html_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    document
        .select(&LINK_ELEMENTS)
        .filter_map(|element| {
            let attr = match element.value().name() {
                "img" | "script" => "src",
                _ => "href",
            };
            element.value().attr(attr).map(str::to_string)
        })
        .collect()
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is Html never kept around?
//    - scraper's Html is not Send, so it cannot be held across an .await
//    - extract_html_links is a plain fn: the DOM is dropped before the
//      caller starts probing links
//
// 2. What does "a[href]" match?
//    - <a> elements that HAVE an href attribute, whatever its value
//    - <a name="top"> is not matched, <a href=""> is
// -----------------------------------------------------------------------------
