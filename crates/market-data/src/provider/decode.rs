//! Payload decoding helpers: charset detection and HTML table extraction.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use scraper::{ElementRef, Html, Selector};

use crate::errors::MarketDataError;

/// How far into a document to look for a `<meta charset>` declaration.
const META_SNIFF_LIMIT: usize = 1024;

/// Decode a text body into UTF-8.
///
/// The charset is taken from, in order: the `Content-Type` header, a
/// `charset=` declaration near the top of the document, and finally
/// byte-level detection. Malformed sequences become U+FFFD.
pub(crate) fn decode_text(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(Encoding::for_label)
        .or_else(|| sniff_meta_charset(body))
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(body, true);
            detector.guess(None, true)
        });

    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

/// Extract the `charset=` parameter value from a header or meta tag.
fn charset_label(value: &str) -> Option<&[u8]> {
    let lower = value.to_ascii_lowercase();
    let start = lower.find("charset=")? + "charset=".len();
    let rest = &value.as_bytes()[start..];
    let rest = rest.strip_prefix(b"\"").unwrap_or(rest);
    let end = rest
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_SNIFF_LIMIT)];
    let head = String::from_utf8_lossy(head);
    charset_label(&head).and_then(Encoding::for_label)
}

/// Parse a CSS selector, attributing failures to the source.
pub(crate) fn selector(source_id: &str, css: &str) -> Result<Selector, MarketDataError> {
    Selector::parse(css).map_err(|e| MarketDataError::Layout {
        source_id: source_id.to_string(),
        message: format!("invalid selector '{}': {}", css, e),
    })
}

/// Text content of an element with whitespace runs collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first element matching `css`, if any.
pub(crate) fn first_text(
    source_id: &str,
    document: &Html,
    css: &str,
) -> Result<Option<String>, MarketDataError> {
    let sel = selector(source_id, css)?;
    Ok(document.select(&sel).next().map(element_text))
}

/// Direct `th`/`td` children of a row. Cells of nested tables are skipped.
pub(crate) fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| matches!(child.value().name(), "td" | "th"))
        .map(element_text)
        .collect()
}

/// All rows of a table as cell texts, header row included.
pub(crate) fn table_rows(
    source_id: &str,
    table: ElementRef<'_>,
) -> Result<Vec<Vec<String>>, MarketDataError> {
    let row_sel = selector(source_id, "tr")?;
    Ok(table.select(&row_sel).map(row_cells).collect())
}

/// Find the table whose header row has a cell containing `marker`.
///
/// Pages often nest the rate table inside layout tables, whose cells then
/// contain the marker too. A match that wraps another match is skipped so
/// the innermost table wins.
pub(crate) fn locate_table<'a>(
    source_id: &str,
    document: &'a Html,
    marker: &str,
) -> Result<ElementRef<'a>, MarketDataError> {
    let table_sel = selector(source_id, "table")?;
    let row_sel = selector(source_id, "tr")?;

    let header_mentions = |table: &ElementRef<'_>| {
        table
            .select(&row_sel)
            .next()
            .map(|header| {
                row_cells(header)
                    .iter()
                    .any(|cell| cell.trim().contains(marker))
            })
            .unwrap_or(false)
    };

    document
        .select(&table_sel)
        .filter(|table| header_mentions(table))
        .find(|table| {
            !table
                .select(&table_sel)
                .any(|inner| inner.id() != table.id() && header_mentions(&inner))
        })
        .ok_or_else(|| MarketDataError::Layout {
            source_id: source_id.to_string(),
            message: format!("no table with a '{}' header", marker),
        })
}

/// Cell `idx` of a row, or an empty string.
pub(crate) fn cell(cells: &[String], idx: usize) -> &str {
    cells.get(idx).map(|s| s.trim()).unwrap_or("")
}
