//! Table extraction and text sanitizing for Confluence storage-format markup.
//!
//! The extractor scans markup for `<table>` segments and turns each into a
//! [`Table`] of labeled or plain rows. It is best-effort and total: malformed
//! or unclosed constructs simply contribute nothing.
//!
//! Tables nested inside other tables are not supported. The scan is
//! non-nested, so an inner table's closing marker ends the outer segment
//! early and the inner cells are read as part of the outer table.

mod sanitize;

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use confluence_bridge_shared::{Row, Table};

pub use sanitize::sanitize_fragment;

// ---------------------------------------------------------------------------
// Patterns (compiled once)
// ---------------------------------------------------------------------------

/// A whole `<table ...>...</table>` segment; group 1 is the inner markup.
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<table(?:\s[^>]*)?>(.*?)</table\s*>").expect("table regex")
});

/// A header cell; group 1 is its content.
static HEADER_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<th(?:\s[^>]*)?>(.*?)</th\s*>").expect("header cell regex")
});

/// Opening marker of a header cell (not `<thead>`).
static HEADER_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<th[\s>/]").expect("header marker regex"));

/// A table row; group 1 is its content.
static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<tr(?:\s[^>]*)?>(.*?)</tr\s*>").expect("row regex")
});

/// A data cell; group 1 is its content.
static DATA_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<td(?:\s[^>]*)?>(.*?)</td\s*>").expect("data cell regex")
});

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Lazily extract every table in `markup`, in document order.
///
/// Tables without any surviving data row are skipped, so markup with no
/// table-like constructs yields an empty sequence.
pub fn extract_tables(markup: &str) -> impl Iterator<Item = Table> + '_ {
    TABLE_RE
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1))
        .filter_map(|inner| parse_table(inner.as_str()))
}

/// Build a table from the inner markup of one `<table>` segment.
fn parse_table(inner: &str) -> Option<Table> {
    let headers = extract_headers(inner);

    let rows: Vec<Row> = ROW_RE
        .captures_iter(inner)
        .filter_map(|caps| caps.get(1))
        .map(|row| row.as_str())
        // The header row was consumed by `extract_headers`.
        .filter(|row| !HEADER_MARKER_RE.is_match(row))
        .filter_map(|row| {
            let cells = extract_cells(row);
            if cells.is_empty() {
                return None;
            }
            Some(if headers.is_empty() {
                Row::Plain(cells)
            } else {
                Row::labeled(&headers, cells)
            })
        })
        .collect();

    trace!(headers = headers.len(), rows = rows.len(), "parsed table segment");

    if rows.is_empty() {
        return None;
    }

    Some(Table {
        headers: (!headers.is_empty()).then_some(headers),
        rows,
    })
}

/// Sanitized, non-empty header labels in order.
fn extract_headers(inner: &str) -> Vec<String> {
    HEADER_CELL_RE
        .captures_iter(inner)
        .filter_map(|caps| caps.get(1))
        .map(|cell| sanitize_fragment(cell.as_str()))
        .filter(|label| !label.is_empty())
        .collect()
}

/// Sanitized data cells of one row, in order. Empty cells are kept.
fn extract_cells(row: &str) -> Vec<String> {
    DATA_CELL_RE
        .captures_iter(row)
        .filter_map(|caps| caps.get(1))
        .map(|cell| sanitize_fragment(cell.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures")
            .join(name)
    }

    fn load_fixture(name: &str) -> String {
        fs::read_to_string(fixture_path(name))
            .unwrap_or_else(|e| panic!("failed to read fixture {name}: {e}"))
    }

    fn tables(markup: &str) -> Vec<Table> {
        extract_tables(markup).collect()
    }

    // --- Basic shapes ---

    #[test]
    fn header_table_yields_labeled_rows() {
        let markup = "<table><tr><th>Name</th><th>Age</th></tr><tr><td>Ann</td><td>30</td></tr></table>";
        let result = tables(markup);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].headers, Some(vec!["Name".to_string(), "Age".to_string()]));
        assert_eq!(
            serde_json::to_value(&result[0].rows).unwrap(),
            json!([{"Name": "Ann", "Age": "30"}])
        );
    }

    #[test]
    fn headerless_table_yields_plain_rows() {
        let markup = "<table><tbody><tr><td>a</td><td>b</td></tr><tr><td>c</td></tr></tbody></table>";
        let result = tables(markup);

        assert_eq!(result.len(), 1);
        assert!(result[0].headers.is_none());
        assert_eq!(
            result[0].rows,
            vec![
                Row::Plain(vec!["a".into(), "b".into()]),
                Row::Plain(vec!["c".into()]),
            ]
        );
    }

    #[test]
    fn no_tables_yields_empty_sequence() {
        assert!(tables("").is_empty());
        assert!(tables("<p>Just a paragraph</p>").is_empty());
        assert!(tables("<tr><td>orphan row</td></tr>").is_empty());
    }

    #[test]
    fn n_headers_m_rows() {
        let markup = r#"<table class="wrapped">
            <colgroup><col /><col /><col /></colgroup>
            <tbody>
              <tr><th>Key</th><th>Owner</th><th>State</th></tr>
              <tr><td>ENG-1</td><td>Ann</td><td>Open</td></tr>
              <tr><td>ENG-2</td><td>Bo</td></tr>
              <tr><td>ENG-3</td><td>Cy</td><td>Done</td><td>extra</td></tr>
            </tbody>
          </table>"#;
        let result = tables(markup);

        assert_eq!(result.len(), 1);
        let table = &result[0];
        assert_eq!(table.headers.as_ref().map(Vec::len), Some(3));
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows.iter().all(|row| row.len() == 3));
        // Missing trailing cell defaults to empty, extra cell is dropped.
        assert_eq!(table.rows[1].get("State"), Some(""));
        assert_eq!(table.rows[2].get("State"), Some("Done"));
    }

    // --- Ordering ---

    #[test]
    fn rows_and_tables_keep_document_order() {
        let markup = "\
            <table><tr><td>t1r1</td></tr><tr><td>t1r2</td></tr></table>\
            <p>between</p>\
            <table><tr><td>t2r1</td></tr></table>";
        let result = tables(markup);

        assert_eq!(result.len(), 2);
        assert_eq!(
            result[0].rows,
            vec![Row::Plain(vec!["t1r1".into()]), Row::Plain(vec!["t1r2".into()])]
        );
        assert_eq!(result[1].rows, vec![Row::Plain(vec!["t2r1".into()])]);
    }

    // --- Filtering ---

    #[test]
    fn header_only_table_is_dropped() {
        let markup = "<table><tr><th>A</th></tr></table><table><tr><td>kept</td></tr></table>";
        let result = tables(markup);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].rows, vec![Row::Plain(vec!["kept".into()])]);
    }

    #[test]
    fn rows_without_data_cells_are_dropped() {
        let markup = "<table><tr></tr><tr><td>x</td></tr><tr>   </tr></table>";
        let result = tables(markup);
        assert_eq!(result[0].rows.len(), 1);
    }

    #[test]
    fn empty_cells_still_count_as_cells() {
        let markup = "<table><tr><td></td><td><br/></td></tr></table>";
        let result = tables(markup);
        assert_eq!(result[0].rows, vec![Row::Plain(vec![String::new(), String::new()])]);
    }

    #[test]
    fn empty_header_labels_are_skipped() {
        let markup = "<table><tr><th></th><th>Name</th></tr><tr><td>Ann</td></tr></table>";
        let result = tables(markup);
        assert_eq!(result[0].headers, Some(vec!["Name".to_string()]));
        assert_eq!(result[0].rows[0].get("Name"), Some("Ann"));
    }

    #[test]
    fn row_with_mixed_header_marker_is_treated_as_header_row() {
        let markup = "<table><tr><th>Label</th><td>ignored</td></tr><tr><td>v</td></tr></table>";
        let result = tables(markup);
        assert_eq!(result[0].rows.len(), 1);
        assert_eq!(result[0].rows[0].get("Label"), Some("v"));
    }

    // --- Markup variations ---

    #[test]
    fn thead_and_attributes_are_handled() {
        let markup = r#"<TABLE data-layout="wide"><thead><tr class="h"><th colspan="1"><p><strong>Name</strong></p></th></tr></thead>
            <tbody><tr><td style="x"><p>Ann&nbsp;Lee</p></td></tr></tbody></TABLE>"#;
        let result = tables(markup);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].headers, Some(vec!["Name".to_string()]));
        assert_eq!(result[0].rows[0].get("Name"), Some("Ann Lee"));
    }

    #[test]
    fn cell_rich_content_is_sanitized() {
        let markup = r#"<table><tr><th>Item</th><th>Notes</th></tr>
            <tr><td>Launch</td><td>See <ac:link><ri:page ri:content-title="Plan"/></ac:link> and
            <ac:task-list><ac:task><ac:task-body>todo</ac:task-body></ac:task></ac:task-list>review</td></tr></table>"#;
        let result = tables(markup);
        assert_eq!(result[0].rows[0].get("Notes"), Some("See and review"));
    }

    #[test]
    fn unclosed_table_contributes_nothing() {
        assert!(tables("<table><tr><td>never closed</td></tr>").is_empty());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let markup = "<table><tr><td>open cell</tr><tr><td>ok</td></tr></table>";
        let result = tables(markup);
        // The first row has no closed cell; only the second survives.
        assert_eq!(result[0].rows, vec![Row::Plain(vec!["ok".into()])]);
    }

    #[test]
    fn nested_table_is_flattened_into_outer_segment() {
        let markup = "<table><tr><td>outer</td></tr><tr><td><table><tr><td>inner</td></tr></table></td></tr></table>";
        let result = tables(markup);
        // The first closing marker ends the outer segment.
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].rows[0], Row::Plain(vec!["outer".into()]));
    }

    #[test]
    fn extraction_is_lazy() {
        let markup = "<table><tr><td>1</td></tr></table><table><tr><td>2</td></tr></table>";
        let mut iter = extract_tables(markup);
        assert_eq!(iter.next().map(|t| t.rows.len()), Some(1));
        assert!(iter.next().is_some());
        assert!(iter.next().is_none());
    }

    // --- Fixture-based tests ---

    #[test]
    fn release_notes_fixture() {
        let markup = load_fixture("storage/release-notes.xml");
        let result = tables(&markup);

        assert_eq!(result.len(), 2);

        let releases = &result[0];
        assert_eq!(
            releases.headers,
            Some(vec!["Version".to_string(), "Date".to_string(), "Owner".to_string()])
        );
        assert_eq!(releases.rows.len(), 2);
        assert_eq!(releases.rows[0].get("Version"), Some("2.4.0"));
        assert_eq!(releases.rows[0].get("Owner"), Some("Ann Lee"));
        assert_eq!(releases.rows[1].get("Owner"), Some(""));

        let contacts = &result[1];
        assert!(contacts.headers.is_none());
        assert_eq!(contacts.rows[0], Row::Plain(vec!["On-call".into(), "ops@example.com".into()]));
    }
}
