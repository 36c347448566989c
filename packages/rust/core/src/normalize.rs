//! Response normalization: raw backend entities into compact documents.

use tracing::{debug, instrument, warn};

use confluence_bridge_client::{ConfluenceClient, RawContent, RawSearchResponse};
use confluence_bridge_markup::extract_tables;
use confluence_bridge_shared::{
    Document, DocumentBody, DocumentSummary, Outcome, SearchResult, SpaceRef, Table, VersionInfo,
};

// ---------------------------------------------------------------------------
// Pure mapping
// ---------------------------------------------------------------------------

/// Reduce a search response to ids, titles, versions and view URLs.
pub fn normalize_search(raw: RawSearchResponse, site_root: &str) -> SearchResult {
    let results = raw
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|item| summarize(item, site_root))
        .collect();

    SearchResult {
        size: raw.size,
        limit: raw.limit,
        results,
    }
}

fn summarize(item: RawContent, site_root: &str) -> DocumentSummary {
    let (version, last_modified) = match item.version {
        Some(v) => (v.number, v.when),
        None => (None, None),
    };

    DocumentSummary {
        id: item.id,
        kind: item.kind,
        status: item.status,
        title: item.title,
        space: item.space.and_then(|s| s.key),
        version,
        last_modified,
        url: item
            .links
            .and_then(|l| l.webui)
            .map(|webui| format!("{site_root}{webui}")),
    }
}

/// Flatten a single content entity, replacing its markup with extracted
/// tables when it has any.
pub fn normalize_document(raw: RawContent, page_id: &str, site_root: &str) -> Document {
    let markup = raw.storage_value().unwrap_or_default().to_string();
    let tables: Vec<Table> = extract_tables(&markup).collect();

    let body = if tables.is_empty() {
        DocumentBody::Content(markup)
    } else {
        DocumentBody::Tables(tables)
    };

    let space = raw
        .space
        .map(|s| SpaceRef {
            key: s.key,
            name: s.name,
        })
        .unwrap_or_default();

    let version = raw
        .version
        .map(|v| VersionInfo {
            number: v.number,
            when: v.when,
            by: v.by.and_then(|u| u.label()),
        })
        .unwrap_or_default();

    Document {
        id: raw.id,
        kind: raw.kind,
        status: raw.status,
        title: raw.title,
        space,
        version,
        url: format!("{site_root}/pages/viewpage.action?pageId={page_id}"),
        body,
    }
}

// ---------------------------------------------------------------------------
// Backend-backed operations
// ---------------------------------------------------------------------------

/// Run a CQL query. Backend faults come back as [`Outcome::Failure`].
#[instrument(skip(client))]
pub async fn search(client: &ConfluenceClient, cql: &str, limit: u32) -> Outcome<SearchResult> {
    match client.search(cql, limit).await {
        Ok(raw) => {
            let result = normalize_search(raw, client.site_root());
            debug!(count = result.results.len(), "search complete");
            Outcome::Success(result)
        }
        Err(e) => {
            warn!(error = %e, "search failed");
            Outcome::from_error(&e)
        }
    }
}

/// Fetch and normalize one page. Backend faults come back as [`Outcome::Failure`].
#[instrument(skip(client))]
pub async fn get_page(client: &ConfluenceClient, page_id: &str) -> Outcome<Document> {
    match client.get_content(page_id).await {
        Ok(raw) => Outcome::Success(normalize_document(raw, page_id, client.site_root())),
        Err(e) => {
            warn!(error = %e, "page read failed");
            Outcome::from_error(&e)
        }
    }
}
