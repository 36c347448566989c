//! HTTP client for the Confluence REST content API.
//!
//! Wraps the three endpoints the bridge consumes (CQL search, content read,
//! content update) and maps every failure onto [`BridgeError`]:
//! non-2xx responses become [`BridgeError::Backend`] carrying the backend's
//! error body, transport failures become [`BridgeError::Network`], and
//! undecodable bodies become [`BridgeError::Decode`].

mod auth;
pub mod models;

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use confluence_bridge_shared::{BridgeError, ConnectionConfig, Result};

pub use auth::{Credential, resolve_credential};
pub use models::{RawContent, RawSearchResponse, UpdateBody, UpdatePayload, VersionNumber};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Fields expanded on search results.
const SEARCH_EXPAND: &str = "version";

/// Fields expanded on a single content read.
const CONTENT_EXPAND: &str = "body.storage,version,space";

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("confluence-bridge/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated client bound to one Confluence site.
///
/// Built per tool invocation; the credential lives only as a sensitive
/// default header of the underlying `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ConfluenceClient {
    client: Client,
    base_url: Url,
}

impl ConfluenceClient {
    /// Create a client for the site in `conn`, authenticating with `credential`.
    pub fn new(conn: &ConnectionConfig, credential: Credential) -> Result<Self> {
        if conn.base_url.cannot_be_a_base() {
            return Err(BridgeError::config(format!(
                "Confluence URL cannot be used as a base: {}",
                conn.base_url
            )));
        }

        let mut auth_value = HeaderValue::from_str(&credential.header_value())
            .map_err(|_| BridgeError::config("credential contains characters not allowed in a header"))?;
        auth_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(conn.timeout_secs))
            .build()
            .map_err(|e| BridgeError::Network(format!("failed to build HTTP client: {e}")))?;

        debug!(scheme = credential.scheme(), base_url = %conn.base_url, "built backend client");

        Ok(Self {
            client,
            base_url: conn.base_url.clone(),
        })
    }

    /// The site root without a trailing slash, used to build view URLs.
    pub fn site_root(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Run a CQL query.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn search(&self, cql: &str, limit: u32) -> Result<RawSearchResponse> {
        let url = self.endpoint(&["content", "search"]);
        let limit = limit.to_string();
        let request = self.client.get(url.as_str()).query(&[
            ("cql", cql),
            ("limit", limit.as_str()),
            ("expand", SEARCH_EXPAND),
        ]);

        let body = send(request, &url).await?;
        decode(&body, &url)
    }

    /// Read one content entity with its storage body, version and space.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn get_content(&self, id: &str) -> Result<RawContent> {
        let url = self.endpoint(&["content", id]);
        let request = self
            .client
            .get(url.as_str())
            .query(&[("expand", CONTENT_EXPAND)]);

        let body = send(request, &url).await?;
        decode(&body, &url)
    }

    /// Replace a content entity. Returns the backend's response untouched.
    #[instrument(skip(self, payload), fields(base_url = %self.base_url, version = payload.version.number))]
    pub async fn update_content(&self, id: &str, payload: &UpdatePayload) -> Result<Value> {
        let url = self.endpoint(&["content", id]);
        let request = self.client.put(url.as_str()).json(payload);

        let body = send(request, &url).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        decode(&body, &url)
    }

    /// `<site root>/rest/api/<segments...>`, each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejected cannot-be-a-base URLs, so segments are available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["rest", "api"]).extend(segments);
        }
        url.set_query(None);
        url
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a request and return the body of a successful response.
async fn send(request: RequestBuilder, url: &Url) -> Result<String> {
    let response = request
        .send()
        .await
        .map_err(|e| BridgeError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    debug!(%url, status = status.as_u16(), "backend responded");

    let body = response
        .text()
        .await
        .map_err(|e| BridgeError::Network(format!("{url}: failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(BridgeError::Backend {
            status: status.as_u16(),
            detail: error_detail(&body),
        });
    }

    Ok(body)
}

/// Interpret an error body: JSON when it parses, raw text otherwise.
fn error_detail(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

fn decode<T: DeserializeOwned>(body: &str, url: &Url) -> Result<T> {
    serde_json::from_str(body).map_err(|e| BridgeError::Decode(format!("{url}: {e}")))
}
