//! Tool catalog and invocation routing.
//!
//! A tool call is a name plus a JSON object of arguments. Arguments and
//! credentials are validated before any request is sent; backend failures
//! are returned as `{"error": ...}` values rather than errors.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use confluence_bridge_client::{ConfluenceClient, resolve_credential};
use confluence_bridge_shared::{BridgeError, ConnectionConfig, Result};

use crate::normalize::{get_page, search};
use crate::update::update_page;

pub const SEARCH_TOOL: &str = "execute_cql_search";
pub const GET_PAGE_TOOL: &str = "get_page_content";
pub const UPDATE_PAGE_TOOL: &str = "update_page_content";

/// Result count used when a search does not name one.
pub const DEFAULT_LIMIT: u32 = 10;

/// A tool as advertised to the calling agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON Schema of the argument object.
    pub input_schema: Value,
}

/// The tools this bridge exposes.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SEARCH_TOOL,
            description: "Execute a CQL query on Confluence to search pages",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "cql": { "type": "string", "description": "CQL query string" },
                    "limit": {
                        "type": "integer",
                        "description": "Number of results to return",
                        "default": DEFAULT_LIMIT
                    }
                },
                "required": ["cql"]
            }),
        },
        ToolDefinition {
            name: GET_PAGE_TOOL,
            description: "Get the content of a Confluence page",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pageId": { "type": "string", "description": "Confluence Page ID" }
                },
                "required": ["pageId"]
            }),
        },
        ToolDefinition {
            name: UPDATE_PAGE_TOOL,
            description: "Update the content of a Confluence page",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "pageId": { "type": "string", "description": "Confluence Page ID" },
                    "content": {
                        "type": "string",
                        "description": "HTML content to update the page with"
                    },
                    "title": {
                        "type": "string",
                        "description": "Page title (optional, if you want to change it)"
                    }
                },
                "required": ["pageId", "content"]
            }),
        },
    ]
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Validated arguments of one tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ToolCall {
    Search {
        cql: String,
        limit: u32,
    },
    GetPage {
        page_id: String,
    },
    UpdatePage {
        page_id: String,
        content: String,
        title: Option<String>,
    },
}

impl ToolCall {
    fn parse(name: &str, args: &Map<String, Value>) -> Result<Self> {
        match name {
            SEARCH_TOOL => Ok(Self::Search {
                cql: required(args, "cql", "CQL query is required")?,
                limit: limit_arg(args)?,
            }),
            GET_PAGE_TOOL => Ok(Self::GetPage {
                page_id: required(args, "pageId", "Page ID is required")?,
            }),
            UPDATE_PAGE_TOOL => Ok(Self::UpdatePage {
                page_id: required(args, "pageId", "Page ID is required")?,
                content: required(args, "content", "Content is required")?,
                title: scalar(args, "title")?.filter(|t| !t.is_empty()),
            }),
            other => Err(BridgeError::UnknownTool(other.to_string())),
        }
    }
}

/// Invoke tool `name` against the backend described by `conn`.
///
/// Returns the serialized result, or `{"error": ...}` when the backend
/// rejected the request. Invalid arguments, missing credentials and unknown
/// tools are returned as `Err` without touching the network.
#[instrument(skip(conn, args), fields(base_url = %conn.base_url))]
pub async fn dispatch(conn: &ConnectionConfig, name: &str, args: &Map<String, Value>) -> Result<Value> {
    let call = ToolCall::parse(name, args)?;
    let credential = resolve_credential(conn)?;
    let client = ConfluenceClient::new(conn, credential)?;

    debug!(?call, "dispatching tool call");

    let value = match call {
        ToolCall::Search { cql, limit } => to_value(search(&client, &cql, limit).await)?,
        ToolCall::GetPage { page_id } => to_value(get_page(&client, &page_id).await)?,
        ToolCall::UpdatePage {
            page_id,
            content,
            title,
        } => to_value(update_page(&client, &page_id, &content, title.as_deref()).await)?,
    };

    Ok(value)
}

fn to_value(result: impl Serialize) -> Result<Value> {
    serde_json::to_value(result).map_err(|e| BridgeError::Decode(format!("failed to serialize result: {e}")))
}

// ---------------------------------------------------------------------------
// Argument helpers
// ---------------------------------------------------------------------------

/// A scalar argument as text. Numbers and booleans are stringified; `null`
/// counts as absent.
fn scalar(args: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(BridgeError::config(format!("{key} must be a string"))),
    }
}

fn required(args: &Map<String, Value>, key: &str, missing: &str) -> Result<String> {
    scalar(args, key)?
        .filter(|v| !v.is_empty())
        .ok_or_else(|| BridgeError::config(missing))
}

fn limit_arg(args: &Map<String, Value>) -> Result<u32> {
    let invalid = || BridgeError::config("limit must be a non-negative integer");

    match args.get("limit") {
        None | Some(Value::Null) => Ok(DEFAULT_LIMIT),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<u32>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
