//! Bridge operations for confluence-bridge.
//!
//! Ties the backend client, the markup extractor and the shared result types
//! into the three tool operations: CQL search, page read and page update.

pub mod normalize;
pub mod tools;
pub mod update;

pub use normalize::{get_page, normalize_document, normalize_search, search};
pub use tools::{DEFAULT_LIMIT, ToolDefinition, dispatch, tool_definitions};
pub use update::{build_update_payload, update_page};
