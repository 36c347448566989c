//! Wire types for the Confluence REST content API.
//!
//! Every field of a response type is optional: the backend omits fields it
//! was not asked to expand, and normalization treats absence as absence.

use serde::{Deserialize, Deserializer, Serialize};

use confluence_bridge_shared::SpaceRef;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `GET content/search` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchResponse {
    pub size: Option<u64>,
    pub limit: Option<u64>,
    pub results: Option<Vec<RawContent>>,
}

/// A content entity (page, blog post) as returned by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContent {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub space: Option<RawSpace>,
    pub version: Option<RawVersion>,
    pub body: Option<RawBody>,
    #[serde(rename = "_links")]
    pub links: Option<RawLinks>,
}

impl RawContent {
    /// The storage-format body, if it was expanded.
    pub fn storage_value(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| b.storage.as_ref())
            .and_then(|s| s.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpace {
    pub key: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVersion {
    pub number: Option<u64>,
    pub when: Option<String>,
    pub by: Option<RawUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUser {
    pub display_name: Option<String>,
    pub username: Option<String>,
}

impl RawUser {
    /// Display name, falling back to the username.
    pub fn label(&self) -> Option<String> {
        self.display_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.username.as_deref())
            .map(String::from)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBody {
    pub storage: Option<RawStorage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStorage {
    pub value: Option<String>,
    pub representation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLinks {
    pub webui: Option<String>,
}

/// Accept ids sent either as JSON strings or numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// Update request
// ---------------------------------------------------------------------------

/// Representation name for storage-format bodies.
pub const STORAGE_REPRESENTATION: &str = "storage";

/// `PUT content/{id}` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub space: SpaceRef,
    pub body: UpdateBody,
    pub version: VersionNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateBody {
    pub storage: StorageValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageValue {
    pub value: String,
    pub representation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionNumber {
    pub number: u64,
}

impl UpdateBody {
    /// Wrap `value` as a storage-format body.
    pub fn storage(value: impl Into<String>) -> Self {
        Self {
            storage: StorageValue {
                value: value.into(),
                representation: STORAGE_REPRESENTATION.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn content_fixture_deserializes() {
        let fixture = std::fs::read_to_string(
            std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("../../../fixtures/json/content.fixture.json"),
        )
        .expect("read fixture");
        let content: RawContent = serde_json::from_str(&fixture).expect("deserialize fixture");

        assert_eq!(content.id.as_deref(), Some("98765"));
        assert_eq!(content.kind.as_deref(), Some("page"));
        assert_eq!(content.version.as_ref().and_then(|v| v.number), Some(7));
        assert!(content.storage_value().unwrap().starts_with("<table>"));
        assert_eq!(
            content.links.and_then(|l| l.webui).as_deref(),
            Some("/spaces/ENG/pages/98765/Release+notes")
        );
    }

    #[test]
    fn sparse_content_deserializes() {
        let content: RawContent = serde_json::from_value(json!({"id": 42})).unwrap();
        assert_eq!(content.id.as_deref(), Some("42"));
        assert!(content.space.is_none());
        assert!(content.storage_value().is_none());

        let content: RawContent = serde_json::from_value(json!({"id": null, "body": {}})).unwrap();
        assert!(content.id.is_none());
        assert!(content.storage_value().is_none());
    }

    #[test]
    fn user_label_falls_back_to_username() {
        let user = RawUser {
            display_name: None,
            username: Some("alee".into()),
        };
        assert_eq!(user.label().as_deref(), Some("alee"));

        let user = RawUser {
            display_name: Some("Ann Lee".into()),
            username: Some("alee".into()),
        };
        assert_eq!(user.label().as_deref(), Some("Ann Lee"));
    }

    #[test]
    fn update_payload_wire_shape() {
        let payload = UpdatePayload {
            id: "98765".into(),
            kind: Some("page".into()),
            title: Some("Release notes".into()),
            space: SpaceRef {
                key: Some("ENG".into()),
                name: Some("Engineering".into()),
            },
            body: UpdateBody::storage("<p>new</p>"),
            version: VersionNumber { number: 8 },
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "id": "98765",
                "type": "page",
                "title": "Release notes",
                "space": {"key": "ENG", "name": "Engineering"},
                "body": {"storage": {"value": "<p>new</p>", "representation": "storage"}},
                "version": {"number": 8}
            })
        );
    }
}
