//! Read-modify-write page update under optimistic version control.
//!
//! The current revision is read first, then the page is written back with
//! revision number + 1. The read and the write are independent requests; the
//! backend rejects the write if another editor got in between.

use serde_json::Value;
use tracing::{info, instrument, warn};

use confluence_bridge_client::{ConfluenceClient, UpdateBody, UpdatePayload, VersionNumber};
use confluence_bridge_shared::{Document, Outcome, detail_text};

use crate::normalize::get_page;

/// Replace the storage body of `page_id` with `content`.
///
/// `title` replaces the current title when given and non-empty. Returns the
/// backend's update response unmodified.
#[instrument(skip(client, content), fields(content_len = content.len()))]
pub async fn update_page(
    client: &ConfluenceClient,
    page_id: &str,
    content: &str,
    title: Option<&str>,
) -> Outcome<Value> {
    let current = match get_page(client, page_id).await {
        Outcome::Success(doc) => doc,
        Outcome::Failure(payload) => {
            return Outcome::failure(format!(
                "Failed to get current page: {}",
                detail_text(&payload.error)
            ));
        }
    };

    let Some(payload) = build_update_payload(&current, page_id, content, title) else {
        warn!("current page has no version number");
        return Outcome::failure(format!(
            "Failed to get current page: page {page_id} has no version number"
        ));
    };

    let next = payload.version.number;
    match client.update_content(page_id, &payload).await {
        Ok(response) => {
            info!(version = next, "page updated");
            Outcome::Success(response)
        }
        Err(e) => {
            warn!(error = %e, version = next, "page update failed");
            Outcome::from_error(&e)
        }
    }
}

/// Build the write request from the current revision. `None` when the
/// current revision number is unknown.
pub fn build_update_payload(
    current: &Document,
    page_id: &str,
    content: &str,
    title: Option<&str>,
) -> Option<UpdatePayload> {
    let number = current.version.number?;

    let title = title
        .filter(|t| !t.is_empty())
        .map(String::from)
        .or_else(|| current.title.clone());

    Some(UpdatePayload {
        id: page_id.to_string(),
        kind: current.kind.clone(),
        title,
        space: current.space.clone(),
        body: UpdateBody::storage(content),
        version: VersionNumber { number: number + 1 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use confluence_bridge_client::Credential;
    use confluence_bridge_shared::{ConnectionConfig, DocumentBody, SpaceRef, VersionInfo};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(uri: &str) -> ConfluenceClient {
        let conn = ConnectionConfig {
            base_url: Url::parse(uri).unwrap(),
            personal_token: Some("pat".into()),
            api_mail: None,
            api_key: None,
            timeout_secs: 5,
        };
        ConfluenceClient::new(&conn, Credential::Bearer { token: "pat".into() }).unwrap()
    }

    fn current_doc(version: Option<u64>) -> Document {
        Document {
            id: Some("42".into()),
            kind: Some("page".into()),
            status: Some("current".into()),
            title: Some("Runbook".into()),
            space: SpaceRef {
                key: Some("OPS".into()),
                name: Some("Operations".into()),
            },
            version: VersionInfo {
                number: version,
                when: None,
                by: None,
            },
            url: "https://wiki.example.com/pages/viewpage.action?pageId=42".into(),
            body: DocumentBody::Content("<p>old</p>".into()),
        }
    }

    fn current_page_json(version: u64) -> Value {
        json!({
            "id": "42",
            "type": "page",
            "status": "current",
            "title": "Runbook",
            "space": {"key": "OPS", "name": "Operations"},
            "version": {"number": version},
            "body": {"storage": {"value": "<p>old</p>", "representation": "storage"}}
        })
    }

    #[test]
    fn payload_bumps_version_and_keeps_title() {
        let payload = build_update_payload(&current_doc(Some(3)), "42", "<p>new</p>", None).unwrap();
        assert_eq!(payload.version.number, 4);
        assert_eq!(payload.title.as_deref(), Some("Runbook"));
        assert_eq!(payload.kind.as_deref(), Some("page"));
        assert_eq!(payload.space.key.as_deref(), Some("OPS"));
        assert_eq!(payload.body, UpdateBody::storage("<p>new</p>"));
    }

    #[test]
    fn payload_title_override() {
        let doc = current_doc(Some(1));
        let payload = build_update_payload(&doc, "42", "x", Some("Renamed")).unwrap();
        assert_eq!(payload.title.as_deref(), Some("Renamed"));

        let payload = build_update_payload(&doc, "42", "x", Some("")).unwrap();
        assert_eq!(payload.title.as_deref(), Some("Runbook"));
    }

    #[test]
    fn payload_requires_version() {
        assert!(build_update_payload(&current_doc(None), "42", "x", None).is_none());
    }

    #[tokio::test]
    async fn update_writes_next_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_page_json(3)))
            .expect(1)
            .mount(&server)
            .await;

        let response = json!({"id": "42", "version": {"number": 4}, "title": "Runbook"});
        Mock::given(method("PUT"))
            .and(path("/rest/api/content/42"))
            .and(body_json(json!({
                "id": "42",
                "type": "page",
                "title": "Runbook",
                "space": {"key": "OPS", "name": "Operations"},
                "body": {"storage": {"value": "<p>new</p>", "representation": "storage"}},
                "version": {"number": 4}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(response.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let outcome = update_page(&client, "42", "<p>new</p>", None).await;
        assert_eq!(outcome, Outcome::Success(response));
    }

    #[tokio::test]
    async fn failed_read_never_writes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/42"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "not found"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let outcome = update_page(&client, "42", "<p>new</p>", Some("T")).await;

        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"error": r#"Failed to get current page: {"message":"not found"}"#})
        );
    }

    #[tokio::test]
    async fn read_without_version_never_writes() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "42", "title": "T"})))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let outcome = update_page(&client, "42", "x", None).await;
        assert!(outcome.is_failure());
    }

    #[tokio::test]
    async fn version_conflict_is_reported_as_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_page_json(3)))
            .mount(&server)
            .await;

        let conflict = json!({
            "statusCode": 409,
            "message": "Version must be incremented on update. Current version is: 5"
        });
        Mock::given(method("PUT"))
            .and(path("/rest/api/content/42"))
            .respond_with(ResponseTemplate::new(409).set_body_json(conflict.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server.uri());
        let outcome = update_page(&client, "42", "x", None).await;
        assert_eq!(serde_json::to_value(&outcome).unwrap(), json!({"error": conflict}));
    }
}
