use std::time::Duration;

use reqwest::{
    Client, Method, RequestBuilder, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use url::Url;

use crate::prelude::*;
use crate::request_client::{expect_status, read_json};

use super::context::endpoint;
use super::interfaces::{
    Document, ProjectId, RegisterUploadPayload, Resource, UploadId, UploadKind, UploadRecord,
    UploadStatus, UploadStatusResource,
};

const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

const PROJECT_LOOKUP: &str = "project lookup";
const UPLOAD_REGISTRATION: &str = "upload registration";
const UPLOAD_STATUS: &str = "upload status";

/// Client of the JSON:API metadata service.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    base: Url,
    timeout: Duration,
}

impl MetadataClient {
    pub fn new(client: Client, base: Url, timeout: Duration) -> Self {
        Self {
            client,
            base,
            timeout,
        }
    }

    fn request(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .timeout(self.timeout)
            .bearer_auth(token)
            .header(ACCEPT, JSON_API_CONTENT_TYPE)
            .header(CONTENT_TYPE, JSON_API_CONTENT_TYPE)
    }

    /// Find the project owning `api_key`. The first match wins.
    pub async fn resolve_project(&self, api_key: &str, token: &str) -> UploadResult<ProjectId> {
        let mut url = endpoint(&self.base, &["project"])?;
        url.query_pairs_mut()
            .append_pair("fields[project]", "apiKey")
            .append_pair("filter[project.apiKey]", api_key);

        let response = self
            .request(Method::GET, url, token)
            .send()
            .await
            .map_err(UploadError::http(PROJECT_LOOKUP))?;
        let response = expect_status(response, PROJECT_LOOKUP, &[StatusCode::OK]).await?;
        let document: Document<Vec<Resource>> = read_json(response, PROJECT_LOOKUP).await?;

        document
            .data
            .into_iter()
            .next()
            .map(|project| ProjectId(project.id))
            .ok_or_else(|| UploadError::ProjectNotFound {
                api_key: api_key.to_string(),
            })
    }

    /// Create the upload record that the archive will be attached to.
    pub async fn register_upload(
        &self,
        project_id: &ProjectId,
        kind: UploadKind,
        content_length: u64,
        token: &str,
    ) -> UploadResult<UploadId> {
        let url = endpoint(&self.base, &["project", project_id.0.as_str(), "uploads"])?;
        let payload = RegisterUploadPayload::new(project_id, kind, content_length);
        trace!(
            "Upload registration payload: {}",
            serde_json::to_string(&payload).unwrap_or_default()
        );

        let response = self
            .request(Method::POST, url, token)
            .json(&payload)
            .send()
            .await
            .map_err(UploadError::http(UPLOAD_REGISTRATION))?;
        let response = expect_status(response, UPLOAD_REGISTRATION, &[StatusCode::CREATED]).await?;
        let document: Document<Resource> = read_json(response, UPLOAD_REGISTRATION).await?;

        Ok(UploadId(document.data.id))
    }

    /// Fetch the processing status of an upload.
    pub async fn poll_status(
        &self,
        project_id: &ProjectId,
        upload_id: &UploadId,
        token: &str,
    ) -> UploadResult<UploadRecord> {
        let mut url = endpoint(
            &self.base,
            &[
                "project",
                project_id.0.as_str(),
                "uploads",
                upload_id.0.as_str(),
            ],
        )?;
        url.query_pairs_mut()
            .append_pair("fields[upload]", "uploadStatus,failureReason");

        let response = self
            .request(Method::GET, url, token)
            .send()
            .await
            .map_err(UploadError::http(UPLOAD_STATUS))?;
        let response = expect_status(response, UPLOAD_STATUS, &[StatusCode::OK]).await?;
        let document: Document<UploadStatusResource> = read_json(response, UPLOAD_STATUS).await?;

        let resource = document.data;
        Ok(UploadRecord {
            id: resource.id.map(UploadId).unwrap_or_else(|| upload_id.clone()),
            status: UploadStatus::from_wire(&resource.attributes.upload_status),
            failure_reason: resource.attributes.failure_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ErrorKind;

    const TOKEN: &str = "test-token";

    async fn create_test_client(mock_server: &MockServer) -> MetadataClient {
        let base = Url::parse(&format!("{}/pulse/v1", mock_server.uri())).unwrap();
        MetadataClient::new(Client::new(), base, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_resolve_project_returns_first_match() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pulse/v1/project"))
            .and(query_param("fields[project]", "apiKey"))
            .and(query_param("filter[project.apiKey]", "API_KEY"))
            .and(header("authorization", "Bearer test-token"))
            .and(header("accept", JSON_API_CONTENT_TYPE))
            .and(header("content-type", JSON_API_CONTENT_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"id": "1234", "type": "project", "attributes": {"apiKey": "API_KEY"}},
                    {"id": "5678", "type": "project", "attributes": {"apiKey": "API_KEY"}}
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let project_id = client.resolve_project("API_KEY", TOKEN).await.unwrap();

        assert_eq!(project_id, ProjectId("1234".into()));
    }

    #[tokio::test]
    async fn test_resolve_project_empty_data() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pulse/v1/project"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = client.resolve_project("UNKNOWN", TOKEN).await.unwrap_err();

        assert!(matches!(err, UploadError::ProjectNotFound { ref api_key } if api_key == "UNKNOWN"));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_resolve_project_unexpected_status_keeps_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pulse/v1/project"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = client.resolve_project("API_KEY", TOKEN).await.unwrap_err();

        match err {
            UploadError::UnexpectedStatus {
                operation,
                status,
                body,
            } => {
                assert_eq!(operation, PROJECT_LOOKUP);
                assert_eq!(status, 500);
                assert_eq!(body, "backend exploded");
            }
            other => panic!("expected UnexpectedStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_project_malformed_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pulse/v1/project"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = client.resolve_project("API_KEY", TOKEN).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_register_upload_sends_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pulse/v1/project/1234/uploads"))
            .and(header("content-type", JSON_API_CONTENT_TYPE))
            .and(body_json(json!({
                "data": {
                    "type": "upload",
                    "attributes": {"uploadType": "ANDROID_NATIVE", "contentLength": 2048},
                    "relationships": {"project": {"data": {"id": 1234, "type": "project"}}}
                }
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"data": {"id": 99, "type": "upload"}})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let upload_id = client
            .register_upload(&ProjectId("1234".into()), UploadKind::Native, 2048, TOKEN)
            .await
            .unwrap();

        assert_eq!(upload_id, UploadId("99".into()));
    }

    #[tokio::test]
    async fn test_register_upload_requires_created() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pulse/v1/project/1234/uploads"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"id": "99"}})),
            )
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let err = client
            .register_upload(&ProjectId("1234".into()), UploadKind::Java, 10, TOKEN)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::UnexpectedStatus { status: 200, .. }
        ));
    }

    #[tokio::test]
    async fn test_poll_status_parses_failure_reason() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pulse/v1/project/1234/uploads/99"))
            .and(query_param("fields[upload]", "uploadStatus,failureReason"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "id": "99",
                    "type": "upload",
                    "attributes": {"uploadStatus": "failed", "failureReason": "bad symbols"}
                }
            })))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let record = client
            .poll_status(&ProjectId("1234".into()), &UploadId("99".into()), TOKEN)
            .await
            .unwrap();

        assert_eq!(
            record,
            UploadRecord {
                id: UploadId("99".into()),
                status: UploadStatus::Failed,
                failure_reason: Some("bad symbols".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_every_operation_maps_401_to_unauthorized() {
        let mock_server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server).await;
        let project_id = ProjectId("1234".into());
        let upload_id = UploadId("99".into());

        let errors = [
            client.resolve_project("API_KEY", TOKEN).await.unwrap_err(),
            client
                .register_upload(&project_id, UploadKind::Java, 10, TOKEN)
                .await
                .unwrap_err(),
            client
                .poll_status(&project_id, &upload_id, TOKEN)
                .await
                .unwrap_err(),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Auth, "{err:?}");
        }
    }
}
