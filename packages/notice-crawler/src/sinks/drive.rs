//! Google Drive sink: uploads into `<root>/<folder...>`.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use notice_pipeline::{NotificationSink, Payload, SinkError, SinkResult};

use super::{body_bytes, stored_file};
use crate::google::DriveClient;

pub struct DriveSink {
    client: Arc<DriveClient>,
    root_folder_id: String,
}

impl DriveSink {
    pub fn new(client: Arc<DriveClient>, root_folder_id: impl Into<String>) -> Self {
        Self {
            client,
            root_folder_id: root_folder_id.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for DriveSink {
    fn name(&self) -> &str {
        "drive"
    }

    async fn deliver(&self, payload: &Payload) -> SinkResult<()> {
        let folder_id = self
            .client
            .ensure_path(&self.root_folder_id, &payload.folder)
            .await
            .map_err(SinkError::transport)?;

        let (file_name, content_type) = stored_file(payload);
        let file_id = self
            .client
            .upload(&folder_id, &file_name, &content_type, body_bytes(payload))
            .await
            .map_err(SinkError::transport)?;

        info!(file = %file_name, folder = %folder_id, id = %file_id, "Uploaded to Drive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use httpmock::prelude::*;
    use std::time::Duration;
    use url::Url;

    #[tokio::test]
    async fn test_uploads_into_resolved_folder() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/drive/v3/files");
                then.status(200)
                    .json_body(serde_json::json!({ "files": [{ "id": "folder-1" }] }));
            })
            .await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload/drive/v3/files")
                    .body_contains("\"parents\":[\"folder-1\"]");
                then.status(200).json_body(serde_json::json!({ "id": "file-1" }));
            })
            .await;

        let client = DriveClient::new("token", Duration::from_secs(5))
            .unwrap()
            .with_base_urls(
                Url::parse(&server.url("/drive/v3/")).unwrap(),
                Url::parse(&server.url("/upload/drive/v3/")).unwrap(),
            );
        let sink = DriveSink::new(Arc::new(client), "root");
        let payload = Payload::file("t", "a.pdf", None, Bytes::from_static(b"%PDF"))
            .with_folder(["Lớp 5"]);

        sink.deliver(&payload).await.unwrap();
        upload.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_failure_is_transport_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET);
                then.status(401);
            })
            .await;

        let client = DriveClient::new("token", Duration::from_secs(5))
            .unwrap()
            .with_base_urls(
                Url::parse(&server.url("/drive/v3/")).unwrap(),
                Url::parse(&server.url("/upload/drive/v3/")).unwrap(),
            );
        let sink = DriveSink::new(Arc::new(client), "root");
        let payload = Payload::html("t", "<p></p>").with_folder(["x"]);

        let err = sink.deliver(&payload).await.unwrap_err();
        assert!(matches!(err, SinkError::Transport(_)));
    }
}
