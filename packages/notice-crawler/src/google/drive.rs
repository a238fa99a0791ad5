//! Google Drive v3: folder find-or-create and multipart upload.

use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use super::{check_status, join_segments, GoogleError, GoogleResult};

pub const DRIVE_API: &str = "https://www.googleapis.com/drive/v3/";
pub const DRIVE_UPLOAD_API: &str = "https://www.googleapis.com/upload/drive/v3/";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const BOUNDARY: &str = "notice-crawler-boundary-7f3a9c";

#[derive(Debug, Deserialize)]
struct FileRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileRef>,
}

pub struct DriveClient {
    http: reqwest::Client,
    api: Url,
    upload_api: Url,
    token: String,

    /// `(parent id, name) → folder id`, filled as folders are resolved
    folders: Mutex<HashMap<(String, String), String>>,
}

impl DriveClient {
    pub fn new(token: impl Into<String>, timeout: Duration) -> GoogleResult<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(timeout).build()?,
            api: Url::parse(DRIVE_API).map_err(|e| GoogleError::Url(e.to_string()))?,
            upload_api: Url::parse(DRIVE_UPLOAD_API).map_err(|e| GoogleError::Url(e.to_string()))?,
            token: token.into(),
            folders: Mutex::new(HashMap::new()),
        })
    }

    /// Point at other API roots (tests).
    pub fn with_base_urls(mut self, api: Url, upload_api: Url) -> Self {
        self.api = api;
        self.upload_api = upload_api;
        self
    }

    async fn find_folder(&self, parent_id: &str, name: &str) -> GoogleResult<Option<String>> {
        let query = format!(
            "'{}' in parents and name='{}' and mimeType='{}' and trashed=false",
            escape_query(parent_id),
            escape_query(name),
            FOLDER_MIME
        );
        let url = join_segments(&self.api, &["files"])?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name)"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let list: FileList = serde_json::from_str(&body)?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> GoogleResult<String> {
        let url = join_segments(&self.api, &["files"])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .query(&[("supportsAllDrives", "true")])
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME,
                "parents": [parent_id],
            }))
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let created: FileRef = serde_json::from_str(&body)?;
        info!(parent = %parent_id, name = %name, id = %created.id, "Created Drive folder");
        Ok(created.id)
    }

    /// Id of the folder `name` under `parent_id`, created if missing.
    ///
    /// Resolution is serialized so concurrent uploads never create the same
    /// folder twice.
    pub async fn ensure_folder(&self, parent_id: &str, name: &str) -> GoogleResult<String> {
        let key = (parent_id.to_string(), name.to_string());
        let mut folders = self.folders.lock().await;
        if let Some(id) = folders.get(&key) {
            return Ok(id.clone());
        }

        let id = match self.find_folder(parent_id, name).await? {
            Some(id) => {
                debug!(parent = %parent_id, name = %name, id = %id, "Found Drive folder");
                id
            }
            None => self.create_folder(parent_id, name).await?,
        };
        folders.insert(key, id.clone());
        Ok(id)
    }

    /// Resolve a folder path below `root_id`, creating each level as needed.
    pub async fn ensure_path(&self, root_id: &str, path: &[String]) -> GoogleResult<String> {
        let mut current = root_id.to_string();
        for name in path {
            current = self.ensure_folder(&current, name).await?;
        }
        Ok(current)
    }

    /// Upload a file into a folder; returns the new file id.
    pub async fn upload(
        &self,
        folder_id: &str,
        file_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> GoogleResult<String> {
        let mut url = join_segments(&self.upload_api, &["files"])?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("supportsAllDrives", "true");

        let metadata = json!({ "name": file_name, "parents": [folder_id] });
        let body = multipart_related(&metadata.to_string(), content_type, bytes);

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let uploaded: FileRef = serde_json::from_str(&body)?;
        Ok(uploaded.id)
    }
}

fn escape_query(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn multipart_related(metadata: &str, content_type: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + metadata.len() + 256);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{b}\r\nContent-Type: {content_type}\r\n\r\n",
            b = BOUNDARY
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> DriveClient {
        DriveClient::new("token", Duration::from_secs(5))
            .unwrap()
            .with_base_urls(
                Url::parse(&server.url("/drive/v3/")).unwrap(),
                Url::parse(&server.url("/upload/drive/v3/")).unwrap(),
            )
    }

    #[test]
    fn test_query_escaping() {
        assert_eq!(escape_query("Tiếng Anh 'mới'"), "Tiếng Anh \\'mới\\'");
    }

    #[test]
    fn test_multipart_layout() {
        let body = multipart_related(r#"{"name":"a.pdf"}"#, "application/pdf", b"%PDF");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with(&format!("--{}\r\n", BOUNDARY)));
        assert!(text.contains("\r\n\r\n{\"name\":\"a.pdf\"}\r\n"));
        assert!(text.contains("Content-Type: application/pdf\r\n\r\n%PDF\r\n"));
        assert!(text.ends_with(&format!("--{}--\r\n", BOUNDARY)));
    }

    #[tokio::test]
    async fn test_existing_folder_is_reused_and_cached() {
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET).path("/drive/v3/files");
                then.status(200)
                    .json_body(serde_json::json!({ "files": [{ "id": "f-1", "name": "Lớp 5" }] }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/drive/v3/files");
                then.status(200).json_body(serde_json::json!({ "id": "new" }));
            })
            .await;

        let drive = client(&server);
        assert_eq!(drive.ensure_folder("root", "Lớp 5").await.unwrap(), "f-1");
        assert_eq!(drive.ensure_folder("root", "Lớp 5").await.unwrap(), "f-1");

        list.assert_hits_async(1).await;
        create.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_missing_folders_are_created_along_the_path() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/drive/v3/files");
                then.status(200).json_body(serde_json::json!({ "files": [] }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/drive/v3/files");
                then.status(200).json_body(serde_json::json!({ "id": "created" }));
            })
            .await;

        let path = vec!["Lớp 5".to_string(), "Toán".to_string(), "KNTT".to_string()];
        let id = client(&server).ensure_path("root", &path).await.unwrap();

        assert_eq!(id, "created");
        create.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn test_upload_returns_file_id() {
        let server = MockServer::start_async().await;
        let upload = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/upload/drive/v3/files")
                    .query_param("uploadType", "multipart");
                then.status(200).json_body(serde_json::json!({ "id": "file-9" }));
            })
            .await;

        let id = client(&server)
            .upload("folder", "a.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();

        assert_eq!(id, "file-9");
        upload.assert_async().await;
    }
}
