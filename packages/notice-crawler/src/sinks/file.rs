//! Local directory sink: `<root>/<folder...>/<file>`.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use notice_pipeline::{NotificationSink, Payload, SinkError, SinkResult};

use super::{body_bytes, sanitize_file_name, stored_file};

pub struct FileSink {
    root: PathBuf,
}

impl FileSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where a payload would be written.
    pub fn path_for(&self, payload: &Payload) -> PathBuf {
        let mut path = self.root.clone();
        for part in &payload.folder {
            path.push(sanitize_file_name(part));
        }
        path.push(stored_file(payload).0);
        path
    }
}

#[async_trait]
impl NotificationSink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn deliver(&self, payload: &Payload) -> SinkResult<()> {
        let path = self.path_for(payload);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(SinkError::transport)?;
        }
        tokio::fs::write(&path, body_bytes(payload))
            .await
            .map_err(SinkError::transport)?;

        info!(path = %path.display(), "Saved payload");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_writes_file_payload_into_folder_tree() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let payload = Payload::file(
            "Lớp 5 | Toán | KNTT",
            "de:thi?.pdf",
            Some("application/pdf".into()),
            Bytes::from_static(b"%PDF-1.4"),
        )
        .with_folder(["Lớp 5", "Toán", "KNTT"]);

        sink.deliver(&payload).await.unwrap();

        let expected = dir.path().join("Lớp 5").join("Toán").join("KNTT").join("de_thi_.pdf");
        assert_eq!(std::fs::read(expected).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_writes_html_payload_named_after_title() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let payload = Payload::html("Thông báo 1/2025", "<p>hi</p>");

        sink.deliver(&payload).await.unwrap();

        let expected = dir.path().join("Thông báo 1_2025.html");
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "<p>hi</p>");
    }
}
