//! Spreadsheet → download → local folder → status cell, through the pipeline.

use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use notice_crawler::google::SheetsClient;
use notice_crawler::sheet::{default_layout, SheetSource, SheetStatusStore};
use notice_crawler::sinks::FileSink;
use notice_pipeline::{DedupStore, Filters, Pipeline, RunOptions, SelectorPolicy};

#[tokio::test]
async fn test_single_group_transfers_first_pending_subject_only() {
    let server = MockServer::start_async().await;
    let doc = |name: &str| server.url(format!("/files/{}", name));

    server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/values/");
            then.status(200).json_body(json!({
                "values": [
                    ["Toán", doc("t1.pdf"), "x"],
                    ["", doc("t2.pdf"), "", doc("t2-ctst.pdf")],
                    ["Văn", doc("v1.pdf")]
                ]
            }));
        })
        .await;
    let downloads = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/files/");
            then.status(200)
                .header("content-type", "application/pdf")
                .body("%PDF-1.4");
        })
        .await;
    let marks = server
        .mock_async(|when, then| {
            when.method(PUT).path_contains("/values/");
            then.status(200).json_body(json!({ "updatedCells": 1 }));
        })
        .await;

    let sheets = Arc::new(
        SheetsClient::new("token", "sheet-id", Duration::from_secs(5))
            .unwrap()
            .with_base_url(Url::parse(&server.url("/v4/")).unwrap()),
    );
    let store = Arc::new(SheetStatusStore::new(sheets.clone()));
    let dir = tempfile::tempdir().unwrap();

    let dedup: Arc<dyn DedupStore> = store.clone();
    let pipeline = Pipeline::new(dedup, Arc::new(FileSink::new(dir.path())));
    let source = SheetSource::new(sheets, reqwest::Client::new(), default_layout("Lớp 5"), &store);

    let summary = pipeline
        .run(
            Arc::new(source),
            &RunOptions::new(Filters::new(), SelectorPolicy::SingleGroup),
        )
        .await
        .unwrap();

    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.delivered, 1);

    let base = dir.path().join("Lớp 5").join("Toán").join("KNTT");
    assert!(base.join("t2.pdf").exists());
    assert!(!dir.path().join("Lớp 5").join("Văn").exists());
    assert!(!dir.path().join("Lớp 5").join("Toán").join("CTST").exists());

    downloads.assert_hits_async(1).await;
    marks.assert_hits_async(1).await;
    assert!(store.is_processed("Lớp 5!C3").await.unwrap());
    assert!(!store.is_processed("Lớp 5!E3").await.unwrap());
}
