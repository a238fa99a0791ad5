//! End-to-end runs against a mock HTTP site and a SQLite Dedup Store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use httpmock::prelude::*;
use url::Url;

use notice_pipeline::testing::{MockSource, RecordingSink};
use notice_pipeline::{
    Candidate, ClientOptions, Filters, ListingSpec, ManifestSpec, Pipeline, PipelineConfig,
    Recipe, RunOptions, SelectorPolicy, SourceAdapter, SourceError, SqliteStore, WebSource,
};

const LISTING: &str = r#"<html><body>
  <table class="table-data"><tbody>
    <tr><td>1</td><td><a href="/van-ban/1.htm">Thông báo tuyển dụng 1</a></td><td>BVHTTDL</td><td>25/03/2025</td></tr>
    <tr><td>2</td><td><a href="/van-ban/2.htm">Thông báo tuyển dụng 2</a></td><td>BVHTTDL</td><td>20/03/2025</td></tr>
    <tr><td>3</td><td><a href="/van-ban/3.htm">Thông báo cũ</a></td><td>BVHTTDL</td><td>01/06/2024</td></tr>
  </tbody></table>
</body></html>"#;

const DETAIL: &str = r#"<html><body>
  <table class="table-detail"><tbody>
    <tr><td>Trích yếu</td><td>Tuyển dụng viên chức</td></tr>
    <tr><td>Tệp</td><td id="file-placeholder"><script>var _files = [{"FileName":"tb.pdf","FileUrl":"https://files.vn/tb.pdf"}];</script></td></tr>
  </tbody></table>
</body></html>"#;

const BAD_DATE_LISTING: &str = r#"<html><body>
  <table class="table-data"><tbody>
    <tr><td>1</td><td><a href="/van-ban/1.htm">A</a></td><td>x</td><td>25/03/2025</td></tr>
    <tr><td>2</td><td><a href="/van-ban/2.htm">B</a></td><td>x</td><td>hôm nay</td></tr>
  </tbody></table>
</body></html>"#;

fn web_source(server: &MockServer) -> Arc<dyn SourceAdapter> {
    let root = Url::parse(&server.url("/")).unwrap();
    let listing = ListingSpec::rows(".table-data > tbody > tr", "td:nth-child(2) a")
        .with_title("td:nth-child(2)")
        .with_date("td:nth-child(4)");
    let recipe = Recipe::new(root, ".table-detail")
        .with_manifest(ManifestSpec::new("file-placeholder", "_files"));

    Arc::new(
        WebSource::new(
            "bvhttdl",
            &server.url("/van-ban-quan-ly.htm"),
            &listing,
            recipe,
            &ClientOptions::default().with_timeout(Duration::from_secs(5)),
        )
        .unwrap(),
    )
}

fn recent_only() -> RunOptions {
    let filters = Filters::new()
        .with_recency_window(90)
        .with_today(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    RunOptions::new(filters, SelectorPolicy::FullSweep)
}

#[tokio::test]
async fn test_web_source_end_to_end_with_sqlite() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/van-ban-quan-ly.htm");
            then.status(200).body(LISTING);
        })
        .await;
    let detail_1 = server
        .mock_async(|when, then| {
            when.method(GET).path("/van-ban/1.htm");
            then.status(200).body(DETAIL);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/van-ban/2.htm");
            then.status(500);
        })
        .await;

    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let sink = Arc::new(RecordingSink::new());
    let pipeline = Pipeline::new(store.clone(), sink.clone())
        .with_config(PipelineConfig::new().with_max_concurrency(2));

    let summary = pipeline.run(web_source(&server), &recent_only()).await.unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.delivered, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(store.count().await.unwrap(), 1);

    let delivered = sink.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].title, "Thông báo tuyển dụng 1");
    let markup = delivered[0].markup().unwrap();
    assert!(markup.contains(r#"<a href="https://files.vn/tb.pdf" target="_blank" rel="noopener">tb.pdf</a>"#));
    assert!(!markup.contains("<script>"));

    // Second run: item 1 is known, item 2 is retried and fails again
    let again = pipeline.run(web_source(&server), &recent_only()).await.unwrap();
    assert_eq!(again.skipped, 1);
    assert_eq!(again.attempted, 1);
    assert_eq!(sink.delivered().len(), 1);
    detail_1.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_malformed_date_aborts_source_with_nothing_processed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/van-ban-quan-ly.htm");
            then.status(200).body(BAD_DATE_LISTING);
        })
        .await;
    let detail = server
        .mock_async(|when, then| {
            when.method(GET).path("/van-ban/1.htm");
            then.status(200).body(DETAIL);
        })
        .await;

    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let sink = Arc::new(RecordingSink::new());

    let err = Pipeline::new(store.clone(), sink.clone())
        .run(web_source(&server), &recent_only())
        .await
        .unwrap_err();

    assert!(matches!(err, SourceError::DateParse { .. }));
    assert!(sink.delivered().is_empty());
    assert_eq!(store.count().await.unwrap(), 0);
    detail.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_single_group_run_touches_one_group_only() {
    let slot = |id: &str, group: &str| {
        Candidate::new(format!("Lớp 5!C{id}"), format!("Lớp 5 | {group} | KNTT"))
            .with_detail_locator(format!("https://files.vn/{id}.pdf"))
            .with_group(group)
            .with_slot("KNTT")
    };
    let store = Arc::new(notice_pipeline::MemoryStore::with_processed(["Lớp 5!C2"]));
    let sink = Arc::new(RecordingSink::new());
    let source = Arc::new(MockSource::new("sheet").with_candidates([
        slot("2", "Toán"),
        slot("3", "Tiếng Việt"),
        slot("4", "Tiếng Việt"),
        slot("5", "Khoa học"),
    ]));

    let options = RunOptions::new(Filters::new(), SelectorPolicy::SingleGroup);
    let summary = Pipeline::new(store.clone(), sink.clone())
        .run(source.clone(), &options)
        .await
        .unwrap();

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.delivered, 2);
    let mut fetched = source.fetched();
    fetched.sort();
    assert_eq!(fetched, vec!["Lớp 5!C3".to_string(), "Lớp 5!C4".to_string()]);
    assert!(store.processed_at("Lớp 5!C5").is_none());
}
