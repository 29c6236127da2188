mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use common::{FailingRelocator, Harness, SlowRelocator, body_json};
use futures_util::{StreamExt, stream};
use marquee_config::AdminToken;
use serde_json::json;
use tower::ServiceExt;

const PAGES: [(&str, &str); 3] = [
    ("file1.html", "<p>one</p>"),
    ("file2.html", "<p>two</p>"),
    ("file3.html", "<p>three</p>"),
];

#[tokio::test]
async fn batch_reports_every_failure_in_one_json_response() -> Result<()> {
    let harness = Harness::build(|_| {}, Some(FailingRelocator::new(&["file2.html"]))).await?;

    let response = harness.upload(&PAGES, true).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await?;
    assert!(outcome["batch_id"].is_string());
    assert_eq!(outcome["total"], 3);
    assert_eq!(outcome["succeeded"], 2);
    assert_eq!(
        outcome["failures"],
        json!([{ "original_name": "file2.html", "error_kind": "IOError" }])
    );

    assert_eq!(harness.namespace.entries()?, ["file1.html", "file3.html"]);
    assert_eq!(harness.namespace.staged_count()?, 0);
    assert_eq!(
        std::fs::read_to_string(harness.namespace.root().join("file3.html"))?,
        "<p>three</p>"
    );
    Ok(())
}

#[tokio::test]
async fn browser_uploads_get_a_single_redirect() -> Result<()> {
    let harness = Harness::build(|_| {}, Some(FailingRelocator::new(&["file2.html"]))).await?;

    let response = harness.upload(&PAGES, false).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).map(|v| v.as_bytes()),
        Some(&b"/admin/watch-pages"[..])
    );
    assert_eq!(harness.namespace.entries()?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn uploaded_pages_are_listed_and_served() -> Result<()> {
    let harness = Harness::new().await?;
    harness.register("DEV1", true).await?;

    let response = harness.upload(&PAGES, true).await?;
    assert_eq!(body_json(response).await?["succeeded"], 3);

    let listing = body_json(harness.get("/admin/watch-pages").await?).await?;
    assert_eq!(listing, json!(["file1.html", "file2.html", "file3.html"]));

    let response = harness.get("/downloads/file2.html?user=DEV1").await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.metrics.snapshot().ingest_items_moved_total, 3);
    Ok(())
}

#[tokio::test]
async fn oversized_batches_are_rejected_without_relocating() -> Result<()> {
    let harness = Harness::build(|config| config.ingest.max_batch_files = 2, None).await?;

    let response = harness.upload(&PAGES, true).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(harness.namespace.entries()?.is_empty());
    assert_eq!(harness.namespace.staged_count()?, 0);
    Ok(())
}

#[tokio::test]
async fn oversized_bodies_are_rejected_and_staging_is_cleared() -> Result<()> {
    let harness = Harness::build(|config| config.ingest.max_upload_bytes = 64, None).await?;
    let large = "x".repeat(4096);

    let response = harness.upload(&[("big.html", large.as_str())], true).await?;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(harness.namespace.entries()?.is_empty());
    assert_eq!(harness.namespace.staged_count()?, 0);
    Ok(())
}

#[tokio::test]
async fn abandoned_uploads_leave_nothing_staged() -> Result<()> {
    let harness = Harness::new().await?;
    let boundary = "marquee-test-boundary";
    let head = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"watchPage\"; filename=\"cut.html\"\r\nContent-Type: text/html\r\n\r\n<p>never finished"
    );
    let body = Body::from_stream(
        stream::iter([Ok::<_, std::io::Error>(Bytes::from(head))]).chain(stream::pending()),
    );
    let request = Request::post("/admin/watch-pages")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(body)?;
    let upload = tokio::spawn(harness.router.clone().oneshot(request));

    for _ in 0..100 {
        if harness.namespace.staged_count()? == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(harness.namespace.staged_count()?, 1);

    upload.abort();
    let _ = upload.await;
    assert_eq!(harness.namespace.staged_count()?, 0);
    assert!(harness.namespace.entries()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unsafe_names_fail_individually() -> Result<()> {
    let harness = Harness::new().await?;

    let response = harness
        .upload(&[("../escape.html", "x"), ("ok.html", "y")], true)
        .await?;
    let outcome = body_json(response).await?;
    assert_eq!(outcome["succeeded"], 1);
    assert_eq!(
        outcome["failures"],
        json!([{ "original_name": "../escape.html", "error_kind": "NameInvalid" }])
    );
    assert_eq!(harness.namespace.entries()?, ["ok.html"]);
    assert!(!harness.namespace.outside().join("escape.html").exists());
    Ok(())
}

#[tokio::test]
async fn slow_batches_time_out_but_still_land() -> Result<()> {
    let harness = Harness::build(
        |config| config.ingest.batch_timeout = Some(Duration::from_millis(50)),
        Some(Arc::new(SlowRelocator {
            delay: Duration::from_millis(400),
        })),
    )
    .await?;

    let response = harness.upload(&[("late.html", "late")], true).await?;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

    let landed = harness.namespace.root().join("late.html");
    for _ in 0..100 {
        if landed.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(landed.exists());
    assert!(harness.metrics.render()?.contains("timed_out"));
    Ok(())
}

#[tokio::test]
async fn purge_empties_the_namespace() -> Result<()> {
    let harness = Harness::new().await?;
    harness.namespace.write("a.html", "a")?;
    harness.namespace.write("b.html", "b")?;
    harness.namespace.write("old/c.html", "c")?;

    let response = harness
        .send(
            Request::post("/admin/watch-pages/purge")
                .header(header::ACCEPT, "application/json")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?, json!({ "deleted": 3, "failures": [] }));
    assert!(harness.namespace.entries()?.is_empty());

    let response = harness
        .send(Request::post("/admin/watch-pages/purge").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(harness.metrics.snapshot().cleanup_files_deleted_total, 3);
    Ok(())
}

#[tokio::test]
async fn operator_token_guards_watch_pages() -> Result<()> {
    let harness = Harness::build(
        |config| config.admin_token = Some(AdminToken::new("s3cret".to_string())),
        None,
    )
    .await?;

    let response = harness.get("/admin/watch-pages").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = harness
        .send(
            Request::get("/admin/watch-pages")
                .header("x-marquee-admin-token", "wrong")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = harness
        .send(
            Request::get("/admin/watch-pages")
                .header("x-marquee-admin-token", "s3cret")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = harness.upload(&PAGES, true).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(harness.namespace.entries()?.is_empty());
    Ok(())
}
