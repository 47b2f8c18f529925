// Copyright 2026 Rera Scraper Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP trigger for the scraper.
//!
//! A thin axum layer over [`ScrapeService`]: one endpoint starts a run and
//! blocks until it is persisted, the others serve what the last run wrote.

use crate::record::COLUMNS;
use crate::service::ScrapeService;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Build the axum Router with all endpoints.
pub fn router(service: Arc<ScrapeService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/scrape", post(scrape))
        .route("/data", get(data))
        .route("/download", get(download))
        .layer(cors)
        .with_state(service)
}

/// Serve the router on localhost until the process is stopped.
pub async fn start(port: u16, service: Arc<ScrapeService>) -> anyhow::Result<()> {
    let app = router(service);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    info!("HTTP trigger listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "error", "message": message })),
    )
        .into_response()
}

// ── Handlers ────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn status(State(service): State<Arc<ScrapeService>>) -> Json<Value> {
    Json(json!({
        "output": service.output_path().display().to_string(),
        "columns": COLUMNS,
        "last_run": service.last_run().await,
    }))
}

async fn scrape(State(service): State<Arc<ScrapeService>>) -> Response {
    match service.run_now().await {
        Ok(summary) => Json(json!({ "status": "done", "count": summary.count })).into_response(),
        Err(e) => {
            error!(error = %e, "scrape run failed");
            internal_error(e.to_string())
        }
    }
}

async fn data(State(service): State<Arc<ScrapeService>>) -> Response {
    // The CSV read is synchronous file I/O.
    match tokio::task::spawn_blocking(move || service.results()).await {
        Ok(Ok(rows)) => Json(rows).into_response(),
        Ok(Err(e)) => internal_error(e.to_string()),
        Err(e) => internal_error(format!("result read aborted: {e}")),
    }
}

async fn download(State(service): State<Arc<ScrapeService>>) -> Response {
    let path = service.output_path();
    let body = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "status": "error", "message": "no data has been scraped yet" })),
            )
                .into_response();
        }
        Err(e) => return internal_error(e.to_string()),
    };
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "projects.csv".to_string());
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ScraperConfig, Timings};
    use crate::session::fake::{FakeCard, FakeFactory, FakePage, FakeSite};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const LISTING: &str = "https://rera.example.test/projects/project-list";
    const DETAIL: &str = "https://rera.example.test/projects/project-details/1";

    fn service(dir: &std::path::Path, fail: bool) -> Arc<ScrapeService> {
        let site = FakeSite::new(
            LISTING,
            vec![FakeCard::project(DETAIL), FakeCard::project(DETAIL)],
        )
        .with_page(
            DETAIL,
            FakePage {
                html: "<div>Project Name: Jagannath Vihar</div>".into(),
                promoter_html: None,
            },
        );
        let mut factory = FakeFactory::new(site);
        factory.fail = fail;
        let config = ScraperConfig {
            listing_url: LISTING.into(),
            output: dir.join("rera.csv"),
            timings: Timings::instant(),
            ..ScraperConfig::default()
        };
        Arc::new(ScrapeService::new(Arc::new(factory), config))
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = call(router(service(dir.path(), false)), "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "ok");
    }

    #[tokio::test]
    async fn test_scrape_then_data_and_download() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), false);

        let (status, body) = call(router(svc.clone()), "POST", "/scrape").await;
        assert_eq!(status, StatusCode::OK);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v, json!({ "status": "done", "count": 1 }));

        let (status, body) = call(router(svc.clone()), "GET", "/data").await;
        assert_eq!(status, StatusCode::OK);
        let rows: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(rows[0]["Project Name"], "Jagannath Vihar");
        assert_eq!(rows[0]["URL"], DETAIL);

        let (status, body) = call(router(svc), "GET", "/download").await;
        assert_eq!(status, StatusCode::OK);
        let csv = String::from_utf8(body).unwrap();
        assert!(csv.starts_with("Rera Regd. No,Project Name,"));
    }

    #[tokio::test]
    async fn test_data_empty_and_download_missing() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(dir.path(), false);

        let (status, body) = call(router(svc.clone()), "GET", "/data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"[]");

        let (status, _) = call(router(svc), "GET", "/download").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scrape_setup_failure_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = call(router(service(dir.path(), true)), "POST", "/scrape").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["status"], "error");
    }
}
