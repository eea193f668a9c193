//! API and worker sharing one in-process broker.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cogniread_backend::build_router;
use cogniread_backend::startup::{build_state, build_worker, connect_broker};
use cogniread_config::Config;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

fn memory_config() -> Config {
    let mut config = Config::default();
    config.queue.broker_url = "memory://".to_string();
    config.worker.concurrency = 2;
    config
}

async fn call(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(request).await.expect("response");
    let status = res.status();
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    (status, serde_json::from_slice(&bytes).expect("json"))
}

async fn wait_for_terminal(app: &axum::Router, id: &str) -> Value {
    for _ in 0..200 {
        let req = Request::get(format!("/tasks/{id}"))
            .body(Body::empty())
            .unwrap();
        let (status, record) = call(app, req).await;
        assert_eq!(status, StatusCode::OK);
        if record["status"] == "completed" || record["status"] == "failed" {
            return record;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {id} did not finish");
}

#[tokio::test]
async fn ingested_text_is_processed_by_worker() {
    let config = memory_config();
    let connection = connect_broker(&config).expect("connect");

    let worker = build_worker(&config, connection.clone());
    let shutdown = CancellationToken::new();
    let worker_handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { worker.run(shutdown).await })
    };

    let app = build_router(Arc::new(build_state(&config, connection).expect("state")));

    let req = Request::post("/ingest")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "texts": ["hello", "", "héllo wörld"] }).to_string(),
        ))
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = body["task_ids"]
        .as_array()
        .expect("task_ids")
        .iter()
        .map(|v| v.as_str().expect("id").to_string())
        .collect();
    assert_eq!(ids.len(), 2);

    let first = wait_for_terminal(&app, &ids[0]).await;
    assert_eq!(first["status"], "completed");
    assert_eq!(first["result"], json!({ "length": 5 }));
    assert_eq!(first["error"], Value::Null);

    let second = wait_for_terminal(&app, &ids[1]).await;
    assert_eq!(second["result"], json!({ "length": 11 }));

    shutdown.cancel();
    worker_handle.await.unwrap().unwrap();
}
