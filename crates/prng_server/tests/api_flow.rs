//! End-to-end tests against a live server on an ephemeral port.
//!
//! Walks the lab workflow: generate, period, Cesàro, randomness and export
//! for one parameter set, through both route families.

use approx::assert_relative_eq;
use prng_server::config::ServerConfig;
use prng_server::server::Server;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;

async fn start() -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        Server::new(ServerConfig::default())
            .run_with_listener(listener)
            .await
            .ok();
    });
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    (addr, handle)
}

async fn post(client: &reqwest::Client, addr: SocketAddr, path: &str, body: &Value) -> Value {
    let response = client
        .post(format!("http://{addr}{path}"))
        .json(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK, "{path}");
    response.json().await.unwrap()
}

#[tokio::test]
async fn test_lab_workflow() {
    let (addr, handle) = start().await;
    let client = reqwest::Client::new();
    let params = json!({ "m": 9, "a": 2, "c": 0, "x0": 1, "count": 10 });

    let generated = post(&client, addr, "/lab1/generate/", &params).await;
    assert_eq!(generated["success"], true);
    assert_eq!(generated["sequence"], json!([2, 4, 8, 7, 5, 1, 2, 4, 8, 7]));
    assert_eq!(generated["parameters"]["m"], 9);

    let period = post(&client, addr, "/lab1/period/", &params).await;
    assert_eq!(period["period"], 6);
    assert_eq!(period["max_possible_period"], 9);
    assert_relative_eq!(period["percentage"].as_f64().unwrap(), 600.0 / 9.0, epsilon = 1e-9);

    let randomness = post(&client, addr, "/lab1/randomness/", &params).await;
    assert_eq!(randomness["success"], true);
    assert_eq!(randomness["count"], 10);

    let export = client
        .post(format!("http://{addr}/lab1/export/"))
        .json(&params)
        .send()
        .await
        .unwrap();
    assert_eq!(export.status(), StatusCode::OK);
    assert!(export
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("result_lr1.txt"));
    let text = export.text().await.unwrap();
    assert!(text.contains("Count = 10"));
    assert!(text.ends_with("10\t7\n"));

    handle.abort();
}

#[tokio::test]
async fn test_minstd_cesaro_within_five_percent() {
    let (addr, handle) = start().await;
    let client = reqwest::Client::new();
    let body = json!({
        "m": 2_147_483_647u64, "a": 48_271, "c": 0, "x0": 1,
        "num_pairs": 100_000, "seed": 2024
    });

    let json = post(&client, addr, "/api/v1/cesaro", &body).await;
    assert_eq!(json["success"], true);
    assert!(json["our_generator"]["error_percentage"].as_f64().unwrap() < 5.0);
    assert!(json["system_generator"]["error_percentage"].as_f64().unwrap() < 5.0);

    handle.abort();
}

#[tokio::test]
async fn test_validation_errors_keep_http_200() {
    let (addr, handle) = start().await;
    let client = reqwest::Client::new();

    for path in ["/lab1/generate/", "/lab1/period/", "/lab1/cesaro/", "/lab1/randomness/"] {
        let json = post(&client, addr, path, &json!({ "m": 9, "a": -1, "c": 0, "x0": 1 })).await;
        assert_eq!(json["success"], false, "{path}");
        assert!(json["error"].as_str().unwrap().contains("'a'"), "{path}");
    }

    handle.abort();
}

#[tokio::test]
async fn test_export_validation_error_is_bad_request() {
    let (addr, handle) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/lab1/export/"))
        .json(&json!({ "m": 9, "a": -1, "c": 0, "x0": 1 }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get("content-disposition").is_none());
    let json: Value = response.json().await.unwrap();
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("'a'"));

    handle.abort();
}
