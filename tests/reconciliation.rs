//! End-to-end scenarios spanning key collection (C2/C3) through cluster
//! reconciliation (C4/C5), against in-process mock IdP and CouchDB servers.

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use couchdb_idp_updater::config::Credentials;
use couchdb_idp_updater::couchdb::cluster::reconcile_server;
use couchdb_idp_updater::error::AppError;
use couchdb_idp_updater::keys::collector::collect_keys;
use couchdb_idp_updater::keys::{KeyId, KeySet};
use couchdb_idp_updater::restart::RestartScheduler;
use couchdb_idp_updater::status::StatusStore;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// A real Let's Encrypt staging leaf certificate (ECDSA P-256); see
/// `src/keys/pem.rs` for provenance.
const EC_LEAF_CERT_B64: &str = concat!(
    "MIID0zCCA1mgAwIBAgISLDggldDv8zKRlvUy0KsseoehMAoGCCqGSM49BAMDMFcx",
    "CzAJBgNVBAYTAlVTMSAwHgYDVQQKExcoU1RBR0lORykgTGV0J3MgRW5jcnlwdDEm",
    "MCQGA1UEAxMdKFNUQUdJTkcpIFB1enpsaW5nIFBhcnNuaXAgRTcwHhcNMjUwOTIy",
    "MTgwNjMyWhcNMjUxMjIxMTgwNjMxWjAnMSUwIwYDVQQDExxmb290ZXN0MS51c3dl",
    "c3QuZGV2LmxleGUuYXBwMFkwEwYHKoZIzj0CAQYIKoZIzj0DAQcDQgAEzjUM/iZ8",
    "gUrBqIJ1cagIWNZf9/tswhm0qQJxKaBoECcBXuxC2ogRhaVWvqzDyN46P+f8tgU5",
    "SNTWvGj/j6seLqOCAjMwggIvMA4GA1UdDwEB/wQEAwIHgDAdBgNVHSUEFjAUBggr",
    "BgEFBQcDAQYIKwYBBQUHAwIwDAYDVR0TAQH/BAIwADAdBgNVHQ4EFgQUWke2DiQT",
    "2Tlk9IcLmNb+qdb3+8AwHwYDVR0jBBgwFoAUpA+UC0RjapmpoNmMZkOxT9ywLEYw",
    "NgYIKwYBBQUHAQEEKjAoMCYGCCsGAQUFBzAChhpodHRwOi8vc3RnLWU3LmkubGVu",
    "Y3Iub3JnLzAnBgNVHREEIDAeghxmb290ZXN0MS51c3dlc3QuZGV2LmxleGUuYXBw",
    "MBMGA1UdIAQMMAowCAYGZ4EMAQIBMDEGA1UdHwQqMCgwJqAkoCKGIGh0dHA6Ly9z",
    "dGctZTcuYy5sZW5jci5vcmcvMzQuY3JsMIIBBQYKKwYBBAHWeQIEAgSB9gSB8wDx",
    "AHYAFuhpwdGV6tfD+Jca4/B2AfeM4badMahSGLaDfzGoFQgAAAGZctCvWwAABAMA",
    "RzBFAiB3YrBYgytvBm4/SRvGLVLbiaptRpNpbBj1sSbjrAPPWwIhANsDr9JeMevw",
    "/FlQ1axMhomZwOY2zd7gNU9G01neUmDxAHcACJgkSwLHn2trJ8xOlTah7UA2VCGa",
    "x4rBeJVynD5OjIcAAAGZctCvOgAABAMASDBGAiEAw1LXYlkFYQ80155/Gaiy8ejZ",
    "qqT/ssKpc9zQjrCN8KUCIQCQy4dginzQklJS0/iJbgwbkwYMhKeBd6bwwd8l/snH",
    "5jAKBggqhkjOPQQDAwNoADBlAjBfkmLja1E25bbZMoi9Rtk3MFHqv6Xlpeeztuk7",
    "qUm1QRHHLwH8NyyjQmRPyV3jHHoCMQCXpbYJG2joeAcP/V2mwYmnaI2kS6EQ5GgM",
    "y5qpma4yhjmJnvcWda1jRDsgAiAJXm0=",
);

fn creds() -> Credentials {
    Credentials {
        user: "admin".to_string(),
        password: "admin".to_string(),
    }
}

async fn spawn_router(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

fn idp_router(base: String, jwks: Value) -> Router {
    let jwks_uri = format!("{base}/jwks");
    Router::new()
        .route(
            "/.well-known/openid-configuration",
            get(move || {
                let jwks_uri = jwks_uri.clone();
                async move { Json(json!({ "jwks_uri": jwks_uri })) }
            }),
        )
        .route(
            "/jwks",
            get(move || {
                let jwks = jwks.clone();
                async move { Json(jwks) }
            }),
        )
}

fn failing_idp_router() -> Router {
    Router::new().route(
        "/.well-known/openid-configuration",
        get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
    )
}

// S3 - one IdP down, the other healthy: the tick still produces keys.
#[tokio::test]
async fn partial_idp_failure_still_yields_the_surviving_keys() {
    let down = spawn_router(failing_idp_router()).await;
    let up_base = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let jwks = json!({
        "keys": [{"kty": "EC", "kid": "k2", "alg": "ES256", "x5c": [EC_LEAF_CERT_B64]}]
    });
    let up = spawn_router(idp_router(up_base, jwks)).await;

    let http = reqwest::Client::new();
    let keys = collect_keys(&http, &[down, up]).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys.contains_key(&KeyId::new("EC", "k2")));
}

// S4 - every IdP down: the tick fails, never reaching CouchDB.
#[tokio::test]
async fn all_idps_failing_yields_no_keys_retrieved() {
    let a = spawn_router(failing_idp_router()).await;
    let b = spawn_router(failing_idp_router()).await;

    let http = reqwest::Client::new();
    let err = collect_keys(&http, &[a, b]).await.unwrap_err();
    assert!(matches!(err, AppError::NoKeysRetrieved));
}

// S6 - an unsupported-algorithm key is dropped; a supported one still propagates.
#[tokio::test]
async fn unsupported_algorithm_key_is_dropped_supported_one_survives() {
    let base = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };
    let jwks = json!({
        "keys": [
            {"kty": "oct", "kid": "hmac-key", "alg": "HS256", "x5c": []},
            {"kty": "EC", "kid": "k2", "alg": "ES256", "x5c": [EC_LEAF_CERT_B64]},
        ]
    });
    let base = spawn_router(idp_router(base, jwks)).await;

    let http = reqwest::Client::new();
    let keys = collect_keys(&http, &[base]).await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys.contains_key(&KeyId::new("EC", "k2")));
}

#[derive(Clone, Default)]
struct CouchMock {
    nodes: Arc<Mutex<Vec<String>>>,
    current: Arc<Mutex<HashMap<(String, String), String>>>,
    puts: Arc<Mutex<Vec<(String, String)>>>,
    restart_times: Arc<Mutex<Vec<tokio::time::Instant>>>,
}

fn couchdb_router(mock: CouchMock) -> Router {
    Router::new()
        .route(
            "/_membership",
            get({
                let mock = mock.clone();
                move || {
                    let mock = mock.clone();
                    async move { Json(json!({ "cluster_nodes": mock.nodes.lock().clone() })) }
                }
            }),
        )
        .route(
            "/_node/{node_id}/_config/jwt_keys",
            get({
                let mock = mock.clone();
                move |Path(node_id): Path<String>| {
                    let mock = mock.clone();
                    async move {
                        let map: HashMap<String, String> = mock
                            .current
                            .lock()
                            .iter()
                            .filter(|((n, _), _)| *n == node_id)
                            .map(|((_, k), v)| (k.clone(), v.clone()))
                            .collect();
                        Json(map)
                    }
                }
            }),
        )
        .route(
            "/_node/{node_id}/_config/jwt_keys/{key_id}",
            put({
                let mock = mock.clone();
                move |Path((node_id, key_id)): Path<(String, String)>,
                      State(_): State<()>,
                      body: Json<String>| {
                    let mock = mock.clone();
                    async move {
                        mock.current
                            .lock()
                            .insert((node_id.clone(), key_id.clone()), body.0.clone());
                        mock.puts.lock().push((node_id, key_id));
                        Json(Value::Bool(true))
                    }
                }
            })
            .with_state(()),
        )
        .route(
            "/_node/{node_id}/_restart",
            post({
                let mock = mock.clone();
                move |Path(_node_id): Path<String>| {
                    let mock = mock.clone();
                    async move {
                        mock.restart_times.lock().push(tokio::time::Instant::now());
                        Json(Value::Bool(true))
                    }
                }
            }),
        )
}

// S1 - single IdP worth of keys, single-node server, nothing in place yet.
#[tokio::test(start_paused = true)]
async fn single_node_happy_path_writes_and_restarts() {
    let mock = CouchMock::default();
    *mock.nodes.lock() = vec!["node1".to_string()];
    let base = spawn_router(couchdb_router(mock.clone())).await;

    let mut desired = KeySet::new();
    desired.insert(KeyId::new("RSA", "k1"), "-----BEGIN-----\\nAAA\\n-----END-----".to_string());

    let status = StatusStore::new();
    let scheduler = RestartScheduler::new();
    reconcile_server(
        &reqwest::Client::new(),
        Some(&creds()),
        &base,
        &desired,
        &status,
        &scheduler,
    )
    .await;

    assert_eq!(mock.puts.lock().len(), 1);
    assert_eq!(mock.restart_times.lock().len(), 1);
    assert_eq!(status.snapshot().len(), 1);
}

// S2 - current config already matches desired: no writes, no restart.
#[tokio::test(start_paused = true)]
async fn matching_current_config_issues_no_writes_no_restart() {
    let mock = CouchMock::default();
    *mock.nodes.lock() = vec!["node1".to_string()];
    let pem = "-----BEGIN-----\\nAAA\\n-----END-----".to_string();
    mock.current
        .lock()
        .insert(("node1".to_string(), "rsa:k1".to_string()), pem.clone());
    let base = spawn_router(couchdb_router(mock.clone())).await;

    let mut desired = KeySet::new();
    desired.insert(KeyId::new("RSA", "k1"), pem);

    let status = StatusStore::new();
    let scheduler = RestartScheduler::new();
    reconcile_server(
        &reqwest::Client::new(),
        Some(&creds()),
        &base,
        &desired,
        &status,
        &scheduler,
    )
    .await;

    assert_eq!(mock.puts.lock().len(), 0);
    assert_eq!(mock.restart_times.lock().len(), 0);
    assert!(status.snapshot().is_empty());
}

// S5 - three nodes all need the update: restarts are staggered >= 5s apart.
#[tokio::test(start_paused = true)]
async fn multi_node_restarts_are_staggered_by_at_least_five_seconds() {
    let mock = CouchMock::default();
    *mock.nodes.lock() = vec!["node1".to_string(), "node2".to_string(), "node3".to_string()];
    let base = spawn_router(couchdb_router(mock.clone())).await;

    let mut desired = KeySet::new();
    desired.insert(KeyId::new("RSA", "k1"), "-----BEGIN-----\\nAAA\\n-----END-----".to_string());

    let status = StatusStore::new();
    let scheduler = RestartScheduler::new();
    reconcile_server(
        &reqwest::Client::new(),
        Some(&creds()),
        &base,
        &desired,
        &status,
        &scheduler,
    )
    .await;

    assert_eq!(mock.puts.lock().len(), 3);
    let mut times = mock.restart_times.lock().clone();
    times.sort();
    assert_eq!(times.len(), 3);
    assert!(times[1] - times[0] >= Duration::from_secs(5));
    assert!(times[2] - times[1] >= Duration::from_secs(5));
}
