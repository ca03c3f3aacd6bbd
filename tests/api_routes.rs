//! End-to-end tests: gateway server in front of mock backends.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::future::join_all;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use winscan_gateway::config::{GatewayConfig, RouteConfig};
use winscan_gateway::{HttpServer, Shutdown};

mod common;

const ADMIN_KEY: &str = "test-admin-key";

/// Start the gateway on an ephemeral port; the returned handle keeps it alive.
async fn start_gateway(config: GatewayConfig, urls: &[String]) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config, common::client_for(urls));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}

fn admin_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.to_string();
    config
}

#[tokio::test]
async fn test_miss_then_hit() {
    let backend = common::start_mock_backend(r#"{"blocks":[1,2,3]}"#).await;
    let (addr, _shutdown) = start_gateway(GatewayConfig::default(), &[backend.url()]).await;
    let client = common::local_http_client();
    let url = format!("http://{}/api/blocks?chain=paxi", addr);

    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), 200);
    assert_eq!(first.headers()["x-cache"], "MISS");
    assert_eq!(
        first.headers()["cache-control"],
        "public, s-maxage=10, stale-while-revalidate=30"
    );
    assert!(first.headers().contains_key("x-request-id"));
    let body: Value = first.json().await.unwrap();
    assert_eq!(body, json!({ "blocks": [1, 2, 3] }));

    let second = client.get(&url).send().await.unwrap();
    assert_eq!(second.headers()["x-cache"], "HIT");
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_query_order_and_undeclared_params_share_cache_entry() {
    let backend = common::start_mock_backend(r#"{"holders":[]}"#).await;
    let (addr, _shutdown) = start_gateway(GatewayConfig::default(), &[backend.url()]).await;
    let client = common::local_http_client();

    let a = client
        .get(format!("http://{}/api/holders?chain=paxi&denom=upaxi", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(a.headers()["x-cache"], "MISS");

    let b = client
        .get(format!("http://{}/api/holders?denom=upaxi&chain=paxi&utm=x", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(b.headers()["x-cache"], "HIT");

    assert_eq!(backend.hits(), 1);
    assert!(backend.requests()[0].starts_with("get /api/holders?chain=paxi&denom=upaxi "));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_fetch() {
    let backend = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        (200, r#"{"validators":[]}"#.into())
    })
    .await;
    let (addr, _shutdown) = start_gateway(GatewayConfig::default(), &[backend.url()]).await;
    let client = common::local_http_client();
    let url = format!("http://{}/api/validator?chain=paxi", addr);

    let responses = join_all((0..5).map(|_| client.get(&url).send())).await;

    for response in responses {
        assert_eq!(response.unwrap().status(), 200);
    }
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn test_missing_required_param_is_rejected() {
    let backend = common::start_mock_backend("{}").await;
    let (addr, _shutdown) = start_gateway(GatewayConfig::default(), &[backend.url()]).await;
    let client = common::local_http_client();

    let res = client
        .get(format!("http://{}/api/asset-detail?chain=paxi", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "missing_param");
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_no_store_route_bypasses_cache() {
    let backend = common::start_mock_backend(r#"{"relayers":[]}"#).await;
    let (addr, _shutdown) = start_gateway(GatewayConfig::default(), &[backend.url()]).await;
    let client = common::local_http_client();
    let url = format!("http://{}/api/relayers?chain=paxi", addr);

    for _ in 0..2 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.headers()["x-cache"], "BYPASS");
        assert_eq!(res.headers()["cache-control"], "no-store");
    }
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_path_parameter_route_fails_over() {
    let failing = common::start_programmable_backend(|_| async { (503, String::new()) }).await;
    let healthy = common::start_programmable_backend(|target| async move {
        (200, json!({ "target": target }).to_string())
    })
    .await;
    let (addr, _shutdown) =
        start_gateway(GatewayConfig::default(), &[failing.url(), healthy.url()]).await;
    let client = common::local_http_client();

    let res = client
        .get(format!("http://{}/api/blocks/1200?chain=paxi", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["target"], "/api/blocks/1200?chain=paxi");
    assert_eq!(failing.hits(), 1);
}

#[tokio::test]
async fn test_unavailable_backends_return_bad_gateway() {
    let dead = common::dead_address().await;
    let (addr, _shutdown) =
        start_gateway(GatewayConfig::default(), &[format!("http://{}", dead)]).await;
    let client = common::local_http_client();

    let res = client
        .get(format!("http://{}/api/network?chain=paxi", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    assert_eq!(res.headers()["cache-control"], "no-store");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "all_endpoints_failed");
}

#[tokio::test]
async fn test_fallback_payload_when_backends_are_down() {
    let dead = common::dead_address().await;
    let mut config = GatewayConfig::default();
    let mut route = RouteConfig::new("/api/relayers", &["chain"], &[], 0, 0);
    route.fallback = Some(json!({ "relayers": [] }));
    config.routes = vec![route];

    let (addr, _shutdown) = start_gateway(config, &[format!("http://{}", dead)]).await;
    let client = common::local_http_client();

    let res = client
        .get(format!("http://{}/api/relayers?chain=paxi", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-cache"], "FALLBACK");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "relayers": [] }));
}

#[tokio::test]
async fn test_healthz() {
    let backend = common::start_mock_backend("{}").await;
    let (addr, _shutdown) = start_gateway(GatewayConfig::default(), &[backend.url()]).await;

    let res = common::local_http_client()
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ok");
    assert_eq!(backend.hits(), 0);
}

#[tokio::test]
async fn test_admin_requires_bearer_token() {
    let backend = common::start_mock_backend("{}").await;
    let (addr, _shutdown) = start_gateway(admin_config(), &[backend.url()]).await;
    let client = common::local_http_client();
    let url = format!("http://{}/admin/status", addr);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client.get(&url).bearer_auth("wrong").send().await.unwrap();
    assert_eq!(res.status(), 401);

    let res = client.get(&url).bearer_auth(ADMIN_KEY).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "operational");
}

#[tokio::test]
async fn test_admin_cache_inspection_and_clear() {
    let backend = common::start_mock_backend(r#"{"chains":[]}"#).await;
    let (addr, _shutdown) = start_gateway(admin_config(), &[backend.url()]).await;
    let client = common::local_http_client();

    client
        .get(format!("http://{}/api/chains", addr))
        .send()
        .await
        .unwrap();

    let cache_url = format!("http://{}/admin/cache", addr);
    let body: Value = client
        .get(&cache_url)
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["entries"], 1);

    let res = client.delete(&cache_url).bearer_auth(ADMIN_KEY).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client
        .get(format!("http://{}/api/chains", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-cache"], "MISS");
    assert_eq!(backend.hits(), 2);
}

#[tokio::test]
async fn test_admin_endpoints_listing() {
    let primary = common::start_mock_backend("{}").await;
    let secondary = common::start_mock_backend("{}").await;
    let (addr, _shutdown) =
        start_gateway(admin_config(), &[primary.url(), secondary.url()]).await;

    let body: Value = common::local_http_client()
        .get(format!("http://{}/admin/endpoints", addr))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body[0]["position"], 0);
    assert_eq!(body[0]["base_url"], primary.url());
    assert_eq!(body[1]["base_url"], secondary.url());
}

#[tokio::test]
async fn test_admin_routes_absent_when_disabled() {
    let backend = common::start_mock_backend("{}").await;
    let (addr, _shutdown) = start_gateway(GatewayConfig::default(), &[backend.url()]).await;

    let res = common::local_http_client()
        .get(format!("http://{}/admin/status", addr))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
}
