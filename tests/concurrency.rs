//! Concurrent clients against a real listener.

use std::collections::HashSet;

use futures_util::future::join_all;
use reqwest::header::SET_COOKIE;

use storefront_gateway::observability::RequestMetrics;

mod common;

const CLIENTS: usize = 100;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cookieless_clients_get_distinct_sessions() {
    let metrics = RequestMetrics::noop();
    let addr = common::spawn_server(common::gateway(metrics.clone())).await;
    let url = format!("http://{addr}/_healthz");

    let requests = (0..CLIENTS).map(|_| {
        let url = url.clone();
        async move {
            // A fresh client per request: no cookie jar, no shared connection.
            let response = reqwest::Client::new().get(&url).send().await.unwrap();
            assert_eq!(response.status(), reqwest::StatusCode::OK);
            let cookies: Vec<String> = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .map(|v| v.to_str().unwrap().to_string())
                .collect();
            assert_eq!(cookies.len(), 1);
            cookies[0]
                .split(';')
                .next()
                .and_then(|pair| pair.strip_prefix("shop_session-id="))
                .unwrap()
                .to_string()
        }
    });

    let sessions: HashSet<String> = join_all(requests).await.into_iter().collect();
    assert_eq!(sessions.len(), CLIENTS);
    assert_eq!(metrics.snapshot().requests, CLIENTS as u64);
    assert_eq!(metrics.snapshot().errors, 0);
}
