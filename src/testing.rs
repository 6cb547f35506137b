//! Fake remote API servers for unit tests.

#![allow(clippy::expect_used)]

use axum::Router;
use std::net::TcpListener as StdTcpListener;
use tokio::net::TcpListener;

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub(crate) async fn spawn_api(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake api listener");
    let addr = listener.local_addr().expect("fake api address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Base URL of a loopback port with nothing listening on it.
pub(crate) fn unreachable_base_url() -> String {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind probe listener");
    let addr = listener.local_addr().expect("probe address");
    drop(listener);
    format!("http://{addr}")
}
