//! The HTTP surface of the dashboard.
//!
//! Four routes, all read-only:
//!
//! - `GET /ping` - liveness probe
//! - `GET /dhcpd.json` - the current [`Snapshot`] as JSON
//! - `GET /dhcpd.txt` - the raw lease-file text, verbatim
//! - `GET /` - the static dashboard page
//!
//! Handlers share the [`LeaseCache`] through axum's router state; each
//! request clones the current snapshot `Arc` and works from that, so
//! requests never block the refresh task and never observe a half-written
//! snapshot.

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, response::Html, routing::get};
use tokio::net::TcpListener;
use tracing::info;

use crate::cache::{LeaseCache, Snapshot};
use crate::config::Config;
use crate::error::{Error, Result};

/// The dashboard page, compiled into the binary.
const INDEX_HTML: &str = include_str!("../site/index.html");

/// The dashboard server: one lease cache, one listener, one refresh task.
pub struct DashboardServer {
    config: Arc<Config>,
    cache: Arc<LeaseCache>,
}

impl DashboardServer {
    /// Bootstraps the lease cache and prepares the server.
    ///
    /// # Errors
    ///
    /// Returns the initial read or parse failure; the dashboard does not
    /// start without one good snapshot.
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let cache = Arc::new(LeaseCache::bootstrap(Arc::clone(&config))?);
        Ok(Self { config, cache })
    }

    /// Serves HTTP and drives the periodic refresh until the process exits.
    pub async fn run(&self) -> Result<()> {
        let cache = Arc::clone(&self.cache);
        let period = Duration::from_secs(self.config.refresh_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // the first tick fires immediately; bootstrap already covered it
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.refresh().await;
            }
        });

        let address = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|error| Error::Server(format!("failed to bind {address}: {error}")))?;

        info!(
            "listening on http://{} - leases file {}",
            address,
            self.config.leases_path()?.display()
        );

        axum::serve(listener, router(Arc::clone(&self.cache)))
            .await
            .map_err(|error| Error::Server(error.to_string()))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &Arc<LeaseCache> {
        &self.cache
    }
}

/// Builds the route table over a lease cache.
pub fn router(cache: Arc<LeaseCache>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ping", get(ping))
        .route("/dhcpd.json", get(snapshot_json))
        .route("/dhcpd.txt", get(snapshot_raw))
        .with_state(cache)
}

async fn ping() -> &'static str {
    "pong\n"
}

async fn snapshot_json(State(cache): State<Arc<LeaseCache>>) -> Json<Snapshot> {
    Json(cache.current().await.as_ref().clone())
}

async fn snapshot_raw(State(cache): State<Arc<LeaseCache>>) -> String {
    cache.current().await.raw.clone()
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt; // for `oneshot`

    struct TestGuard(String);
    impl Drop for TestGuard {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    const LEASES: &str = r#"
lease 192.168.1.10 {
  starts 4 2015/05/08 14:52:05;
  ends 4 2015/05/08 15:02:05;
  hardware ethernet 00:11:22:33:44:55;
  client-hostname "laptop";
}
"#;

    fn test_router(name: &str) -> (Router, TestGuard) {
        let path = format!("test_dhcpd_server_{name}.leases");
        std::fs::write(&path, LEASES).unwrap();
        let config = Arc::new(Config {
            leases_file: Some(path.clone().into()),
            ..Config::default()
        });
        let cache = Arc::new(LeaseCache::bootstrap(config).unwrap());
        (router(cache), TestGuard(path))
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_ping() {
        let (router, _guard) = test_router("ping");
        let (status, bytes) = get_body(router, "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(bytes, b"pong\n");
    }

    #[tokio::test]
    async fn test_json_snapshot() {
        let (router, _guard) = test_router("json");
        let (status, bytes) = get_body(router, "/dhcpd.json").await;
        assert_eq!(status, StatusCode::OK);

        let snapshot: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snapshot["error"], serde_json::Value::Null);
        assert_eq!(snapshot["raw"], LEASES);
        assert_eq!(snapshot["aliases_enabled"], false);

        let leases = snapshot["leases"].as_array().unwrap();
        assert_eq!(leases.len(), 1);
        assert_eq!(leases[0]["ip"], "192.168.1.10");
        assert_eq!(leases[0]["client-hostname"], "laptop");
    }

    #[tokio::test]
    async fn test_raw_text_passthrough() {
        let (router, _guard) = test_router("txt");
        let (status, bytes) = get_body(router, "/dhcpd.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(bytes).unwrap(), LEASES);
    }

    #[tokio::test]
    async fn test_index_page() {
        let (router, _guard) = test_router("index");
        let (status, bytes) = get_body(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(bytes).unwrap().contains("<html"));
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let (router, _guard) = test_router("missing");
        let (status, _) = get_body(router, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
