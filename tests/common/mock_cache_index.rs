// Mock cache index controller serving /lookup and /query
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::RwLock;

/// Configuration for mock cache index behavior
#[derive(Clone, Debug)]
pub struct MockCacheIndexConfig {
    /// `(instance_id, tokens)` returned by /lookup
    pub lookup: (String, usize),
    pub lookup_status: StatusCode,
    /// Return a body that is not JSON from /lookup
    pub malformed_lookup: bool,
    pub lookup_delay: Duration,
    /// address -> instance id for /query; unknown addresses get 404
    pub instances: HashMap<String, String>,
}

impl Default for MockCacheIndexConfig {
    fn default() -> Self {
        Self {
            lookup: (String::new(), 0),
            lookup_status: StatusCode::OK,
            malformed_lookup: false,
            lookup_delay: Duration::ZERO,
            instances: HashMap::new(),
        }
    }
}

#[derive(Clone)]
struct MockState {
    config: Arc<RwLock<MockCacheIndexConfig>>,
    lookups: Arc<RwLock<Vec<Value>>>,
    queries: Arc<AtomicUsize>,
}

pub struct MockCacheIndex {
    state: MockState,
    addr: String,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockCacheIndex {
    pub async fn start(config: MockCacheIndexConfig) -> Self {
        let state = MockState {
            config: Arc::new(RwLock::new(config)),
            lookups: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(AtomicUsize::new(0)),
        };

        let app = Router::new()
            .route("/lookup", post(lookup_handler))
            .route("/query", get(query_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock cache index");
        let addr = listener.local_addr().expect("local addr").to_string();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                eprintln!("Mock cache index error: {}", e);
            }
        });

        Self {
            state,
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// `host:port` of the running server
    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn set_lookup(&self, instance_id: &str, tokens: usize) {
        self.state.config.write().await.lookup = (instance_id.to_string(), tokens);
    }

    pub async fn recorded_lookups(&self) -> Vec<Value> {
        self.state.lookups.read().await.clone()
    }

    pub fn query_count(&self) -> usize {
        self.state.queries.load(Ordering::SeqCst)
    }

    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
    }
}

impl Drop for MockCacheIndex {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn lookup_handler(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state.lookups.write().await.push(body);
    let config = state.config.read().await.clone();

    if !config.lookup_delay.is_zero() {
        tokio::time::sleep(config.lookup_delay).await;
    }
    if config.lookup_status != StatusCode::OK {
        return (config.lookup_status, "lookup failed").into_response();
    }
    if config.malformed_lookup {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }

    let (instance_id, tokens) = config.lookup;
    Json(json!({"instance_id": instance_id, "tokens": tokens})).into_response()
}

async fn query_handler(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.queries.fetch_add(1, Ordering::SeqCst);
    let config = state.config.read().await;

    match params.get("ip").and_then(|ip| config.instances.get(ip)) {
        Some(instance_id) => Json(json!({"instance_id": instance_id})).into_response(),
        None => (StatusCode::NOT_FOUND, "unknown address").into_response(),
    }
}
