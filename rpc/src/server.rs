//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use runoff_election::ElectionService;
use runoff_store::Store;
use runoff_types::{Clock, Timestamp};

use crate::error::RpcError;
use crate::handlers;

/// Shared state handed to every handler.
pub struct RpcState<S: Store> {
    pub service: Arc<ElectionService<S>>,
    pub clock: Arc<dyn Clock>,
}

impl<S: Store> RpcState<S> {
    pub fn new(service: Arc<ElectionService<S>>, clock: Arc<dyn Clock>) -> Self {
        Self { service, clock }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl<S: Store> Clone for RpcState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            clock: Arc::clone(&self.clock),
        }
    }
}

/// Build the router with every ledger route.
pub fn router<S: Store + 'static>(state: RpcState<S>) -> Router {
    Router::new()
        .route(
            "/elections",
            post(handlers::create_election::<S>).get(handlers::list_elections::<S>),
        )
        .route("/elections/:id", get(handlers::get_election::<S>))
        .route("/elections/:id/candidates", post(handlers::add_candidate::<S>))
        .route("/elections/:id/results", get(handlers::get_results::<S>))
        .route("/elections/:id/winner", get(handlers::get_winner::<S>))
        .route("/elections/:id/active", get(handlers::is_active::<S>))
        .route("/elections/:id/voted", get(handlers::has_voted::<S>))
        .route("/elections/:id/chain", get(handlers::runoff_chain::<S>))
        .route("/elections/:id/votes", post(handlers::vote::<S>))
        .route("/elections/:id/finalize", post(handlers::finalize::<S>))
        .route("/candidates/:id", get(handlers::get_candidate::<S>))
        .route("/voters", post(handlers::register::<S>))
        .with_state(state)
}

pub struct RpcServer<S: Store> {
    pub addr: SocketAddr,
    pub state: RpcState<S>,
}

impl<S: Store + 'static> RpcServer<S> {
    pub fn new(addr: SocketAddr, state: RpcState<S>) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<(), RpcError> {
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        info!(addr = %self.addr, "RPC server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("RPC server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use runoff_election::IdAllocator;
    use runoff_nullables::{NullClock, NullStore};
    use runoff_types::{Identity, RunoffParams};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        clock: Arc<NullClock>,
    }

    fn harness() -> Harness {
        let service = ElectionService::open(
            NullStore::new(),
            Identity::new("admin").unwrap(),
            RunoffParams::default(),
            IdAllocator::default(),
        )
        .unwrap();
        let clock = Arc::new(NullClock::new(1_000));
        let state = RpcState::new(Arc::new(service), clock.clone());
        Harness {
            app: router(state),
            clock,
        }
    }

    async fn call(app: &Router, method: &str, uri: &str, who: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(who) = who {
            req = req.header("x-identity", who);
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn full_election_over_http() {
        let h = harness();
        let (status, election) = call(
            &h.app,
            "POST",
            "/elections",
            Some("admin"),
            Some(json!({ "title": "Mayor", "duration_secs": 60 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(election["status"], "open");
        let id = election["id"].as_u64().unwrap();

        let mut candidates = Vec::new();
        for name in ["Alice", "Bob"] {
            let (status, c) = call(
                &h.app,
                "POST",
                &format!("/elections/{id}/candidates"),
                Some("admin"),
                Some(json!({ "name": name })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            candidates.push(c["id"].as_u64().unwrap());
        }

        for (voter, pick) in [("v1", candidates[0]), ("v2", candidates[1])] {
            let (status, _) = call(&h.app, "POST", "/voters", Some(voter), None).await;
            assert_eq!(status, StatusCode::CREATED);
            let (status, _) = call(
                &h.app,
                "POST",
                &format!("/elections/{id}/votes"),
                Some(voter),
                Some(json!({ "candidate_id": pick })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, voted) = call(&h.app, "GET", &format!("/elections/{id}/voted"), Some("v1"), None).await;
        assert_eq!(voted["voted"], true);

        let (status, err) = call(&h.app, "POST", &format!("/elections/{id}/finalize"), Some("admin"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["error"], "still_active");

        h.clock.advance(61);
        let (status, done) = call(&h.app, "POST", &format!("/elections/{id}/finalize"), Some("admin"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(done["requires_runoff"], true);
        let runoff = done["runoff_election_id"].as_u64().unwrap();

        let (_, chain) = call(&h.app, "GET", &format!("/elections/{runoff}/chain"), None, None).await;
        assert_eq!(chain["chain"], json!([id, runoff]));

        let (_, results) = call(&h.app, "GET", &format!("/elections/{id}/results"), None, None).await;
        assert_eq!(results["vote_counts"], json!([1, 1]));
        assert_eq!(results["advanced_to_runoff"], json!([true, true]));

        let (_, winner) = call(&h.app, "GET", &format!("/elections/{id}/winner"), None, None).await;
        assert_eq!(winner["is_tied"], true);

        let (_, child) = call(&h.app, "GET", &format!("/elections/{runoff}"), None, None).await;
        assert_eq!(child["status"], "scheduled");
        assert_eq!(child["seconds_until_start"], 300);
    }

    #[tokio::test]
    async fn missing_identity_is_401() {
        let h = harness();
        let (status, body) = call(&h.app, "POST", "/voters", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn non_admin_cannot_create() {
        let h = harness();
        let (status, _) = call(
            &h.app,
            "POST",
            "/elections",
            Some("mallory"),
            Some(json!({ "title": "x", "duration_secs": 60 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_election_is_404_but_inactive() {
        let h = harness();
        let (status, body) = call(&h.app, "GET", "/elections/42", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, body) = call(&h.app, "GET", "/elections/42/active", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], false);
    }

    #[tokio::test]
    async fn zero_duration_is_422() {
        let h = harness();
        let (status, body) = call(
            &h.app,
            "POST",
            "/elections",
            Some("admin"),
            Some(json!({ "title": "x", "duration_secs": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "invalid_input");
    }

    #[tokio::test]
    async fn election_list_is_paginated() {
        let h = harness();
        for i in 0..3 {
            call(
                &h.app,
                "POST",
                "/elections",
                Some("admin"),
                Some(json!({ "title": format!("e{i}"), "duration_secs": 60 })),
            )
            .await;
        }
        let (_, page) = call(&h.app, "GET", "/elections?count=2", None, None).await;
        assert_eq!(page["elections"].as_array().unwrap().len(), 2);
        assert_eq!(page["cursor"], 2);

        let (_, rest) = call(&h.app, "GET", "/elections?count=2&cursor=2", None, None).await;
        assert_eq!(rest["elections"].as_array().unwrap().len(), 1);
        assert!(rest.get("cursor").is_none());
    }
}
