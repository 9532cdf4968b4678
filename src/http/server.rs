//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Build the Axum router with middleware (request ID, timeout, tracing)
//! - Track in-flight requests for the drain
//! - Serve on a pre-bound listener
//! - Implement the supervisor's `Service` contract:
//!   `run` serves, `shutdown` drains under a deadline, `close` stops at once

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::schema::TimeoutConfig;
use crate::config::ServerConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::{Service, ServiceError, Shutdown};
use crate::net::{self, InFlightTracker, ListenerError};

/// HTTP service driven by the lifecycle supervisor.
pub struct HttpServer {
    /// Taken by the first `run`; released early by `shutdown`/`close`.
    listener: Mutex<Option<TcpListener>>,
    router: Router,
    local_addr: SocketAddr,
    in_flight: InFlightTracker,
    /// Stop accepting, let connections finish.
    drain: Shutdown,
    /// Drop the accept loop immediately.
    halt: Shutdown,
    /// Fired once the accept loop has exited.
    stopped: Shutdown,
}

impl HttpServer {
    /// Bind the configured address and serve the default routes.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ListenerError> {
        let listener = net::bind(&config.listener).await?;
        Self::new(listener, default_routes(), &config.timeouts).map_err(ListenerError::Bind)
    }

    /// Serve `routes` on an already bound listener.
    pub fn new(
        listener: TcpListener,
        routes: Router,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, std::io::Error> {
        let local_addr = listener.local_addr()?;
        let in_flight = InFlightTracker::new();
        let router = Self::build_router(routes, timeouts, in_flight.clone());

        Ok(Self {
            listener: Mutex::new(Some(listener)),
            router,
            local_addr,
            in_flight,
            drain: Shutdown::new(),
            halt: Shutdown::new(),
            stopped: Shutdown::new(),
        })
    }

    /// Wrap the routes with all middleware layers, outermost first.
    #[allow(deprecated)]
    fn build_router(routes: Router, timeouts: &TimeoutConfig, in_flight: InFlightTracker) -> Router {
        routes.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs)))
                .layer(middleware::from_fn_with_state(in_flight, track_in_flight)),
        )
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.in_flight
    }

    /// Release the listener if the accept loop never took it.
    async fn release_unused_listener(&self) -> bool {
        let unused = self.listener.lock().await.take();
        if unused.is_some() {
            self.stopped.trigger();
        }
        unused.is_some()
    }
}

#[async_trait]
impl Service for HttpServer {
    async fn run(&self) -> Result<(), ServiceError> {
        let listener = self
            .listener
            .lock()
            .await
            .take()
            .ok_or(ServiceError::AlreadyStarted)?;

        tracing::info!(address = %self.local_addr, "HTTP server starting");

        let app = self
            .router
            .clone()
            .into_make_service_with_connect_info::<SocketAddr>();
        let mut drain = self.drain.subscribe();
        let mut halt = self.halt.subscribe();

        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { Shutdown::triggered(&mut drain).await })
            .into_future();

        let result = tokio::select! {
            res = serve => res.map_err(ServiceError::from),
            _ = Shutdown::triggered(&mut halt) => {
                tracing::warn!(address = %self.local_addr, "HTTP server closed");
                Ok(())
            }
        };

        self.stopped.trigger();
        tracing::info!(address = %self.local_addr, "HTTP server stopped");
        result
    }

    async fn shutdown(&self, deadline: Instant) -> Result<(), ServiceError> {
        if self.release_unused_listener().await {
            return Ok(());
        }

        tracing::info!(
            address = %self.local_addr,
            in_flight = self.in_flight.active_count(),
            "HTTP server draining"
        );
        self.drain.trigger();

        let mut stopped = self.stopped.subscribe();
        let drained = async {
            self.in_flight.wait_idle().await;
            tracing::debug!(address = %self.local_addr, "In-flight requests finished");
            Shutdown::triggered(&mut stopped).await;
        };
        match tokio::time::timeout_at(deadline, drained).await {
            Ok(()) => Ok(()),
            Err(_) => {
                let in_flight = self.in_flight.active_count();
                self.halt.trigger();
                Err(ServiceError::DeadlineExceeded { in_flight })
            }
        }
    }

    async fn close(&self) -> Result<(), ServiceError> {
        self.release_unused_listener().await;
        self.halt.trigger();
        Ok(())
    }
}

async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request,
    next: Next,
) -> Response {
    let guard = tracker.track();
    tracing::trace!(
        request_seq = %guard.seq(),
        in_flight = tracker.active_count(),
        method = %request.method(),
        path = %request.uri().path(),
        "Request started"
    );
    let response = next.run(request).await;
    drop(guard);
    response
}

/// Routes served when the binary runs without an embedding application.
pub fn default_routes() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
}

async fn index_handler(request: Request) -> impl IntoResponse {
    let request_id = request.request_id().unwrap_or("unknown");
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "request_id": request_id,
    }))
}

async fn health_handler() -> &'static str {
    "ok"
}
