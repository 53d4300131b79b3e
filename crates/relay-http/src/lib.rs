//! REST adapter (axum): lets external systems push messages into a company's chats.
//!
//! Routes:
//! - `POST /telegram` with `Authorization: <company token>` and a JSON body
//! - `GET /health`

pub mod handlers;
pub mod server;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use relay_core::routing::MessageRouter;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub router: Arc<MessageRouter>,
}

impl HttpState {
    pub fn new(router: Arc<MessageRouter>) -> Self {
        Self { router }
    }
}

/// Build the application router with request tracing attached.
pub fn app(state: HttpState) -> Router {
    Router::new()
        .route("/telegram", post(handlers::send_message))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
