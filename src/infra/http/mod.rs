pub mod api;
mod middleware;

pub use middleware::RequestContext;

use std::{error::Error as StdError, sync::Arc};

use axum::{Router, http::StatusCode, middleware::from_fn, response::Response, routing::post};

use crate::{application::renderer::RendererClient, infra::assets};

/// Shared state for the HTTP surface: the one configured renderer client.
#[derive(Clone)]
pub struct AppState {
    pub renderer: Arc<RendererClient>,
}

/// Assemble the full router: the render API plus the embedded UI fallback.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/render-diagram", post(api::render_diagram))
        .fallback(assets::serve_ui)
        .with_state(state)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}

/// Structured diagnostic attached to error responses so the shared logging
/// middleware can emit rich records without leaking detail to the client.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}
