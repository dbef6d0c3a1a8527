//! HTTP front end.
//!
//! Routes render server-side pages and redirect back to the task list after
//! every successful mutation. Store calls are blocking, so each one runs on
//! tokio's blocking pool.

mod handlers;

pub use handlers::TaskForm;

use crate::error::{Error, Result};
use crate::service::TaskService;
use crate::templates::Templates;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tera::Context;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Where every successful mutation sends the browser.
pub const LIST_PATH: &str = "/find-all";

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Task operations.
    pub service: TaskService,
    /// Page templates.
    pub templates: Arc<Templates>,
}

impl AppState {
    /// Bundle a service and templates.
    #[must_use]
    pub fn new(service: TaskService, templates: Templates) -> Self {
        Self { service, templates: Arc::new(templates) }
    }

    /// Run a blocking service call off the async workers.
    ///
    /// # Errors
    ///
    /// Returns the call's own error, or [`Error::Join`] if it panicked.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&TaskService) -> Result<T> + Send + 'static,
    {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || f(&service))
            .await
            .map_err(|e| Error::Join(e.to_string()))?
    }

    /// Render a page with status 200.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render(&self, name: &str, context: &Context) -> Result<Response> {
        self.render_with_status(StatusCode::OK, name, context)
    }

    /// Render a page with the given status.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render_with_status(
        &self,
        status: StatusCode,
        name: &str,
        context: &Context,
    ) -> Result<Response> {
        let body = self.templates.render(name, context)?;
        Ok((status, Html(body)).into_response())
    }

    /// Turn a handler result into a response, rendering errors as pages.
    pub fn respond(&self, result: Result<Response>) -> Response {
        result.unwrap_or_else(|e| self.error_page(&e))
    }

    /// Render the error page for `error`.
    pub fn error_page(&self, error: &Error) -> Response {
        let status = status_for(error);
        let message = if status.is_server_error() {
            error!(%error, "request failed");
            "Something went wrong while handling the request.".to_string()
        } else {
            debug!(%error, "request rejected");
            error.to_string()
        };
        self.status_page(status, &message)
    }

    /// Render the error page with an explicit status and message.
    pub fn status_page(&self, status: StatusCode, message: &str) -> Response {
        let reason = status.canonical_reason().unwrap_or("Error");
        let mut ctx = Context::new();
        ctx.insert("status_code", &status.as_u16());
        ctx.insert("reason", reason);
        ctx.insert("message", message);

        match self.templates.render("error.html", &ctx) {
            Ok(body) => (status, Html(body)).into_response(),
            Err(e) => {
                error!(error = %e, "error page failed to render");
                (status, format!("{} {reason}", status.as_u16())).into_response()
            }
        }
    }
}

/// HTTP status used when `error` ends a request.
#[must_use]
pub const fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Redirect to the task list.
#[must_use]
pub fn redirect_to_list() -> Response {
    Redirect::to(LIST_PATH).into_response()
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/index", get(handlers::index))
        .route("/find-all", get(handlers::find_all))
        .route("/insert", get(handlers::insert_form).post(handlers::insert))
        .route(
            "/update-by-id/{id}",
            get(handlers::update_form).post(handlers::update).put(handlers::update),
        )
        .route(
            "/change-status-by-id/{id}",
            get(handlers::change_status).put(handlers::change_status),
        )
        .route("/delete-by-id/{id}", get(handlers::delete).delete(handlers::delete))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
