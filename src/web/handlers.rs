//! Route handlers.

use crate::error::{Error, Result};
use crate::service::TaskService;
use crate::tasks::parse_status;
use crate::web::{redirect_to_list, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Form;
use serde::Deserialize;
use tera::Context;

/// Fields posted by the create and edit forms.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TaskForm {
    /// Task description.
    pub description: Option<String>,
    /// Checkbox value; see [`parse_status`].
    pub status: Option<String>,
}

pub async fn index(State(state): State<AppState>) -> Response {
    state.respond(state.render("index.html", &Context::new()))
}

pub async fn find_all(State(state): State<AppState>) -> Response {
    let result = list_page(&state).await;
    state.respond(result)
}

async fn list_page(state: &AppState) -> Result<Response> {
    let tasks = state.run(TaskService::list).await?;
    let mut ctx = Context::new();
    ctx.insert("tasks", &tasks);
    state.render("list.html", &ctx)
}

pub async fn insert_form(State(state): State<AppState>) -> Response {
    state.respond(insert_page(&state, StatusCode::OK, &TaskForm::default(), None))
}

pub async fn insert(State(state): State<AppState>, Form(form): Form<TaskForm>) -> Response {
    let result = create(&state, form).await;
    state.respond(result)
}

async fn create(state: &AppState, form: TaskForm) -> Result<Response> {
    let status = parse_status(form.status.as_deref());
    let description = form.description.clone();

    match state.run(move |service| service.create(description.as_deref(), status)).await {
        Ok(_) => Ok(redirect_to_list()),
        Err(Error::Validation(e)) => {
            insert_page(state, StatusCode::UNPROCESSABLE_ENTITY, &form, Some(&e.to_string()))
        }
        Err(e) => Err(e),
    }
}

fn insert_page(
    state: &AppState,
    status: StatusCode,
    form: &TaskForm,
    message: Option<&str>,
) -> Result<Response> {
    let mut ctx = Context::new();
    ctx.insert("message", &message);
    ctx.insert("description", form.description.as_deref().unwrap_or_default());
    ctx.insert("status", &parse_status(form.status.as_deref()));
    state.render_with_status(status, "insert.html", &ctx)
}

pub async fn update_form(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let result = update_page(&state, id, StatusCode::OK, None).await;
    state.respond(result)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<TaskForm>,
) -> Response {
    let result = apply_update(&state, id, form).await;
    state.respond(result)
}

async fn apply_update(state: &AppState, id: i64, form: TaskForm) -> Result<Response> {
    let description = form.description;

    match state.run(move |service| service.update_description(id, description.as_deref())).await {
        Ok(()) => Ok(redirect_to_list()),
        Err(Error::Validation(e)) => {
            update_page(state, id, StatusCode::UNPROCESSABLE_ENTITY, Some(&e.to_string())).await
        }
        Err(e) => Err(e),
    }
}

async fn update_page(
    state: &AppState,
    id: i64,
    status: StatusCode,
    message: Option<&str>,
) -> Result<Response> {
    let task = state.run(move |service| service.get(id)).await?;
    let mut ctx = Context::new();
    ctx.insert("task", &task);
    ctx.insert("message", &message);
    state.render_with_status(status, "update.html", &ctx)
}

pub async fn change_status(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let result = state.run(move |service| service.toggle_status(id)).await;
    state.respond(result.map(|_| redirect_to_list()))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let result = state.run(move |service| service.delete(id)).await;
    state.respond(result.map(|()| redirect_to_list()))
}

pub async fn not_found(State(state): State<AppState>) -> Response {
    state.status_page(StatusCode::NOT_FOUND, "There is no page at this address.")
}
