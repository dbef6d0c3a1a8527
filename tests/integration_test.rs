//! End-to-end tests for `tasklist_web` through the HTTP router.

#![cfg(feature = "server")]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::sync::Arc;
use tasklist_web::config::AppConfig;
use tasklist_web::service::TaskService;
use tasklist_web::tasks::{InMemoryTaskStore, StoreKind, Task};
use tasklist_web::templates::Templates;
use tasklist_web::web::{router, AppState, LIST_PATH};
use tasklist_web::{cli, VERSION};
use tempfile::TempDir;
use tower::ServiceExt;

struct Reply {
    status: StatusCode,
    location: Option<String>,
    content_type: Option<String>,
    body: String,
}

fn app_with(store: InMemoryTaskStore) -> (Router, TaskService) {
    let service = TaskService::new(Arc::new(store));
    let state = AppState::new(service.clone(), Templates::embedded().unwrap());
    (router(state), service)
}

fn app() -> (Router, TaskService) {
    app_with(InMemoryTaskStore::new())
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let header_value = |name: header::HeaderName| {
        response.headers().get(name).map(|v| v.to_str().unwrap().to_string())
    };
    let status = response.status();
    let location = header_value(header::LOCATION);
    let content_type = header_value(header::CONTENT_TYPE);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    Reply { status, location, content_type, body: String::from_utf8(bytes.to_vec()).unwrap() }
}

async fn get(app: &Router, uri: &str) -> Reply {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_form(app: &Router, uri: &str, form: &str) -> Reply {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

fn assert_redirects_to_list(reply: &Reply) {
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location.as_deref(), Some(LIST_PATH));
}

#[test]
fn test_version_exists() {
    assert!(!VERSION.is_empty());
}

#[tokio::test]
async fn test_home_page() {
    let (app, _) = app();
    for uri in ["/", "/index"] {
        let reply = get(&app, uri).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(reply.content_type.unwrap().starts_with("text/html"));
        assert!(reply.body.contains("<title>Home</title>"));
    }
}

#[tokio::test]
async fn test_list_page() {
    let (app, _) = app_with(InMemoryTaskStore::with_tasks(vec![
        Task::new(1, "Buy milk", false),
        Task::new(2, "Walk the dog", true),
    ]));

    let reply = get(&app, "/find-all").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("<title>Task List</title>"));
    assert!(reply.body.contains("Buy milk"));
    assert!(reply.body.contains("Walk the dog"));
    assert!(reply.body.contains("/change-status-by-id/2"));
}

#[tokio::test]
async fn test_insert_form_page() {
    let (app, _) = app();
    let reply = get(&app, "/insert").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("<title>Create a new Task</title>"));
    assert!(reply.body.contains("action=\"/insert\""));
}

#[tokio::test]
async fn test_task_lifecycle() {
    let (app, service) = app();

    let reply = post_form(&app, "/insert", "description=MockData&status=False").await;
    assert_redirects_to_list(&reply);
    let task = service.get(1).unwrap();
    assert_eq!(task.description, "MockData");
    assert!(!task.status);

    let reply = get(&app, "/find-all").await;
    assert!(reply.body.contains("MockData"));

    assert_redirects_to_list(&get(&app, "/change-status-by-id/1").await);
    assert!(service.get(1).unwrap().status);
    assert_redirects_to_list(&get(&app, "/change-status-by-id/1").await);
    assert!(!service.get(1).unwrap().status);

    assert_redirects_to_list(&post_form(&app, "/update-by-id/1", "description=Renamed").await);
    assert_eq!(service.get(1).unwrap().description, "Renamed");

    assert_redirects_to_list(&get(&app, "/delete-by-id/1").await);
    assert!(service.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_insert_checkbox_sets_status() {
    let (app, service) = app();
    post_form(&app, "/insert", "description=Checked&status=on").await;
    post_form(&app, "/insert", "description=Unchecked").await;

    let tasks = service.list().unwrap();
    assert_eq!(tasks, vec![Task::new(1, "Checked", true), Task::new(2, "Unchecked", false)]);
}

#[tokio::test]
async fn test_insert_existing_description_updates_status() {
    let (app, service) = app();
    post_form(&app, "/insert", "description=Same").await;
    let reply = post_form(&app, "/insert", "description=Same&status=True").await;

    assert_redirects_to_list(&reply);
    assert_eq!(service.list().unwrap(), vec![Task::new(1, "Same", true)]);
}

#[tokio::test]
async fn test_insert_without_description_rerenders_form() {
    let (app, service) = app();
    let reply = post_form(&app, "/insert", "description=&status=on").await;

    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("A task description is required"));
    assert!(reply.body.contains("checked"));
    assert!(service.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_form_page() {
    let (app, _) = app_with(InMemoryTaskStore::with_tasks(vec![Task::new(3, "Edit me", false)]));
    let reply = get(&app, "/update-by-id/3").await;

    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("<title>Update Task</title>"));
    assert!(reply.body.contains("value=\"Edit me\""));
    assert!(reply.body.contains("action=\"/update-by-id/3\""));
}

#[tokio::test]
async fn test_update_to_taken_description_is_rejected() {
    let (app, service) = app_with(InMemoryTaskStore::with_tasks(vec![
        Task::new(1, "First", false),
        Task::new(2, "Second", false),
    ]));

    let reply = post_form(&app, "/update-by-id/2", "description=First").await;
    assert_eq!(reply.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(reply.body.contains("already exists"));
    assert_eq!(service.get(2).unwrap().description, "Second");
}

#[tokio::test]
async fn test_put_and_delete_methods() {
    let (app, service) = app_with(InMemoryTaskStore::with_tasks(vec![Task::new(1, "Task", false)]));

    let put = Request::put("/change-status-by-id/1").body(Body::empty()).unwrap();
    assert_redirects_to_list(&send(&app, put).await);
    assert!(service.get(1).unwrap().status);

    let update = Request::put("/update-by-id/1")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("description=Changed"))
        .unwrap();
    assert_redirects_to_list(&send(&app, update).await);
    assert_eq!(service.get(1).unwrap().description, "Changed");

    let delete = Request::delete("/delete-by-id/1").body(Body::empty()).unwrap();
    assert_redirects_to_list(&send(&app, delete).await);
    assert!(service.list().unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_task_returns_not_found() {
    let (app, _) = app();

    let reply = get(&app, "/update-by-id/42").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("Task not found: 42"));

    let reply = get(&app, "/change-status-by-id/42").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_missing_task_still_redirects() {
    let (app, _) = app();
    assert_redirects_to_list(&get(&app, "/delete-by-id/42").await);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (app, _) = app();
    let reply = get(&app, "/update-by-id/abc").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_path_renders_not_found_page() {
    let (app, _) = app();
    let reply = get(&app, "/no-such-page").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.body.contains("<title>404 Not Found</title>"));
}

#[tokio::test]
async fn test_sqlite_backed_application() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig {
        store: StoreKind::Sqlite,
        database_path: dir.path().join("tasks.sqlite3"),
        ..AppConfig::default()
    };
    let state = cli::build_state(&config).unwrap();
    let service = state.service.clone();
    let app = router(state);

    post_form(&app, "/insert", "description=Persisted&status=on").await;
    post_form(&app, "/insert", "description=Second").await;
    assert_redirects_to_list(&get(&app, "/change-status-by-id/2").await);

    // a fresh state over the same file sees the same tasks
    let reopened = cli::build_state(&config).unwrap();
    assert_eq!(
        reopened.service.list().unwrap(),
        vec![Task::new(1, "Persisted", true), Task::new(2, "Second", true)]
    );
    assert_eq!(service.list().unwrap().len(), 2);
}
