//! Task API exercised through a full interceptor chain.

use http::StatusCode;
use portico_core::{BoxFuture, Response};
use portico_middleware::{Chain, InterceptedRequest, Interceptor};
use portico_tasks::{
    CreateTask, GetTask, MemoryStore, Task, TaskController, TaskStore, UpdateTask,
};
use portico_test::{RecordingWriter, TestRequest};
use std::sync::Arc;
use uuid::Uuid;

/// Stamps a response header after the handler has answered.
struct RequestId;

impl Interceptor for RequestId {
    fn name(&self) -> &'static str {
        "request-id"
    }

    fn handle<'a, 'w>(&'a self, mut request: InterceptedRequest<'a, 'w>) -> BoxFuture<'a, Response>
    where
        'w: 'a,
    {
        Box::pin(async move {
            let response = request.next().await;
            response.header("x-request-id", "itest-1")
        })
    }
}

/// Rejects requests that do not identify the calling application.
struct RequireCaller;

impl Interceptor for RequireCaller {
    fn name(&self) -> &'static str {
        "require-caller"
    }

    fn handle<'a, 'w>(&'a self, mut request: InterceptedRequest<'a, 'w>) -> BoxFuture<'a, Response>
    where
        'w: 'a,
    {
        Box::pin(async move {
            if request.header("x-api-client-application").is_none() {
                return Response::new(StatusCode::UNAUTHORIZED, "caller not identified");
            }
            request.next().await
        })
    }
}

fn controller() -> (Arc<MemoryStore>, Arc<TaskController>) {
    let store = Arc::new(MemoryStore::new());
    let controller = Arc::new(TaskController::new(
        Arc::clone(&store) as Arc<dyn TaskStore>
    ));
    (store, controller)
}

#[tokio::test]
async fn test_create_through_chain_stamps_request_id() {
    let (_, controller) = controller();
    let chain = Chain::new(CreateTask(controller)).intercept(RequestId);

    let mut request = TestRequest::get("/api/tasks")
        .body(r#"{"title":"ship the release","priority":"high"}"#);
    let mut writer = RecordingWriter::new();
    let response = chain.run(&mut request, &mut writer).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("x-request-id").unwrap(), "itest-1");

    let task: Task = serde_json::from_slice(response.body_bytes()).unwrap();
    assert_eq!(task.title, "ship the release");

    let written = writer.into_response();
    assert_eq!(written.status(), StatusCode::CREATED);
    assert_eq!(written.headers().get("x-request-id").unwrap(), "itest-1");
}

#[tokio::test]
async fn test_missing_task_maps_to_404_through_chain() {
    let (_, controller) = controller();
    let chain = Chain::new(GetTask(controller)).intercept(RequestId);

    let mut request =
        TestRequest::get("/api/tasks/{id}").param("id", Uuid::now_v7().to_string());
    let mut writer = RecordingWriter::new();
    let response = chain.run(&mut request, &mut writer).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = serde_json::from_slice(response.body_bytes()).unwrap();
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "Not Found: task not found");
    assert_eq!(body["causes"][0], "task not found");

    // Error responses pick up interceptor headers like any other response.
    assert_eq!(response.headers().get("x-request-id").unwrap(), "itest-1");
}

#[tokio::test]
async fn test_guard_short_circuits_before_store_access() {
    let (store, controller) = controller();
    let chain = Chain::new(CreateTask(controller)).intercept(RequireCaller);

    let mut request = TestRequest::get("/api/tasks").body(r#"{"title":"sneaky"}"#);
    let mut writer = RecordingWriter::new();
    let response = chain.run(&mut request, &mut writer).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_guard_admits_identified_caller() {
    let (store, controller) = controller();
    let chain = Chain::new(CreateTask(controller)).intercept(RequireCaller);

    let mut request = TestRequest::get("/api/tasks")
        .header("x-api-client-application", "suite")
        .body(r#"{"title":"legit"}"#);
    let mut writer = RecordingWriter::new();
    let response = chain.run(&mut request, &mut writer).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_update_validation_error_through_chain() {
    let (store, controller) = controller();
    let seeded = store
        .create(portico_tasks::NewTask {
            title: "draft".to_string(),
            description: None,
            status: None,
            priority: None,
        })
        .await
        .unwrap();

    let chain = Chain::new(UpdateTask(controller));

    let mut request = TestRequest::get("/api/tasks/{id}")
        .param("id", seeded.id.to_string())
        .body(r#"{"title":""}"#);
    let mut writer = RecordingWriter::new();
    let response = chain.run(&mut request, &mut writer).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(response.body_bytes()).unwrap();
    assert_eq!(
        body["causes"][0],
        "invalid title: must be between 1 and 100 characters"
    );
}
