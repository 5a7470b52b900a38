//! HTTP handlers for the task API.

use crate::domain::{
    validate_description, validate_title, TaskError, TaskPriority, TaskStatus, ValidationError,
};
use crate::store::{NewTask, TaskFilters, TaskPatch, TaskStore};
use http::{Method, StatusCode};
use portico_core::{
    caller_app, decode_json, error_response, json_response, json_response_empty, BoxFuture,
    ErrorHandler, Handler, Request, Response,
};
use portico_server::Server;
use std::sync::Arc;
use uuid::Uuid;

/// Builds the error mapping for the task API: missing tasks become 404,
/// rejected input becomes 400, everything else stays 500.
#[must_use]
pub fn task_error_handler() -> ErrorHandler {
    ErrorHandler::new(vec![
        ErrorHandler::value_mapper(TaskError::NotFound, StatusCode::NOT_FOUND),
        ErrorHandler::value_mapper(TaskError::InvalidStatus, StatusCode::BAD_REQUEST),
        ErrorHandler::value_mapper(TaskError::InvalidPriority, StatusCode::BAD_REQUEST),
        ErrorHandler::value_mapper(TaskError::InvalidTitle, StatusCode::BAD_REQUEST),
        ErrorHandler::value_mapper(TaskError::InvalidDescription, StatusCode::BAD_REQUEST),
        ErrorHandler::value_mapper(TaskError::InvalidId, StatusCode::BAD_REQUEST),
        ErrorHandler::value_mapper(TaskError::EmptyUpdate, StatusCode::BAD_REQUEST),
        ErrorHandler::type_mapper::<ValidationError>(StatusCode::BAD_REQUEST),
    ])
}

/// Coordinates the task operations behind the HTTP handlers.
pub struct TaskController {
    store: Arc<dyn TaskStore>,
    errors: ErrorHandler,
}

impl TaskController {
    /// Creates a controller with the standard error mapping.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self::with_error_handler(store, task_error_handler())
    }

    /// Creates a controller with a custom error mapping.
    #[must_use]
    pub fn with_error_handler(store: Arc<dyn TaskStore>, errors: ErrorHandler) -> Self {
        Self { store, errors }
    }

    async fn list(&self, request: &mut dyn Request) -> anyhow::Result<Response> {
        let filters = parse_filters(request)?;
        let tasks = self.store.list(filters).await?;
        Ok(json_response(StatusCode::OK, &tasks))
    }

    async fn get(&self, request: &mut dyn Request) -> anyhow::Result<Response> {
        let id = parse_id(request)?;
        let task = self.store.get(id).await?;
        Ok(json_response(StatusCode::OK, &task))
    }

    async fn create(&self, request: &mut dyn Request) -> anyhow::Result<Response> {
        let body = request.take_body().unwrap_or_default();
        let input: NewTask =
            decode_json(&body).map_err(|err| ValidationError::new("body", err.to_string()))?;

        validate_title(&input.title)?;
        if let Some(description) = &input.description {
            validate_description(description)?;
        }

        let task = self.store.create(input).await?;
        Ok(json_response(StatusCode::CREATED, &task))
    }

    async fn update(&self, request: &mut dyn Request) -> anyhow::Result<Response> {
        let id = parse_id(request)?;
        let body = request.take_body().unwrap_or_default();
        let patch: TaskPatch =
            decode_json(&body).map_err(|err| ValidationError::new("body", err.to_string()))?;

        if patch.is_empty() {
            return Err(TaskError::EmptyUpdate.into());
        }
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        if let Some(description) = &patch.description {
            validate_description(description)?;
        }

        let task = self.store.update(id, patch).await?;
        Ok(json_response(StatusCode::OK, &task))
    }

    async fn delete(&self, request: &mut dyn Request) -> anyhow::Result<Response> {
        let id = parse_id(request)?;
        self.store.delete(id).await?;
        Ok(json_response_empty(StatusCode::NO_CONTENT))
    }

    fn respond(&self, request: &dyn Request, result: anyhow::Result<Response>) -> Response {
        match result {
            Ok(response) => response,
            Err(err) => {
                let mapped = self.errors.handle(err);
                tracing::warn!(
                    status = mapped.status().as_u16(),
                    caller = caller_app(request),
                    error = %mapped,
                    "request failed"
                );
                error_response(&mapped)
            }
        }
    }
}

impl std::fmt::Debug for TaskController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskController").finish_non_exhaustive()
    }
}

fn parse_id(request: &dyn Request) -> Result<Uuid, TaskError> {
    let raw = request.param("id").ok_or(TaskError::InvalidId)?;
    Uuid::parse_str(raw).map_err(|_| TaskError::InvalidId)
}

fn parse_filters(request: &dyn Request) -> Result<TaskFilters, TaskError> {
    let mut filters = TaskFilters::default();
    if let Some(raw) = request.query("status") {
        filters.status = Some(TaskStatus::parse(raw).ok_or(TaskError::InvalidStatus)?);
    }
    if let Some(raw) = request.query("priority") {
        filters.priority = Some(TaskPriority::parse(raw).ok_or(TaskError::InvalidPriority)?);
    }
    Ok(filters)
}

macro_rules! task_handler {
    ($(#[$doc:meta])* $name:ident => $method:ident) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name(pub Arc<TaskController>);

        impl Handler for $name {
            fn handle<'a>(&'a self, request: &'a mut dyn Request) -> BoxFuture<'a, Response> {
                Box::pin(async move {
                    let result = self.0.$method(&mut *request).await;
                    self.0.respond(&*request, result)
                })
            }
        }
    };
}

task_handler! {
    /// `GET /api/tasks` with optional `status` and `priority` filters.
    ListTasks => list
}
task_handler! {
    /// `GET /api/tasks/{id}`.
    GetTask => get
}
task_handler! {
    /// `POST /api/tasks`.
    CreateTask => create
}
task_handler! {
    /// `PATCH /api/tasks/{id}`.
    UpdateTask => update
}
task_handler! {
    /// `DELETE /api/tasks/{id}`.
    DeleteTask => delete
}

/// Registers the task API routes on a server.
pub fn register_routes(server: &mut Server, controller: Arc<TaskController>) {
    server.route(
        Method::GET,
        "/api/tasks",
        ListTasks(Arc::clone(&controller)),
    );
    server.route(
        Method::POST,
        "/api/tasks",
        CreateTask(Arc::clone(&controller)),
    );
    server.route(
        Method::GET,
        "/api/tasks/{id}",
        GetTask(Arc::clone(&controller)),
    );
    server.route(
        Method::PATCH,
        "/api/tasks/{id}",
        UpdateTask(Arc::clone(&controller)),
    );
    server.route(Method::DELETE, "/api/tasks/{id}", DeleteTask(controller));
}
