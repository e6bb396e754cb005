use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use shared::{validate_new_task, validate_task_patch, Task};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::ApiError;
use crate::store::Collection;

/// Shared handler state: the injected store handle, or `None` when the
/// store client failed to initialize (every task route then answers 503).
#[derive(Clone)]
pub struct AppState {
    store: Option<Arc<dyn Collection>>,
}

impl AppState {
    pub fn new(store: Arc<dyn Collection>) -> Self {
        Self { store: Some(store) }
    }

    /// State for a service whose store never came up.
    pub fn unavailable() -> Self {
        Self { store: None }
    }

    fn store(&self) -> Result<&Arc<dyn Collection>, ApiError> {
        self.store
            .as_ref()
            .ok_or_else(|| ApiError::StoreUnavailable("store client is not initialized".into()))
    }
}

/// Build the service router: task CRUD plus the static front-end.
pub fn router(state: AppState, static_dir: &std::path::Path) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        // The collection routes also answer with a trailing slash.
        .route("/tasks/", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let store = state.store()?;
    let documents = store.all().await?;
    let mut tasks = Vec::with_capacity(documents.len());
    for (id, doc) in documents {
        match Task::from_document(&id, &doc) {
            Ok(task) => tasks.push(task),
            Err(e) => tracing::warn!(task_id = %id, error = %e, "skipping unshapeable task record"),
        }
    }
    Ok(Json(tasks))
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store()?;
    let doc = store
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;
    let task = Task::from_document(&id, &doc)
        .map_err(|e| ApiError::Internal(format!("stored task '{id}' is unreadable: {e}")))?;
    Ok(Json(task))
}

async fn create_task(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store()?;
    let Json(raw) = payload?;
    let new_task = validate_new_task(&raw)?;
    let id = match &new_task.id {
        Some(id) => {
            if store.get(id).await?.is_some() {
                return Err(ApiError::Conflict(id.clone()));
            }
            id.clone()
        }
        None => store.new_id(),
    };
    store.set(&id, new_task.document(), false).await?;
    read_back(store, &id).await.map(Json)
}

async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let store = state.store()?;
    let Json(raw) = payload?;
    let patch = validate_task_patch(&raw)?;
    if store.get(&id).await?.is_none() {
        return Err(ApiError::NotFound(id));
    }
    if !patch.is_empty() {
        store.set(&id, patch.document(), true).await?;
    }
    read_back(store, &id).await.map(Json)
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let store = state.store()?;
    if store.get(&id).await?.is_none() {
        return Err(ApiError::NotFound(id));
    }
    store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Writes answer with what the store now holds, not with what was sent.
async fn read_back(store: &Arc<dyn Collection>, id: &str) -> Result<Task, ApiError> {
    let doc = store.get(id).await?.ok_or_else(|| {
        ApiError::Internal(format!("task '{id}' vanished between write and read-back"))
    })?;
    Task::from_document(id, &doc)
        .map_err(|e| ApiError::Internal(format!("stored task '{id}' is unreadable: {e}")))
}
