use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of both POST and PUT. PUT replaces all three fields; any that are
/// missing take their zero value.
#[derive(Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Default)]
pub struct Tasks {
    next_id: u64,
    by_id: BTreeMap<u64, Task>,
}

pub type Db = Arc<RwLock<Tasks>>;

/// Error response carrying `{"error": message}`.
pub struct ApiError(StatusCode, &'static str);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

const NOT_FOUND: ApiError = ApiError(StatusCode::NOT_FOUND, "Task not found");
const BAD_ID: ApiError = ApiError(StatusCode::BAD_REQUEST, "Invalid task ID");
const BAD_PAYLOAD: ApiError = ApiError(StatusCode::BAD_REQUEST, "Invalid request payload");

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Tasks::default()));
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", get(get_task).put(update_task).delete(delete_task))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

fn parse_id(raw: &str) -> Result<u64, ApiError> {
    raw.parse().map_err(|_| BAD_ID)
}

fn parse_input(input: Result<Json<TaskInput>, JsonRejection>) -> Result<TaskInput, ApiError> {
    input.map(|Json(input)| input).map_err(|rejection| {
        debug!(error = %rejection, "rejected payload");
        BAD_PAYLOAD
    })
}

async fn list_tasks(State(db): State<Db>) -> Json<Vec<Task>> {
    let tasks = db.read().await;
    Json(tasks.by_id.values().cloned().collect())
}

async fn create_task(
    State(db): State<Db>,
    input: Result<Json<TaskInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let input = parse_input(input)?;
    let mut tasks = db.write().await;
    tasks.next_id += 1;
    let task = Task {
        id: tasks.next_id,
        title: input.title,
        description: input.description,
        completed: input.completed,
        created_at: Utc::now(),
    };
    tasks.by_id.insert(task.id, task.clone());
    debug!(id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    let tasks = db.read().await;
    tasks.by_id.get(&id).cloned().map(Json).ok_or(NOT_FOUND)
}

async fn update_task(
    State(db): State<Db>,
    Path(id): Path<String>,
    input: Result<Json<TaskInput>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&id)?;
    let mut tasks = db.write().await;
    let task = tasks.by_id.get_mut(&id).ok_or(NOT_FOUND)?;
    let input = parse_input(input)?;
    task.title = input.title;
    task.description = input.description;
    task.completed = input.completed;
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = parse_id(&id)?;
    let mut tasks = db.write().await;
    tasks.by_id.remove(&id).ok_or(NOT_FOUND)?;
    Ok(Json(json!({ "result": "success" })))
}
