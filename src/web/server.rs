//! HTTP server implementation.
//!
//! This module provides the axum-based JSON API that maps routes onto the
//! tree operations. Every request is followed by a check-in so the daily
//! schedule rollover is observed regardless of which route comes first.

use axum::{
    Router,
    extract::{Form, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::db::Database;
use crate::error::{ErrorCode, TreeError};
use crate::types::{AppState, DueDateEdit, DuePart, FilterKind, Task, TaskId, TaskOption, TaskView};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct AppServer {
    /// Reference to the task database.
    db: Arc<Database>,
}

impl AppServer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

/// Error body returned for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: ErrorCode,
    message: String,
}

/// Wrapper turning [`TreeError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(TreeError);

impl From<TreeError> for ApiError {
    fn from(err: TreeError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(TreeError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            TreeError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            TreeError::InvalidFieldValue { .. } => StatusCode::BAD_REQUEST,
            TreeError::Database(_) | TreeError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if !self.0.is_client_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            code: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Tree returned after structural edits and filter changes.
#[derive(Debug, Serialize)]
struct TreeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<TaskId>,
    changed: bool,
    tree: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
struct CreatedResponse {
    task_id: TaskId,
    task: Task,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    task_id: TaskId,
    removed: usize,
}

#[derive(Debug, Serialize)]
struct FlagResponse {
    task_id: TaskId,
    value: bool,
}

#[derive(Debug, Serialize)]
struct TextResponse {
    task_id: TaskId,
    value: String,
}

#[derive(Debug, Serialize)]
struct LabelsResponse {
    task_id: TaskId,
    value: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
struct FilterResponse {
    state: AppState,
    tree: Vec<TaskView>,
}

#[derive(Debug, Deserialize)]
struct CreateRootForm {
    #[serde(default)]
    at_front: bool,
}

#[derive(Debug, Deserialize)]
struct ValueForm {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct DisplacementForm {
    #[serde(default)]
    displacement: String,
}

impl DisplacementForm {
    fn parse(&self) -> Result<i64, TreeError> {
        self.displacement
            .trim()
            .parse()
            .map_err(|_| TreeError::invalid_value("displacement", "expected an integer"))
    }
}

#[derive(Debug, Deserialize)]
struct FilterForm {
    value: Option<String>,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Full rendered tree.
async fn api_tree(State(state): State<AppServer>) -> ApiResult<Vec<TaskView>> {
    Ok(Json(state.db().render_views()?))
}

async fn api_tags(State(state): State<AppServer>) -> ApiResult<BTreeSet<String>> {
    Ok(Json(state.db().list_all_tags()?))
}

async fn api_state(State(state): State<AppServer>) -> ApiResult<AppState> {
    Ok(Json(state.db().app_state()?))
}

async fn api_create_root(
    State(state): State<AppServer>,
    Form(form): Form<CreateRootForm>,
) -> ApiResult<TreeResponse> {
    let task_id = state.db().create_root(form.at_front)?;
    Ok(Json(TreeResponse {
        task_id: Some(task_id),
        changed: true,
        tree: state.db().render_views()?,
    }))
}

async fn api_create_child(
    State(state): State<AppServer>,
    Path(parent_id): Path<TaskId>,
) -> ApiResult<CreatedResponse> {
    let task_id = state.db().create_child(parent_id)?;
    Ok(Json(CreatedResponse {
        task_id,
        task: state.db().get_task(task_id)?,
    }))
}

async fn api_delete(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<DeletedResponse> {
    let removed = state.db().delete_subtree(task_id)?;
    Ok(Json(DeletedResponse { task_id, removed }))
}

async fn api_toggle(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
) -> ApiResult<FlagResponse> {
    let value = state.db().toggle_completed(task_id)?;
    Ok(Json(FlagResponse { task_id, value }))
}

async fn api_set_name(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
    Form(form): Form<ValueForm>,
) -> ApiResult<TextResponse> {
    let value = state.db().set_name(task_id, &form.value)?;
    Ok(Json(TextResponse { task_id, value }))
}

async fn api_set_description(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
    Form(form): Form<ValueForm>,
) -> ApiResult<TextResponse> {
    let value = state.db().set_description(task_id, &form.value)?;
    Ok(Json(TextResponse { task_id, value }))
}

async fn api_set_tags(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
    Form(form): Form<ValueForm>,
) -> ApiResult<LabelsResponse> {
    let value = state.db().set_tags(task_id, &form.value)?;
    Ok(Json(LabelsResponse { task_id, value }))
}

async fn api_set_schedule(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
    Form(form): Form<ValueForm>,
) -> ApiResult<LabelsResponse> {
    let value = state.db().set_schedule(task_id, &form.value)?;
    Ok(Json(LabelsResponse { task_id, value }))
}

async fn api_move(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
    Form(form): Form<DisplacementForm>,
) -> ApiResult<TreeResponse> {
    let changed = state
        .db()
        .move_within_visible_siblings(task_id, form.parse()?)?;
    Ok(Json(TreeResponse {
        task_id: Some(task_id),
        changed,
        tree: state.db().render_views()?,
    }))
}

async fn api_indent(
    State(state): State<AppServer>,
    Path(task_id): Path<TaskId>,
    Form(form): Form<DisplacementForm>,
) -> ApiResult<TreeResponse> {
    let changed = state.db().indent_or_outdent(task_id, form.parse()?)?;
    Ok(Json(TreeResponse {
        task_id: Some(task_id),
        changed,
        tree: state.db().render_views()?,
    }))
}

async fn api_toggle_option(
    State(state): State<AppServer>,
    Path((task_id, option)): Path<(TaskId, String)>,
) -> ApiResult<FlagResponse> {
    let option = TaskOption::parse(&option)
        .ok_or_else(|| TreeError::invalid_value("option", format!("unknown option '{}'", option)))?;
    let value = state.db().toggle_option(task_id, option)?;
    Ok(Json(FlagResponse { task_id, value }))
}

async fn api_set_due(
    State(state): State<AppServer>,
    Path((task_id, part)): Path<(TaskId, String)>,
    Form(form): Form<ValueForm>,
) -> ApiResult<DueDateEdit> {
    let part = DuePart::parse(&part)
        .ok_or_else(|| TreeError::invalid_value("part", format!("unknown date part '{}'", part)))?;
    Ok(Json(state.db().set_due_date_part(task_id, part, &form.value)?))
}

async fn api_set_filter(
    State(state): State<AppServer>,
    Path(kind): Path<String>,
    Form(form): Form<FilterForm>,
) -> ApiResult<FilterResponse> {
    let kind = FilterKind::parse(&kind)
        .ok_or_else(|| TreeError::invalid_value("kind", format!("unknown filter '{}'", kind)))?;
    let app_state = state.db().set_filter(kind, form.value.as_deref())?;
    Ok(Json(FilterResponse {
        state: app_state,
        tree: state.db().render_views()?,
    }))
}

/// Stamp the check-in after every request.
async fn check_in_after(State(state): State<AppServer>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if let Err(e) = state.db().check_in() {
        warn!(error = %e, "Check-in failed");
    }
    response
}

/// Build the application router.
pub fn build_router(state: AppServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/tree", get(api_tree))
        .route("/api/tags", get(api_tags))
        .route("/api/state", get(api_state))
        .route("/api/tasks", post(api_create_root))
        .route("/api/tasks/{task_id}", delete(api_delete))
        .route("/api/tasks/{task_id}/children", post(api_create_child))
        .route("/api/tasks/{task_id}/toggle", post(api_toggle))
        .route("/api/tasks/{task_id}/name", post(api_set_name))
        .route("/api/tasks/{task_id}/description", post(api_set_description))
        .route("/api/tasks/{task_id}/tags", post(api_set_tags))
        .route("/api/tasks/{task_id}/schedule", post(api_set_schedule))
        .route("/api/tasks/{task_id}/move", post(api_move))
        .route("/api/tasks/{task_id}/indent", post(api_indent))
        .route("/api/tasks/{task_id}/option/{option}", post(api_toggle_option))
        .route("/api/tasks/{task_id}/due/{part}", post(api_set_due))
        .route("/api/filter/{kind}", post(api_set_filter))
        .layer(middleware::from_fn_with_state(state.clone(), check_in_after))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    /// Address the server is bound to.
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Signal shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.task.await;
    }
}

/// Start the HTTP server on `addr`.
pub async fn start_server(db: Arc<Database>, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
    let app = build_router(AppServer::new(db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task tree server listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Task tree server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}
