//! axum router and handlers.

use axum::{
    Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{BoardError, BoardResult, ErrorCode};
use crate::service::BoardService;
use crate::types::{
    Actor, Board, BoardKind, BoardPatch, BoardView, Column, ColumnPatch, ColumnSettings,
    ColumnType, Group, GroupPatch, Role, StageBreakdown, StoredValue, Task, TaskPatch,
};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    service: BoardService,
}

impl ApiState {
    pub fn new(service: BoardService) -> Self {
        Self { service }
    }
}

impl ErrorCode {
    pub fn http_status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Authorization => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BoardError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> BoardResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            BoardError::new(ErrorCode::Authorization, format!("missing {} header", name))
                .with_field(name)
        })
}

/// Build the actor context from forwarded session headers.
pub fn actor_from_headers(headers: &HeaderMap) -> BoardResult<Actor> {
    let actor_id = header(headers, "x-actor-id")?;
    let tenant_id = header(headers, "x-tenant-id")?;
    let role_str = header(headers, "x-actor-role")?;
    let role = Role::from_str(role_str).ok_or_else(|| {
        BoardError::new(ErrorCode::Authorization, format!("unknown role: {}", role_str))
            .with_field("x-actor-role")
    })?;

    let mut actor = Actor::new(actor_id, role, tenant_id);
    if let Some(flag) = headers.get("x-can-edit").and_then(|v| v.to_str().ok()) {
        match flag.trim() {
            "true" | "1" => actor = actor.with_edit_override(true),
            "false" | "0" => actor = actor.with_edit_override(false),
            _ => {}
        }
    }
    Ok(actor)
}

/// Extractor wrapper for the forwarded actor.
pub struct RequestActor(pub Actor);

impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = BoardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(RequestActor)
    }
}

type ApiResult<T> = Result<Json<T>, BoardError>;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct CreateBoardRequest {
    name: String,
    #[serde(default)]
    kind: BoardKind,
    #[serde(default)]
    public_readable: bool,
}

#[derive(Deserialize)]
struct ViewQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct AddColumnRequest {
    name: String,
    column_type: ColumnType,
    settings: Option<ColumnSettings>,
    width: Option<i32>,
}

#[derive(Deserialize)]
struct CreateGroupRequest {
    name: Option<String>,
}

#[derive(Deserialize)]
struct MoveRequest {
    position: i32,
}

#[derive(Deserialize)]
struct CreateTaskRequest {
    name: String,
}

#[derive(Deserialize)]
struct SetValueRequest {
    value: Value,
    expected_version: Option<i64>,
}

#[derive(Deserialize)]
struct ClearValueQuery {
    expected_version: Option<i64>,
}

#[derive(Serialize)]
struct Cleared {
    version: i64,
}

#[derive(Serialize)]
struct Deleted {
    deleted: bool,
}

async fn list_boards(State(state): State<ApiState>, RequestActor(actor): RequestActor) -> ApiResult<Vec<Board>> {
    Ok(Json(state.service.list_boards(&actor)?))
}

async fn create_board(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Json(req): Json<CreateBoardRequest>,
) -> ApiResult<Board> {
    Ok(Json(state.service.create_board(
        &actor,
        &req.name,
        req.kind,
        req.public_readable,
    )?))
}

async fn get_board(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(board_id): Path<String>,
    Query(query): Query<ViewQuery>,
) -> ApiResult<BoardView> {
    Ok(Json(state.service.get_board_view(
        &actor,
        &board_id,
        query.q.as_deref(),
    )?))
}

async fn update_board(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(board_id): Path<String>,
    Json(patch): Json<BoardPatch>,
) -> ApiResult<Board> {
    Ok(Json(state.service.update_board(&actor, &board_id, patch)?))
}

async fn delete_board(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(board_id): Path<String>,
) -> ApiResult<Deleted> {
    state.service.delete_board(&actor, &board_id)?;
    Ok(Json(Deleted { deleted: true }))
}

async fn list_columns(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(board_id): Path<String>,
) -> ApiResult<Vec<Column>> {
    Ok(Json(state.service.list_columns(&actor, &board_id)?))
}

async fn add_column(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(board_id): Path<String>,
    Json(req): Json<AddColumnRequest>,
) -> ApiResult<Column> {
    Ok(Json(state.service.add_column(
        &actor,
        &board_id,
        &req.name,
        req.column_type,
        req.settings,
        req.width,
    )?))
}

async fn update_column(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(column_id): Path<String>,
    Json(patch): Json<ColumnPatch>,
) -> ApiResult<Column> {
    Ok(Json(state.service.update_column_settings(&actor, &column_id, patch)?))
}

async fn delete_column(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(column_id): Path<String>,
) -> ApiResult<Deleted> {
    state.service.delete_column(&actor, &column_id)?;
    Ok(Json(Deleted { deleted: true }))
}

async fn column_counts(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path((board_id, column_id)): Path<(String, String)>,
) -> ApiResult<HashMap<String, usize>> {
    Ok(Json(state.service.count_by_status(&actor, &board_id, &column_id)?))
}

async fn column_stages(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path((board_id, column_id)): Path<(String, String)>,
) -> ApiResult<StageBreakdown> {
    Ok(Json(state.service.stage_breakdown(&actor, &board_id, &column_id)?))
}

async fn create_group(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(board_id): Path<String>,
    Json(req): Json<CreateGroupRequest>,
) -> ApiResult<Group> {
    Ok(Json(state.service.create_group(&actor, &board_id, req.name.as_deref())?))
}

async fn update_group(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(group_id): Path<String>,
    Json(patch): Json<GroupPatch>,
) -> ApiResult<Group> {
    Ok(Json(state.service.update_group(&actor, &group_id, patch)?))
}

async fn move_group(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(group_id): Path<String>,
    Json(req): Json<MoveRequest>,
) -> ApiResult<Group> {
    Ok(Json(state.service.move_group(&actor, &group_id, req.position)?))
}

async fn delete_group(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(group_id): Path<String>,
) -> ApiResult<Deleted> {
    state.service.delete_group(&actor, &group_id)?;
    Ok(Json(Deleted { deleted: true }))
}

async fn create_task(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(group_id): Path<String>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<Task> {
    Ok(Json(state.service.create_task(&actor, &group_id, &req.name)?))
}

async fn get_task(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(task_id): Path<String>,
) -> ApiResult<Task> {
    Ok(Json(state.service.get_task(&actor, &task_id)?))
}

async fn update_task(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(task_id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Task> {
    Ok(Json(state.service.update_task(&actor, &task_id, patch)?))
}

async fn delete_task(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path(task_id): Path<String>,
) -> ApiResult<Deleted> {
    state.service.delete_task(&actor, &task_id)?;
    Ok(Json(Deleted { deleted: true }))
}

async fn get_value(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path((task_id, column_id)): Path<(String, String)>,
) -> ApiResult<Option<StoredValue>> {
    Ok(Json(state.service.get_field_value(&actor, &task_id, &column_id)?))
}

async fn set_value(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path((task_id, column_id)): Path<(String, String)>,
    Json(req): Json<SetValueRequest>,
) -> ApiResult<StoredValue> {
    Ok(Json(state.service.set_field_value(
        &actor,
        &task_id,
        &column_id,
        &req.value,
        req.expected_version,
    )?))
}

async fn clear_value(
    State(state): State<ApiState>,
    RequestActor(actor): RequestActor,
    Path((task_id, column_id)): Path<(String, String)>,
    Query(query): Query<ClearValueQuery>,
) -> ApiResult<Cleared> {
    let version = state.service.clear_field_value(
        &actor,
        &task_id,
        &column_id,
        query.expected_version,
    )?;
    Ok(Json(Cleared { version }))
}

/// Build the router with all routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/boards", get(list_boards).post(create_board))
        .route(
            "/api/boards/{board_id}",
            get(get_board).patch(update_board).delete(delete_board),
        )
        .route(
            "/api/boards/{board_id}/columns",
            get(list_columns).post(add_column),
        )
        .route(
            "/api/boards/{board_id}/columns/{column_id}/counts",
            get(column_counts),
        )
        .route(
            "/api/boards/{board_id}/columns/{column_id}/stages",
            get(column_stages),
        )
        .route("/api/boards/{board_id}/groups", post(create_group))
        .route(
            "/api/columns/{column_id}",
            axum::routing::patch(update_column).delete(delete_column),
        )
        .route(
            "/api/groups/{group_id}",
            axum::routing::patch(update_group).delete(delete_group),
        )
        .route("/api/groups/{group_id}/move", post(move_group))
        .route("/api/groups/{group_id}/tasks", post(create_task))
        .route(
            "/api/tasks/{task_id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route(
            "/api/tasks/{task_id}/values/{column_id}",
            put(set_value).get(get_value).delete(clear_value),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A running API server.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.shutdown_tx.send(());
        self.task.await?;
        Ok(())
    }
}

/// Start the HTTP server on the specified port (0 picks a free one).
pub async fn start_server(service: BoardService, port: u16) -> anyhow::Result<ServerHandle> {
    let app = build_router(ApiState::new(service));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    info!("Board API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Board API shutting down");
            })
            .await
        {
            tracing::error!("Board API server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx,
        task,
    })
}
