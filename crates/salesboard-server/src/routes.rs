//! HTTP and WebSocket routes for the Salesboard server.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{
        DefaultBodyLimit, Path, Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
};
use futures::{SinkExt, StreamExt};
use salesboard_core::{DashboardConfig, DashboardTable, Dataset, LoadOptions, Render, to_csv_string};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::ServerResult;
use crate::protocol::{ClientMessage, FilterUpdate, ServerMessage, SessionState};
use crate::session::{DashboardSession, SessionHandle, SessionStore};

/// Upload limit when none is configured.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Application state shared across handlers.
pub struct AppState {
    /// Live sessions.
    pub sessions: SessionStore,
    /// How uploads are parsed.
    pub load_options: LoadOptions,
    /// Sizes of ranked and sampled views.
    pub dashboard: DashboardConfig,
    /// Largest accepted upload body.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(load_options: LoadOptions, dashboard: DashboardConfig) -> Self {
        Self {
            sessions: SessionStore::new(),
            load_options,
            dashboard,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Create the router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .route("/api/sessions", post(upload_handler).layer(upload_limit))
        .route(
            "/api/sessions/{id}",
            get(session_handler).delete(delete_handler),
        )
        .route("/api/sessions/{id}/filters", post(filters_handler))
        .route("/api/sessions/{id}/tables/{table}", get(table_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Index page describing the API.
async fn index_handler() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Salesboard</title>
    <style>
        body { font-family: system-ui, sans-serif; margin: 2rem; }
        h1 { color: #2563eb; }
    </style>
</head>
<body>
    <h1>Salesboard Server</h1>
    <p>API endpoints:</p>
    <ul>
        <li><code>GET /health</code> - Health check</li>
        <li><code>POST /api/sessions?filename=sales.csv</code> - Upload a dataset (raw body)</li>
        <li><code>GET /api/sessions/{id}</code> - Filter panel and dashboard</li>
        <li><code>POST /api/sessions/{id}/filters</code> - Update the selection</li>
        <li><code>GET /api/sessions/{id}/tables/{table}</code> - Download a table as CSV</li>
        <li><code>DELETE /api/sessions/{id}</code> - Close a session</li>
    </ul>
    <p>WebSocket endpoint: <code>/ws?session={id}</code></p>
</body>
</html>"#,
    )
}

/// Health check handler.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    filename: String,
}

/// Parse an uploaded file and open a session for it.
async fn upload_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> ServerResult<(StatusCode, Json<SessionState>)> {
    tracing::info!("Upload {} ({} bytes)", query.filename, body.len());

    // Parsing large spreadsheets is CPU-bound.
    let options = state.load_options.clone();
    let name = query.filename.clone();
    let dataset =
        tokio::task::spawn_blocking(move || Dataset::from_bytes(&name, &body, &options)).await??;

    let session = DashboardSession::new(query.filename, dataset, state.dashboard)?;
    let snapshot = session.get_state();
    state.sessions.insert(session).await;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

async fn session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ServerResult<Json<SessionState>> {
    let handle = state.sessions.get(id).await?;
    let session = handle.read().await;
    Ok(Json(session.get_state()))
}

async fn filters_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(update): Json<FilterUpdate>,
) -> ServerResult<Json<SessionState>> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.write().await;
    Ok(Json(session.update_filters(update)))
}

#[derive(Debug, Default, Deserialize)]
struct TableQuery {
    format: Option<String>,
}

/// Download one table as CSV, or as an HTML table with `?format=html`.
async fn table_handler(
    State(state): State<Arc<AppState>>,
    Path((id, table)): Path<(Uuid, String)>,
    Query(query): Query<TableQuery>,
) -> ServerResult<Response> {
    let table: DashboardTable = table.parse()?;
    let handle = state.sessions.get(id).await?;
    let data = handle.read().await.table(table)?;

    if query.format.as_deref() == Some("html") {
        let html = data.render_html().unwrap_or_else(|| data.render_text());
        return Ok(Html(html).into_response());
    }

    let csv = to_csv_string(&data)?;
    let disposition = format!("attachment; filename=\"{}\"", table.file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ServerResult<StatusCode> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    session: Uuid,
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
) -> ServerResult<Response> {
    let handle = state.sessions.get(query.session).await?;
    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, handle).await;
        // Idle time counts from the last disconnect.
        state.sessions.touch(query.session).await;
    }))
}

type WsSender = Arc<tokio::sync::Mutex<futures::stream::SplitSink<WebSocket, Message>>>;

/// Handle WebSocket connection.
async fn handle_websocket(socket: WebSocket, handle: SessionHandle) {
    let (sender, mut receiver) = socket.split();
    let sender: WsSender = Arc::new(tokio::sync::Mutex::new(sender));

    // Subscribe before the initial snapshot so no update falls in between.
    let (mut rx, initial) = {
        let session = handle.read().await;
        (session.subscribe(), session.state_message())
    };
    send_message(&sender, &initial).await;

    // Forward broadcast states to this client.
    let sender_clone = sender.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if !send_message(&sender_clone, &msg).await {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("WebSocket client lagged by {} messages", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Handle incoming client messages
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => handle_client_message(msg, &handle, &sender).await,
                Err(e) => {
                    tracing::warn!("Failed to parse client message: {} (input: {})", e, text);
                    send_message(
                        &sender,
                        &ServerMessage::Error {
                            message: format!("Invalid message format: {}", e),
                        },
                    )
                    .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::warn!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    forward_task.abort();
}

/// Send a server message through the WebSocket. Returns `false` once the socket is gone.
async fn send_message(sender: &WsSender, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => {
            let mut sender = sender.lock().await;
            sender.send(Message::Text(json.into())).await.is_ok()
        }
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle a client message.
///
/// State changes reach this client through the session broadcast.
async fn handle_client_message(msg: ClientMessage, handle: &SessionHandle, sender: &WsSender) {
    match msg {
        ClientMessage::GetState => {
            let state_msg = handle.read().await.state_message();
            send_message(sender, &state_msg).await;
        }
        ClientMessage::UpdateFilters { filters } => {
            handle.write().await.update_filters(filters);
        }
        ClientMessage::SetTheme { theme } => {
            handle.write().await.set_theme(theme);
        }
    }
}
