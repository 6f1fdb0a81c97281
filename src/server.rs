use axum::{
    extract::State as AxumState,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, get_service, post},
    Json, Router,
};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::characters;
use crate::patch::PatchTarget;
use crate::session::SessionError;
use crate::store::StoreError;
use crate::types::*;

type HandlerError = (StatusCode, String);

// ── Router and server ──────────────────────────────────────────────────

pub fn overlay_router(state: OverlayServerState, static_dir: PathBuf) -> Router {
    let static_files = get_service(ServeDir::new(static_dir));

    Router::new()
        .route("/state.json", get(get_overlay_state_json))
        .route("/api/session", get(get_session))
        .route("/api/catalog", get(get_catalog))
        .route("/api/select", post(post_select))
        .route("/api/patch", post(post_patch))
        .route("/api/character", post(post_character))
        .route("/api/commentators", post(post_commentators))
        .route("/api/swap", post(post_swap))
        .route("/api/save", post(post_save))
        .route("/api/state", post(post_state))
        .route("/api/reload", post(post_reload))
        .nest_service("/", static_files)
        .with_state(state)
}

pub async fn start_overlay_server(state: OverlayServerState, static_dir: PathBuf, addr: &str) {
    let app = overlay_router(state, static_dir);
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("overlay server failed to bind {addr}: {e}");
            return;
        }
    };
    info!("overlay server listening at http://{addr}/");
    if let Err(e) = axum::serve(listener, app).await {
        error!("overlay server error: {e}");
    }
}

// ── Error mapping ──────────────────────────────────────────────────────

fn session_error(err: SessionError) -> HandlerError {
    let status = match &err {
        SessionError::NotLoaded => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Patch(_) | SessionError::Invalid(_) => StatusCode::BAD_REQUEST,
    };
    (status, err.to_string())
}

fn store_error(err: StoreError) -> HandlerError {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

// ── Overlay endpoint ───────────────────────────────────────────────────

async fn get_overlay_state_json(
    AxumState(state): AxumState<OverlayServerState>,
) -> axum::response::Response {
    let current = {
        let guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
        guard.state().cloned()
    };
    let Some(current) = current else {
        return session_error(SessionError::NotLoaded).into_response();
    };
    let body = serde_json::to_string(&current).unwrap_or_else(|_| "{}".to_string());
    (
        [
            ("Content-Type", "application/json"),
            ("Cache-Control", "no-store"),
            ("Pragma", "no-cache"),
            ("Expires", "0"),
        ],
        body,
    )
        .into_response()
}

// ── Control panel endpoints ────────────────────────────────────────────

async fn get_session(AxumState(state): AxumState<OverlayServerState>) -> Json<SessionSnapshot> {
    let guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    Json(guard.snapshot())
}

async fn get_catalog() -> Json<CatalogPayload> {
    let characters = characters::CHARACTER_COLORS
        .iter()
        .map(|&(name, colors)| CharacterInfo { name, colors })
        .collect();
    Json(CatalogPayload {
        characters,
        round_codes: ROUND_CODES,
        best_of_choices: BEST_OF_CHOICES,
    })
}

async fn post_select(
    AxumState(state): AxumState<OverlayServerState>,
    Json(payload): Json<SelectPayload>,
) -> Json<SessionSnapshot> {
    let mut guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    guard.select(payload.index);
    Json(guard.snapshot())
}

async fn post_patch(
    AxumState(state): AxumState<OverlayServerState>,
    Json(payload): Json<PatchPayload>,
) -> Result<Json<AllSetupsState>, HandlerError> {
    let target = PatchTarget::parse(&payload.path)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let mut guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    let setup = guard.resolve_setup(payload.setup);
    let next = guard
        .patched(setup, target, &payload.value)
        .map_err(session_error)?;
    guard.commit(next.clone());
    Ok(Json(next))
}

async fn post_character(
    AxumState(state): AxumState<OverlayServerState>,
    Json(payload): Json<CharacterPayload>,
) -> Result<Json<AllSetupsState>, HandlerError> {
    let mut guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    let setup = guard.resolve_setup(payload.setup);
    let next = guard
        .with_character(setup, payload.player, &payload.character)
        .map_err(session_error)?;
    guard.commit(next.clone());
    Ok(Json(next))
}

async fn post_commentators(
    AxumState(state): AxumState<OverlayServerState>,
    Json(payload): Json<CommentatorsPayload>,
) -> Result<Json<AllSetupsState>, HandlerError> {
    let mut guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    let setup = guard.resolve_setup(payload.setup);
    let next = guard
        .with_commentators(setup, payload.commentators)
        .map_err(session_error)?;
    guard.commit(next.clone());
    Ok(Json(next))
}

// Swap-then-persist. The session commits only after the write lands, so a
// failed save leaves the pre-swap value in memory.
async fn post_swap(
    AxumState(state): AxumState<OverlayServerState>,
    Json(payload): Json<SwapPayload>,
) -> Result<Json<AllSetupsState>, HandlerError> {
    let mut guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    let setup = guard.resolve_setup(payload.setup);
    let swapped = guard.swapped(setup).map_err(session_error)?;
    let persisted = state.store.save(&swapped).map_err(store_error)?;
    guard.commit(persisted.clone());
    state.store.audit(&format!("swap sides (setup {setup})"));
    Ok(Json(persisted))
}

async fn post_save(
    AxumState(state): AxumState<OverlayServerState>,
) -> Result<Json<AllSetupsState>, HandlerError> {
    let guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    let current = guard
        .state()
        .cloned()
        .ok_or_else(|| session_error(SessionError::NotLoaded))?;
    let persisted = state.store.save(&current).map_err(store_error)?;
    state.store.audit("manual save");
    Ok(Json(persisted))
}

async fn post_state(
    AxumState(state): AxumState<OverlayServerState>,
    Json(candidate): Json<AllSetupsState>,
) -> Result<Json<AllSetupsState>, HandlerError> {
    let mut guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    let next = guard.replaced(candidate).map_err(session_error)?;
    let persisted = state.store.save(&next).map_err(store_error)?;
    guard.commit(persisted.clone());
    state.store.audit("state replaced");
    Ok(Json(persisted))
}

async fn post_reload(
    AxumState(state): AxumState<OverlayServerState>,
) -> Result<Json<SessionSnapshot>, HandlerError> {
    let mut guard = state.session.lock().unwrap_or_else(|e| e.into_inner());
    let loaded = state.store.load().map_err(store_error)?;
    guard.install(loaded);
    Ok(Json(guard.snapshot()))
}
