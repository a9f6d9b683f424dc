use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::services::{ServeDir, ServeFile};

use guild_app::AppState as App;
use guild_core::{DailyRecord, ExtractionResult, Guild, MatchPolicy, MemberInput, RosterMember};
use scan::{ReconcileOutcome, TesseractEngine};

#[derive(Serialize)]
struct ApiError {
    error: String,
}

#[derive(Clone)]
struct AppState {
    app: App,
}

#[derive(Deserialize)]
struct MemberPayload {
    id: Option<i64>,
    name: String,
    combat_power: i64,
    role: String,
}

#[derive(Deserialize)]
struct GuildCreatePayload {
    name: String,
}

#[derive(Deserialize)]
struct ActiveGuildPayload {
    id: i64,
}

#[derive(Serialize, Deserialize)]
struct GuildsResponse {
    active_guild_id: Option<i64>,
    guilds: Vec<Guild>,
}

#[derive(Serialize, Deserialize)]
struct SettingsResponse {
    guild: String,
    active_guild_id: i64,
    match_policy: String,
}

#[derive(Deserialize)]
struct SettingsPayload {
    guild: Option<String>,
    match_policy: Option<String>,
}

const DEFAULT_SCAN_TIMEOUT_MS: u64 = 15_000;

fn resolve_app_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(PathBuf::from))
}

fn resolve_db_path_with(app_dir: Option<PathBuf>) -> PathBuf {
    let base = app_dir.unwrap_or_else(|| PathBuf::from("."));
    base.join("guild-manager.sqlite")
}

fn resolve_dist_dir() -> PathBuf {
    let env_override = std::env::var_os("GUILD_MANAGER_DIST").map(PathBuf::from);
    let exe_dir = resolve_app_dir();
    resolve_dist_dir_with(env_override, exe_dir)
}

fn resolve_dist_dir_with(env_override: Option<PathBuf>, exe_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = env_override {
        return dir;
    }
    if let Some(dir) = exe_dir {
        let candidate = dir.join("dist");
        if candidate.is_dir() {
            return candidate;
        }
    }
    PathBuf::from("apps/web/dist")
}

fn resolve_scan_timeout() -> Duration {
    let millis = std::env::var("GUILD_MANAGER_SCAN_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SCAN_TIMEOUT_MS);
    Duration::from_millis(millis)
}

#[tokio::main]
async fn main() {
    let app_dir = resolve_app_dir().or_else(|| std::env::current_dir().ok());
    let db_path = resolve_db_path_with(app_dir);
    let engine = Arc::new(TesseractEngine::from_env());
    let app = App::new(db_path, resolve_scan_timeout(), engine);
    if let Err(err) = app.initialize() {
        eprintln!("failed to initialize database: {}", err);
        std::process::exit(1);
    }
    let router = build_app(AppState { app });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3030")
        .await
        .expect("bind server");
    let url = "http://127.0.0.1:3030";
    if let Err(err) = open_browser(url) {
        eprintln!("failed to open browser: {}", err);
    }
    axum::serve(listener, router).await.expect("serve");
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        Command::new("open").arg(url).spawn()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        Command::new("cmd").args(["/C", "start", "", url]).spawn()?;
        Ok(())
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        Command::new("xdg-open").arg(url).spawn()?;
        Ok(())
    }
}

fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/health", get(health))
        .route("/api/members", get(members_list).post(members_upsert))
        .route("/api/members/:id", delete(members_delete))
        .route("/api/records", get(records_dates))
        .route("/api/records/:date", get(records_get).put(records_merge))
        .route("/api/records/:date/reconcile", post(records_reconcile))
        .route("/api/scan", post(scan_image))
        .route("/api/guilds", get(guilds_list).post(guilds_create))
        .route("/api/guilds/active", put(guilds_set_active))
        .route("/api/guilds/:id", delete(guilds_delete))
        .route("/api/settings", get(settings_get).put(settings_put))
        .with_state(state);

    let dist_dir = resolve_dist_dir();
    let static_service =
        ServeDir::new(&dist_dir).fallback(ServeFile::new(dist_dir.join("index.html")));

    api.fallback_service(static_service)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn members_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<RosterMember>>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .roster
        .list()
        .map(Json)
        .map_err(to_api_error)
}

async fn members_upsert(
    State(state): State<AppState>,
    Json(payload): Json<MemberPayload>,
) -> Result<Json<RosterMember>, (StatusCode, Json<ApiError>)> {
    let input = MemberInput {
        name: payload.name.trim().to_string(),
        combat_power: payload.combat_power,
        role: payload.role,
    };
    state
        .app
        .services
        .roster
        .upsert(payload.id, &input)
        .map(Json)
        .map_err(to_api_error)
}

async fn members_delete(
    State(state): State<AppState>,
    AxumPath(member_id): AxumPath<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .roster
        .delete(member_id)
        .map_err(to_api_error)?;
    Ok(Json(serde_json::json!({ "deleted": member_id })))
}

async fn records_dates(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .records
        .dates()
        .map(Json)
        .map_err(to_api_error)
}

async fn records_get(
    State(state): State<AppState>,
    AxumPath(date): AxumPath<String>,
) -> Result<Json<DailyRecord>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .records
        .get(&date)
        .map(Json)
        .map_err(to_api_error)
}

async fn records_merge(
    State(state): State<AppState>,
    AxumPath(date): AxumPath<String>,
    Json(record): Json<DailyRecord>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ApiError>)> {
    let merged = state
        .app
        .services
        .records
        .merge(&date, &record)
        .map_err(to_api_error)?;
    Ok(Json(serde_json::json!({ "merged": merged })))
}

async fn records_reconcile(
    State(state): State<AppState>,
    AxumPath(date): AxumPath<String>,
    Json(extraction): Json<ExtractionResult>,
) -> Result<Json<ReconcileOutcome>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .scan
        .reconcile(&date, &extraction)
        .map(Json)
        .map_err(to_api_error)
}

async fn scan_image(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ExtractionResult>, (StatusCode, Json<ApiError>)> {
    if body.is_empty() {
        return Err(to_bad_request("image body is required"));
    }
    state
        .app
        .services
        .scan
        .scan(body.to_vec())
        .map(Json)
        .map_err(to_api_error)
}

async fn guilds_list(
    State(state): State<AppState>,
) -> Result<Json<GuildsResponse>, (StatusCode, Json<ApiError>)> {
    let active = state.app.services.guilds.active().map_err(to_api_error)?;
    let guilds = state.app.services.guilds.list().map_err(to_api_error)?;
    Ok(Json(GuildsResponse {
        active_guild_id: Some(active.id),
        guilds,
    }))
}

async fn guilds_create(
    State(state): State<AppState>,
    Json(payload): Json<GuildCreatePayload>,
) -> Result<Json<Guild>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .guilds
        .create(&payload.name)
        .map(Json)
        .map_err(to_api_error)
}

async fn guilds_set_active(
    State(state): State<AppState>,
    Json(payload): Json<ActiveGuildPayload>,
) -> Result<Json<Guild>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .guilds
        .set_active(payload.id)
        .map(Json)
        .map_err(to_api_error)
}

async fn guilds_delete(
    State(state): State<AppState>,
    AxumPath(guild_id): AxumPath<i64>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ApiError>)> {
    state
        .app
        .services
        .guilds
        .delete(guild_id)
        .map_err(to_api_error)?;
    Ok(Json(serde_json::json!({ "deleted": guild_id })))
}

async fn settings_get(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, (StatusCode, Json<ApiError>)> {
    let snapshot = state.app.services.settings.get().map_err(to_api_error)?;
    Ok(Json(SettingsResponse {
        guild: snapshot.guild,
        active_guild_id: snapshot.active_guild_id,
        match_policy: snapshot.match_policy.as_str().to_string(),
    }))
}

async fn settings_put(
    State(state): State<AppState>,
    Json(payload): Json<SettingsPayload>,
) -> Result<Json<SettingsResponse>, (StatusCode, Json<ApiError>)> {
    let match_policy = match payload.match_policy.as_deref() {
        Some(value) => Some(
            MatchPolicy::parse(value)
                .ok_or_else(|| to_bad_request(format!("unsupported match policy {}", value)))?,
        ),
        None => None,
    };
    state
        .app
        .services
        .settings
        .update(payload.guild.as_deref(), match_policy)
        .map_err(to_api_error)?;
    settings_get(State(state)).await
}

fn to_api_error(err: guild_app::AppError) -> (StatusCode, Json<ApiError>) {
    let api: guild_app::ApiError = err.into();
    let status =
        StatusCode::from_u16(api.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiError {
            error: api.message,
        }),
    )
}

fn to_bad_request(err: impl std::fmt::Display) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            error: err.to_string(),
        }),
    )
}
