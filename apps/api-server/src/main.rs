//! api-server — HTTP API for the club registry workspace.
//!
//! Exposes member and club CRUD plus the club membership endpoints:
//! - Storage: In-memory or SQLite (file) when the `sqlite` feature is enabled.
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string) for a frontend.
//! - Errors: `{"error": {"code", "message"}}` with 404 for unknown ids, 412
//!   for broken business rules and 400 for malformed fields.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # throwaway in-memory storage with JSON logs
//! STORAGE_PROVIDER=memory LOG_FORMAT=json cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.
//!

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use domain::adapters::memory_repo::InMemoryStore;
use domain::membership::MembershipService;
use domain::service::{ClubService, MemberService};
use domain::{
    Club, ClubId, ClubRepository, ClubWithMembers, CoreError, ErrorKind, Member, MemberId,
    MemberRepository, MemberWithClubs, NewClub, NewMember,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Local repo abstraction supporting memory or sqlite (feature-gated).
enum RepoKind {
    Memory(InMemoryStore),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteRepo),
}

/// One shared store handed to all three services.
#[derive(Clone)]
struct AnyRepo {
    kind: Arc<RepoKind>,
}

impl AnyRepo {
    fn memory() -> Self {
        Self {
            kind: Arc::new(RepoKind::Memory(InMemoryStore::new())),
        }
    }

    #[cfg(feature = "sqlite")]
    fn sqlite(path: &std::path::Path) -> Result<Self, CoreError> {
        // Ensure directory exists
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        Ok(Self {
            kind: Arc::new(RepoKind::Sqlite(sqlite_adapter::SqliteRepo::new(path)?)),
        })
    }
}

impl MemberRepository for AnyRepo {
    fn find_all(&self) -> Result<Vec<MemberWithClubs>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => MemberRepository::find_all(r),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => MemberRepository::find_all(r),
        }
    }

    fn find_by_id(&self, id: &MemberId) -> Result<Option<MemberWithClubs>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => MemberRepository::find_by_id(r, id),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => MemberRepository::find_by_id(r, id),
        }
    }

    fn insert(&self, member: NewMember) -> Result<Member, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => MemberRepository::insert(r, member),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => MemberRepository::insert(r, member),
        }
    }

    fn update(&self, member: &Member) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => MemberRepository::update(r, member),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => MemberRepository::update(r, member),
        }
    }

    fn remove(&self, id: &MemberId) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => MemberRepository::remove(r, id),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => MemberRepository::remove(r, id),
        }
    }
}

impl ClubRepository for AnyRepo {
    fn find_all(&self) -> Result<Vec<ClubWithMembers>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => ClubRepository::find_all(r),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => ClubRepository::find_all(r),
        }
    }

    fn find_by_id(&self, id: &ClubId) -> Result<Option<ClubWithMembers>, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => ClubRepository::find_by_id(r, id),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => ClubRepository::find_by_id(r, id),
        }
    }

    fn insert(&self, club: NewClub) -> Result<Club, CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => ClubRepository::insert(r, club),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => ClubRepository::insert(r, club),
        }
    }

    fn update(&self, club: &Club) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => ClubRepository::update(r, club),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => ClubRepository::update(r, club),
        }
    }

    fn remove(&self, id: &ClubId) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => ClubRepository::remove(r, id),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => ClubRepository::remove(r, id),
        }
    }

    fn link_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.link_member(club_id, member_id),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.link_member(club_id, member_id),
        }
    }

    fn unlink_member(&self, club_id: &ClubId, member_id: &MemberId) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.unlink_member(club_id, member_id),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.unlink_member(club_id, member_id),
        }
    }

    fn replace_members(&self, club_id: &ClubId, member_ids: &[MemberId]) -> Result<(), CoreError> {
        match &*self.kind {
            RepoKind::Memory(r) => r.replace_members(club_id, member_ids),
            #[cfg(feature = "sqlite")]
            RepoKind::Sqlite(r) => r.replace_members(club_id, member_ids),
        }
    }
}

#[derive(Clone)]
struct AppState {
    members: MemberService<AnyRepo>,
    clubs: ClubService<AnyRepo>,
    membership: MembershipService<AnyRepo, AnyRepo>,
}

impl AppState {
    fn new(repo: AnyRepo) -> Self {
        Self {
            members: MemberService::new(repo.clone()),
            clubs: ClubService::new(repo.clone()),
            membership: MembershipService::new(repo.clone(), repo),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    let repo = match build_repo(&cfg) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, db_path = %cfg.db_path.display(), "failed to open storage");
            std::process::exit(1);
        }
    };
    let state = AppState::new(repo);

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = router(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%addr, "api-server listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/members", get(list_members).post(create_member))
        .route(
            "/api/members/:member_id",
            get(get_member).put(update_member).delete(delete_member),
        )
        .route("/api/clubs", get(list_clubs).post(create_club))
        .route(
            "/api/clubs/:club_id",
            get(get_club).put(update_club).delete(delete_club),
        )
        .route(
            "/api/clubs/:club_id/members",
            get(list_club_members).put(replace_club_members),
        )
        .route(
            "/api/clubs/:club_id/members/:member_id",
            get(get_club_member)
                .post(add_club_member)
                .delete(remove_club_member),
        )
        .with_state(state)
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct a repository instance based on config and feature flags.
fn build_repo(cfg: &config::Config) -> Result<AnyRepo, CoreError> {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => AnyRepo::sqlite(&cfg.db_path),
        _ => Ok(AnyRepo::memory()),
    }
}

// ============ Payloads ============

#[derive(Deserialize)]
struct MemberReq {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    birth_date: String,
}

#[derive(Deserialize)]
struct ClubReq {
    #[serde(default)]
    name: String,
    #[serde(default)]
    founded_on: String,
    #[serde(default)]
    image: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct MemberRef {
    id: MemberId,
}

#[derive(Serialize)]
struct MemberOut {
    id: String,
    name: String,
    email: String,
    birth_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    clubs: Option<Vec<ClubOut>>,
}

#[derive(Serialize)]
struct ClubOut {
    id: String,
    name: String,
    founded_on: String,
    image: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    members: Option<Vec<MemberOut>>,
}

fn member_to_out(member: Member) -> MemberOut {
    MemberOut {
        id: member.id.as_str().to_string(),
        name: member.name,
        email: member.email,
        birth_date: http_common::format_date(member.birth_date),
        clubs: None,
    }
}

fn member_with_clubs_to_out(m: MemberWithClubs) -> MemberOut {
    MemberOut {
        clubs: Some(m.clubs.into_iter().map(club_to_out).collect()),
        ..member_to_out(m.member)
    }
}

fn club_to_out(club: Club) -> ClubOut {
    ClubOut {
        id: club.id.as_str().to_string(),
        name: club.name,
        founded_on: http_common::format_date(club.founded_on),
        image: club.image,
        description: club.description,
        members: None,
    }
}

fn club_with_members_to_out(c: ClubWithMembers) -> ClubOut {
    ClubOut {
        members: Some(c.members.into_iter().map(member_to_out).collect()),
        ..club_to_out(c.club)
    }
}

fn bad_date(field: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(http_common::json_error_with_message(
            "bad_request",
            &format!("{field} debe ser una fecha (AAAA-MM-DD)"),
        )),
    )
        .into_response()
}

fn member_from_req(body: MemberReq) -> Result<NewMember, Response> {
    let birth_date = http_common::parse_date(&body.birth_date).map_err(|_| bad_date("birth_date"))?;
    Ok(NewMember {
        name: body.name,
        email: body.email,
        birth_date,
    })
}

fn club_from_req(body: ClubReq) -> Result<NewClub, Response> {
    let founded_on = http_common::parse_date(&body.founded_on).map_err(|_| bad_date("founded_on"))?;
    Ok(NewClub {
        name: body.name,
        founded_on,
        image: body.image,
        description: body.description,
    })
}

/// Map a domain error to a status code and structured body.
fn core_err_response(e: CoreError) -> Response {
    let status = match e.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if e.kind() == ErrorKind::Internal {
        error!(err = ?e, "storage error");
        return (status, Json(http_common::json_err("internal"))).into_response();
    }
    warn!(code = e.kind().as_str(), err = %e, "request rejected");
    (
        status,
        Json(http_common::json_error_with_message(
            e.kind().as_str(),
            &e.to_string(),
        )),
    )
        .into_response()
}

// ============ Handlers ============

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn list_members(State(state): State<AppState>) -> Response {
    match state.members.find_all() {
        Ok(items) => {
            let out: Vec<MemberOut> = items.into_iter().map(member_with_clubs_to_out).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => core_err_response(e),
    }
}

async fn get_member(State(state): State<AppState>, Path(member_id): Path<String>) -> Response {
    match state.members.find_one(&MemberId::new(member_id)) {
        Ok(m) => (StatusCode::OK, Json(member_with_clubs_to_out(m))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn create_member(State(state): State<AppState>, Json(body): Json<MemberReq>) -> Response {
    let input = match member_from_req(body) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    match state.members.create(input) {
        Ok(member) => (StatusCode::CREATED, Json(member_to_out(member))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn update_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    Json(body): Json<MemberReq>,
) -> Response {
    let input = match member_from_req(body) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    match state.members.update(&MemberId::new(member_id), input) {
        Ok(member) => (StatusCode::OK, Json(member_to_out(member))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn delete_member(State(state): State<AppState>, Path(member_id): Path<String>) -> Response {
    match state.members.delete(&MemberId::new(member_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn list_clubs(State(state): State<AppState>) -> Response {
    match state.clubs.find_all() {
        Ok(items) => {
            let out: Vec<ClubOut> = items.into_iter().map(club_with_members_to_out).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => core_err_response(e),
    }
}

async fn get_club(State(state): State<AppState>, Path(club_id): Path<String>) -> Response {
    match state.clubs.find_one(&ClubId::new(club_id)) {
        Ok(c) => (StatusCode::OK, Json(club_with_members_to_out(c))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn create_club(State(state): State<AppState>, Json(body): Json<ClubReq>) -> Response {
    let input = match club_from_req(body) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    match state.clubs.create(input) {
        Ok(club) => (StatusCode::CREATED, Json(club_to_out(club))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn update_club(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
    Json(body): Json<ClubReq>,
) -> Response {
    let input = match club_from_req(body) {
        Ok(i) => i,
        Err(resp) => return resp,
    };
    match state.clubs.update(&ClubId::new(club_id), input) {
        Ok(club) => (StatusCode::OK, Json(club_to_out(club))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn delete_club(State(state): State<AppState>, Path(club_id): Path<String>) -> Response {
    match state.clubs.delete(&ClubId::new(club_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn list_club_members(State(state): State<AppState>, Path(club_id): Path<String>) -> Response {
    match state.membership.find_members_from_club(&ClubId::new(club_id)) {
        Ok(members) => {
            let out: Vec<MemberOut> = members.into_iter().map(member_to_out).collect();
            (StatusCode::OK, Json(out)).into_response()
        }
        Err(e) => core_err_response(e),
    }
}

async fn replace_club_members(
    State(state): State<AppState>,
    Path(club_id): Path<String>,
    Json(body): Json<Vec<MemberRef>>,
) -> Response {
    let ids: Vec<MemberId> = body.into_iter().map(|r| r.id).collect();
    match state
        .membership
        .update_members_from_club(&ClubId::new(club_id), &ids)
    {
        Ok(club) => (StatusCode::OK, Json(club_with_members_to_out(club))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn get_club_member(
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(String, String)>,
) -> Response {
    match state
        .membership
        .find_member_from_club(&ClubId::new(club_id), &MemberId::new(member_id))
    {
        Ok(member) => (StatusCode::OK, Json(member_to_out(member))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn add_club_member(
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(String, String)>,
) -> Response {
    match state
        .membership
        .add_member_to_club(&ClubId::new(club_id), &MemberId::new(member_id))
    {
        Ok(club) => (StatusCode::CREATED, Json(club_with_members_to_out(club))).into_response(),
        Err(e) => core_err_response(e),
    }
}

async fn remove_club_member(
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(String, String)>,
) -> Response {
    match state
        .membership
        .delete_member_from_club(&ClubId::new(club_id), &MemberId::new(member_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => core_err_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::util::ServiceExt;

    fn app() -> Router {
        router(AppState::new(AnyRepo::memory()))
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn seed_member(router: &Router, name: &str) -> String {
        let (status, body) = send(
            router,
            "POST",
            "/api/members",
            Some(serde_json::json!({
                "name": name,
                "email": format!("{name}@club.co"),
                "birth_date": "1990-05-17"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn seed_club(router: &Router) -> String {
        let (status, body) = send(
            router,
            "POST",
            "/api/clubs",
            Some(serde_json::json!({
                "name": "Club Atletico",
                "founded_on": "1920-03-01",
                "image": "https://img.example/atletico.png",
                "description": "Club de atletismo"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn member_crud_flow() {
        let router = app();
        let id = seed_member(&router, "ana").await;

        let (status, body) = send(&router, "GET", &format!("/api/members/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "ana@club.co");
        assert_eq!(body["birth_date"], "1990-05-17");
        assert_eq!(body["clubs"], serde_json::json!([]));

        let (status, body) = send(
            &router,
            "PUT",
            &format!("/api/members/{id}"),
            Some(serde_json::json!({
                "name": "Ana B",
                "email": "anab@club.co",
                "birth_date": "1990-05-18"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], id.as_str());
        assert_eq!(body["name"], "Ana B");

        let (status, _) = send(&router, "DELETE", &format!("/api/members/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&router, "GET", &format!("/api/members/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "No se encontro ese socio");
    }

    #[tokio::test]
    async fn invalid_email_is_precondition_failed() {
        let router = app();
        let (status, body) = send(
            &router,
            "POST",
            "/api/members",
            Some(serde_json::json!({
                "name": "luis",
                "email": "invalidEmail",
                "birth_date": "1990-05-17"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["error"]["code"], "precondition_failed");
        assert_eq!(body["error"]["message"], "El correo no contiene @");
    }

    #[tokio::test]
    async fn bad_date_and_long_description_are_rejected() {
        let router = app();
        let (status, body) = send(
            &router,
            "POST",
            "/api/members",
            Some(serde_json::json!({
                "name": "luis",
                "email": "luis@club.co",
                "birth_date": "yesterday"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "birth_date debe ser una fecha (AAAA-MM-DD)"
        );

        let (status, body) = send(
            &router,
            "POST",
            "/api/clubs",
            Some(serde_json::json!({
                "name": "Club",
                "founded_on": "1920-03-01",
                "image": "https://img.example/c.png",
                "description": "x".repeat(101)
            })),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(
            body["error"]["message"],
            "La descripción supera la longitud permitida de 100"
        );
    }

    #[tokio::test]
    async fn membership_flow() {
        let router = app();
        let club = seed_club(&router).await;
        let ana = seed_member(&router, "ana").await;
        let bea = seed_member(&router, "bea").await;

        let (status, body) = send(
            &router,
            "POST",
            &format!("/api/clubs/{club}/members/{ana}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["members"].as_array().unwrap().len(), 1);

        let (status, body) = send(&router, "GET", &format!("/api/clubs/{club}/members/{ana}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], ana.as_str());

        let (status, body) = send(&router, "GET", &format!("/api/clubs/{club}/members/{bea}"), None).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(
            body["error"]["message"],
            "El club no esta relacionado con el socio"
        );

        let (status, body) = send(
            &router,
            "PUT",
            &format!("/api/clubs/{club}/members"),
            Some(serde_json::json!([{ "id": bea }])),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let members = body["members"].as_array().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0]["id"], bea.as_str());

        let (status, body) = send(&router, "GET", &format!("/api/members/{bea}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["clubs"][0]["id"], club.as_str());

        let (status, _) = send(
            &router,
            "DELETE",
            &format!("/api/clubs/{club}/members/{bea}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(
            &router,
            "DELETE",
            &format!("/api/clubs/{club}/members/{bea}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        let (status, body) = send(&router, "GET", &format!("/api/clubs/{club}/members"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!([]));
    }

    #[tokio::test]
    async fn list_endpoints_include_relations() {
        let router = app();
        let club = seed_club(&router).await;
        let ana = seed_member(&router, "ana").await;
        seed_member(&router, "bea").await;
        let (status, _) = send(
            &router,
            "POST",
            &format!("/api/clubs/{club}/members/{ana}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(&router, "GET", "/api/members", None).await;
        assert_eq!(status, StatusCode::OK);
        let members = body.as_array().unwrap();
        assert_eq!(members.len(), 2);
        for m in members {
            let clubs = m["clubs"].as_array().unwrap();
            if m["id"] == ana.as_str() {
                assert_eq!(clubs.len(), 1);
                assert_eq!(clubs[0]["id"], club.as_str());
            } else {
                assert!(clubs.is_empty());
            }
        }

        let (status, body) = send(&router, "GET", "/api/clubs", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], club.as_str());
        let club_members = body[0]["members"].as_array().unwrap();
        assert_eq!(club_members.len(), 1);
        assert_eq!(club_members[0]["id"], ana.as_str());
    }

    #[tokio::test]
    async fn unknown_club_is_not_found() {
        let router = app();
        let ana = seed_member(&router, "ana").await;
        let (status, body) = send(&router, "POST", &format!("/api/clubs/0/members/{ana}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
        assert_eq!(body["error"]["message"], "No se encontro ese club");

        let (status, body) = send(
            &router,
            "PUT",
            "/api/clubs/0",
            Some(serde_json::json!({
                "name": "Club",
                "founded_on": "1920-03-01",
                "image": "https://img.example/c.png",
                "description": "ok"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "No se encontro ese club");
    }

    #[tokio::test]
    async fn health_ok() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
