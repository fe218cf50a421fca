//! HTTP surface for the rotation core.
//!
//! The router is built here (rather than in the binary) so integration
//! tests can drive it in-process. Access control is the deployment's
//! concern: these handlers assume the caller is an authenticated operator.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::{ErrorKind, ManagerError};
use crate::lifecycle::{MatchRecord, Team};
use crate::queue::QueueEntry;
use crate::rotation::{CheckoutStatus, MatchType, PlayerRotationStatus, RankingEntry};
use crate::rotation_manager::{CreateRotationResponse, RotationManager, RotationStateResponse};
use crate::share::{share_code_to_uuid, uuid_to_share_code};
use crate::suggest::MatchSuggestion;
use crate::validation::validate_display_name;

#[derive(Clone)]
pub struct AppState {
    pub manager: RotationManager,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: ManagerError) -> ApiError {
    let status = match &err {
        ManagerError::RotationNotFound => StatusCode::NOT_FOUND,
        ManagerError::LockError => StatusCode::INTERNAL_SERVER_ERROR,
        ManagerError::Core(core) => match core.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
        },
    };
    (status, Json(ErrorResponse { error: err.to_string() }))
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message.to_string() }))
}

fn not_found(message: &str) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorResponse { error: message.to_string() }))
}

/// Deserializes a field that must distinguish "absent" from an explicit
/// null: absent stays `None`, any present value (including null) becomes
/// `Some(...)`. Pair with `#[serde(default)]`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_return_to_queue() -> bool {
    true
}

fn default_match_type() -> MatchType {
    MatchType::Doubles
}

#[derive(Debug, Deserialize)]
pub struct CreateRotationRequest {
    #[serde(default)]
    pub court_ids: Vec<Uuid>,
    #[serde(default = "default_return_to_queue")]
    pub return_to_queue: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckOutRequest {
    pub status: CheckoutStatus,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    #[serde(rename = "type")]
    pub match_type: MatchType,
    pub player_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ordered_entry_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveEntryRequest {
    pub entry_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    #[serde(default = "default_match_type")]
    pub match_type: MatchType,
}

#[derive(Debug, Deserialize)]
pub struct StartMatchRequest {
    pub court_occupancy_id: Uuid,
    pub match_type: MatchType,
    pub teams: [Vec<Uuid>; 2],
    #[serde(default)]
    pub entry_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartMatchResponse {
    pub match_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EndMatchRequest {
    pub match_id: Uuid,
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub winner_team: Option<Team>,
}

#[derive(Debug, Deserialize)]
pub struct CancelMatchRequest {
    pub match_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CorrectResultRequest {
    pub match_id: Uuid,
    #[serde(default, deserialize_with = "double_option")]
    pub score: Option<Option<Value>>,
    #[serde(default, deserialize_with = "double_option")]
    pub winner_team: Option<Option<Team>>,
}

#[derive(Debug, Deserialize)]
pub struct AddCourtRequest {
    pub court_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddCourtResponse {
    pub court_occupancy_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareCodeResponse {
    pub rotation_id: Uuid,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RankingsResponse {
    pub rotation_id: Uuid,
    pub total_players: usize,
    pub players: Vec<RankingEntry>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/rotations", post(create_rotation).get(list_rotations))
        .route("/rotations/{rotation_id}", get(rotation_state).delete(remove_rotation))
        .route("/rotations/{rotation_id}/players/{player_id}/checkin", post(check_in))
        .route("/rotations/{rotation_id}/players/{player_id}/present", post(mark_present))
        .route("/rotations/{rotation_id}/players/{player_id}/checkout", post(check_out))
        .route("/rotations/{rotation_id}/queue", get(queue_contents).post(enqueue))
        .route("/rotations/{rotation_id}/queue/reorder", post(reorder_queue))
        .route("/rotations/{rotation_id}/queue/remove", post(remove_entry))
        .route("/rotations/{rotation_id}/suggest", post(suggest))
        .route("/rotations/{rotation_id}/matches", get(match_history))
        .route("/rotations/{rotation_id}/matches/start", post(start_match))
        .route("/rotations/{rotation_id}/matches/end", post(end_match))
        .route("/rotations/{rotation_id}/matches/cancel", post(cancel_match))
        .route("/rotations/{rotation_id}/matches/correct", post(correct_result))
        .route("/rotations/{rotation_id}/matches/{match_id}", get(match_record))
        .route("/rotations/{rotation_id}/courts", post(add_court))
        .route("/rotations/{rotation_id}/courts/{court_occupancy_id}/maintenance", post(set_court_maintenance))
        .route("/rotations/{rotation_id}/courts/{court_occupancy_id}/available", post(set_court_available))
        .route("/rotations/{rotation_id}/rankings", get(rankings))
        .route("/rotations/{rotation_id}/share", get(share_code))
        .route("/share/{code}", get(resolve_share_code))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(serde_json::json!({
        "name": "Open Play Rotation Server",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "create_rotation": "POST /rotations",
            "rotation_state": "GET /rotations/{rotation_id}",
            "check_in": "POST /rotations/{rotation_id}/players/{player_id}/checkin",
            "enqueue": "POST /rotations/{rotation_id}/queue",
            "suggest": "POST /rotations/{rotation_id}/suggest",
            "start_match": "POST /rotations/{rotation_id}/matches/start",
            "end_match": "POST /rotations/{rotation_id}/matches/end",
            "cancel_match": "POST /rotations/{rotation_id}/matches/cancel",
            "correct_result": "POST /rotations/{rotation_id}/matches/correct",
            "rankings": "GET /rotations/{rotation_id}/rankings"
        }
    }))
}

async fn create_rotation(
    State(state): State<AppState>,
    Json(request): Json<CreateRotationRequest>,
) -> Result<Json<CreateRotationResponse>, ApiError> {
    state
        .manager
        .create_rotation(&request.court_ids, request.return_to_queue)
        .map(Json)
        .map_err(error_response)
}

async fn list_rotations(State(state): State<AppState>) -> Result<Json<Vec<Uuid>>, ApiError> {
    state.manager.list_rotations().map(Json).map_err(error_response)
}

async fn rotation_state(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
) -> Result<Json<RotationStateResponse>, ApiError> {
    state.manager.rotation_state(rotation_id).map(Json).map_err(error_response)
}

async fn remove_rotation(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .remove_rotation(rotation_id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

async fn check_in(
    State(state): State<AppState>,
    Path((rotation_id, player_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<PlayerRotationStatus>, ApiError> {
    let display_name = match request.name {
        Some(raw) => Some(validate_display_name(&raw).map_err(|msg| bad_request(&msg))?),
        None => None,
    };
    state
        .manager
        .check_in(rotation_id, player_id, display_name)
        .map(Json)
        .map_err(error_response)
}

async fn mark_present(
    State(state): State<AppState>,
    Path((rotation_id, player_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PlayerRotationStatus>, ApiError> {
    state
        .manager
        .mark_present(rotation_id, player_id)
        .map(Json)
        .map_err(error_response)
}

async fn check_out(
    State(state): State<AppState>,
    Path((rotation_id, player_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CheckOutRequest>,
) -> Result<Json<PlayerRotationStatus>, ApiError> {
    state
        .manager
        .check_out(rotation_id, player_id, request.status)
        .map(Json)
        .map_err(error_response)
}

async fn queue_contents(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
) -> Result<Json<Vec<QueueEntry>>, ApiError> {
    state.manager.queue_contents(rotation_id).map(Json).map_err(error_response)
}

async fn enqueue(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<EnqueueRequest>,
) -> Result<Json<QueueEntry>, ApiError> {
    state
        .manager
        .enqueue(rotation_id, request.match_type, &request.player_ids)
        .map(Json)
        .map_err(error_response)
}

async fn reorder_queue(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<QueueEntry>>, ApiError> {
    state
        .manager
        .reorder_queue(rotation_id, &request.ordered_entry_ids)
        .map(Json)
        .map_err(error_response)
}

async fn remove_entry(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<RemoveEntryRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .remove_entry(rotation_id, request.entry_id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

async fn suggest(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<MatchSuggestion>, ApiError> {
    match state.manager.suggest(rotation_id, request.match_type) {
        Ok(Some(suggestion)) => Ok(Json(suggestion)),
        Ok(None) => Err(not_found("Not enough eligible players")),
        Err(err) => Err(error_response(err)),
    }
}

async fn start_match(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<StartMatchRequest>,
) -> Result<Json<StartMatchResponse>, ApiError> {
    state
        .manager
        .start_match(
            rotation_id,
            request.court_occupancy_id,
            request.match_type,
            request.teams,
            request.entry_ids.as_deref(),
        )
        .map(|match_id| Json(StartMatchResponse { match_id }))
        .map_err(error_response)
}

async fn end_match(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<EndMatchRequest>,
) -> Result<Json<StartMatchResponse>, ApiError> {
    state
        .manager
        .end_match(rotation_id, request.match_id, request.score, request.winner_team)
        .map(|_| Json(StartMatchResponse { match_id: request.match_id }))
        .map_err(error_response)
}

async fn cancel_match(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<CancelMatchRequest>,
) -> Result<Json<StartMatchResponse>, ApiError> {
    state
        .manager
        .cancel_match(rotation_id, request.match_id)
        .map(|_| Json(StartMatchResponse { match_id: request.match_id }))
        .map_err(error_response)
}

async fn correct_result(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<CorrectResultRequest>,
) -> Result<Json<MatchRecord>, ApiError> {
    // An explicit null score clears the stored blob.
    let score = request.score.map(|s| s.unwrap_or(Value::Null));
    state
        .manager
        .correct_result(rotation_id, request.match_id, score, request.winner_team)
        .map_err(error_response)?;
    state
        .manager
        .match_record(rotation_id, request.match_id)
        .map(Json)
        .map_err(error_response)
}

async fn match_record(
    State(state): State<AppState>,
    Path((rotation_id, match_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MatchRecord>, ApiError> {
    state
        .manager
        .match_record(rotation_id, match_id)
        .map(Json)
        .map_err(error_response)
}

async fn match_history(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
) -> Result<Json<Vec<MatchRecord>>, ApiError> {
    state.manager.match_history(rotation_id).map(Json).map_err(error_response)
}

async fn add_court(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
    Json(request): Json<AddCourtRequest>,
) -> Result<Json<AddCourtResponse>, ApiError> {
    state
        .manager
        .add_court(rotation_id, request.court_id)
        .map(|court_occupancy_id| Json(AddCourtResponse { court_occupancy_id }))
        .map_err(error_response)
}

async fn set_court_maintenance(
    State(state): State<AppState>,
    Path((rotation_id, court_occupancy_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .set_court_maintenance(rotation_id, court_occupancy_id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

async fn set_court_available(
    State(state): State<AppState>,
    Path((rotation_id, court_occupancy_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .set_court_available(rotation_id, court_occupancy_id)
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(error_response)
}

async fn rankings(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
) -> Result<Json<RankingsResponse>, ApiError> {
    state
        .manager
        .rankings(rotation_id)
        .map(|players| {
            Json(RankingsResponse { rotation_id, total_players: players.len(), players })
        })
        .map_err(error_response)
}

async fn share_code(
    State(state): State<AppState>,
    Path(rotation_id): Path<Uuid>,
) -> Result<Json<ShareCodeResponse>, ApiError> {
    // Only mint codes for rotations that exist.
    state.manager.rotation_state(rotation_id).map_err(error_response)?;
    Ok(Json(ShareCodeResponse { rotation_id, code: uuid_to_share_code(rotation_id) }))
}

async fn resolve_share_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RotationStateResponse>, ApiError> {
    let rotation_id = share_code_to_uuid(&code).ok_or_else(|| not_found("Unknown share code"))?;
    state.manager.rotation_state(rotation_id).map(Json).map_err(error_response)
}
