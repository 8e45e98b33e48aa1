//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::chain::{ChainError, RouteChain, SeedSummary};
use crate::dispatch::{ArrivalOutcome, ErrorKind, LifecycleError, TripDetail};
use crate::domain::{Loadsheet, MoraleRating, TemplateCode, TerminalCode, Trip, TripId};
use crate::mileage::MileageError;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/trips", post(create_trip))
        .route("/trips/:id", get(trip_detail).delete(delete_trip))
        .route("/trips/:id/driver", post(assign_driver))
        .route("/trips/:id/equipment", post(assign_equipment))
        .route("/trips/:id/dispatch", post(dispatch))
        .route("/trips/:id/arrive", post(arrive))
        .route("/trips/:id/morale", post(rate_trip))
        .route("/trips/:id/cancel", post(cancel))
        .route("/trips/:id/complete", post(complete))
        .route("/trips/:id/status", post(update_status))
        .route("/trips/:id/loadsheets", post(link_loadsheet))
        .route("/mileage", get(mileage))
        .route("/mileage/matrix", get(matrix_mileage))
        .route("/legacy-routes/reconstruct", post(reconstruct_all))
        .route("/legacy-routes/:name/reconstruct", post(reconstruct_route))
        .route("/legacy-routes/seed-templates", post(seed_templates))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn create_trip(
    State(state): State<AppState>,
    Json(req): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>), AppError> {
    let code = TemplateCode::parse_normalized(&req.template).map_err(|e| AppError::BadRequest {
        message: format!("Invalid template code {:?}: {e}", req.template),
    })?;

    let trip = state
        .coordinator
        .create_trip(&code, req.date, &req.assignments)?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn trip_detail(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<TripDetail>, AppError> {
    Ok(Json(state.coordinator.trip_detail(TripId(id))?))
}

async fn delete_trip(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DeleteTripResponse>, AppError> {
    let deleted = state.coordinator.delete_trip(TripId(id))?;
    Ok(Json(DeleteTripResponse { deleted }))
}

async fn assign_driver(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<AssignDriverRequest>,
) -> Result<Json<Trip>, AppError> {
    let trip = state
        .coordinator
        .assign_driver(TripId(id), req.driver, req.team_driver)?;
    Ok(Json(trip))
}

async fn assign_equipment(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(set): Json<crate::dispatch::EquipmentSet>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.coordinator.assign_equipment(TripId(id), set)?))
}

/// Driver-initiated departure.
async fn dispatch(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<DispatchRequest>,
) -> Result<Json<Trip>, AppError> {
    let trip = state
        .coordinator
        .dispatch(TripId(id), req.driver, req.notes.as_deref())?;
    Ok(Json(trip))
}

/// Driver-initiated arrival with the end-of-trip report.
async fn arrive(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<ArriveRequest>,
) -> Result<Json<ArrivalOutcome>, AppError> {
    let outcome = state
        .coordinator
        .arrive(TripId(id), req.driver, &req.details)?;
    Ok(Json(outcome))
}

async fn rate_trip(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<RateTripRequest>,
) -> Result<Json<MoraleRating>, AppError> {
    let rating = state
        .coordinator
        .rate_trip(TripId(id), req.driver, req.rating)?;
    Ok(Json(rating))
}

async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<Trip>, AppError> {
    let trip = state
        .coordinator
        .cancel(TripId(id), req.reason.as_deref())?;
    Ok(Json(trip))
}

async fn complete(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.coordinator.complete(TripId(id))?))
}

/// Administrative status override along a permitted edge.
async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(state.coordinator.update_status(TripId(id), req.status)?))
}

async fn link_loadsheet(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<LinkLoadsheetRequest>,
) -> Result<Json<Loadsheet>, AppError> {
    let sheet = state.coordinator.link_loadsheet(TripId(id), req.loadsheet)?;
    Ok(Json(sheet))
}

fn terminal(field: &str, raw: &str) -> Result<TerminalCode, AppError> {
    TerminalCode::parse_normalized(raw).map_err(|e| AppError::BadRequest {
        message: format!("Invalid {field} terminal {raw:?}: {e}"),
    })
}

/// Distance between two terminals: templates, matrix, then GPS.
async fn mileage(
    State(state): State<AppState>,
    Query(q): Query<MileageQuery>,
) -> Result<Json<MileageResponse>, AppError> {
    let origin = terminal("origin", &q.origin)?;
    let destination = terminal("destination", &q.destination)?;
    let mileage = state.mileage.resolve(origin, destination).await?;
    Ok(Json(MileageResponse::new(origin, destination, mileage)))
}

/// Distance from the matrix, falling back to GPS.
async fn matrix_mileage(
    State(state): State<AppState>,
    Query(q): Query<MileageQuery>,
) -> Result<Json<MileageResponse>, AppError> {
    let origin = terminal("origin", &q.origin)?;
    let destination = terminal("destination", &q.destination)?;
    let mileage = state.mileage.resolve_matrix(origin, destination).await?;
    Ok(Json(MileageResponse::new(origin, destination, mileage)))
}

async fn reconstruct_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<RouteChain>>, AppError> {
    Ok(Json(state.chains.reconstruct_all()?))
}

async fn reconstruct_route(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RouteChain>, AppError> {
    Ok(Json(state.chains.reconstruct_route(&name)?))
}

/// Seed route templates from processed legacy legs.
async fn seed_templates(State(state): State<AppState>) -> Result<Json<SeedSummary>, AppError> {
    let summary = state.chains.seed_templates()?;
    if !summary.created.is_empty() {
        // New templates can answer lookups that previously fell through to GPS.
        state.mileage.invalidate_cache();
    }
    Ok(Json(summary))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Lifecycle(LifecycleError),
    Mileage(MileageError),
    Chain(ChainError),
}

impl From<LifecycleError> for AppError {
    fn from(e: LifecycleError) -> Self {
        AppError::Lifecycle(e)
    }
}

impl From<MileageError> for AppError {
    fn from(e: MileageError) -> Self {
        AppError::Mileage(e)
    }
}

impl From<ChainError> for AppError {
    fn from(e: ChainError) -> Self {
        AppError::Chain(e)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::BadRequest { .. } => None,
            AppError::Lifecycle(e) => Some(e.kind()),
            AppError::Mileage(MileageError::Storage(_)) | AppError::Chain(ChainError::Storage(_)) => {
                Some(ErrorKind::Storage)
            }
            AppError::Mileage(_) | AppError::Chain(_) => Some(ErrorKind::NotFound),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match self.kind() {
            Some(kind) => (status_for(kind), kind.to_string()),
            None => (StatusCode::BAD_REQUEST, "bad_request".to_string()),
        };
        let message = match &self {
            AppError::BadRequest { message } => message.clone(),
            AppError::Lifecycle(e) => e.to_string(),
            AppError::Mileage(e) => e.to_string(),
            AppError::Chain(e) => e.to_string(),
        };

        if status.is_server_error() {
            error!(%status, %kind, error = %message, "request failed");
        } else {
            debug!(%status, %kind, error = %message, "request rejected");
        }

        (status, Json(ErrorResponse { error: message, kind })).into_response()
    }
}
