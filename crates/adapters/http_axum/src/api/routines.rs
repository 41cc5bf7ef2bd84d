//! JSON REST handlers for routines.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use homepilot_app::ports::{
    DeviceRepository, HubClient, RoomRepository, RoutineRepository, ZoneRepository,
};
use homepilot_domain::id::RoutineId;
use homepilot_domain::routine::{ActionOutcome, Routine, RoutineAction, RoutineTrigger};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /api/routines` and `PUT /api/routines/{id}`.
#[derive(Deserialize)]
pub struct RoutineRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub actions: Vec<RoutineAction>,
    #[serde(default)]
    pub triggers: Vec<RoutineTrigger>,
}

impl From<RoutineRequest> for Routine {
    fn from(req: RoutineRequest) -> Self {
        let mut routine = Routine::new(req.name)
            .with_actions(req.actions)
            .with_triggers(req.triggers);
        routine.description = req.description;
        routine.aliases = req.aliases;
        if let Some(icon) = req.icon {
            routine.icon = icon;
        }
        if let Some(color) = req.color {
            routine.color = color;
        }
        if let Some(is_active) = req.is_active {
            routine.is_active = is_active;
        }
        routine
    }
}

#[derive(Serialize)]
pub struct ExecuteResponse {
    pub status: &'static str,
    pub results: Vec<ActionOutcome>,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Routine>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/routines`
pub async fn list<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
) -> Result<Json<Vec<Routine>>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let routines = state.routines.list_routines().await?;
    Ok(Json(routines))
}

/// `GET /api/routines/{id}`
pub async fn get<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoutineId>,
) -> Result<Json<Routine>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let routine = state.routines.get_routine(id).await?;
    Ok(Json(routine))
}

/// `POST /api/routines`
pub async fn create<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Json(req): Json<RoutineRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let created = state.routines.create_routine(req.into()).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PUT /api/routines/{id}`
pub async fn update<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoutineId>,
    Json(req): Json<RoutineRequest>,
) -> Result<Json<Routine>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let routine = state.routines.update_routine(id, req.into()).await?;
    Ok(Json(routine))
}

/// `DELETE /api/routines/{id}`
pub async fn delete<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoutineId>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    state.routines.delete_routine(id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/routines/{id}/execute`
///
/// Runs every action in order; the first failing action aborts the run and
/// is reported as an error.
pub async fn execute<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoutineId>,
) -> Result<Json<ExecuteResponse>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let results = state.routines.execute(id).await?;
    Ok(Json(ExecuteResponse {
        status: "executed",
        results,
    }))
}
