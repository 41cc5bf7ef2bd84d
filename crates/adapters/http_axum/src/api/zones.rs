//! JSON REST handlers for zones.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use homepilot_app::ports::{
    DeviceRepository, HubClient, RoomRepository, RoutineRepository, ZoneRepository,
};
use homepilot_domain::id::ZoneId;
use homepilot_domain::zone::Zone;

use crate::api::rooms::{ToggleAllRequest, ToggleAllResponse};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateZoneRequest {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: i32,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Zone>),
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

/// `GET /api/zones`
pub async fn list<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
) -> Result<Json<Vec<Zone>>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let zones = state.rooms.list_zones().await?;
    Ok(Json(zones))
}

/// `GET /api/zones/{id}`
pub async fn get<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<ZoneId>,
) -> Result<Json<Zone>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let zone = state.rooms.get_zone(id).await?;
    Ok(Json(zone))
}

/// `POST /api/zones`
pub async fn create<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Json(req): Json<CreateZoneRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let mut zone = Zone::new(req.name)?;
    if let Some(icon) = req.icon {
        zone.icon = icon;
    }
    if let Some(color) = req.color {
        zone.color = color;
    }
    zone.order = req.order;

    let created = state.rooms.create_zone(zone).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `DELETE /api/zones/{id}`
///
/// Rooms of the zone are kept and detached.
pub async fn delete<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<ZoneId>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    state.rooms.delete_zone(id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/zones/{id}/toggle_all`
pub async fn toggle_all<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<ZoneId>,
    Json(req): Json<ToggleAllRequest>,
) -> Result<Json<ToggleAllResponse>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let toggle = state.rooms.toggle_zone(id, req.is_on).await?;
    Ok(Json(toggle.into()))
}
