//! JSON REST handlers for rooms.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use homepilot_app::ports::{
    DeviceRepository, HubClient, RoomRepository, RoutineRepository, ZoneRepository,
};
use homepilot_app::services::room_group::GroupToggle;
use homepilot_app::services::room_service::RoomPatch;
use homepilot_domain::device::Device;
use homepilot_domain::id::{RoomId, ZoneId};
use homepilot_domain::room::Room;
use homepilot_domain::sync::AreaSyncReport;

use crate::api::explicit_null;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub zone: Option<ZoneId>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: i32,
}

/// Request body for `PATCH /api/rooms/{id}`. `"zone": null` detaches the
/// room from its zone.
#[derive(Deserialize)]
pub struct UpdateRoomRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub zone: Option<Option<ZoneId>>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl From<UpdateRoomRequest> for RoomPatch {
    fn from(req: UpdateRoomRequest) -> Self {
        Self {
            name: req.name,
            zone_id: req.zone,
            icon: req.icon,
            color: req.color,
            order: req.order,
        }
    }
}

#[derive(Deserialize)]
pub struct ToggleAllRequest {
    #[serde(rename = "isOn")]
    pub is_on: bool,
}

/// Body returned by the group toggle endpoints.
#[derive(Serialize)]
pub struct ToggleAllResponse {
    pub status: &'static str,
    pub updated: usize,
    #[serde(rename = "isOn")]
    pub is_on: bool,
}

impl From<GroupToggle> for ToggleAllResponse {
    fn from(toggle: GroupToggle) -> Self {
        Self {
            status: "success",
            updated: toggle.updated,
            is_on: toggle.is_on,
        }
    }
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: AreaSyncReport,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Room>),
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

/// `GET /api/rooms`
pub async fn list<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
) -> Result<Json<Vec<Room>>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let rooms = state.rooms.list_rooms().await?;
    Ok(Json(rooms))
}

/// `GET /api/rooms/{id}`
pub async fn get<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoomId>,
) -> Result<Json<Room>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let room = state.rooms.get_room(id).await?;
    Ok(Json(room))
}

/// `POST /api/rooms`
pub async fn create<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let mut builder = Room::builder().name(req.name).order(req.order);
    if let Some(zone_id) = req.zone {
        builder = builder.zone_id(zone_id);
    }
    if let Some(icon) = req.icon {
        builder = builder.icon(icon);
    }
    if let Some(color) = req.color {
        builder = builder.color(color);
    }

    let created = state.rooms.create_room(builder.build()?).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/rooms/{id}`
pub async fn update<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoomId>,
    Json(req): Json<UpdateRoomRequest>,
) -> Result<Json<Room>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let room = state.rooms.update_room(id, req.into()).await?;
    Ok(Json(room))
}

/// `DELETE /api/rooms/{id}`
///
/// Devices in the room are kept and become unassigned.
pub async fn delete<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoomId>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    state.rooms.delete_room(id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `GET /api/rooms/{id}/devices`
pub async fn devices<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoomId>,
) -> Result<Json<Vec<Device>>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let devices = state.rooms.devices_in_room(id).await?;
    Ok(Json(devices))
}

/// `POST /api/rooms/{id}/toggle_all`
pub async fn toggle_all<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<RoomId>,
    Json(req): Json<ToggleAllRequest>,
) -> Result<Json<ToggleAllResponse>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let toggle = state.rooms.toggle_room(id, req.is_on).await?;
    Ok(Json(toggle.into()))
}

/// `POST /api/rooms/sync_with_hub`
pub async fn sync_with_hub<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
) -> Result<Json<SyncResponse>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let report = state.rooms.sync_with_hub().await?;
    Ok(Json(SyncResponse {
        status: "success",
        report,
    }))
}
