//! JSON REST handlers for devices.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use homepilot_app::ports::{
    DeviceRepository, HubClient, RoomRepository, RoutineRepository, ZoneRepository,
};
use homepilot_app::services::device_service::DevicePatch;
use homepilot_domain::device::{Device, DeviceType};
use homepilot_domain::id::{DeviceId, RoomId};
use homepilot_domain::time::now;

use crate::api::explicit_null;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for creating a device.
#[derive(Deserialize)]
pub struct CreateDeviceRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub device_type: Option<DeviceType>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
}

/// Request body for `PATCH /api/devices/{id}`; absent fields are left alone.
#[derive(Deserialize)]
pub struct UpdateDeviceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "isOn", default)]
    pub is_on: Option<bool>,
    /// `null` unassigns the device.
    #[serde(default, deserialize_with = "explicit_null")]
    pub room_id: Option<Option<RoomId>>,
}

#[derive(Deserialize)]
pub struct BatchToggleRequest {
    pub ids: Vec<DeviceId>,
    #[serde(rename = "isOn")]
    pub is_on: bool,
}

#[derive(Serialize)]
pub struct SyncSummary {
    pub total: usize,
    pub new: usize,
    pub updated: usize,
    pub removed: usize,
}

#[derive(Serialize)]
pub struct SyncResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub summary: SyncSummary,
    pub devices: Vec<Device>,
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Device>),
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

/// `GET /api/devices`
///
/// Reconciles with the hub first; when the hub is unreachable the cached
/// registry is served.
pub async fn list<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
) -> Result<Json<Vec<Device>>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    if let Err(err) = state.reconciliation.refresh().await {
        tracing::warn!(error = %err, "serving cached devices, hub refresh failed");
    }
    let devices = state.devices.list_devices().await?;
    Ok(Json(devices))
}

/// `GET /api/devices/{id}`
pub async fn get<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<DeviceId>,
) -> Result<Json<Device>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let device = state.devices.get_device(id).await?;
    Ok(Json(device))
}

/// `POST /api/devices`
pub async fn create<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Json(req): Json<CreateDeviceRequest>,
) -> Result<CreateResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let mut builder = Device::builder().name(req.name);
    if let Some(device_type) = req.device_type {
        builder = builder.device_type(device_type);
    }
    if let Some(entity_id) = req.entity_id {
        builder = builder.entity_id(entity_id);
    }
    if let Some(room_id) = req.room_id {
        let room = state.rooms.get_room(room_id).await?;
        builder = builder.room_id(room.id).room(room.name);
    }

    let created = state.devices.create_device(builder.build()?).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/devices/{id}`
pub async fn update<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<DeviceId>,
    Json(req): Json<UpdateDeviceRequest>,
) -> Result<Json<Device>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let room = match req.room_id {
        None => None,
        Some(None) => Some(None),
        Some(Some(room_id)) => Some(Some(state.rooms.get_room(room_id).await?)),
    };
    let patch = DevicePatch {
        name: req.name,
        is_on: req.is_on,
        room,
    };
    let change = state.devices.update_device(id, patch).await?;
    Ok(Json(change.device))
}

/// `DELETE /api/devices/{id}`
pub async fn delete<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Path(id): Path<DeviceId>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    state.devices.delete_device(id).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/devices/batch_toggle`
pub async fn batch_toggle<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    Json(req): Json<BatchToggleRequest>,
) -> Json<Vec<Device>>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    Json(state.devices.batch_toggle(&req.ids, req.is_on).await)
}

/// `POST /api/devices/sync`
pub async fn sync<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
) -> Result<Json<SyncResponse>, ApiError>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let report = state.reconciliation.full_sync().await?;
    let devices = state.devices.list_devices().await?;
    Ok(Json(SyncResponse {
        status: "success",
        timestamp: now().to_rfc3339_opts(SecondsFormat::Secs, true),
        summary: SyncSummary {
            total: devices.len(),
            new: report.created,
            updated: report.updated,
            removed: report.removed,
        },
        devices,
    }))
}
