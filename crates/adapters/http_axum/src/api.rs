//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod alexa;
#[allow(clippy::missing_errors_doc)]
pub mod devices;
#[allow(clippy::missing_errors_doc)]
pub mod rooms;
#[allow(clippy::missing_errors_doc)]
pub mod routines;
#[allow(clippy::missing_errors_doc)]
pub mod zones;

use axum::Router;
use axum::routing::{get, post};
use serde::{Deserialize, Deserializer};

use homepilot_app::ports::{
    DeviceRepository, HubClient, RoomRepository, RoutineRepository, ZoneRepository,
};

use crate::state::AppState;

/// Distinguish an explicit `null` (`Some(None)`) from an absent field
/// (`None`, via `#[serde(default)]`).
pub(crate) fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Build the `/api` sub-router.
pub fn routes<DR, RR, ZR, RtR, H>() -> Router<AppState<DR, RR, ZR, RtR, H>>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    Router::new()
        // Voice directives
        .route(
            "/alexa/endpoint",
            post(alexa::endpoint::<DR, RR, ZR, RtR, H>),
        )
        // Devices
        .route(
            "/devices",
            get(devices::list::<DR, RR, ZR, RtR, H>).post(devices::create::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/devices/batch_toggle",
            post(devices::batch_toggle::<DR, RR, ZR, RtR, H>),
        )
        .route("/devices/sync", post(devices::sync::<DR, RR, ZR, RtR, H>))
        .route(
            "/devices/{id}",
            get(devices::get::<DR, RR, ZR, RtR, H>)
                .patch(devices::update::<DR, RR, ZR, RtR, H>)
                .delete(devices::delete::<DR, RR, ZR, RtR, H>),
        )
        // Rooms
        .route(
            "/rooms",
            get(rooms::list::<DR, RR, ZR, RtR, H>).post(rooms::create::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/rooms/sync_with_hub",
            post(rooms::sync_with_hub::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/rooms/{id}",
            get(rooms::get::<DR, RR, ZR, RtR, H>)
                .patch(rooms::update::<DR, RR, ZR, RtR, H>)
                .delete(rooms::delete::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/rooms/{id}/devices",
            get(rooms::devices::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/rooms/{id}/toggle_all",
            post(rooms::toggle_all::<DR, RR, ZR, RtR, H>),
        )
        // Zones
        .route(
            "/zones",
            get(zones::list::<DR, RR, ZR, RtR, H>).post(zones::create::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/zones/{id}",
            get(zones::get::<DR, RR, ZR, RtR, H>).delete(zones::delete::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/zones/{id}/toggle_all",
            post(zones::toggle_all::<DR, RR, ZR, RtR, H>),
        )
        // Routines
        .route(
            "/routines",
            get(routines::list::<DR, RR, ZR, RtR, H>).post(routines::create::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/routines/{id}",
            get(routines::get::<DR, RR, ZR, RtR, H>)
                .put(routines::update::<DR, RR, ZR, RtR, H>)
                .delete(routines::delete::<DR, RR, ZR, RtR, H>),
        )
        .route(
            "/routines/{id}/execute",
            post(routines::execute::<DR, RR, ZR, RtR, H>),
        )
}
