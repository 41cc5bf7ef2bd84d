//! Shared application state for axum handlers.

use std::sync::Arc;

use homepilot_app::directive_router::DirectiveRouter;
use homepilot_app::outbound::OutboundDispatcher;
use homepilot_app::reconciliation::ReconciliationEngine;
use homepilot_app::services::device_service::DeviceService;
use homepilot_app::services::room_service::RoomService;
use homepilot_app::services::routine_service::RoutineService;

/// Observer wired into every device write served over HTTP: local changes
/// are pushed to the hub.
pub type Dispatcher<H> = OutboundDispatcher<H>;

/// Application state shared across all axum handlers.
///
/// Generic over the four registry repositories and the hub client to avoid
/// dynamic dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<DR, RR, ZR, RtR, H> {
    pub devices: Arc<DeviceService<DR, Dispatcher<H>>>,
    /// Pulls hub state into the registry before device listings.
    pub reconciliation: Arc<ReconciliationEngine<DR, Dispatcher<H>, H>>,
    pub rooms: Arc<RoomService<RR, ZR, DR, Dispatcher<H>, H>>,
    pub routines: Arc<RoutineService<RtR, H>>,
    /// Voice directive endpoint.
    pub directives: Arc<DirectiveRouter<DR, Dispatcher<H>, RR, RtR, H>>,
}

impl<DR, RR, ZR, RtR, H> Clone for AppState<DR, RR, ZR, RtR, H> {
    fn clone(&self) -> Self {
        Self {
            devices: Arc::clone(&self.devices),
            reconciliation: Arc::clone(&self.reconciliation),
            rooms: Arc::clone(&self.rooms),
            routines: Arc::clone(&self.routines),
            directives: Arc::clone(&self.directives),
        }
    }
}

impl<DR, RR, ZR, RtR, H> AppState<DR, RR, ZR, RtR, H> {
    /// Create a new application state from service instances.
    pub fn new(
        devices: DeviceService<DR, Dispatcher<H>>,
        reconciliation: ReconciliationEngine<DR, Dispatcher<H>, H>,
        rooms: RoomService<RR, ZR, DR, Dispatcher<H>, H>,
        routines: RoutineService<RtR, H>,
        directives: DirectiveRouter<DR, Dispatcher<H>, RR, RtR, H>,
    ) -> Self {
        Self {
            devices: Arc::new(devices),
            reconciliation: Arc::new(reconciliation),
            rooms: Arc::new(rooms),
            routines: Arc::new(routines),
            directives: Arc::new(directives),
        }
    }
}
