//! Voice directive endpoint.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::Value;

use homepilot_app::ports::{
    DeviceRepository, HubClient, RoomRepository, RoutineRepository, ZoneRepository,
};
use homepilot_domain::directive::{ErrorType, Header, ResponseEnvelope};

use crate::state::AppState;

/// `POST /api/alexa/endpoint`
///
/// Always answers `200`; failures are reported inside the envelope. The body
/// is read raw so malformed JSON becomes an `INVALID_DIRECTIVE` envelope
/// instead of an extractor rejection.
pub async fn endpoint<DR, RR, ZR, RtR, H>(
    State(state): State<AppState<DR, RR, ZR, RtR, H>>,
    body: Bytes,
) -> Json<ResponseEnvelope>
where
    DR: DeviceRepository + Clone + 'static,
    RR: RoomRepository + 'static,
    ZR: ZoneRepository + 'static,
    RtR: RoutineRepository + 'static,
    H: HubClient + Clone + 'static,
{
    let envelope = match serde_json::from_slice::<Value>(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            tracing::warn!(error = %err, "directive body is not JSON");
            return Json(ResponseEnvelope::error(
                &Header::default(),
                ErrorType::InvalidDirective,
                format!("Malformed directive: {err}"),
            ));
        }
    };
    Json(state.directives.route(&envelope).await)
}
