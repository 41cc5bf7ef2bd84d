//! Directive router: answers voice-assistant directives.
//!
//! Every inbound envelope produces a well-formed response envelope; failures
//! become `ErrorResponse` events, never Rust errors.

use homepilot_domain::directive::{
    Directive, DirectiveRequest, DiscoveryEndpoint, EndpointTarget, ErrorType, Header, PowerState,
    ResponseEnvelope,
};
use homepilot_domain::error::{HomePilotError, NotFoundError};
use homepilot_domain::id::{RoomId, RoutineId};
use homepilot_domain::room::Room;
use homepilot_domain::routine::Routine;
use homepilot_domain::time::now;
use serde_json::Value;

use crate::ports::{DeviceRepository, HubClient, MutationObserver, RoomRepository, RoutineRepository};
use crate::routine_executor::RoutineExecutor;
use crate::services::device_service::DeviceService;
use crate::services::room_group::RoomGroupResolver;

/// Routes parsed directives to devices, room groups and routines.
pub struct DirectiveRouter<DR, O, RR, RtR, H> {
    devices: DeviceService<DR, O>,
    groups: RoomGroupResolver<DR, O>,
    rooms: RR,
    routines: RtR,
    executor: RoutineExecutor<H>,
    manufacturer: String,
}

impl<DR, O, RR, RtR, H> DirectiveRouter<DR, O, RR, RtR, H>
where
    DR: DeviceRepository + Clone,
    O: MutationObserver + Clone,
    RR: RoomRepository,
    RtR: RoutineRepository,
    H: HubClient + Clone + 'static,
{
    pub fn new(
        devices: DeviceService<DR, O>,
        rooms: RR,
        routines: RtR,
        executor: RoutineExecutor<H>,
        manufacturer: impl Into<String>,
    ) -> Self {
        let groups = RoomGroupResolver::new(devices.clone());
        Self {
            devices,
            groups,
            rooms,
            routines,
            executor,
            manufacturer: manufacturer.into(),
        }
    }

    /// Handle one raw directive envelope.
    #[tracing::instrument(skip_all)]
    pub async fn route(&self, envelope: &Value) -> ResponseEnvelope {
        let directive = match Directive::parse(envelope) {
            Ok(directive) => directive,
            Err(err) => {
                tracing::warn!(error = %err, "malformed directive");
                return ResponseEnvelope::error(
                    &Header::default(),
                    ErrorType::InvalidDirective,
                    format!("Malformed directive: {err}"),
                );
            }
        };
        tracing::info!(
            namespace = %directive.header.namespace,
            name = %directive.header.name,
            endpoint_id = directive.endpoint.endpoint_id.as_deref().unwrap_or_default(),
            "directive received"
        );

        let result = match directive.request {
            DirectiveRequest::Discover => self.discover(&directive).await,
            DirectiveRequest::Power(state) => self.power(&directive, state).await,
            DirectiveRequest::ActivateScene => self.activate(&directive).await,
            DirectiveRequest::Unsupported { reason } => {
                return ResponseEnvelope::error(
                    &directive.header,
                    ErrorType::InvalidDirective,
                    reason,
                );
            }
        };
        result.unwrap_or_else(|err| {
            let error_type = match &err {
                HomePilotError::NotFound(_) => ErrorType::NoSuchEndpoint,
                _ => ErrorType::InternalError,
            };
            tracing::warn!(error = %err, ?error_type, "directive failed");
            ResponseEnvelope::error(&directive.header, error_type, err.to_string())
        })
    }

    async fn discover(&self, directive: &Directive) -> Result<ResponseEnvelope, HomePilotError> {
        let mut endpoints: Vec<DiscoveryEndpoint> = self
            .devices
            .list_devices()
            .await?
            .iter()
            .map(|device| DiscoveryEndpoint::for_device(device, &self.manufacturer))
            .collect();
        endpoints.extend(
            self.routines
                .get_all()
                .await?
                .iter()
                .map(|routine| DiscoveryEndpoint::for_routine(routine, &self.manufacturer)),
        );
        endpoints.extend(
            self.rooms
                .get_all()
                .await?
                .iter()
                .filter_map(|room| DiscoveryEndpoint::for_room(room, &self.manufacturer)),
        );
        tracing::info!(count = endpoints.len(), "discovery");
        Ok(ResponseEnvelope::discovery(&directive.header, endpoints))
    }

    async fn power(
        &self,
        directive: &Directive,
        state: PowerState,
    ) -> Result<ResponseEnvelope, HomePilotError> {
        let mut report_health = false;
        match directive.endpoint.power_target() {
            EndpointTarget::Room(id) => {
                let room = self.room(id).await?;
                self.groups.set_all(&room, state.is_on()).await?;
            }
            EndpointTarget::Routine(id) => {
                let routine = self.routine(id).await?;
                // Routines have no off state; TurnOff is acknowledged as is.
                if state.is_on() {
                    self.executor.run_detached(routine).await?;
                }
                report_health = true;
            }
            EndpointTarget::Device(id) => {
                self.devices.toggle(id, state.is_on()).await?;
            }
            EndpointTarget::Unknown(raw) => {
                return Err(NotFoundError {
                    entity: "Endpoint",
                    id: raw,
                }
                .into());
            }
        }
        Ok(ResponseEnvelope::power(
            &directive.header,
            &directive.endpoint,
            state,
            report_health,
            now(),
        ))
    }

    async fn activate(&self, directive: &Directive) -> Result<ResponseEnvelope, HomePilotError> {
        let EndpointTarget::Routine(id) = directive.endpoint.scene_target() else {
            return Err(NotFoundError {
                entity: "Routine",
                id: directive.endpoint.endpoint_id.clone().unwrap_or_default(),
            }
            .into());
        };
        let routine = self.routine(id).await?;
        self.executor.run_detached(routine).await?;
        Ok(ResponseEnvelope::activation_started(
            &directive.header,
            &directive.endpoint,
            now(),
        ))
    }

    async fn room(&self, id: RoomId) -> Result<Room, HomePilotError> {
        self.rooms.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Room",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn routine(&self, id: RoutineId) -> Result<Routine, HomePilotError> {
        self.routines.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Routine",
                id: id.to_string(),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use homepilot_domain::directive::Payload;
    use homepilot_domain::routine::RoutineAction;
    use serde_json::json;

    use crate::outbound::OutboundDispatcher;
    use crate::testing::{InMemoryRegistry, SpyHub, bound_device};

    type Router = DirectiveRouter<
        Arc<InMemoryRegistry>,
        OutboundDispatcher<Arc<SpyHub>>,
        Arc<InMemoryRegistry>,
        Arc<InMemoryRegistry>,
        Arc<SpyHub>,
    >;

    struct Fixture {
        router: Router,
        devices: DeviceService<Arc<InMemoryRegistry>, OutboundDispatcher<Arc<SpyHub>>>,
        registry: Arc<InMemoryRegistry>,
        hub: Arc<SpyHub>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(InMemoryRegistry::default());
        let hub = Arc::new(SpyHub::default());
        let devices = DeviceService::new(
            Arc::clone(&registry),
            OutboundDispatcher::new(Arc::clone(&hub)),
        );
        let router = DirectiveRouter::new(
            devices.clone(),
            Arc::clone(&registry),
            Arc::clone(&registry),
            RoutineExecutor::new(Arc::clone(&hub)),
            "HomePilot",
        );
        Fixture {
            router,
            devices,
            registry,
            hub,
        }
    }

    fn envelope(namespace: &str, name: &str, endpoint: Value) -> Value {
        json!({
            "directive": {
                "header": {
                    "namespace": namespace,
                    "name": name,
                    "messageId": "msg-1",
                    "correlationToken": "corr-1",
                    "payloadVersion": "3"
                },
                "endpoint": endpoint,
                "payload": {}
            }
        })
    }

    async fn room_with_devices(fx: &Fixture, name: &str, count: usize) -> Room {
        let room = RoomRepository::create(&*fx.registry, Room::builder().name(name).build().unwrap())
            .await
            .unwrap();
        for index in 0..count {
            let device = fx
                .devices
                .create_device(bound_device(&format!("Lamp {index}"), &format!("light.lamp_{index}")))
                .await
                .unwrap();
            fx.devices.assign_room(device.id, Some(&room)).await.unwrap();
        }
        room
    }

    async fn stored_routine(fx: &Fixture) -> Routine {
        RoutineRepository::create(
            &*fx.registry,
            Routine::new("Movie night")
                .with_actions(vec![RoutineAction::service(0, "light.tv_strip", "turn_on")]),
        )
        .await
        .unwrap()
    }

    fn power_state(response: &ResponseEnvelope) -> Option<&Value> {
        response
            .context
            .as_ref()?
            .properties
            .iter()
            .find(|p| p.name == "powerState")
            .map(|p| &p.value)
    }

    #[tokio::test]
    async fn should_turn_on_every_device_of_a_room_endpoint() {
        let fx = fixture();
        let room = room_with_devices(&fx, "Living Room", 3).await;
        let endpoint_id = format!("room_{}", room.id);

        let response = fx
            .router
            .route(&envelope(
                "Alexa.PowerController",
                "TurnOn",
                json!({"endpointId": endpoint_id, "cookie": {"room_id": room.id.to_string(), "type": "room"}}),
            ))
            .await;

        assert_eq!(response.error_type(), None);
        assert_eq!(power_state(&response), Some(&json!("ON")));
        assert_eq!(response.event.header.name, "Response");
        assert_eq!(response.event.header.correlation_token.as_deref(), Some("corr-1"));
        let devices = fx.devices.list_in_room(room.id).await.unwrap();
        assert_eq!(devices.len(), 3);
        assert!(devices.iter().all(|d| d.is_on));
        assert_eq!(fx.hub.invoked().len(), 3);
    }

    #[tokio::test]
    async fn should_resolve_room_from_prefix_without_cookie() {
        let fx = fixture();
        let room = room_with_devices(&fx, "Hall", 1).await;

        let response = fx
            .router
            .route(&envelope(
                "Alexa.PowerController",
                "TurnOn",
                json!({"endpointId": format!("room_{}", room.id)}),
            ))
            .await;

        assert_eq!(power_state(&response), Some(&json!("ON")));
    }

    #[tokio::test]
    async fn should_toggle_single_device_by_raw_id() {
        let fx = fixture();
        let device = fx
            .devices
            .create_device(bound_device("Desk", "switch.desk"))
            .await
            .unwrap();
        fx.devices.toggle(device.id, true).await.unwrap();

        let response = fx
            .router
            .route(&envelope(
                "Alexa.PowerController",
                "TurnOff",
                json!({"endpointId": device.id.get()}),
            ))
            .await;

        assert_eq!(power_state(&response), Some(&json!("OFF")));
        assert!(!fx.registry.device(device.id).unwrap().is_on);
        let context = response.context.unwrap();
        assert_eq!(context.properties.len(), 1);
    }

    #[tokio::test]
    async fn should_run_routine_and_report_health_on_turn_on() {
        let fx = fixture();
        let routine = stored_routine(&fx).await;

        let response = fx
            .router
            .route(&envelope(
                "Alexa.PowerController",
                "TurnOn",
                json!({"endpointId": format!("routine_{}", routine.id)}),
            ))
            .await;

        let context = response.context.unwrap();
        assert_eq!(context.properties.len(), 2);
        assert_eq!(context.properties[1].name, "connectivity");
        assert_eq!(fx.hub.invoked().len(), 1);
    }

    #[tokio::test]
    async fn should_acknowledge_turn_off_on_routine_without_running_it() {
        let fx = fixture();
        let routine = stored_routine(&fx).await;

        let response = fx
            .router
            .route(&envelope(
                "Alexa.PowerController",
                "TurnOff",
                json!({"endpointId": "anything", "cookie": {"routine_id": routine.id.get()}}),
            ))
            .await;

        assert_eq!(response.error_type(), None);
        assert_eq!(power_state(&response), Some(&json!("OFF")));
        assert!(fx.hub.invoked().is_empty());
    }

    #[tokio::test]
    async fn should_activate_routine_from_alias_endpoint() {
        let fx = fixture();
        let routine = stored_routine(&fx).await;
        let endpoint_id = format!("routine_{}_alias_2", routine.id);

        let response = fx
            .router
            .route(&envelope(
                "Alexa.SceneController",
                "Activate",
                json!({"endpointId": endpoint_id, "scope": {"type": "BearerToken", "token": "tkn"}}),
            ))
            .await;

        assert_eq!(response.event.header.name, "ActivationStarted");
        let endpoint = response.event.endpoint.unwrap();
        assert_eq!(endpoint.endpoint_id, endpoint_id);
        assert_eq!(endpoint.scope.token.as_deref(), Some("tkn"));
        assert!(matches!(response.event.payload, Payload::Activation { .. }));
        assert_eq!(fx.hub.invoked()[0].entity_id, "light.tv_strip");
    }

    #[tokio::test]
    async fn should_answer_no_such_endpoint_for_unknown_target() {
        let fx = fixture();

        let response = fx
            .router
            .route(&envelope(
                "Alexa.PowerController",
                "TurnOn",
                json!({"endpointId": "garage-door-42"}),
            ))
            .await;

        assert_eq!(response.error_type(), Some(ErrorType::NoSuchEndpoint));
        assert_eq!(response.event.header.name, "ErrorResponse");
    }

    #[tokio::test]
    async fn should_answer_no_such_endpoint_for_missing_device() {
        let fx = fixture();

        let response = fx
            .router
            .route(&envelope("Alexa.PowerController", "TurnOn", json!({"endpointId": "999"})))
            .await;

        assert_eq!(response.error_type(), Some(ErrorType::NoSuchEndpoint));
    }

    #[tokio::test]
    async fn should_answer_no_such_endpoint_when_scene_has_no_routine() {
        let fx = fixture();

        let response = fx
            .router
            .route(&envelope("Alexa.SceneController", "Activate", json!({"endpointId": "42"})))
            .await;

        assert_eq!(response.error_type(), Some(ErrorType::NoSuchEndpoint));
    }

    #[tokio::test]
    async fn should_reject_unsupported_directives() {
        let fx = fixture();

        let deactivate = fx
            .router
            .route(&envelope("Alexa.SceneController", "Deactivate", json!({"endpointId": "routine_1"})))
            .await;
        let brightness = fx
            .router
            .route(&envelope("Alexa.BrightnessController", "SetBrightness", json!({})))
            .await;

        assert_eq!(deactivate.error_type(), Some(ErrorType::InvalidDirective));
        assert_eq!(brightness.error_type(), Some(ErrorType::InvalidDirective));
    }

    #[tokio::test]
    async fn should_answer_invalid_directive_for_malformed_envelope() {
        let fx = fixture();

        let response = fx.router.route(&json!({"directive": {"header": 5}})).await;

        assert_eq!(response.error_type(), Some(ErrorType::InvalidDirective));
    }

    #[tokio::test]
    async fn should_report_internal_error_when_routine_step_fails() {
        let fx = fixture();
        let routine = stored_routine(&fx).await;
        fx.hub.fail_entity("light.tv_strip");

        let response = fx
            .router
            .route(&envelope(
                "Alexa.SceneController",
                "Activate",
                json!({"endpointId": format!("routine_{}", routine.id)}),
            ))
            .await;

        assert_eq!(response.error_type(), Some(ErrorType::InternalError));
    }

    #[tokio::test]
    async fn should_discover_devices_routines_and_non_empty_rooms() {
        let fx = fixture();
        room_with_devices(&fx, "Kitchen", 2).await;
        RoomRepository::create(&*fx.registry, Room::builder().name("Attic").build().unwrap())
            .await
            .unwrap();
        fx.devices
            .create_device(bound_device("Loose", "switch.loose"))
            .await
            .unwrap();
        stored_routine(&fx).await;

        let response = fx
            .router
            .route(&envelope("Alexa.Discovery", "Discover", json!({})))
            .await;

        let Payload::Discovery { endpoints } = &response.event.payload else {
            panic!("expected discovery payload");
        };
        // 3 devices + 1 routine + 1 non-empty room
        assert_eq!(endpoints.len(), 5);
        assert_eq!(response.event.header.name, "Discover.Response");
        assert_eq!(response.event.header.message_id, "msg-1");
        assert!(response.event.header.correlation_token.is_none());
        assert!(endpoints.iter().any(|e| e.endpoint_id.starts_with("room_")));
        assert!(endpoints.iter().any(|e| e.endpoint_id.starts_with("routine_")));
    }
}
