//! # homepilot-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceRepository`, `RoomRepository`, `ZoneRepository`,
//!     `RoutineRepository`: the durable registry
//!   - `HubClient`: the external smart-home hub
//!   - `MutationObserver`: receives every committed device write
//! - Define **driving/inbound** use-cases:
//!   - `DeviceService`: per-device locked read-modify-write
//!   - `ReconciliationEngine`: merge hub state into the registry
//!   - `OutboundDispatcher`: push local intent to the hub
//!   - `RoomGroupResolver`, `RoomService`, `RoutineService`, `RoutineExecutor`
//!   - `DirectiveRouter`: the voice-assistant directive endpoint
//!
//! ## Dependency rule
//! Depends on `homepilot-domain` only (plus `tokio` for locks, timers and
//! detached routine runs). Never imports adapter crates.

pub mod directive_router;
pub mod outbound;
pub mod ports;
pub mod reconciliation;
pub mod routine_executor;
pub mod services;

#[cfg(test)]
pub(crate) mod testing;
