//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod device_service;
pub mod room_group;
pub mod room_service;
pub mod routine_service;
