//! # homepilot-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **voice directive endpoint** (`POST /api/alexa/endpoint`),
//!   which always answers `200` with a response or error envelope
//! - Serve a **REST-ish JSON API** over the registry
//!   (`/api/devices`, `/api/rooms`, `/api/zones`, `/api/routines`)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `homepilot-app` (for port traits and services) and
//! `homepilot-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
