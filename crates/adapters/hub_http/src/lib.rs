//! # homepilot-adapter-hub-http
//!
//! Hub adapter over the hub's REST API.
//!
//! ## Responsibilities
//! - Implement the `HubClient` port defined in `homepilot-app::ports::hub`
//! - Authenticate every request with a long-lived bearer token
//! - Bound every call with the configured timeout
//! - Map transport failures, non-success statuses and undecodable bodies
//!   onto `HubError`
//!
//! ## Dependency rule
//! Depends on `homepilot-app` (for the port trait) and `homepilot-domain`.

pub mod client;
pub mod config;
pub mod error;

pub use client::ReqwestHubClient;
pub use config::HubConfig;
pub use error::HubSetupError;
