//! # homepilot-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `homepilot-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//! - Unassign a deleted room's devices in the same transaction as the delete
//!
//! ## Dependency rule
//! Depends on `homepilot-app` (for port traits) and `homepilot-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;
pub mod device_repo;
pub mod error;
pub mod pool;
pub mod room_repo;
pub mod routine_repo;
pub mod zone_repo;

pub use device_repo::SqliteDeviceRepository;
pub use error::StorageError;
pub use pool::{Config, Database};
pub use room_repo::SqliteRoomRepository;
pub use routine_repo::SqliteRoutineRepository;
pub use zone_repo::SqliteZoneRepository;
