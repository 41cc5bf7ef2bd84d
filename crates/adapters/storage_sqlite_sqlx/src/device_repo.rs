//! `SQLite` implementation of [`DeviceRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homepilot_app::ports::DeviceRepository;
use homepilot_domain::device::{Device, DeviceType};
use homepilot_domain::error::HomePilotError;
use homepilot_domain::id::{DeviceId, RoomId};

use crate::codec::{decode_error, decode_timestamp, encode_timestamp, insert_id, json_column};
use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`Device`].
struct Wrapper(Device);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Device> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device_type: String = row.try_get("device_type")?;
        let attributes: String = row.try_get("attributes")?;
        let last_user_command: Option<String> = row.try_get("last_user_command")?;

        Ok(Self(Device {
            id: DeviceId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            device_type: device_type.parse::<DeviceType>().map_err(decode_error)?,
            room: row.try_get("room")?,
            room_id: row.try_get::<Option<i64>, _>("room_id")?.map(RoomId::new),
            is_on: row.try_get("is_on")?,
            value: row.try_get("value")?,
            unit: row.try_get("unit")?,
            is_online: row.try_get("is_online")?,
            entity_id: row.try_get("entity_id")?,
            ha_domain: row.try_get("ha_domain")?,
            attributes: json_column(&attributes)?,
            last_user_command: last_user_command
                .as_deref()
                .map(decode_timestamp)
                .transpose()?,
        }))
    }
}

const INSERT: &str = "INSERT INTO devices (id, name, device_type, room, room_id, is_on, value, unit, is_online, entity_id, ha_domain, attributes, last_user_command) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id";
const SELECT_BY_ID: &str = "SELECT * FROM devices WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM devices ORDER BY id";
const SELECT_BY_ENTITY_ID: &str = "SELECT * FROM devices WHERE entity_id = ?";
const SELECT_BY_ROOM: &str = "SELECT * FROM devices WHERE room_id = ? ORDER BY id";
const UPDATE: &str = "UPDATE devices SET name = ?, device_type = ?, room = ?, room_id = ?, is_on = ?, value = ?, unit = ?, \
     is_online = ?, entity_id = ?, ha_domain = ?, attributes = ?, last_user_command = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM devices WHERE id = ?";

/// `SQLite`-backed device repository.
#[derive(Clone)]
pub struct SqliteDeviceRepository {
    pool: SqlitePool,
}

impl SqliteDeviceRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl DeviceRepository for SqliteDeviceRepository {
    fn create(
        &self,
        mut device: Device,
    ) -> impl Future<Output = Result<Device, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let attributes =
                serde_json::to_string(&device.attributes).map_err(StorageError::from)?;
            let id: i64 = sqlx::query_scalar(INSERT)
                .bind(insert_id(device.id.get()))
                .bind(&device.name)
                .bind(device.device_type.as_str())
                .bind(&device.room)
                .bind(device.room_id.map(RoomId::get))
                .bind(device.is_on)
                .bind(&device.value)
                .bind(&device.unit)
                .bind(device.is_online)
                .bind(&device.entity_id)
                .bind(&device.ha_domain)
                .bind(attributes)
                .bind(device.last_user_command.map(encode_timestamp))
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            device.id = DeviceId::new(id);
            Ok(device)
        }
    }

    fn get_by_id(
        &self,
        id: DeviceId,
    ) -> impl Future<Output = Result<Option<Device>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.get())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Device>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Device>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        let entity_id = entity_id.to_string();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ENTITY_ID)
                .bind(entity_id)
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn find_by_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Device>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_ROOM)
                .bind(room_id.get())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, device: Device) -> impl Future<Output = Result<Device, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let attributes =
                serde_json::to_string(&device.attributes).map_err(StorageError::from)?;
            sqlx::query(UPDATE)
                .bind(&device.name)
                .bind(device.device_type.as_str())
                .bind(&device.room)
                .bind(device.room_id.map(RoomId::get))
                .bind(device.is_on)
                .bind(&device.value)
                .bind(&device.unit)
                .bind(device.is_online)
                .bind(&device.entity_id)
                .bind(&device.ha_domain)
                .bind(attributes)
                .bind(device.last_user_command.map(encode_timestamp))
                .bind(device.id.get())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(device)
        }
    }

    fn delete(&self, id: DeviceId) -> impl Future<Output = Result<(), HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(DELETE_BY_ID)
                .bind(id.get())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
