//! `SQLite` implementation of [`RoomRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homepilot_app::ports::RoomRepository;
use homepilot_domain::error::HomePilotError;
use homepilot_domain::id::{RoomId, ZoneId};
use homepilot_domain::room::Room;

use crate::codec::{count_column, insert_id};
use crate::error::StorageError;

struct Wrapper(Room);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Room> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Room {
            id: RoomId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            zone_id: row.try_get::<Option<i64>, _>("zone_id")?.map(ZoneId::new),
            icon: row.try_get("icon")?,
            color: row.try_get("color")?,
            order: row.try_get("sort_order")?,
            ha_area_id: row.try_get("ha_area_id")?,
            device_count: count_column(row.try_get("device_count")?)?,
        }))
    }
}

const SELECT: &str = "SELECT r.*, (SELECT COUNT(*) FROM devices d WHERE d.room_id = r.id) AS device_count FROM rooms r";
const INSERT: &str = "INSERT INTO rooms (id, name, zone_id, icon, color, sort_order, ha_area_id) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id";
const UPDATE: &str = "UPDATE rooms SET name = ?, zone_id = ?, icon = ?, color = ?, sort_order = ?, ha_area_id = ? WHERE id = ?";
const UNASSIGN_DEVICES: &str = "UPDATE devices SET room_id = NULL, room = '' WHERE room_id = ?";
const DELETE_BY_ID: &str = "DELETE FROM rooms WHERE id = ?";

fn select_where(clause: &str) -> String {
    format!("{SELECT} WHERE {clause} ORDER BY r.sort_order, r.id")
}

/// `SQLite`-backed room repository.
#[derive(Clone)]
pub struct SqliteRoomRepository {
    pool: SqlitePool,
}

impl SqliteRoomRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch_one(&self, clause: &str, value: String) -> Result<Option<Room>, HomePilotError> {
        let row: Option<Wrapper> = sqlx::query_as(&select_where(clause))
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }
}

impl RoomRepository for SqliteRoomRepository {
    fn create(&self, mut room: Room) -> impl Future<Output = Result<Room, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let id: i64 = sqlx::query_scalar(INSERT)
                .bind(insert_id(room.id.get()))
                .bind(&room.name)
                .bind(room.zone_id.map(ZoneId::get))
                .bind(&room.icon)
                .bind(&room.color)
                .bind(room.order)
                .bind(&room.ha_area_id)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            room.id = RoomId::new(id);
            room.device_count = 0;
            Ok(room)
        }
    }

    fn get_by_id(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<Option<Room>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(&select_where("r.id = ?"))
                .bind(id.get())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(Wrapper::maybe(row))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Room>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(&select_where("1 = 1"))
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn find_by_area_id(
        &self,
        area_id: &str,
    ) -> impl Future<Output = Result<Option<Room>, HomePilotError>> + Send {
        let area_id = area_id.to_string();
        async move { self.fetch_one("r.ha_area_id = ?", area_id).await }
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Room>, HomePilotError>> + Send {
        let name = name.to_string();
        async move { self.fetch_one("r.name = ?", name).await }
    }

    fn find_by_zone(
        &self,
        zone_id: ZoneId,
    ) -> impl Future<Output = Result<Vec<Room>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(&select_where("r.zone_id = ?"))
                .bind(zone_id.get())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    /// Writes the room row only. Device labels are rewritten by the caller
    /// through locked device writes.
    fn update(&self, room: Room) -> impl Future<Output = Result<Room, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&room.name)
                .bind(room.zone_id.map(ZoneId::get))
                .bind(&room.icon)
                .bind(&room.color)
                .bind(room.order)
                .bind(&room.ha_area_id)
                .bind(room.id.get())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;
            tracing::debug!(room_id = %room.id, "room updated");

            let row: Option<Wrapper> = sqlx::query_as(&select_where("r.id = ?"))
                .bind(room.id.get())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;
            Ok(Wrapper::maybe(row).unwrap_or(room))
        }
    }

    fn delete(&self, id: RoomId) -> impl Future<Output = Result<(), HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            sqlx::query(UNASSIGN_DEVICES)
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            sqlx::query(DELETE_BY_ID)
                .bind(id.get())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            tx.commit().await.map_err(StorageError::from)?;

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_repo::SqliteDeviceRepository;
    use crate::pool::Config;
    use homepilot_app::ports::DeviceRepository;
    use homepilot_domain::device::Device;

    async fn setup() -> (SqliteRoomRepository, SqliteDeviceRepository) {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        (
            SqliteRoomRepository::new(db.pool().clone()),
            SqliteDeviceRepository::new(db.pool().clone()),
        )
    }

    async fn device_in(devices: &SqliteDeviceRepository, room: &Room, entity_id: &str) -> Device {
        let mut device = Device::builder()
            .name(entity_id)
            .entity_id(entity_id)
            .build()
            .unwrap();
        device.assign_room(Some(room));
        devices.create(device).await.unwrap()
    }

    #[tokio::test]
    async fn should_count_devices_when_reading_rooms() {
        let (rooms, devices) = setup().await;
        let kitchen = rooms
            .create(Room::builder().name("Kitchen").build().unwrap())
            .await
            .unwrap();
        rooms
            .create(Room::builder().name("Attic").build().unwrap())
            .await
            .unwrap();
        device_in(&devices, &kitchen, "light.a").await;
        device_in(&devices, &kitchen, "light.b").await;

        let all = rooms.get_all().await.unwrap();

        let counts: Vec<(&str, u32)> = all
            .iter()
            .map(|r| (r.name.as_str(), r.device_count))
            .collect();
        assert_eq!(counts, vec![("Kitchen", 2), ("Attic", 0)]);
    }

    #[tokio::test]
    async fn should_update_room_row_without_touching_device_labels() {
        let (rooms, devices) = setup().await;
        let mut kitchen = rooms
            .create(Room::builder().name("Kitchen").build().unwrap())
            .await
            .unwrap();
        let device = device_in(&devices, &kitchen, "light.a").await;

        kitchen.name = "Cuisine".into();
        let updated = rooms.update(kitchen).await.unwrap();

        assert_eq!(updated.name, "Cuisine");
        assert_eq!(updated.device_count, 1);
        let device = devices.get_by_id(device.id).await.unwrap().unwrap();
        assert_eq!(device.room, "Kitchen");
    }

    #[tokio::test]
    async fn should_unassign_devices_when_room_deleted() {
        let (rooms, devices) = setup().await;
        let kitchen = rooms
            .create(Room::builder().name("Kitchen").build().unwrap())
            .await
            .unwrap();
        let device = device_in(&devices, &kitchen, "light.a").await;

        rooms.delete(kitchen.id).await.unwrap();

        assert!(rooms.get_by_id(kitchen.id).await.unwrap().is_none());
        let device = devices.get_by_id(device.id).await.unwrap().unwrap();
        assert!(device.room_id.is_none());
        assert_eq!(device.room, "");
    }

    #[tokio::test]
    async fn should_find_room_by_area_id_and_name() {
        let (rooms, _) = setup().await;
        let office = rooms
            .create(
                Room::builder()
                    .name("Office")
                    .ha_area_id("office")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let by_area = rooms.find_by_area_id("office").await.unwrap();
        let by_name = rooms.find_by_name("Office").await.unwrap();
        let missing = rooms.find_by_area_id("garage").await.unwrap();

        assert_eq!(by_area.map(|r| r.id), Some(office.id));
        assert_eq!(by_name.map(|r| r.id), Some(office.id));
        assert!(missing.is_none());
    }
}
