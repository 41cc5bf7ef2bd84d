//! `SQLite` implementation of [`ZoneRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homepilot_app::ports::ZoneRepository;
use homepilot_domain::error::HomePilotError;
use homepilot_domain::id::ZoneId;
use homepilot_domain::zone::Zone;

use crate::codec::{count_column, insert_id};
use crate::error::StorageError;

struct Wrapper(Zone);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Zone {
            id: ZoneId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            icon: row.try_get("icon")?,
            color: row.try_get("color")?,
            order: row.try_get("sort_order")?,
            room_count: count_column(row.try_get("room_count")?)?,
        }))
    }
}

const SELECT_ALL: &str = "SELECT z.*, (SELECT COUNT(*) FROM rooms r WHERE r.zone_id = z.id) AS room_count \
     FROM zones z ORDER BY z.sort_order, z.id";
const SELECT_BY_ID: &str = "SELECT z.*, (SELECT COUNT(*) FROM rooms r WHERE r.zone_id = z.id) AS room_count \
     FROM zones z WHERE z.id = ?";
const INSERT: &str =
    "INSERT INTO zones (id, name, icon, color, sort_order) VALUES (?, ?, ?, ?, ?) RETURNING id";
const UPDATE: &str = "UPDATE zones SET name = ?, icon = ?, color = ?, sort_order = ? WHERE id = ?";
const DETACH_ROOMS: &str = "UPDATE rooms SET zone_id = NULL WHERE zone_id = ?";
const DELETE_BY_ID: &str = "DELETE FROM zones WHERE id = ?";

/// `SQLite`-backed zone repository.
#[derive(Clone)]
pub struct SqliteZoneRepository {
    pool: SqlitePool,
}

impl SqliteZoneRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ZoneRepository for SqliteZoneRepository {
    fn create(&self, mut zone: Zone) -> impl Future<Output = Result<Zone, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let id: i64 = sqlx::query_scalar(INSERT)
                .bind(insert_id(zone.id.get()))
                .bind(&zone.name)
                .bind(&zone.icon)
                .bind(&zone.color)
                .bind(zone.order)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            zone.id = ZoneId::new(id);
            zone.room_count = 0;
            Ok(zone)
        }
    }

    fn get_by_id(
        &self,
        id: ZoneId,
    ) -> impl Future<Output = Result<Option<Zone>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
                .bind(id.get())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|w| w.0))
        }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Zone>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(&self, zone: Zone) -> impl Future<Output = Result<Zone, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(UPDATE)
                .bind(&zone.name)
                .bind(&zone.icon)
                .bind(&zone.color)
                .bind(zone.order)
                .bind(zone.id.get())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(zone)
        }
    }

    fn delete(&self, id: ZoneId) -> impl Future<Output = Result<(), HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            sqlx::query(DETACH_ROOMS)
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
    use crate::pool::Config;
    use crate::room_repo::SqliteRoomRepository;
    use homepilot_app::ports::RoomRepository;
    use homepilot_domain::room::Room;

    #[tokio::test]
    async fn should_count_rooms_and_detach_them_on_delete() {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        let zones = SqliteZoneRepository::new(db.pool().clone());
        let rooms = SqliteRoomRepository::new(db.pool().clone());
        let ground = zones.create(Zone::new("Ground floor").unwrap()).await.unwrap();
        let hall = rooms
            .create(
                Room::builder()
                    .name("Hall")
                    .zone_id(ground.id)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(zones.get_by_id(ground.id).await.unwrap().unwrap().room_count, 1);

        zones.delete(ground.id).await.unwrap();

        assert!(zones.get_all().await.unwrap().is_empty());
        let hall = rooms.get_by_id(hall.id).await.unwrap().unwrap();
        assert!(hall.zone_id.is_none());
    }
}
