//! `SQLite` implementation of [`RoutineRepository`].
//!
//! Actions, triggers and aliases are stored as JSON documents on the row.

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use homepilot_app::ports::RoutineRepository;
use homepilot_domain::error::HomePilotError;
use homepilot_domain::id::RoutineId;
use homepilot_domain::routine::Routine;

use crate::codec::{insert_id, json_column};
use crate::error::StorageError;

struct Wrapper(Routine);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let aliases: String = row.try_get("aliases")?;
        let actions: String = row.try_get("actions")?;
        let triggers: String = row.try_get("triggers")?;

        Ok(Self(Routine {
            id: RoutineId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            aliases: json_column(&aliases)?,
            icon: row.try_get("icon")?,
            color: row.try_get("color")?,
            is_active: row.try_get("is_active")?,
            actions: json_column(&actions)?,
            triggers: json_column(&triggers)?,
        }))
    }
}

/// JSON columns of a routine, encoded once per write.
struct Documents {
    aliases: String,
    actions: String,
    triggers: String,
}

impl Documents {
    fn encode(routine: &Routine) -> Result<Self, StorageError> {
        Ok(Self {
            aliases: serde_json::to_string(&routine.aliases)?,
            actions: serde_json::to_string(&routine.actions)?,
            triggers: serde_json::to_string(&routine.triggers)?,
        })
    }
}

const INSERT: &str = "INSERT INTO routines (id, name, description, aliases, icon, color, is_active, actions, triggers) \
     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id";
const SELECT_BY_ID: &str = "SELECT * FROM routines WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM routines ORDER BY id";
const UPDATE: &str = "UPDATE routines SET name = ?, description = ?, aliases = ?, icon = ?, color = ?, is_active = ?, \
     actions = ?, triggers = ? WHERE id = ?";
const DELETE_BY_ID: &str = "DELETE FROM routines WHERE id = ?";

/// `SQLite`-backed routine repository.
#[derive(Clone)]
pub struct SqliteRoutineRepository {
    pool: SqlitePool,
}

impl SqliteRoutineRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RoutineRepository for SqliteRoutineRepository {
    fn create(
        &self,
        mut routine: Routine,
    ) -> impl Future<Output = Result<Routine, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let docs = Documents::encode(&routine)?;
            let id: i64 = sqlx::query_scalar(INSERT)
                .bind(insert_id(routine.id.get()))
                .bind(&routine.name)
                .bind(&routine.description)
                .bind(docs.aliases)
                .bind(&routine.icon)
                .bind(&routine.color)
                .bind(routine.is_active)
                .bind(docs.actions)
                .bind(docs.triggers)
                .fetch_one(&pool)
                .await
                .map_err(StorageError::from)?;

            routine.id = RoutineId::new(id);
            Ok(routine)
        }
    }

    fn get_by_id(
        &self,
        id: RoutineId,
    ) -> impl Future<Output = Result<Option<Routine>, HomePilotError>> + Send {
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

    fn get_all(&self) -> impl Future<Output = Result<Vec<Routine>, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|w| w.0).collect())
        }
    }

    fn update(
        &self,
        routine: Routine,
    ) -> impl Future<Output = Result<Routine, HomePilotError>> + Send {
        let pool = self.pool.clone();
        async move {
            let docs = Documents::encode(&routine)?;
            sqlx::query(UPDATE)
                .bind(&routine.name)
                .bind(&routine.description)
                .bind(docs.aliases)
                .bind(&routine.icon)
                .bind(&routine.color)
                .bind(routine.is_active)
                .bind(docs.actions)
                .bind(docs.triggers)
                .bind(routine.id.get())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(routine)
        }
    }

    fn delete(&self, id: RoutineId) -> impl Future<Output = Result<(), HomePilotError>> + Send {
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
