//! CRUD operations for [`User`] records.

use chrono::{DateTime, Utc};
use rusqlite::params;

use postvak_shared::types::UserId;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::User;

impl Database {
    /// Insert a new user and return it with its assigned id.
    pub fn create_user(
        &self,
        username: &str,
        full_name: &str,
        company_name: Option<&str>,
    ) -> Result<User> {
        let created_at = Utc::now();
        self.conn().execute(
            "INSERT INTO users (username, full_name, company_name, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![username, full_name, company_name, created_at.to_rfc3339()],
        )?;

        Ok(User {
            id: UserId(self.conn().last_insert_rowid()),
            username: username.to_string(),
            full_name: full_name.to_string(),
            company_name: company_name.map(str::to_string),
            created_at,
        })
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: UserId) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, username, full_name, company_name, created_at
                 FROM users WHERE id = ?1",
                params![id.0],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Look a user up by username.  Returns `Ok(None)` when nobody has it.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let found = self
            .conn()
            .query_row(
                "SELECT id, username, full_name, company_name, created_at
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .map(Some);

        match found {
            Ok(user) => Ok(user),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_str: String = row.get(4)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        full_name: row.get(2)?,
        company_name: row.get(3)?,
        created_at,
    })
}
