//! CRUD operations for [`Session`] credentials.
//!
//! Sessions are issued by the surrounding platform; this module only gives
//! the authorizer something to look them up in, plus housekeeping.

use chrono::{DateTime, Duration, Utc};
use rusqlite::params;
use uuid::Uuid;

use postvak_shared::types::UserId;

use crate::database::Database;
use crate::error::Result;
use crate::models::Session;

impl Database {
    /// Issue a fresh session token for a user, valid for `ttl`.
    pub fn issue_session(&self, user_id: UserId, scope: &str, ttl: Duration) -> Result<Session> {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            scope: scope.to_string(),
            expires_at: Utc::now() + ttl,
        };

        self.conn().execute(
            "INSERT INTO sessions (token, user_id, scope, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token,
                session.user_id.0,
                session.scope,
                session.expires_at.to_rfc3339(),
            ],
        )?;

        Ok(session)
    }

    /// Look a session up by its token.  Expired sessions are still returned;
    /// expiry is the authorizer's call to make.
    pub fn find_session(&self, token: &str) -> Result<Option<Session>> {
        let found = self
            .conn()
            .query_row(
                "SELECT token, user_id, scope, expires_at
                 FROM sessions WHERE token = ?1",
                params![token],
                row_to_session,
            )
            .map(Some);

        match found {
            Ok(session) => Ok(session),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete all sessions that expired before `now`.  Returns how many were
    /// removed.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at < ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(affected)
    }
}

/// Map a `rusqlite::Row` to a [`Session`].
fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<Session> {
    let expires_str: String = row.get(3)?;
    let expires_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&expires_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Session {
        token: row.get(0)?,
        user_id: UserId(row.get(1)?),
        scope: row.get(2)?,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_db(dir: &tempfile::TempDir) -> Database {
        let path = dir.path().join("test.db");
        Database::open_at(&path, std::time::Duration::from_millis(100)).unwrap()
    }

    #[test]
    fn issue_and_find_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);

        let issued = db
            .issue_session(UserId(1), "/api", Duration::hours(1))
            .unwrap();
        let found = db.find_session(&issued.token).unwrap().unwrap();

        assert_eq!(found, issued);
        assert!(found.expires_at > Utc::now());
    }

    #[test]
    fn unknown_token_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);

        assert!(db.find_session("nope").unwrap().is_none());
    }

    #[test]
    fn purge_removes_only_expired_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_db(&dir);

        let expired = db
            .issue_session(UserId(1), "/api", Duration::hours(-1))
            .unwrap();
        let live = db
            .issue_session(UserId(2), "/api", Duration::hours(1))
            .unwrap();

        let removed = db.purge_expired_sessions(Utc::now()).unwrap();
        assert_eq!(removed, 1);
        assert!(db.find_session(&expired.token).unwrap().is_none());
        assert!(db.find_session(&live.token).unwrap().is_some());
    }
}
