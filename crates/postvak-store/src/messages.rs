//! CRUD operations for [`MessageRecord`] rows.

use chrono::{DateTime, Utc};
use rusqlite::params;

use postvak_shared::types::{MessageId, ThreadId, UserId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::MessageRecord;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new message, assigning its id on success.
    ///
    /// Returns `Ok(true)` when the row was stored and `record.id` was
    /// populated.  Returns `Ok(false)` when the schema's length constraints
    /// rejected the subject or content; nothing is stored and the id stays
    /// unset.  Any other database failure is an error.
    pub fn insert_message(&self, record: &mut MessageRecord) -> Result<bool> {
        let outcome = self.conn().execute(
            "INSERT INTO messages (sender_id, receiver_id, timestamp, subject, content,
                                   thread_id, is_read, archived_by_sender, archived_by_receiver)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.sender.0,
                record.receiver.0,
                record.timestamp.to_rfc3339(),
                record.subject,
                record.content,
                record.thread_id.0,
                record.is_read,
                record.archived_by_sender,
                record.archived_by_receiver,
            ],
        );

        match outcome {
            Ok(_) => {
                record.id = Some(MessageId(self.conn().last_insert_rowid()));
                Ok(true)
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_CHECK =>
            {
                tracing::debug!(
                    subject_len = record.subject.len(),
                    content_len = record.content.len(),
                    "message rejected by length constraints"
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single message by id.
    pub fn get_message(&self, id: MessageId) -> Result<MessageRecord> {
        self.conn()
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id.0],
                row_to_message,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// All messages of one conversation, oldest first.  Ties on the timestamp
    /// are broken by id so the order is total.
    pub fn thread_messages(&self, thread_id: ThreadId) -> Result<Vec<MessageRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE thread_id = ?1
             ORDER BY timestamp ASC, id ASC"
        ))?;

        let rows = stmt.query_map(params![thread_id.0], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    /// Messages received by `user`, newest first, excluding the ones the
    /// receiver archived.
    pub fn inbox_for(&self, user: UserId) -> Result<Vec<MessageRecord>> {
        self.mailbox(
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE receiver_id = ?1 AND archived_by_receiver = 0
                 ORDER BY timestamp DESC, id DESC"
            ),
            user,
        )
    }

    /// Messages sent by `user`, newest first, excluding the ones the sender
    /// archived.
    pub fn outbox_for(&self, user: UserId) -> Result<Vec<MessageRecord>> {
        self.mailbox(
            &format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE sender_id = ?1 AND archived_by_sender = 0
                 ORDER BY timestamp DESC, id DESC"
            ),
            user,
        )
    }

    fn mailbox(&self, sql: &str, user: UserId) -> Result<Vec<MessageRecord>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params![user.0], row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    // ------------------------------------------------------------------
    // Flag updates
    // ------------------------------------------------------------------

    /// Set the shared read flag.  Returns `true` if the message exists.
    pub fn mark_read(&self, id: MessageId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("UPDATE messages SET is_read = 1 WHERE id = ?1", params![id.0])?;
        Ok(affected > 0)
    }

    /// Set or clear the sender's archive flag.  The receiver's flag is never
    /// touched by this statement.
    pub fn set_archived_by_sender(&self, id: MessageId, archived: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET archived_by_sender = ?2 WHERE id = ?1",
            params![id.0, archived],
        )?;
        Ok(affected > 0)
    }

    /// Set or clear the receiver's archive flag.  The sender's flag is never
    /// touched by this statement.
    pub fn set_archived_by_receiver(&self, id: MessageId, archived: bool) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE messages SET archived_by_receiver = ?2 WHERE id = ?1",
            params![id.0, archived],
        )?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, timestamp, subject, content,
                               thread_id, is_read, archived_by_sender, archived_by_receiver";

/// Map a `rusqlite::Row` to a [`MessageRecord`].
fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRecord> {
    let ts_str: String = row.get(3)?;
    let timestamp: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(MessageRecord {
        id: Some(MessageId(row.get(0)?)),
        sender: UserId(row.get(1)?),
        receiver: UserId(row.get(2)?),
        timestamp,
        subject: row.get(4)?,
        content: row.get(5)?,
        thread_id: ThreadId(row.get(6)?),
        is_read: row.get(7)?,
        archived_by_sender: row.get(8)?,
        archived_by_receiver: row.get(9)?,
    })
}
