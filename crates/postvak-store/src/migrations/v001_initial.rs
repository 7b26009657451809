//! v001 -- Initial schema creation.
//!
//! Creates the three core tables: `users`, `messages`, and `sessions`.
//! The length bounds on `subject` and `content` are store policy; nothing
//! outside this crate re-derives them.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id           INTEGER PRIMARY KEY,
    username     TEXT NOT NULL UNIQUE,
    full_name    TEXT NOT NULL,
    company_name TEXT,                        -- company accounts only
    created_at   TEXT NOT NULL                -- ISO-8601 / RFC-3339
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS messages (
    id                   INTEGER PRIMARY KEY,
    sender_id            INTEGER NOT NULL,
    receiver_id          INTEGER NOT NULL,
    timestamp            TEXT NOT NULL,       -- ISO-8601
    subject              TEXT NOT NULL CHECK (length(subject) <= 255),
    content              TEXT NOT NULL CHECK (length(content) <= 4000),
    thread_id            INTEGER NOT NULL DEFAULT 0,
    is_read              INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1, shared flag
    archived_by_sender   INTEGER NOT NULL DEFAULT 0,
    archived_by_receiver INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY (sender_id) REFERENCES users(id),
    FOREIGN KEY (receiver_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_messages_thread
    ON messages(thread_id, timestamp ASC);

CREATE INDEX IF NOT EXISTS idx_messages_receiver
    ON messages(receiver_id, timestamp DESC);

CREATE INDEX IF NOT EXISTS idx_messages_sender
    ON messages(sender_id, timestamp DESC);

-- ----------------------------------------------------------------
-- Sessions
-- ----------------------------------------------------------------
-- Issued by the platform's token service; user_id is deliberately not a
-- foreign key because that service's accounts may outlive rows here.
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    user_id    INTEGER NOT NULL,
    scope      TEXT NOT NULL DEFAULT '/api',  -- resource path prefix
    expires_at TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
