//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a boundary layer.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postvak_shared::draft::MessageDraft;
use postvak_shared::types::{MessageId, ThreadId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A known platform user. Display-only presentation of these fields happens
/// in the boundary layer, never on [`MessageRecord`] itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    /// Set for company accounts, absent for individuals.
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// MessageRecord
// ---------------------------------------------------------------------------

/// A single direct message between two users.
///
/// Identity contract: equality and hashing consider `id`, `sender`,
/// `receiver`, `thread_id`, `is_read` and the two archive flags only.
/// `subject`, `content` and `timestamp` are not part of a record's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Assigned by the store on first successful insert; `None` until then.
    pub id: Option<MessageId>,
    pub sender: UserId,
    pub receiver: UserId,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    pub content: String,
    /// Conversation this message belongs to.
    pub thread_id: ThreadId,
    /// Single shared read flag; not scoped to either party.
    pub is_read: bool,
    /// Archiving is per party: each flag hides the message from that party's
    /// view only and never affects the other.
    pub archived_by_sender: bool,
    pub archived_by_receiver: bool,
}

impl MessageRecord {
    /// Build a record from a transport draft plus the identities the workflow
    /// established. Fills the defaults: timestamp now, unthreaded, unread,
    /// unarchived, no id.
    pub fn from_draft(draft: &MessageDraft, sender: UserId, receiver: UserId) -> Self {
        Self {
            id: None,
            sender,
            receiver,
            timestamp: Utc::now(),
            subject: draft.subject.clone(),
            content: draft.content.clone(),
            thread_id: draft.thread_id.unwrap_or_default(),
            is_read: false,
            archived_by_sender: false,
            archived_by_receiver: false,
        }
    }
}

impl PartialEq for MessageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.sender == other.sender
            && self.receiver == other.receiver
            && self.thread_id == other.thread_id
            && self.is_read == other.is_read
            && self.archived_by_sender == other.archived_by_sender
            && self.archived_by_receiver == other.archived_by_receiver
    }
}

impl Eq for MessageRecord {}

impl Hash for MessageRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.sender.hash(state);
        self.receiver.hash(state);
        self.thread_id.hash(state);
        self.is_read.hash(state);
        self.archived_by_sender.hash(state);
        self.archived_by_receiver.hash(state);
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A bearer credential issued by the platform's token service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    /// Resource path prefix this session may access, e.g. `/api`.
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}
