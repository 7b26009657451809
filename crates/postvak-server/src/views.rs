//! Boundary view objects assembled just before serialization.
//!
//! Display-only data (participant names) rides here, not on the core
//! message entity, so it stays out of the entity's equality contract.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use postvak_shared::types::{MessageId, ThreadId, UserId};
use postvak_store::{Database, MessageRecord, User};

use crate::error::ServerError;

/// A message as a client sees it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub subject: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub sender_username: String,
    pub sender_full_name: String,
    pub sender_company_name: Option<String>,
    pub receiver_username: String,
    pub receiver_full_name: String,
    pub receiver_company_name: Option<String>,
}

impl MessageView {
    fn assemble(id: MessageId, record: &MessageRecord, sender: &User, receiver: &User) -> Self {
        Self {
            id,
            thread_id: record.thread_id,
            subject: record.subject.clone(),
            content: record.content.clone(),
            timestamp: record.timestamp,
            is_read: record.is_read,
            sender_username: sender.username.clone(),
            sender_full_name: sender.full_name.clone(),
            sender_company_name: sender.company_name.clone(),
            receiver_username: receiver.username.clone(),
            receiver_full_name: receiver.full_name.clone(),
            receiver_company_name: receiver.company_name.clone(),
        }
    }
}

/// Assemble views for a batch of persisted records, loading each participant
/// once.
pub fn assemble_all(db: &Database, records: &[MessageRecord]) -> Result<Vec<MessageView>, ServerError> {
    let mut users: HashMap<UserId, User> = HashMap::new();
    let mut views = Vec::with_capacity(records.len());

    for record in records {
        // Unsaved records have no id and no view.
        let Some(id) = record.id else { continue };
        let sender = cached_user(db, &mut users, record.sender)?;
        let receiver = cached_user(db, &mut users, record.receiver)?;
        views.push(MessageView::assemble(id, record, &sender, &receiver));
    }

    Ok(views)
}

fn cached_user(
    db: &Database,
    cache: &mut HashMap<UserId, User>,
    id: UserId,
) -> Result<User, ServerError> {
    if let Some(user) = cache.get(&id) {
        return Ok(user.clone());
    }
    let user = db.get_user(id)?;
    cache.insert(id, user.clone());
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use postvak_shared::draft::MessageDraft;

    #[test]
    fn views_carry_display_names_for_both_parties() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db"), Duration::from_millis(100))
            .unwrap();

        let alice = db.create_user("alice", "Alice Jansen", None).unwrap();
        let bob = db
            .create_user("bob", "Bob de Groot", Some("Bouwbedrijf De Groot"))
            .unwrap();

        let draft = MessageDraft {
            subject: "Stage".to_string(),
            content: "Hallo".to_string(),
            ..MessageDraft::default()
        };
        let mut record = MessageRecord::from_draft(&draft, alice.id, bob.id);
        db.insert_message(&mut record).unwrap();

        let views = assemble_all(&db, &[record]).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].sender_full_name, "Alice Jansen");
        assert_eq!(views[0].receiver_full_name, "Bob de Groot");
        assert_eq!(
            views[0].receiver_company_name.as_deref(),
            Some("Bouwbedrijf De Groot")
        );
    }
}
