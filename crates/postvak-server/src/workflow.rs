//! The message-creation workflow.
//!
//! One invocation turns an authenticated sender, a transport draft and an
//! optional addressing hint into a persisted message and an envelope-ready
//! outcome.  The workflow holds no cross-invocation state; the three
//! dependent steps (resolve, assign, persist) form a strict sequential
//! chain with exactly one persistence attempt.

use std::sync::{Arc, Mutex};

use tracing::info;

use postvak_shared::draft::MessageDraft;
use postvak_shared::envelope::ResponseEnvelope;
use postvak_store::{Database, MessageRecord, User};

/// Fixed confirmation text for a successful send.
pub const MSG_SENT: &str = "Bericht succesvol verzonden.";

/// Fixed text for a store-side length rejection.  The store reports the
/// rejection as a bare boolean, so every rejection reason shares this one
/// message.
const MSG_REJECTED: &str = "Bericht sturen niet succesvol. Onderwerp of bericht is te lang.";

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Outcome of receiver resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(User),
    /// Nobody matched; carries the username that was tried.
    NotFound { username: String },
}

/// Maps a message draft plus an optional addressing hint to a concrete
/// receiver identity.
pub trait ReceiverResolver: Send + Sync {
    fn resolve(&self, draft: &MessageDraft, hint: Option<&str>) -> anyhow::Result<Resolution>;
}

/// Persists one message.  `Ok(false)` means the store's own validation
/// rejected the record; `Ok(true)` means it was stored and its id assigned.
pub trait MessageStore: Send + Sync {
    fn save(&self, record: &mut MessageRecord) -> anyhow::Result<bool>;
}

// ---------------------------------------------------------------------------
// Failure taxonomy
// ---------------------------------------------------------------------------

/// The enumerated, non-authentication ways a send can fail.  Each maps to a
/// `{success: false}` envelope; none ever propagates as a raw fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    /// The addressing input matched no user.  A domain outcome, not a fault.
    ReceiverNotFound { username: String },
    /// The store's length validation rejected the subject or content.
    MessageRejected,
    /// Any other runtime fault raised by the resolver or the store.
    Unexpected(String),
}

impl SendFailure {
    fn unexpected(e: anyhow::Error) -> Self {
        SendFailure::Unexpected(e.to_string())
    }

    pub fn to_envelope(&self) -> ResponseEnvelope {
        match self {
            SendFailure::ReceiverNotFound { username } => ResponseEnvelope::error(format!(
                "Gebruiker met gebruikersnaam {username} niet gevonden"
            )),
            SendFailure::MessageRejected => ResponseEnvelope::error(MSG_REJECTED),
            SendFailure::Unexpected(text) => {
                ResponseEnvelope::error(format!("Er is een fout opgetreden {text}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// Orchestrates one send.
pub struct MessageWorkflow {
    resolver: Arc<dyn ReceiverResolver>,
    store: Arc<dyn MessageStore>,
}

impl MessageWorkflow {
    pub fn new(resolver: Arc<dyn ReceiverResolver>, store: Arc<dyn MessageStore>) -> Self {
        Self { resolver, store }
    }

    /// Create and persist one message.
    ///
    /// `sender` comes from the authenticated credential; whatever sender the
    /// draft embeds is ignored.  Returns the persisted record (id assigned)
    /// or a [`SendFailure`] ready to be rendered as an envelope.
    pub fn create(
        &self,
        sender: &User,
        draft: &MessageDraft,
        receiver_hint: Option<&str>,
    ) -> Result<MessageRecord, SendFailure> {
        let resolution = self
            .resolver
            .resolve(draft, receiver_hint)
            .map_err(SendFailure::unexpected)?;

        let receiver = match resolution {
            Resolution::Found(user) => user,
            Resolution::NotFound { username } => {
                return Err(SendFailure::ReceiverNotFound { username });
            }
        };

        let mut record = MessageRecord::from_draft(draft, sender.id, receiver.id);

        let saved = self
            .store
            .save(&mut record)
            .map_err(SendFailure::unexpected)?;
        if !saved {
            return Err(SendFailure::MessageRejected);
        }

        info!(
            message_id = ?record.id,
            sender = %sender.id,
            receiver = %receiver.id,
            thread = %record.thread_id,
            "message stored"
        );
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Database-backed adapters
// ---------------------------------------------------------------------------

/// Resolves receivers against the `users` table.
pub struct DbReceiverResolver {
    db: Arc<Mutex<Database>>,
}

impl DbReceiverResolver {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

impl ReceiverResolver for DbReceiverResolver {
    fn resolve(&self, draft: &MessageDraft, hint: Option<&str>) -> anyhow::Result<Resolution> {
        // A non-empty hint overrides whatever receiver the payload embedded.
        let username = hint
            .filter(|h| !h.is_empty())
            .or(draft.receiver_username.as_deref())
            .unwrap_or_default()
            .to_string();

        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?;

        match db.find_user_by_username(&username)? {
            Some(user) => Ok(Resolution::Found(user)),
            None => Ok(Resolution::NotFound { username }),
        }
    }
}

/// Persists messages through the [`Database`] handle.
pub struct DbMessageStore {
    db: Arc<Mutex<Database>>,
}

impl DbMessageStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

impl MessageStore for DbMessageStore {
    fn save(&self, record: &mut MessageRecord) -> anyhow::Result<bool> {
        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("store lock poisoned: {e}"))?;
        Ok(db.insert_message(record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use postvak_shared::types::{MessageId, UserId};

    fn user(id: i64, username: &str) -> User {
        User {
            id: UserId(id),
            username: username.to_string(),
            full_name: username.to_string(),
            company_name: None,
            created_at: Utc::now(),
        }
    }

    fn draft(subject: &str, content: &str) -> MessageDraft {
        MessageDraft {
            subject: subject.to_string(),
            content: content.to_string(),
            ..MessageDraft::default()
        }
    }

    struct FoundResolver(User);

    impl ReceiverResolver for FoundResolver {
        fn resolve(&self, _: &MessageDraft, _: Option<&str>) -> anyhow::Result<Resolution> {
            Ok(Resolution::Found(self.0.clone()))
        }
    }

    struct MissingResolver;

    impl ReceiverResolver for MissingResolver {
        fn resolve(&self, draft: &MessageDraft, hint: Option<&str>) -> anyhow::Result<Resolution> {
            let username = hint
                .or(draft.receiver_username.as_deref())
                .unwrap_or_default()
                .to_string();
            Ok(Resolution::NotFound { username })
        }
    }

    struct FailingResolver(&'static str);

    impl ReceiverResolver for FailingResolver {
        fn resolve(&self, _: &MessageDraft, _: Option<&str>) -> anyhow::Result<Resolution> {
            Err(anyhow::anyhow!(self.0))
        }
    }

    /// Accepts every record, assigns id 7 and remembers what it saw.
    struct AcceptingStore {
        calls: AtomicUsize,
        last: Mutex<Option<MessageRecord>>,
    }

    impl AcceptingStore {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }
    }

    impl MessageStore for AcceptingStore {
        fn save(&self, record: &mut MessageRecord) -> anyhow::Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            record.id = Some(MessageId(7));
            *self.last.lock().unwrap() = Some(record.clone());
            Ok(true)
        }
    }

    struct RejectingStore {
        calls: AtomicUsize,
    }

    impl MessageStore for RejectingStore {
        fn save(&self, _: &mut MessageRecord) -> anyhow::Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(false)
        }
    }

    struct FailingStore(&'static str);

    impl MessageStore for FailingStore {
        fn save(&self, _: &mut MessageRecord) -> anyhow::Result<bool> {
            Err(anyhow::anyhow!(self.0))
        }
    }

    #[test]
    fn successful_send_persists_and_confirms() {
        let store = Arc::new(AcceptingStore::new());
        let workflow = MessageWorkflow::new(
            Arc::new(FoundResolver(user(2, "bob"))),
            store.clone(),
        );

        let record = workflow
            .create(&user(1, "alice"), &draft("Stage", "Hallo Bob"), None)
            .unwrap();

        assert_eq!(record.id, Some(MessageId(7)));
        assert_eq!(record.sender, UserId(1));
        assert_eq!(record.receiver, UserId(2));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(MSG_SENT, "Bericht succesvol verzonden.");
    }

    #[test]
    fn unknown_receiver_skips_persistence() {
        let store = Arc::new(AcceptingStore::new());
        let workflow = MessageWorkflow::new(Arc::new(MissingResolver), store.clone());

        let failure = workflow
            .create(&user(1, "alice"), &draft("Stage", "Hallo"), Some("ghost123"))
            .unwrap_err();

        assert_eq!(
            failure,
            SendFailure::ReceiverNotFound {
                username: "ghost123".to_string()
            }
        );
        assert_eq!(
            failure.to_envelope().message,
            "Gebruiker met gebruikersnaam ghost123 niet gevonden"
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn store_rejection_reports_length_failure() {
        let store = Arc::new(RejectingStore {
            calls: AtomicUsize::new(0),
        });
        let workflow =
            MessageWorkflow::new(Arc::new(FoundResolver(user(2, "bob"))), store.clone());

        let failure = workflow
            .create(&user(1, "alice"), &draft("Stage", "Hallo"), None)
            .unwrap_err();

        assert_eq!(failure, SendFailure::MessageRejected);
        assert_eq!(
            failure.to_envelope().message,
            "Bericht sturen niet succesvol. Onderwerp of bericht is te lang."
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn resolver_fault_becomes_an_envelope_not_a_panic() {
        let workflow = MessageWorkflow::new(
            Arc::new(FailingResolver("disk full")),
            Arc::new(AcceptingStore::new()),
        );

        let failure = workflow
            .create(&user(1, "alice"), &draft("Stage", "Hallo"), None)
            .unwrap_err();

        assert_eq!(failure, SendFailure::Unexpected("disk full".to_string()));
        assert_eq!(
            failure.to_envelope().message,
            "Er is een fout opgetreden disk full"
        );
    }

    #[test]
    fn store_fault_becomes_an_envelope_not_a_panic() {
        let workflow = MessageWorkflow::new(
            Arc::new(FoundResolver(user(2, "bob"))),
            Arc::new(FailingStore("disk full")),
        );

        let failure = workflow
            .create(&user(1, "alice"), &draft("Stage", "Hallo"), None)
            .unwrap_err();

        assert_eq!(
            failure.to_envelope().message,
            "Er is een fout opgetreden disk full"
        );
    }

    #[test]
    fn embedded_sender_is_never_trusted() {
        let store = Arc::new(AcceptingStore::new());
        let workflow =
            MessageWorkflow::new(Arc::new(FoundResolver(user(2, "bob"))), store.clone());

        let mut spoofed = draft("Stage", "Hallo");
        spoofed.sender_username = Some("mallory".to_string());

        workflow.create(&user(1, "alice"), &spoofed, None).unwrap();

        let saved = store.last.lock().unwrap().clone().unwrap();
        assert_eq!(saved.sender, UserId(1));
    }

    // Adapter tests run against a real database file.
    mod adapters {
        use super::*;
        use std::time::Duration;

        fn open_db(dir: &tempfile::TempDir) -> Arc<Mutex<Database>> {
            let path = dir.path().join("test.db");
            Arc::new(Mutex::new(
                Database::open_at(&path, Duration::from_millis(100)).unwrap(),
            ))
        }

        #[test]
        fn hint_overrides_embedded_receiver() {
            let dir = tempfile::tempdir().unwrap();
            let db = open_db(&dir);
            {
                let guard = db.lock().unwrap();
                guard.create_user("alice", "Alice Jansen", None).unwrap();
                guard.create_user("bob", "Bob de Groot", None).unwrap();
            }

            let resolver = DbReceiverResolver::new(db);
            let mut draft = draft("Stage", "Hallo");
            draft.receiver_username = Some("alice".to_string());

            match resolver.resolve(&draft, Some("bob")).unwrap() {
                Resolution::Found(user) => assert_eq!(user.username, "bob"),
                other => panic!("expected bob, got {other:?}"),
            }

            // Without a hint the embedded receiver applies.
            match resolver.resolve(&draft, None).unwrap() {
                Resolution::Found(user) => assert_eq!(user.username, "alice"),
                other => panic!("expected alice, got {other:?}"),
            }

            // An empty hint counts as absent.
            match resolver.resolve(&draft, Some("")).unwrap() {
                Resolution::Found(user) => assert_eq!(user.username, "alice"),
                other => panic!("expected alice, got {other:?}"),
            }
        }

        #[test]
        fn unaddressed_draft_resolves_to_not_found() {
            let dir = tempfile::tempdir().unwrap();
            let resolver = DbReceiverResolver::new(open_db(&dir));

            match resolver.resolve(&draft("Stage", "Hallo"), None).unwrap() {
                Resolution::NotFound { username } => assert_eq!(username, ""),
                other => panic!("expected not found, got {other:?}"),
            }
        }

        #[test]
        fn db_store_round_trip_assigns_id() {
            let dir = tempfile::tempdir().unwrap();
            let db = open_db(&dir);
            let (alice, bob) = {
                let guard = db.lock().unwrap();
                let a = guard.create_user("alice", "Alice Jansen", None).unwrap();
                let b = guard.create_user("bob", "Bob de Groot", None).unwrap();
                (a, b)
            };

            let store = DbMessageStore::new(db);
            let mut record =
                MessageRecord::from_draft(&draft("Stage", "Hallo"), alice.id, bob.id);

            assert!(store.save(&mut record).unwrap());
            assert!(record.id.is_some());
        }
    }
}
