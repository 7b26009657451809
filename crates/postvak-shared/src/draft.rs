use serde::{Deserialize, Serialize};

use crate::types::ThreadId;

/// The mutable transfer object bound from an incoming message payload.
///
/// A draft exists only at the deserialization boundary: the workflow converts
/// it into an immutable `MessageRecord` once the sender and receiver are
/// known. The `sender_username` a client may embed is never trusted; the
/// authenticated sender always wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageDraft {
    /// Ignored. The sender is taken from the authenticated credential.
    pub sender_username: Option<String>,
    /// Username of the intended receiver, if the client embedded one.
    pub receiver_username: Option<String>,
    pub subject: String,
    pub content: String,
    /// Conversation to attach this message to, if replying.
    pub thread_id: Option<ThreadId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_partial_payload_with_defaults() {
        let draft: MessageDraft =
            serde_json::from_str(r#"{"subject":"Stage","content":"Hallo"}"#).unwrap();
        assert_eq!(draft.subject, "Stage");
        assert_eq!(draft.content, "Hallo");
        assert!(draft.sender_username.is_none());
        assert!(draft.receiver_username.is_none());
        assert!(draft.thread_id.is_none());
    }

    #[test]
    fn binds_camel_case_fields() {
        let draft: MessageDraft = serde_json::from_str(
            r#"{"receiverUsername":"bob","threadId":4,"subject":"","content":"x"}"#,
        )
        .unwrap();
        assert_eq!(draft.receiver_username.as_deref(), Some("bob"));
        assert_eq!(draft.thread_id, Some(ThreadId(4)));
    }
}
