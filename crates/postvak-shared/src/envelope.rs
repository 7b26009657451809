use serde::{Deserialize, Serialize};

/// The uniform result returned for every domain-level outcome of the
/// message-creation endpoint: a flag and a human-readable description.
/// Authentication failures never use this shape; they surface as transport
/// errors instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub message: String,
}

impl ResponseEnvelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_success_and_message_keys() {
        let json = serde_json::to_string(&ResponseEnvelope::ok("Bericht succesvol verzonden."))
            .unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"message":"Bericht succesvol verzonden."}"#
        );
    }

    #[test]
    fn error_sets_success_false() {
        let env = ResponseEnvelope::error("mislukt");
        assert!(!env.success);
        assert_eq!(env.message, "mislukt");
    }
}
