use thiserror::Error;

/// Failure modes of the authentication capability.
///
/// These are raised before the message workflow runs and propagate to the
/// transport layer unwrapped; they are never folded into a
/// [`ResponseEnvelope`](crate::envelope::ResponseEnvelope).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Credential has expired")]
    CredentialExpired,

    #[error("Credential not found")]
    CredentialNotFound,

    #[error("Not authorized for {0}")]
    UnauthorizedForResource(String),

    #[error("Unknown user")]
    UnknownUser,

    /// Infrastructure fault inside the authorizer itself.
    #[error("Authorization backend error: {0}")]
    Backend(String),
}
