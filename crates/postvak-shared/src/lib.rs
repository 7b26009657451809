//! # postvak-shared
//!
//! Types shared between the Postvak messaging crates: the id newtypes, the
//! transport payload (`MessageDraft`), the uniform `{success, message}`
//! response envelope, and the authentication error contract.

pub mod draft;
pub mod envelope;
pub mod error;
pub mod types;

pub use draft::MessageDraft;
pub use envelope::ResponseEnvelope;
pub use error::AuthError;
pub use types::{MessageId, ThreadId, UserId};
