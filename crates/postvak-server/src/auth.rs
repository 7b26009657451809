//! Token authorization against the session store.
//!
//! Account provisioning and login live elsewhere in the platform; this
//! module only verifies credentials that service already issued.

use std::sync::{Arc, Mutex};

use chrono::Utc;

use postvak_shared::error::AuthError;
use postvak_store::{Database, StoreError, User};

/// The authentication capability consumed by the HTTP boundary.
pub trait Authorize: Send + Sync {
    /// Verify that `credential` may access `resource` and return the user
    /// behind it.
    fn authorize(&self, credential: &str, resource: &str) -> Result<User, AuthError>;
}

/// Session-table-backed implementation of [`Authorize`].
pub struct SessionAuthorizer {
    db: Arc<Mutex<Database>>,
}

impl SessionAuthorizer {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

impl Authorize for SessionAuthorizer {
    fn authorize(&self, credential: &str, resource: &str) -> Result<User, AuthError> {
        let db = self
            .db
            .lock()
            .map_err(|e| AuthError::Backend(format!("store lock poisoned: {e}")))?;

        let session = db
            .find_session(credential)
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .ok_or(AuthError::CredentialNotFound)?;

        if session.expires_at < Utc::now() {
            return Err(AuthError::CredentialExpired);
        }

        if !resource.starts_with(session.scope.as_str()) {
            return Err(AuthError::UnauthorizedForResource(resource.to_string()));
        }

        match db.get_user(session.user_id) {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => Err(AuthError::UnknownUser),
            Err(e) => Err(AuthError::Backend(e.to_string())),
        }
    }
}
