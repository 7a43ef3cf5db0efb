//! Authentication boundary.
//!
//! The sync layer only needs to know whether the administrator is signed in;
//! how that is decided belongs to the identity provider.

use crate::error::{Result, SyncError};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Administrator sign-in credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub trait Authenticator: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn login(&self, credentials: &Credentials) -> Result<()>;

    fn logout(&self);
}

/// Accepts exactly one configured credential pair.
pub struct StaticAuthenticator {
    expected: Credentials,
    signed_in: AtomicBool,
}

impl StaticAuthenticator {
    pub fn new(expected: Credentials) -> Self {
        Self {
            expected,
            signed_in: AtomicBool::new(false),
        }
    }
}

impl Authenticator for StaticAuthenticator {
    fn is_authenticated(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    fn login(&self, credentials: &Credentials) -> Result<()> {
        if *credentials == self.expected {
            self.signed_in.store(true, Ordering::SeqCst);
            info!(email = %credentials.email, "administrator signed in");
            Ok(())
        } else {
            warn!(email = %credentials.email, "sign-in rejected");
            Err(SyncError::Permission("invalid credentials".into()))
        }
    }

    fn logout(&self) {
        if self.signed_in.swap(false, Ordering::SeqCst) {
            info!("administrator signed out");
        }
    }
}
