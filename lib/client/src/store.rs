//! Persistence of the signed-in identity on the client.
//!
//! The browser keeps the [`DeliveredIdentity`] JSON under one key in local
//! storage. Everything that reads it goes through [`ClientIdentityStore`] so
//! tests can swap in [`MemoryIdentityStore`].

use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};
use study_sync_core::DeliveredIdentity;
use tracing::warn;

/// Storage key of the persisted identity.
pub const IDENTITY_KEY: &str = "user";

/// Raw get/set/clear access to the persisted identity.
///
/// Values are stored verbatim; decoding happens in [`load_identity`].
pub trait ClientIdentityStore {
    fn get(&self) -> Option<String>;

    fn set(&self, raw: &str);

    fn clear(&self);
}

/// What a store currently holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Empty,
    Valid(DeliveredIdentity),
    /// Something that does not decode as an identity.
    Corrupt,
}

/// Reads and decodes the persisted identity.
pub fn load_identity(store: &dyn ClientIdentityStore) -> Persisted {
    match store.get() {
        None => Persisted::Empty,
        Some(raw) => match DeliveredIdentity::from_json(&raw) {
            Ok(identity) => Persisted::Valid(identity),
            Err(e) => {
                warn!(error = %e, "persisted identity does not decode");
                Persisted::Corrupt
            }
        },
    }
}

/// Checks the outcome of a write to browser storage, logging failures.
///
/// `None` means no storage was available at all. Returns whether the write
/// went through.
pub fn storage_write_succeeded<E: Debug>(action: &str, outcome: Option<Result<(), E>>) -> bool {
    match outcome {
        Some(Ok(())) => true,
        Some(Err(e)) => {
            warn!(error = ?e, action, "browser storage write failed");
            false
        }
        None => {
            warn!(action, "browser storage is unavailable");
            false
        }
    }
}

/// Identity store held in memory.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    value: Mutex<Option<String>>,
}

impl MemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `raw`.
    #[must_use]
    pub fn holding(raw: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(raw.into())),
        }
    }
}

impl ClientIdentityStore for MemoryIdentityStore {
    fn get(&self) -> Option<String> {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, raw: &str) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.to_string());
    }

    fn clear(&self) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
