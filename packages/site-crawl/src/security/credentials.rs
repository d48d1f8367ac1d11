//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of the upstream
//! API key. [`CredentialStore`] is a plain state holder: it never talks to
//! the network and never expires what it holds.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;
use std::sync::{OnceLock, RwLock};

use crate::error::{CrawlError, CredentialError};

/// A secret string that won't be logged or displayed.
///
/// Uses `secrecy::SecretBox` to ensure API keys are never accidentally
/// exposed in logs, debug output, or error messages.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// True when the secret is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Holds the API credential for the upstream crawler.
///
/// Pass an instance by reference to whatever needs it; independent stores
/// never see each other's credential. Concurrent `set` calls on the same
/// store are last-write-wins and are not sequenced relative to each other.
#[derive(Default)]
pub struct CredentialStore {
    credential: RwLock<Option<SecretString>>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a credential.
    pub fn with_credential(credential: impl Into<SecretString>) -> Result<Self, CredentialError> {
        let store = Self::new();
        store.set(credential)?;
        Ok(store)
    }

    /// Process-wide default store.
    ///
    /// Only meant for the outermost composition point (a binary's `main`);
    /// library code takes a `&CredentialStore` or a `&SecretString` instead.
    pub fn global() -> &'static CredentialStore {
        static GLOBAL: OnceLock<CredentialStore> = OnceLock::new();
        GLOBAL.get_or_init(CredentialStore::new)
    }

    /// Replace the held credential. Rejects empty values.
    pub fn set(&self, credential: impl Into<SecretString>) -> Result<(), CredentialError> {
        let credential = credential.into();
        if credential.is_blank() {
            return Err(CredentialError::Empty);
        }
        *self.write_guard() = Some(credential);
        Ok(())
    }

    /// The held credential, or `None` when unset.
    pub fn get(&self) -> Option<SecretString> {
        self.read_guard().clone()
    }

    /// Like [`get`](Self::get), but maps absence to [`CrawlError::MissingCredential`].
    pub fn require(&self) -> Result<SecretString, CrawlError> {
        self.get().ok_or(CrawlError::MissingCredential)
    }

    /// True when a credential is held.
    pub fn is_set(&self) -> bool {
        self.read_guard().is_some()
    }

    /// Forget the held credential.
    pub fn clear(&self) {
        *self.write_guard() = None;
    }

    // A poisoned lock only means another thread panicked mid-write of an
    // Option; the value inside is still a whole Option.
    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, Option<SecretString>> {
        self.credential.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_guard(&self) -> std::sync::RwLockWriteGuard<'_, Option<SecretString>> {
        self.credential.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("credential", &self.is_set().then_some("[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug() {
        let secret = SecretString::new("fc-super-secret-key");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("fc-super"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_secret_not_in_display() {
        let secret = SecretString::new("fc-super-secret-key");
        let display = format!("{}", secret);
        assert!(!display.contains("fc-super"));
        assert!(display.contains("[REDACTED]"));
    }

    #[test]
    fn test_expose_works() {
        let secret = SecretString::new("fc-super-secret-key");
        assert_eq!(secret.expose(), "fc-super-secret-key");
    }

    #[test]
    fn test_get_on_unset_store_is_none() {
        let store = CredentialStore::new();
        assert!(store.get().is_none());
        assert!(!store.is_set());
        assert!(matches!(store.require(), Err(CrawlError::MissingCredential)));
    }

    #[test]
    fn test_set_get_clear() {
        let store = CredentialStore::new();
        store.set("fc-123").unwrap();
        assert_eq!(store.get().unwrap().expose(), "fc-123");

        // Last write wins
        store.set("fc-456").unwrap();
        assert_eq!(store.get().unwrap().expose(), "fc-456");

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn test_empty_credential_rejected() {
        let store = CredentialStore::new();
        assert_eq!(store.set("   "), Err(CredentialError::Empty));
        assert!(!store.is_set());
    }

    #[test]
    fn test_independent_stores_do_not_share_state() {
        let a = CredentialStore::with_credential("fc-a").unwrap();
        let b = CredentialStore::new();
        assert!(a.is_set());
        assert!(!b.is_set());
    }

    #[test]
    fn test_store_debug_is_redacted() {
        let store = CredentialStore::with_credential("fc-secret").unwrap();
        let debug = format!("{:?}", store);
        assert!(!debug.contains("fc-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
