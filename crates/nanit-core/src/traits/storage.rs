//! Durable key-value storage for tokens.

use crate::Result;

/// String key-value persistence used by [`SessionStore`](crate::SessionStore).
///
/// Implementations must make `set` durable before returning so tokens
/// survive a process restart.
pub trait TokenStorage: Send + Sync {
    /// Read a value, `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
