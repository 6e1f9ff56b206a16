//! nanit-file - durable token storage for the nanit toolkit.
//!
//! [`FileStorage`] keeps the session tokens in a small JSON file so a login
//! survives process restarts.

mod store;

pub use store::FileStorage;
