//! Seams for the vendor API and token persistence.

mod storage;
mod vendor;

pub use storage::TokenStorage;
pub use vendor::VendorApi;
