//! Validated value types.
//!
//! These types check their invariants at construction time.

mod api_url;
mod baby_uid;
mod time_range;

pub use api_url::ApiUrl;
pub use baby_uid::BabyUid;
pub use time_range::TimeRange;
