//! Baby identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A validated baby identifier, safe to place in a URL path segment.
///
/// # Example
///
/// ```
/// use nanit_core::BabyUid;
///
/// let uid = BabyUid::new("a1b2c3").unwrap();
/// assert_eq!(uid.as_str(), "a1b2c3");
/// assert!(BabyUid::new("../babies").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BabyUid(String);

impl BabyUid {
    /// Create a new baby uid, validating the format.
    pub fn new(s: impl Into<String>) -> Result<Self, Error> {
        let s = s.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    /// Returns the uid string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(s: &str) -> Result<(), Error> {
        if s.is_empty() {
            return Err(InvalidInputError::BabyUid {
                value: s.to_string(),
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        if s.len() > 128 {
            return Err(InvalidInputError::BabyUid {
                value: s.to_string(),
                reason: "exceeds maximum length of 128 characters".to_string(),
            }
            .into());
        }

        if let Some(c) = s
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(InvalidInputError::BabyUid {
                value: s.to_string(),
                reason: format!("contains invalid character '{}'", c),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for BabyUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BabyUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for BabyUid {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BabyUid> for String {
    fn from(uid: BabyUid) -> Self {
        uid.0
    }
}

impl AsRef<str> for BabyUid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
