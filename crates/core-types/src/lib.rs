use std::fmt;

use thiserror::Error;

/// Shared error type for identifier handling across the feed crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{kind} must not be empty")]
    EmptyId { kind: &'static str },
    #[error("{kind} contains whitespace: {value:?}")]
    Whitespace { kind: &'static str, value: String },
}

/// Identifier of the application whose event feed is being viewed.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct AppGuid(pub String);

impl AppGuid {
    /// Validating constructor. Guids coming from the platform are opaque, but
    /// an empty or whitespace-bearing value is always a caller bug.
    pub fn parse(value: impl Into<String>) -> Result<Self, CoreError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CoreError::EmptyId { kind: "app guid" });
        }
        if value.chars().any(char::is_whitespace) {
            return Err(CoreError::Whitespace {
                kind: "app guid",
                value,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppGuid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl AsRef<str> for AppGuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
