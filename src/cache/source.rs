//! Cache source identifiers
//!
//! A cache source names one mount cache. The same string is used as a
//! path segment inside the utility container and as the final directory
//! name in the working directory, so it has to be a single safe segment.

use crate::error::{DanceError, DanceResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Validated name of a cache source (e.g. `cache-npm`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheSource(String);

impl CacheSource {
    /// Validate and wrap a cache source name
    pub fn new(name: impl Into<String>) -> DanceResult<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(DanceError::invalid_source(name, "must not be empty"));
        }
        if name == "." || name == ".." {
            return Err(DanceError::invalid_source(
                name,
                "must not be a relative path component",
            ));
        }
        if name.starts_with('-') {
            return Err(DanceError::invalid_source(
                name,
                "must not start with '-'",
            ));
        }
        if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\' | '\0')) {
            return Err(DanceError::invalid_source(
                name.clone(),
                format!("must be a single path segment (found {:?})", c),
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(DanceError::invalid_source(name, "must not contain whitespace"));
        }

        Ok(Self(name))
    }

    /// The raw name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheSource {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CacheSource {
    type Err = DanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for CacheSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CacheSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
