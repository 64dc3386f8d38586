//! Ordered cache source → options mapping
//!
//! Iteration order is extraction order.

use crate::cache::options::{CacheOptions, CacheSpec, MountOptions};
use crate::cache::source::CacheSource;
use crate::error::{DanceError, DanceResult};

/// Ordered mapping from cache source to resolved options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheMap {
    entries: Vec<(CacheSource, CacheOptions)>,
}

impl CacheMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, rejecting a source that is already present
    pub fn insert(&mut self, source: CacheSource, options: CacheOptions) -> DanceResult<()> {
        if self.get(&source).is_some() {
            return Err(DanceError::DuplicateCacheSource(source.to_string()));
        }
        self.entries.push((source, options));
        Ok(())
    }

    /// Build from `(source, mount options)` pairs in order
    pub fn from_pairs<I>(pairs: I) -> DanceResult<Self>
    where
        I: IntoIterator<Item = (CacheSource, MountOptions)>,
    {
        let mut map = Self::new();
        for (source, mount) in pairs {
            map.insert(source, CacheOptions::new(&mount))?;
        }
        Ok(map)
    }

    /// Parse the JSON form: `{"cache-npm": "/root/.npm", "cache-go": {"target": "/go/pkg/mod"}}`
    ///
    /// Keys keep document order.
    pub fn from_json(json: &str) -> DanceResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| DanceError::CacheMapInvalid(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| DanceError::CacheMapInvalid("expected a JSON object".to_string()))?;

        let mut map = Self::new();
        for (key, raw) in object {
            let source = CacheSource::new(key.as_str())?;
            let spec: CacheSpec = serde_json::from_value(raw.clone()).map_err(|e| {
                DanceError::CacheMapInvalid(format!("entry {:?}: {}", key, e))
            })?;
            map.insert(source, CacheOptions::new(&MountOptions::from(spec)))?;
        }

        Ok(map)
    }

    /// Look up the options for a source
    pub fn get(&self, source: &CacheSource) -> Option<&CacheOptions> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, options)| options)
    }

    /// Iterate entries in extraction order
    pub fn iter(&self) -> impl Iterator<Item = (&CacheSource, &CacheOptions)> {
        self.entries.iter().map(|(s, o)| (s, o))
    }

    /// Sources in extraction order
    pub fn sources(&self) -> impl Iterator<Item = &CacheSource> {
        self.entries.iter().map(|(s, _)| s)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
