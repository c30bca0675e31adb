use dashmap::DashMap;
use std::env;
use std::sync::Arc;

use crate::error::BootstrapError;

/// Environment-backed configuration service.
///
/// Snapshots the process environment once at construction; resource
/// initializers read their keys through this service instead of touching
/// `std::env` directly, so tests can run against an explicit key set.
#[derive(Clone, Default)]
pub struct ConfigService {
    values: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Snapshot the current process environment.
    pub fn from_env() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// Build a config from explicit pairs, without reading the environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let service = Self::default();
        for (key, value) in pairs {
            service.values.insert(key.into(), value.into());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// A key that is absent or empty fails with an error naming the key.
    pub fn require(&self, key: &'static str) -> Result<String, BootstrapError> {
        match self.get(key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(BootstrapError::MissingConfig(key)),
        }
    }
}
