use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

use super::scope::{key_with_prefix, nested_prefix};
use super::StoreInner;
use crate::error::PocketError;

/// Read-only capability view over a [`super::Store`]. `Prep` is handed one of
/// these and cannot reach `Set`/`Delete` even by accident — the capability is
/// enforced by the type system, not by convention.
pub struct StoreReader<'s> {
    inner: Arc<StoreInner>,
    prefix: String,
    _marker: std::marker::PhantomData<&'s ()>,
}

impl<'s> StoreReader<'s> {
    pub(crate) fn new(inner: Arc<StoreInner>, prefix: String) -> Self {
        StoreReader {
            inner,
            prefix,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(&key_with_prefix(&self.prefix, key))
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PocketError> {
        match self.get(key) {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    /// A read-only view scoped further under `self.prefix + segment + ":"`.
    pub fn scope(&self, segment: &str) -> StoreReader<'s> {
        StoreReader::new(self.inner.clone(), nested_prefix(&self.prefix, segment))
    }
}
