use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::reader::StoreReader;
use super::scope::{key_with_prefix, nested_prefix};
use super::StoreInner;
use crate::error::PocketError;

/// Read-write capability view over a [`super::Store`]. `Post` and hooks get
/// one of these; `Exec` gets no store access at all by design.
pub struct StoreWriter<'s> {
    inner: Arc<StoreInner>,
    prefix: String,
    _marker: std::marker::PhantomData<&'s ()>,
}

impl<'s> StoreWriter<'s> {
    pub(crate) fn new(inner: Arc<StoreInner>, prefix: String) -> Self {
        StoreWriter {
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

    pub fn set(&self, key: &str, value: Value) {
        self.inner.set(key_with_prefix(&self.prefix, key), value);
    }

    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<(), PocketError> {
        self.set(key, serde_json::to_value(value)?);
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Option<Value> {
        self.inner.delete(&key_with_prefix(&self.prefix, key))
    }

    /// A read-only view over the same scope, for handing to code that should
    /// not be able to write (e.g. downgrading before calling a helper).
    pub fn as_reader(&self) -> StoreReader<'s> {
        StoreReader::new(self.inner.clone(), self.prefix.clone())
    }

    pub fn scope(&self, segment: &str) -> StoreWriter<'s> {
        StoreWriter::new(self.inner.clone(), nested_prefix(&self.prefix, segment))
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{Store, StoreOptions};
    use serde_json::Value;

    #[test]
    fn delete_removes_value() {
        let store = Store::new(StoreOptions::default());
        let writer = store.writer();
        writer.set("k", Value::from(1));
        assert_eq!(writer.delete("k"), Some(Value::from(1)));
        assert_eq!(writer.get("k"), None);
    }
}
