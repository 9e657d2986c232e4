//! Change-tracking storage for model properties.
//!
//! A model that keeps its properties in a [`BackingStore`] can be written
//! as a partial update: once decoding completes, only values set afterwards
//! are reported as changed. The proxy factories here install the parse and
//! writer hooks that drive this.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::serialization::{
    AnyValue, ParseHooks, ParseNode, ParseNodeFactory, SerializationWriter,
    SerializationWriterFactory, WriterHooks,
};

/// Property storage that records which values changed.
pub trait BackingStore: Send + Sync {
    /// Returns the value for `key`.
    ///
    /// When [`return_only_changed_values`](Self::return_only_changed_values)
    /// is set, unchanged values read as `None`.
    fn get(&self, key: &str) -> Option<AnyValue>;

    /// Stores a value; it counts as changed once initialization completed.
    fn set(&self, key: &str, value: AnyValue);

    /// Returns stored entries, filtered like [`get`](Self::get).
    fn enumerate(&self) -> Vec<(String, AnyValue)>;

    /// Returns the keys whose value was changed to null.
    fn enumerate_keys_for_values_changed_to_null(&self) -> Vec<String>;

    /// Returns `true` once the model finished decoding.
    fn is_initialization_completed(&self) -> bool;

    /// Marks decoding as started (`false`) or finished (`true`).
    ///
    /// Finishing resets every entry to unchanged.
    fn set_initialization_completed(&self, completed: bool);

    /// Returns `true` if reads only report changed values.
    fn return_only_changed_values(&self) -> bool;

    /// Restricts reads to changed values.
    fn set_return_only_changed_values(&self, only_changed: bool);

    /// Removes every entry.
    fn clear(&self);
}

#[derive(Debug, Clone)]
struct StoreEntry {
    changed: bool,
    value: AnyValue,
}

/// A [`BackingStore`] kept in memory.
#[derive(Debug)]
pub struct InMemoryBackingStore {
    entries: Mutex<BTreeMap<String, StoreEntry>>,
    initialization_completed: AtomicBool,
    return_only_changed_values: AtomicBool,
}

impl InMemoryBackingStore {
    /// Creates an empty store with initialization completed.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            initialization_completed: AtomicBool::new(true),
            return_only_changed_values: AtomicBool::new(false),
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, StoreEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn visible(&self, entry: &StoreEntry) -> bool {
        !self.return_only_changed_values() || entry.changed
    }
}

impl Default for InMemoryBackingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingStore for InMemoryBackingStore {
    fn get(&self, key: &str) -> Option<AnyValue> {
        let entries = self.entries();
        let entry = entries.get(key)?;
        self.visible(entry).then(|| entry.value.clone())
    }

    fn set(&self, key: &str, value: AnyValue) {
        let changed = self.is_initialization_completed();
        self.entries()
            .insert(key.to_string(), StoreEntry { changed, value });
    }

    fn enumerate(&self) -> Vec<(String, AnyValue)> {
        self.entries()
            .iter()
            .filter(|(_, entry)| self.visible(entry))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    fn enumerate_keys_for_values_changed_to_null(&self) -> Vec<String> {
        self.entries()
            .iter()
            .filter(|(_, entry)| entry.changed && entry.value.is_null())
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn is_initialization_completed(&self) -> bool {
        self.initialization_completed.load(Ordering::Acquire)
    }

    fn set_initialization_completed(&self, completed: bool) {
        self.initialization_completed.store(completed, Ordering::Release);
        for entry in self.entries().values_mut() {
            entry.changed = !completed;
        }
    }

    fn return_only_changed_values(&self) -> bool {
        self.return_only_changed_values.load(Ordering::Acquire)
    }

    fn set_return_only_changed_values(&self, only_changed: bool) {
        self.return_only_changed_values
            .store(only_changed, Ordering::Release);
    }

    fn clear(&self) {
        self.entries().clear();
    }
}

/// Parse hooks that pause change tracking while a model is decoded.
pub fn backing_store_parse_hooks() -> ParseHooks {
    ParseHooks::new()
        .with_before_assign(|model| {
            if let Some(store) = model.backing_store() {
                store.set_initialization_completed(false);
            }
        })
        .with_after_assign(|model| {
            if let Some(store) = model.backing_store() {
                store.set_initialization_completed(true);
            }
        })
}

/// Writer hooks that restrict output to changed values and emit explicit
/// nulls for values that were cleared.
pub fn backing_store_writer_hooks() -> WriterHooks {
    WriterHooks::new()
        .with_before_object(|model| {
            if let Some(store) = model.backing_store() {
                store.set_return_only_changed_values(true);
            }
        })
        .with_on_start_object(|model, writer| {
            if let Some(store) = model.backing_store() {
                for key in store.enumerate_keys_for_values_changed_to_null() {
                    writer.write_null_value(Some(key.as_str()))?;
                }
            }
            Ok(())
        })
        .with_after_object(|model| {
            if let Some(store) = model.backing_store() {
                store.set_return_only_changed_values(false);
                store.set_initialization_completed(true);
            }
        })
}

/// Wraps a [`ParseNodeFactory`] so decoded models start with a clean change set.
#[derive(Clone)]
pub struct BackingStoreParseNodeFactory {
    inner: Arc<dyn ParseNodeFactory>,
}

impl BackingStoreParseNodeFactory {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn ParseNodeFactory>) -> Self {
        Self { inner }
    }
}

impl ParseNodeFactory for BackingStoreParseNodeFactory {
    fn valid_content_type(&self) -> &str {
        self.inner.valid_content_type()
    }

    fn get_parse_node_with_hooks(
        &self,
        content_type: &str,
        content: &[u8],
        hooks: ParseHooks,
    ) -> Result<Box<dyn ParseNode>> {
        self.inner.get_parse_node_with_hooks(
            content_type,
            content,
            backing_store_parse_hooks().chain(hooks),
        )
    }
}

/// Wraps a [`SerializationWriterFactory`] so models only write changed values.
#[derive(Clone)]
pub struct BackingStoreSerializationWriterFactory {
    inner: Arc<dyn SerializationWriterFactory>,
}

impl BackingStoreSerializationWriterFactory {
    /// Wraps `inner`.
    pub fn new(inner: Arc<dyn SerializationWriterFactory>) -> Self {
        Self { inner }
    }
}

impl SerializationWriterFactory for BackingStoreSerializationWriterFactory {
    fn valid_content_type(&self) -> &str {
        self.inner.valid_content_type()
    }

    fn get_serialization_writer(&self, content_type: &str) -> Result<Box<dyn SerializationWriter>> {
        let mut writer = self.inner.get_serialization_writer(content_type)?;
        let hooks = backing_store_writer_hooks().chain(writer.hooks().clone());
        writer.set_hooks(hooks);
        Ok(writer)
    }
}
