//! Case-insensitive multi-valued header collections.

use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};

/// A case-insensitive map from header names to sets of values.
///
/// Names are normalized to lowercase on insertion and lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl Headers {
    /// Creates an empty header collection.
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(name: &str) -> String {
        name.trim().to_ascii_lowercase()
    }

    /// Adds a value to the header, keeping any values already present.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .entry(Self::normalize(name))
            .or_default()
            .insert(value.into());
    }

    /// Adds a value only if the header has no values yet.
    ///
    /// Returns `true` if the value was added.
    pub fn try_add(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.entries.entry(Self::normalize(name)) {
            btree_map::Entry::Occupied(_) => false,
            btree_map::Entry::Vacant(slot) => {
                slot.insert(BTreeSet::from([value.into()]));
                true
            }
        }
    }

    /// Replaces all values of the header with a single value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries
            .insert(Self::normalize(name), BTreeSet::from([value.into()]));
    }

    /// Merges every header of `other` into this collection.
    pub fn add_all(&mut self, other: &Headers) {
        for (name, values) in &other.entries {
            self.entries
                .entry(name.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }

    /// Returns all values of the header.
    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.entries.get(&Self::normalize(name))
    }

    /// Returns the first value of the header in lexical order.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)?.iter().next().map(String::as_str)
    }

    /// Returns `true` if the header has at least one value.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(&Self::normalize(name))
    }

    /// Removes the header, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<BTreeSet<String>> {
        self.entries.remove(&Self::normalize(name))
    }

    /// Removes a single value; drops the header once it has no values left.
    pub fn remove_value(&mut self, name: &str, value: &str) -> bool {
        let key = Self::normalize(name);
        let Some(values) = self.entries.get_mut(&key) else {
            return false;
        };
        let removed = values.remove(value);
        if values.is_empty() {
            self.entries.remove(&key);
        }
        removed
    }

    /// Removes every header.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over header names and their values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a String, &'a BTreeSet<String>);
    type IntoIter = btree_map::Iter<'a, String, BTreeSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
