//! Model traits implemented by generated types.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::store::BackingStore;

use super::{AdditionalData, ParseNode, SerializationWriter};

/// Assigns one JSON field of a node to a model.
pub type FieldDeserializer<T> = Box<dyn Fn(&mut T, &dyn ParseNode) -> Result<()> + Send + Sync>;

/// A model that can be populated from a [`ParseNode`] and written to a
/// [`SerializationWriter`].
///
/// Decoding is driven by the map returned from [`field_deserializers`]: for
/// each non-null JSON field whose name is in the map, the matching entry is
/// invoked with the field's child node. Unknown fields go to
/// [`additional_data_mut`] when the model provides one.
///
/// [`field_deserializers`]: Parsable::field_deserializers
/// [`additional_data_mut`]: Parsable::additional_data_mut
pub trait Parsable: Send + Sync {
    /// Returns the field assigners for this model instance.
    ///
    /// A polymorphic model may return different maps depending on which
    /// variant `self` currently holds.
    fn field_deserializers(&self) -> FieldDeserializers<Self>
    where
        Self: Sized;

    /// Writes this model's fields to `writer`.
    fn serialize(&self, writer: &mut dyn SerializationWriter) -> Result<()>;

    /// Returns the bag of unknown properties, if the model keeps one.
    fn additional_data(&self) -> Option<&AdditionalData> {
        None
    }

    /// Mutable access to the bag of unknown properties.
    fn additional_data_mut(&mut self) -> Option<&mut AdditionalData> {
        None
    }

    /// Returns the model's backing store, if it records changes.
    fn backing_store(&self) -> Option<&dyn BackingStore> {
        None
    }

    /// Returns `true` for wrappers that merge several alternative types into
    /// one JSON value instead of opening their own object scope.
    fn is_composed_type_wrapper(&self) -> bool {
        false
    }
}

/// An enumeration with a serialized string form.
pub trait ValuedEnum {
    /// Returns the serialized form.
    fn value(&self) -> &str;

    /// Resolves a serialized form, returning `None` for unknown values.
    fn for_value(value: &str) -> Option<Self>
    where
        Self: Sized;
}

/// Field-name keyed map of [`FieldDeserializer`]s for a model type.
pub struct FieldDeserializers<T> {
    entries: HashMap<String, FieldDeserializer<T>>,
}

impl<T> Default for FieldDeserializers<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> fmt::Debug for FieldDeserializers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("FieldDeserializers")
            .field("fields", &keys)
            .finish()
    }
}

impl<T: 'static> FieldDeserializers<T> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the assigner for `name`, replacing any previous one.
    pub fn insert<F>(&mut self, name: impl Into<String>, assign: F)
    where
        F: Fn(&mut T, &dyn ParseNode) -> Result<()> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Box::new(assign));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<F>(mut self, name: impl Into<String>, assign: F) -> Self
    where
        F: Fn(&mut T, &dyn ParseNode) -> Result<()> + Send + Sync + 'static,
    {
        self.insert(name, assign);
        self
    }

    /// Adds every entry of `other`; entries of `other` win on conflict.
    pub fn extend(&mut self, other: FieldDeserializers<T>) {
        self.entries.extend(other.entries);
    }

    /// Returns the assigner for `name`.
    pub fn get(&self, name: &str) -> Option<&FieldDeserializer<T>> {
        self.entries.get(name)
    }

    /// Returns `true` if `name` has an assigner.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Returns the number of registered fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no fields are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the registered field names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Re-targets the assigners at an outer type `U` that holds a `T`.
    ///
    /// Used by polymorphic models: an enum over subtypes lifts the subtype's
    /// map through a projection that selects the active variant. Assigners
    /// are skipped when `project` returns `None`.
    pub fn lift<U, P>(self, project: P) -> FieldDeserializers<U>
    where
        U: 'static,
        P: for<'a> Fn(&'a mut U) -> Option<&'a mut T> + Send + Sync + 'static,
    {
        let project = Arc::new(project);
        let entries = self
            .entries
            .into_iter()
            .map(|(name, assign)| {
                let project = Arc::clone(&project);
                let lifted: FieldDeserializer<U> =
                    Box::new(move |outer: &mut U, node: &dyn ParseNode| match project(outer) {
                        Some(inner) => assign(inner, node),
                        None => Ok(()),
                    });
                (name, lifted)
            })
            .collect();
        FieldDeserializers { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::json::JsonParseNode;

    #[derive(Debug, Default, PartialEq)]
    struct Cat {
        lives: Option<i32>,
    }

    #[derive(Debug, PartialEq)]
    enum Pet {
        Cat(Cat),
        Rock,
    }

    fn as_cat(pet: &mut Pet) -> Option<&mut Cat> {
        match pet {
            Pet::Cat(cat) => Some(cat),
            Pet::Rock => None,
        }
    }

    fn cat_fields() -> FieldDeserializers<Cat> {
        FieldDeserializers::new().with("lives", |cat: &mut Cat, node| {
            cat.lives = node.get_int_value();
            Ok(())
        })
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut fields = cat_fields();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("lives"));
        assert!(!fields.contains_key("Lives"));

        fields.insert("name", |_: &mut Cat, _| Ok(()));
        let mut names: Vec<_> = fields.names().collect();
        names.sort();
        assert_eq!(names, vec!["lives", "name"]);
    }

    #[test]
    fn test_assigner_reads_node() {
        let fields = cat_fields();
        let json = JsonParseNode::new(serde_json::json!(9));
        let node: &dyn ParseNode = &json;
        let mut cat = Cat::default();

        (fields.get("lives").unwrap())(&mut cat, node).unwrap();
        assert_eq!(cat.lives, Some(9));
    }

    #[test]
    fn test_lift_targets_active_variant() {
        let lifted: FieldDeserializers<Pet> = cat_fields().lift(as_cat);
        let json = JsonParseNode::new(serde_json::json!(7));
        let node: &dyn ParseNode = &json;

        let mut pet = Pet::Cat(Cat::default());
        (lifted.get("lives").unwrap())(&mut pet, node).unwrap();
        assert_eq!(pet, Pet::Cat(Cat { lives: Some(7) }));

        let mut rock = Pet::Rock;
        (lifted.get("lives").unwrap())(&mut rock, node).unwrap();
        assert_eq!(rock, Pet::Rock);
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = cat_fields();
        base.extend(FieldDeserializers::new().with("lives", |cat: &mut Cat, _| {
            cat.lives = Some(-1);
            Ok(())
        }));
        let json = JsonParseNode::new(serde_json::json!(3));
        let node: &dyn ParseNode = &json;
        let mut cat = Cat::default();
        (base.get("lives").unwrap())(&mut cat, node).unwrap();
        assert_eq!(cat.lives, Some(-1));
    }
}
