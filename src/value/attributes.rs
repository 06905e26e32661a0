//! Typed key-value containers for hydrated records.
//!
//! Records are never accessed through dynamic member dispatch: every field
//! read or write goes through `get_attribute` / `set_attribute` /
//! `has_attribute`, and typed reads go through [`TryGetable`].

use crate::error::QueryError;
use crate::value::TryGetable;
use sea_query::Value;
use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

/// Attribute container keyed by column name
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attributes {
    values: BTreeMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`set_attribute`](Self::set_attribute)
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// Read an attribute as a Rust value
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Hydration` if the attribute is missing or cannot be
    /// extracted as `T`.
    pub fn get<T: TryGetable>(&self, name: &str) -> Result<T, QueryError> {
        let value = self
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| QueryError::Hydration(format!("missing attribute '{name}'")))?;
        T::try_get(value)
            .map_err(|e| QueryError::Hydration(format!("attribute '{name}': {e}")))
    }

    /// Like [`get`](Self::get), but moves the value out of the container
    pub fn take<T: TryGetable>(&mut self, name: &str) -> Result<T, QueryError> {
        let value = self
            .values
            .remove(name)
            .ok_or_else(|| QueryError::Hydration(format!("missing attribute '{name}'")))?;
        T::try_get(value)
            .map_err(|e| QueryError::Hydration(format!("attribute '{name}': {e}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl IntoIterator for Attributes {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.set_attribute(name, value);
        }
        attributes
    }
}

/// Schema-less record carrying exactly the columns a query returned
///
/// Produced for rows whose selection did not cover every column of the model,
/// so a partial row is never mistaken for a fully typed instance.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicRecord {
    attributes: Attributes,
}

impl DynamicRecord {
    pub fn new(attributes: Attributes) -> Self {
        Self { attributes }
    }

    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }
}

impl Deref for DynamicRecord {
    type Target = Attributes;

    fn deref(&self) -> &Attributes {
        &self.attributes
    }
}

impl DerefMut for DynamicRecord {
    fn deref_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}
