//! Field-level diffing between two states of an entity
//!
//! Both states arrive as canonical ordered field lists. Fields are walked in
//! the order of the NEW state; a field absent from the old state is treated
//! as null. Values are compared semantically, so `1` and `1.0` are equal.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::error::TrailResult;
use crate::models::Entity;

/// Fields that change as a side effect of persistence rather than business intent
pub const DEFAULT_METADATA_FIELDS: &[&str] =
    &["id", "createdTimestamp", "updatedTimestamp", "version"];

/// A single changed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field_name: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// Ordered set of field changes between two states
///
/// Serialized as `{ "<field>": { "old": .., "new": .. }, .. }` with keys in
/// field declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field_name: impl Into<String>, old_value: Value, new_value: Value) {
        self.changes.push(FieldChange {
            field_name: field_name.into(),
            old_value,
            new_value,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldChange> {
        self.changes.iter()
    }

    /// Look up the change for one field
    pub fn get(&self, field_name: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field_name == field_name)
    }

    /// Changes to fields that are not metadata
    pub fn business_changes<'a>(
        &'a self,
        metadata: &'a MetadataFields,
    ) -> impl Iterator<Item = &'a FieldChange> + 'a {
        self.changes
            .iter()
            .filter(move |c| !metadata.contains(&c.field_name))
    }

    pub fn into_changes(self) -> Vec<FieldChange> {
        self.changes
    }
}

impl IntoIterator for ChangeSet {
    type Item = FieldChange;
    type IntoIter = std::vec::IntoIter<FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

#[derive(Serialize, Deserialize)]
struct ValueDelta {
    #[serde(default)]
    old: Value,
    #[serde(default)]
    new: Value,
}

impl Serialize for ChangeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.changes.len()))?;
        for change in &self.changes {
            map.serialize_entry(
                &change.field_name,
                &ValueDelta {
                    old: change.old_value.clone(),
                    new: change.new_value.clone(),
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChangeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChangeSetVisitor;

        impl<'de> Visitor<'de> for ChangeSetVisitor {
            type Value = ChangeSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to {old, new} pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ChangeSet, A::Error> {
                let mut set = ChangeSet::new();
                while let Some((field, delta)) = access.next_entry::<String, ValueDelta>()? {
                    set.push(field, delta.old, delta.new);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(ChangeSetVisitor)
    }
}

/// Names treated as metadata when summarizing changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFields(BTreeSet<String>);

impl MetadataFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, field_name: &str) -> bool {
        self.0.contains(field_name)
    }
}

impl Default for MetadataFields {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_FIELDS.iter().copied())
    }
}

/// Compute the changes from `old` to `new`
pub fn compute(old: &[(String, Value)], new: &[(String, Value)]) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for (name, new_value) in new {
        let old_value = old
            .iter()
            .find(|(old_name, _)| old_name == name)
            .map(|(_, v)| v)
            .unwrap_or(&Value::Null);

        if !values_equal(old_value, new_value) {
            changes.push(name.clone(), old_value.clone(), new_value.clone());
        }
    }

    changes
}

/// Compute the changes between two entity states
pub fn diff_entities<T: Entity>(old: &T, new: &T) -> TrailResult<ChangeSet> {
    Ok(compute(&old.to_fields()?, &new.to_fields()?))
}

/// Semantic equality of two field values
///
/// Numbers compare by value regardless of integer/float representation;
/// arrays and objects compare element-wise with the same rule.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(i), Some(j)) = (x.as_i64(), y.as_i64()) {
                return i == j;
            }
            if let (Some(i), Some(j)) = (x.as_u64(), y.as_u64()) {
                return i == j;
            }
            x.as_f64() == y.as_f64()
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}
