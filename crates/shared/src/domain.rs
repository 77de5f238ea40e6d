use std::{
    collections::HashSet,
    convert::Infallible,
    fmt,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{Result, SelectionError},
    protocol::Coverage,
};

/// Scalar value naming one record for selection purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Text(String),
}

impl Identifier {
    /// Converts a JSON scalar into an identifier. Whole-number floats such as
    /// `5.0` map to the integer they spell. Fractional numbers, integers
    /// outside the `i64` range, null, booleans, arrays and objects carry no
    /// identity.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(whole_f64_to_i64))
                .map(Identifier::Int),
            Value::String(s) => Some(Identifier::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Identifier::Int(v) => Value::from(*v),
            Identifier::Text(v) => Value::from(v.as_str()),
        }
    }
}

fn whole_f64_to_i64(value: f64) -> Option<i64> {
    // 2^63 is the first float past i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    (value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)).then_some(value as i64)
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Int(v) => write!(f, "{v}"),
            Identifier::Text(v) => f.write_str(v),
        }
    }
}

impl FromStr for Identifier {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(v) => Identifier::Int(v),
            Err(_) => Identifier::Text(s.to_string()),
        })
    }
}

impl From<i64> for Identifier {
    fn from(value: i64) -> Self {
        Identifier::Int(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Identifier::Text(value.to_string())
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Identifier::Text(value)
    }
}

/// Namespacing key for one selection set inside a persistence provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SelectionError::Configuration(
                "state key must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StateKey {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Ordered set of selected identifiers.
///
/// Insertion order is kept so the persisted sequence stays stable across
/// round-trips. Inserting an existing identifier or removing an absent one
/// leaves the set untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Identifier>", into = "Vec<Identifier>")]
pub struct SelectionSet {
    order: Vec<Identifier>,
    members: HashSet<Identifier>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.members.contains(id)
    }

    /// Appends `id` when absent. Returns whether the set changed.
    pub fn insert(&mut self, id: Identifier) -> bool {
        if self.members.contains(&id) {
            return false;
        }
        self.members.insert(id.clone());
        self.order.push(id);
        true
    }

    /// Removes `id` when present. Returns whether the set changed.
    pub fn remove(&mut self, id: &Identifier) -> bool {
        if !self.members.remove(id) {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|existing| existing == id) {
            self.order.remove(pos);
        }
        true
    }

    /// Adds `id` if absent, removes it otherwise. Returns `true` when the
    /// identifier is selected afterwards.
    pub fn toggle(&mut self, id: Identifier) -> bool {
        if self.remove(&id) {
            false
        } else {
            self.insert(id)
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Identifier> {
        self.order.iter()
    }

    pub fn as_slice(&self) -> &[Identifier] {
        &self.order
    }

    pub fn into_vec(self) -> Vec<Identifier> {
        self.order
    }

    /// Set equality, ignoring order.
    pub fn same_members(&self, other: &SelectionSet) -> bool {
        self.members == other.members
    }

    /// `true` iff `ids` is non-empty and every entry is a selected identifier.
    /// Stops at the first entry that is missing or has no identity.
    pub fn contains_all<I>(&self, ids: I) -> bool
    where
        I: IntoIterator<Item = Option<Identifier>>,
    {
        let mut seen_any = false;
        for id in ids {
            seen_any = true;
            match id {
                Some(id) if self.contains(&id) => {}
                _ => return false,
            }
        }
        seen_any
    }

    pub fn coverage<I>(&self, ids: I) -> Coverage
    where
        I: IntoIterator<Item = Option<Identifier>>,
    {
        let mut selected = 0usize;
        let mut total = 0usize;
        for id in ids {
            total += 1;
            if id.is_some_and(|id| self.contains(&id)) {
                selected += 1;
            }
        }

        if total > 0 && selected == total {
            Coverage::All
        } else if selected == 0 {
            Coverage::None
        } else {
            Coverage::Partial
        }
    }
}

impl PartialEq for SelectionSet {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for SelectionSet {}

impl From<Vec<Identifier>> for SelectionSet {
    fn from(value: Vec<Identifier>) -> Self {
        value.into_iter().collect()
    }
}

impl From<SelectionSet> for Vec<Identifier> {
    fn from(value: SelectionSet) -> Self {
        value.order
    }
}

impl FromIterator<Identifier> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = Identifier>>(iter: T) -> Self {
        let mut set = SelectionSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl<'a> IntoIterator for &'a SelectionSet {
    type Item = &'a Identifier;
    type IntoIter = std::slice::Iter<'a, Identifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}

/// Field lookup exposed by records of a visible collection.
///
/// JSON records follow [`Identifier::from_json`]: `{"id": 5.0}` and
/// `{"id": 5}` name the same record.
pub trait Record {
    fn field(&self, name: &str) -> Option<Identifier>;
}

impl Record for Value {
    fn field(&self, name: &str) -> Option<Identifier> {
        self.get(name).and_then(Identifier::from_json)
    }
}

impl Record for Map<String, Value> {
    fn field(&self, name: &str) -> Option<Identifier> {
        self.get(name).and_then(Identifier::from_json)
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
