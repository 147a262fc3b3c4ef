use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use thiserror::Error;

use crate::{EntityRef, Vec3};

/// A typed blackboard value.
///
/// The variant is part of the value: a persisted `Int(3)` comes back as
/// `Int(3)`, never as `Number(3.0)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BbValue {
    Bool(bool),
    Int(i64),
    Number(f64),
    Text(String),
    Vec3(Vec3),
    Entity(EntityRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BbKind {
    Bool,
    Int,
    Number,
    Text,
    Vec3,
    Entity,
}

impl fmt::Display for BbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BbKind::Bool => "bool",
            BbKind::Int => "int",
            BbKind::Number => "number",
            BbKind::Text => "text",
            BbKind::Vec3 => "vec3",
            BbKind::Entity => "entity",
        };
        f.write_str(name)
    }
}

impl BbValue {
    pub fn kind(&self) -> BbKind {
        match self {
            BbValue::Bool(_) => BbKind::Bool,
            BbValue::Int(_) => BbKind::Int,
            BbValue::Number(_) => BbKind::Number,
            BbValue::Text(_) => BbKind::Text,
            BbValue::Vec3(_) => BbKind::Vec3,
            BbValue::Entity(_) => BbKind::Entity,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BbValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BbValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric read. Integers widen to `f64` so `speed: 2` and `speed: 2.0`
    /// read the same way.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BbValue::Number(v) => Some(*v),
            BbValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// False for a NaN or infinite number, or a vector with such a component.
    pub fn is_finite(&self) -> bool {
        match self {
            BbValue::Number(v) => v.is_finite(),
            BbValue::Vec3(v) => v.x.is_finite() && v.y.is_finite() && v.z.is_finite(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BbValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            BbValue::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityRef> {
        match self {
            BbValue::Entity(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for BbValue {
    fn from(value: bool) -> Self {
        BbValue::Bool(value)
    }
}

impl From<i64> for BbValue {
    fn from(value: i64) -> Self {
        BbValue::Int(value)
    }
}

impl From<i32> for BbValue {
    fn from(value: i32) -> Self {
        BbValue::Int(value as i64)
    }
}

impl From<f64> for BbValue {
    fn from(value: f64) -> Self {
        BbValue::Number(value)
    }
}

impl From<f32> for BbValue {
    fn from(value: f32) -> Self {
        BbValue::Number(value as f64)
    }
}

impl From<String> for BbValue {
    fn from(value: String) -> Self {
        BbValue::Text(value)
    }
}

impl From<&str> for BbValue {
    fn from(value: &str) -> Self {
        BbValue::Text(value.to_string())
    }
}

impl From<Vec3> for BbValue {
    fn from(value: Vec3) -> Self {
        BbValue::Vec3(value)
    }
}

impl From<EntityRef> for BbValue {
    fn from(value: EntityRef) -> Self {
        BbValue::Entity(value)
    }
}

/// Rust types that can live behind a typed [`BbKey`].
pub trait BbType: Sized + 'static {
    const KIND: BbKind;

    fn from_value(value: &BbValue) -> Option<Self>;

    fn into_value(self) -> BbValue;
}

impl BbType for bool {
    const KIND: BbKind = BbKind::Bool;

    fn from_value(value: &BbValue) -> Option<Self> {
        value.as_bool()
    }

    fn into_value(self) -> BbValue {
        BbValue::Bool(self)
    }
}

impl BbType for i64 {
    const KIND: BbKind = BbKind::Int;

    fn from_value(value: &BbValue) -> Option<Self> {
        value.as_i64()
    }

    fn into_value(self) -> BbValue {
        BbValue::Int(self)
    }
}

impl BbType for f64 {
    const KIND: BbKind = BbKind::Number;

    /// Strict: an `Int` entry is a mismatch here. Use [`BbValue::as_f64`]
    /// for a widening read.
    fn from_value(value: &BbValue) -> Option<Self> {
        match value {
            BbValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    fn into_value(self) -> BbValue {
        BbValue::Number(self)
    }
}

impl BbType for String {
    const KIND: BbKind = BbKind::Text;

    fn from_value(value: &BbValue) -> Option<Self> {
        value.as_str().map(str::to_string)
    }

    fn into_value(self) -> BbValue {
        BbValue::Text(self)
    }
}

impl BbType for Vec3 {
    const KIND: BbKind = BbKind::Vec3;

    fn from_value(value: &BbValue) -> Option<Self> {
        value.as_vec3()
    }

    fn into_value(self) -> BbValue {
        BbValue::Vec3(self)
    }
}

impl BbType for EntityRef {
    const KIND: BbKind = BbKind::Entity;

    fn from_value(value: &BbValue) -> Option<Self> {
        value.as_entity()
    }

    fn into_value(self) -> BbValue {
        BbValue::Entity(self)
    }
}

/// A named, typed blackboard slot.
///
/// ```
/// use ai_core::{BbKey, Blackboard, Vec3};
///
/// const GOAL: BbKey<Vec3> = BbKey::new("goal");
///
/// let mut bb = Blackboard::new();
/// bb.set(GOAL, Vec3::new(1.0, 0.0, 2.0));
/// assert_eq!(bb.get(GOAL), Some(Vec3::new(1.0, 0.0, 2.0)));
/// ```
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }
}

#[derive(Debug, Error)]
pub enum BlackboardError {
    #[error("blackboard key `{key}` holds a {found} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: BbKind,
        found: BbKind,
    },

    #[error("blackboard key `{key}` holds a non-finite number, which JSON cannot represent")]
    NonFinite { key: String },

    #[error("blackboard snapshot could not be encoded or decoded: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-agent key/value store shared by every node the agent visits.
///
/// Keys iterate in sorted order, so saves and debug dumps are deterministic.
/// Reads never fail hard: a missing key or a value of another type is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blackboard {
    values: BTreeMap<String, BbValue>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn contains<T: BbType>(&self, key: BbKey<T>) -> bool {
        self.get(key).is_some()
    }

    pub fn get_value(&self, key: &str) -> Option<&BbValue> {
        self.values.get(key)
    }

    pub fn get_value_mut(&mut self, key: &str) -> Option<&mut BbValue> {
        self.values.get_mut(key)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<BbValue>) -> Option<BbValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove_value(&mut self, key: &str) -> Option<BbValue> {
        self.values.remove(key)
    }

    pub fn get<T: BbType>(&self, key: BbKey<T>) -> Option<T> {
        self.values.get(key.name).and_then(T::from_value)
    }

    pub fn get_or<T: BbType>(&self, key: BbKey<T>, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Like [`Blackboard::get`], but tells a missing key apart from a type mismatch.
    pub fn try_get<T: BbType>(&self, key: BbKey<T>) -> Result<Option<T>, BlackboardError> {
        let Some(value) = self.values.get(key.name) else {
            return Ok(None);
        };
        match T::from_value(value) {
            Some(v) => Ok(Some(v)),
            None => Err(BlackboardError::TypeMismatch {
                key: key.name.to_string(),
                expected: T::KIND,
                found: value.kind(),
            }),
        }
    }

    pub fn set<T: BbType>(&mut self, key: BbKey<T>, value: T) {
        self.values.insert(key.name.to_string(), value.into_value());
    }

    /// Remove the value only when it has the key's type.
    pub fn remove<T: BbType>(&mut self, key: BbKey<T>) -> Option<T> {
        let value = T::from_value(self.values.get(key.name)?)?;
        self.values.remove(key.name);
        Some(value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BbValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Capture every key, type and value.
    pub fn save(&self) -> BlackboardSnapshot {
        BlackboardSnapshot {
            entries: self
                .values
                .iter()
                .map(|(key, value)| BlackboardEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    /// Rebuild a blackboard from a snapshot. Later duplicates win.
    pub fn load(snapshot: &BlackboardSnapshot) -> Self {
        let mut bb = Self::new();
        bb.restore(snapshot);
        bb
    }

    /// Replace the whole contents with `snapshot`.
    pub fn restore(&mut self, snapshot: &BlackboardSnapshot) {
        self.values.clear();
        self.merge(snapshot);
    }

    /// Overlay `snapshot` onto the current contents.
    pub fn merge(&mut self, snapshot: &BlackboardSnapshot) {
        for entry in &snapshot.entries {
            self.values.insert(entry.key.clone(), entry.value.clone());
        }
    }

    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn to_json(&self) -> Result<String, BlackboardError> {
        if let Some(key) = self.values.iter().find_map(|(k, v)| (!v.is_finite()).then_some(k)) {
            return Err(BlackboardError::NonFinite { key: key.clone() });
        }
        Ok(serde_json::to_string(&self.save())?)
    }

    #[cfg(feature = "serde")]
    #[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
    pub fn from_json(json: &str) -> Result<Self, BlackboardError> {
        let snapshot: BlackboardSnapshot = serde_json::from_str(json)?;
        Ok(Self::load(&snapshot))
    }
}

/// Persisted form of a [`Blackboard`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlackboardSnapshot {
    #[cfg_attr(feature = "serde", serde(default))]
    pub entries: Vec<BlackboardEntry>,
}

impl BlackboardSnapshot {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlackboardEntry {
    pub key: String,
    pub value: BbValue,
}
