//! Serialized entity state used by both history logs.
//!
//! A snapshot is a flat JSON object of the entity's scalar columns. Aggregate
//! entities (a purchase order and its line items, a quote and its lines)
//! additionally embed their child rows, in order, under [`CHILDREN_KEY`].
//! Captured snapshots carry a format version under [`VERSION_KEY`]; caller
//! supplied partial payloads may omit it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Current payload format version written by capture.
pub const SNAPSHOT_VERSION: u64 = 1;

/// Reserved key holding the format version.
pub const VERSION_KEY: &str = "__v";

/// Reserved key holding the ordered list of child rows.
pub const CHILDREN_KEY: &str = "__children";

/// Returns `true` for keys the payload format reserves for itself.
pub fn is_reserved_key(key: &str) -> bool {
    key.starts_with("__")
}

/// One child row of an aggregate snapshot.
pub type ChildRow = Map<String, Value>;

/// Point-in-time state of one logical entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "Value", try_from = "Value")]
pub struct EntitySnapshot {
    fields: Map<String, Value>,
    /// `None` for non-aggregates. `Some(vec![])` is an aggregate that had
    /// no child rows, which restore must reproduce.
    children: Option<Vec<ChildRow>>,
}

impl EntitySnapshot {
    /// Build a snapshot from scalar fields only.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            children: None,
        }
    }

    /// Attach the child rows of an aggregate entity.
    pub fn with_children(mut self, children: Vec<ChildRow>) -> Self {
        self.children = Some(children);
        self
    }

    /// Parse a snapshot from its JSON form.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let Value::Object(mut map) = value else {
            return Err(CoreError::InvalidPayload(
                "snapshot must be a JSON object".to_string(),
            ));
        };

        if let Some(version) = map.remove(VERSION_KEY) {
            match version.as_u64() {
                Some(v) if v <= SNAPSHOT_VERSION => {}
                _ => {
                    return Err(CoreError::InvalidPayload(format!(
                        "unsupported snapshot version {version}"
                    )))
                }
            }
        }

        let children = match map.remove(CHILDREN_KEY) {
            None | Some(Value::Null) => None,
            Some(Value::Array(rows)) => {
                let mut out = Vec::with_capacity(rows.len());
                for row in rows {
                    match row {
                        Value::Object(row) => out.push(row),
                        other => {
                            return Err(CoreError::InvalidPayload(format!(
                                "child rows must be objects, got {other}"
                            )))
                        }
                    }
                }
                Some(out)
            }
            Some(other) => {
                return Err(CoreError::InvalidPayload(format!(
                    "'{CHILDREN_KEY}' must be an array, got {other}"
                )))
            }
        };

        if let Some(key) = map.keys().find(|k| is_reserved_key(k)) {
            return Err(CoreError::InvalidPayload(format!(
                "unknown reserved key '{key}'"
            )));
        }

        Ok(Self {
            fields: map,
            children,
        })
    }

    /// Encode the snapshot, stamping the current format version.
    pub fn to_value(&self) -> Value {
        Value::from(self.clone())
    }

    /// Scalar fields of the parent row.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Look up a single scalar field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set (or overwrite) a scalar field.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Child rows, if this is an aggregate snapshot.
    pub fn children(&self) -> Option<&[ChildRow]> {
        self.children.as_deref()
    }

    /// `true` when there is nothing to restore.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.children.as_ref().map_or(true, |c| c.is_empty())
    }
}

impl From<EntitySnapshot> for Value {
    fn from(snapshot: EntitySnapshot) -> Self {
        let mut map = snapshot.fields;
        map.insert(VERSION_KEY.to_string(), Value::from(SNAPSHOT_VERSION));
        if let Some(children) = snapshot.children {
            map.insert(
                CHILDREN_KEY.to_string(),
                Value::Array(children.into_iter().map(Value::Object).collect()),
            );
        }
        Value::Object(map)
    }
}

impl TryFrom<Value> for EntitySnapshot {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
