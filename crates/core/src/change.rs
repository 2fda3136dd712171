//! Change operations and the typed before/after pair of a logged mutation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::snapshot::EntitySnapshot;

/// Kind of mutation recorded in the change history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
}

impl ChangeOperation {
    /// Stored representation in `change_history.operation`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// The operation that reverses this one.
    pub fn inverse(self) -> Self {
        match self {
            Self::Create => Self::Delete,
            Self::Update => Self::Update,
            Self::Delete => Self::Create,
        }
    }
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeOperation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(CoreError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Before/after state of one mutation.
///
/// The variant shape carries the payload invariant: a create has no
/// "before", a delete has no "after", an update has both.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSet {
    Create {
        after: EntitySnapshot,
    },
    Update {
        before: EntitySnapshot,
        after: EntitySnapshot,
    },
    Delete {
        before: EntitySnapshot,
    },
}

impl ChangeSet {
    pub fn operation(&self) -> ChangeOperation {
        match self {
            Self::Create { .. } => ChangeOperation::Create,
            Self::Update { .. } => ChangeOperation::Update,
            Self::Delete { .. } => ChangeOperation::Delete,
        }
    }

    /// Rebuild a change set from a stored row.
    ///
    /// Fails with [`CoreError::InvalidPayload`] when the payloads present do
    /// not match the operation.
    pub fn from_parts(
        operation: ChangeOperation,
        before: Option<EntitySnapshot>,
        after: Option<EntitySnapshot>,
    ) -> Result<Self, CoreError> {
        match (operation, before, after) {
            (ChangeOperation::Create, None, Some(after)) => Ok(Self::Create { after }),
            (ChangeOperation::Update, Some(before), Some(after)) => {
                Ok(Self::Update { before, after })
            }
            (ChangeOperation::Delete, Some(before), None) => Ok(Self::Delete { before }),
            (op, before, after) => Err(CoreError::InvalidPayload(format!(
                "{op} record has before={} after={}",
                presence(before.is_some()),
                presence(after.is_some()),
            ))),
        }
    }

    /// Split into `(before, after)` payloads for storage.
    pub fn into_payloads(self) -> (Option<EntitySnapshot>, Option<EntitySnapshot>) {
        match self {
            Self::Create { after } => (None, Some(after)),
            Self::Update { before, after } => (Some(before), Some(after)),
            Self::Delete { before } => (Some(before), None),
        }
    }

    /// The change set that, once applied, reverses this one.
    pub fn inverse(self) -> Self {
        match self {
            Self::Create { after } => Self::Delete { before: after },
            Self::Update { before, after } => Self::Update {
                before: after,
                after: before,
            },
            Self::Delete { before } => Self::Create { after: before },
        }
    }
}

fn presence(present: bool) -> &'static str {
    if present {
        "present"
    } else {
        "null"
    }
}
