//! Entity model.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use uuid::Uuid;

/// Stable opaque entity identifier, assigned at creation.
pub type EntityId = Uuid;

/// Monotonically increasing commit version of one entity.
pub type Version = u64;

/// Collection-wide creation sequence number; the default sort key.
pub type CreationSeq = u64;

/// A schemaless entity: identifier, field map, creation sequence and
/// version. Immutable once constructed; mutation produces a new `Entity`
/// with the same id and creation sequence and a bumped version.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub created_seq: CreationSeq,
    pub version: Version,
    pub fields: Map<String, Value>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, created_seq: CreationSeq, fields: Map<String, Value>) -> Self {
        Self {
            id,
            created_seq,
            version: 1,
            fields,
        }
    }

    /// Looks up a field value; field names are case-sensitive.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns a copy with `changes` merged in and the version bumped.
    pub(crate) fn with_changes(&self, changes: &FieldChanges) -> Self {
        let mut fields = self.fields.clone();
        for (name, change) in changes {
            match change {
                FieldChange::Set(value) => {
                    fields.insert(name.clone(), value.clone());
                }
                FieldChange::Unset => {
                    fields.remove(name);
                }
            }
        }
        Self {
            id: self.id,
            created_seq: self.created_seq,
            version: self.version + 1,
            fields,
        }
    }
}

/// One field-level change in a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Set(Value),
    Unset,
}

/// A mutation: field name to change, merged onto the current body.
///
/// Ordered map so mutation processing is deterministic.
pub type FieldChanges = BTreeMap<String, FieldChange>;
