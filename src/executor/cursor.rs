//! Opaque pagination cursors.
//!
//! A cursor encodes the last returned entity's position in the page
//! order: its sort-field value (or the fact that it had none), its
//! creation sequence and its id. Continuation resumes strictly after
//! that position, so a page boundary is stable under concurrent
//! insertions: an entity sorting after the cursor appears in a later
//! page, one sorting before it never reappears.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::query::{SortDirection, SortSpec};
use crate::store::{CreationSeq, Entity, EntityId};

use super::errors::{ExecutorError, ExecutorResult};
use super::sorter::ResultSorter;

/// Decoded cursor state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Sort-field value of the last returned entity, if sorted and present
    #[serde(rename = "k")]
    sort_key: Option<Value>,
    /// True when sorted but the last entity had no such field
    #[serde(rename = "m")]
    missing: bool,
    #[serde(rename = "s")]
    seq: CreationSeq,
    #[serde(rename = "i")]
    id: EntityId,
}

impl Cursor {
    /// Captures the page-order position of the last returned entity.
    pub fn for_entity(entity: &Entity, spec: Option<&SortSpec>) -> Self {
        let sort_value = spec.and_then(|s| entity.field(&s.field)).cloned();
        Self {
            missing: spec.is_some() && sort_value.is_none(),
            sort_key: sort_value,
            seq: entity.created_seq,
            id: entity.id,
        }
    }

    /// Encodes to the opaque wire token.
    pub fn encode(&self) -> String {
        // serialization of this struct cannot fail
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        STANDARD.encode(bytes)
    }

    /// Decodes a wire token.
    pub fn decode(token: &str) -> ExecutorResult<Self> {
        let bytes = STANDARD
            .decode(token)
            .map_err(|_| ExecutorError::InvalidCursor)?;
        serde_json::from_slice(&bytes).map_err(|_| ExecutorError::InvalidCursor)
    }

    /// True if `entity` sorts strictly after this cursor's position under
    /// `spec`; along a sorted result set the true values form a suffix.
    pub fn is_before(&self, entity: &Entity, spec: Option<&SortSpec>) -> bool {
        if let Some(spec) = spec {
            let cursor_value = if self.missing {
                None
            } else {
                self.sort_key.as_ref()
            };
            let ordering = ResultSorter::compare_field(entity.field(&spec.field), cursor_value);
            let ordering = match spec.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != std::cmp::Ordering::Equal {
                return ordering == std::cmp::Ordering::Greater;
            }
        }
        // page order is creation sequence descending, so "after" is older
        entity.created_seq < self.seq
    }
}
