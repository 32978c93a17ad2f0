//! Ordered per-field index structure.
//!
//! A `FieldTree` maps index keys to postings lists. Keys order as
//! Bool < Num < Str. All numbers share one key class (f64 in total-order
//! bit representation) because the query language compares i64 and f64
//! values as one numeric class; separate integer and float keys would
//! make an equality lookup miss numerically-equal values stored in the
//! other representation. Postings within one key are kept sorted by
//! creation sequence descending (newest first), matching the engine's
//! default result order.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde_json::Value;

use crate::store::{CreationSeq, EntityId};

/// An orderable key derived from an entity field value.
///
/// Null, arrays and nested objects produce no key (those values are not
/// indexable; comparisons against them never match anyway).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Bool(bool),
    /// f64 in total-order bit representation
    Num(u64),
    Str(String),
}

impl IndexKey {
    pub fn from_bool(v: bool) -> Self {
        IndexKey::Bool(v)
    }

    /// Encodes an f64 so that unsigned bit order equals numeric order.
    pub fn from_num(v: f64) -> Self {
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Num(ordered)
    }

    pub fn from_str(v: impl Into<String>) -> Self {
        IndexKey::Str(v.into())
    }

    /// Derives a key from a stored value, if the value is indexable.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(IndexKey::from_bool(*b)),
            Value::Number(n) => n.as_f64().map(IndexKey::from_num),
            Value::String(s) => Some(IndexKey::from_str(s.as_str())),
            _ => None,
        }
    }

    /// True for the numeric key class.
    pub fn is_num(&self) -> bool {
        matches!(self, IndexKey::Num(_))
    }
}

/// One index entry: the entity it points at plus the creation sequence
/// used to break ties within a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    pub seq: CreationSeq,
    pub id: EntityId,
}

impl Posting {
    pub fn new(seq: CreationSeq, id: EntityId) -> Self {
        Self { seq, id }
    }

    /// Postings order newest-first within a key; id breaks exact ties.
    fn sort_key(&self) -> (std::cmp::Reverse<CreationSeq>, EntityId) {
        (std::cmp::Reverse(self.seq), self.id)
    }
}

/// A single field's ordered index.
#[derive(Debug, Default)]
pub struct FieldTree {
    tree: BTreeMap<IndexKey, Vec<Posting>>,
}

impl FieldTree {
    pub fn new() -> Self {
        Self {
            tree: BTreeMap::new(),
        }
    }

    /// Inserts a posting under a key, keeping the postings list ordered.
    /// Re-inserting the same posting is a no-op.
    pub fn insert(&mut self, key: IndexKey, posting: Posting) {
        let postings = self.tree.entry(key).or_default();
        match postings.binary_search_by_key(&posting.sort_key(), Posting::sort_key) {
            Ok(_) => {}
            Err(pos) => postings.insert(pos, posting),
        }
    }

    /// Removes the posting for `id` under a key; drops the key when its
    /// postings list empties.
    pub fn remove(&mut self, key: &IndexKey, id: &EntityId) {
        if let Some(postings) = self.tree.get_mut(key) {
            postings.retain(|p| p.id != *id);
            if postings.is_empty() {
                self.tree.remove(key);
            }
        }
    }

    /// All postings for an exact key.
    pub fn lookup_eq(&self, key: &IndexKey) -> Vec<Posting> {
        self.tree.get(key).cloned().unwrap_or_default()
    }

    /// All postings in a key range; bounds may be exclusive for the
    /// strict comparison operators.
    pub fn lookup_range(&self, lower: Bound<&IndexKey>, upper: Bound<&IndexKey>) -> Vec<Posting> {
        let mut out = Vec::new();
        for postings in self.tree.range((lower, upper)).map(|(_, p)| p) {
            out.extend(postings.iter().copied());
        }
        out
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Total number of postings.
    pub fn posting_count(&self) -> usize {
        self.tree.values().map(Vec::len).sum()
    }
}
