//! Reference tables.
//!
//! The encoder keeps one [`RefTable`] per referenceable kind inside
//! [`ReferenceTables`]. The decoder mirrors them with [`OrderedTables`], where the
//! n-th registered value of a kind is found at index n.

use crate::format::REFERENCE_HEADER_LENGTH;
use crate::number::encode_integer;
use chrono::{DateTime, Utc};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Encode-side dedup table for one value kind.
#[derive(Debug, Clone)]
pub struct RefTable<K> {
    ids: HashMap<K, String>,
    count: i64,
}

impl<K> Default for RefTable<K> {
    fn default() -> Self {
        RefTable {
            ids: HashMap::new(),
            count: 0,
        }
    }
}

impl<K: Eq + Hash> RefTable<K> {
    /// Base-62 id previously assigned to `key`.
    pub fn lookup<Q>(&self, key: &Q) -> Option<&str>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.ids.get(key).map(String::as_str)
    }

    /// Registers `key` when a reference would be shorter than its first
    /// occurrence of `first_len` characters. Returns whether it was registered.
    pub fn try_register(&mut self, key: K, first_len: usize) -> bool {
        let id = encode_integer(self.count);
        if id.len() + REFERENCE_HEADER_LENGTH >= first_len {
            return false;
        }
        self.ids.insert(key, id);
        self.count += 1;
        true
    }

    /// Number of ids handed out so far.
    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// The five encode-side tables used for one top-level encode.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    pub strings: RefTable<String>,
    pub integers: RefTable<i64>,
    /// Keyed by the compressed float text, so equal encodings share an id.
    pub floats: RefTable<String>,
    pub dates: RefTable<i64>,
    pub lp_dates: RefTable<i64>,
}

impl ReferenceTables {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decode-side tables, appended in the order values are first read.
#[derive(Debug, Clone, Default)]
pub struct OrderedTables {
    pub strings: Vec<String>,
    pub integers: Vec<i64>,
    pub floats: Vec<f64>,
    pub dates: Vec<DateTime<Utc>>,
    pub lp_dates: Vec<DateTime<Utc>>,
}

impl OrderedTables {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut table: RefTable<String> = RefTable::default();
        assert!(table.try_register("alpha".to_string(), 7));
        assert!(table.try_register("beta".to_string(), 6));
        assert_eq!(table.lookup("alpha"), Some("0"));
        assert_eq!(table.lookup("beta"), Some("1"));
        assert_eq!(table.lookup("gamma"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cost_gate() {
        let mut table: RefTable<i64> = RefTable::default();
        // a two character reference does not beat a two character value
        assert!(!table.try_register(1000, 2));
        assert!(table.is_empty());
        assert!(table.try_register(1000, 3));
        assert_eq!(table.lookup(&1000), Some("0"));
    }

    #[test]
    fn test_gate_tracks_id_width() {
        let mut table: RefTable<i64> = RefTable::default();
        for key in 0..62 {
            assert!(table.try_register(key, 3));
        }
        // id 62 is "10", so three characters no longer pay off
        assert!(!table.try_register(62, 3));
        assert!(table.try_register(62, 4));
        assert_eq!(table.lookup(&62), Some("10"));
    }
}
