//! Diff engine
//!
//! Classifies a full desired set against a full observed set into a
//! [`ChangeSet`] of create, update and delete actions. Records that match
//! on both sides and compare equal produce no entry.
//!
//! ## Keying
//!
//! Entries are keyed by record name by default, ignoring the type. Two
//! desired records sharing a host but not a type (an `A` and a `TXT` at `@`)
//! therefore collide and the later one wins. [`DiffKeying::NameAndType`]
//! keys and matches on `(name, type)` instead.
//!
//! The algorithm is O(n·m). Managed zones hold tens of records.

use crate::compare::equal;
use crate::record::CanonicalRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What to do with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Record is missing at the provider
    Create,
    /// Record exists at the provider with different content
    Update,
    /// Record exists only at the provider
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// How change-set entries are keyed and how records are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKeying {
    /// Match and key on name only
    #[default]
    Name,
    /// Match and key on name and type
    NameAndType,
}

impl DiffKeying {
    /// Build the key for a record
    pub fn key_for(&self, record: &CanonicalRecord) -> ChangeKey {
        match self {
            DiffKeying::Name => ChangeKey::name(&record.name),
            DiffKeying::NameAndType => ChangeKey::name_and_type(&record.name, &record.record_type),
        }
    }

    /// Whether two records refer to the same slot
    pub fn matches(&self, a: &CanonicalRecord, b: &CanonicalRecord) -> bool {
        let same_name = a.name.eq_ignore_ascii_case(&b.name);
        match self {
            DiffKeying::Name => same_name,
            DiffKeying::NameAndType => {
                same_name && a.record_type.eq_ignore_ascii_case(&b.record_type)
            }
        }
    }
}

impl std::str::FromStr for DiffKeying {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(DiffKeying::Name),
            "name_and_type" | "name-and-type" => Ok(DiffKeying::NameAndType),
            other => Err(crate::Error::config(format!("Unknown diff keying: {}", other))),
        }
    }
}

/// Identity of a change-set entry. Names are compared case-insensitively,
/// so they are stored lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangeKey {
    name: String,
    record_type: Option<String>,
}

impl ChangeKey {
    /// Key on name only
    pub fn name(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            record_type: None,
        }
    }

    /// Key on name and type
    pub fn name_and_type(name: &str, record_type: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            record_type: Some(record_type.to_uppercase()),
        }
    }

    /// The (lower-cased) record name
    pub fn record_name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record_type {
            Some(record_type) => write!(f, "{}/{}", self.name, record_type),
            None => write!(f, "{}", self.name),
        }
    }
}

/// One classified change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetEntry {
    /// The record to create or update with, or the observed record to delete
    pub record: CanonicalRecord,
    /// The action to take
    pub action: Action,
}

impl ChangeSetEntry {
    /// Create `record` at the provider
    pub fn create(record: CanonicalRecord) -> Self {
        Self {
            record,
            action: Action::Create,
        }
    }

    /// Overwrite the provider's record with `record`
    pub fn update(record: CanonicalRecord) -> Self {
        Self {
            record,
            action: Action::Update,
        }
    }

    /// Remove the observed `record`
    pub fn delete(record: CanonicalRecord) -> Self {
        Self {
            record,
            action: Action::Delete,
        }
    }
}

/// The changes needed to converge observed state toward desired state.
///
/// Holds at most one entry per key. Iteration follows key order, which
/// carries no meaning beyond being stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: BTreeMap<ChangeKey, ChangeSetEntry>,
}

impl ChangeSet {
    /// Create an empty change-set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous entry with the same key
    pub fn insert(&mut self, key: ChangeKey, entry: ChangeSetEntry) -> Option<ChangeSetEntry> {
        self.entries.insert(key, entry)
    }

    /// Look up an entry by key
    pub fn get(&self, key: &ChangeKey) -> Option<&ChangeSetEntry> {
        self.entries.get(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing needs to change
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given action
    pub fn count(&self, action: Action) -> usize {
        self.entries.values().filter(|e| e.action == action).count()
    }

    /// Iterate over entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&ChangeKey, &ChangeSetEntry)> {
        self.entries.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = (ChangeKey, ChangeSetEntry);
    type IntoIter = std::collections::btree_map::IntoIter<ChangeKey, ChangeSetEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Compute the change-set converging `observed` toward `desired`.
///
/// 1. Each desired record is matched against the first observed record in
///    the same slot: no match creates it, a non-equal match updates it.
/// 2. Each observed record with no desired record in its slot is deleted.
///
/// Colliding keys are resolved by insertion order, last writer wins.
pub fn diff(
    desired: &[CanonicalRecord],
    observed: &[CanonicalRecord],
    keying: DiffKeying,
) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for d in desired {
        match observed.iter().find(|o| keying.matches(d, o)) {
            Some(o) if equal(d, o) => {}
            Some(_) => {
                changes.insert(keying.key_for(d), ChangeSetEntry::update(d.clone()));
            }
            None => {
                changes.insert(keying.key_for(d), ChangeSetEntry::create(d.clone()));
            }
        }
    }

    for o in observed {
        if !desired.iter().any(|d| keying.matches(d, o)) {
            changes.insert(keying.key_for(o), ChangeSetEntry::delete(o.clone()));
        }
    }

    changes
}
