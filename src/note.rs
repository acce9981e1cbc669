//! Owned key/value notes attached to user and client sessions.

use std::collections::BTreeMap;

use uuid::Uuid;

/// A single note owned by exactly one session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoteEntry {
    root: Option<Uuid>,
    name: String,
    value: String,
}

impl NoteEntry {
    pub(crate) fn new(root: Option<Uuid>, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            root,
            name: name.into(),
            value: value.into(),
        }
    }

    /// Identifier of the owning session, if it has one yet.
    pub fn root(&self) -> Option<Uuid> {
        self.root
    }

    /// Note name, unique within its owner.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Note value, never blank.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Notes owned by one session, unique by name.
///
/// Blank names and blank values are never stored: writing one removes the
/// existing entry instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NoteSet {
    entries: Vec<NoteEntry>,
}

impl NoteSet {
    /// Returns a detached copy of all notes.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.value.clone()))
            .collect()
    }

    /// Value of the note named `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(NoteEntry::value)
    }

    /// Removes any note named `name`, then stores `value` if it is not blank.
    pub fn set(&mut self, root: Option<Uuid>, name: &str, value: Option<&str>) {
        self.remove(name);
        match value {
            Some(value) if !name.trim().is_empty() && !value.trim().is_empty() => {
                self.entries.push(NoteEntry::new(root, name, value));
            }
            _ => {}
        }
    }

    /// Clears the set and stores every non-blank entry of `notes`.
    pub fn replace_all<I, K, V>(&mut self, root: Option<Uuid>, notes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.entries.clear();
        for (name, value) in notes {
            self.set(root, name.as_ref(), Some(value.as_ref()));
        }
    }

    /// Removes the note named `name`. Returns whether one existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        self.entries.len() != before
    }

    pub(crate) fn reparent(&mut self, root: Option<Uuid>) {
        for entry in &mut self.entries {
            entry.root = root;
        }
    }

    /// Iterates over the stored entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &NoteEntry> {
        self.entries.iter()
    }

    /// Number of stored notes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
