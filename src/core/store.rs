/// Per-session variable storage: global string properties, global integers,
/// and per-character integer variables.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::schema::character::CharacterId;
use crate::schema::property::ExposedProperty;

/// Where an integer variable lives: the global table or one character's
/// table. A node's declared scope resolves to this before reaching the
/// store (the session supplies the concrete character id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntScope {
    Global,
    Character(CharacterId),
}

/// The mutable half of a dialogue session.
///
/// Constructed fresh per session or restored from a snapshot; written only
/// by the mutation executor during traversal, read-only everywhere else.
/// One writer at a time per character is the host's contract; the store
/// itself does no locking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableStore {
    strings: FxHashMap<String, String>,
    globals: FxHashMap<String, i64>,
    characters: FxHashMap<CharacterId, FxHashMap<String, i64>>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the global string table from a graph's exposed properties.
    /// Existing values win, so restoring a snapshot is not clobbered.
    pub fn seed_properties(&mut self, properties: &[ExposedProperty]) {
        for prop in properties {
            self.strings
                .entry(prop.name.clone())
                .or_insert_with(|| prop.value.clone());
        }
    }

    /// The raw integer slot, if it exists.
    pub fn int(&self, scope: IntScope, name: &str) -> Option<i64> {
        match scope {
            IntScope::Global => self.globals.get(name).copied(),
            IntScope::Character(id) => self.characters.get(&id)?.get(name).copied(),
        }
    }

    /// Integer value with the documented 0 default. Absence is a logged
    /// diagnostic, never a failure.
    pub fn int_or_default(&self, scope: IntScope, name: &str) -> i64 {
        match self.int(scope, name) {
            Some(value) => value,
            None => {
                log::warn!("variable not found: '{name}' in {scope:?}, defaulting to 0");
                0
            }
        }
    }

    /// Global string property with the documented "" default.
    pub fn string(&self, name: &str) -> &str {
        self.strings.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn has_string(&self, name: &str) -> bool {
        self.strings.contains_key(name)
    }

    pub fn set_int(&mut self, scope: IntScope, name: &str, value: i64) {
        match scope {
            IntScope::Global => {
                self.globals.insert(name.to_string(), value);
            }
            IntScope::Character(id) => {
                self.characters
                    .entry(id)
                    .or_default()
                    .insert(name.to_string(), value);
            }
        }
    }

    pub fn set_string(&mut self, name: &str, value: impl Into<String>) {
        self.strings.insert(name.to_string(), value.into());
    }
}
