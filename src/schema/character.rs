use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Newtype wrapper for character ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub u64);

/// Name-to-id resolution for speaker references, injected at load time.
///
/// Hosts keep whatever character registry they like; the loader needs only
/// this one capability. A name that fails to resolve leaves the speech
/// anonymous and is reported as a diagnostic, never a load failure.
pub trait CharacterLookup {
    fn lookup(&self, name: &str) -> Option<CharacterId>;
}

/// A plain name-to-id map, sufficient for hosts, tools, and tests.
#[derive(Debug, Clone, Default)]
pub struct CharacterDirectory {
    characters: FxHashMap<String, CharacterId>,
}

impl CharacterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, id: CharacterId) {
        self.characters.insert(name.into(), id);
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}

impl CharacterLookup for CharacterDirectory {
    fn lookup(&self, name: &str) -> Option<CharacterId> {
        self.characters.get(name).copied()
    }
}

/// Lookup that resolves nothing; every speaker stays anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCharacters;

impl CharacterLookup for NoCharacters {
    fn lookup(&self, _name: &str) -> Option<CharacterId> {
        None
    }
}
