use crate::projects::settings::MINIMUM_STRING_TABLE_CAPACITY;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// A unique identifier for an interned symbol or file name.
/// Symbols are compared by this ID everywhere in the optimizer, so two symbols are the same
/// binding exactly when they intern to the same string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    pub fn from_u32(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for StringId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StringId({})", self.0)
    }
}

/// Stores every symbol and file name of a compilation unit once.
///
/// - Vec<Box<str>> for O(1) ID → string resolution
/// - FxHashMap<Box<str>, StringId> for O(1) string → ID lookup while interning
///
/// Serialized as the plain list of strings; the reverse map is rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<Box<str>>", into = "Vec<Box<str>>")]
pub struct StringTable {
    strings: Vec<Box<str>>,
    string_to_id: FxHashMap<Box<str>, StringId>,
}

impl StringTable {
    pub fn new() -> Self {
        Self {
            strings: Vec::with_capacity(MINIMUM_STRING_TABLE_CAPACITY),
            string_to_id: FxHashMap::default(),
        }
    }

    /// Intern a string slice, returning its unique ID.
    /// If the string already exists, returns the existing ID.
    #[inline]
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&existing_id) = self.string_to_id.get(s) {
            return existing_id;
        }

        self.intern_new(s)
    }

    #[cold]
    #[inline(never)]
    fn intern_new(&mut self, s: &str) -> StringId {
        let new_id = StringId(self.strings.len() as u32);
        let boxed: Box<str> = s.into();

        self.string_to_id.insert(boxed.clone(), new_id);
        self.strings.push(boxed);

        new_id
    }

    /// Resolve an interned string ID back to its string content.
    /// IDs from another table resolve to a placeholder rather than panicking,
    /// since diagnostics may be printed against the wrong unit after a failed batch.
    #[inline]
    pub fn resolve(&self, id: StringId) -> &str {
        self.try_resolve(id).unwrap_or("<unknown>")
    }

    #[inline]
    pub fn try_resolve(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(|s| s.as_ref())
    }

    /// Check if a string is already interned without interning it.
    #[inline]
    pub fn get_existing(&self, s: &str) -> Option<StringId> {
        self.string_to_id.get(s).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Box<str>>> for StringTable {
    fn from(strings: Vec<Box<str>>) -> Self {
        let mut table = Self::new();
        for string in strings {
            table.intern(&string);
        }
        table
    }
}

impl From<StringTable> for Vec<Box<str>> {
    fn from(table: StringTable) -> Self {
        table.strings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_name_twice_returns_the_same_id() {
        let mut table = StringTable::new();
        let first = table.intern("counter");
        let second = table.intern("counter");
        let other = table.intern("total");

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(table.resolve(other), "total");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn deserialized_table_keeps_ids_stable() {
        let mut table = StringTable::new();
        let x = table.intern("x");
        let y = table.intern("y");

        let json = serde_json::to_string(&table).expect("table should serialize");
        let restored: StringTable = serde_json::from_str(&json).expect("table should deserialize");

        assert_eq!(restored.get_existing("x"), Some(x));
        assert_eq!(restored.get_existing("y"), Some(y));
        assert_eq!(restored.resolve(StringId::from_u32(99)), "<unknown>");
    }
}
