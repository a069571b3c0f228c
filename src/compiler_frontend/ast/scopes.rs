use crate::compiler_frontend::string_interning::StringId;
use crate::projects::settings::SCOPE_SYMBOL_CAPACITY;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The module scope every arena starts with
    pub const ROOT: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub kind: ScopeKind,
    symbols: FxHashMap<StringId, u32>,
    declared: u32,
    deleted: u32,
}

impl Scope {
    fn new(parent: Option<ScopeId>, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            symbols: FxHashMap::with_capacity_and_hasher(SCOPE_SYMBOL_CAPACITY, Default::default()),
            declared: 0,
            deleted: 0,
        }
    }

    pub fn declared_count(&self) -> u32 {
        self.declared
    }

    pub fn deleted_count(&self) -> u32 {
        self.deleted
    }

    pub fn slot_of(&self, name: StringId) -> Option<u32> {
        self.symbols.get(&name).copied()
    }
}

/// Every scope of a compilation unit, indexed by `ScopeId`.
/// Scopes are never removed; a collapsed scope simply stops being referenced by any node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, ScopeKind::Module)],
        }
    }

    pub fn push_scope(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(Some(parent), kind));
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0 as usize)
    }

    /// Declares a symbol directly in this scope and returns its slot.
    /// Declaring the same name twice returns the existing slot.
    pub fn declare(&mut self, scope: ScopeId, name: StringId) -> Option<u32> {
        let scope = self.scopes.get_mut(scope.0 as usize)?;

        if let Some(slot) = scope.symbols.get(&name) {
            return Some(*slot);
        }

        let slot = scope.symbols.len() as u32;
        scope.symbols.insert(name, slot);
        scope.declared += 1;
        Some(slot)
    }

    /// Records that a symbol is deleted (unbound) inside this scope
    pub fn delete(&mut self, scope: ScopeId) {
        if let Some(scope) = self.scopes.get_mut(scope.0 as usize) {
            scope.deleted += 1;
        }
    }

    /// Finds the scope and slot a name resolves to, walking outwards through the parents
    pub fn resolve(&self, mut scope: ScopeId, name: StringId) -> Option<(ScopeId, u32)> {
        loop {
            let current = self.get(scope)?;
            if let Some(slot) = current.slot_of(name) {
                return Some((scope, slot));
            }
            scope = current.parent?;
        }
    }

    /// The scope a node in `id` can adopt instead, if `id` is an empty block scope
    /// nested directly in another block scope.
    pub fn collapse_target(&self, id: ScopeId) -> Option<ScopeId> {
        let scope = self.get(id)?;

        if scope.kind != ScopeKind::Block || scope.declared != 0 || scope.deleted != 0 {
            return None;
        }

        let parent_id = scope.parent?;
        let parent = self.get(parent_id)?;

        if parent.kind == scope.kind {
            Some(parent_id)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler_frontend::string_interning::StringTable;

    #[test]
    fn empty_block_inside_block_collapses_to_its_parent() {
        let mut scopes = ScopeArena::new();
        let function = scopes.push_scope(ScopeId::ROOT, ScopeKind::Function);
        let outer = scopes.push_scope(function, ScopeKind::Block);
        let inner = scopes.push_scope(outer, ScopeKind::Block);

        assert_eq!(scopes.collapse_target(inner), Some(outer));
        // The parent is a function scope, which is a different kind
        assert_eq!(scopes.collapse_target(outer), None);
    }

    #[test]
    fn blocks_that_declare_or_delete_never_collapse() {
        let mut strings = StringTable::new();
        let x = strings.intern("x");

        let mut scopes = ScopeArena::new();
        let outer = scopes.push_scope(ScopeId::ROOT, ScopeKind::Block);
        let declaring = scopes.push_scope(outer, ScopeKind::Block);
        let deleting = scopes.push_scope(outer, ScopeKind::Block);

        scopes.declare(declaring, x);
        scopes.delete(deleting);

        assert_eq!(scopes.collapse_target(declaring), None);
        assert_eq!(scopes.collapse_target(deleting), None);
    }

    #[test]
    fn names_resolve_through_parents() {
        let mut strings = StringTable::new();
        let x = strings.intern("x");
        let y = strings.intern("y");

        let mut scopes = ScopeArena::new();
        let function = scopes.push_scope(ScopeId::ROOT, ScopeKind::Function);
        let block = scopes.push_scope(function, ScopeKind::Block);

        assert_eq!(scopes.declare(function, x), Some(0));
        assert_eq!(scopes.declare(function, y), Some(1));
        assert_eq!(scopes.declare(function, x), Some(0));
        assert_eq!(scopes.get(function).map(Scope::declared_count), Some(2));

        assert_eq!(scopes.resolve(block, y), Some((function, 1)));
        assert_eq!(scopes.resolve(ScopeId::ROOT, y), None);
    }
}
