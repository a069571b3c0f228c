//! Flow-sensitive facts about symbols, threaded through one optimizer pass.
//!
//! A set is forked for every branch that may or may not run (conditional arms, loop bodies,
//! catch handlers, switch cases, the right side of `and`/`or`).
//! A fork only records what changed on its own path and reads everything else through its parent,
//! so the outer facts stay intact until the branches are joined back together.

use crate::assumption_log;
use crate::compiler_frontend::ast::scopes::{ScopeArena, ScopeId};
use crate::compiler_frontend::string_interning::StringId;
use rustc_hash::{FxHashMap, FxHashSet};

/// What is known about a symbol at one point of the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assumption {
    KnownTrue,
    KnownFalse,
    // Holds a value, but nothing is known about its truth
    KnownBound,
    KnownUnbound,
    Unknown,
}

impl Assumption {
    /// A symbol that was just assigned or tested, so it is bound either way
    pub fn from_truth(truth: Option<bool>) -> Self {
        match truth {
            Some(true) => Assumption::KnownTrue,
            Some(false) => Assumption::KnownFalse,
            None => Assumption::KnownBound,
        }
    }

    pub fn truth(self) -> Option<bool> {
        match self {
            Assumption::KnownTrue => Some(true),
            Assumption::KnownFalse => Some(false),
            Assumption::KnownBound | Assumption::KnownUnbound | Assumption::Unknown => None,
        }
    }

    /// Reading the symbol can't fail
    pub fn is_bound(self) -> bool {
        matches!(
            self,
            Assumption::KnownTrue | Assumption::KnownFalse | Assumption::KnownBound
        )
    }

    // What still holds where two paths meet
    fn meet(self, other: Assumption) -> Assumption {
        if self == other {
            self
        } else if self.is_bound() && other.is_bound() {
            Assumption::KnownBound
        } else {
            Assumption::Unknown
        }
    }
}

/// A symbol identified by the scope that declares it.
/// Names that resolve nowhere are keyed with no scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    pub scope: Option<ScopeId>,
    pub name: StringId,
}

impl SymbolKey {
    pub fn resolve(scopes: &ScopeArena, scope: ScopeId, name: StringId) -> Self {
        Self {
            scope: scopes.resolve(scope, name).map(|(declared_in, _)| declared_in),
            name,
        }
    }
}

/// The changes one branch made relative to the set it was forked from
#[derive(Debug, Default)]
pub struct BranchOutcome {
    changes: FxHashMap<SymbolKey, Assumption>,
    forgot_everything: bool,
    reachable: bool,
}

impl BranchOutcome {
    pub fn is_reachable(&self) -> bool {
        self.reachable
    }

    // The value on this path, falling back to what held before the branch
    fn value_of(&self, key: SymbolKey, base: &AssumptionSet) -> Assumption {
        match self.changes.get(&key) {
            Some(value) => *value,
            None if self.forgot_everything => Assumption::Unknown,
            None => base.get(key),
        }
    }
}

#[derive(Debug)]
pub struct AssumptionSet<'p> {
    parent: Option<&'p AssumptionSet<'p>>,
    changes: FxHashMap<SymbolKey, Assumption>,

    // Facts of the parent are hidden (a jump target or an opaque call was reached)
    forgot_everything: bool,

    // False after a return, throw, break, continue or jump until the next label
    reachable: bool,
    enabled: bool,
}

impl AssumptionSet<'static> {
    /// A fresh set with nothing known. A disabled set answers `Unknown` to everything.
    pub fn new(enabled: bool) -> Self {
        Self {
            parent: None,
            changes: FxHashMap::default(),
            forgot_everything: false,
            reachable: true,
            enabled,
        }
    }
}

impl<'p> AssumptionSet<'p> {
    pub fn get(&self, key: SymbolKey) -> Assumption {
        if !self.enabled {
            return Assumption::Unknown;
        }

        if let Some(value) = self.changes.get(&key) {
            return *value;
        }

        if self.forgot_everything {
            return Assumption::Unknown;
        }

        match self.parent {
            Some(parent) => parent.get(key),
            None => Assumption::Unknown,
        }
    }

    pub fn set(&mut self, key: SymbolKey, value: Assumption) {
        if !self.enabled {
            return;
        }

        assumption_log!("Assume ", #key, " is ", #value);
        self.changes.insert(key, value);
    }

    pub fn forget(&mut self, key: SymbolKey) {
        self.set(key, Assumption::Unknown);
    }

    pub fn forget_all(&mut self) {
        if !self.enabled {
            return;
        }

        assumption_log!(Dark Yellow "Forgetting every assumption");
        self.changes.clear();
        self.forgot_everything = true;
    }

    pub fn reachable(&self) -> bool {
        self.reachable
    }

    pub fn mark_unreachable(&mut self) {
        self.reachable = false;
    }

    /// Control can arrive here from elsewhere (a label)
    pub fn mark_reachable(&mut self) {
        self.reachable = true;
    }

    /// Starts a branch that sees everything known here
    pub fn fork(&self) -> AssumptionSet<'_> {
        AssumptionSet {
            parent: Some(self),
            changes: FxHashMap::default(),
            forgot_everything: false,
            reachable: self.reachable,
            enabled: self.enabled,
        }
    }

    pub fn into_outcome(self) -> BranchOutcome {
        BranchOutcome {
            changes: self.changes,
            forgot_everything: self.forgot_everything,
            reachable: self.reachable,
        }
    }

    /// The outcome of a path that skips every branch
    pub fn unchanged(&self) -> BranchOutcome {
        BranchOutcome {
            changes: FxHashMap::default(),
            forgot_everything: false,
            reachable: self.reachable,
        }
    }

    /// Merges the branches that were forked from this set back into it.
    /// A symbol keeps a fact only if every path that reaches the join point agrees on it,
    /// paths that bind it to different values still agree that it is bound.
    /// If no path reaches the join point, whatever follows is unreachable.
    pub fn join(&mut self, outcomes: Vec<BranchOutcome>) {
        let live: Vec<BranchOutcome> = outcomes
            .into_iter()
            .filter(|outcome| outcome.reachable)
            .collect();

        if live.is_empty() {
            self.reachable = false;
            return;
        }

        let mut touched: FxHashSet<SymbolKey> = FxHashSet::default();
        for outcome in &live {
            touched.extend(outcome.changes.keys().copied());
        }

        let mut merged = Vec::with_capacity(touched.len());
        for key in touched {
            let agreed = live
                .iter()
                .map(|outcome| outcome.value_of(key, self))
                .reduce(Assumption::meet)
                .unwrap_or(Assumption::Unknown);
            merged.push((key, agreed));
        }

        if live.iter().any(|outcome| outcome.forgot_everything) {
            self.forget_all();
        }

        for (key, value) in merged {
            self.set(key, value);
        }

        self.reachable = true;
    }
}
