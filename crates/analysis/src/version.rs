//! Version table: current SSA version of every name, with scoped forks.
//!
//! Version counters are global to one run and survive `restore`, so a
//! version handed out inside a discarded fork is never handed out again.

use std::collections::BTreeMap;

use crate::ast::VarKind;
use crate::ssa::Symbol;

/// The versions visible at one program point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    versions: BTreeMap<String, u32>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<u32> {
        self.versions.get(name).copied()
    }

    /// `(name, version)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.versions.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct VersionTable {
    /// Highest version allocated so far, per name.
    counters: BTreeMap<String, u32>,
    /// Kind fixed by a name's first definition.
    kinds: BTreeMap<String, VarKind>,
    scope: Scope,
}

impl VersionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make version 0 of `name` current.
    ///
    /// Returns `false` if `name` is already known.
    pub fn declare_input(&mut self, name: &str, kind: VarKind) -> bool {
        if self.kinds.contains_key(name) {
            return false;
        }
        self.kinds.insert(name.to_string(), kind);
        self.counters.insert(name.to_string(), 0);
        self.scope.versions.insert(name.to_string(), 0);
        true
    }

    /// Allocate the next version of `name` and make it current.
    ///
    /// The first definition of a name fixes its kind; callers check
    /// [`VersionTable::kind`] before redefining.
    pub fn fresh(&mut self, name: &str, kind: VarKind) -> Symbol {
        self.kinds.entry(name.to_string()).or_insert(kind);
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        let version = *counter;
        self.scope.versions.insert(name.to_string(), version);
        Symbol::new(name, version)
    }

    /// Current version of `name` in the active scope.
    pub fn current(&self, name: &str) -> Option<Symbol> {
        self.scope.get(name).map(|v| Symbol::new(name, v))
    }

    /// Kind of `name`, if it has ever been defined in this run.
    pub fn kind(&self, name: &str) -> Option<VarKind> {
        self.kinds.get(name).copied()
    }

    /// Fix the kind of a name seen only as an implicit version 0.
    pub fn record_kind(&mut self, name: &str, kind: VarKind) {
        self.kinds.entry(name.to_string()).or_insert(kind);
    }

    pub fn snapshot(&self) -> Scope {
        self.scope.clone()
    }

    pub fn restore(&mut self, scope: Scope) {
        self.scope = scope;
    }

    /// Make `version` of `name` current without allocating.
    pub fn set_current(&mut self, name: &str, version: u32) {
        self.scope.versions.insert(name.to_string(), version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_count_up_per_name() {
        let mut table = VersionTable::new();
        assert_eq!(table.fresh("x", VarKind::Scalar), Symbol::new("x", 1));
        assert_eq!(table.fresh("y", VarKind::Scalar), Symbol::new("y", 1));
        assert_eq!(table.fresh("x", VarKind::Scalar), Symbol::new("x", 2));
        assert_eq!(table.current("x"), Some(Symbol::new("x", 2)));
        assert_eq!(table.current("z"), None);
    }

    #[test]
    fn inputs_start_at_zero() {
        let mut table = VersionTable::new();
        assert!(table.declare_input("n", VarKind::Scalar));
        assert!(!table.declare_input("n", VarKind::Array));
        assert_eq!(table.current("n"), Some(Symbol::new("n", 0)));
        assert_eq!(table.fresh("n", VarKind::Scalar), Symbol::new("n", 1));
    }

    #[test]
    fn restore_keeps_counters() {
        let mut table = VersionTable::new();
        table.fresh("x", VarKind::Scalar);
        let before = table.snapshot();

        table.fresh("x", VarKind::Scalar);
        let then_scope = table.snapshot();
        table.restore(before.clone());
        assert_eq!(table.current("x"), Some(Symbol::new("x", 1)));

        // The else fork must not reuse version 2.
        assert_eq!(table.fresh("x", VarKind::Scalar), Symbol::new("x", 3));
        assert_eq!(then_scope.get("x"), Some(2));
        assert_eq!(before.get("x"), Some(1));
    }

    #[test]
    fn scope_iterates_in_name_order() {
        let mut table = VersionTable::new();
        table.fresh("zeta", VarKind::Scalar);
        table.fresh("alpha", VarKind::Array);
        let scope = table.snapshot();
        let names: Vec<&str> = scope.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(table.kind("alpha"), Some(VarKind::Array));
    }
}
