// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Francis Pham <fdp25@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use cranelift_entity::{entity_impl, PrimaryMap};
use rustc_hash::FxHashMap;
use std::ops::Index;

use crate::data::{DataExpression, Variable};

#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct NameId(u32);
entity_impl!(NameId, "name");

#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct SortId(u32);
entity_impl!(SortId, "sort");

/// Interning table for action/variable/function names and sort names.
///
/// The distinguished entries (the silent action name `tau`, the `Bool` sort
/// and the Boolean function symbols) are interned at construction so their
/// ids are fixed for the lifetime of the table and can be compared against
/// without a string lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    names: PrimaryMap<NameId, String>,
    by_name: FxHashMap<String, NameId>,
    sorts: PrimaryMap<SortId, String>,
    by_sort: FxHashMap<String, SortId>,

    /// The distinguished `NameId` of the silent action
    tau_id: NameId,
    /// The distinguished `SortId` of the Booleans
    bool_id: SortId,
    true_id: NameId,
    false_id: NameId,
    equal_id: NameId,
    and_id: NameId,
    or_id: NameId,
    not_id: NameId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let mut names = PrimaryMap::new();
        let mut by_name = FxHashMap::default();
        let mut sorts = PrimaryMap::new();
        let mut by_sort = FxHashMap::default();

        let mut add_name = |s: &str| -> NameId {
            let id = names.push(s.to_string());
            by_name.insert(s.to_string(), id);
            id
        };
        let tau_id = add_name("tau");
        let true_id = add_name("true");
        let false_id = add_name("false");
        let equal_id = add_name("==");
        let and_id = add_name("&&");
        let or_id = add_name("||");
        let not_id = add_name("!");

        let bool_id = sorts.push("Bool".to_string());
        by_sort.insert("Bool".to_string(), bool_id);

        Self {
            names,
            by_name,
            sorts,
            by_sort,
            tau_id,
            bool_id,
            true_id,
            false_id,
            equal_id,
            and_id,
            or_id,
            not_id,
        }
    }

    /// Interns `name`, returning the existing id if it was seen before.
    pub fn intern_name(&mut self, name: &str) -> NameId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Interns `sort`, returning the existing id if it was seen before.
    pub fn intern_sort(&mut self, sort: &str) -> SortId {
        if let Some(id) = self.by_sort.get(sort) {
            return *id;
        }
        let id = self.sorts.push(sort.to_string());
        self.by_sort.insert(sort.to_string(), id);
        id
    }

    /// Takes a string and returns the corresponding `NameId` (if one exists)
    pub fn name_id(&self, name: &str) -> Option<NameId> {
        self.by_name.get(name).copied()
    }

    /// Takes a string and returns the corresponding `SortId` (if one exists)
    pub fn sort_id(&self, sort: &str) -> Option<SortId> {
        self.by_sort.get(sort).copied()
    }

    pub fn tau(&self) -> NameId {
        self.tau_id
    }

    pub fn sort_bool(&self) -> SortId {
        self.bool_id
    }

    pub fn name_true(&self) -> NameId {
        self.true_id
    }

    pub fn name_false(&self) -> NameId {
        self.false_id
    }

    pub fn name_equal(&self) -> NameId {
        self.equal_id
    }

    pub fn name_and(&self) -> NameId {
        self.and_id
    }

    pub fn name_or(&self) -> NameId {
        self.or_id
    }

    pub fn name_not(&self) -> NameId {
        self.not_id
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NameId> for SymbolTable {
    type Output = str;

    fn index(&self, index: NameId) -> &Self::Output {
        &self.names[index]
    }
}

impl Index<SortId> for SymbolTable {
    type Output = str;

    fn index(&self, index: SortId) -> &Self::Output {
        &self.sorts[index]
    }
}

/// The name and argument-sort signature of an action, independent of the
/// argument values. Labels order by name first, then by sort list; this is
/// the canonical order multi-actions are kept in.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ActionLabel {
    pub name: NameId,
    pub sorts: Vec<SortId>,
}

impl ActionLabel {
    pub fn new(name: NameId, sorts: Vec<SortId>) -> Self {
        Self { name, sorts }
    }
}

/// An action: a label applied to a list of data arguments. The argument
/// sorts are expected to match the label's signature; the parser checks
/// this, programmatic construction is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    label: ActionLabel,
    args: Vec<DataExpression>,
}

impl Action {
    pub fn new(label: ActionLabel, args: Vec<DataExpression>) -> Self {
        Self { label, args }
    }

    pub fn label(&self) -> &ActionLabel {
        &self.label
    }

    pub fn args(&self) -> &[DataExpression] {
        &self.args
    }
}

/// An ordered multiset of actions, kept sorted on action labels. The empty
/// multi-action is the silent step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiAction {
    actions: Vec<Action>,
}

impl MultiAction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_action(action: Action) -> Self {
        Self {
            actions: vec![action],
        }
    }

    /// Returns a new multi-action with `action` inserted at the unique
    /// position that preserves the label order. Equal labels end up
    /// adjacent; the arguments play no role in the position.
    pub fn insert(&self, action: &Action) -> MultiAction {
        self.clone().insert_owned(action.clone())
    }

    pub(crate) fn insert_owned(mut self, action: Action) -> MultiAction {
        let at = self
            .actions
            .iter()
            .position(|existing| action.label() < existing.label())
            .unwrap_or(self.actions.len());
        self.actions.insert(at, action);
        self
    }

    /// The same actions in reverse sequence order.
    pub fn reverse(&self) -> MultiAction {
        let mut actions = self.actions.clone();
        actions.reverse();
        MultiAction { actions }
    }

    /// The action names only, in sequence order.
    pub fn names(&self) -> Vec<NameId> {
        self.actions.iter().map(|a| a.label().name).collect()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

/// One communication rule `a1|...|an -> b`: a sorted multiset of action
/// names that synchronises into the single name `b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommRule {
    pub lhs: Vec<NameId>,
    pub rhs: NameId,
}

impl CommRule {
    pub fn new(lhs: Vec<NameId>, rhs: NameId) -> Self {
        Self { lhs, rhs }
    }
}

/// A next-state assignment `lhs := rhs` of an action summand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub lhs: Variable,
    pub rhs: DataExpression,
}

/// A stochastic distribution over fresh variables, carried through the
/// communication pass untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub variables: Vec<Variable>,
    pub density: DataExpression,
}

/// One action summand of a linear process:
/// `sum vars. condition -> multi_action @ time . assignments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSummand {
    pub summation_variables: Vec<Variable>,
    pub condition: DataExpression,
    pub multi_action: MultiAction,
    pub time: Option<DataExpression>,
    pub assignments: Vec<Assignment>,
    pub distribution: Option<Distribution>,
}

impl ActionSummand {
    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }
}

/// A deadlock, optionally pinned to a time-point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deadlock {
    pub time: Option<DataExpression>,
}

/// One deadlock summand: `sum vars. condition -> delta @ time`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlockSummand {
    pub summation_variables: Vec<Variable>,
    pub condition: DataExpression,
    pub deadlock: Deadlock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::true_;

    fn label(tab: &mut SymbolTable, name: &str, sorts: &[&str]) -> ActionLabel {
        let name = tab.intern_name(name);
        let sorts = sorts.iter().map(|s| tab.intern_sort(s)).collect();
        ActionLabel::new(name, sorts)
    }

    #[test]
    fn distinguished_entries_are_stable() {
        let tab = SymbolTable::new();
        assert_eq!(&tab[tab.tau()], "tau");
        assert_eq!(&tab[tab.name_true()], "true");
        assert_eq!(&tab[tab.name_false()], "false");
        assert_eq!(&tab[tab.sort_bool()], "Bool");
    }

    #[test]
    fn interning_is_idempotent() {
        let mut tab = SymbolTable::new();
        let a = tab.intern_name("a");
        let b = tab.intern_name("b");
        assert_eq!(a, tab.intern_name("a"));
        assert_ne!(a, b);
        assert_eq!(tab.name_id("b"), Some(b));
        assert_eq!(tab.name_id("c"), None);
        // tau is pre-interned, not duplicated
        assert_eq!(tab.intern_name("tau"), tab.tau());
    }

    #[test]
    fn insert_keeps_label_order() {
        let mut tab = SymbolTable::new();
        let a = label(&mut tab, "a", &["Nat"]);
        let b = label(&mut tab, "b", &["Nat"]);
        let c = label(&mut tab, "c", &["Nat"]);

        let ma = MultiAction::new()
            .insert(&Action::new(c.clone(), vec![]))
            .insert(&Action::new(a.clone(), vec![]))
            .insert(&Action::new(b.clone(), vec![]));
        let names: Vec<&str> = ma.names().iter().map(|n| &tab[*n]).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn insert_is_pure_and_stable_on_ties() {
        let mut tab = SymbolTable::new();
        let nat = tab.intern_sort("Nat");
        let a = label(&mut tab, "a", &["Nat"]);
        let x = DataExpression::variable(Variable::new(tab.intern_name("x"), nat));
        let y = DataExpression::variable(Variable::new(tab.intern_name("y"), nat));

        let first = Action::new(a.clone(), vec![x]);
        let second = Action::new(a.clone(), vec![y]);
        let ma = MultiAction::from_action(first.clone());
        let both = ma.insert(&second);

        // the original is untouched and the tie lands after the existing entry
        assert_eq!(ma.len(), 1);
        assert_eq!(both.actions(), &[first, second]);
    }

    #[test]
    fn reverse_reverses_the_sequence() {
        let mut tab = SymbolTable::new();
        let a = label(&mut tab, "a", &[]);
        let b = label(&mut tab, "b", &[]);
        let ma = MultiAction::new()
            .insert(&Action::new(a.clone(), vec![]))
            .insert(&Action::new(b.clone(), vec![]));
        let rev = ma.reverse();
        assert_eq!(rev.names(), vec![b.name, a.name]);
        assert!(MultiAction::new().reverse().is_empty());
    }

    #[test]
    fn summands_compare_structurally() {
        let mut tab = SymbolTable::new();
        let a = label(&mut tab, "a", &[]);
        let s = ActionSummand {
            summation_variables: vec![],
            condition: true_(&tab),
            multi_action: MultiAction::from_action(Action::new(a, vec![])),
            time: None,
            assignments: vec![],
            distribution: None,
        };
        assert!(!s.has_time());
        assert_eq!(s, s.clone());
    }
}
