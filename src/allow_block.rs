// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>

use crate::ir::{Action, MultiAction, NameId};

/// Whether `multiaction` passes the allow filter. The silent multi-action
/// and the singleton termination action are always permitted; otherwise
/// the name sequence must equal one of the allow-list entries.
///
/// Both the allow-list entries and the name sequence of a multi-action are
/// name-sorted, so plain equality suffices.
pub fn allow_(
    allowlist: &[Vec<NameId>],
    multiaction: &MultiAction,
    termination_action: &Action,
) -> bool {
    if multiaction.is_empty() {
        return true;
    }
    let names = multiaction.names();
    if names.len() == 1 && names[0] == termination_action.label().name {
        return true;
    }
    allowlist.iter().any(|entry| entry == &names)
}

/// Whether `multiaction` hits the block filter: true iff any of its
/// actions carries a blocked name.
pub fn encap(blocklist: &[NameId], multiaction: &MultiAction) -> bool {
    multiaction
        .actions()
        .iter()
        .any(|a| blocklist.contains(&a.label().name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ActionLabel, SymbolTable};

    fn act(tab: &mut SymbolTable, name: &str) -> Action {
        let name = tab.intern_name(name);
        Action::new(ActionLabel::new(name, vec![]), vec![])
    }

    #[test]
    fn allow_matches_name_multisets() {
        let mut tab = SymbolTable::new();
        let a = act(&mut tab, "a");
        let b = act(&mut tab, "b");
        let c = act(&mut tab, "c");
        let term = act(&mut tab, "Terminate");

        let allowlist = vec![vec![a.label().name, b.label().name]];

        let ab = MultiAction::new().insert(&a).insert(&b);
        assert!(allow_(&allowlist, &ab, &term));

        let ac = MultiAction::new().insert(&a).insert(&c);
        assert!(!allow_(&allowlist, &ac, &term));

        let just_a = MultiAction::from_action(a.clone());
        assert!(!allow_(&allowlist, &just_a, &term));
    }

    #[test]
    fn allow_always_permits_tau_and_termination() {
        let mut tab = SymbolTable::new();
        let term = act(&mut tab, "Terminate");

        assert!(allow_(&[], &MultiAction::new(), &term));
        assert!(allow_(&[], &MultiAction::from_action(term.clone()), &term));
    }

    #[test]
    fn encap_detects_any_blocked_name() {
        let mut tab = SymbolTable::new();
        let a = act(&mut tab, "a");
        let b = act(&mut tab, "b");
        let c = act(&mut tab, "c");

        let blocklist = vec![b.label().name];
        let ab = MultiAction::new().insert(&a).insert(&b);
        let ac = MultiAction::new().insert(&a).insert(&c);

        assert!(encap(&blocklist, &ab));
        assert!(!encap(&blocklist, &ac));
        assert!(!encap(&blocklist, &MultiAction::new()));
    }
}
