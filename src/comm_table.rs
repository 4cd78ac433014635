// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use crate::errors::{LineariseError, LineariseResult};
use crate::ir::{Action, ActionLabel, CommRule, MultiAction, NameId, SymbolTable};

/// Indexed store of the communication function. The left-hand sides are
/// kept as sorted name sequences next to their result names; `lhs_pos` and
/// `match_failed` are scratch state that every query resets before use.
///
/// The table is deliberately not `Clone`: it is exclusively owned by the
/// thread driving one enumeration pass.
pub struct CommTable {
    /// Left-hand sides of the communication rules
    lhs: Vec<Vec<NameId>>,
    /// Right-hand sides of the communication rules
    rhs: Vec<NameId>,
    /// Scratch: per-rule cursor into `lhs`
    lhs_pos: Vec<usize>,
    /// Scratch: per-rule failure flag of the last prefix walk
    match_failed: Vec<bool>,
}

impl CommTable {
    /// Builds the table from rules whose left-hand sides are already in
    /// canonical name order (see `utility::sort_communications`).
    pub fn new(communications: &[CommRule]) -> Self {
        let lhs: Vec<Vec<NameId>> = communications.iter().map(|c| c.lhs.clone()).collect();
        let rhs: Vec<NameId> = communications.iter().map(|c| c.rhs).collect();
        let n = communications.len();
        Self {
            lhs,
            rhs,
            lhs_pos: vec![0; n],
            match_failed: vec![false; n],
        }
    }

    pub fn size(&self) -> usize {
        debug_assert!(
            self.lhs.len() == self.rhs.len()
                && self.rhs.len() == self.lhs_pos.len()
                && self.lhs_pos.len() == self.match_failed.len()
        );
        self.lhs.len()
    }

    fn reset_temporary_data(&mut self) {
        for i in 0..self.size() {
            self.lhs_pos[i] = 0;
            self.match_failed[i] = false;
        }
    }

    /// Walks `names` through every rule at once. Returns true if some rule
    /// still has `names` as a prefix of its left-hand side.
    ///
    /// Postcondition: for every rule i whose left-hand side does not have
    /// `names` as a prefix, `match_failed[i]` is true, and for the live
    /// rules `lhs_pos[i]` sits just past the consumed prefix.
    fn match_multiaction(&mut self, names: &[NameId]) -> bool {
        self.reset_temporary_data();

        // every incoming name must advance at least one rule
        for name in names {
            let mut comm_ok = false;
            for i in 0..self.size() {
                if self.match_failed[i] {
                    continue;
                }
                if self.lhs_pos[i] == self.lhs[i].len() {
                    // this rule is exhausted and cannot take another name
                    self.match_failed[i] = true;
                    continue;
                }
                if self.lhs[i][self.lhs_pos[i]] != *name {
                    self.match_failed[i] = true;
                } else {
                    self.lhs_pos[i] += 1;
                    comm_ok = true;
                }
            }
            if !comm_ok {
                return false;
            }
        }
        true
    }

    /// Determines whether the name multiset of `m` is exactly the
    /// left-hand side of some rule. On a match, yields the synchronised
    /// label: the rule's result name with the sort signature of the first
    /// action of `m`. A rule producing the silent action is a hard error.
    pub fn can_communicate(
        &mut self,
        m: &MultiAction,
        tab: &SymbolTable,
    ) -> LineariseResult<Option<ActionLabel>> {
        let m_names = m.names();

        if !self.match_multiaction(&m_names) {
            return Ok(None);
        }

        // the first rule consumed completely is the match
        for i in 0..self.size() {
            if !self.match_failed[i] && self.lhs_pos[i] == self.lhs[i].len() {
                if self.rhs[i] == tab.tau() {
                    return Err(LineariseError::unsupported_communication(
                        self.render_lhs(i, tab),
                        tab[self.rhs[i]].to_string(),
                    ));
                }
                let first = match m.actions().first() {
                    Some(a) => a,
                    None => return Ok(None),
                };
                return Ok(Some(ActionLabel::new(
                    self.rhs[i],
                    first.label().sorts.clone(),
                )));
            }
        }

        Ok(None)
    }

    /// Determines whether `m` is a sub-multiset of some left-hand side
    /// whose remaining names can all be found, in order, in the tail `n`
    /// of not-yet-committed actions.
    pub fn might_communicate(&mut self, m: &MultiAction, n: &[Action]) -> bool {
        let m_names = m.names();

        if !self.match_multiaction(&m_names) {
            return false;
        }

        for i in 0..self.size() {
            if self.match_failed[i] {
                continue;
            }

            // try to complete rule i from n, preserving n's relative order
            let mut rest = 0usize;
            let mut pos = self.lhs_pos[i];
            let mut completed = true;
            while pos < self.lhs[i].len() {
                let comm_name = self.lhs[i][pos];
                loop {
                    if rest == n.len() {
                        completed = false;
                        break;
                    }
                    if n[rest].label().name == comm_name {
                        break;
                    }
                    rest += 1;
                }
                if !completed {
                    break;
                }
                rest += 1;
                pos += 1;
            }

            if completed {
                return true;
            }
        }

        false
    }

    fn render_lhs(&self, i: usize, tab: &SymbolTable) -> String {
        self.lhs[i]
            .iter()
            .map(|n| tab[*n].to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (SymbolTable, NameId, NameId, NameId, NameId) {
        let mut tab = SymbolTable::new();
        let a = tab.intern_name("a");
        let b = tab.intern_name("b");
        let c = tab.intern_name("c");
        let d = tab.intern_name("d");
        (tab, a, b, c, d)
    }

    fn act(tab: &mut SymbolTable, name: &str) -> Action {
        let name = tab.intern_name(name);
        Action::new(ActionLabel::new(name, vec![]), vec![])
    }

    fn multi(tab: &mut SymbolTable, names: &[&str]) -> MultiAction {
        let mut ma = MultiAction::new();
        for n in names {
            ma = ma.insert(&act(tab, n));
        }
        ma
    }

    #[test]
    fn can_communicate_matches_a_full_lhs() {
        let (mut tab, a, b, c, _) = setup();
        let mut table = CommTable::new(&[CommRule::new(vec![a, b], c)]);

        let ab = multi(&mut tab, &["a", "b"]);
        let label = table.can_communicate(&ab, &tab).unwrap();
        assert_eq!(label, Some(ActionLabel::new(c, vec![])));

        // a strict prefix is not a communication
        let just_a = multi(&mut tab, &["a"]);
        assert_eq!(table.can_communicate(&just_a, &tab).unwrap(), None);

        // a non-prefix fails outright
        let ac = multi(&mut tab, &["a", "c"]);
        assert_eq!(table.can_communicate(&ac, &tab).unwrap(), None);
    }

    #[test]
    fn can_communicate_takes_rules_in_declared_order() {
        let (mut tab, a, b, c, d) = setup();
        let mut table = CommTable::new(&[CommRule::new(vec![a, b], c), CommRule::new(vec![a, b], d)]);

        let ab = multi(&mut tab, &["a", "b"]);
        let label = table.can_communicate(&ab, &tab).unwrap();
        assert_eq!(label.map(|l| l.name), Some(c));
    }

    #[test]
    fn can_communicate_rejects_a_tau_result() {
        let (mut tab, a, b, _, _) = setup();
        let tau = tab.tau();
        let mut table = CommTable::new(&[CommRule::new(vec![a, b], tau)]);

        let ab = multi(&mut tab, &["a", "b"]);
        let err = table.can_communicate(&ab, &tab).unwrap_err();
        assert!(format!("{}", err).contains("a|b -> tau"));
    }

    #[test]
    fn might_communicate_completes_from_the_tail() {
        let (mut tab, a, b, c, _) = setup();
        let mut table = CommTable::new(&[CommRule::new(vec![a, b], c)]);

        let just_a = multi(&mut tab, &["a"]);
        let b_act = act(&mut tab, "b");
        let c_act = act(&mut tab, "c");

        // b is available further down the tail, with noise in between
        assert!(table.might_communicate(&just_a, &[c_act.clone(), b_act.clone()]));
        // nothing in the tail completes the rule
        assert!(!table.might_communicate(&just_a, &[c_act.clone()]));
        assert!(!table.might_communicate(&just_a, &[]));

        // an already-complete prefix needs nothing from the tail
        let ab = multi(&mut tab, &["a", "b"]);
        assert!(table.might_communicate(&ab, &[]));
    }

    #[test]
    fn might_communicate_preserves_tail_order() {
        let (mut tab, a, b, c, _) = setup();
        let mut table = CommTable::new(&[CommRule::new(vec![a, b, c], tab.intern_name("r"))]);

        let just_a = multi(&mut tab, &["a"]);
        let b_act = act(&mut tab, "b");
        let c_act = act(&mut tab, "c");

        // b then c completes a|b|c in order
        assert!(table.might_communicate(&just_a, &[b_act.clone(), c_act.clone()]));
        // c before b cannot be reordered
        assert!(!table.might_communicate(&just_a, &[c_act, b_act]));
    }

    #[test]
    fn dead_rules_stay_dead_within_one_query() {
        let (mut tab, a, b, c, d) = setup();
        let e = tab.intern_name("e");
        let mut table = CommTable::new(&[
            CommRule::new(vec![a, b], c),
            CommRule::new(vec![a, d], e),
        ]);

        // a|d kills the first rule but the second still fires
        let ad = multi(&mut tab, &["a", "d"]);
        assert_eq!(
            table.can_communicate(&ad, &tab).unwrap().map(|l| l.name),
            Some(e)
        );

        // and the scratch state resets for the next query
        let ab = multi(&mut tab, &["a", "b"]);
        assert_eq!(
            table.can_communicate(&ab, &tab).unwrap().map(|l| l.name),
            Some(c)
        );
    }
}
