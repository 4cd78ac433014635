// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Francis Pham <fdp25@cornell.edu>

use crate::ir::{CommRule, Deadlock, DeadlockSummand, NameId, SymbolTable};

/// Canonicalises a communication function: every left-hand side is
/// name-sorted, and the rules themselves are ordered. The matching in the
/// communication table relies on this order.
pub fn sort_communications(mut communications: Vec<CommRule>) -> Vec<CommRule> {
    for c in &mut communications {
        c.lhs.sort();
    }
    communications.sort_by(|x, y| x.lhs.cmp(&y.lhs).then(x.rhs.cmp(&y.rhs)));
    communications
}

/// Canonicalises an allow list: every multiset is name-sorted, then the
/// list itself.
pub fn sort_action_name_multisets(mut list: Vec<Vec<NameId>>) -> Vec<Vec<NameId>> {
    for m in &mut list {
        m.sort();
    }
    list.sort();
    list
}

/// Merges one deadlock summand into the deadlock-summand list.
///
/// Summands with a literally false condition are discarded. Under
/// `ignore_time` the timestamp is dropped and an unconditional deadlock
/// summand absorbs all others. Exact duplicates are never inserted twice.
pub fn insert_timed_delta_summand(
    deadlock_summands: &mut Vec<DeadlockSummand>,
    summand: DeadlockSummand,
    ignore_time: bool,
    tab: &SymbolTable,
) {
    if summand.condition.is_false(tab) {
        return;
    }

    let summand = if ignore_time {
        DeadlockSummand {
            deadlock: Deadlock { time: None },
            ..summand
        }
    } else {
        summand
    };

    if ignore_time {
        if deadlock_summands
            .iter()
            .any(|d| d.condition.is_true(tab) && d.deadlock.time.is_none())
        {
            return;
        }
        if summand.condition.is_true(tab) {
            deadlock_summands.retain(|d| d.deadlock.time.is_some());
            deadlock_summands.push(summand);
            return;
        }
    }

    if deadlock_summands.contains(&summand) {
        return;
    }
    deadlock_summands.push(summand);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{equal_to, false_, true_, DataExpression, Variable};

    #[test]
    fn communications_sort_lhs_and_rules() {
        let mut tab = SymbolTable::new();
        let a = tab.intern_name("a");
        let b = tab.intern_name("b");
        let c = tab.intern_name("c");
        let d = tab.intern_name("d");

        let sorted = sort_communications(vec![
            CommRule::new(vec![b, a], d),
            CommRule::new(vec![a, b], c),
        ]);
        assert_eq!(sorted[0], CommRule::new(vec![a, b], c));
        assert_eq!(sorted[1], CommRule::new(vec![a, b], d));
    }

    #[test]
    fn allow_lists_sort_inner_and_outer() {
        let mut tab = SymbolTable::new();
        let a = tab.intern_name("a");
        let b = tab.intern_name("b");
        let c = tab.intern_name("c");

        let sorted = sort_action_name_multisets(vec![vec![c], vec![b, a]]);
        assert_eq!(sorted, vec![vec![a, b], vec![c]]);
    }

    fn delta(condition: DataExpression, time: Option<DataExpression>) -> DeadlockSummand {
        DeadlockSummand {
            summation_variables: vec![],
            condition,
            deadlock: Deadlock { time },
        }
    }

    #[test]
    fn false_conditions_are_never_inserted() {
        let tab = SymbolTable::new();
        let mut summands = vec![];
        insert_timed_delta_summand(&mut summands, delta(false_(&tab), None), false, &tab);
        assert!(summands.is_empty());
    }

    #[test]
    fn duplicates_are_inserted_once() {
        let mut tab = SymbolTable::new();
        let nat = tab.intern_sort("Nat");
        let x = DataExpression::variable(Variable::new(tab.intern_name("x"), nat));
        let one = DataExpression::function_symbol(tab.intern_name("1"), nat);
        let cond = equal_to(&tab, x, one);

        let mut summands = vec![];
        insert_timed_delta_summand(&mut summands, delta(cond.clone(), None), false, &tab);
        insert_timed_delta_summand(&mut summands, delta(cond, None), false, &tab);
        assert_eq!(summands.len(), 1);
    }

    #[test]
    fn an_unconditional_deadlock_absorbs_under_ignore_time() {
        let mut tab = SymbolTable::new();
        let nat = tab.intern_sort("Nat");
        let x = DataExpression::variable(Variable::new(tab.intern_name("x"), nat));
        let one = DataExpression::function_symbol(tab.intern_name("1"), nat);
        let cond = equal_to(&tab, x, one.clone());

        let mut summands = vec![];
        insert_timed_delta_summand(&mut summands, delta(cond.clone(), Some(one.clone())), true, &tab);
        // the timestamp was discarded
        assert_eq!(summands[0].deadlock.time, None);

        insert_timed_delta_summand(&mut summands, delta(true_(&tab), None), true, &tab);
        assert_eq!(summands.len(), 1);
        assert!(summands[0].condition.is_true(&tab));

        // nothing further gets in
        insert_timed_delta_summand(&mut summands, delta(cond, None), true, &tab);
        assert_eq!(summands.len(), 1);
    }
}
