// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Francis Pham <fdp25@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use crate::comm_table::CommTable;
use crate::data::{and_, equal_to, false_, not_, or_, true_, DataExpression};
use crate::errors::LineariseResult;
use crate::ir::{Action, MultiAction, SymbolTable};
use crate::rewriter::Rewriter;

/// Pairs of multi-actions and the condition under which each one can
/// occur. The two vectors run in parallel; alternatives whose condition is
/// literally `false` are never stored.
#[derive(Debug, Default)]
pub struct TupleList {
    multi_actions: Vec<MultiAction>,
    conditions: Vec<DataExpression>,
}

impl TupleList {
    pub fn size(&self) -> usize {
        debug_assert_eq!(self.multi_actions.len(), self.conditions.len());
        self.multi_actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn push(&mut self, multi_action: MultiAction, condition: DataExpression) {
        self.multi_actions.push(multi_action);
        self.conditions.push(condition);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MultiAction, &DataExpression)> {
        self.multi_actions.iter().zip(self.conditions.iter())
    }

    pub fn into_pairs(self) -> impl Iterator<Item = (MultiAction, DataExpression)> {
        self.multi_actions.into_iter().zip(self.conditions)
    }
}

/// Symbolic equality of two argument lists: `false` on length or sort
/// mismatch, otherwise the rewritten pairwise equalities conjoined
/// lazily.
pub fn pairwise_match<R: Rewriter>(
    l1: &[DataExpression],
    l2: &[DataExpression],
    tab: &SymbolTable,
    rewriter: &R,
) -> LineariseResult<DataExpression> {
    if l1.len() != l2.len() {
        return Ok(false_(tab));
    }
    let mut result = true_(tab);
    for (t1, t2) in l1.iter().zip(l2) {
        if t1.sort() != t2.sort() {
            return Ok(false_(tab));
        }
        let eq = rewriter.rewrite(&equal_to(tab, t1.clone(), t2.clone()), tab)?;
        result = and_(tab, result, eq);
    }
    Ok(result)
}

/// Extends `s` to `s ++ l'`, where `l'` is `l` with `firstaction` inserted
/// into every multi-action and every condition strengthened by
/// `condition`.
///
/// `l` is taken by value: the caller hands over ownership, and when `s` is
/// still empty the storage of `l` is moved wholesale instead of copied.
fn add_action_condition(
    firstaction: Option<&Action>,
    condition: &DataExpression,
    mut l: TupleList,
    s: &mut TupleList,
    tab: &SymbolTable,
) {
    // an alternative that cannot happen must not be added
    debug_assert!(!condition.is_false(tab));

    if s.size() == 0 {
        if let Some(action) = firstaction {
            for m in &mut l.multi_actions {
                *m = std::mem::take(m).insert_owned(action.clone());
            }
        }
        for x in &mut l.conditions {
            *x = and_(tab, x.clone(), condition.clone());
        }
        *s = l;
        return;
    }

    match firstaction {
        None => s.multi_actions.extend(l.multi_actions),
        Some(action) => {
            for m in l.multi_actions {
                s.multi_actions.push(m.insert_owned(action.clone()));
            }
        }
    }
    for x in l.conditions {
        s.conditions.push(and_(tab, x, condition.clone()));
    }
}

/// Yields the ways in which the actions of `m|w|n` can communicate, as a
/// list of result multi-actions paired with the data conditions under
/// which the communication happens. All of `m`, none of `w` and any
/// subset of `n` take part; `d` is the shared data parameter of the
/// communication.
fn phi<R: Rewriter>(
    m: &MultiAction,
    d: &[DataExpression],
    w: &MultiAction,
    n: &[Action],
    r: &MultiAction,
    comm_table: &mut CommTable,
    tab: &SymbolTable,
    rewriter: &R,
) -> LineariseResult<TupleList> {
    if !comm_table.might_communicate(m, n) {
        return Ok(TupleList::default());
    }

    if n.is_empty() {
        if let Some(c) = comm_table.can_communicate(m, tab)? {
            let t = multi_action_condition_list_aux(w.actions(), comm_table, r, tab, rewriter)?;
            let mut result = TupleList::default();
            add_action_condition(
                Some(&Action::new(c, d.to_vec())),
                &true_(tab),
                t,
                &mut result,
                tab,
            );
            return Ok(result);
        }
        // the actions in m cannot communicate
        return Ok(TupleList::default());
    }

    let firstaction = &n[0];

    let condition = pairwise_match(d, firstaction.args(), tab, rewriter)?;
    if condition.is_false(tab) {
        // the arguments can never match; firstaction moves to w
        phi(
            m,
            d,
            &w.insert(firstaction),
            &n[1..],
            r,
            comm_table,
            tab,
            rewriter,
        )
    } else {
        let t = phi(
            &m.insert(firstaction),
            d,
            w,
            &n[1..],
            r,
            comm_table,
            tab,
            rewriter,
        )?;
        let mut result = phi(
            m,
            d,
            &w.insert(firstaction),
            &n[1..],
            r,
            comm_table,
            tab,
            rewriter,
        )?;
        add_action_condition(None, &condition, t, &mut result, tab);
        Ok(result)
    }
}

/// True iff some subset of `beta` extends `alpha` into a multiset that
/// communicates.
fn xi(
    alpha: &MultiAction,
    beta: &[Action],
    comm_table: &mut CommTable,
    tab: &SymbolTable,
) -> LineariseResult<bool> {
    if beta.is_empty() {
        return Ok(comm_table.can_communicate(alpha, tab)?.is_some());
    }

    let alpha_ = alpha.insert(&beta[0]);
    if comm_table.can_communicate(&alpha_, tab)?.is_some() {
        return Ok(true);
    }

    xi(alpha, &beta[1..], comm_table, tab)
}

/// The condition under which no pair of actions in `r` is forced to
/// communicate: the negated disjunction, over all pairs that could be
/// part of a communication, of their argument equalities.
fn psi<R: Rewriter>(
    r: &MultiAction,
    comm_table: &mut CommTable,
    tab: &SymbolTable,
    rewriter: &R,
) -> LineariseResult<DataExpression> {
    let r_reverse = r.reverse();
    let acts = r_reverse.actions();

    let mut cond = false_(tab);
    for i in 0..acts.len() {
        for j in (i + 1)..acts.len() {
            let actl = MultiAction::new().insert(&acts[j]).insert(&acts[i]);
            let tail = &acts[j + 1..];
            if comm_table.might_communicate(&actl, tail)
                && xi(&actl, tail, comm_table, tab)?
            {
                cond = or_(
                    tab,
                    cond,
                    pairwise_match(acts[i].args(), acts[j].args(), tab, rewriter)?,
                );
            }
        }
    }
    Ok(not_(tab, cond))
}

fn multi_action_condition_list_aux<R: Rewriter>(
    m: &[Action],
    comm_table: &mut CommTable,
    r: &MultiAction,
    tab: &SymbolTable,
    rewriter: &R,
) -> LineariseResult<TupleList> {
    if m.is_empty() {
        let condition = if r.is_empty() {
            true_(tab)
        } else {
            psi(r, comm_table, tab, rewriter)?
        };
        let mut t = TupleList::default();
        // psi may rule the refused context out entirely
        if !condition.is_false(tab) {
            t.push(MultiAction::new(), condition);
        }
        return Ok(t);
    }

    let firstaction = &m[0];

    let mut s = phi(
        &MultiAction::from_action(firstaction.clone()),
        firstaction.args(),
        &MultiAction::new(),
        &m[1..],
        r,
        comm_table,
        tab,
        rewriter,
    )?;

    let t = multi_action_condition_list_aux(
        &m[1..],
        comm_table,
        &r.insert(firstaction),
        tab,
        rewriter,
    )?;
    add_action_condition(Some(firstaction), &true_(tab), t, &mut s, tab);
    Ok(s)
}

/// Enumerates all semantically distinct multi-actions the communication
/// operator can turn `multiaction` into, each paired with the data
/// condition under which it occurs. The alternatives come out in
/// depth-first order over the action positions of `multiaction`; their
/// conditions exclude one another, and if no communication applies the
/// original multi-action is delivered under condition `true`.
pub fn multi_action_condition_list<R: Rewriter>(
    multiaction: &MultiAction,
    comm_table: &mut CommTable,
    tab: &SymbolTable,
    rewriter: &R,
) -> LineariseResult<TupleList> {
    let r = MultiAction::new();
    multi_action_condition_list_aux(multiaction.actions(), comm_table, &r, tab, rewriter)
}
