// Copyright 2024 Cornell University
// released under MIT License
// author: Francis Pham <fdp25@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use rustc_hash::FxHashMap;

use crate::data::{
    and_, occurs_in, substitute, true_, DataExpr, DataExpression, Variable,
};
use crate::ir::{Action, ActionSummand, MultiAction, SymbolTable};

/// Eliminates summation variables that the condition pins to a value.
///
/// Scans the conjuncts of the condition for an equality `v == e` (or
/// `e == v`) where `v` is a summation variable that does not occur in
/// `e`, substitutes `e` for `v` throughout the summand, removes the
/// consumed equality and drops `v` from the summation variables. Repeats
/// until no such equality is left. Returns whether anything changed.
pub fn sumelm(summand: &mut ActionSummand, tab: &SymbolTable) -> bool {
    let mut changed = false;

    loop {
        let mut cs = Vec::new();
        conjuncts(&summand.condition, tab, &mut cs);

        let mut binding = None;
        for (i, c) in cs.iter().enumerate() {
            if let Some(b) = equality_binding(c, &summand.summation_variables, tab) {
                binding = Some((i, b));
                break;
            }
        }
        let (consumed, (v, e)) = match binding {
            Some(b) => b,
            None => break,
        };

        let mut subs = FxHashMap::default();
        subs.insert(v, e);

        // rebuild the condition without the consumed equality
        let mut condition = true_(tab);
        for (i, c) in cs.iter().enumerate() {
            if i == consumed {
                continue;
            }
            condition = and_(tab, condition, substitute(c, &subs));
        }
        summand.condition = condition;

        summand.multi_action = substitute_multi_action(&summand.multi_action, &subs);
        summand.time = summand.time.as_ref().map(|t| substitute(t, &subs));
        for assignment in &mut summand.assignments {
            assignment.rhs = substitute(&assignment.rhs, &subs);
        }
        if let Some(dist) = &mut summand.distribution {
            if !dist.variables.contains(&v) {
                dist.density = substitute(&dist.density, &subs);
            }
        }
        summand.summation_variables.retain(|sv| sv != &v);
        changed = true;
    }

    changed
}

fn substitute_multi_action(
    ma: &MultiAction,
    subs: &FxHashMap<Variable, DataExpression>,
) -> MultiAction {
    let mut out = MultiAction::new();
    for action in ma.actions() {
        let args = action.args().iter().map(|e| substitute(e, subs)).collect();
        out = out.insert(&Action::new(action.label().clone(), args));
    }
    out
}

/// Splits a condition into its `&&` conjuncts, in order.
fn conjuncts(expr: &DataExpression, tab: &SymbolTable, out: &mut Vec<DataExpression>) {
    if let DataExpr::Application { head, args } = expr.kind() {
        if let DataExpr::FunctionSymbol { name, .. } = head.kind() {
            if *name == tab.name_and() && args.len() == 2 {
                conjuncts(&args[0], tab, out);
                conjuncts(&args[1], tab, out);
                return;
            }
        }
    }
    out.push(expr.clone());
}

/// If `expr` is an equality that determines one of the `sumvars`, returns
/// the variable and its value. Self-referential equalities do not count.
fn equality_binding(
    expr: &DataExpression,
    sumvars: &[Variable],
    tab: &SymbolTable,
) -> Option<(Variable, DataExpression)> {
    let (head, args) = match expr.kind() {
        DataExpr::Application { head, args } => (head, args),
        _ => return None,
    };
    match head.kind() {
        DataExpr::FunctionSymbol { name, .. } if *name == tab.name_equal() && args.len() == 2 => {}
        _ => return None,
    }

    if let DataExpr::Variable(v) = args[0].kind() {
        if sumvars.contains(v) && !occurs_in(&args[1], v) {
            return Some((*v, args[1].clone()));
        }
    }
    if let DataExpr::Variable(v) = args[1].kind() {
        if sumvars.contains(v) && !occurs_in(&args[0], v) {
            return Some((*v, args[0].clone()));
        }
    }
    None
}
