// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Francis Pham <fdp25@cornell.edu>

use itertools::Itertools;

use crate::data::{Binder, DataExpr, DataExpression, Variable};
use crate::ir::{
    Action, ActionSummand, CommRule, DeadlockSummand, MultiAction, SymbolTable,
};

/// Pretty-prints a `Variable` with its sort, e.g. `x: Nat`
pub fn serialize_variable(tab: &SymbolTable, v: &Variable) -> String {
    format!("{}: {}", &tab[v.name], &tab[v.sort])
}

/// Pretty-prints a `DataExpression` with respect to the current
/// `SymbolTable`. The Boolean connectives render infix with explicit
/// parentheses; everything else renders as an application.
pub fn serialize_expr(tab: &SymbolTable, expr: &DataExpression) -> String {
    match expr.kind() {
        DataExpr::Variable(v) => tab[v.name].to_string(),
        DataExpr::FunctionSymbol { name, .. } => tab[*name].to_string(),
        DataExpr::Application { head, args } => {
            if let DataExpr::FunctionSymbol { name, .. } = head.kind() {
                if args.len() == 2
                    && (*name == tab.name_equal()
                        || *name == tab.name_and()
                        || *name == tab.name_or())
                {
                    return format!(
                        "({} {} {})",
                        serialize_expr(tab, &args[0]),
                        &tab[*name],
                        serialize_expr(tab, &args[1])
                    );
                }
                if args.len() == 1 && *name == tab.name_not() {
                    return format!("!{}", serialize_expr(tab, &args[0]));
                }
            }
            format!(
                "{}({})",
                serialize_expr(tab, head),
                args.iter().map(|a| serialize_expr(tab, a)).join(", ")
            )
        }
        DataExpr::Abstraction {
            binder,
            variables,
            body,
        } => {
            let keyword = match binder {
                Binder::Lambda => "lambda",
                Binder::Forall => "forall",
                Binder::Exists => "exists",
            };
            format!(
                "{} {}. {}",
                keyword,
                variables.iter().map(|v| serialize_variable(tab, v)).join(", "),
                serialize_expr(tab, body)
            )
        }
        DataExpr::WhereClause { body, declarations } => {
            format!(
                "{} whr {} end",
                serialize_expr(tab, body),
                declarations
                    .iter()
                    .map(|(v, e)| format!("{} = {}", &tab[v.name], serialize_expr(tab, e)))
                    .join(", ")
            )
        }
    }
}

/// Pretty-prints an `Action`, e.g. `a(x, y)`
pub fn serialize_action(tab: &SymbolTable, action: &Action) -> String {
    if action.args().is_empty() {
        tab[action.label().name].to_string()
    } else {
        format!(
            "{}({})",
            &tab[action.label().name],
            action.args().iter().map(|a| serialize_expr(tab, a)).join(", ")
        )
    }
}

/// Pretty-prints a `MultiAction`; the empty multi-action renders as `tau`
pub fn serialize_multi_action(tab: &SymbolTable, ma: &MultiAction) -> String {
    if ma.is_empty() {
        return "tau".to_string();
    }
    ma.actions()
        .iter()
        .map(|a| serialize_action(tab, a))
        .join("|")
}

/// Pretty-prints a communication rule, e.g. `a|b -> c`
pub fn serialize_comm_rule(tab: &SymbolTable, rule: &CommRule) -> String {
    format!(
        "{} -> {}",
        rule.lhs.iter().map(|n| &tab[*n]).join("|"),
        &tab[rule.rhs]
    )
}

/// Pretty-prints an action summand in the concrete summand syntax
pub fn serialize_action_summand(tab: &SymbolTable, s: &ActionSummand) -> String {
    let mut out = String::new();
    if !s.summation_variables.is_empty() {
        out.push_str("sum ");
        out.push_str(
            &s.summation_variables
                .iter()
                .map(|v| serialize_variable(tab, v))
                .join(", "),
        );
        out.push_str(" . ");
    }
    out.push_str(&serialize_expr(tab, &s.condition));
    out.push_str(" -> ");
    out.push_str(&serialize_multi_action(tab, &s.multi_action));
    if let Some(time) = &s.time {
        out.push_str(" @ ");
        out.push_str(&serialize_expr(tab, time));
    }
    if !s.assignments.is_empty() {
        out.push_str(" . ");
        out.push_str(
            &s.assignments
                .iter()
                .map(|a| format!("{} := {}", &tab[a.lhs.name], serialize_expr(tab, &a.rhs)))
                .join(", "),
        );
    }
    out
}

/// Pretty-prints a deadlock summand
pub fn serialize_deadlock_summand(tab: &SymbolTable, s: &DeadlockSummand) -> String {
    let mut out = String::new();
    if !s.summation_variables.is_empty() {
        out.push_str("sum ");
        out.push_str(
            &s.summation_variables
                .iter()
                .map(|v| serialize_variable(tab, v))
                .join(", "),
        );
        out.push_str(" . ");
    }
    out.push_str(&serialize_expr(tab, &s.condition));
    out.push_str(" -> delta");
    if let Some(time) = &s.deadlock.time {
        out.push_str(" @ ");
        out.push_str(&serialize_expr(tab, time));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{and_, equal_to, not_, true_};
    use crate::ir::{ActionLabel, Assignment, Deadlock};

    #[test]
    fn expressions_render_infix() {
        let mut tab = SymbolTable::new();
        let nat = tab.intern_sort("Nat");
        let x = DataExpression::variable(Variable::new(tab.intern_name("x"), nat));
        let one = DataExpression::function_symbol(tab.intern_name("1"), nat);

        let expr = and_(
            &tab,
            equal_to(&tab, x.clone(), one.clone()),
            not_(&tab, equal_to(&tab, one.clone(), x.clone())),
        );
        assert_eq!(serialize_expr(&tab, &expr), "((x == 1) && !(1 == x))");
    }

    #[test]
    fn summands_render_in_concrete_syntax() {
        let mut tab = SymbolTable::new();
        let nat = tab.intern_sort("Nat");
        let x = Variable::new(tab.intern_name("x"), nat);
        let s_param = Variable::new(tab.intern_name("s"), nat);
        let a = tab.intern_name("a");

        let summand = ActionSummand {
            summation_variables: vec![x],
            condition: true_(&tab),
            multi_action: MultiAction::from_action(Action::new(
                ActionLabel::new(a, vec![nat]),
                vec![DataExpression::variable(x)],
            )),
            time: None,
            assignments: vec![Assignment {
                lhs: s_param,
                rhs: DataExpression::variable(x),
            }],
            distribution: None,
        };
        assert_eq!(
            serialize_action_summand(&tab, &summand),
            "sum x: Nat . true -> a(x) . s := x"
        );

        let deadlock = DeadlockSummand {
            summation_variables: vec![],
            condition: true_(&tab),
            deadlock: Deadlock { time: None },
        };
        assert_eq!(serialize_deadlock_summand(&tab, &deadlock), "true -> delta");
    }

    #[test]
    fn the_empty_multi_action_is_tau() {
        let tab = SymbolTable::new();
        assert_eq!(serialize_multi_action(&tab, &MultiAction::new()), "tau");
    }

    #[test]
    fn comm_rules_render_with_their_arrow() {
        let mut tab = SymbolTable::new();
        let a = tab.intern_name("a");
        let b = tab.intern_name("b");
        let c = tab.intern_name("c");
        let rule = CommRule::new(vec![a, b], c);
        assert_eq!(serialize_comm_rule(&tab, &rule), "a|b -> c");
    }
}
