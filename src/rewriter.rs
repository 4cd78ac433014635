// Copyright 2024 Cornell University
// released under MIT License
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use crate::data::{and_, equal_to, false_, not_, or_, true_, DataExpr, DataExpression};
use crate::errors::RewriteError;
use crate::ir::SymbolTable;

/// Normaliser on data expressions, supplied by the caller of the pass.
/// Implementations must be idempotent and must produce the canonical
/// `true`/`false` literals where a term reduces to one of them.
pub trait Rewriter {
    fn rewrite(
        &self,
        expr: &DataExpression,
        tab: &SymbolTable,
    ) -> Result<DataExpression, RewriteError>;
}

impl<F> Rewriter for F
where
    F: Fn(&DataExpression, &SymbolTable) -> Result<DataExpression, RewriteError>,
{
    fn rewrite(
        &self,
        expr: &DataExpression,
        tab: &SymbolTable,
    ) -> Result<DataExpression, RewriteError> {
        self(expr, tab)
    }
}

/// Leaves every term untouched. Useful when conditions should stay fully
/// symbolic.
pub struct IdentityRewriter;

impl Rewriter for IdentityRewriter {
    fn rewrite(
        &self,
        expr: &DataExpression,
        _tab: &SymbolTable,
    ) -> Result<DataExpression, RewriteError> {
        Ok(expr.clone())
    }
}

/// Syntactic Boolean normaliser: folds the connectives through the lazy
/// constructors and decides `==` where syntax allows. Ground terms are
/// treated as freely constructed, so two distinct ground operands fold to
/// `false`.
pub struct BooleanRewriter;

impl Rewriter for BooleanRewriter {
    fn rewrite(
        &self,
        expr: &DataExpression,
        tab: &SymbolTable,
    ) -> Result<DataExpression, RewriteError> {
        Ok(fold(expr, tab))
    }
}

fn fold(expr: &DataExpression, tab: &SymbolTable) -> DataExpression {
    match expr.kind() {
        DataExpr::Application { head, args } => {
            let args: Vec<DataExpression> = args.iter().map(|a| fold(a, tab)).collect();
            if let DataExpr::FunctionSymbol { name, .. } = head.kind() {
                if *name == tab.name_and() && args.len() == 2 {
                    return and_(tab, args[0].clone(), args[1].clone());
                }
                if *name == tab.name_or() && args.len() == 2 {
                    return or_(tab, args[0].clone(), args[1].clone());
                }
                if *name == tab.name_not() && args.len() == 1 {
                    return not_(tab, args[0].clone());
                }
                if *name == tab.name_equal() && args.len() == 2 {
                    if args[0] == args[1] {
                        return true_(tab);
                    }
                    if is_ground(&args[0]) && is_ground(&args[1]) {
                        return false_(tab);
                    }
                    return equal_to(tab, args[0].clone(), args[1].clone());
                }
            }
            DataExpression::application(fold(head, tab), args)
        }
        _ => expr.clone(),
    }
}

fn is_ground(expr: &DataExpression) -> bool {
    match expr.kind() {
        DataExpr::Variable(_) => false,
        DataExpr::FunctionSymbol { .. } => true,
        DataExpr::Application { head, args } => is_ground(head) && args.iter().all(is_ground),
        DataExpr::Abstraction { .. } | DataExpr::WhereClause { .. } => false,
    }
}
