// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::ir::{NameId, SortId, SymbolTable};

/// A typed data variable.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Variable {
    pub name: NameId,
    pub sort: SortId,
}

impl Variable {
    pub fn new(name: NameId, sort: SortId) -> Self {
        Self { name, sort }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Binder {
    Lambda,
    Forall,
    Exists,
}

/// The shapes a data expression can take. The communication pass treats
/// expressions opaquely; this enum exists for construction, substitution
/// and pretty-printing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataExpr {
    Variable(Variable),
    FunctionSymbol {
        name: NameId,
        /// The result sort of the symbol
        sort: SortId,
    },
    Application {
        head: DataExpression,
        args: Vec<DataExpression>,
    },
    Abstraction {
        binder: Binder,
        variables: Vec<Variable>,
        body: DataExpression,
    },
    WhereClause {
        body: DataExpression,
        declarations: Vec<(Variable, DataExpression)>,
    },
}

/// An immutable data expression tree with structural sharing. Cloning is a
/// reference-count bump; equality is structural with a pointer fast path.
#[derive(Debug, Clone)]
pub struct DataExpression(Rc<DataExpr>);

impl PartialEq for DataExpression {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for DataExpression {}

impl DataExpression {
    pub fn variable(variable: Variable) -> Self {
        Self(Rc::new(DataExpr::Variable(variable)))
    }

    pub fn function_symbol(name: NameId, sort: SortId) -> Self {
        Self(Rc::new(DataExpr::FunctionSymbol { name, sort }))
    }

    pub fn application(head: DataExpression, args: Vec<DataExpression>) -> Self {
        Self(Rc::new(DataExpr::Application { head, args }))
    }

    pub fn abstraction(binder: Binder, variables: Vec<Variable>, body: DataExpression) -> Self {
        Self(Rc::new(DataExpr::Abstraction {
            binder,
            variables,
            body,
        }))
    }

    pub fn where_clause(
        body: DataExpression,
        declarations: Vec<(Variable, DataExpression)>,
    ) -> Self {
        Self(Rc::new(DataExpr::WhereClause { body, declarations }))
    }

    pub fn kind(&self) -> &DataExpr {
        &self.0
    }

    /// The sort of the expression. Applications take the result sort of
    /// their head; binders and where-clauses take the sort of their body.
    pub fn sort(&self) -> SortId {
        match self.kind() {
            DataExpr::Variable(v) => v.sort,
            DataExpr::FunctionSymbol { sort, .. } => *sort,
            DataExpr::Application { head, .. } => head.sort(),
            DataExpr::Abstraction { body, .. } => body.sort(),
            DataExpr::WhereClause { body, .. } => body.sort(),
        }
    }

    /// Whether this is the canonical Boolean literal `true`.
    pub fn is_true(&self, tab: &SymbolTable) -> bool {
        matches!(self.kind(), DataExpr::FunctionSymbol { name, .. } if *name == tab.name_true())
    }

    /// Whether this is the canonical Boolean literal `false`.
    pub fn is_false(&self, tab: &SymbolTable) -> bool {
        matches!(self.kind(), DataExpr::FunctionSymbol { name, .. } if *name == tab.name_false())
    }
}

pub fn true_(tab: &SymbolTable) -> DataExpression {
    DataExpression::function_symbol(tab.name_true(), tab.sort_bool())
}

pub fn false_(tab: &SymbolTable) -> DataExpression {
    DataExpression::function_symbol(tab.name_false(), tab.sort_bool())
}

/// Lazy conjunction: shortcuts on the canonical literals and on equal
/// operands instead of building a redundant node.
pub fn and_(tab: &SymbolTable, p: DataExpression, q: DataExpression) -> DataExpression {
    if p.is_true(tab) {
        return q;
    }
    if q.is_true(tab) {
        return p;
    }
    if p.is_false(tab) || q.is_false(tab) {
        return false_(tab);
    }
    if p == q {
        return p;
    }
    DataExpression::application(
        DataExpression::function_symbol(tab.name_and(), tab.sort_bool()),
        vec![p, q],
    )
}

/// Lazy disjunction, dual to [`and_`].
pub fn or_(tab: &SymbolTable, p: DataExpression, q: DataExpression) -> DataExpression {
    if p.is_false(tab) {
        return q;
    }
    if q.is_false(tab) {
        return p;
    }
    if p.is_true(tab) || q.is_true(tab) {
        return true_(tab);
    }
    if p == q {
        return p;
    }
    DataExpression::application(
        DataExpression::function_symbol(tab.name_or(), tab.sort_bool()),
        vec![p, q],
    )
}

/// Lazy negation: flips the literals, otherwise builds `!p`.
pub fn not_(tab: &SymbolTable, p: DataExpression) -> DataExpression {
    if p.is_true(tab) {
        return false_(tab);
    }
    if p.is_false(tab) {
        return true_(tab);
    }
    DataExpression::application(
        DataExpression::function_symbol(tab.name_not(), tab.sort_bool()),
        vec![p],
    )
}

/// Equality between two data expressions. Syntactically equal operands
/// collapse to `true`; anything else stays symbolic for the rewriter.
pub fn equal_to(tab: &SymbolTable, lhs: DataExpression, rhs: DataExpression) -> DataExpression {
    if lhs == rhs {
        return true_(tab);
    }
    DataExpression::application(
        DataExpression::function_symbol(tab.name_equal(), tab.sort_bool()),
        vec![lhs, rhs],
    )
}

/// Whether `var` occurs free in `expr`. Binders and where-clause
/// declarations shadow.
pub fn occurs_in(expr: &DataExpression, var: &Variable) -> bool {
    match expr.kind() {
        DataExpr::Variable(v) => v == var,
        DataExpr::FunctionSymbol { .. } => false,
        DataExpr::Application { head, args } => {
            occurs_in(head, var) || args.iter().any(|a| occurs_in(a, var))
        }
        DataExpr::Abstraction {
            variables, body, ..
        } => !variables.contains(var) && occurs_in(body, var),
        DataExpr::WhereClause { body, declarations } => {
            let shadowed = declarations.iter().any(|(v, _)| v == var);
            (!shadowed && occurs_in(body, var))
                || declarations.iter().any(|(_, e)| occurs_in(e, var))
        }
    }
}

/// Applies the substitution `subs` to the free variables of `expr`.
/// Bound variables shadow their entry in the map for the scope of the
/// binder.
pub fn substitute(
    expr: &DataExpression,
    subs: &FxHashMap<Variable, DataExpression>,
) -> DataExpression {
    if subs.is_empty() {
        return expr.clone();
    }
    match expr.kind() {
        DataExpr::Variable(v) => subs.get(v).cloned().unwrap_or_else(|| expr.clone()),
        DataExpr::FunctionSymbol { .. } => expr.clone(),
        DataExpr::Application { head, args } => DataExpression::application(
            substitute(head, subs),
            args.iter().map(|a| substitute(a, subs)).collect(),
        ),
        DataExpr::Abstraction {
            binder,
            variables,
            body,
        } => {
            let inner: FxHashMap<Variable, DataExpression> = subs
                .iter()
                .filter(|(v, _)| !variables.contains(v))
                .map(|(v, e)| (*v, e.clone()))
                .collect();
            DataExpression::abstraction(*binder, variables.clone(), substitute(body, &inner))
        }
        DataExpr::WhereClause { body, declarations } => {
            let inner: FxHashMap<Variable, DataExpression> = subs
                .iter()
                .filter(|(v, _)| !declarations.iter().any(|(d, _)| d == *v))
                .map(|(v, e)| (*v, e.clone()))
                .collect();
            DataExpression::where_clause(
                substitute(body, &inner),
                declarations
                    .iter()
                    .map(|(v, e)| (*v, substitute(e, subs)))
                    .collect(),
            )
        }
    }
}
