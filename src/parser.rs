// Copyright 2025 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Francis Pham <fdp25@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use pest::error::InputLocation;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::PrattParser;
use pest::Parser;
use pest_derive::Parser;
use rustc_hash::FxHashMap;

use crate::data::{and_, equal_to, false_, not_, or_, true_, DataExpression, Variable};
use crate::diagnostic::{DiagnosticHandler, Level};
use crate::ir::{
    Action, ActionLabel, ActionSummand, Assignment, CommRule, DeadlockSummand, MultiAction,
    NameId, SortId, SymbolTable,
};

#[derive(Parser)]
#[grammar = "process.pest"]
struct ProcessParser;

lazy_static::lazy_static! {
    static ref PRATT_PARSER: PrattParser<Rule> = {
        use pest::pratt_parser::{Assoc::*, Op};
        use Rule::*;

        // Precedence is defined lowest to highest
        PrattParser::new()
            .op(Op::infix(op_or, Left))
            .op(Op::infix(op_and, Left))
            .op(Op::infix(op_eq, Left))
            .op(Op::prefix(op_not))
    };
}

/// The parsed content of one specification file: the interned symbols,
/// declared action signatures, the communication function, the filter
/// lists and the summands of the linear process.
#[derive(Debug)]
pub struct ProcessSpecification {
    pub table: SymbolTable,
    pub action_declarations: FxHashMap<NameId, Vec<SortId>>,
    pub communications: Vec<CommRule>,
    pub allow_list: Vec<Vec<NameId>>,
    pub block_list: Vec<NameId>,
    pub action_summands: Vec<ActionSummand>,
    pub deadlock_summands: Vec<DeadlockSummand>,
}

/// Context-free expression tree produced by the Pratt parser; symbol
/// resolution happens in a second phase against the summand scope.
enum ParsedExpr {
    True,
    False,
    Number(String),
    Ident(String),
    Call(String, Vec<ParsedExpr>),
    Not(Box<ParsedExpr>),
    Binary(ParsedOp, Box<ParsedExpr>, Box<ParsedExpr>),
}

enum ParsedOp {
    Eq,
    And,
    Or,
}

fn build_parsed_expr(pairs: Pairs<Rule>) -> ParsedExpr {
    PRATT_PARSER
        .map_primary(|primary| match primary.as_rule() {
            Rule::bool_true => ParsedExpr::True,
            Rule::bool_false => ParsedExpr::False,
            Rule::number => ParsedExpr::Number(primary.as_str().to_string()),
            Rule::ident => ParsedExpr::Ident(primary.as_str().to_string()),
            Rule::call => {
                let mut inner = primary.into_inner();
                let name = inner.next().unwrap().as_str().to_string();
                let args = inner
                    .next()
                    .map(|arg_list| {
                        arg_list
                            .into_inner()
                            .map(|e| build_parsed_expr(e.into_inner()))
                            .collect()
                    })
                    .unwrap_or_default();
                ParsedExpr::Call(name, args)
            }
            Rule::paren_expr => build_parsed_expr(primary.into_inner().next().unwrap().into_inner()),
            rule => unreachable!("unexpected primary {:?}", rule),
        })
        .map_prefix(|op, rhs| match op.as_rule() {
            Rule::op_not => ParsedExpr::Not(Box::new(rhs)),
            rule => unreachable!("unexpected prefix {:?}", rule),
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::op_eq => ParsedOp::Eq,
                Rule::op_and => ParsedOp::And,
                Rule::op_or => ParsedOp::Or,
                rule => unreachable!("unexpected infix {:?}", rule),
            };
            ParsedExpr::Binary(op, Box::new(lhs), Box::new(rhs))
        })
        .parse(pairs)
}

struct ParserContext<'a> {
    tab: SymbolTable,
    action_declarations: FxHashMap<NameId, Vec<SortId>>,
    handler: &'a mut DiagnosticHandler,
    fileid: usize,
}

impl ParserContext<'_> {
    fn error(&mut self, message: String, pair: &Pair<Rule>) -> String {
        let span = pair.as_span();
        self.handler.emit_diagnostic_span(
            &message,
            self.fileid,
            span.start(),
            span.end(),
            Level::Error,
        );
        message
    }

    fn lookup_sort(&mut self, pair: &Pair<Rule>) -> Result<SortId, String> {
        match self.tab.sort_id(pair.as_str()) {
            Some(id) => Ok(id),
            None => {
                let msg = format!("Sort '{}' has not been declared", pair.as_str());
                Err(self.error(msg, pair))
            }
        }
    }

    fn lookup_action(&mut self, pair: &Pair<Rule>) -> Result<(NameId, Vec<SortId>), String> {
        if let Some(id) = self.tab.name_id(pair.as_str()) {
            if let Some(sorts) = self.action_declarations.get(&id) {
                return Ok((id, sorts.clone()));
            }
        }
        let msg = format!("Action '{}' has not been declared", pair.as_str());
        Err(self.error(msg, pair))
    }

    fn parse_sort_decl(&mut self, pair: Pair<Rule>) {
        let ident = pair.into_inner().next().unwrap();
        self.tab.intern_sort(ident.as_str());
    }

    fn parse_act_decl(&mut self, pair: Pair<Rule>) -> Result<(), String> {
        let mut inner = pair.into_inner();
        let ident_list = inner.next().unwrap();

        let mut sorts = Vec::new();
        if let Some(sort_list) = inner.next() {
            for sort_pair in sort_list.into_inner() {
                sorts.push(self.lookup_sort(&sort_pair)?);
            }
        }

        for ident in ident_list.into_inner() {
            let name = self.tab.intern_name(ident.as_str());
            if self.action_declarations.contains_key(&name) {
                let msg = format!("Action '{}' is declared twice", ident.as_str());
                return Err(self.error(msg, &ident));
            }
            self.action_declarations.insert(name, sorts.clone());
        }
        Ok(())
    }

    fn parse_comm_decl(&mut self, pair: Pair<Rule>) -> Result<CommRule, String> {
        let mut lhs = Vec::new();
        let mut lhs_sorts: Option<Vec<SortId>> = None;
        let mut rhs = None;

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::ident => {
                    let (name, sorts) = self.lookup_action(&p)?;
                    // synchronising actions must agree on their signature
                    match &lhs_sorts {
                        None => lhs_sorts = Some(sorts),
                        Some(expected) if *expected != sorts => {
                            let msg = format!(
                                "Action '{}' has a different signature than the other actions \
                                 in this communication",
                                p.as_str()
                            );
                            return Err(self.error(msg, &p));
                        }
                        Some(_) => {}
                    }
                    lhs.push(name);
                }
                Rule::comm_result => {
                    let result = p.into_inner().next().unwrap();
                    let name = match result.as_rule() {
                        Rule::tau_action => self.tab.tau(),
                        _ => {
                            let name = self.tab.intern_name(result.as_str());
                            let sorts = lhs_sorts.clone().unwrap_or_default();
                            match self.action_declarations.get(&name) {
                                Some(declared) if *declared != sorts => {
                                    let msg = format!(
                                        "Action '{}' is declared with a different signature \
                                         than this communication produces",
                                        result.as_str()
                                    );
                                    return Err(self.error(msg, &result));
                                }
                                Some(_) => {}
                                None => {
                                    self.action_declarations.insert(name, sorts);
                                }
                            }
                            name
                        }
                    };
                    rhs = Some(name);
                }
                rule => unreachable!("unexpected rule {:?} in communication", rule),
            }
        }

        Ok(CommRule::new(lhs, rhs.unwrap()))
    }

    fn parse_name_multiset(&mut self, pair: Pair<Rule>) -> Result<Vec<NameId>, String> {
        let mut names = Vec::new();
        for ident in pair.into_inner() {
            let (name, _) = self.lookup_action(&ident)?;
            names.push(name);
        }
        Ok(names)
    }

    fn parse_summand(&mut self, pair: Pair<Rule>) -> Result<ActionSummand, String> {
        let mut summation_variables = Vec::new();
        let mut scope: FxHashMap<String, Variable> = FxHashMap::default();
        let mut condition = true_(&self.tab);
        let mut multi_action = MultiAction::new();
        let mut time = None;
        let mut assignments = Vec::new();

        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::sum_binder => {
                    for var_decl in p.into_inner() {
                        let mut inner = var_decl.into_inner();
                        let name_pair = inner.next().unwrap();
                        let sort_pair = inner.next().unwrap();
                        let sort = self.lookup_sort(&sort_pair)?;
                        let variable =
                            Variable::new(self.tab.intern_name(name_pair.as_str()), sort);
                        scope.insert(name_pair.as_str().to_string(), variable);
                        summation_variables.push(variable);
                    }
                }
                Rule::expr => {
                    condition = self.lower_expr(&build_parsed_expr(p.into_inner()), None, &scope)?;
                }
                Rule::multi_action => {
                    multi_action = self.parse_multi_action(p, &scope)?;
                }
                Rule::time_stamp => {
                    let expr = p.into_inner().next().unwrap();
                    time =
                        Some(self.lower_expr(&build_parsed_expr(expr.into_inner()), None, &scope)?);
                }
                Rule::next_state => {
                    for assignment in p.into_inner() {
                        let mut inner = assignment.into_inner();
                        let lhs_pair = inner.next().unwrap();
                        let rhs_pair = inner.next().unwrap();
                        let rhs = self.lower_expr(
                            &build_parsed_expr(rhs_pair.into_inner()),
                            None,
                            &scope,
                        )?;
                        let lhs = Variable::new(self.tab.intern_name(lhs_pair.as_str()), rhs.sort());
                        assignments.push(Assignment { lhs, rhs });
                    }
                }
                rule => unreachable!("unexpected rule {:?} in summand", rule),
            }
        }

        Ok(ActionSummand {
            summation_variables,
            condition,
            multi_action,
            time,
            assignments,
            distribution: None,
        })
    }

    fn parse_multi_action(
        &mut self,
        pair: Pair<Rule>,
        scope: &FxHashMap<String, Variable>,
    ) -> Result<MultiAction, String> {
        let mut multi_action = MultiAction::new();
        for action_ref in pair.into_inner() {
            if action_ref.as_rule() == Rule::tau_action {
                // tau is the empty multi-action
                return Ok(MultiAction::new());
            }
            let span_pair = action_ref.clone();
            let mut inner = action_ref.into_inner();
            let name_pair = inner.next().unwrap();
            let (name, sorts) = self.lookup_action(&name_pair)?;

            let arg_pairs: Vec<Pair<Rule>> = inner
                .next()
                .map(|l| l.into_inner().collect())
                .unwrap_or_default();
            if arg_pairs.len() != sorts.len() {
                let msg = format!(
                    "Action '{}' expects {} argument(s), but {} were given",
                    name_pair.as_str(),
                    sorts.len(),
                    arg_pairs.len()
                );
                return Err(self.error(msg, &span_pair));
            }

            let mut args = Vec::new();
            for (arg, sort) in arg_pairs.into_iter().zip(sorts.iter()) {
                args.push(self.lower_expr(
                    &build_parsed_expr(arg.into_inner()),
                    Some(*sort),
                    scope,
                )?);
            }
            multi_action = multi_action.insert(&Action::new(ActionLabel::new(name, sorts), args));
        }
        Ok(multi_action)
    }

    /// Resolves a parsed expression against the summand scope. Numbers and
    /// unknown identifiers become function symbols; `expected` propagates
    /// the sort that the context asks for (action arguments, the right
    /// side of an equality), with `Nat` as the fallback.
    fn lower_expr(
        &mut self,
        expr: &ParsedExpr,
        expected: Option<SortId>,
        scope: &FxHashMap<String, Variable>,
    ) -> Result<DataExpression, String> {
        match expr {
            ParsedExpr::True => Ok(true_(&self.tab)),
            ParsedExpr::False => Ok(false_(&self.tab)),
            ParsedExpr::Number(s) => {
                let sort = expected.unwrap_or_else(|| self.tab.intern_sort("Nat"));
                Ok(DataExpression::function_symbol(
                    self.tab.intern_name(s),
                    sort,
                ))
            }
            ParsedExpr::Ident(s) => {
                if let Some(v) = scope.get(s) {
                    return Ok(DataExpression::variable(*v));
                }
                let sort = expected.unwrap_or_else(|| self.tab.intern_sort("Nat"));
                Ok(DataExpression::function_symbol(
                    self.tab.intern_name(s),
                    sort,
                ))
            }
            ParsedExpr::Call(name, args) => {
                let sort = expected.unwrap_or_else(|| self.tab.intern_sort("Nat"));
                let head = DataExpression::function_symbol(self.tab.intern_name(name), sort);
                let args = args
                    .iter()
                    .map(|a| self.lower_expr(a, None, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DataExpression::application(head, args))
            }
            ParsedExpr::Not(inner) => {
                let inner = self.lower_expr(inner, None, scope)?;
                Ok(not_(&self.tab, inner))
            }
            ParsedExpr::Binary(ParsedOp::Eq, lhs, rhs) => {
                let lhs = self.lower_expr(lhs, None, scope)?;
                let rhs = self.lower_expr(rhs, Some(lhs.sort()), scope)?;
                Ok(equal_to(&self.tab, lhs, rhs))
            }
            ParsedExpr::Binary(ParsedOp::And, lhs, rhs) => {
                let lhs = self.lower_expr(lhs, None, scope)?;
                let rhs = self.lower_expr(rhs, None, scope)?;
                Ok(and_(&self.tab, lhs, rhs))
            }
            ParsedExpr::Binary(ParsedOp::Or, lhs, rhs) => {
                let lhs = self.lower_expr(lhs, None, scope)?;
                let rhs = self.lower_expr(rhs, None, scope)?;
                Ok(or_(&self.tab, lhs, rhs))
            }
        }
    }
}

/// Parses one specification file. Lexing and semantic problems are
/// reported through the handler with their source spans; the first error
/// aborts the parse.
pub fn parse_process_specification(
    input: &str,
    filename: String,
    handler: &mut DiagnosticHandler,
) -> Result<ProcessSpecification, String> {
    let fileid = handler.add_file(filename, input.to_string());

    let mut parsed = match ProcessParser::parse(Rule::file, input) {
        Ok(pairs) => pairs,
        Err(err) => {
            let (start, end) = match err.location {
                InputLocation::Pos(start) => (start, start),
                InputLocation::Span(span) => span,
            };
            let msg = format!("Parsing failed: {}", err.variant.message());
            handler.emit_diagnostic_span(&msg, fileid, start, end, Level::Error);
            return Err(msg);
        }
    };

    let mut ctx = ParserContext {
        tab: SymbolTable::new(),
        action_declarations: FxHashMap::default(),
        handler,
        fileid,
    };

    let mut communications = Vec::new();
    let mut allow_list = Vec::new();
    let mut block_list = Vec::new();
    let mut action_summands = Vec::new();

    let file = parsed.next().unwrap();
    for decl in file.into_inner() {
        if decl.as_rule() == Rule::EOI {
            continue;
        }
        let inner = decl.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::sort_decl => ctx.parse_sort_decl(inner),
            Rule::act_decl => ctx.parse_act_decl(inner)?,
            Rule::comm_decl => communications.push(ctx.parse_comm_decl(inner)?),
            Rule::allow_decl => {
                for multiset in inner.into_inner() {
                    allow_list.push(ctx.parse_name_multiset(multiset)?);
                }
            }
            Rule::block_decl => {
                let ident_list = inner.into_inner().next().unwrap();
                for ident in ident_list.into_inner() {
                    let (name, _) = ctx.lookup_action(&ident)?;
                    block_list.push(name);
                }
            }
            Rule::summand_decl => action_summands.push(ctx.parse_summand(inner)?),
            rule => unreachable!("unexpected declaration {:?}", rule),
        }
    }

    Ok(ProcessSpecification {
        table: ctx.tab,
        action_declarations: ctx.action_declarations,
        communications,
        allow_list,
        block_list,
        action_summands,
        deadlock_summands: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::serialize_expr;

    fn parse(input: &str) -> Result<ProcessSpecification, String> {
        let mut handler = DiagnosticHandler::new();
        parse_process_specification(input, "test.lps".to_string(), &mut handler)
    }

    const SPEC: &str = "
        sort Nat;
        act a, b: Nat;
        act done;
        comm a | b -> c;
        allow { c, done };
        block { b };
        summand sum x: Nat, y: Nat . true -> a(x) | b(y) . s := x;
        summand true -> done @ 1;
    ";

    #[test]
    fn a_full_specification_parses() {
        let spec = parse(SPEC).unwrap();
        let tab = &spec.table;

        let a = tab.name_id("a").unwrap();
        let b = tab.name_id("b").unwrap();
        let c = tab.name_id("c").unwrap();
        let done = tab.name_id("done").unwrap();

        assert_eq!(spec.communications, vec![CommRule::new(vec![a, b], c)]);
        assert_eq!(spec.allow_list, vec![vec![c], vec![done]]);
        assert_eq!(spec.block_list, vec![b]);
        assert_eq!(spec.action_summands.len(), 2);
        assert!(spec.deadlock_summands.is_empty());

        // the produced action inherits the signature of the lhs actions
        let nat = tab.sort_id("Nat").unwrap();
        assert_eq!(spec.action_declarations[&c], vec![nat]);

        let first = &spec.action_summands[0];
        assert_eq!(first.summation_variables.len(), 2);
        assert!(first.condition.is_true(tab));
        assert_eq!(first.multi_action.names(), vec![a, b]);
        assert_eq!(first.assignments.len(), 1);

        let second = &spec.action_summands[1];
        assert_eq!(second.multi_action.names(), vec![done]);
        assert!(second.time.is_some());
    }

    #[test]
    fn multi_actions_come_out_name_sorted() {
        let spec = parse(
            "sort Nat;
             act a, b: Nat;
             summand true -> b(1) | a(2);",
        )
        .unwrap();
        let tab = &spec.table;
        let a = tab.name_id("a").unwrap();
        let b = tab.name_id("b").unwrap();
        assert_eq!(spec.action_summands[0].multi_action.names(), vec![a, b]);
    }

    #[test]
    fn operator_precedence_follows_the_grammar() {
        let spec = parse(
            "sort Nat;
             act a: Nat;
             summand sum x: Nat . x == 1 && x == 2 || !(x == 3) -> a(x);",
        )
        .unwrap();
        let rendered = serialize_expr(&spec.table, &spec.action_summands[0].condition);
        assert_eq!(rendered, "(((x == 1) && (x == 2)) || !(x == 3))");
    }

    #[test]
    fn tau_summands_and_tau_results_parse() {
        let spec = parse(
            "sort Nat;
             act a, b: Nat;
             comm a | b -> tau;
             summand true -> tau;",
        )
        .unwrap();
        assert_eq!(spec.communications[0].rhs, spec.table.tau());
        assert!(spec.action_summands[0].multi_action.is_empty());
    }

    #[test]
    fn lexing_errors_are_reported_with_spans() {
        let mut handler = DiagnosticHandler::new();
        let result =
            parse_process_specification("sort ;", "bad.lps".to_string(), &mut handler);
        assert!(result.is_err());
        assert_eq!(handler.error_count(), 1);
    }

    #[test]
    fn undeclared_actions_are_rejected() {
        let err = parse("summand true -> zz;").unwrap_err();
        assert!(err.contains("zz"));
    }

    #[test]
    fn arity_mismatches_are_rejected() {
        let err = parse(
            "sort Nat;
             act a: Nat;
             summand true -> a;",
        )
        .unwrap_err();
        assert!(err.contains("expects 1 argument"));
    }

    #[test]
    fn mismatched_comm_signatures_are_rejected() {
        let err = parse(
            "sort Nat;
             act a: Nat;
             act b;
             comm a | b -> c;",
        )
        .unwrap_err();
        assert!(err.contains("different signature"));
    }
}
