// Copyright 2024 Cornell University
// released under MIT License
// author: Nikil Shyamunder <nvs26@cornell.edu>
// author: Kevin Laeufer <laeufer@cornell.edu>
// author: Francis Pham <fdp25@cornell.edu>
// author: Ernest Ng <eyn5@cornell.edu>

use log::{debug, info};

use crate::allow_block::{allow_, encap};
use crate::comm_table::CommTable;
use crate::composition::multi_action_condition_list;
use crate::data::{and_, occurs_in, true_};
use crate::errors::LineariseResult;
use crate::ir::{
    Action, ActionSummand, CommRule, Deadlock, DeadlockSummand, NameId, SymbolTable,
};
use crate::rewriter::Rewriter;
use crate::sumelm::sumelm;
use crate::utility::{insert_timed_delta_summand, sort_action_name_multisets, sort_communications};

/// Optional filtering fused into the communication composition. Allow and
/// block filtering are mutually exclusive; either one requires
/// `ignore_time` and delta elimination (see [`CompositionOptions`]).
pub enum InlineFilter {
    None,
    /// Keep only multi-actions whose name multiset is listed
    Allow(Vec<Vec<NameId>>),
    /// Drop multi-actions containing a listed name
    Block(Vec<NameId>),
}

/// Flags steering the summand driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositionOptions {
    /// Skip the sum-elimination step on freshly built summands
    pub no_sumelm: bool,
    /// Do not merge the shadow deadlock summands back into the result
    pub no_delta_elimination: bool,
    /// Ignore timestamps when merging deadlock summands
    pub ignore_time: bool,
}

/// Applies the communication operator, described by `communications`, to
/// every action summand, replacing each summand by the summands for all
/// multi-actions it can produce. The deadlock summands are rebuilt from
/// shadow copies of the action summands unless an inline filter is
/// active.
///
/// Both summand lists are updated in place. The output preserves the
/// input-summand order and, per summand, the depth-first order of the
/// enumerated alternatives.
#[allow(clippy::too_many_arguments)]
pub fn communication_composition<R: Rewriter>(
    communications: Vec<CommRule>,
    filter: InlineFilter,
    termination_action: &Action,
    options: &CompositionOptions,
    action_summands: &mut Vec<ActionSummand>,
    deadlock_summands: &mut Vec<DeadlockSummand>,
    tab: &SymbolTable,
    rewriter: &R,
) -> LineariseResult<()> {
    let inline_allow = !matches!(filter, InlineFilter::None);

    info!(
        "calculating the communication operator on {} action summands using {} communication expressions",
        action_summands.len(),
        communications.len()
    );

    // the matching below relies on canonical name order on both sides
    let communications = sort_communications(communications);
    let filter = match filter {
        InlineFilter::Allow(list) => InlineFilter::Allow(sort_action_name_multisets(list)),
        InlineFilter::Block(mut list) => {
            list.sort();
            InlineFilter::Block(list)
        }
        InlineFilter::None => InlineFilter::None,
    };

    let mut resulting_deadlock_summands = Vec::new();
    std::mem::swap(deadlock_summands, &mut resulting_deadlock_summands);

    if inline_allow {
        // with inline filtering, deadlock summands cannot be regenerated
        // from the filtered result later on
        debug_assert!(!options.no_delta_elimination && options.ignore_time);
        deadlock_summands.push(DeadlockSummand {
            summation_variables: vec![],
            condition: true_(tab),
            deadlock: Deadlock { time: None },
        });
    }

    let mut comm_table = CommTable::new(&communications);
    let mut resulting_action_summands = Vec::new();

    for smmnd in action_summands.drain(..) {
        if !inline_allow {
            // Recall a deadlock summand for every action summand. The
            // conditions of the generated summands can grow much more
            // complex and many of their actions turn into deadlocks
            // further down the pipeline; a delta with the original,
            // simple condition keeps those removable.
            let newsumvars: Vec<_> = smmnd
                .summation_variables
                .iter()
                .filter(|v| {
                    occurs_in(&smmnd.condition, v)
                        || smmnd.time.as_ref().is_some_and(|t| occurs_in(t, v))
                })
                .copied()
                .collect();
            resulting_deadlock_summands.push(DeadlockSummand {
                summation_variables: newsumvars,
                condition: smmnd.condition.clone(),
                deadlock: Deadlock {
                    time: smmnd.time.clone(),
                },
            });
        }

        // All alternatives the communication operator admits for this
        // multi-action, with mutually exclusive conditions. If nothing
        // communicates this is the original multi-action under `true`.
        let multiactionconditionlist =
            multi_action_condition_list(&smmnd.multi_action, &mut comm_table, tab, rewriter)?;

        debug!(
            "communication on a multi-action with {} actions results in {} potential summands",
            smmnd.multi_action.len(),
            multiactionconditionlist.size()
        );

        let mut disallowed_summands = 0usize;
        let mut blocked_summands = 0usize;
        let mut false_condition_summands = 0usize;
        let mut added_summands = 0usize;

        for (multiaction, communication_condition) in multiactionconditionlist.into_pairs() {
            match &filter {
                InlineFilter::Allow(allowlist)
                    if !allow_(allowlist, &multiaction, termination_action) =>
                {
                    disallowed_summands += 1;
                    continue;
                }
                InlineFilter::Block(blocklist) if encap(blocklist, &multiaction) => {
                    blocked_summands += 1;
                    continue;
                }
                _ => {}
            }

            let communication_condition = rewriter.rewrite(&communication_condition, tab)?;
            let newcondition = rewriter.rewrite(
                &and_(tab, smmnd.condition.clone(), communication_condition),
                tab,
            )?;

            let mut new_summand = ActionSummand {
                summation_variables: smmnd.summation_variables.clone(),
                condition: newcondition,
                multi_action: multiaction,
                time: smmnd.time.clone(),
                assignments: smmnd.assignments.clone(),
                distribution: smmnd.distribution.clone(),
            };

            if !options.no_sumelm && sumelm(&mut new_summand, tab) {
                new_summand.condition = rewriter.rewrite(&new_summand.condition, tab)?;
            }

            if new_summand.condition.is_false(tab) {
                false_condition_summands += 1;
            } else {
                resulting_action_summands.push(new_summand);
                added_summands += 1;
            }
        }

        debug!(
            "statistics of new summands: disallowed: {}, blocked: {}, false condition: {}, added: {}",
            disallowed_summands, blocked_summands, false_condition_summands, added_summands
        );
    }

    *action_summands = resulting_action_summands;

    // the shadow deadlock summands must be merged back in
    if !inline_allow && !options.no_delta_elimination {
        for summand in resulting_deadlock_summands {
            insert_timed_delta_summand(deadlock_summands, summand, options.ignore_time, tab);
        }
    }

    info!(
        "resulting in {} action summands and {} deadlock summands",
        action_summands.len(),
        deadlock_summands.len()
    );
    Ok(())
}
