// Copyright 2025 Cornell University
// released under MIT License
// author: Ernest Ng <eyn5@cornell.edu>

use anyhow::{anyhow, bail};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;

use linearise::diagnostic::DiagnosticHandler;
use linearise::ir::{Action, ActionLabel};
use linearise::linearise::{communication_composition, CompositionOptions, InlineFilter};
use linearise::parser::parse_process_specification;
use linearise::rewriter::BooleanRewriter;
use linearise::serialize::{serialize_action_summand, serialize_deadlock_summand};

/// Args for the communication composition CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a process specification file
    #[arg(value_name = "SPEC_FILE")]
    spec: PathBuf,

    /// Apply the declared allow list inline during composition
    #[arg(long)]
    inline_allow: bool,

    /// Apply the declared block list inline during composition
    #[arg(long)]
    inline_block: bool,

    /// Skip the sum-elimination step on freshly built summands
    #[arg(long)]
    no_sumelm: bool,

    /// Do not merge shadow deadlock summands back into the result
    #[arg(long)]
    no_delta_elimination: bool,

    /// Ignore timestamps when merging deadlock summands
    #[arg(long)]
    ignore_time: bool,

    /// Users can specify `-v` or `--verbose` to toggle logging
    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,
}

/// Example:
/// `cargo run -- demos/handshake.lps --inline-allow --ignore-time -v`
fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let cli = Cli::parse();

    // Set up logger to use the log-level specified via the `-v` flag
    // For concision, we disable timestamps and the module paths in the log
    env_logger::Builder::new()
        .format_timestamp(None)
        .filter_level(cli.verbosity.log_level_filter())
        .init();

    if cli.inline_allow && cli.inline_block {
        bail!("--inline-allow and --inline-block are mutually exclusive");
    }
    if (cli.inline_allow || cli.inline_block) && (!cli.ignore_time || cli.no_delta_elimination) {
        bail!("inline filtering requires --ignore-time and delta elimination");
    }

    let input = std::fs::read_to_string(&cli.spec)
        .map_err(|e| anyhow!("failed to load {}: {}", cli.spec.display(), e))?;

    // Create a new handler for dealing with errors/diagnostics
    let handler = &mut DiagnosticHandler::new();
    let mut spec = parse_process_specification(&input, cli.spec.display().to_string(), handler)
        .map_err(|e| anyhow!(e))?;

    let filter = if cli.inline_allow {
        InlineFilter::Allow(spec.allow_list.clone())
    } else if cli.inline_block {
        InlineFilter::Block(spec.block_list.clone())
    } else {
        InlineFilter::None
    };
    let options = CompositionOptions {
        no_sumelm: cli.no_sumelm,
        no_delta_elimination: cli.no_delta_elimination,
        ignore_time: cli.ignore_time,
    };

    // the distinguished action signalling successful termination
    let termination_name = spec.table.intern_name("Terminate");
    let termination_action = Action::new(ActionLabel::new(termination_name, vec![]), vec![]);

    communication_composition(
        spec.communications.clone(),
        filter,
        &termination_action,
        &options,
        &mut spec.action_summands,
        &mut spec.deadlock_summands,
        &spec.table,
        &BooleanRewriter,
    )
    .map_err(|e| anyhow!("{}", e))?;

    for summand in &spec.action_summands {
        println!("summand {};", serialize_action_summand(&spec.table, summand));
    }
    for summand in &spec.deadlock_summands {
        println!("summand {};", serialize_deadlock_summand(&spec.table, summand));
    }
    Ok(())
}
