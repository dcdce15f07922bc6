//! # aocraft CLI
//!
//! Interactive puzzle solving from the terminal.
//!
//! Usage:
//!   aocraft solve --day <D> --part <P> [--provider <K>] [--model <M>] [--prior-solution <PATH>]
//!   aocraft attempts --day <D> [--part <P>]
//!
//! Examples:
//!   aocraft solve --day 6 --part 1
//!   aocraft solve --day 6 --part 2 --prior-solution day6/solution_part1_try3_openai_gpt-4o.py
//!   aocraft solve --day 4 --part 1 --provider local --model qwen2.5-coder
//!   aocraft attempts --day 6 --part 1

use aocraft_agent::{ConsoleOperator, LoopConfig, LoopReport, Outcome, Solver};
use aocraft_core::{
    AttemptStore, Error, ErrorKind, Part, PromptAssembler, PromptOptions, ProviderConfig, ProviderKind,
    PuzzleInputs, Result, RetryPolicy, Session,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "aocraft")]
#[command(author, version, about = "aocraft - solve puzzles with an LLM, one round of feedback at a time")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug logging, including full request payloads
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive solving session
    Solve(SolveArgs),
    /// List stored attempts for a day
    Attempts {
        #[arg(short, long)]
        day: u32,

        #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
        part: Option<u8>,

        /// Directory holding the day folders
        #[arg(long, default_value = ".")]
        root: PathBuf,
    },
}

#[derive(Args)]
struct SolveArgs {
    #[arg(short, long)]
    day: u32,

    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=2))]
    part: u8,

    /// Backend: openai, anthropic or local
    #[arg(long, env = "AOCRAFT_PROVIDER", default_value = "openai")]
    provider: String,

    /// Model identifier (defaults per provider)
    #[arg(short, long, env = "AOCRAFT_MODEL")]
    model: Option<String>,

    /// Accepted part 1 program; required for part 2
    #[arg(long)]
    prior_solution: Option<PathBuf>,

    /// Directory holding the day folders
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Retries for transient provider failures
    #[arg(long, default_value = "0")]
    retries: u32,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Warn once this many feedback rounds have piled up
    #[arg(long, default_value = "8")]
    warn_after_rounds: usize,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// A part 2 run failed for want of a usable prior solution, either none was
/// given or the given path could not be read
fn prior_solution_missing(part: Part, err: &Error) -> bool {
    part == Part::Two
        && matches!(
            (err.kind(), err.operation()),
            (ErrorKind::ConfigInvalid, "puzzle::new") | (_, "puzzle::read_prior_solution")
        )
}

/// Point at part 1 attempts that could serve as the prior solution
fn show_candidates(store: &AttemptStore, day: u32) {
    match store.list(day, Some(Part::One)) {
        Ok(found) if found.is_empty() => {
            eprintln!("No part 1 attempts stored under {}", store.day_dir(day).display());
        }
        Ok(found) => {
            eprintln!("Part 1 attempts that could be passed with --prior-solution:");
            for stored in found {
                eprintln!("  {}", stored.path.display());
            }
        }
        Err(e) => tracing::warn!(error = %e, "could not list part 1 attempts"),
    }
}

async fn solve(args: SolveArgs, verbose: bool) -> Result<LoopReport> {
    let part = Part::try_from(args.part)?;
    let kind: ProviderKind = args.provider.parse()?;
    let options = PromptOptions::default();
    let store = AttemptStore::new(&args.root, options.extension.clone());

    let inputs = PuzzleInputs::new(&args.root);
    let context = match inputs.context(args.day, part, args.prior_solution.as_deref()) {
        Ok(context) => context,
        Err(e) => {
            if prior_solution_missing(part, &e) {
                show_candidates(&store, args.day);
            }
            return Err(e);
        }
    };

    let mut config = ProviderConfig::from_env(kind, args.model.as_deref())?.with_trace_payloads(verbose);
    if let Some(secs) = args.timeout {
        config = config.with_timeout(secs);
    }

    let session = Session::new(context, config)?
        .with_assembler(PromptAssembler::new(options))
        .with_retry(RetryPolicy::none().with_max_retries(args.retries));

    let loop_config = LoopConfig {
        verbose,
        warn_after_rounds: args.warn_after_rounds,
    };
    let mut solver = Solver::with_config(session, store, ConsoleOperator::stdio(), loop_config);
    let report = solver.run().await?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            Error::new(ErrorKind::SerializationFailed, "failed to encode report")
                .with_operation("cli::solve")
                .set_source(e)
        })?;
        println!("{}", json);
    } else {
        let verdict = match report.outcome {
            Outcome::Accepted => "accepted",
            Outcome::Stopped => "stopped",
            Outcome::InputClosed => "input closed",
        };
        println!(
            "\nDay {} part {}: {} after {} attempt(s), {} tokens",
            report.day,
            report.part,
            verdict,
            report.final_attempt,
            report.usage.total_tokens()
        );
        if let Some(last) = report.attempts.last() {
            println!("Last attempt: {}", last.display());
        }
    }

    Ok(report)
}

fn list_attempts(day: u32, part: Option<u8>, root: PathBuf) -> Result<()> {
    let part = part.map(Part::try_from).transpose()?;
    let store = AttemptStore::new(&root, PromptOptions::default().extension);
    let found = store.list(day, part)?;

    if found.is_empty() {
        println!("No attempts stored for day {}", day);
        return Ok(());
    }

    println!("{:<6} {:<5} {:<10} {:<32} PATH", "PART", "TRY", "PROVIDER", "MODEL");
    for stored in found {
        println!(
            "{:<6} {:<5} {:<10} {:<32} {}",
            stored.part.number(),
            stored.number,
            stored.provider.as_str(),
            stored.model,
            stored.path.display()
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Solve(args) => solve(args, cli.verbose).await.map(|_| ()),
        Commands::Attempts { day, part, root } => list_attempts(day, part, root),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
