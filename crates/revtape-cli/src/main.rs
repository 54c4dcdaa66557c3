// crates/revtape-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use revtape_core::{generator::generate_program, parse, InputStream, OutputStream};
use revtape_debug::{Debugger, Direction};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "revtape",
    about = "revtape batch front-end",
    long_about = "revtape batch front-end.\n\nRun, check, and format tape-machine programs, or generate random ones. The reversible-debugging surface itself is a library; this binary only drives it end to end.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Execute a program to completion, streaming `.` output to stdout.
    Run {
        /// Program source file
        program: PathBuf,

        /// Read `,` input from this file (binary) instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,

        /// Abort after this many steps (coalesced runs count as one)
        #[arg(long, default_value_t = 1_000_000)]
        max_steps: u64,
    },

    /// Parse a program and report the first error, if any.
    Check {
        /// Program source file
        program: PathBuf,
    },

    /// Print the canonical coalesced listing (or the full graph as JSON).
    Fmt {
        /// Program source file
        program: PathBuf,

        /// Emit the command graph as JSON instead of the listing
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Generate a random balanced program.
    Gen {
        /// Instruction budget
        #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u64).range(1..))]
        ops: u64,

        /// Generator seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Write here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Run {
            program,
            input,
            max_steps,
        } => run(program, input, max_steps),

        Cmd::Check { program } => check(program),

        Cmd::Fmt { program, json } => fmt(program, json),

        Cmd::Gen { ops, seed, out } => generate(ops as usize, seed, out),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer().with_target(false).with_level(true).compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn read_source(path: &PathBuf) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read program {}", path.display()))
}

fn run(program: PathBuf, input: Option<PathBuf>, max_steps: u64) -> Result<()> {
    let source = read_source(&program)?;
    let input_stream = match &input {
        Some(path) => InputStream::from_file(path)?,
        None => InputStream::stdin(),
    };

    info!(program = %program.display(), max_steps, "running");
    let mut dbg = Debugger::new(&source, input_stream, OutputStream::stdout())
        .with_context(|| format!("parse {}", program.display()))?;

    let mut steps = 0u64;
    let mut unfinished = true;
    while unfinished && steps < max_steps {
        unfinished = dbg
            .step(Direction::Forward)
            .with_context(|| format!("step {steps} failed"))?;
        if unfinished {
            steps += 1;
        }
    }
    dbg.vm_mut().flush_output().context("flush program output")?;

    if unfinished {
        bail!("step budget of {max_steps} exhausted before the program ended");
    }
    info!(steps, "program finished");
    Ok(())
}

fn check(program: PathBuf) -> Result<()> {
    let source = read_source(&program)?;
    match parse(&source) {
        Ok(parsed) => {
            println!(
                "OK: {} ({} commands)",
                program.display(),
                parsed.command_count()
            );
            Ok(())
        }
        Err(e) => bail!("{}: {e}", program.display()),
    }
}

fn fmt(program: PathBuf, json: bool) -> Result<()> {
    let source = read_source(&program)?;
    let parsed = parse(&source).with_context(|| format!("parse {}", program.display()))?;
    if json {
        let rendered =
            serde_json::to_string_pretty(&parsed).context("serialize command graph to JSON")?;
        println!("{rendered}");
    } else {
        println!("{}", parsed.canonical());
    }
    Ok(())
}

fn generate(ops: usize, seed: u64, out: Option<PathBuf>) -> Result<()> {
    let source = generate_program(ops, seed);
    match out {
        Some(path) => {
            fs::write(&path, &source).with_context(|| format!("write {}", path.display()))?;
            println!("Generated {} ops (seed {seed}) → {}", ops, path.display());
        }
        None => println!("{source}"),
    }
    Ok(())
}
