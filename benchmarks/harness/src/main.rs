//! revtape-bench-harness
//!
//! Run small end-to-end benchmarks (parse -> run to completion -> unwind to
//! origin -> replay) and append CSV rows into `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run -p revtape-bench-harness -- --profile configs/profiles/small.toml
//!   cargo run -p revtape-bench-harness -- --profile configs/profiles/medium.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use revtape_core::{generator::generate_program, parse, InputStream, OutputStream, StepError, Vm};

#[derive(Debug, Deserialize)]
struct Profile {
    /// Instruction budget for the generated program
    ops: usize,
    /// Generator seed
    seed: u64,
    /// Step cap per run (abort the repetition if exceeded)
    max_steps: usize,
    /// Repetitions of the whole pipeline
    repeats: u32,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "configs/profiles/small.toml"));
    let profile_text = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_text)
        .with_context(|| format!("parse profile {}", profile_path.display()))?;

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before the epoch")?
        .as_secs();
    let report_dir = PathBuf::from("benchmarks/reports");
    fs::create_dir_all(&report_dir).context("create report directory")?;
    let report_path = report_dir.join(format!("bench-{stamp}.csv"));
    let mut report = fs::File::create(&report_path)
        .with_context(|| format!("create {}", report_path.display()))?;
    writeln!(report, "repeat,steps,parse_ms,run_ms,unwind_ms,replay_ms")?;

    let source = generate_program(profile.ops, profile.seed);

    for repeat in 0..profile.repeats {
        let t0 = Instant::now();
        let program = parse(&source).context("parse generated program")?;
        let parse_ms = dur_ms(t0.elapsed());

        let mut vm = Vm::new(program, InputStream::default(), OutputStream::sink());

        let t1 = Instant::now();
        let steps = run_to_end(&mut vm, profile.max_steps)?;
        let run_ms = dur_ms(t1.elapsed());

        let t2 = Instant::now();
        for _ in 0..steps {
            vm.step_backward().context("unwind step failed")?;
        }
        let unwind_ms = dur_ms(t2.elapsed());

        let t3 = Instant::now();
        for _ in 0..steps {
            vm.step_forward().context("replay step failed")?;
        }
        let replay_ms = dur_ms(t3.elapsed());

        writeln!(
            report,
            "{repeat},{steps},{parse_ms},{run_ms},{unwind_ms},{replay_ms}"
        )?;
    }

    println!(
        "Benchmarked {} repeats of {} ops (seed {}) → {}",
        profile.repeats,
        profile.ops,
        profile.seed,
        report_path.display()
    );
    Ok(())
}

/// Step forward until the program ends; input-exhausted and pointer-range
/// stops also end a run (generated programs may hit either).
fn run_to_end(vm: &mut Vm, max_steps: usize) -> Result<usize> {
    let mut steps = 0usize;
    loop {
        match vm.step_forward() {
            Ok(()) => steps += 1,
            Err(StepError::EndOfProgram | StepError::InputExhausted | StepError::TapeOutOfRange(_)) => {
                return Ok(steps)
            }
            Err(e) => return Err(e.into()),
        }
        if steps >= max_steps {
            bail!("step cap of {max_steps} exceeded; raise max_steps or change the seed");
        }
    }
}
