// crates/revtape-core/src/generator.rs

//! Tiny random program generator used by the CLI `gen` subcommand, the
//! bench harness, and the property-test suite.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use rand::{rngs::StdRng, Rng as _, SeedableRng};

/// Generate a random program of at most `ops` instruction characters with
/// balanced brackets. Deterministic for a given seed.
///
/// Increments and pointer moves come out in bursts of 1..=4 so coalescing
/// has runs to merge; `>` is favoured over `<` to keep short programs from
/// immediately walking off the left edge; a newline lands after roughly
/// every 16 instructions so line-based tooling has lines to work with.
#[must_use]
pub fn generate_program(ops: usize, seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = String::new();
    let mut open = 0usize;
    let mut budget = ops;
    let mut since_newline = 0usize;

    while budget > open {
        let emitted = match rng.random_range(0..=9u8) {
            0 | 1 => burst(&mut out, '+', &mut budget, open, &mut rng),
            2 => burst(&mut out, '-', &mut budget, open, &mut rng),
            3 | 4 => burst(&mut out, '>', &mut budget, open, &mut rng),
            5 => burst(&mut out, '<', &mut budget, open, &mut rng),
            6 => {
                out.push('.');
                budget -= 1;
                1
            }
            7 => {
                out.push(',');
                budget -= 1;
                1
            }
            8 => {
                // Opening costs the op plus its eventual close.
                if budget >= open + 2 {
                    out.push('[');
                    open += 1;
                    budget -= 1;
                    1
                } else {
                    0
                }
            }
            _ => {
                if open > 0 {
                    out.push(']');
                    open -= 1;
                    budget -= 1;
                    1
                } else {
                    0
                }
            }
        };
        since_newline += emitted;
        if since_newline >= 16 {
            out.push('\n');
            since_newline = 0;
        }
    }
    for _ in 0..open {
        out.push(']');
    }
    out
}

/// Emit a run of 1..=4 copies of `c`, bounded so the remaining budget can
/// still close every open bracket. Returns how many characters went out.
fn burst(out: &mut String, c: char, budget: &mut usize, open: usize, rng: &mut StdRng) -> usize {
    let room = *budget - open;
    let n = rng.random_range(1..=4usize).min(room);
    for _ in 0..n {
        out.push(c);
    }
    *budget -= n;
    n
}
