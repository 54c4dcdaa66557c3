//! Engine invariants: reversibility, cursor bounds, coalescing idempotence,
//! and agreement with a naive byte-by-byte reference interpreter.
//!
//! Random programs come from the deterministic generator (bounded at 200
//! instructions); proptest drives the seeds and inputs.

use proptest::prelude::*;
use revtape_core::{
    generator::generate_program, parse, CaptureBuffer, InputStream, OutputStream, Program,
    StepError, Vm,
};

const TAPE_LEN: usize = 256;
const VM_STEP_CAP: usize = 20_000;
const REF_OP_CAP: usize = 200_000;

/// Naive reference interpreter: one character, one operation, precomputed
/// bracket matching, the engine's signed pointer band, and the same
/// input-EOF behaviour.
mod reference {
    pub struct Outcome {
        pub tape: Vec<u8>,
        pub ptr: i64,
        pub output: Vec<u8>,
    }

    /// Instruction characters with comments removed.
    fn instructions(source: &str) -> Vec<u8> {
        let mut code = Vec::new();
        let mut in_comment = false;
        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            if in_comment {
                in_comment = b != b'\n';
            } else if b == b';' || b == b'#' || (b == b'/' && bytes.get(i + 1) == Some(&b'/')) {
                in_comment = true;
            } else if b"+-<>.,[]".contains(&b) {
                code.push(b);
            }
            i += 1;
        }
        code
    }

    fn match_brackets(code: &[u8]) -> Option<Vec<usize>> {
        let mut partner = vec![0usize; code.len()];
        let mut stack = Vec::new();
        for (i, &b) in code.iter().enumerate() {
            if b == b'[' {
                stack.push(i);
            } else if b == b']' {
                let open = stack.pop()?;
                partner[open] = i;
                partner[i] = open;
            }
        }
        stack.is_empty().then_some(partner)
    }

    /// Run to completion; `None` when the program errors (pointer band,
    /// input EOF) or exceeds `max_ops`.
    pub fn run(source: &str, input: &[u8], tape_len: usize, max_ops: usize) -> Option<Outcome> {
        let code = instructions(source);
        let partner = match_brackets(&code)?;
        let len = tape_len as i64;
        let mut tape = vec![0u8; tape_len];
        let mut ptr = 0i64;
        let mut output = Vec::new();
        let mut next_in = 0usize;
        let mut pc = 0usize;
        let mut ops = 0usize;
        let cell = |p: i64| p.rem_euclid(len) as usize;
        while pc < code.len() {
            ops += 1;
            if ops > max_ops {
                return None;
            }
            match code[pc] {
                b'+' => tape[cell(ptr)] = tape[cell(ptr)].wrapping_add(1),
                b'-' => tape[cell(ptr)] = tape[cell(ptr)].wrapping_sub(1),
                b'>' => {
                    if ptr + 1 >= len {
                        return None;
                    }
                    ptr += 1;
                }
                b'<' => {
                    if ptr - 1 < -len {
                        return None;
                    }
                    ptr -= 1;
                }
                b'.' => output.push(tape[cell(ptr)]),
                b',' => {
                    tape[cell(ptr)] = *input.get(next_in)?;
                    next_in += 1;
                }
                b'[' => {
                    if tape[cell(ptr)] == 0 {
                        pc = partner[pc];
                    }
                }
                b']' => {
                    if tape[cell(ptr)] != 0 {
                        pc = partner[pc];
                    }
                }
                _ => unreachable!(),
            }
            pc += 1;
        }
        Some(Outcome { tape, ptr, output })
    }
}

/// Step forward until the program ends, a step fails, or the cap is hit.
/// Returns the number of successful steps and whether the end was reached.
fn run_capped(vm: &mut Vm, cap: usize) -> (usize, bool) {
    let mut steps = 0;
    while steps < cap {
        match vm.step_forward() {
            Ok(()) => steps += 1,
            Err(StepError::EndOfProgram) => return (steps, true),
            Err(_) => return (steps, false),
        }
        assert!(vm.cursor() <= vm.len(), "cursor passed the history length");
    }
    (steps, false)
}

fn structure(program: &Program) -> String {
    program.canonical()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 96,
        .. ProptestConfig::default()
    })]

    // Property: forward k steps then backward k steps restores the initial
    // tape and pointer exactly, for every reachable k.
    #[test]
    fn forward_then_backward_restores_origin(
        seed in any::<u64>(),
        ops in 1usize..=200,
        input in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let source = generate_program(ops, seed);
        let program = parse(&source).unwrap();
        let mut vm = Vm::with_tape_len(
            program,
            InputStream::from_bytes(input),
            OutputStream::sink(),
            TAPE_LEN,
        );
        let (steps, _) = run_capped(&mut vm, VM_STEP_CAP);

        let peak_tape = vm.tape().to_vec();
        let peak_ptr = vm.pointer();

        for _ in 0..steps {
            vm.step_backward().unwrap();
        }
        prop_assert_eq!(vm.cursor(), 0);
        prop_assert_eq!(vm.pointer(), 0);
        prop_assert!(vm.tape().iter().all(|&b| b == 0), "tape not restored");

        // Replaying the recorded future reproduces the same state without
        // appending new history.
        let len_before = vm.len();
        for _ in 0..steps {
            vm.step_forward().unwrap();
        }
        prop_assert_eq!(vm.len(), len_before);
        prop_assert_eq!(vm.tape(), &peak_tape[..]);
        prop_assert_eq!(vm.pointer(), peak_ptr);
    }

    // Property: parsing a program, emitting its canonical listing, and
    // re-parsing that listing yields a structurally identical graph.
    #[test]
    fn coalescing_is_idempotent(seed in any::<u64>(), ops in 1usize..=200) {
        let source = generate_program(ops, seed);
        let once = parse(&source).unwrap();
        let twice = parse(&once.canonical()).unwrap();
        prop_assert_eq!(structure(&once), structure(&twice));
    }

    // Property: the engine agrees with a naive byte-by-byte interpreter on
    // every program both can run to completion.
    #[test]
    fn agrees_with_reference_interpreter(
        seed in any::<u64>(),
        ops in 1usize..=200,
        input in proptest::collection::vec(any::<u8>(), 0..64),
    ) {
        let source = generate_program(ops, seed);
        let capture = CaptureBuffer::new();
        let mut vm = Vm::with_tape_len(
            parse(&source).unwrap(),
            InputStream::from_bytes(input.clone()),
            OutputStream::from_writer(capture.clone()),
            TAPE_LEN,
        );
        let (_, finished) = run_capped(&mut vm, VM_STEP_CAP);
        let reference = reference::run(&source, &input, TAPE_LEN, REF_OP_CAP);
        // A coalesced Move checks only its net target, so the naive
        // interpreter can fail transiently inside a mixed `<>` run where the
        // engine does not; compare only runs both sides complete.
        if finished {
            if let Some(reference) = reference {
                prop_assert_eq!(vm.tape(), &reference.tape[..]);
                prop_assert_eq!(vm.pointer(), reference.ptr);
                prop_assert_eq!(capture.contents(), reference.output);
            }
        }
    }
}

#[test]
fn graph_serializes_and_round_trips() {
    let program = parse("+[>,.<-]").unwrap();
    let json = serde_json::to_string(&program).unwrap();
    let back: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(program.canonical(), back.canonical());
    assert_eq!(program.command_count(), back.command_count());
}

#[test]
fn partial_rewind_restores_intermediate_states() {
    // Run a small loop to completion, then unwind half way and check the
    // tape matches a fresh run of the same length.
    let source = "++++[->+<]";
    let mut vm = Vm::with_tape_len(
        parse(source).unwrap(),
        InputStream::default(),
        OutputStream::sink(),
        TAPE_LEN,
    );
    let (steps, finished) = run_capped(&mut vm, VM_STEP_CAP);
    assert!(finished);

    let half = steps / 2;
    for _ in 0..(steps - half) {
        vm.step_backward().unwrap();
    }

    let mut fresh = Vm::with_tape_len(
        parse(source).unwrap(),
        InputStream::default(),
        OutputStream::sink(),
        TAPE_LEN,
    );
    for _ in 0..half {
        fresh.step_forward().unwrap();
    }
    assert_eq!(vm.tape(), fresh.tape());
    assert_eq!(vm.pointer(), fresh.pointer());
}
