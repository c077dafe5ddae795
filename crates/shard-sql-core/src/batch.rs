//! Parsing many independent inputs on a pool of threads.
//!
//! Each worker owns its parser; only the dialect and the cancellation flag
//! are shared. Inputs are handed out through an atomic cursor, so a slow
//! input never holds up the others.

use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use serde::Serialize;
use tracing::debug;

use crate::cancel::CancellationToken;
use crate::dialect::Dialect;
use crate::parser::ParserOptions;
use crate::script::{parse_script, ScriptOutcome};

/// The outcome for one input, tagged with its position in the input slice.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub index: usize,
    pub outcome: ScriptOutcome,
}

/// Parses every input with [`parse_script`] on up to `workers` threads.
///
/// Results come back in input order, one per input. Inputs not started
/// before `cancel` fired get [`ScriptOutcome::cancelled`]. A `workers` value
/// of zero is treated as one.
///
/// # Panics
///
/// Re-raises a panic from any worker once all workers have stopped.
#[must_use]
pub fn parse_batch<S: AsRef<str> + Sync>(
    inputs: &[S],
    dialect: &dyn Dialect,
    options: &ParserOptions,
    workers: usize,
    cancel: Option<&CancellationToken>,
) -> Vec<BatchResult> {
    let workers = workers.clamp(1, inputs.len().max(1));
    let next = AtomicUsize::new(0);
    debug!(inputs = inputs.len(), workers, "starting batch");

    let mut results: Vec<BatchResult> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let next = &next;
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(input) = inputs.get(index) else {
                            break;
                        };
                        let outcome = if cancel.is_some_and(CancellationToken::is_cancelled) {
                            ScriptOutcome::cancelled()
                        } else {
                            parse_script(input.as_ref(), dialect, options, cancel)
                        };
                        done.push(BatchResult { index, outcome });
                    }
                    debug!(worker, parsed = done.len(), "worker finished");
                    done
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    });

    results.sort_by_key(|r| r.index);
    results
}
