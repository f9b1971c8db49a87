//! Generation-by-generation rewriting of a grammar's axiom.
//!
//! One generation is computed without incremental growth of the output:
//!
//! 1. every input symbol reports its replacement length (1 for the identity rule),
//! 2. an exclusive prefix sum over those lengths gives each symbol's output offset,
//! 3. the output is allocated once at `last offset + last length`,
//! 4. every symbol scatters its replacement at its own offset.
//!
//! Step 4 touches disjoint output ranges, so [`GrammarExpander`] splits it across
//! scoped threads once a generation is large enough. Generations themselves are
//! strictly sequential.

use crate::grammar::{Grammar, Productions, Symbol};
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Expands `grammar` for `depth` generations on the calling thread.
///
/// `depth == 0` returns the axiom unchanged; an empty axiom stays empty.
pub fn expand(grammar: &Grammar, depth: u32) -> Vec<Symbol> {
    GrammarExpander::sequential().expand(grammar, depth)
}

/// Rewriting engine with an optional parallel scatter step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrammarExpander {
    threads: usize,
    parallel_threshold: usize,
}

impl Default for GrammarExpander {
    fn default() -> Self {
        Self::sequential()
    }
}

impl GrammarExpander {
    /// Generations smaller than this are always scattered on the calling thread.
    pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 16;

    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            parallel_threshold: Self::DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn sequential() -> Self {
        Self::new(1)
    }

    /// Sets the minimum generation size (in input symbols) that is scattered in parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold.max(1);
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Expands `grammar` for `depth` generations.
    ///
    /// The result depends only on the grammar's productions and `depth`, never on
    /// the thread count. Growth is not bounded: callers pick a depth the grammar
    /// can afford.
    pub fn expand(&self, grammar: &Grammar, depth: u32) -> Vec<Symbol> {
        let productions = grammar.productions();
        let mut current = productions.axiom().to_vec();

        for generation in 0..depth {
            if current.is_empty() {
                break;
            }
            current = self.rewrite(productions, &current);
            trace!(
                "{}: generation {} holds {} symbols",
                grammar.name(),
                generation + 1,
                current.len()
            );
        }

        debug!(
            "expanded {} to depth {} ({} symbols)",
            grammar.name(),
            depth,
            current.len()
        );
        current
    }

    /// Applies one generation of `productions` to `input`.
    pub fn rewrite(&self, productions: &Productions, input: &[Symbol]) -> Vec<Symbol> {
        let Some(&last) = input.last() else {
            return Vec::new();
        };

        let lengths: Vec<usize> = input
            .iter()
            .map(|&symbol| productions.replacement_len(symbol))
            .collect();
        let offsets = exclusive_scan(&lengths);
        let total = offsets[offsets.len() - 1] + productions.replacement_len(last);
        let mut output = vec![0; total];

        let workers = if input.len() >= self.parallel_threshold {
            self.threads.min(input.len())
        } else {
            1
        };

        if workers <= 1 {
            scatter(productions, input, &offsets, &mut output, 0);
            return output;
        }

        let chunk_len = input.len().div_ceil(workers);
        std::thread::scope(|s| {
            let mut rest: &mut [Symbol] = &mut output;
            let mut base = 0;

            for (i, symbols) in input.chunks(chunk_len).enumerate() {
                let start = i * chunk_len;
                let end = start + symbols.len();
                let chunk_end = offsets.get(end).copied().unwrap_or(total);

                let (head, tail) = std::mem::take(&mut rest).split_at_mut(chunk_end - base);
                rest = tail;
                let offsets = &offsets[start..end];
                let chunk_base = base;
                s.spawn(move || scatter(productions, symbols, offsets, head, chunk_base));

                base = chunk_end;
            }
        });

        output
    }
}

/// Exclusive prefix sum: `out[i] = lengths[0] + ... + lengths[i - 1]`.
pub(crate) fn exclusive_scan(lengths: &[usize]) -> Vec<usize> {
    lengths
        .iter()
        .scan(0usize, |acc, &len| {
            let at = *acc;
            *acc += len;
            Some(at)
        })
        .collect()
}

/// Writes each symbol's replacement at its offset. `out` starts at output offset `base`.
fn scatter(
    productions: &Productions,
    symbols: &[Symbol],
    offsets: &[usize],
    out: &mut [Symbol],
    base: usize,
) {
    for (&symbol, &offset) in symbols.iter().zip(offsets) {
        let at = offset - base;
        match productions.rule(symbol) {
            Some(replacement) => out[at..at + replacement.len()].copy_from_slice(replacement),
            None => out[at] = symbol,
        }
    }
}

/// Expansion results keyed by (productions, depth).
///
/// Shapes built from the same grammar share one expansion. Values are computed
/// outside the lock and published write-once: when two threads race on the same
/// key, the first published sequence wins and both callers receive it.
#[derive(Debug, Default)]
pub struct ExpansionCache {
    expander: GrammarExpander,
    entries: Mutex<HashMap<(Arc<Productions>, u32), Arc<[Symbol]>>>,
}

impl ExpansionCache {
    pub fn new(expander: GrammarExpander) -> Self {
        Self {
            expander,
            entries: Mutex::default(),
        }
    }

    pub fn expander(&self) -> &GrammarExpander {
        &self.expander
    }

    /// Returns the cached expansion, computing and publishing it on a miss.
    pub fn get_or_expand(&self, grammar: &Grammar, depth: u32) -> Arc<[Symbol]> {
        let key = (Arc::clone(grammar.productions()), depth);
        if let Some(hit) = self.lock().get(&key) {
            return Arc::clone(hit);
        }

        let fresh: Arc<[Symbol]> = self.expander.expand(grammar, depth).into();
        Arc::clone(self.lock().entry(key).or_insert(fresh))
    }

    pub fn contains(&self, grammar: &Grammar, depth: u32) -> bool {
        self.lock()
            .contains_key(&(Arc::clone(grammar.productions()), depth))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(Arc<Productions>, u32), Arc<[Symbol]>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
