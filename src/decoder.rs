//! Log-space Viterbi decoding.
//!
//! The decoder keeps a rolling frontier holding the best log2 probability
//! of a path ending in each state, plus one row of backpointers per step.
//! Walking the backpointers from the winning terminal state recovers the
//! best prefix for that state, so only O(N) probabilities are live at any
//! time while the path itself costs O(T * N) indices.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::error::{HmmError, Result};
use crate::model::Model;
use crate::prob::{argmax_first, from_log2};

/// What to do with an observation that a state's emission table does not
/// mention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownSymbolPolicy {
    /// Fail before decoding if any state lacks the symbol.
    #[default]
    Strict,
    /// Treat a missing entry as probability zero for that state. A symbol no
    /// state knows is still an error.
    Impossible,
}

/// Most probable state path for an observation sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ViterbiPath<S> {
    /// Joint probability of `path` and the observations, in linear scale.
    pub probability: f64,
    /// Same probability in log2 space; `-inf` when no path is possible.
    ///
    /// JSON has no infinity, so `serde_json` writes `-inf` as `null`.
    pub log2_probability: f64,
    /// One state per observation.
    pub path: Vec<S>,
}

impl<S> ViterbiPath<S> {
    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Split into `(probability, path)`.
    pub fn into_parts(self) -> (f64, Vec<S>) {
        (self.probability, self.path)
    }
}

/// Best log2 probability of a path ending in each state at one step.
#[derive(Clone, Debug)]
pub(crate) struct Frontier {
    pub(crate) log_delta: Vec<f64>,
}

/// Viterbi decoder bound to a model.
///
/// Cheap to construct; a single decoder can be reused for any number of
/// observation sequences. Use [`DecoderBuilder`](crate::DecoderBuilder) to
/// change the unknown-symbol policy.
#[derive(Clone, Debug)]
pub struct Decoder<'m, S, O> {
    model: &'m Model<S, O>,
    unknown_symbols: UnknownSymbolPolicy,
}

impl<'m, S, O> Decoder<'m, S, O>
where
    S: Clone + Eq + Hash + fmt::Debug,
    O: Clone + Eq + Hash + fmt::Debug,
{
    /// Decoder with default settings.
    pub fn new(model: &'m Model<S, O>) -> Self {
        Self::with_policy(model, UnknownSymbolPolicy::default())
    }

    pub(crate) fn with_policy(model: &'m Model<S, O>, unknown_symbols: UnknownSymbolPolicy) -> Self {
        Self {
            model,
            unknown_symbols,
        }
    }

    pub fn model(&self) -> &'m Model<S, O> {
        self.model
    }

    pub fn unknown_symbols(&self) -> UnknownSymbolPolicy {
        self.unknown_symbols
    }

    /// Compute the most probable state path for `observations`.
    ///
    /// Ties between equally probable predecessors, and between equally
    /// probable final states, go to the state listed first in the model.
    ///
    /// # Errors
    /// - [`HmmError::EmptyObservations`] for an empty sequence.
    /// - [`HmmError::UnknownSymbol`] per the configured
    ///   [`UnknownSymbolPolicy`].
    pub fn decode<I>(&self, observations: I) -> Result<ViterbiPath<S>>
    where
        I: IntoIterator,
        I::Item: Borrow<O>,
    {
        let symbols = self.resolve_symbols(observations)?;
        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "viterbi_decode",
            observations = symbols.len(),
            states = self.model.num_states()
        );
        #[cfg(feature = "tracing")]
        let _enter = span.enter();

        let mut frontier = self.init_frontier(symbols[0]);
        let mut back: Vec<Vec<usize>> = Vec::with_capacity(symbols.len() - 1);
        for (_t, &sym) in symbols.iter().enumerate().skip(1) {
            #[cfg(feature = "tracing")]
            let span = tracing::trace_span!("forward_step", step = _t);
            #[cfg(feature = "tracing")]
            let _enter = span.enter();
            let (next, pointers) = self.forward_step(&frontier, sym);
            frontier = next;
            back.push(pointers);
        }

        let (last, log_p) = terminal_state(&frontier);
        let path = self.reconstruct(&back, last);
        #[cfg(feature = "tracing")]
        tracing::debug!(log2_probability = log_p, path_len = path.len(), "viterbi path found");

        Ok(ViterbiPath {
            probability: from_log2(log_p),
            log2_probability: log_p,
            path,
        })
    }

    /// Map observations to alphabet indices and enforce the symbol policy.
    fn resolve_symbols<I>(&self, observations: I) -> Result<Vec<usize>>
    where
        I: IntoIterator,
        I::Item: Borrow<O>,
    {
        let mut symbols = Vec::new();
        for (position, item) in observations.into_iter().enumerate() {
            let obs: &O = item.borrow();
            let sym = self.model.symbol_id(obs).ok_or_else(|| HmmError::UnknownSymbol {
                position,
                symbol: format!("{obs:?}"),
                state: None,
            })?;
            if self.unknown_symbols == UnknownSymbolPolicy::Strict {
                let missing = (0..self.model.num_states())
                    .find(|&s| self.model.emission_at(s, sym).is_none());
                if let Some(s) = missing {
                    return Err(HmmError::UnknownSymbol {
                        position,
                        symbol: format!("{obs:?}"),
                        state: Some(format!("{:?}", self.model.states()[s])),
                    });
                }
            }
            symbols.push(sym);
        }
        if symbols.is_empty() {
            return Err(HmmError::EmptyObservations);
        }
        Ok(symbols)
    }

    #[inline]
    fn emit(&self, state: usize, sym: usize) -> f64 {
        self.model
            .emission_at(state, sym)
            .unwrap_or(f64::NEG_INFINITY)
    }

    fn init_frontier(&self, sym: usize) -> Frontier {
        let log_delta = (0..self.model.num_states())
            .map(|s| self.model.start_at(s) + self.emit(s, sym))
            .collect();
        Frontier { log_delta }
    }

    /// One recurrence step. Returns the next frontier together with the best
    /// predecessor of every destination state.
    ///
    /// The input frontier is only read, so every destination sees the
    /// previous step's values.
    fn forward_step(&self, f: &Frontier, sym: usize) -> (Frontier, Vec<usize>) {
        let n = self.model.num_states();
        let mut log_delta = Vec::with_capacity(n);
        let mut pointers = Vec::with_capacity(n);
        for s_to in 0..n {
            let (s_from, best) = argmax_first(
                f.log_delta
                    .iter()
                    .enumerate()
                    .map(|(s_from, &v)| v + self.model.trans_at(s_from, s_to)),
            )
            .unwrap_or((0, f64::NEG_INFINITY));
            log_delta.push(best + self.emit(s_to, sym));
            pointers.push(s_from);
        }
        (Frontier { log_delta }, pointers)
    }

    fn reconstruct(&self, back: &[Vec<usize>], last: usize) -> Vec<S> {
        let states = self.model.states();
        let mut path = Vec::with_capacity(back.len() + 1);
        let mut s = last;
        path.push(states[s].clone());
        for pointers in back.iter().rev() {
            s = pointers[s];
            path.push(states[s].clone());
        }
        path.reverse();
        path
    }
}

/// State with the highest final log probability, first-seen on ties.
fn terminal_state(frontier: &Frontier) -> (usize, f64) {
    argmax_first(frontier.log_delta.iter().copied()).unwrap_or((0, f64::NEG_INFINITY))
}

/// Decode `observations` against `model` with the default configuration.
pub fn decode<S, O, I>(model: &Model<S, O>, observations: I) -> Result<ViterbiPath<S>>
where
    S: Clone + Eq + Hash + fmt::Debug,
    O: Clone + Eq + Hash + fmt::Debug,
    I: IntoIterator,
    I::Item: Borrow<O>,
{
    Decoder::new(model).decode(observations)
}
