//! Hidden Markov model stored in log2 space.
//!
//! A [`Model`] is built once from linear-scale probability tables and is
//! immutable afterwards. States keep the order in which they were supplied;
//! that order is the tie-break order used by the decoder.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::decoder::{Decoder, ViterbiPath};
use crate::error::{HmmError, Result};
use crate::prob::{from_log2, is_probability, to_log2};

/// Discrete first-order HMM with log2-probability tables.
///
/// `S` is the state identifier type and `O` the emission symbol type.
#[derive(Clone, Debug)]
pub struct Model<S, O> {
    states: Vec<S>,
    state_index: HashMap<S, usize>,
    /// Emission alphabet in first-seen order.
    symbols: Vec<O>,
    symbol_index: HashMap<O, usize>,
    /// log2 initial probabilities [s]
    log_start: Vec<f64>,
    /// log2 transition probabilities [s_from][s_to]
    log_trans: Vec<Vec<f64>>,
    /// log2 emission probabilities [s][symbol]; `None` when the state's table
    /// has no entry for the symbol.
    log_emission: Vec<Vec<Option<f64>>>,
}

impl<S, O> Model<S, O>
where
    S: Clone + Eq + Hash + fmt::Debug,
    O: Clone + Eq + Hash + fmt::Debug,
{
    /// Build a model from linear-scale tables.
    ///
    /// - `start`: `(state, p)` pairs covering every state.
    /// - `states`: distinct state identifiers, in tie-break order.
    /// - `trans`: `(from, [(to, p)])` rows covering every ordered pair.
    /// - `emission`: `(state, [(symbol, p)])` rows; a state without a row
    ///   emits nothing.
    ///
    /// # Errors
    /// [`HmmError::EmptyStateSet`] if `states` is empty, otherwise
    /// [`HmmError::InvalidModel`] for duplicates, undeclared or missing
    /// states, and probabilities outside `[0, 1]`.
    pub fn new<ST, SI, TI, TR, EI, ER>(start: ST, states: SI, trans: TI, emission: EI) -> Result<Self>
    where
        ST: IntoIterator<Item = (S, f64)>,
        SI: IntoIterator<Item = S>,
        TI: IntoIterator<Item = (S, TR)>,
        TR: IntoIterator<Item = (S, f64)>,
        EI: IntoIterator<Item = (S, ER)>,
        ER: IntoIterator<Item = (O, f64)>,
    {
        let states: Vec<S> = states.into_iter().collect();
        if states.is_empty() {
            return Err(HmmError::EmptyStateSet);
        }
        let mut state_index = HashMap::with_capacity(states.len());
        for (idx, s) in states.iter().enumerate() {
            if state_index.insert(s.clone(), idx).is_some() {
                return Err(invalid(format!("state {s:?} is declared twice")));
            }
        }
        let n = states.len();
        let lookup = |table: &str, s: &S| -> Result<usize> {
            state_index
                .get(s)
                .copied()
                .ok_or_else(|| invalid(format!("{table} references undeclared state {s:?}")))
        };

        let mut start_row = vec![None; n];
        for (s, p) in start {
            let idx = lookup("start", &s)?;
            let p = checked(p, || format!("start[{s:?}]"))?;
            if start_row[idx].replace(p).is_some() {
                return Err(invalid(format!("start lists state {s:?} twice")));
            }
        }
        let log_start = start_row
            .into_iter()
            .enumerate()
            .map(|(idx, p)| {
                p.map(to_log2)
                    .ok_or_else(|| invalid(format!("start has no entry for state {:?}", states[idx])))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut trans_rows: Vec<Option<Vec<Option<f64>>>> = vec![None; n];
        for (from, row) in trans {
            let i = lookup("trans", &from)?;
            if trans_rows[i].is_some() {
                return Err(invalid(format!("trans lists state {from:?} twice")));
            }
            let mut cells = vec![None; n];
            for (to, p) in row {
                let j = lookup("trans", &to)?;
                let p = checked(p, || format!("trans[{from:?}][{to:?}]"))?;
                if cells[j].replace(p).is_some() {
                    return Err(invalid(format!("trans lists {from:?} -> {to:?} twice")));
                }
            }
            trans_rows[i] = Some(cells);
        }
        let mut log_trans = Vec::with_capacity(n);
        for (i, row) in trans_rows.into_iter().enumerate() {
            let row = row
                .ok_or_else(|| invalid(format!("trans has no row for state {:?}", states[i])))?;
            let log_row = row
                .into_iter()
                .enumerate()
                .map(|(j, p)| {
                    p.map(to_log2).ok_or_else(|| {
                        invalid(format!(
                            "trans has no entry for {:?} -> {:?}",
                            states[i], states[j]
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            log_trans.push(log_row);
        }

        let mut symbols = Vec::new();
        let mut symbol_index: HashMap<O, usize> = HashMap::new();
        let mut sparse_rows: Vec<Option<Vec<(usize, f64)>>> = vec![None; n];
        for (s, row) in emission {
            let i = lookup("emission", &s)?;
            if sparse_rows[i].is_some() {
                return Err(invalid(format!("emission lists state {s:?} twice")));
            }
            let mut entries: Vec<(usize, f64)> = Vec::new();
            for (o, p) in row {
                let p = checked(p, || format!("emission[{s:?}][{o:?}]"))?;
                let k = match symbol_index.get(&o) {
                    Some(&k) => k,
                    None => {
                        symbols.push(o.clone());
                        symbol_index.insert(o.clone(), symbols.len() - 1);
                        symbols.len() - 1
                    }
                };
                if entries.iter().any(|&(seen, _)| seen == k) {
                    return Err(invalid(format!("emission[{s:?}] lists symbol {o:?} twice")));
                }
                entries.push((k, to_log2(p)));
            }
            sparse_rows[i] = Some(entries);
        }
        let log_emission = sparse_rows
            .into_iter()
            .map(|entries| {
                let mut dense = vec![None; symbols.len()];
                for (k, lp) in entries.unwrap_or_default() {
                    dense[k] = Some(lp);
                }
                dense
            })
            .collect();

        #[cfg(feature = "tracing")]
        tracing::debug!(states = n, symbols = symbols.len(), "built HMM");

        Ok(Self {
            states,
            state_index,
            symbols,
            symbol_index,
            log_start,
            log_trans,
            log_emission,
        })
    }

    /// Decode with the default decoder configuration.
    ///
    /// Shorthand for [`Decoder::new(self).decode(observations)`](Decoder::decode).
    pub fn viterbi<I>(&self, observations: I) -> Result<ViterbiPath<S>>
    where
        I: IntoIterator,
        I::Item: Borrow<O>,
    {
        Decoder::new(self).decode(observations)
    }

    /// log2 P(start in `state`), or `None` for an undeclared state.
    pub fn log_start(&self, state: &S) -> Option<f64> {
        self.state_id(state).map(|i| self.log_start[i])
    }

    /// log2 P(`from` -> `to`).
    pub fn log_transition(&self, from: &S, to: &S) -> Option<f64> {
        Some(self.log_trans[self.state_id(from)?][self.state_id(to)?])
    }

    /// log2 P(emit `symbol` | `state`); `None` if the state's table does not
    /// mention the symbol.
    pub fn log_emission(&self, state: &S, symbol: &O) -> Option<f64> {
        self.log_emission[self.state_id(state)?][self.symbol_id(symbol)?]
    }
}

impl<S, O> Model<S, O>
where
    S: Eq + Hash,
    O: Eq + Hash,
{
    /// States in tie-break order.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Emission alphabet in first-seen order.
    pub fn symbols(&self) -> &[O] {
        &self.symbols
    }

    pub(crate) fn state_id(&self, state: &S) -> Option<usize> {
        self.state_index.get(state).copied()
    }

    pub(crate) fn symbol_id(&self, symbol: &O) -> Option<usize> {
        self.symbol_index.get(symbol).copied()
    }

    #[inline]
    pub(crate) fn start_at(&self, s: usize) -> f64 {
        self.log_start[s]
    }

    #[inline]
    pub(crate) fn trans_at(&self, from: usize, to: usize) -> f64 {
        self.log_trans[from][to]
    }

    #[inline]
    pub(crate) fn emission_at(&self, s: usize, symbol: usize) -> Option<f64> {
        self.log_emission[s][symbol]
    }
}

impl<S, O> Model<S, O>
where
    S: Clone + Eq + Hash,
    O: Clone + Eq + Hash,
{
    /// Linear-scale view of the model for display.
    ///
    /// Finite log values become `2^x`; `-inf` becomes `0.0`.
    pub fn describe(&self) -> ModelDescription<S, O> {
        let start = self
            .states
            .iter()
            .zip(&self.log_start)
            .map(|(s, &lp)| (s.clone(), from_log2(lp)))
            .collect();
        let trans = self
            .states
            .iter()
            .zip(&self.log_trans)
            .map(|(s, row)| {
                let cells = self
                    .states
                    .iter()
                    .zip(row)
                    .map(|(t, &lp)| (t.clone(), from_log2(lp)))
                    .collect();
                (s.clone(), cells)
            })
            .collect();
        let emission = self
            .states
            .iter()
            .zip(&self.log_emission)
            .map(|(s, row)| {
                let cells = self
                    .symbols
                    .iter()
                    .zip(row)
                    .filter_map(|(o, lp)| lp.map(|lp| (o.clone(), from_log2(lp))))
                    .collect();
                (s.clone(), cells)
            })
            .collect();
        ModelDescription {
            states: self.states.clone(),
            start,
            trans,
            emission,
        }
    }
}

impl<S, O> fmt::Display for Model<S, O>
where
    S: Clone + Eq + Hash + fmt::Display,
    O: Clone + Eq + Hash + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.describe(), f)
    }
}

/// Linear-scale tables reconstructed from a [`Model`].
///
/// Rows follow the model's state order; emission rows list only the symbols
/// the state's table mentions, in alphabet order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelDescription<S, O> {
    pub states: Vec<S>,
    pub start: Vec<(S, f64)>,
    pub trans: Vec<(S, Vec<(S, f64)>)>,
    pub emission: Vec<(S, Vec<(O, f64)>)>,
}

impl<S: fmt::Display, O: fmt::Display> fmt::Display for ModelDescription<S, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Start:")?;
        for (s, p) in &self.start {
            writeln!(f, "  {s}: {p}")?;
        }
        writeln!(f, "States:")?;
        let names: Vec<String> = self.states.iter().map(ToString::to_string).collect();
        writeln!(f, "  {}", names.join(", "))?;
        writeln!(f, "Transition Probabilities:")?;
        for (from, row) in &self.trans {
            for (to, p) in row {
                writeln!(f, "  {from} -> {to}: {p}")?;
            }
        }
        writeln!(f, "Emission Probabilities:")?;
        for (s, row) in &self.emission {
            let cells: Vec<String> = row.iter().map(|(o, p)| format!("{o}={p}")).collect();
            writeln!(f, "  {s}: {}", cells.join(" "))?;
        }
        Ok(())
    }
}

fn invalid(msg: String) -> HmmError {
    HmmError::InvalidModel(msg)
}

fn checked(p: f64, location: impl FnOnce() -> String) -> Result<f64> {
    if is_probability(p) {
        Ok(p)
    } else {
        Err(invalid(format!("{} = {p} is not a probability in [0, 1]", location())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin() -> Model<&'static str, char> {
        Model::new(
            [("Fair", 0.9), ("Loaded", 0.1)],
            ["Fair", "Loaded"],
            [
                ("Fair", vec![("Fair", 1.0), ("Loaded", 0.0)]),
                ("Loaded", vec![("Fair", 0.0), ("Loaded", 1.0)]),
            ],
            [
                ("Fair", vec![('H', 0.5), ('T', 0.5)]),
                ("Loaded", vec![('H', 1.0), ('T', 0.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn stores_log2_values() {
        let m = coin();
        assert_eq!(m.log_start(&"Loaded"), Some(0.1f64.log2()));
        assert_eq!(m.log_transition(&"Fair", &"Fair"), Some(0.0));
        assert_eq!(m.log_transition(&"Fair", &"Loaded"), Some(f64::NEG_INFINITY));
        assert_eq!(m.log_emission(&"Fair", &'H'), Some(-1.0));
        assert_eq!(m.log_emission(&"Loaded", &'T'), Some(f64::NEG_INFINITY));
        assert_eq!(m.log_emission(&"Loaded", &'X'), None);
        assert_eq!(m.log_start(&"Biased"), None);
    }

    #[test]
    fn alphabet_is_first_seen_order() {
        let m = coin();
        assert_eq!(m.states(), &["Fair", "Loaded"]);
        assert_eq!(m.symbols(), &['H', 'T']);
        assert_eq!(m.num_states(), 2);
    }

    #[test]
    fn empty_state_set_is_rejected() {
        let err = Model::<&str, char>::new(
            Vec::<(&str, f64)>::new(),
            Vec::<&str>::new(),
            Vec::<(&str, Vec<(&str, f64)>)>::new(),
            Vec::<(&str, Vec<(char, f64)>)>::new(),
        )
        .unwrap_err();
        assert!(matches!(err, HmmError::EmptyStateSet));
    }

    #[test]
    fn missing_start_entry_is_rejected() {
        let err = Model::new(
            [("A", 1.0)],
            ["A", "B"],
            [("A", vec![("A", 1.0), ("B", 0.0)]), ("B", vec![("A", 0.0), ("B", 1.0)])],
            [("A", vec![('x', 1.0)])],
        )
        .unwrap_err();
        assert!(matches!(&err, HmmError::InvalidModel(msg) if msg.contains("start has no entry")));
    }

    #[test]
    fn missing_transition_is_rejected() {
        let err = Model::new(
            [("A", 0.5), ("B", 0.5)],
            ["A", "B"],
            [("A", vec![("A", 1.0)]), ("B", vec![("A", 0.0), ("B", 1.0)])],
            [("A", vec![('x', 1.0)])],
        )
        .unwrap_err();
        assert!(
            matches!(&err, HmmError::InvalidModel(msg) if msg.contains("\"A\" -> \"B\"")),
            "{err}"
        );
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let err = Model::new(
            [("A", 1.5)],
            ["A"],
            [("A", vec![("A", 1.0)])],
            [("A", vec![('x', 1.0)])],
        )
        .unwrap_err();
        assert!(matches!(err, HmmError::InvalidModel(_)));

        let err = Model::new(
            [("A", 1.0)],
            ["A"],
            [("A", vec![("A", 1.0)])],
            [("A", vec![('x', f64::NAN)])],
        )
        .unwrap_err();
        assert!(matches!(err, HmmError::InvalidModel(_)));
    }

    #[test]
    fn duplicates_and_undeclared_states_are_rejected() {
        let dup_state = Model::new(
            [("A", 1.0)],
            ["A", "A"],
            [("A", vec![("A", 1.0)])],
            [("A", vec![('x', 1.0)])],
        );
        assert!(matches!(dup_state, Err(HmmError::InvalidModel(_))));

        let undeclared = Model::new(
            [("A", 1.0), ("Z", 0.0)],
            ["A"],
            [("A", vec![("A", 1.0)])],
            [("A", vec![('x', 1.0)])],
        );
        assert!(matches!(undeclared, Err(HmmError::InvalidModel(_))));

        let dup_symbol = Model::new(
            [("A", 1.0)],
            ["A"],
            [("A", vec![("A", 1.0)])],
            [("A", vec![('x', 0.5), ('x', 0.5)])],
        );
        assert!(matches!(dup_symbol, Err(HmmError::InvalidModel(_))));
    }

    #[test]
    fn state_without_emission_row_emits_nothing() {
        let m = Model::new(
            [("A", 0.5), ("B", 0.5)],
            ["A", "B"],
            [("A", vec![("A", 0.5), ("B", 0.5)]), ("B", vec![("A", 0.5), ("B", 0.5)])],
            [("A", vec![('x', 1.0)])],
        )
        .unwrap();
        assert_eq!(m.log_emission(&"B", &'x'), None);
        let d = m.describe();
        assert_eq!(d.emission[1], ("B", vec![]));
    }

    #[test]
    fn describe_restores_linear_tables() {
        let d = coin().describe();
        assert_eq!(d.states, vec!["Fair", "Loaded"]);
        assert_eq!(d.start[0].0, "Fair");
        assert!((d.start[0].1 - 0.9).abs() < 1e-12);
        assert!((d.start[1].1 - 0.1).abs() < 1e-12);
        assert_eq!(d.trans[0], ("Fair", vec![("Fair", 1.0), ("Loaded", 0.0)]));
        assert_eq!(d.emission[1], ("Loaded", vec![('H', 1.0), ('T', 0.0)]));
    }

    #[test]
    fn display_lists_every_section() {
        let text = coin().to_string();
        for header in [
            "Start:",
            "States:",
            "Transition Probabilities:",
            "Emission Probabilities:",
        ] {
            assert!(text.contains(header), "missing {header} in\n{text}");
        }
        assert!(text.contains("Fair -> Loaded: 0"));
        assert!(text.contains("Loaded: H=1 T=0"));
    }
}
