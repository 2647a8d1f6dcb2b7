//! Log-space Viterbi decoding for discrete hidden Markov models.
//!
//! Given an HMM (states, initial distribution, transitions, per-state
//! emissions) and a sequence of observed symbols, this crate computes the
//! single most probable sequence of hidden states and the joint probability of
//! that path with the observations.
//!
//! ## Core idea
//! 1. Build a [`Model`] from linear-scale probability tables. Every value is
//!    converted once to log2; zero becomes `-inf`.
//! 2. Run a [`Decoder`] (or the [`decode`] shorthand) over the observations.
//!    All accumulation is addition in log space, so long sequences do not
//!    underflow.
//! 3. Read back a [`ViterbiPath`]: the path plus its probability converted to
//!    linear scale.
//!
//! ## Quick start
//! ```
//! use hmm_viterbi::Model;
//!
//! let coin = Model::new(
//!     [("Fair", 0.9), ("Loaded", 0.1)],
//!     ["Fair", "Loaded"],
//!     [
//!         ("Fair", vec![("Fair", 1.0), ("Loaded", 0.0)]),
//!         ("Loaded", vec![("Fair", 0.0), ("Loaded", 1.0)]),
//!     ],
//!     [
//!         ("Fair", vec![('H', 0.5), ('T', 0.5)]),
//!         ("Loaded", vec![('H', 1.0), ('T', 0.0)]),
//!     ],
//! )?;
//!
//! let best = coin.viterbi("HHHHH".chars())?;
//! assert_eq!(best.path, vec!["Loaded"; 5]);
//! assert!((best.probability - 0.1).abs() < 1e-12);
//! # Ok::<(), hmm_viterbi::HmmError>(())
//! ```
//!
//! ## Ties and impossible paths
//! Whenever two predecessors, or two final states, score the same, the state
//! listed first in the model wins. A path is always returned: if every path
//! has probability zero the result has probability `0.0` and still one state
//! per observation.
//!
//! ## Unknown symbols
//! By default an observation missing from any state's emission table is an
//! error ([`UnknownSymbolPolicy::Strict`]). [`DecoderBuilder`] can switch to
//! [`UnknownSymbolPolicy::Impossible`], which treats the missing entries as
//! probability zero.

pub mod builder;
pub mod decoder;
pub mod definition;
pub mod error;
pub mod model;
pub mod prob;

pub use crate::builder::DecoderBuilder;
pub use crate::decoder::{decode, Decoder, UnknownSymbolPolicy, ViterbiPath};
pub use crate::definition::ModelDefinition;
pub use crate::error::{HmmError, Result};
pub use crate::model::{Model, ModelDescription};
