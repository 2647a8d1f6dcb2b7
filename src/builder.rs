use std::fmt;
use std::hash::Hash;

use crate::decoder::{Decoder, UnknownSymbolPolicy};
use crate::model::Model;

pub struct DecoderBuilder<'m, S, O> {
    model: &'m Model<S, O>,
    unknown_symbols: Option<UnknownSymbolPolicy>,
}

impl<'m, S, O> DecoderBuilder<'m, S, O>
where
    S: Clone + Eq + Hash + fmt::Debug,
    O: Clone + Eq + Hash + fmt::Debug,
{
    pub fn new(model: &'m Model<S, O>) -> Self {
        Self {
            model,
            unknown_symbols: None,
        }
    }
    pub fn unknown_symbols(mut self, policy: UnknownSymbolPolicy) -> Self {
        self.unknown_symbols = Some(policy);
        self
    }
    pub fn build(self) -> Decoder<'m, S, O> {
        match self.unknown_symbols {
            Some(policy) => Decoder::with_policy(self.model, policy),
            None => Decoder::new(self.model),
        }
    }
}
