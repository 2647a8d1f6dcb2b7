//! Error types for model construction and decoding.

use thiserror::Error;

/// Everything that can go wrong while building a model or decoding with it.
#[derive(Debug, Error)]
pub enum HmmError {
    /// A probability table is malformed, incomplete, or out of range.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// The model was given no states.
    #[error("invalid model: state set is empty")]
    EmptyStateSet,

    /// `decode` was called with an empty observation sequence.
    #[error("observation sequence is empty")]
    EmptyObservations,

    /// An observation has no emission entry for some state.
    ///
    /// `state` is `None` when no state at all knows the symbol.
    #[error("unknown symbol {symbol} at position {position}{}", for_state(.state))]
    UnknownSymbol {
        position: usize,
        symbol: String,
        state: Option<String>,
    },

    /// Model definition text is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Model definition file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn for_state(state: &Option<String>) -> String {
    state
        .as_ref()
        .map(|s| format!(" for state {s}"))
        .unwrap_or_default()
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HmmError>;

#[cfg(test)]
mod tests {
    use super::HmmError;

    #[test]
    fn unknown_symbol_message_names_state_when_known() {
        let err = HmmError::UnknownSymbol {
            position: 3,
            symbol: "\"X\"".into(),
            state: Some("\"Fair\"".into()),
        };
        assert_eq!(
            err.to_string(),
            "unknown symbol \"X\" at position 3 for state \"Fair\""
        );

        let err = HmmError::UnknownSymbol {
            position: 0,
            symbol: "'Z'".into(),
            state: None,
        };
        assert_eq!(err.to_string(), "unknown symbol 'Z' at position 0");
    }

    #[test]
    fn json_errors_convert() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: HmmError = parse.unwrap_err().into();
        assert!(matches!(err, HmmError::Json(_)));
    }
}
