use crate::accounts::ResolutionError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("truncated payload: {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },

    #[error("value {value} does not fit in a compact length")]
    VarintOverflow { value: u32 },

    #[error("{location}: {source}")]
    Resolution {
        location: InstructionLocation,
        #[source]
        source: ResolutionError,
    },

    #[error("encoding error: {reason}")]
    Encoding { reason: String },

    #[error("invalid transaction envelope: {reason}")]
    Envelope { reason: String },

    #[error("metadata error: {reason}")]
    Metadata { reason: String },

    #[error("coder {coder} failed: {reason}")]
    Coder { coder: String, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where an instruction sits inside a transaction, used to scope resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionLocation {
    Outer { index: usize },
    Inner { outer_index: u32, index: usize },
}

impl std::fmt::Display for InstructionLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outer { index } => write!(f, "outer instruction {index}"),
            Self::Inner { outer_index, index } => {
                write!(f, "inner instruction {index} of outer {outer_index}")
            }
        }
    }
}
