use thiserror::Error;

pub type Result<A, E = Error> = std::result::Result<A, E>;

/// The error taxonomy for the codec: schema problems are caller bugs,
/// input/range problems are bad data, buffer/framing problems are
/// truncated or malformed wire bytes.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("schema document error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema is internally inconsistent: duplicate names, a
    /// `CalcExpression` that fails to parse, an out-of-range enum key.
    #[error("schema error: {0}")]
    Schema(String),

    /// A value handed to `encode` does not match what its field expects.
    #[error("input error: {0}")]
    Input(String),

    /// A value is the right shape but out of the field's representable
    /// range.
    #[error("value out of range: {0}")]
    Range(String),

    /// The wire buffer is too short, or a decoded length/offset runs
    /// past the end of the buffer.
    #[error("buffer error: {0}")]
    Buffer(String),

    /// Framing-level failure: unrecognized magic, inconsistent message
    /// key between the envelope and the resolved message, mismatched
    /// framing mode.
    #[error("framing error: {0}")]
    Framing(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}
