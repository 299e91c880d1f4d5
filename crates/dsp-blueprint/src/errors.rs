//! Failure kinds for the blueprint envelope (spec §4.6, §7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("blueprint envelope syntax error: {0}")]
    EnvelopeSyntax(String),

    #[error("blueprint signature mismatch: expected {expected}, computed {actual}")]
    SignatureMismatch { expected: String, actual: String },

    #[error("failed to decompress blueprint payload: {0}")]
    PayloadDecompress(String),

    #[error("failed to decode blueprint payload: {0}")]
    Codec(#[from] dsp_schema::errors::CodecError),
}
