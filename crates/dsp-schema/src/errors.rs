//! The closed error taxonomy from the spec: every failure is fatal for the
//! enclosing decode/encode/build call, carries enough structured context to
//! locate the fault without re-reading the input, and none are retried.

use thiserror::Error;

/// Failures that can occur while parsing schema text or building the type
/// registry from the parsed [`crate::ir`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema syntax error at line {line}: {message}")]
    SchemaSyntax { line: usize, message: String },

    #[error("record {record:?} references unknown type {name:?}")]
    UnknownType { record: String, name: String },

    #[error("record {name:?} instantiated with {got} template argument(s), expected {expected}")]
    TemplateArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("duplicate record definition {name:?}")]
    DuplicateRecord { name: String },

    #[error(
        "record {name:?} recurses into its own layout without an intervening conditional guard"
    )]
    SchemaCycle { name: String },
}

/// Failures that can occur while decoding or encoding a byte stream against
/// an already-built [`crate::registry::TypeRegistry`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("unexpected end of input decoding {record}.{field} at offset {offset}")]
    UnexpectedEof {
        record: String,
        field: String,
        offset: usize,
    },

    #[error("assertion failed on {record}.{field}: expected {expected}, got {actual}")]
    AssertionFailed {
        record: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("invalid utf-8 decoding {record}.{field} at offset {offset}")]
    Utf8 {
        record: String,
        field: String,
        offset: usize,
    },

    #[error("record {record:?} references unknown type {name:?} while decoding field {field}")]
    UnknownType {
        record: String,
        field: String,
        name: String,
    },

    #[error("record {name:?} instantiated with {got} template argument(s), expected {expected}")]
    TemplateArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error(
        "cannot decode template record {name:?} directly; only named instantiations may be decoded"
    )]
    TemplateNotInstantiable { name: String },

    #[error("malformed expression {expr:?} in {record}.{field}: {message}")]
    BadExpression {
        record: String,
        field: String,
        expr: String,
        message: String,
    },
}
