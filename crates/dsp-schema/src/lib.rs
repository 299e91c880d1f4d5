//! # dsp-schema
//!
//! A schema-driven binary codec: a compact text grammar describes nested
//! record layouts (arrays, conditionals, cross-field references, injected
//! parameters, generic/template records, assertions, defaults), and this
//! crate compiles it into a [`registry::TypeRegistry`] that can decode,
//! encode, and size a byte stream against it.
//!
//! The pipeline mirrors the component breakdown below: text in, an object
//! tree (or its re-serialized bytes) out.
//!
//! ```
//! use dsp_schema::parser::parse_schema;
//! use dsp_schema::registry::TypeRegistry;
//!
//! let schema_text = r#"
//! Point {
//!     int32 x
//!     int32 y
//! }
//! "#;
//!
//! let ir = parse_schema(schema_text).unwrap();
//! let registry = TypeRegistry::build(ir).unwrap();
//! let bytes = [1, 0, 0, 0, 2, 0, 0, 0];
//! let value = registry.decode("Point", &bytes, &[]).unwrap();
//! assert_eq!(registry.encode("Point", &value).unwrap(), bytes);
//! ```
//!
//! `varint` here is a deliberately non-LEB128 MSB-first encoding; see
//! [`primitive::Varint`] for why.

pub mod codec;
pub mod errors;
pub mod expr;
pub mod ident;
pub mod ir;
pub mod parser;
pub mod primitive;
pub mod registry;
pub mod value;
