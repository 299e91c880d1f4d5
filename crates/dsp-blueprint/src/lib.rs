//! # dsp-blueprint
//!
//! Parses and emits the text-wrapped blueprint envelope: a header CSV, a
//! quoted base64+gzip payload decoded against a [`dsp_schema::registry::TypeRegistry`],
//! and a trailing signature computed with [`dsp_digest`]'s altered MD5
//! variant (spec §4.6).
//!
//! ```
//! use dsp_schema::parser::parse_schema;
//! use dsp_schema::registry::TypeRegistry;
//! use dsp_blueprint::envelope::{self, BlueprintHeader};
//! use dsp_blueprint::icon_layout::IconLayout;
//! use dsp_schema::value::{Record, FieldValue};
//!
//! let registry = TypeRegistry::build(parse_schema("Payload {\n    int32 value\n}\n").unwrap()).unwrap();
//! let header = BlueprintHeader {
//!     raw_prefix: "0".to_string(),
//!     layout: IconLayout::OneIcon,
//!     icons: [1, 2, 3, 4, 5],
//!     reserved: "0".to_string(),
//!     tick: 621_355_968_000_000_000,
//!     game_version: "0.10.32".to_string(),
//!     short_desc: "hello world".to_string(),
//!     desc: "".to_string(),
//!     extra: Vec::new(),
//! };
//! let payload = Record {
//!     type_name: "Payload".to_string(),
//!     fields: vec![("value".to_string(), FieldValue::Int(42))],
//!     location_start: 0,
//!     location_end: 4,
//! };
//!
//! let text = envelope::encode(&header, &payload, &registry, "Payload").unwrap();
//! let decoded = envelope::decode(&text, &registry, "Payload").unwrap();
//! assert_eq!(decoded.header.short_desc, "hello world");
//! ```

pub mod envelope;
pub mod errors;
pub mod icon_layout;
pub mod ticks;
