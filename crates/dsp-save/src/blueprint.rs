//! The blueprint payload root record (`BlueprintData`, spec.md §4.6), wired
//! to [`dsp_blueprint::envelope`] for the surrounding text envelope.

use std::sync::LazyLock;

use dsp_blueprint::errors::BlueprintError;
use dsp_blueprint::envelope::{self, Blueprint, BlueprintHeader};
use dsp_schema::errors::SchemaError;
use dsp_schema::parser::parse_schema;
use dsp_schema::registry::TypeRegistry;
use dsp_schema::value::Record;

use crate::schema_text::BLUEPRINT_SCHEMA;

const ROOT: &str = "BlueprintData";

static REGISTRY: LazyLock<TypeRegistry> =
    LazyLock::new(|| build_registry().expect("embedded blueprint schema is valid"));

fn build_registry() -> Result<TypeRegistry, SchemaError> {
    TypeRegistry::build(parse_schema(BLUEPRINT_SCHEMA)?)
}

/// Entry point for decoding and re-encoding a blueprint's text envelope
/// against the `BlueprintData` payload root record.
pub struct BlueprintPayload;

impl BlueprintPayload {
    /// Parses a full `BLUEPRINT:...` text, validating its signature (spec.md
    /// §4.6) and decoding its payload against `BlueprintData`.
    pub fn decode(text: &str) -> Result<Blueprint, BlueprintError> {
        envelope::decode(text, &REGISTRY, ROOT)
    }

    /// Serializes `header` and `payload` back into blueprint envelope text,
    /// recomputing the signature over the freshly emitted bytes.
    pub fn encode(header: &BlueprintHeader, payload: &Record) -> Result<String, BlueprintError> {
        envelope::encode(header, payload, &REGISTRY, ROOT)
    }
}
