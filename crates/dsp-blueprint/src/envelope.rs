//! The text-wrapped blueprint envelope (spec §4.6): a header CSV, a quoted
//! base64+gzip payload, and a trailing MD5-variant signature.
//!
//! ```text
//! BLUEPRINT:<h0>,<h1>,...,<h11>[,...]"<base64 payload>"<32 hex digits>
//! ```
//!
//! The signature covers everything from `BLUEPRINT:` up to, but not
//! including, the closing quote. This matches the reference decoder's slice
//! boundary exactly (`data[:data_end_pos]`, which excludes the character at
//! `data_end_pos`) even though it reads as "excluding" the quote rather than
//! "including" it — see `DESIGN.md` for why the reference implementation's
//! byte range wins over a surface reading of the prose spec here.

use dsp_schema::registry::TypeRegistry;
use dsp_schema::value::Record;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::errors::BlueprintError;
use crate::icon_layout::IconLayout;

const MIN_LENGTH: usize = 28;
const PREFIX: &str = "BLUEPRINT:";
/// The opening quote is searched for starting at this offset, not at
/// `PREFIX.len()` — matches the reference decoder's `data.find('"', 28,
/// ...)` window exactly rather than just "right after the prefix".
const OPEN_QUOTE_SEARCH_START: usize = 28;
const OPEN_QUOTE_SEARCH_LIMIT: usize = 8192;
const SIGNATURE_LEN: usize = 32;
const MIN_HEADER_FIELDS: usize = 12;

/// The parsed header CSV preceding the quoted payload.
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintHeader {
    /// Header field 0. Unused by the original reference decoder but
    /// preserved verbatim so re-encoding round-trips it.
    pub raw_prefix: String,
    pub layout: IconLayout,
    pub icons: [i64; 5],
    /// Header field 7: present in every sample but never interpreted.
    pub reserved: String,
    /// .NET ticks (100ns units since `0001-01-01`); see [`crate::ticks`].
    pub tick: i64,
    pub game_version: String,
    pub short_desc: String,
    pub desc: String,
    /// Any header fields beyond the twelve named ones, preserved verbatim.
    pub extra: Vec<String>,
}

/// A fully decoded blueprint: its header plus the decoded payload record.
#[derive(Debug, Clone)]
pub struct Blueprint {
    pub header: BlueprintHeader,
    pub payload: Record,
}

const DESC_PERCENT_SET: &AsciiSet = &CONTROLS.add(b',').add(b'"').add(b'%').add(b' ');

/// Parses and validates a blueprint envelope's text, decoding its payload
/// against `root_type_name` in `registry`.
pub fn decode(
    text: &str,
    registry: &TypeRegistry,
    root_type_name: &str,
) -> Result<Blueprint, BlueprintError> {
    if text.len() < MIN_LENGTH {
        return Err(BlueprintError::EnvelopeSyntax(format!(
            "length corrupt, expected no less than {MIN_LENGTH} bytes, but got {}",
            text.len()
        )));
    }
    if !text.starts_with(PREFIX) {
        return Err(BlueprintError::EnvelopeSyntax("corrupt header".to_string()));
    }

    let bytes = text.as_bytes();
    let search_end = text.len().min(OPEN_QUOTE_SEARCH_LIMIT);
    let open_quote = bytes[OPEN_QUOTE_SEARCH_START..search_end]
        .iter()
        .position(|&b| b == b'"')
        .map(|i| i + OPEN_QUOTE_SEARCH_START)
        .ok_or_else(|| {
            BlueprintError::EnvelopeSyntax(
                "corrupt data, expected quote char (\") near the beginning of the file".to_string(),
            )
        })?;

    let header_fields: Vec<&str> = text[PREFIX.len()..open_quote].split(',').collect();
    if header_fields.len() < MIN_HEADER_FIELDS {
        return Err(BlueprintError::EnvelopeSyntax(format!(
            "invalid header array length, expected no less than {MIN_HEADER_FIELDS}, but got {}",
            header_fields.len()
        )));
    }

    let check_from = text.len().saturating_sub(36);
    let close_quote = bytes[check_from..]
        .iter()
        .rposition(|&b| b == b'"')
        .map(|i| i + check_from)
        .ok_or_else(|| {
            BlueprintError::EnvelopeSyntax(
                "corrupt data, expected quote char (\") near the end of the file".to_string(),
            )
        })?;

    let trailing_len = text.len() - 1 - close_quote;
    if trailing_len != SIGNATURE_LEN {
        return Err(BlueprintError::EnvelopeSyntax(format!(
            "invalid position for quote char (\") near the end of the file: {trailing_len} trailing bytes, expected {SIGNATURE_LEN}"
        )));
    }

    let header = parse_header(&header_fields)?;

    let signed_region = &text[..close_quote];
    let computed = dsp_digest::digest(signed_region.as_bytes()).to_hex();
    let expected = text[close_quote + 1..close_quote + 1 + SIGNATURE_LEN].to_lowercase();
    if computed != expected {
        return Err(BlueprintError::SignatureMismatch {
            expected,
            actual: computed,
        });
    }

    let payload_b64 = &text[open_quote + 1..close_quote];
    let payload_bytes = decompress_payload(payload_b64)?;
    let payload = registry.decode(root_type_name, &payload_bytes, &[])?;

    Ok(Blueprint { header, payload })
}

fn parse_header(fields: &[&str]) -> Result<BlueprintHeader, BlueprintError> {
    let parse_int = |s: &str, name: &str| -> Result<i64, BlueprintError> {
        s.parse::<i64>()
            .map_err(|_| BlueprintError::EnvelopeSyntax(format!("invalid {name}: {s:?}")))
    };

    let layout_code = parse_int(fields[1], "icon layout")? as i32;
    let icons = [
        parse_int(fields[2], "icon0")?,
        parse_int(fields[3], "icon1")?,
        parse_int(fields[4], "icon2")?,
        parse_int(fields[5], "icon3")?,
        parse_int(fields[6], "icon4")?,
    ];
    let tick = parse_int(fields[8], "tick")?;

    Ok(BlueprintHeader {
        raw_prefix: fields[0].to_string(),
        layout: IconLayout::try_from(layout_code)?,
        icons,
        reserved: fields[7].to_string(),
        tick,
        game_version: fields[9].to_string(),
        short_desc: percent_decode(fields[10]),
        desc: percent_decode(fields[11]),
        extra: fields[MIN_HEADER_FIELDS..].iter().map(|s| s.to_string()).collect(),
    })
}

fn percent_decode(field: &str) -> String {
    percent_encoding::percent_decode_str(field)
        .decode_utf8_lossy()
        .into_owned()
}

fn decompress_payload(base64_text: &str) -> Result<Vec<u8>, BlueprintError> {
    use base64::Engine;
    use std::io::Read;

    let compressed = base64::engine::general_purpose::STANDARD
        .decode(base64_text.as_bytes())
        .map_err(|e| BlueprintError::EnvelopeSyntax(format!("invalid base64 payload: {e}")))?;

    let mut decoder = flate2::read::GzDecoder::new(&compressed[..]);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| BlueprintError::PayloadDecompress(e.to_string()))?;
    Ok(out)
}

/// Serializes `header` and `payload` back into blueprint envelope text,
/// recomputing the signature over the freshly emitted bytes.
pub fn encode(
    header: &BlueprintHeader,
    payload: &Record,
    registry: &TypeRegistry,
    root_type_name: &str,
) -> Result<String, BlueprintError> {
    use base64::Engine;
    use std::io::Write;

    let payload_bytes = registry.encode(root_type_name, payload)?;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder
        .write_all(&payload_bytes)
        .map_err(|e| BlueprintError::PayloadDecompress(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| BlueprintError::PayloadDecompress(e.to_string()))?;
    let payload_b64 = base64::engine::general_purpose::STANDARD.encode(compressed);

    let mut fields = vec![
        header.raw_prefix.clone(),
        i32::from(header.layout).to_string(),
        header.icons[0].to_string(),
        header.icons[1].to_string(),
        header.icons[2].to_string(),
        header.icons[3].to_string(),
        header.icons[4].to_string(),
        header.reserved.clone(),
        header.tick.to_string(),
        header.game_version.clone(),
        utf8_percent_encode(&header.short_desc, DESC_PERCENT_SET).to_string(),
        utf8_percent_encode(&header.desc, DESC_PERCENT_SET).to_string(),
    ];
    fields.extend(header.extra.iter().cloned());

    let signed_region = format!("{PREFIX}{}\"{payload_b64}", fields.join(","));
    let digest = dsp_digest::digest(signed_region.as_bytes()).to_hex();

    Ok(format!("{signed_region}\"{digest}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_schema::parser::parse_schema;

    fn registry() -> TypeRegistry {
        TypeRegistry::build(parse_schema("Payload {\n    int32 value\n}\n").unwrap()).unwrap()
    }

    fn sample_header() -> BlueprintHeader {
        BlueprintHeader {
            raw_prefix: "0".to_string(),
            layout: IconLayout::OneIcon,
            icons: [1, 2, 3, 4, 5],
            reserved: "0".to_string(),
            tick: 621_355_968_000_000_000,
            game_version: "0.10.32".to_string(),
            short_desc: "hi".to_string(),
            desc: "there".to_string(),
            extra: Vec::new(),
        }
    }

    fn sample_payload() -> Record {
        Record {
            type_name: "Payload".to_string(),
            fields: vec![("value".to_string(), dsp_schema::value::FieldValue::Int(42))],
            location_start: 0,
            location_end: 4,
        }
    }

    #[test]
    fn encode_then_decode_round_trips() {
        let registry = registry();
        let header = sample_header();
        let payload = sample_payload();

        let text = encode(&header, &payload, &registry, "Payload").unwrap();
        let blueprint = decode(&text, &registry, "Payload").unwrap();

        assert_eq!(blueprint.header, header);
        assert_eq!(blueprint.payload.get("value"), payload.get("value"));
    }

    #[test]
    fn percent_decoding_of_descriptions() {
        let registry = registry();
        let mut header = sample_header();
        header.short_desc = "hello world".to_string();
        let payload = sample_payload();

        let text = encode(&header, &payload, &registry, "Payload").unwrap();
        assert!(text.contains("hello%20world"));

        let blueprint = decode(&text, &registry, "Payload").unwrap();
        assert_eq!(blueprint.header.short_desc, "hello world");
    }

    #[test]
    fn flipping_a_payload_bit_is_a_signature_mismatch() {
        let registry = registry();
        let header = sample_header();
        let payload = sample_payload();
        let text = encode(&header, &payload, &registry, "Payload").unwrap();

        let open_quote = text.find('"').unwrap();
        let mut bytes = text.into_bytes();
        let flipped_idx = open_quote + 1;
        bytes[flipped_idx] ^= 0x01;
        let corrupted = String::from_utf8(bytes).unwrap();

        let result = decode(&corrupted, &registry, "Payload");
        assert!(matches!(result, Err(BlueprintError::SignatureMismatch { .. })));
    }

    #[test]
    fn too_short_is_envelope_syntax() {
        let registry = registry();
        let result = decode("BLUEPRINT:", &registry, "Payload");
        assert!(matches!(result, Err(BlueprintError::EnvelopeSyntax(_))));
    }

    #[test]
    fn missing_prefix_is_envelope_syntax() {
        let registry = registry();
        let result = decode(&"x".repeat(40), &registry, "Payload");
        assert!(matches!(result, Err(BlueprintError::EnvelopeSyntax(_))));
    }

    #[test]
    fn unrecognized_layout_code_is_envelope_syntax() {
        let registry = registry();
        let header = sample_header();
        let payload = sample_payload();
        let mut text = encode(&header, &payload, &registry, "Payload").unwrap();
        // header field 1 is "10" (OneIcon); corrupt it to an unused code.
        text = text.replacen("0,10,1,2,3,4,5,0", "0,99,1,2,3,4,5,0", 1);

        // Corrupting the header invalidates the signature before the layout
        // is even inspected, so this exercises the same envelope-syntax
        // family via the lower-level header parser directly instead.
        let fields: Vec<&str> = text[PREFIX.len()..text.find('"').unwrap()]
            .split(',')
            .collect();
        assert!(matches!(
            parse_header(&fields),
            Err(BlueprintError::EnvelopeSyntax(_))
        ));
    }
}
