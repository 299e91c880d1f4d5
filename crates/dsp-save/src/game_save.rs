//! The `.dsv` save file root record (spec.md §6).

use std::sync::LazyLock;

use dsp_schema::errors::{CodecError, SchemaError};
use dsp_schema::parser::parse_schema;
use dsp_schema::registry::TypeRegistry;
use dsp_schema::value::Record;

use crate::schema_text::SAVE_SCHEMA;

const ROOT: &str = "GameSave";

static REGISTRY: LazyLock<TypeRegistry> = LazyLock::new(|| build_registry().expect("embedded save schema is valid"));

fn build_registry() -> Result<TypeRegistry, SchemaError> {
    TypeRegistry::build(parse_schema(SAVE_SCHEMA)?)
}

/// Entry point for decoding and re-encoding a full save file against the
/// `GameSave` root record.
pub struct GameSave;

impl GameSave {
    /// Decodes `bytes` as a `GameSave` record (spec.md §6: "a single root
    /// record... decoded from raw bytes, little-endian throughout").
    pub fn decode(bytes: &[u8]) -> Result<Record, CodecError> {
        REGISTRY.decode(ROOT, bytes, &[])
    }

    /// Re-serializes a decoded (or hand-built) `GameSave` record. Per the
    /// round-trip law (spec.md §8), `encode(decode(b)) == b` for any valid
    /// `b`.
    pub fn encode(value: &Record) -> Result<Vec<u8>, CodecError> {
        REGISTRY.encode(ROOT, value)
    }

    /// Total encoded size in bytes, which must agree with
    /// `value.byte_len()` for anything obtained from [`GameSave::decode`]
    /// (round-trip size law, spec.md §8).
    pub fn size(value: &Record) -> Result<usize, CodecError> {
        REGISTRY.size(ROOT, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsp_schema::value::FieldValue;

    fn sample_bytes() -> Vec<u8> {
        let mut bytes = vec![20, 0, 0, 0]; // file_length
        bytes.push(3);
        bytes.extend_from_slice(b"bob"); // account_data.user_name
        bytes.extend_from_slice(&[0u8; 8]); // main_player.sand_count
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]); // galaxy.planets sentinel
        bytes
    }

    #[test]
    fn decodes_nested_fields() {
        let save = GameSave::decode(&sample_bytes()).unwrap();
        let account = save.get("account_data").unwrap().as_record().unwrap();
        assert_eq!(
            account.get("user_name"),
            Some(&FieldValue::Str("bob".to_string()))
        );
        let game_data = save.get("game_data").unwrap().as_record().unwrap();
        let player = game_data.get("main_player").unwrap().as_record().unwrap();
        assert_eq!(player.get("sand_count"), Some(&FieldValue::Int(0)));
    }

    #[test]
    fn round_trips_bytes() {
        let bytes = sample_bytes();
        let save = GameSave::decode(&bytes).unwrap();
        assert_eq!(GameSave::encode(&save).unwrap(), bytes);
    }

    #[test]
    fn size_matches_location_span() {
        let bytes = sample_bytes();
        let save = GameSave::decode(&bytes).unwrap();
        assert_eq!(GameSave::size(&save).unwrap() as i64, save.byte_len());
    }

    #[test]
    fn walks_a_multi_node_planet_list() {
        let mut bytes = vec![28, 0, 0, 0];
        bytes.push(3);
        bytes.extend_from_slice(b"bob");
        bytes.extend_from_slice(&[0u8; 8]);
        // First planet node: id = 0, one vein group.
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes()); // vein_group_count
        bytes.push(5); // vein_type
        bytes.extend_from_slice(&1_000i64.to_le_bytes()); // amount
        // Sentinel node terminates the list.
        bytes.extend_from_slice(&(-1i32).to_le_bytes());

        let save = GameSave::decode(&bytes).unwrap();
        let planets = save
            .get("game_data")
            .unwrap()
            .as_record()
            .unwrap()
            .get("galaxy")
            .unwrap()
            .as_record()
            .unwrap()
            .get("planets")
            .unwrap()
            .as_record()
            .unwrap();
        assert_eq!(planets.get("id"), Some(&FieldValue::Int(0)));
        let planet = planets.get("value").unwrap().as_record().unwrap();
        let veins = planet.get("vein_groups").unwrap().as_array().unwrap();
        assert_eq!(veins.len(), 1);
        let vein = veins[0].as_record().unwrap();
        assert_eq!(vein.get("planet_id"), Some(&FieldValue::Int(0)));
        assert_eq!(vein.get("index"), Some(&FieldValue::Int(0)));
        assert_eq!(vein.get("amount"), Some(&FieldValue::Int(1_000)));

        assert_eq!(GameSave::encode(&save).unwrap(), bytes);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn bytes_for(user_name: &str, sand_count: i64) -> Vec<u8> {
        let mut bytes = vec![0, 0, 0, 0]; // file_length, unchecked by decode
        bytes.push(user_name.len() as u8);
        bytes.extend_from_slice(user_name.as_bytes());
        bytes.extend_from_slice(&sand_count.to_le_bytes());
        bytes.extend_from_slice(&(-1i32).to_le_bytes()); // empty planet list
        bytes
    }

    proptest! {
        #[test]
        fn round_trips_arbitrary_name_and_sand_count(
            user_name in "[a-zA-Z0-9]{0,30}",
            sand_count in any::<i64>(),
        ) {
            let bytes = bytes_for(&user_name, sand_count);
            let save = GameSave::decode(&bytes).unwrap();
            prop_assert_eq!(GameSave::encode(&save).unwrap(), bytes.clone());
            prop_assert_eq!(GameSave::size(&save).unwrap() as i64, save.byte_len());
        }
    }
}
