//! # dsp-save
//!
//! Wires [`dsp_schema`]'s generic engine and [`dsp_blueprint`]'s envelope to
//! the two concrete root record shapes this game's files actually use:
//! `GameSave` (a `.dsv` save file) and `BlueprintData` (a blueprint's
//! payload, nested inside the envelope `dsp_blueprint::envelope` parses).
//!
//! This is the "consumer" crate in the workspace's split, the same role the
//! teacher's `bitcraft-wasm` plays for `bitspec` — except here the one
//! concrete consumer is a pair of schema-backed root types, not a JS host.
//!
//! ```
//! use dsp_save::GameSave;
//!
//! let bytes = [
//!     20, 0, 0, 0, // file_length
//!     3, b'b', b'o', b'b', // account_data.user_name ("bob")
//!     0, 0, 0, 0, 0, 0, 0, 0, // main_player.sand_count
//!     255, 255, 255, 255, // galaxy.planets: sentinel LinkedList node (id == -1)
//! ];
//! let save = GameSave::decode(&bytes).unwrap();
//! assert_eq!(GameSave::encode(&save).unwrap(), bytes);
//! ```

pub mod blueprint;
pub mod game_save;
mod schema_text;

pub use blueprint::BlueprintPayload;
pub use dsp_blueprint::envelope::{Blueprint, BlueprintHeader};
pub use dsp_schema::errors::CodecError;
pub use dsp_schema::value::{FieldValue, Record};
pub use game_save::GameSave;
