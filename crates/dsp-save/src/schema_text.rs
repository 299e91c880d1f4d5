//! Embeds the two schema text resources this crate wires into registries,
//! and checks each against its own trailing `# sha256:` comment (spec.md
//! §6) so a hand-edit that forgets to refresh the digest fails loudly in
//! tests rather than silently decoding with a stale schema.
//!
//! This plays the same role as the teacher's `def_file_sha256` check in
//! `generator.py`'s cache-invalidation path, just checked here instead of
//! regenerated, since this workspace never runs a code-generation build
//! step.

pub const SAVE_SCHEMA: &str = include_str!("../schemas/save_format.txt");
pub const BLUEPRINT_SCHEMA: &str = include_str!("../schemas/blueprint_format.txt");

/// The prefix of the trailing comment line each schema resource carries.
const SHA256_MARKER: &str = "// sha256: ";

/// Recomputes the sha256 of `text` with its trailing `// sha256: <hex>`
/// comment line excluded, for comparison against the hex digest that line
/// records.
#[cfg(test)]
fn recorded_and_actual_digest(text: &str) -> (String, String) {
    use sha2::{Digest, Sha256};

    let recorded = text
        .lines()
        .find_map(|line| line.strip_prefix(SHA256_MARKER))
        .expect("schema resource is missing its trailing sha256 comment")
        .trim()
        .to_string();

    let body: String = text
        .lines()
        .filter(|line| !line.starts_with(SHA256_MARKER))
        .map(|line| format!("{line}\n"))
        .collect();
    let actual = format!("{:x}", Sha256::digest(body.as_bytes()));

    (recorded, actual)
}
