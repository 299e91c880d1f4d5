//! A from-scratch MD5 implementation with eight altered round constants and
//! an altered initial state, used as the signature on blueprint text files.
//!
//! This is *not* interoperable with standard MD5 — do not substitute
//! [`md5`](https://docs.rs/md5) or any other conforming implementation; the
//! deviations below are load-bearing for compatibility with saved blueprints.

use std::fmt;

/// Per-round shift amounts, standard MD5.
const SHIFTS: [u32; 64] = [
    7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, 7, 12, 17, 22, 5, 9, 14, 20, 5, 9, 14, 20, 5, 9,
    14, 20, 5, 9, 14, 20, 4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, 4, 11, 16, 23, 6, 10, 15,
    21, 6, 10, 15, 21, 6, 10, 15, 21, 6, 10, 15, 21,
];

/// `K[i] = floor(2^32 * |sin(i + 1)|)`, as in standard MD5, with eight
/// entries overwritten below. Each overwritten entry differs from the
/// standard value by a single hex digit.
const STANDARD_K: [u32; 64] = [
    0xd76aa478, 0xe8c7b756, 0x242070db, 0xc1bdceee, 0xf57c0faf, 0x4787c62a, 0xa8304613, 0xfd469501,
    0x698098d8, 0x8b44f7af, 0xffff5bb1, 0x895cd7be, 0x6b901122, 0xfd987193, 0xa679438e, 0x49b40821,
    0xf61e2562, 0xc040b340, 0x265e5a51, 0xe9b6c7aa, 0xd62f105d, 0x02441453, 0xd8a1e681, 0xe7d3fbc8,
    0x21e1cde6, 0xc33707d6, 0xf4d50d87, 0x455a14ed, 0xa9e3e905, 0xfcefa3f8, 0x676f02d9, 0x8d2a4c8a,
    0xfffa3942, 0x8771f681, 0x6d9d6122, 0xfde5380c, 0xa4beea44, 0x4bdecfa9, 0xf6bb4b60, 0xbebfbc70,
    0x289b7ec6, 0xeaa127fa, 0xd4ef3085, 0x04881d05, 0xd9d4d039, 0xe6db99e5, 0x1fa27cf8, 0xc4ac5665,
    0xf4292244, 0x432aff97, 0xab9423a7, 0xfc93a039, 0x655b59c3, 0x8f0ccc92, 0xffeff47d, 0x85845dd1,
    0x6fa87e4f, 0xfe2ce6e0, 0xa3014314, 0x4e0811a1, 0xf7537e82, 0xbd3af235, 0x2ad7d2bb, 0xeb86d391,
];

/// Builds the constant table `K` used by [`digest`], applying the eight
/// deliberate single-digit flips from `STANDARD_K`.
const fn build_k() -> [u32; 64] {
    let mut k = STANDARD_K;
    k[1] = 0xe8d7b756; // standard 0xe8c7b756, 3rd hex digit c -> d
    k[6] = 0xa8304623; // standard 0xa8304613, 7th hex digit 1 -> 2
    k[12] = 0x6b9f1122; // standard 0x6b901122, 4th hex digit 0 -> f
    k[15] = 0x39b40821; // standard 0x49b40821, 1st hex digit 4 -> 3
    k[19] = 0xc9b6c7aa; // standard 0xe9b6c7aa, 1st hex digit e -> c
    k[21] = 0x02443453; // standard 0x02441453, 5th hex digit 1 -> 3
    k[24] = 0x21f1cde6; // standard 0x21e1cde6, 3rd hex digit e -> f
    k[27] = 0x475a14ed; // standard 0x455a14ed, 2nd hex digit 5 -> 7
    k
}

const K: [u32; 64] = build_k();

/// Altered initial state. `B` and `D` each differ from standard MD5 by one
/// transposed hex digit (`cdab` -> `dcab`, `5476` -> `5746`).
const INIT_STATE: [u32; 4] = [0x67452301, 0xefdcab89, 0x98badcfe, 0x10325746];

fn f1(b: u32, c: u32, d: u32) -> u32 {
    (b & c) | (!b & d)
}

fn f2(b: u32, c: u32, d: u32) -> u32 {
    (b & d) | (c & !d)
}

fn f3(b: u32, c: u32, d: u32) -> u32 {
    b ^ c ^ d
}

fn f4(b: u32, c: u32, d: u32) -> u32 {
    c ^ (b | !d)
}

/// A 128-bit digest, printable as 32 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digest(pub [u8; 16]);

impl Digest {
    /// Lowercase hex representation, matching the 32 trailing characters of
    /// a blueprint file's signature.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Computes the altered digest of `data`.
///
/// Padding is standard MD5 padding (append `0x80`, zero-pad to 56 mod 64,
/// append the original bit length as a little-endian `u64`); only the round
/// constants and initial state differ from the reference algorithm.
pub fn digest(data: &[u8]) -> Digest {
    let mut state = INIT_STATE;

    let bit_len = (data.len() as u64).wrapping_mul(8);
    let mut padded = data.to_vec();
    padded.push(0x80);
    while padded.len() % 64 != 56 {
        padded.push(0);
    }
    padded.extend_from_slice(&bit_len.to_le_bytes());

    for chunk in padded.chunks_exact(64) {
        process_block(&mut state, chunk);
    }

    let mut out = [0u8; 16];
    for (word_idx, word) in state.iter().enumerate() {
        out[word_idx * 4..word_idx * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    Digest(out)
}

fn process_block(state: &mut [u32; 4], block: &[u8]) {
    let mut m = [0u32; 16];
    for (i, word) in m.iter_mut().enumerate() {
        *word = u32::from_le_bytes(block[i * 4..i * 4 + 4].try_into().unwrap());
    }

    let [mut a, mut b, mut c, mut d] = *state;

    for i in 0..64 {
        let (f, g) = match i {
            0..=15 => (f1(b, c, d), i),
            16..=31 => (f2(b, c, d), (5 * i + 1) % 16),
            32..=47 => (f3(b, c, d), (3 * i + 5) % 16),
            _ => (f4(b, c, d), (7 * i) % 16),
        };

        let to_rotate = a
            .wrapping_add(f)
            .wrapping_add(K[i])
            .wrapping_add(m[g]);
        let new_b = b.wrapping_add(to_rotate.rotate_left(SHIFTS[i]));

        a = d;
        d = c;
        c = b;
        b = new_b;
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Vectors reconfirmed against the reference (altered) MD5 implementation,
    // not against real MD5 — see the crate docs for why the two must differ.
    #[test]
    fn empty_string_vector() {
        assert_eq!(digest(b"").to_hex(), "84d1ce3bd68f49ab26eb0f96416617cf");
    }

    #[test]
    fn abc_vector() {
        assert_eq!(digest(b"abc").to_hex(), "f8d437e8a2d3c2138bc18ef62d8cfc64");
    }

    #[test]
    fn quick_brown_fox_vector() {
        assert_eq!(
            digest(b"The quick brown fox jumps over the lazy dog").to_hex(),
            "86dcc27d895972046bc51c8eaca17f64"
        );
    }

    #[test]
    fn differs_from_standard_md5_on_empty_input() {
        // Real MD5("") is d41d8cd98f00b204e9800998ecf8427e.
        assert_ne!(digest(b"").to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn differs_from_standard_md5_on_abc() {
        // Real MD5("abc") is 900150983cd24fb0d6963f7d28e17f72.
        assert_ne!(digest(b"abc").to_hex(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn is_deterministic() {
        assert_eq!(digest(b"hello world"), digest(b"hello world"));
    }

    #[test]
    fn handles_multi_block_input() {
        let data = vec![0x5a; 200];
        let got = digest(&data);
        assert_eq!(got.to_hex().len(), 32);
    }
}
