// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Raw register byte conversions.

struct FitsU64<const N: usize>;

impl<const N: usize> FitsU64<N> {
    const CHECK: () = assert!(N <= 8, "big-endian value wider than 64 bits");
}

/// Assemble bytes most-significant first.
///
/// An empty block gives 0. Blocks are at most 8 bytes wide so the
/// result is always exact; wider blocks are rejected at compile time:
///
/// ```compile_fail
/// sunrise_i2c::convert::be_integer(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0]);
/// ```
pub fn be_integer<const N: usize>(bytes: &[u8; N]) -> u64 {
    #[allow(clippy::let_unit_value)]
    let () = FitsU64::<N>::CHECK;
    bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) + u64::from(byte))
}

/// Map each byte to the char with the same code point, then trim
/// surrounding whitespace, the 0x1c..=0x1f separators included.
/// Other non printable bytes pass through untouched.
pub fn ascii_text(bytes: &[u8]) -> String {
    let text: String = bytes.iter().map(|&byte| char::from(byte)).collect();
    text.trim_matches(|c: char| c.is_whitespace() || ('\x1c'..='\x1f').contains(&c))
        .to_string()
}
