//! Frame checksum.
//!
//! The checksum byte covers every byte from the start of the tag through
//! the separator preceding the checksum, inclusive. Only printable bytes
//! and the separator itself count. The sum is truncated to 6 bits and
//! shifted into the printable range, so the result always lies in
//! `0x20..=0x5F`.

use crate::codec::{Frame, SEP};

/// Bytes at or below this value are ignored, except [`SEP`].
pub const PRINTABLE_FLOOR: u8 = 0x19;

const CHECKSUM_MASK: u32 = 0x3F;
const CHECKSUM_OFFSET: u8 = 0x20;

/// Compute the checksum byte for a checksum scope.
pub fn compute_checksum(scope: &[u8]) -> u8 {
    let sum = scope
        .iter()
        .filter(|&&b| b > PRINTABLE_FLOOR || b == SEP)
        .fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)));
    (sum & CHECKSUM_MASK) as u8 + CHECKSUM_OFFSET
}

/// Whether `frame` carries a correct checksum.
///
/// The scope must end with a separator; a frame cut short anywhere before
/// its checksum fails here rather than being mis-parsed later.
pub fn check(frame: &Frame) -> bool {
    let Some(found) = frame.checksum() else {
        return false;
    };
    let scope = frame.checksum_scope();
    scope.last() == Some(&SEP) && compute_checksum(scope) == found
}
