//! Bit manipulation helpers shared by the rotate, mask, and CR-field instructions.
//!
//! Bit positions follow the architecture's MSB-first numbering: bit 0 is the most significant
//! bit of a word, bit 31 the least significant. Rotation and leading-zero counting are plain
//! [`u32::rotate_left`] and [`u32::leading_zeros`]; rotating by 0 (or any multiple of 32) is
//! the identity, so no helpers are needed for them.

/// Builds the mask selecting the inclusive bit range `begin..=end` in MSB-first numbering.
///
/// When `begin > end` the range wraps around bit 31 to bit 0: the mask then selects
/// `begin..=31` and `0..=end`. This is the mask generator the rotate-and-mask instructions
/// (`rlwimi`, `rlwinm`, `rlwnm`) and the shift instructions are defined in terms of.
///
/// Both positions must be in `0..=31`.
pub fn mask_range(begin: u32, end: u32) -> u32 {
    debug_assert!(begin < 32 && end < 32);
    if begin <= end {
        (0xFFFF_FFFF >> begin) & (0xFFFF_FFFFu32 << (31 - end))
    } else {
        // Wraparound: complement of the (non-empty) gap between end and begin.
        !(((0xFFFF_FFFF >> end) >> 1) & ((0xFFFF_FFFFu32 << (31 - begin)) << 1))
    }
}

/// Expands an 8-bit CR field mask into a 32-bit bit mask.
///
/// The most significant bit of `crm` selects field 0 (the four most significant bits of the
/// CR), and so on down to the least significant bit selecting field 7. Used by `mtcrf`.
pub fn crm_mask(crm: u8) -> u32 {
    let mut mask = 0u32;
    for field in 0..8 {
        if crm & (0x80 >> field) != 0 {
            mask |= 0xF000_0000 >> (4 * field);
        }
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_range_simple() {
        assert_eq!(0xFFFF_FFFF, mask_range(0, 31));
        assert_eq!(0x8000_0000, mask_range(0, 0));
        assert_eq!(0x0000_0001, mask_range(31, 31));
        assert_eq!(0x1FFF_FFF8, mask_range(3, 28));
    }

    #[test]
    fn test_mask_range_wraparound() {
        // begin=5, end=2 selects bits 5..=31 plus bits 0..=2.
        assert_eq!(0xE7FF_FFFF, mask_range(5, 2));
        // Wraparound is the complement of the swapped non-wrapping interior.
        assert_eq!(!mask_range(3, 4), mask_range(5, 2));
        assert_eq!(0xFFFF_FFFF, mask_range(1, 0));
    }

    #[test]
    fn test_rotate_identity() {
        assert_eq!(0xDEAD_BEEF, 0xDEAD_BEEFu32.rotate_left(0));
        assert_eq!(0xDEAD_BEEF, 0xDEAD_BEEFu32.rotate_left(32));
    }

    #[test]
    fn test_crm_mask() {
        assert_eq!(0x0000_0000, crm_mask(0x00));
        assert_eq!(0xFFFF_FFFF, crm_mask(0xFF));
        assert_eq!(0xF000_0000, crm_mask(0x80));
        assert_eq!(0x0000_000F, crm_mask(0x01));
        assert_eq!(0xF0F0_F0F0, crm_mask(0xAA));
    }
}
