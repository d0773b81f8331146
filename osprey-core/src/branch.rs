//! Resolution of the BO/BI condition shared by all conditional branch forms.

use crate::condition::ConditionRegister;

mod bo {
    //! Meaning of the BO field's bits, from most to least significant.

    /// Ignore the CR bit; branch regardless of the condition.
    pub const IGNORE_CONDITION: u8 = 0b10000;
    /// Sense of the CR bit test: branch if the bit equals this flag.
    pub const CONDITION_SENSE: u8 = 0b01000;
    /// Leave the CTR alone; when clear, the CTR is decremented before the decision.
    pub const NO_DECREMENT: u8 = 0b00100;
    /// Sense of the CTR test: branch if `CTR == 0` equals this flag.
    pub const CTR_SENSE: u8 = 0b00010;
}

/// Outcome of resolving a conditional branch's BO/BI operands.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BranchDecision {
    /// Whether the branch is taken.
    pub taken: bool,
    /// The CTR value after resolution. Differs from the input only when BO requested a
    /// decrement, which happens whether or not the branch ends up taken.
    pub ctr: u32,
}

/// Resolves the branch condition encoded by `bo` and `bi` against the given CR and CTR.
///
/// `bi` selects a CR bit in MSB-first numbering (`0..=31`). The CTR decrement, when `bo`
/// requests one, happens first; the zero test then sees the decremented value. The CTR part
/// and the CR part of the condition must both hold (each may be individually disabled by its
/// BO bit) for the branch to be taken.
///
/// The caller keeps responsibility for everything that is not the condition: target
/// computation, the link register, and writing back the returned CTR.
pub fn resolve(bo: u8, bi: u8, cr: &ConditionRegister, ctr: u32) -> BranchDecision {
    let ctr = if bo & bo::NO_DECREMENT == 0 {
        ctr.wrapping_sub(1)
    } else {
        ctr
    };

    let ctr_ok = bo & bo::NO_DECREMENT != 0 || (ctr == 0) == (bo & bo::CTR_SENSE != 0);
    let cond_ok =
        bo & bo::IGNORE_CONDITION != 0 || cr.bit(bi) == (bo & bo::CONDITION_SENSE != 0);

    BranchDecision {
        taken: ctr_ok && cond_ok,
        ctr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_taken_leaves_ctr() {
        let cr = ConditionRegister::new();
        let decision = resolve(0b10100, 0, &cr, 7);
        assert!(decision.taken);
        assert_eq!(7, decision.ctr);
    }

    #[test]
    fn test_decrement_happens_even_when_not_taken() {
        let cr = ConditionRegister::new();
        // Branch if CTR == 0 after decrementing; 5 -> 4, not zero, not taken.
        let decision = resolve(0b10010, 0, &cr, 5);
        assert!(!decision.taken);
        assert_eq!(4, decision.ctr);
    }

    #[test]
    fn test_ctr_zero_test_sense() {
        let cr = ConditionRegister::new();
        let decision = resolve(0b10010, 0, &cr, 1);
        assert!(decision.taken);
        assert_eq!(0, decision.ctr);

        // Inverted sense: branch while CTR != 0 after decrement.
        let decision = resolve(0b10000, 0, &cr, 1);
        assert!(!decision.taken);
        let decision = resolve(0b10000, 0, &cr, 2);
        assert!(decision.taken);
    }

    #[test]
    fn test_ctr_decrement_wraps() {
        let cr = ConditionRegister::new();
        let decision = resolve(0b10000, 0, &cr, 0);
        assert!(decision.taken);
        assert_eq!(0xFFFF_FFFF, decision.ctr);
    }

    #[test]
    fn test_condition_bit_and_sense() {
        let mut cr = ConditionRegister::new();
        cr.set_bit(2, true); // CR0's EQ bit

        // Branch if bit 2 set.
        assert!(resolve(0b01100, 2, &cr, 0).taken);
        // Branch if bit 2 clear.
        assert!(!resolve(0b00100, 2, &cr, 0).taken);
        // A different bit.
        assert!(!resolve(0b01100, 3, &cr, 0).taken);
    }

    #[test]
    fn test_both_parts_must_hold() {
        let mut cr = ConditionRegister::new();
        cr.set_bit(0, true);
        // CR part holds, but CTR part wants zero after decrementing 3 -> 2.
        let decision = resolve(0b01010, 0, &cr, 3);
        assert!(!decision.taken);
        assert_eq!(2, decision.ctr);
        // Both hold.
        let decision = resolve(0b01010, 0, &cr, 1);
        assert!(decision.taken);
    }
}
