//! Experience-point math.
//!
//! Maps cumulative XP to a level, progress within that level, and the
//! requirement for the next level. The per-level requirement grows
//! geometrically: `need(level) = ceil(base_xp * growth^(level - 1))`.
//! Everything here is pure; presentation layers call it on every render.

use serde::{Deserialize, Serialize};

/// Level standing derived from cumulative XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpState {
    /// Current level, starting at 1.
    pub level: u32,
    /// XP earned within the current level.
    pub in_level_xp: i64,
    /// XP required to finish the current level.
    pub needed_for_next: i64,
}

/// XP required to complete `level`. Always at least 1, so the
/// subtraction loop in [`compute_level`] strictly decreases.
fn need_for(base_xp: i64, growth: f64, level: u32) -> i64 {
    let raw = (base_xp as f64) * growth.powi(level as i32 - 1);
    (raw.ceil() as i64).max(1)
}

/// Compute level standing from cumulative XP.
///
/// Out-of-range parameters are clamped rather than rejected: `base_xp`
/// to at least 1, `growth` to at least 1.0, `total_xp` to at least 0.
pub fn compute_level(total_xp: i64, base_xp: i64, growth: f64) -> XpState {
    let base_xp = base_xp.max(1);
    let growth = growth.max(1.0);
    let mut remaining = total_xp.max(0);

    let mut level: u32 = 1;
    loop {
        let need = need_for(base_xp, growth, level);
        if remaining < need {
            return XpState {
                level,
                in_level_xp: remaining,
                needed_for_next: need,
            };
        }
        remaining -= need;
        level += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_curve() {
        // need(1)=10, need(2)=12, need(3)=15; 10+12+3 = 25.
        let state = compute_level(25, 10, 1.2);
        assert_eq!(state.level, 3);
        assert_eq!(state.in_level_xp, 3);
        assert_eq!(state.needed_for_next, 15);
    }

    #[test]
    fn test_zero_xp_is_level_one() {
        let state = compute_level(0, 10, 1.2);
        assert_eq!(state.level, 1);
        assert_eq!(state.in_level_xp, 0);
        assert_eq!(state.needed_for_next, 10);
    }

    #[test]
    fn test_exact_level_boundary_rolls_over() {
        // total == need(1) leaves zero XP inside level 2.
        let state = compute_level(10, 10, 1.2);
        assert_eq!(state.level, 2);
        assert_eq!(state.in_level_xp, 0);
        assert_eq!(state.needed_for_next, 12);
    }

    #[test]
    fn test_parameters_are_clamped() {
        // Negative XP counts as zero.
        assert_eq!(compute_level(-50, 10, 1.2).level, 1);

        // base_xp below 1 clamps to 1; growth below 1.0 clamps to flat.
        let state = compute_level(5, 0, 0.5);
        assert_eq!(state.level, 6);
        assert_eq!(state.in_level_xp, 0);
        assert_eq!(state.needed_for_next, 1);
    }

    #[test]
    fn test_flat_growth() {
        let state = compute_level(35, 10, 1.0);
        assert_eq!(state.level, 4);
        assert_eq!(state.in_level_xp, 5);
        assert_eq!(state.needed_for_next, 10);
    }

    proptest! {
        #[test]
        fn prop_levels_partition_total_xp(
            total_xp in 0i64..2_000_000,
            base_xp in 1i64..500,
            growth in 1.0f64..3.0,
        ) {
            let state = compute_level(total_xp, base_xp, growth);

            prop_assert!(state.level >= 1);
            prop_assert!(state.in_level_xp >= 0);
            prop_assert!(state.in_level_xp < state.needed_for_next);

            let spent: i64 = (1..state.level)
                .map(|l| need_for(base_xp, growth, l))
                .sum();
            prop_assert_eq!(spent + state.in_level_xp, total_xp);
        }
    }
}
