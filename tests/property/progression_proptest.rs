//! Property-based tests for the level curve

use proptest::prelude::*;
use trivia_offline::shared::{level_for_xp, xp_for_level, LevelProgress, MAX_LEVEL};

proptest! {
    #[test]
    fn level_is_non_decreasing_in_xp(a in 0u64..20_000_000, b in 0u64..20_000_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(level_for_xp(low) <= level_for_xp(high));
    }

    #[test]
    fn thresholds_strictly_increase(level in 1u32..MAX_LEVEL) {
        prop_assert!(xp_for_level(level + 1) > xp_for_level(level));
    }

    #[test]
    fn level_threshold_round_trips(level in 1u32..=MAX_LEVEL) {
        prop_assert_eq!(level_for_xp(xp_for_level(level)), level);
    }

    #[test]
    fn progress_stays_inside_level(xp in 0u64..20_000_000) {
        let progress = LevelProgress::from_xp(xp);
        prop_assert!((0.0..=100.0).contains(&progress.percent));
        prop_assert!(progress.level >= 1 && progress.level <= MAX_LEVEL);
        prop_assert!(xp >= xp_for_level(progress.level));
    }
}
