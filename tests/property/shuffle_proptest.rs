//! Property-based tests for question shuffling

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use trivia_offline::client::questions::shuffle::shuffle;

proptest! {
    #[test]
    fn shuffle_is_a_permutation(items in prop::collection::vec(any::<u16>(), 0..64), seed in any::<u64>()) {
        let mut shuffled = items.clone();
        shuffle(&mut shuffled, &mut StdRng::seed_from_u64(seed));

        let mut expected = items;
        expected.sort_unstable();
        shuffled.sort_unstable();
        prop_assert_eq!(shuffled, expected);
    }

    #[test]
    fn shuffle_moves_something(len in 5usize..40, seed in any::<u64>()) {
        let original: Vec<usize> = (0..len).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        // Identity across several trials in a row is vanishingly unlikely
        let all_identity = (0..4).all(|_| {
            let mut items = original.clone();
            shuffle(&mut items, &mut rng);
            items == original
        });
        prop_assert!(!all_identity);
    }
}
