//! Property-based tests for ledger conservation

use proptest::prelude::*;
use trivia_offline::client::local_store::LocalStore;
use trivia_offline::client::offline::OfflineLedger;
use trivia_offline::shared::Difficulty;

fn tier() -> impl Strategy<Value = Difficulty> {
    prop::sample::select(Difficulty::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn ledger_conserves_answers(answers in prop::collection::vec((any::<bool>(), tier()), 0..30)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let snapshot = runtime.block_on(async {
            let ledger = OfflineLedger::new(LocalStore::in_memory().await.unwrap());
            for (is_correct, tier) in &answers {
                let xp = if *is_correct { tier.xp_reward() } else { 0 };
                ledger.record(*is_correct, xp).await.unwrap();
            }
            ledger.read().await.unwrap()
        });

        let correct = answers.iter().filter(|(is_correct, _)| *is_correct).count();
        let xp: u64 = answers
            .iter()
            .filter(|(is_correct, _)| *is_correct)
            .map(|(_, tier)| u64::from(tier.xp_reward()))
            .sum();

        prop_assert_eq!(snapshot.questions_answered as usize, answers.len());
        prop_assert_eq!(snapshot.correct_answers as usize, correct);
        prop_assert_eq!(snapshot.xp, xp);
        prop_assert_eq!(snapshot.pending_sync, !answers.is_empty());
    }
}
