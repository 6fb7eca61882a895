use consensusbot::learning::{Learner, LearnerConfig};
use consensusbot::models::{Signal, TradeOutcome, VoteSnapshot, WeightTable};
use proptest::prelude::*;

const NAMES: [&str; 4] = ["adx_trend", "rsi_extremes", "squeeze", "hammer_wick"];

fn outcome_strategy() -> impl Strategy<Value = TradeOutcome> {
    (
        prop_oneof![Just(Signal::Call), Just(Signal::Put)],
        any::<bool>(),
        prop::collection::vec(-5i32..=5, NAMES.len()),
    )
        .prop_map(|(signal, won, votes)| TradeOutcome {
            decision_id: None,
            signal,
            won,
            votes: NAMES
                .iter()
                .zip(votes)
                .map(|(name, vote)| (name.to_string(), vote))
                .collect::<VoteSnapshot>(),
        })
}

fn table_strategy() -> impl Strategy<Value = WeightTable> {
    prop::collection::vec(0.3f64..=2.5, NAMES.len()).prop_map(|weights| {
        let mut table = WeightTable::new();
        for (name, weight) in NAMES.iter().zip(weights) {
            table.set(*name, weight);
        }
        table
    })
}

proptest! {
    #[test]
    fn weights_stay_bounded(
        start in table_strategy(),
        outcomes in prop::collection::vec(outcome_strategy(), 1..200),
    ) {
        let learner = Learner::default();
        let mut table = start;

        for outcome in &outcomes {
            table = learner.update(&table, outcome);
            for (_, weight) in table.iter() {
                prop_assert!((0.3..=2.5).contains(&weight), "weight {} escaped", weight);
            }
        }
    }

    #[test]
    fn reversion_alone_never_overshoots(start in table_strategy(), outcome in outcome_strategy()) {
        let learner = Learner::new(LearnerConfig {
            learning_rate: 0.0,
            ..LearnerConfig::default()
        });

        let next = learner.update(&start, &outcome);

        for (name, before) in start.iter() {
            let after = next.get(name);
            prop_assert!((after - 1.0).abs() <= (before - 1.0).abs());
            prop_assert!((after - 1.0) * (before - 1.0) >= 0.0, "{} crossed neutral", name);
        }
    }
}
