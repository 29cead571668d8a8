#![expect(
    clippy::expect_used,
    reason = "strategies only generate valid candidates"
)]

//! Property tests for route ranking.

use fleetwatch_core::{CandidateRoute, RouteScorer, RouteType};
use fleetwatch_scorer::CostModelScorer;
use proptest::prelude::*;

fn candidate() -> impl Strategy<Value = CandidateRoute> {
    (0.0..200_000.0_f64, 0.0..20_000.0_f64).prop_map(|(metres, seconds)| {
        CandidateRoute::new(metres, seconds, Vec::new()).expect("generated values are valid")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn ranking_is_a_sorted_permutation(batch in prop::collection::vec(candidate(), 0..12)) {
        let ranked = CostModelScorer::default().score(&batch);
        prop_assert_eq!(ranked.len(), batch.len());
        let is_sorted = ranked.windows(2).all(|pair| match pair {
            [a, b] => a.score <= b.score,
            _ => true,
        });
        prop_assert!(is_sorted);
        let recommended = ranked.iter().filter(|scored| scored.is_recommended).count();
        prop_assert_eq!(recommended, usize::from(!batch.is_empty()));
        let fastest = ranked
            .iter()
            .filter(|scored| scored.route_type == RouteType::Fastest)
            .count();
        prop_assert_eq!(fastest, usize::from(!batch.is_empty()));
    }

    #[test]
    fn scoring_is_deterministic(batch in prop::collection::vec(candidate(), 0..8)) {
        let scorer = CostModelScorer::default();
        prop_assert_eq!(scorer.score(&batch), scorer.score(&batch));
    }
}
