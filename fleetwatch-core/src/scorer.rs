//! Rank candidate routes.
//!
//! The `RouteScorer` trait turns a batch of
//! [`CandidateRoute`](crate::CandidateRoute) values into labelled
//! [`ScoredRoute`](crate::ScoredRoute) results.

use crate::{CandidateRoute, ScoredRoute};

/// Evaluate a batch of candidate routes.
///
/// Implementations must be thread-safe (`Send` + `Sync`) so a single scorer
/// can serve concurrent requests. Scoring is infallible and deterministic:
///
/// - The output is ordered by ascending score (best first).
/// - Exactly one route is recommended when the input is non-empty.
/// - An empty batch yields an empty result.
///
/// # Examples
///
/// ```rust
/// use fleetwatch_core::{CandidateRoute, RouteScorer, RouteType, ScoredRoute};
///
/// struct DistanceScorer;
///
/// impl RouteScorer for DistanceScorer {
///     fn score(&self, candidates: &[CandidateRoute]) -> Vec<ScoredRoute> {
///         candidates
///             .iter()
///             .enumerate()
///             .map(|(index, candidate)| ScoredRoute {
///                 candidate: candidate.clone(),
///                 route_type: RouteType::Balanced,
///                 score: candidate.distance_meters(),
///                 fuel_estimate_liters: 0.0,
///                 traffic_factor: 1.0,
///                 is_recommended: index == 0,
///             })
///             .collect()
///     }
/// }
///
/// assert!(DistanceScorer.score(&[]).is_empty());
/// ```
pub trait RouteScorer: Send + Sync {
    /// Score, label and rank `candidates`.
    fn score(&self, candidates: &[CandidateRoute]) -> Vec<ScoredRoute>;

    /// Return the recommended route, if any.
    fn recommend(&self, candidates: &[CandidateRoute]) -> Option<ScoredRoute> {
        self.score(candidates)
            .into_iter()
            .find(|scored| scored.is_recommended)
    }
}
