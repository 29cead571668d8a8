//! Error types raised while configuring the route cost model.
#![forbid(unsafe_code)]

use thiserror::Error;

/// Errors raised by [`ScoringConfig::validate`](crate::ScoringConfig::validate).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringConfigError {
    /// The base fuel efficiency was not a positive finite number.
    #[error("base fuel efficiency must be positive and finite, got {value} km/L")]
    InvalidEfficiency {
        /// The rejected efficiency in kilometres per litre.
        value: f64,
    },
    /// A weight was negative or not finite, or all weights were zero.
    #[error(
        "scoring weights must be finite, non-negative and not all zero \
         (time {time}, fuel {fuel}, traffic {traffic})"
    )]
    InvalidWeights {
        /// Weight applied to duration.
        time: f64,
        /// Weight applied to fuel.
        fuel: f64,
        /// Weight applied to traffic.
        traffic: f64,
    },
}
