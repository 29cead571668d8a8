//! Live position fixes reported by a vehicle.

use chrono::{DateTime, Utc};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::is_valid_coordinate;

/// A single position fix from the external location source.
///
/// Samples are transient: the engine evaluates them and keeps only the
/// resulting membership or corridor state.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use geo::Coord;
/// use fleetwatch_core::LocationSample;
///
/// let at = Utc.timestamp_opt(1_700_000_000, 0).single().expect("valid timestamp");
/// let sample = LocationSample::new(Coord { x: -0.1, y: 51.5 }, 12.0, at);
/// assert!(sample.is_usable(50.0));
/// assert!(!sample.is_usable(10.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocationSample {
    /// Reported position (`x` = longitude, `y` = latitude).
    pub location: Coord<f64>,
    /// Radius of the 68% confidence circle in metres. Negative values mark
    /// an invalid fix.
    pub horizontal_accuracy_meters: f64,
    /// Time at which the fix was taken.
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    /// Construct a sample.
    #[must_use]
    pub const fn new(
        location: Coord<f64>,
        horizontal_accuracy_meters: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            location,
            horizontal_accuracy_meters,
            timestamp,
        }
    }

    /// Report whether the fix is precise enough to evaluate.
    ///
    /// A fix is usable when its position is a valid WGS84 coordinate and its
    /// accuracy is finite, non-negative and no worse than `ceiling_meters`.
    #[must_use]
    pub fn is_usable(&self, ceiling_meters: f64) -> bool {
        let accuracy = self.horizontal_accuracy_meters;
        is_valid_coordinate(self.location)
            && accuracy.is_finite()
            && accuracy >= 0.0
            && accuracy <= ceiling_meters
    }
}
