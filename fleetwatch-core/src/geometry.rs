//! Geometry kernel for zone membership and corridor distance.
//!
//! All functions are pure. Coordinates follow the `geo` convention used
//! throughout the workspace: `x` is longitude and `y` is latitude, both in
//! WGS84 decimal degrees.
//!
//! Great-circle distances use the haversine formula on a spherical Earth.
//! Segment projection works in a locally flat equirectangular frame centred
//! on the query point, which is accurate for the corridor widths (tens to
//! hundreds of metres) the monitors deal with.

use geo::Coord;

/// Mean Earth radius in metres (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Metres spanned by one degree of latitude on the spherical model.
#[expect(
    clippy::float_arithmetic,
    reason = "degree-to-metre conversion is a floating-point constant"
)]
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// Great-circle distance in metres between two coordinates.
///
/// The result is symmetric, non-negative and exactly `0.0` for identical
/// inputs.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use fleetwatch_core::geometry::{METERS_PER_DEGREE, distance_meters};
///
/// let origin = Coord { x: 0.0, y: 0.0 };
/// let north = Coord { x: 0.0, y: 1.0 };
/// assert!((distance_meters(origin, north) - METERS_PER_DEGREE).abs() < 1e-6);
/// assert_eq!(distance_meters(origin, origin), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "haversine requires floating-point trigonometry"
)]
pub fn distance_meters(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat_a = a.y.to_radians();
    let lat_b = b.y.to_radians();
    let half_d_lat = (lat_b - lat_a) / 2.0;
    let half_d_lon = wrap_degrees(b.x - a.x).to_radians() / 2.0;
    let h = half_d_lat.sin().powi(2) + lat_a.cos() * lat_b.cos() * half_d_lon.sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Nearest point on a segment together with its distance from the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Closest coordinate on the segment.
    pub closest: Coord<f64>,
    /// Position of `closest` along the segment, clamped to `0.0..=1.0`.
    pub fraction: f64,
    /// Great-circle distance from the query point to `closest`.
    pub distance_meters: f64,
}

/// Project `point` onto the segment `start..end`.
///
/// The projection parameter is computed in an equirectangular frame centred
/// on `point` and clamped to `0.0..=1.0`, so the result refers to the
/// segment rather than the infinite line through it. A degenerate segment
/// (`start == end`) projects onto `start`.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "planar projection uses floating-point vector maths"
)]
pub fn project_onto_segment(
    point: Coord<f64>,
    start: Coord<f64>,
    end: Coord<f64>,
) -> SegmentProjection {
    let lon_scale = METERS_PER_DEGREE * point.y.to_radians().cos();
    let to_local = |coord: Coord<f64>| Coord {
        x: wrap_degrees(coord.x - point.x) * lon_scale,
        y: (coord.y - point.y) * METERS_PER_DEGREE,
    };
    let a = to_local(start);
    let b = to_local(end);
    let ab = Coord {
        x: b.x - a.x,
        y: b.y - a.y,
    };
    let length_sq = ab.x * ab.x + ab.y * ab.y;
    let fraction = if length_sq > 0.0 {
        // The query point is the local origin, so `p - a` is `-a`.
        ((-a.x * ab.x - a.y * ab.y) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = Coord {
        x: wrap_degrees(start.x + wrap_degrees(end.x - start.x) * fraction),
        y: start.y + (end.y - start.y) * fraction,
    };
    SegmentProjection {
        closest,
        fraction,
        distance_meters: distance_meters(point, closest),
    }
}

/// Distance in metres from `point` to the nearest point of a segment.
///
/// Returns `0.0` when `point` lies on the segment.
#[must_use]
pub fn distance_to_segment(point: Coord<f64>, start: Coord<f64>, end: Coord<f64>) -> f64 {
    project_onto_segment(point, start, end).distance_meters
}

/// Minimum distance in metres from `point` to a polyline.
///
/// Returns `None` when fewer than two waypoints are supplied, since no
/// segment exists to measure against.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use fleetwatch_core::geometry::min_distance_to_polyline;
///
/// let single = [Coord { x: 0.0, y: 0.0 }];
/// assert_eq!(min_distance_to_polyline(Coord { x: 1.0, y: 1.0 }, &single), None);
/// ```
#[must_use]
pub fn min_distance_to_polyline(point: Coord<f64>, waypoints: &[Coord<f64>]) -> Option<f64> {
    waypoints
        .windows(2)
        .filter_map(|pair| match pair {
            [start, end] => Some(distance_to_segment(point, *start, *end)),
            _ => None,
        })
        .reduce(f64::min)
}

/// Report whether a coordinate is finite and within WGS84 bounds.
#[must_use]
pub fn is_valid_coordinate(coord: Coord<f64>) -> bool {
    coord.x.is_finite()
        && coord.y.is_finite()
        && (-180.0..=180.0).contains(&coord.x)
        && (-90.0..=90.0).contains(&coord.y)
}

/// Wrap a longitude (or longitude difference) into `[-180, 180]` so
/// segments crossing the antimeridian take the short way round.
#[expect(
    clippy::float_arithmetic,
    reason = "angle wrapping uses floating-point modulo"
)]
fn wrap_degrees(degrees: f64) -> f64 {
    if (-180.0..=180.0).contains(&degrees) {
        degrees
    } else {
        (degrees + 180.0).rem_euclid(360.0) - 180.0
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "geometry assertions compare floating-point distances"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TOLERANCE_METERS: f64 = 1e-6;

    fn coord(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[rstest]
    fn identical_points_are_zero_apart() {
        let point = coord(-0.1276, 51.5072);
        assert_eq!(distance_meters(point, point), 0.0);
    }

    #[rstest]
    #[case(coord(0.0, 0.0), coord(0.0, 1.0))]
    #[case(coord(-0.1276, 51.5072), coord(2.3522, 48.8566))]
    #[case(coord(179.9, 10.0), coord(-179.9, 10.0))]
    fn distance_is_symmetric(#[case] a: Coord<f64>, #[case] b: Coord<f64>) {
        let forward = distance_meters(a, b);
        let backward = distance_meters(b, a);
        assert!((forward - backward).abs() < TOLERANCE_METERS);
        assert!(forward > 0.0);
    }

    #[rstest]
    fn london_to_paris_is_about_344_km() {
        let london = coord(-0.1276, 51.5072);
        let paris = coord(2.3522, 48.8566);
        let km = distance_meters(london, paris) / 1000.0;
        assert!((km - 343.5).abs() < 1.5, "unexpected distance {km} km");
    }

    #[rstest]
    fn antimeridian_crossing_takes_short_path() {
        let west = coord(179.99, 0.0);
        let east = coord(-179.99, 0.0);
        let metres = distance_meters(west, east);
        assert!((metres - 0.02 * METERS_PER_DEGREE).abs() < 1.0);
    }

    #[rstest]
    fn point_on_segment_has_zero_distance() {
        let start = coord(0.0, 0.0);
        let end = coord(0.02, 0.0);
        assert!(distance_to_segment(coord(0.01, 0.0), start, end) < TOLERANCE_METERS);
        assert_eq!(distance_to_segment(start, start, end), 0.0);
        assert!(distance_to_segment(end, start, end) < TOLERANCE_METERS);
    }

    #[rstest]
    fn perpendicular_offset_is_measured_to_the_segment() {
        let start = coord(0.0, 0.0);
        let end = coord(0.02, 0.0);
        let offset = 80.0 / METERS_PER_DEGREE;
        let metres = distance_to_segment(coord(0.01, offset), start, end);
        assert!((metres - 80.0).abs() < 0.01, "got {metres}");
    }

    #[rstest]
    fn projection_is_clamped_to_segment_end() {
        let start = coord(0.0, 0.0);
        let end = coord(0.01, 0.0);
        let beyond = coord(0.02, 0.0);
        let projection = project_onto_segment(beyond, start, end);
        assert_eq!(projection.fraction, 1.0);
        assert_eq!(projection.closest, end);
        assert!((projection.distance_meters - distance_meters(beyond, end)).abs() < 1e-9);
    }

    #[rstest]
    fn degenerate_segment_measures_to_its_point() {
        let anchor = coord(0.0, 0.0);
        let point = coord(0.0, 0.001);
        let metres = distance_to_segment(point, anchor, anchor);
        assert!((metres - distance_meters(point, anchor)).abs() < 1e-9);
    }

    #[rstest]
    fn polyline_needs_two_waypoints() {
        assert_eq!(min_distance_to_polyline(coord(0.0, 0.0), &[]), None);
        assert_eq!(
            min_distance_to_polyline(coord(0.0, 0.0), &[coord(1.0, 1.0)]),
            None
        );
    }

    #[rstest]
    fn polyline_distance_picks_nearest_segment() {
        let route = [coord(0.0, 0.0), coord(0.01, 0.0), coord(0.01, 0.01)];
        let near_second_leg = coord(0.0105, 0.005);
        let metres = min_distance_to_polyline(near_second_leg, &route).unwrap_or(f64::NAN);
        let expected = distance_to_segment(near_second_leg, coord(0.01, 0.0), coord(0.01, 0.01));
        assert!((metres - expected).abs() < 1e-9);
        assert!(metres < 100.0);
    }

    #[rstest]
    #[case(coord(0.0, 0.0), true)]
    #[case(coord(180.0, -90.0), true)]
    #[case(coord(180.1, 0.0), false)]
    #[case(coord(0.0, 90.5), false)]
    #[case(coord(f64::NAN, 0.0), false)]
    fn validates_coordinates(#[case] candidate: Coord<f64>, #[case] expected: bool) {
        assert_eq!(is_valid_coordinate(candidate), expected);
    }
}
