//! Encoded polyline codec.
//!
//! Implements the widely used encoded-polyline algorithm: each coordinate is
//! scaled by `10^precision`, rounded, delta-encoded against its predecessor,
//! zig-zag folded and emitted as 5-bit chunks in the printable ASCII range
//! `?` to `~`. Latitude precedes longitude for every point.
//!
//! Decoding reverses the process exactly, so round trips are lossless up to
//! the chosen precision.

use geo::Coord;
use thiserror::Error;

use crate::geometry::is_valid_coordinate;

/// Decimal places used by most routing services.
pub const DEFAULT_PRECISION: u32 = 5;

/// Largest precision the codec accepts.
pub const MAX_PRECISION: u32 = 9;

const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: u64 = 0x1f;
const CONTINUATION_BIT: u64 = 0x20;
const ASCII_OFFSET: u8 = 63;
const ASCII_MAX: u8 = 126;

/// Errors raised while encoding or decoding polylines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolylineError {
    /// The requested precision is above [`MAX_PRECISION`].
    #[error("precision {precision} exceeds the supported maximum of {max}")]
    UnsupportedPrecision {
        /// Requested number of decimal places.
        precision: u32,
        /// Largest supported number of decimal places.
        max: u32,
    },
    /// A coordinate was non-finite or outside WGS84 bounds.
    #[error("coordinate {index} ({longitude}, {latitude}) is not a valid WGS84 position")]
    InvalidCoordinate {
        /// Position of the offending coordinate in the input.
        index: usize,
        /// Longitude of the offending coordinate.
        longitude: f64,
        /// Latitude of the offending coordinate.
        latitude: f64,
    },
    /// A byte outside the encoded alphabet was found.
    #[error("invalid polyline byte {byte:#04x} at offset {offset}")]
    InvalidByte {
        /// Byte offset of the invalid character.
        offset: usize,
        /// The invalid byte.
        byte: u8,
    },
    /// The input ended in the middle of a value or coordinate pair.
    #[error("polyline is truncated at offset {offset}")]
    Truncated {
        /// Byte offset where more input was expected.
        offset: usize,
    },
    /// A decoded value did not fit into 64 bits.
    #[error("polyline value overflows at offset {offset}")]
    Overflow {
        /// Byte offset where the overflow was detected.
        offset: usize,
    },
}

/// Encode coordinates as a polyline string.
///
/// # Errors
/// Returns [`PolylineError::UnsupportedPrecision`] for precisions above
/// [`MAX_PRECISION`] and [`PolylineError::InvalidCoordinate`] when a
/// coordinate is non-finite or out of range.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use fleetwatch_core::polyline::{DEFAULT_PRECISION, encode_polyline};
///
/// let path = [
///     Coord { x: -120.2, y: 38.5 },
///     Coord { x: -120.95, y: 40.7 },
///     Coord { x: -126.453, y: 43.252 },
/// ];
/// let encoded = encode_polyline(&path, DEFAULT_PRECISION)?;
/// assert_eq!(encoded, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// # Ok::<(), fleetwatch_core::polyline::PolylineError>(())
/// ```
pub fn encode_polyline(coords: &[Coord<f64>], precision: u32) -> Result<String, PolylineError> {
    let factor = precision_factor(precision)?;
    let mut encoded = String::new();
    let mut previous_lat = 0_i64;
    let mut previous_lon = 0_i64;
    for (index, coord) in coords.iter().enumerate() {
        if !is_valid_coordinate(*coord) {
            return Err(PolylineError::InvalidCoordinate {
                index,
                longitude: coord.x,
                latitude: coord.y,
            });
        }
        let lat = scale(coord.y, factor);
        let lon = scale(coord.x, factor);
        push_value(lat - previous_lat, &mut encoded);
        push_value(lon - previous_lon, &mut encoded);
        previous_lat = lat;
        previous_lon = lon;
    }
    Ok(encoded)
}

/// Decode a polyline into coordinates.
///
/// Accepts any byte container (`&str`, `String`, `&[u8]`, `Vec<u8>`).
///
/// # Errors
/// Returns [`PolylineError::InvalidByte`] for characters outside the encoded
/// alphabet, [`PolylineError::Truncated`] when input ends mid-value or
/// mid-pair, [`PolylineError::Overflow`] for values that do not fit in
/// 64 bits and [`PolylineError::InvalidCoordinate`] when a decoded point lies
/// outside WGS84 bounds.
///
/// # Examples
/// ```
/// use fleetwatch_core::polyline::{DEFAULT_PRECISION, decode_polyline};
///
/// let path = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@", DEFAULT_PRECISION)?;
/// assert_eq!(path.len(), 3);
/// assert!((path[0].y - 38.5).abs() < 1e-9);
/// assert!((path[0].x + 120.2).abs() < 1e-9);
/// # Ok::<(), fleetwatch_core::polyline::PolylineError>(())
/// ```
pub fn decode_polyline(
    encoded: impl AsRef<[u8]>,
    precision: u32,
) -> Result<Vec<Coord<f64>>, PolylineError> {
    let factor = precision_factor(precision)?;
    let bytes = encoded.as_ref();
    let mut cursor = 0_usize;
    let mut lat = 0_i64;
    let mut lon = 0_i64;
    let mut coords = Vec::new();
    while cursor < bytes.len() {
        lat = accumulate(lat, read_value(bytes, &mut cursor)?, cursor)?;
        lon = accumulate(lon, read_value(bytes, &mut cursor)?, cursor)?;
        let coord = Coord {
            x: unscale(lon, factor),
            y: unscale(lat, factor),
        };
        if !is_valid_coordinate(coord) {
            return Err(PolylineError::InvalidCoordinate {
                index: coords.len(),
                longitude: coord.x,
                latitude: coord.y,
            });
        }
        coords.push(coord);
    }
    Ok(coords)
}

fn precision_factor(precision: u32) -> Result<f64, PolylineError> {
    if precision > MAX_PRECISION {
        return Err(PolylineError::UnsupportedPrecision {
            precision,
            max: MAX_PRECISION,
        });
    }
    Ok(f64::from(10_u32.pow(precision)))
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    reason = "validated coordinates scaled by at most 1e9 fit comfortably in i64"
)]
fn scale(value: f64, factor: f64) -> i64 {
    (value * factor).round() as i64
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "decoded integers are far below 2^53 for valid coordinates"
)]
fn unscale(value: i64, factor: f64) -> f64 {
    value as f64 / factor
}

#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    reason = "zig-zag folding reinterprets the sign bit and chunks are masked to five bits"
)]
fn push_value(value: i64, encoded: &mut String) {
    let mut remaining = ((value << 1) ^ (value >> 63)) as u64;
    while remaining >= CONTINUATION_BIT {
        let chunk = ((remaining & CHUNK_MASK) | CONTINUATION_BIT) as u8;
        encoded.push(char::from(chunk + ASCII_OFFSET));
        remaining >>= CHUNK_BITS;
    }
    encoded.push(char::from(remaining as u8 + ASCII_OFFSET));
}

fn read_value(bytes: &[u8], cursor: &mut usize) -> Result<i64, PolylineError> {
    let mut folded = 0_u64;
    let mut shift = 0_u32;
    loop {
        let offset = *cursor;
        let Some(&byte) = bytes.get(offset) else {
            return Err(PolylineError::Truncated { offset });
        };
        if !(ASCII_OFFSET..=ASCII_MAX).contains(&byte) {
            return Err(PolylineError::InvalidByte { offset, byte });
        }
        let chunk = u64::from(byte - ASCII_OFFSET);
        let bits = chunk & CHUNK_MASK;
        if shift >= u64::BITS || drops_bits(bits, shift) {
            return Err(PolylineError::Overflow { offset });
        }
        folded |= bits << shift;
        shift += CHUNK_BITS;
        *cursor = offset + 1;
        if chunk < CONTINUATION_BIT {
            break;
        }
    }
    let magnitude = i64::try_from(folded >> 1).map_err(|_| PolylineError::Overflow {
        offset: *cursor,
    })?;
    Ok(if folded & 1 == 1 { !magnitude } else { magnitude })
}

/// Whether `bits << shift` would lose set bits above bit 63.
const fn drops_bits(bits: u64, shift: u32) -> bool {
    shift > u64::BITS - CHUNK_BITS && bits >> (u64::BITS - shift) != 0
}

fn accumulate(total: i64, delta: i64, offset: usize) -> Result<i64, PolylineError> {
    total
        .checked_add(delta)
        .ok_or(PolylineError::Overflow { offset })
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "round-trip assertions compare floating-point coordinates"
)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coord(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    #[rstest]
    fn empty_input_round_trips() {
        let encoded = encode_polyline(&[], DEFAULT_PRECISION).expect("encode empty");
        assert!(encoded.is_empty());
        let decoded = decode_polyline(&encoded, DEFAULT_PRECISION).expect("decode empty");
        assert!(decoded.is_empty());
    }

    #[rstest]
    fn decodes_reference_polyline() {
        let decoded =
            decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@", DEFAULT_PRECISION).expect("decode");
        let expected = [
            coord(-120.2, 38.5),
            coord(-120.95, 40.7),
            coord(-126.453, 43.252),
        ];
        assert_eq!(decoded.len(), expected.len());
        for (actual, wanted) in decoded.iter().zip(expected) {
            assert!((actual.x - wanted.x).abs() < 1e-9);
            assert!((actual.y - wanted.y).abs() < 1e-9);
        }
    }

    #[rstest]
    fn higher_precision_keeps_more_digits() {
        let path = [coord(13.388_860_1, 52.517_037_2)];
        let encoded = encode_polyline(&path, 6).expect("encode");
        let decoded = decode_polyline(encoded.as_bytes(), 6).expect("decode");
        let point = decoded.first().copied().expect("one point");
        assert!((point.x - 13.388_860).abs() < 1e-9);
        assert!((point.y - 52.517_037).abs() < 1e-9);
    }

    #[rstest]
    #[case(coord(f64::NAN, 0.0))]
    #[case(coord(0.0, f64::INFINITY))]
    #[case(coord(181.0, 0.0))]
    #[case(coord(0.0, -91.0))]
    fn encode_rejects_invalid_coordinates(#[case] bad: Coord<f64>) {
        let err = encode_polyline(&[coord(0.0, 0.0), bad], DEFAULT_PRECISION)
            .expect_err("invalid coordinate");
        assert!(matches!(err, PolylineError::InvalidCoordinate { index: 1, .. }));
    }

    #[rstest]
    fn rejects_excessive_precision() {
        let err = decode_polyline("??", MAX_PRECISION + 1).expect_err("precision");
        assert_eq!(
            err,
            PolylineError::UnsupportedPrecision {
                precision: MAX_PRECISION + 1,
                max: MAX_PRECISION,
            }
        );
    }

    #[rstest]
    fn rejects_bytes_outside_alphabet() {
        let err = decode_polyline("_p~iF ps|U", DEFAULT_PRECISION).expect_err("space");
        assert_eq!(err, PolylineError::InvalidByte { offset: 5, byte: b' ' });
    }

    #[rstest]
    #[case::mid_value("_p~i")]
    #[case::missing_longitude("_p~iF")]
    fn rejects_truncated_input(#[case] encoded: &str) {
        let err = decode_polyline(encoded, DEFAULT_PRECISION).expect_err("truncated");
        assert!(matches!(err, PolylineError::Truncated { .. }));
    }

    #[rstest]
    fn rejects_values_wider_than_64_bits() {
        let encoded = "~".repeat(20);
        let err = decode_polyline(encoded, DEFAULT_PRECISION).expect_err("overflow");
        assert!(matches!(err, PolylineError::Overflow { .. }));
    }

    #[rstest]
    fn rejects_bits_shifted_past_64() {
        let err = decode_polyline("____________^?", DEFAULT_PRECISION).expect_err("overflow");
        assert_eq!(err, PolylineError::Overflow { offset: 12 });
    }

    #[rstest]
    fn high_chunk_within_64_bits_reaches_range_check() {
        // Twelve empty continuation chunks then a final chunk using only the
        // four bits left below bit 64.
        let decoded = decode_polyline("____________N?", DEFAULT_PRECISION);
        assert!(matches!(
            decoded,
            Err(PolylineError::InvalidCoordinate { index: 0, .. })
        ));
    }

    #[rstest]
    fn decode_rejects_points_outside_wgs84() {
        let mut encoded = String::new();
        push_value(scale(0.0, 1e5), &mut encoded);
        push_value(scale(10.0, 1e5), &mut encoded);
        push_value(scale(95.0, 1e5), &mut encoded);
        push_value(0, &mut encoded);
        let err = decode_polyline(&encoded, DEFAULT_PRECISION).expect_err("latitude 95");
        assert!(matches!(
            err,
            PolylineError::InvalidCoordinate { index: 1, latitude, .. } if (latitude - 95.0).abs() < 1e-9
        ));
    }
}
