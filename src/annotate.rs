//! Per-frame metadata: capture time, interpolated position and exposure,
//! and the rational encodings used by the metadata writer.

use chrono::DateTime;

use crate::telemetry::TelemetrySeries;

/// Default number of fractional digits kept in the seconds component of a
/// DMS-encoded coordinate.
pub const SECONDS_PRECISION: u32 = 5;

const NANOS_PER_HOUR: i64 = 3_600 * 1_000_000_000;

/// Metadata attached to one emitted frame. Built per frame, consumed by the
/// sink, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMetadata {
    /// Capture time after time-zone correction, `YYYY:MM:DD HH:MM:SS`.
    pub capture_time: String,
    /// Microsecond remainder of the capture time.
    pub capture_subsec: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub exposure_ms: f64,
}

/// Compute the metadata record for a frame captured at `stamp_ns`.
///
/// Position channels are `(latitude, longitude, altitude)` interpolated
/// independently at the frame timestamp. When no exposure stream exists the
/// camera's static default is used; the degradation is logged once at
/// series-construction time, not here.
pub fn annotate(
    stamp_ns: i64,
    tz_hours: i32,
    position: &TelemetrySeries,
    exposure: Option<&TelemetrySeries>,
    default_exposure_ms: f64,
) -> FrameMetadata {
    let (capture_time, capture_subsec) = calendar_strings(stamp_ns, tz_hours);
    let fix = position.query(stamp_ns);
    let exposure_ms = match exposure {
        Some(series) => series.query_scalar(stamp_ns),
        None => default_exposure_ms,
    };
    FrameMetadata {
        capture_time,
        capture_subsec,
        latitude: fix[0],
        longitude: fix[1],
        altitude: fix[2],
        exposure_ms,
    }
}

/// Render a nanosecond timestamp, shifted by a whole-hour time-zone offset,
/// as a calendar string plus its microsecond remainder.
pub fn calendar_strings(stamp_ns: i64, tz_hours: i32) -> (String, String) {
    let corrected = stamp_ns + tz_hours as i64 * NANOS_PER_HOUR;
    let dt = DateTime::from_timestamp_nanos(corrected);
    (
        dt.format("%Y:%m:%d %H:%M:%S").to_string(),
        dt.timestamp_subsec_micros().to_string(),
    )
}

/// Reduced integer fraction, the shape EXIF RATIONAL values take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub num: i64,
    pub den: i64,
}

impl Rational {
    pub fn new(num: i64, den: i64) -> Self {
        debug_assert!(den > 0);
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()).max(1) as i64;
        Self { num: num / g, den: den / g }
    }

    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl std::fmt::Display for Rational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// A coordinate magnitude in degrees, minutes and exact-rational seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmsAngle {
    pub degrees: u32,
    pub minutes: u32,
    pub seconds: Rational,
}

/// Decompose the magnitude of a decimal-degree coordinate into degrees,
/// minutes and seconds, with the seconds kept as an exact fraction at
/// `sec_precision` decimal digits so the persisted record does not pick up
/// float rounding.
pub fn to_dms(decimal_degrees: f64, sec_precision: u32) -> DmsAngle {
    let magnitude = decimal_degrees.abs();
    let degrees = magnitude as u32;
    let minutes = ((magnitude - degrees as f64) * 60.0) as u32;
    let seconds = (magnitude - degrees as f64 - minutes as f64 / 60.0) * 3600.0;
    let scale = 10_i64.pow(sec_precision);
    DmsAngle {
        degrees,
        minutes,
        seconds: Rational::new((seconds * scale as f64) as i64, scale),
    }
}

/// Hemisphere reference letter for a latitude.
pub fn latitude_ref(latitude: f64) -> char {
    if latitude > 0.0 { 'N' } else { 'S' }
}

/// Hemisphere reference letter for a longitude.
pub fn longitude_ref(longitude: f64) -> char {
    if longitude > 0.0 { 'E' } else { 'W' }
}

/// Altitude reference flag: 0 above the reference level, 1 below.
pub fn altitude_ref(altitude: f64) -> u8 {
    if altitude > 0.0 { 0 } else { 1 }
}

/// Altitude at centimeter precision.
pub fn altitude_rational(altitude: f64) -> Rational {
    Rational::new((altitude.abs() * 100.0) as i64, 100)
}

/// Exposure time in milliseconds as a `1/x` second rational.
pub fn exposure_rational(exposure_ms: f64) -> Rational {
    Rational::new(1, (1000.0 / exposure_ms).round() as i64)
}
