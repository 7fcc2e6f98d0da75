//! Time-ordered telemetry samples with piecewise-linear queries.

use smallvec::SmallVec;
use thiserror::Error;

/// Interpolated channel values for one query timestamp.
pub type ChannelValues = SmallVec<[f64; 4]>;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry stream '{0}' contains no samples")]
    EmptySeries(String),
    #[error("telemetry sample has {got} channels, series expects {expected}")]
    ChannelMismatch { expected: usize, got: usize },
}

/// Ordered samples of one measured quantity, queryable at arbitrary
/// timestamps.
///
/// Stamps are nanoseconds since the Unix epoch and must be strictly
/// increasing; bag order is trusted and never re-sorted. Values are stored
/// sample-major with a fixed channel count (1 for exposure time, 3 for
/// lat/lon/alt).
#[derive(Debug, Clone)]
pub struct TelemetrySeries {
    stamps: Vec<i64>,
    values: Vec<f64>,
    channels: usize,
}

impl TelemetrySeries {
    /// Build a series from `(stamp_ns, channel values)` samples.
    ///
    /// `name` only labels the error when the stream turns out to be empty.
    pub fn from_samples<I, V>(name: &str, channels: usize, samples: I) -> Result<Self, TelemetryError>
    where
        I: IntoIterator<Item = (i64, V)>,
        V: AsRef<[f64]>,
    {
        let mut stamps = Vec::new();
        let mut values = Vec::new();
        for (stamp, sample) in samples {
            let sample = sample.as_ref();
            if sample.len() != channels {
                return Err(TelemetryError::ChannelMismatch {
                    expected: channels,
                    got: sample.len(),
                });
            }
            debug_assert!(stamps.last().map_or(true, |last| *last < stamp));
            stamps.push(stamp);
            values.extend_from_slice(sample);
        }
        if stamps.is_empty() {
            return Err(TelemetryError::EmptySeries(name.to_string()));
        }
        Ok(Self { stamps, values, channels })
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Time span covered by the samples, as `(first, last)` stamps.
    pub fn span(&self) -> (i64, i64) {
        (self.stamps[0], *self.stamps.last().unwrap())
    }

    fn sample(&self, idx: usize) -> &[f64] {
        &self.values[idx * self.channels..(idx + 1) * self.channels]
    }

    /// Piecewise-linear query at `t`, each channel interpolated
    /// independently on the shared timestamp axis.
    ///
    /// Outside `[first, last]` the line through the two nearest endpoint
    /// samples is continued; values are extrapolated, never clamped. A
    /// single-sample series is constant everywhere.
    pub fn query(&self, t: i64) -> ChannelValues {
        let n = self.stamps.len();
        if n == 1 {
            return SmallVec::from_slice(self.sample(0));
        }

        // Segment whose line covers t: interior hits bracket it, queries
        // before the first or past the last stamp reuse the end segments.
        let hi = match self.stamps.binary_search(&t) {
            Ok(i) => i.clamp(1, n - 1),
            Err(i) => i.clamp(1, n - 1),
        };
        let lo = hi - 1;

        let (t0, t1) = (self.stamps[lo], self.stamps[hi]);
        let frac = (t - t0) as f64 / (t1 - t0) as f64;
        self.sample(lo)
            .iter()
            .zip(self.sample(hi))
            .map(|(v0, v1)| v0 + (v1 - v0) * frac)
            .collect()
    }

    /// Query convenience for single-channel series.
    pub fn query_scalar(&self, t: i64) -> f64 {
        self.query(t)[0]
    }
}
