//! Round trip time estimation, after RFC 6298.
use crate::time::Duration;

use super::Config;

/// Smoothed round trip time and its deviation.
///
/// Only segments sent exactly once are sampled (Karn's algorithm), which is the responsibility of
/// the caller. The derived retransmission timeout is clamped to the configured bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RttEstimator {
    /// Estimate and deviation, after the first sample.
    smoothed: Option<(Duration, Duration)>,
    timeout: Duration,
    min_timeout: Duration,
    max_timeout: Duration,
}

impl RttEstimator {
    /// An estimator without samples, using the initial timeout of the configuration.
    pub fn new(config: &Config) -> Self {
        RttEstimator {
            smoothed: None,
            timeout: config.initial_timeout,
            min_timeout: config.min_timeout,
            max_timeout: config.max_timeout,
        }
    }

    /// The current retransmission timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The smoothed round trip time, if sampled at least once.
    pub fn estimate(&self) -> Option<Duration> {
        self.smoothed.map(|(estimate, _)| estimate)
    }

    /// The round trip time deviation, if sampled at least once.
    pub fn deviation(&self) -> Option<Duration> {
        self.smoothed.map(|(_, deviation)| deviation)
    }

    /// Update with a new measurement.
    pub fn sample(&mut self, rtt: Duration) {
        let (estimate, deviation) = match self.smoothed {
            None => (rtt, rtt / 2),
            Some((estimate, deviation)) => {
                let estimate = estimate * 7 / 8 + rtt / 8;
                // Deviation against the already updated estimate.
                let diff = if rtt > estimate { rtt - estimate } else { estimate - rtt };
                (estimate, deviation * 3 / 4 + diff / 4)
            },
        };

        self.smoothed = Some((estimate, deviation));
        self.timeout = (estimate + deviation * 4)
            .max(self.min_timeout)
            .min(self.max_timeout);
    }
}
