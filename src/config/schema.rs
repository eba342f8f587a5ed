//! Configuration schema definitions.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Root configuration for the demo server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Application listener (the flaky endpoint).
    pub server: ListenerConfig,

    /// Metrics/health listener.
    pub metrics: ListenerConfig,

    /// Per-request timeout settings.
    pub timeouts: TimeoutConfig,

    /// Shutdown timing (settle delay, graceful drain bound).
    pub shutdown: ShutdownConfig,

    /// Share of requests that succeed.
    pub success_rate: SuccessRate,
}

impl Config {
    /// Build a configuration with default listeners and timings.
    ///
    /// The success rate has no default; startup fails before this point if it
    /// is missing or unparseable.
    pub fn new(success_rate: SuccessRate) -> Self {
        Self {
            server: ListenerConfig::default(),
            metrics: ListenerConfig {
                bind_address: "0.0.0.0:8000".to_string(),
            },
            timeouts: TimeoutConfig::default(),
            shutdown: ShutdownConfig::default(),
            success_rate,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Per-request timeout configuration, applied as router middleware.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    /// Maximum time a single request may take end to end.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 15 }
    }
}

/// Shutdown timing parameters.
///
/// The settle delay is deliberate: after readiness flips to unhealthy the
/// listener keeps accepting for this long so external routers converge on the
/// unready status before connections are cut. Tests shrink both values.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownConfig {
    /// Wait between marking unready and starting the graceful drain.
    pub settle_delay: Duration,

    /// Upper bound on the graceful drain itself.
    pub stop_timeout: Duration,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(10),
        }
    }
}

/// Validated success-rate percentage in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessRate(u8);

impl SuccessRate {
    /// Construct from a percentage, rejecting values above 100.
    pub fn new(percent: u16) -> Result<Self, SuccessRateError> {
        if percent > 100 {
            return Err(SuccessRateError::OutOfRange(percent));
        }
        Ok(Self(percent as u8))
    }

    /// The configured percentage.
    pub fn percent(&self) -> u8 {
        self.0
    }
}

impl FromStr for SuccessRate {
    type Err = SuccessRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let percent: u16 = s.trim().parse().map_err(SuccessRateError::NotAnInteger)?;
        Self::new(percent)
    }
}

impl fmt::Display for SuccessRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Error type for success-rate validation.
#[derive(Debug, Error)]
pub enum SuccessRateError {
    #[error("success rate must be an integer: {0}")]
    NotAnInteger(std::num::ParseIntError),

    #[error("success rate {0} is out of range (expected 0-100)")]
    OutOfRange(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_accepts_full_range() {
        for p in [0u16, 1, 50, 99, 100] {
            assert_eq!(SuccessRate::new(p).unwrap().percent(), p as u8);
        }
    }

    #[test]
    fn success_rate_rejects_out_of_range() {
        assert!(matches!(
            SuccessRate::new(101),
            Err(SuccessRateError::OutOfRange(101))
        ));
        assert!(matches!(
            "150".parse::<SuccessRate>(),
            Err(SuccessRateError::OutOfRange(150))
        ));
    }

    #[test]
    fn success_rate_rejects_garbage() {
        assert!(matches!(
            "ninety".parse::<SuccessRate>(),
            Err(SuccessRateError::NotAnInteger(_))
        ));
        assert!("".parse::<SuccessRate>().is_err());
        assert!("-5".parse::<SuccessRate>().is_err());
    }

    #[test]
    fn success_rate_parses_with_whitespace() {
        assert_eq!(" 75 ".parse::<SuccessRate>().unwrap().percent(), 75);
    }

    #[test]
    fn config_defaults_match_deployment_conventions() {
        let config = Config::new(SuccessRate::new(90).unwrap());
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.metrics.bind_address, "0.0.0.0:8000");
        assert_eq!(config.shutdown.settle_delay, Duration::from_secs(5));
        assert_eq!(config.shutdown.stop_timeout, Duration::from_secs(10));
        assert_eq!(config.timeouts.request_secs, 15);
    }
}
