//! Reservation behavior configuration.

use serde::{Deserialize, Serialize};

/// Reservation behavior configuration.
///
/// Controls how long a reservation attempt may wait on the session lock
/// before giving up with a retryable `Busy` outcome, and how far ahead
/// sessions are offered for booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Maximum time in milliseconds to wait for the session lock before
    /// the attempt fails as busy.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
    /// How many days ahead sessions are listed as bookable. `0` means
    /// no horizon (every future session is listed).
    #[serde(default = "default_horizon_days")]
    pub booking_horizon_days: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout(),
            booking_horizon_days: default_horizon_days(),
        }
    }
}

fn default_lock_timeout() -> u64 {
    5_000
}

fn default_horizon_days() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = BookingConfig::default();
        assert_eq!(cfg.lock_timeout_ms, 5_000);
        assert_eq!(cfg.booking_horizon_days, 30);
    }
}
