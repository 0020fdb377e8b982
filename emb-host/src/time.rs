// Copyright (c) 2025 Ralf Anton Beier
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Signed timestamps for host time values.
//!
//! Host times may lie before the epoch, so [`Timestamp`] keeps signed
//! seconds. The nanosecond part always counts forward from `secs`: half a
//! second before the epoch is `secs = -1, nanos = 500_000_000`, the same
//! layout `timespec` uses.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use emb_error::Fault;

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Point in time relative to the Unix epoch, with nanosecond resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    secs: i64,
    nanos: u32,
}

impl Timestamp {
    /// 1970-01-01T00:00:00Z
    pub const UNIX_EPOCH: Self = Self { secs: 0, nanos: 0 };

    /// `secs` seconds plus `nanos` nanoseconds after the epoch.
    ///
    /// Returns `None` unless `nanos` is below one second.
    #[must_use]
    pub const fn new(secs: i64, nanos: u32) -> Option<Self> {
        if nanos < 1_000_000_000 { Some(Self { secs, nanos }) } else { None }
    }

    /// Whole seconds since the epoch, rounded towards negative infinity
    #[must_use]
    pub const fn secs(self) -> i64 {
        self.secs
    }

    /// Nanoseconds past [`Self::secs`], always below one second
    #[must_use]
    pub const fn subsec_nanos(self) -> u32 {
        self.nanos
    }

    /// Nanoseconds since the epoch; negative before it
    #[must_use]
    pub fn as_nanos(self) -> i128 {
        i128::from(self.secs) * NANOS_PER_SEC + i128::from(self.nanos)
    }

    /// Timestamp `nanos` nanoseconds after the epoch.
    ///
    /// Returns `None` if the seconds do not fit in an `i64`.
    #[must_use]
    pub fn from_nanos(nanos: i128) -> Option<Self> {
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).ok()?;
        let nanos = u32::try_from(nanos.rem_euclid(NANOS_PER_SEC)).ok()?;
        Some(Self { secs, nanos })
    }

    /// Whether this lies before the epoch
    #[must_use]
    pub const fn is_before_epoch(self) -> bool {
        self.secs < 0
    }
}

impl TryFrom<Duration> for Timestamp {
    type Error = Fault;

    /// Reads `since_epoch` as an offset after the epoch
    fn try_from(since_epoch: Duration) -> Result<Self, Fault> {
        let secs = i64::try_from(since_epoch.as_secs()).map_err(|_| Fault::overflow("time too large"))?;
        Ok(Self { secs, nanos: since_epoch.subsec_nanos() })
    }
}

impl TryFrom<Timestamp> for Duration {
    type Error = Fault;

    /// Offset after the epoch; earlier times raise an overflow fault
    fn try_from(time: Timestamp) -> Result<Self, Fault> {
        let secs = u64::try_from(time.secs).map_err(|_| Fault::overflow("time before the epoch"))?;
        Ok(Duration::new(secs, time.nanos))
    }
}

impl TryFrom<SystemTime> for Timestamp {
    type Error = Fault;

    fn try_from(time: SystemTime) -> Result<Self, Fault> {
        let nanos = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i128::try_from(after.as_nanos()),
            Err(before) => i128::try_from(before.duration().as_nanos()).map(|n| -n),
        };
        nanos.ok().and_then(Self::from_nanos).ok_or_else(|| Fault::overflow("time out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nanos_are_counted_forward() {
        let half_before = Timestamp::from_nanos(-500_000_000).unwrap();
        assert_eq!(half_before.secs(), -1);
        assert_eq!(half_before.subsec_nanos(), 500_000_000);
        assert!(half_before.is_before_epoch());
        assert_eq!(half_before.as_nanos(), -500_000_000);
        assert!(half_before < Timestamp::UNIX_EPOCH);

        assert_eq!(Timestamp::new(-5, 0).unwrap().as_nanos(), -5_000_000_000);
        assert_eq!(Timestamp::new(0, 1_000_000_000), None);
        assert_eq!(Timestamp::from_nanos(i128::MAX), None);
    }

    #[test]
    fn test_duration_conversions() {
        let since_epoch = Duration::new(1, 50);
        let time = Timestamp::try_from(since_epoch).unwrap();
        assert_eq!(time, Timestamp::new(1, 50).unwrap());
        assert_eq!(Duration::try_from(time).unwrap(), since_epoch);

        let before = Timestamp::new(-1, 0).unwrap();
        assert_eq!(Duration::try_from(before).unwrap_err().message(), "time before the epoch");
        assert!(Timestamp::try_from(Duration::MAX).is_err());
    }

    #[test]
    fn test_system_time() {
        let before = UNIX_EPOCH - Duration::new(2, 250);
        let time = Timestamp::try_from(before).unwrap();
        assert_eq!(time.as_nanos(), -2_000_000_250);
        assert_eq!(Timestamp::try_from(UNIX_EPOCH).unwrap(), Timestamp::UNIX_EPOCH);
    }
}
