// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! All things time-related.

pub use chrono::{DateTime, Local, TimeDelta, Utc};

/// Tells time and returns the time.
///
/// Generally you will want to retrieve time using [`SystemClock`],
/// but in tests you may want to implement a `Clock` with a fixed time.
/// Clocks are shared between the authentication session and the client,
/// so they must be usable across threads.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Interacts with the system clock to get the current time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Converts a Reddit timestamp (fractional seconds since the Unix epoch)
/// to a UTC date.
///
/// Reddit sends timestamps as floats, e.g., `1748023980.0`. Sub-second
/// precision is discarded. Out-of-range timestamps collapse to the epoch
/// rather than failing, since a broken date should never make an entity
/// unreadable.
///
/// # Examples
///
/// ```
/// use snoocore::clock::from_timestamp;
/// let date = from_timestamp(1206975326.0);
/// assert_eq!(date.to_rfc3339(), "2008-03-31T14:55:26+00:00");
/// ```
pub fn from_timestamp(timestamp: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.trunc() as i64, 0).unwrap_or_default()
}
