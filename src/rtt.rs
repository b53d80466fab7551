//! Round-trip time from RTCP reception reports (RFC 3550 Section 6.4.1).
//!
//! The peer echoes the compact NTP timestamp of our last Sender Report (LSR)
//! along with how long it held it before replying (DLSR). Subtracting both from
//! the current compact timestamp leaves the time spent on the network.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::packets::ReceptionReport;
use crate::time::NtpTime;

/// One second expressed in compact (middle 32 bit) NTP units.
pub const COMPACT_UNITS_PER_SEC: u32 = 65_536;

/// Estimates the round-trip time in milliseconds as of `now`.
///
/// Returns 0 when the report carries no LSR, meaning the peer has not yet
/// received a Sender Report and the RTT is unknown. The subtraction wraps
/// modulo 2^32 like the wire fields do; stale reports therefore yield large
/// values, which callers are expected to filter.
///
/// ```
/// use chrono::{DateTime, Utc};
/// use sfu_core::packets::ReceptionReport;
/// use sfu_core::rtt::rtt_ms_at;
/// use sfu_core::time::NtpTime;
///
/// let now = DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap();
/// let report = ReceptionReport {
///     last_sender_report: NtpTime::from_datetime(now).middle_bits() - 65_536,
///     ..Default::default()
/// };
/// assert_eq!(rtt_ms_at(&report, now), 1000);
/// ```
pub fn rtt_ms_at(report: &ReceptionReport, now: DateTime<Utc>) -> u32 {
    if report.last_sender_report == 0 {
        return 0;
    }

    let now_mid = NtpTime::from_datetime(now).middle_bits();
    let diff = now_mid
        .wrapping_sub(report.last_sender_report)
        .wrapping_sub(report.delay);
    let rtt = (f64::from(diff) * 1000.0 / f64::from(COMPACT_UNITS_PER_SEC)).ceil() as u32;

    log::trace!(
        "ssrc {:08x}: lsr={:08x} dlsr={:08x} now={:08x} rtt={}ms",
        report.ssrc,
        report.last_sender_report,
        report.delay,
        now_mid,
        rtt
    );

    rtt
}

/// Estimates the round-trip time in milliseconds against the wall clock.
pub fn rtt_ms(report: &ReceptionReport) -> u32 {
    rtt_ms_at(report, Utc::now())
}

/// Converts an elapsed time to compact NTP units, as used by the DLSR field.
///
/// Saturates at `u32::MAX` (about 18 hours).
pub fn compact_delay(elapsed: Duration) -> u32 {
    let units = (elapsed.as_nanos() << 16) / 1_000_000_000;
    u32::try_from(units).unwrap_or(u32::MAX)
}
