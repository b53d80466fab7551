//! NTP fixed-point timestamps (RFC 5905 Section 6).
//!
//! An NTP timestamp is a 64-bit unsigned value: the high 32 bits carry whole
//! seconds since 1900-01-01T00:00:00Z and the low 32 bits carry the binary
//! fraction of a second (value / 2^32 s). All conversions here use integer
//! shifts so repeated conversions on a live connection do not drift.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970).
pub const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Returns the NTP epoch, 1900-01-01T00:00:00Z.
pub fn ntp_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH - TimeDelta::seconds(NTP_UNIX_OFFSET)
}

/// A 64-bit NTP timestamp.
///
/// Values are produced by [`NtpTime::from_datetime`], [`NtpTime::now`] or read
/// back from a packet with [`NtpTime::from_wire`].
///
/// ```
/// use sfu_core::time::{ntp_epoch, NtpTime};
///
/// assert_eq!(NtpTime::from_datetime(ntp_epoch()).to_wire(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NtpTime(u64);

impl NtpTime {
    /// Converts a calendar time to NTP format.
    ///
    /// The sub-second nanoseconds are scaled to a 32-bit binary fraction and
    /// rounded half up on the nanosecond remainder. Times before the NTP epoch
    /// are not representable; the result for them is unspecified.
    pub fn from_datetime(t: DateTime<Utc>) -> NtpTime {
        let secs = t.timestamp().wrapping_add(NTP_UNIX_OFFSET) as u64;
        // Leap seconds report up to 1_999_999_999 sub-second nanos, so fold
        // everything into one nanosecond count before splitting.
        let nsec = secs
            .wrapping_mul(NANOS_PER_SEC)
            .wrapping_add(u64::from(t.timestamp_subsec_nanos()));

        let sec = nsec / NANOS_PER_SEC;
        let scaled = (nsec - sec * NANOS_PER_SEC) << 32;
        let mut frac = scaled / NANOS_PER_SEC;
        if scaled % NANOS_PER_SEC >= NANOS_PER_SEC / 2 {
            frac += 1;
        }

        NtpTime((sec << 32) | frac)
    }

    /// Current wall-clock time in NTP format.
    pub fn now() -> NtpTime {
        NtpTime::from_datetime(Utc::now())
    }

    /// Wraps a raw 64-bit timestamp taken from a packet.
    pub const fn from_wire(value: u64) -> NtpTime {
        NtpTime(value)
    }

    /// Raw 64-bit value as carried on the wire.
    pub const fn to_wire(self) -> u64 {
        self.0
    }

    /// Whole seconds since the NTP epoch.
    pub const fn seconds(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Binary fraction of a second.
    pub const fn fraction(self) -> u32 {
        self.0 as u32
    }

    /// The middle 32 bits (16 bits of seconds, 16 bits of fraction).
    ///
    /// This is the compact form used by the LSR field of RTCP reception
    /// reports (RFC 3550 Section 6.4.1).
    pub const fn middle_bits(self) -> u32 {
        (self.0 >> 16) as u32
    }

    /// Time elapsed since the NTP epoch.
    ///
    /// Inverse of [`NtpTime::from_datetime`] to within one nanosecond.
    pub fn duration(self) -> Duration {
        let sec = (self.0 >> 32) * NANOS_PER_SEC;
        let frac = (self.0 & 0xffff_ffff) * NANOS_PER_SEC;
        let mut nsec = frac >> 32;
        if frac as u32 >= 0x8000_0000 {
            nsec += 1;
        }
        Duration::from_nanos(sec + nsec)
    }

    /// Calendar time of this timestamp.
    pub fn to_datetime(self) -> DateTime<Utc> {
        // At most (2^32 - 1) * 1e9 + 1e9 nanoseconds, well inside i64.
        ntp_epoch() + TimeDelta::nanoseconds(self.duration().as_nanos() as i64)
    }
}

impl From<DateTime<Utc>> for NtpTime {
    fn from(t: DateTime<Utc>) -> Self {
        NtpTime::from_datetime(t)
    }
}

impl From<NtpTime> for DateTime<Utc> {
    fn from(ts: NtpTime) -> Self {
        ts.to_datetime()
    }
}

impl fmt::Display for NtpTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08x}.{:08x}", self.seconds(), self.fraction())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix(secs: i64, nanos: u32) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(secs, nanos).expect("Invalid timestamp")
    }

    #[test]
    fn epoch_is_zero() {
        assert_eq!(NtpTime::from_datetime(ntp_epoch()).to_wire(), 0);
        assert_eq!(NtpTime::from_wire(0).to_datetime(), ntp_epoch());
        assert_eq!(ntp_epoch().to_rfc3339(), "1900-01-01T00:00:00+00:00");
    }

    #[test]
    fn unix_epoch_seconds() {
        let ts = NtpTime::from_datetime(unix(0, 0));
        assert_eq!(ts.seconds() as i64, NTP_UNIX_OFFSET);
        assert_eq!(ts.fraction(), 0);
    }

    #[test]
    fn half_second_fraction() {
        let ts = NtpTime::from_datetime(unix(1_000, 500_000_000));
        assert_eq!(ts.fraction(), 0x8000_0000);
        assert_eq!(ts.duration().subsec_nanos(), 500_000_000);
    }

    #[test]
    fn fraction_rounds_half_up_on_nanos() {
        // 1 ns = 4.294967296 fraction units -> rounds down to 4
        assert_eq!(NtpTime::from_datetime(unix(0, 1)).fraction(), 4);
        // 3 ns = 12.884901888 -> rounds up to 13
        assert_eq!(NtpTime::from_datetime(unix(0, 3)).fraction(), 13);
        // 999_999_999 ns stays below the next second
        let ts = NtpTime::from_datetime(unix(0, 999_999_999));
        assert_eq!(ts.seconds() as i64, NTP_UNIX_OFFSET);
        assert_eq!(ts.fraction(), 0xffff_fffc);
    }

    #[test]
    fn duration_rounds_half_up() {
        // fraction 1 is 0.2328... ns -> 0 ns
        assert_eq!(NtpTime::from_wire(1).duration(), Duration::ZERO);
        // fraction 3 is 0.6984... ns -> 1 ns
        assert_eq!(NtpTime::from_wire(3).duration(), Duration::from_nanos(1));
        assert_eq!(
            NtpTime::from_wire(5 << 32).duration(),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn round_trip_within_one_nanosecond() {
        const TEST_CASES: &[(i64, u32)] = &[
            (0, 0),
            (1_525_987, 1),
            (1_600_000_000, 123_456_789),
            (1_700_000_000, 999_999_999),
            (2_000_000_000, 500_000_001),
            (-1_000_000_000, 7),
        ];

        for &(secs, nanos) in TEST_CASES {
            let t = unix(secs, nanos);
            let back = NtpTime::from_datetime(t).to_datetime();
            let err = (back - t).num_nanoseconds().expect("nanos overflow").abs();
            assert!(err <= 1, "round trip of {} drifted by {} ns", t, err);
        }
    }

    #[test]
    fn round_trip_sweep_subsecond() {
        for nanos in (0..1_000_000_000u32).step_by(7_777_777) {
            let t = unix(1_650_000_000, nanos);
            let back = NtpTime::from_datetime(t).to_datetime();
            let err = (back - t).num_nanoseconds().expect("nanos overflow").abs();
            assert!(err <= 1, "nanos {} drifted by {} ns", nanos, err);
        }
    }

    #[test]
    fn middle_bits() {
        let ts = NtpTime::from_wire(0x1234_5678_9abc_def0);
        assert_eq!(ts.middle_bits(), 0x5678_9abc);
        assert_eq!(ts.seconds(), 0x1234_5678);
        assert_eq!(ts.fraction(), 0x9abc_def0);
    }

    #[test]
    fn display_is_hex_pair() {
        let ts = NtpTime::from_wire(0x0000_0001_8000_0000);
        assert_eq!(ts.to_string(), "00000001.80000000");
    }

    #[test]
    fn now_is_after_2020() {
        // 2020-01-01 in NTP seconds
        assert!(NtpTime::now().seconds() > 3_786_825_600);
    }
}
