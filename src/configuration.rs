use chrono::{DateTime, Utc};
pub use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::codec::{CodecCapability, CodecParameters};
use crate::time::{ntp_epoch, NTP_UNIX_OFFSET};

/// Errors found while validating the command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Time {0} is before the NTP epoch (1900-01-01T00:00:00Z)")]
    TimeBeforeEpoch(DateTime<Utc>),
    #[error("Time {0} is past the end of NTP era 0 (2036-02-07T06:28:15Z)")]
    TimeAfterEra(DateTime<Utc>),
    #[error("Invalid time {0:?}: expected RFC 3339, e.g. 2024-05-01T12:00:00Z")]
    InvalidTime(String),
    #[error("Invalid NTP timestamp {0:?}: expected decimal, 0x-prefixed hex or SECONDS.FRACTION hex")]
    InvalidTimestamp(String),
    #[error("Invalid MIME type {0:?}: expected type/subtype")]
    InvalidMimeType(String),
    #[error("Invalid codec {0:?}: expected PT:MIME[ FMTP], e.g. \"111:audio/opus minptime=10\"")]
    InvalidCandidate(String),
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for machine consumption.
    Json,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Configuration {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert a calendar time (default: now) to an NTP timestamp
    Ntp {
        /// RFC 3339 time
        #[arg(short, long, value_parser = parse_time)]
        time: Option<DateTime<Utc>>,
    },
    /// Convert a raw NTP timestamp to calendar time
    NtpDecode {
        /// Decimal, 0x-prefixed hex, or SECONDS.FRACTION in hex
        #[arg(value_parser = parse_ntp)]
        value: u64,
    },
    /// Estimate round-trip time from reception report fields
    Rtt {
        /// Last SR timestamp (LSR), middle 32 bits of NTP time
        #[arg(long)]
        lsr: u32,
        /// Delay since last SR (DLSR) in 1/65536 s
        #[arg(long, default_value_t = 0)]
        dlsr: u32,
        /// RFC 3339 time the report was received (default: now)
        #[arg(short, long, value_parser = parse_time)]
        time: Option<DateTime<Utc>>,
    },
    /// Find a codec among candidates
    Match {
        /// MIME type to look for
        #[arg(short, long)]
        mime: String,
        /// fmtp line to look for
        #[arg(long, default_value = "")]
        fmtp: String,
        /// Candidate codec as PT:MIME[ FMTP]; repeat in preference order
        #[arg(short, long = "candidate", required = true, value_parser = parse_candidate)]
        candidates: Vec<CodecParameters>,
    },
}

impl Configuration {
    /// Checks constraints clap cannot express.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match &self.command {
            Command::Ntp { time } | Command::Rtt { time, .. } => {
                if let Some(t) = time {
                    check_ntp_range(*t)?;
                }
            }
            Command::Match { mime, .. } => check_mime_type(mime)?,
            Command::NtpDecode { .. } => {}
        }
        Ok(())
    }
}

fn check_ntp_range(t: DateTime<Utc>) -> Result<(), ConfigurationError> {
    if t < ntp_epoch() {
        return Err(ConfigurationError::TimeBeforeEpoch(t));
    }
    if t.timestamp() + NTP_UNIX_OFFSET > i64::from(u32::MAX) {
        return Err(ConfigurationError::TimeAfterEra(t));
    }
    Ok(())
}

fn check_mime_type(mime: &str) -> Result<(), ConfigurationError> {
    match mime.split_once('/') {
        Some((top, sub)) if !top.is_empty() && !sub.is_empty() && !sub.contains('/') => Ok(()),
        _ => Err(ConfigurationError::InvalidMimeType(mime.to_string())),
    }
}

/// Parses an RFC 3339 time.
pub fn parse_time(s: &str) -> Result<DateTime<Utc>, ConfigurationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| ConfigurationError::InvalidTime(s.to_string()))
}

/// Parses a raw NTP timestamp.
pub fn parse_ntp(s: &str) -> Result<u64, ConfigurationError> {
    let invalid = || ConfigurationError::InvalidTimestamp(s.to_string());

    if let Some((sec, frac)) = s.split_once('.') {
        let sec = u32::from_str_radix(sec, 16).map_err(|_| invalid())?;
        let frac = u32::from_str_radix(frac, 16).map_err(|_| invalid())?;
        return Ok((u64::from(sec) << 32) | u64::from(frac));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_err(|_| invalid());
    }
    s.parse().map_err(|_| invalid())
}

/// Parses a candidate codec given as `PT:MIME[ FMTP]`.
pub fn parse_candidate(s: &str) -> Result<CodecParameters, ConfigurationError> {
    let invalid = || ConfigurationError::InvalidCandidate(s.to_string());

    let (pt, rest) = s.split_once(':').ok_or_else(invalid)?;
    let payload_type: u8 = pt.trim().parse().map_err(|_| invalid())?;
    if payload_type > 127 {
        return Err(invalid());
    }

    let rest = rest.trim();
    let (mime, fmtp) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    check_mime_type(mime).map_err(|_| invalid())?;

    Ok(CodecParameters::new(
        CodecCapability::new(mime, 0, 0, fmtp.trim()),
        payload_type,
    ))
}
