//! SFU core - timing and codec helpers for a media forwarding unit.
//!
//! This crate provides the arithmetic a forwarding node needs around RTCP and
//! SDP negotiation:
//!
//! - NTP fixed-point timestamps and their conversion to and from calendar time
//!   (RFC 5905),
//! - round-trip time estimation from RTCP reception report blocks (RFC 3550),
//! - fuzzy lookup of codec parameters during offer/answer negotiation.
//!
//! Everything here is a pure function over its arguments and the wall clock,
//! so it can be called from any thread without synchronization.
//!
//! # Usage
//!
//! Inspect timestamps and RTT from the command line:
//! ```bash
//! sfu-core ntp --time 2024-05-01T12:00:00Z
//! sfu-core rtt --lsr 1820369879 --dlsr 32768
//! ```

/// Codec capability descriptors and matching.
pub mod codec;
/// Command-line configuration and validation.
pub mod configuration;
/// RTCP reception report blocks.
pub mod packets;
/// Simulcast resolution tier identifiers.
pub mod resolution;
/// Round-trip time estimation.
pub mod rtt;
/// NTP timestamp conversion.
pub mod time;
