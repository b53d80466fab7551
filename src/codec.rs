//! Codec capability matching for offer/answer negotiation.
//!
//! A remote description lists codecs with MIME types and optional fmtp lines.
//! To reuse a locally registered codec we look it up in the local list: an
//! entry with identical fmtp parameters wins, otherwise the first entry with
//! the same MIME type is taken.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIME_TYPE_OPUS: &str = "audio/opus";
pub const MIME_TYPE_G722: &str = "audio/G722";
pub const MIME_TYPE_PCMU: &str = "audio/PCMU";
pub const MIME_TYPE_PCMA: &str = "audio/PCMA";
pub const MIME_TYPE_H264: &str = "video/H264";
pub const MIME_TYPE_VP8: &str = "video/VP8";
pub const MIME_TYPE_VP9: &str = "video/VP9";
pub const MIME_TYPE_AV1: &str = "video/AV1";

/// Errors raised by codec lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Codec not found: {0}")]
    NotFound(String),
}

/// Media kind derived from the top-level MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Audio,
    Video,
}

/// Static description of a codec.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodecCapability {
    /// MIME type such as `video/H264`. Compared case-insensitively.
    pub mime_type: String,
    pub clock_rate: u32,
    pub channels: u16,
    /// Format parameters from the SDP `a=fmtp` line, empty when absent.
    pub sdp_fmtp_line: String,
    /// RTCP feedback mechanisms (`nack`, `nack pli`, `transport-cc`, ...).
    pub rtcp_feedback: Vec<String>,
}

impl CodecCapability {
    /// Builds a capability with no RTCP feedback.
    pub fn new(
        mime_type: impl Into<String>,
        clock_rate: u32,
        channels: u16,
        sdp_fmtp_line: impl Into<String>,
    ) -> Self {
        Self {
            mime_type: mime_type.into(),
            clock_rate,
            channels,
            sdp_fmtp_line: sdp_fmtp_line.into(),
            rtcp_feedback: Vec::new(),
        }
    }

    /// Audio or video, from the part of the MIME type before the slash.
    pub fn kind(&self) -> Option<CodecKind> {
        let (top, _) = self.mime_type.split_once('/')?;
        if top.eq_ignore_ascii_case("audio") {
            Some(CodecKind::Audio)
        } else if top.eq_ignore_ascii_case("video") {
            Some(CodecKind::Video)
        } else {
            None
        }
    }

    fn same_mime_type(&self, other: &CodecCapability) -> bool {
        self.mime_type.eq_ignore_ascii_case(&other.mime_type)
    }
}

/// A codec bound to a payload type in a session description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodecParameters {
    #[serde(flatten)]
    pub capability: CodecCapability,
    pub payload_type: u8,
}

impl CodecParameters {
    pub fn new(capability: CodecCapability, payload_type: u8) -> Self {
        Self {
            capability,
            payload_type,
        }
    }
}

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchTier {
    /// MIME type and fmtp line both equal.
    Exact,
    /// MIME type equal, fmtp line ignored.
    MimeType,
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MatchTier::Exact => write!(f, "exact"),
            MatchTier::MimeType => write!(f, "mime-type"),
        }
    }
}

/// Finds the best match for `needle` in `haystack`.
///
/// ```
/// use sfu_core::codec::{find_match, CodecCapability, CodecParameters};
///
/// let local = vec![CodecParameters::new(CodecCapability::new("audio/opus", 48000, 2, ""), 111)];
/// let remote = CodecParameters::new(CodecCapability::new("audio/OPUS", 48000, 2, "minptime=10"), 96);
/// assert_eq!(find_match(&remote, &local).unwrap().payload_type, 111);
/// ```
///
/// # Errors
/// Returns [`CodecError::NotFound`] when no entry shares the needle's MIME type.
pub fn find_match<'a>(
    needle: &CodecParameters,
    haystack: &'a [CodecParameters],
) -> Result<&'a CodecParameters, CodecError> {
    find_match_with_tier(needle, haystack).map(|(codec, _)| codec)
}

/// Like [`find_match`], also reporting which rule matched.
///
/// # Errors
/// Returns [`CodecError::NotFound`] when no entry shares the needle's MIME type.
pub fn find_match_with_tier<'a>(
    needle: &CodecParameters,
    haystack: &'a [CodecParameters],
) -> Result<(&'a CodecParameters, MatchTier), CodecError> {
    let wanted = &needle.capability;

    if let Some(c) = haystack.iter().find(|c| {
        c.capability.same_mime_type(wanted) && c.capability.sdp_fmtp_line == wanted.sdp_fmtp_line
    }) {
        return Ok((c, MatchTier::Exact));
    }

    if let Some(c) = haystack
        .iter()
        .find(|c| c.capability.same_mime_type(wanted))
    {
        log::debug!(
            "{}: no exact fmtp match for {:?}, using payload type {} ({:?})",
            wanted.mime_type,
            wanted.sdp_fmtp_line,
            c.payload_type,
            c.capability.sdp_fmtp_line
        );
        return Ok((c, MatchTier::MimeType));
    }

    log::debug!("{}: not found among {} codecs", wanted.mime_type, haystack.len());
    Err(CodecError::NotFound(wanted.mime_type.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(mime: &str, fmtp: &str, pt: u8) -> CodecParameters {
        CodecParameters::new(CodecCapability::new(mime, 90_000, 0, fmtp), pt)
    }

    #[test]
    fn exact_fmtp_preferred_over_earlier_entry() {
        let haystack = vec![
            codec(MIME_TYPE_H264, "", 96),
            codec(MIME_TYPE_H264, "profile-level-id=42e01f", 102),
        ];
        let needle = codec("video/H264", "profile-level-id=42e01f", 125);

        let (found, tier) = find_match_with_tier(&needle, &haystack).unwrap();
        assert_eq!(found.payload_type, 102);
        assert_eq!(tier, MatchTier::Exact);
    }

    #[test]
    fn falls_back_to_mime_type_ignoring_case() {
        let haystack = vec![
            codec(MIME_TYPE_VP8, "", 97),
            CodecParameters::new(
                CodecCapability::new("audio/opus", 48_000, 2, "minptime=10;useinbandfec=1"),
                111,
            ),
        ];
        let needle = CodecParameters::new(
            CodecCapability::new("audio/Opus", 48_000, 2, "stereo=1"),
            109,
        );

        let (found, tier) = find_match_with_tier(&needle, &haystack).unwrap();
        assert_eq!(found.payload_type, 111);
        assert_eq!(tier, MatchTier::MimeType);
    }

    #[test]
    fn first_listed_wins_within_tier() {
        let haystack = vec![
            codec(MIME_TYPE_VP9, "profile-id=0", 98),
            codec(MIME_TYPE_VP9, "profile-id=2", 100),
            codec(MIME_TYPE_VP9, "profile-id=0", 101),
        ];
        assert_eq!(
            find_match(&codec("video/vp9", "profile-id=0", 0), &haystack)
                .unwrap()
                .payload_type,
            98
        );
        assert_eq!(
            find_match(&codec("video/vp9", "profile-id=1", 0), &haystack)
                .unwrap()
                .payload_type,
            98
        );
    }

    #[test]
    fn fmtp_compared_case_sensitively() {
        let haystack = vec![
            codec(MIME_TYPE_H264, "profile-level-id=42E01F", 96),
            codec(MIME_TYPE_H264, "profile-level-id=42e01f", 102),
        ];
        let found = find_match(&codec("video/h264", "profile-level-id=42e01f", 0), &haystack);
        assert_eq!(found.unwrap().payload_type, 102);
    }

    #[test]
    fn not_found() {
        let haystack = vec![codec(MIME_TYPE_VP8, "", 96), codec(MIME_TYPE_H264, "", 102)];
        let err = find_match(&codec(MIME_TYPE_AV1, "", 45), &haystack).unwrap_err();
        assert_eq!(err, CodecError::NotFound("video/AV1".to_string()));
        assert_eq!(err.to_string(), "Codec not found: video/AV1");

        assert!(find_match(&codec(MIME_TYPE_VP8, "", 96), &[]).is_err());
    }

    #[test]
    fn kind_from_mime_type() {
        assert_eq!(codec(MIME_TYPE_PCMU, "", 0).capability.kind(), Some(CodecKind::Audio));
        assert_eq!(codec("Video/AV1", "", 0).capability.kind(), Some(CodecKind::Video));
        assert_eq!(codec("application/x-foo", "", 0).capability.kind(), None);
        assert_eq!(codec("opus", "", 0).capability.kind(), None);
    }

    #[test]
    fn match_tier_display() {
        assert_eq!(MatchTier::Exact.to_string(), "exact");
        assert_eq!(MatchTier::MimeType.to_string(), "mime-type");
    }
}
