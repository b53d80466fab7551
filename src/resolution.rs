use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Simulcast layer identifier for the quarter resolution encoding.
pub const QUARTER_RESOLUTION: &str = "q";
/// Simulcast layer identifier for the half resolution encoding.
pub const HALF_RESOLUTION: &str = "h";
/// Simulcast layer identifier for the full resolution encoding.
pub const FULL_RESOLUTION: &str = "f";

/// Resolution is an enum that represents a simulcast spatial layer (RID).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Resolution {
    /// Quarter of the source width and height.
    Quarter,
    /// Half of the source width and height.
    Half,
    /// Source resolution.
    Full,
}

/// ResolutionError is an enum that represents the error that can occur when parsing a layer token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Invalid resolution: {0:?}")]
    InvalidResolution(String),
}

impl Resolution {
    /// The RID token used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Resolution::Quarter => QUARTER_RESOLUTION,
            Resolution::Half => HALF_RESOLUTION,
            Resolution::Full => FULL_RESOLUTION,
        }
    }
}

impl FromStr for Resolution {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            QUARTER_RESOLUTION => Ok(Resolution::Quarter),
            HALF_RESOLUTION => Ok(Resolution::Half),
            FULL_RESOLUTION => Ok(Resolution::Full),
            _ => Err(ResolutionError::InvalidResolution(s.to_string())),
        }
    }
}

impl TryFrom<String> for Resolution {
    type Error = ResolutionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        r.as_str().to_string()
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
