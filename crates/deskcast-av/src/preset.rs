//! Fixed quality tiers for the screen encoder.
//!
//! The tier table is closed: adding a tier means adding a variant here, and
//! [`QualityPreset::ALL`] plus the exhaustive matches below keep every lookup
//! in sync at compile time.

use std::fmt;
use std::str::FromStr;

use deskcast_common::Error;
use serde::{Deserialize, Serialize};

/// Encoder parameters bundled under a tier name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    /// Output scale in ffmpeg `W:H` form.
    pub scale: &'static str,
    /// Target video bitrate.
    pub bitrate: &'static str,
    /// Peak video bitrate.
    pub maxrate: &'static str,
    /// Rate-control buffer size.
    pub bufsize: &'static str,
}

/// A named quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QualityPreset {
    #[default]
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Hd1080,
}

impl QualityPreset {
    /// Every known tier, in display order.
    pub const ALL: [QualityPreset; 2] = [QualityPreset::Hd720, QualityPreset::Hd1080];

    /// The tier name as exposed over the API.
    pub fn name(&self) -> &'static str {
        match self {
            QualityPreset::Hd720 => "720p",
            QualityPreset::Hd1080 => "1080p",
        }
    }

    /// Encoder parameters for this tier.
    pub fn params(&self) -> EncoderParams {
        match self {
            QualityPreset::Hd720 => EncoderParams {
                scale: "1280:720",
                bitrate: "2000k",
                maxrate: "2500k",
                bufsize: "5000k",
            },
            QualityPreset::Hd1080 => EncoderParams {
                scale: "1920:1080",
                bitrate: "4000k",
                maxrate: "5000k",
                bufsize: "10000k",
            },
        }
    }

    /// Names of every known tier.
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(QualityPreset::name).collect()
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == s)
            .ok_or_else(|| Error::invalid_preset(s, &Self::names()))
    }
}
