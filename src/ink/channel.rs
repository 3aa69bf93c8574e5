//! Ink channels and their calibration families.

use serde::{Deserialize, Serialize};

/// A single ink or finishing component of a print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Cyan process color.
    Cyan,
    /// Magenta process color.
    Magenta,
    /// Yellow process color.
    Yellow,
    /// Black (key) process color.
    Black,
    /// White underbase/finishing layer.
    White,
    /// Gloss (varnish) finishing layer.
    Gloss,
}

impl Channel {
    /// Every channel, in canonical order.
    pub const ALL: [Self; 6] = [
        Self::Cyan,
        Self::Magenta,
        Self::Yellow,
        Self::Black,
        Self::White,
        Self::Gloss,
    ];

    /// Calibration family this channel belongs to.
    #[must_use]
    pub fn family(self) -> CalibrationFamily {
        match self {
            Self::Cyan | Self::Magenta | Self::Yellow | Self::Black => CalibrationFamily::Standard,
            Self::White | Self::Gloss => CalibrationFamily::Special,
        }
    }

    /// Lowercase identifier used in files and CSV headers.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cyan => "cyan",
            Self::Magenta => "magenta",
            Self::Yellow => "yellow",
            Self::Black => "black",
            Self::White => "white",
            Self::Gloss => "gloss",
        }
    }

    /// Parse from string (case-insensitive, accepts single-letter codes).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "c" | "cyan" => Some(Self::Cyan),
            "m" | "magenta" => Some(Self::Magenta),
            "y" | "yellow" => Some(Self::Yellow),
            "k" | "black" | "key" => Some(Self::Black),
            "w" | "white" => Some(Self::White),
            "v" | "gloss" | "varnish" => Some(Self::Gloss),
            _ => None,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Channel {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| crate::Error::UnknownChannelName(s.to_string()))
    }
}

/// Group of channels sharing an expected parameter magnitude band.
///
/// Finishing layers lay down far more ink per unit of coverage than the
/// process colors, so their scaling factors live a decade higher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationFamily {
    /// Process colors (CMYK).
    Standard,
    /// Finishing layers (white, gloss).
    Special,
}

impl CalibrationFamily {
    /// Both families.
    pub const ALL: [Self; 2] = [Self::Standard, Self::Special];

    /// Channels belonging to this family, in canonical order.
    #[must_use]
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Self::Standard => &[Channel::Cyan, Channel::Magenta, Channel::Yellow, Channel::Black],
            Self::Special => &[Channel::White, Channel::Gloss],
        }
    }

    /// Whether `channel` belongs to this family.
    #[must_use]
    pub fn contains(self, channel: Channel) -> bool {
        channel.family() == self
    }

    /// Parse from string (case-insensitive).
    #[must_use]
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "cmyk" | "process" => Some(Self::Standard),
            "special" | "finishing" | "spot" => Some(Self::Special),
            _ => None,
        }
    }
}

impl std::fmt::Display for CalibrationFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Special => write!(f, "special"),
        }
    }
}

impl std::str::FromStr for CalibrationFamily {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_str_loose(s).ok_or_else(|| crate::Error::UnknownFamily(s.to_string()))
    }
}

/// One value per channel.
///
/// A fixed record rather than a map, so a table can never be missing a channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerChannel<T> {
    pub cyan: T,
    pub magenta: T,
    pub yellow: T,
    pub black: T,
    pub white: T,
    pub gloss: T,
}

impl<T> PerChannel<T> {
    /// Build a table by evaluating `f` for every channel.
    pub fn from_fn(mut f: impl FnMut(Channel) -> T) -> Self {
        Self {
            cyan: f(Channel::Cyan),
            magenta: f(Channel::Magenta),
            yellow: f(Channel::Yellow),
            black: f(Channel::Black),
            white: f(Channel::White),
            gloss: f(Channel::Gloss),
        }
    }

    /// Value for `channel`.
    #[must_use]
    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Cyan => &self.cyan,
            Channel::Magenta => &self.magenta,
            Channel::Yellow => &self.yellow,
            Channel::Black => &self.black,
            Channel::White => &self.white,
            Channel::Gloss => &self.gloss,
        }
    }

    /// Mutable value for `channel`.
    pub fn get_mut(&mut self, channel: Channel) -> &mut T {
        match channel {
            Channel::Cyan => &mut self.cyan,
            Channel::Magenta => &mut self.magenta,
            Channel::Yellow => &mut self.yellow,
            Channel::Black => &mut self.black,
            Channel::White => &mut self.white,
            Channel::Gloss => &mut self.gloss,
        }
    }

    /// Replace the value for `channel`.
    pub fn set(&mut self, channel: Channel, value: T) {
        *self.get_mut(channel) = value;
    }

    /// Iterate `(channel, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &T)> {
        Channel::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

impl<T: Copy> PerChannel<T> {
    /// Table with the same value for every channel.
    #[must_use]
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value)
    }
}
