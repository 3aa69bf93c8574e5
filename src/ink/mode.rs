//! Reference channel-to-mode table.

use serde::{Deserialize, Serialize};

use super::Channel;

/// A printer configuration: an ordered set of active channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InkMode {
    /// Process colors only.
    Cmyk,
    /// Process colors with a white layer.
    CmykWhite,
    /// Process colors with a gloss layer.
    CmykGloss,
    /// Process colors with white and gloss layers.
    CmykWhiteGloss,
}

impl InkMode {
    /// Get all ink mode variants.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Cmyk, Self::CmykWhite, Self::CmykGloss, Self::CmykWhiteGloss]
    }

    /// Active channels, in print order.
    #[must_use]
    pub fn channels(self) -> &'static [Channel] {
        use Channel::{Black, Cyan, Gloss, Magenta, White, Yellow};
        match self {
            Self::Cmyk => &[Cyan, Magenta, Yellow, Black],
            Self::CmykWhite => &[Cyan, Magenta, Yellow, Black, White],
            Self::CmykGloss => &[Cyan, Magenta, Yellow, Black, Gloss],
            Self::CmykWhiteGloss => &[Cyan, Magenta, Yellow, Black, White, Gloss],
        }
    }

    /// Whether `channel` is active in this mode.
    #[must_use]
    pub fn contains(self, channel: Channel) -> bool {
        self.channels().contains(&channel)
    }

    /// Look a mode up by name.
    ///
    /// Case and separators are ignored, so `CMYK+W`, `cmyk_w` and `cmykw` all
    /// resolve to [`InkMode::CmykWhite`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "cmyk" => Some(Self::Cmyk),
            "cmykw" | "cmykwhite" | "wcmyk" => Some(Self::CmykWhite),
            "cmykv" | "cmykgloss" | "cmykvarnish" => Some(Self::CmykGloss),
            "cmykwv" | "cmykwgloss" | "cmykwhitegloss" | "cmykwhitevarnish" | "wcmykgloss"
            | "wcmykv" => Some(Self::CmykWhiteGloss),
            _ => None,
        }
    }

    /// Canonical display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Cmyk => "CMYK",
            Self::CmykWhite => "CMYK+W",
            Self::CmykGloss => "CMYK+GLOSS",
            Self::CmykWhiteGloss => "CMYK+W+GLOSS",
        }
    }
}

impl std::fmt::Display for InkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for InkMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| crate::Error::UnknownInkMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_roundtrip() {
        for mode in InkMode::all() {
            let parsed: InkMode = mode.to_string().parse().unwrap();
            assert_eq!(*mode, parsed);
        }
    }

    #[test]
    fn test_mode_name_normalization() {
        assert_eq!(InkMode::from_name("cmyk_w"), Some(InkMode::CmykWhite));
        assert_eq!(InkMode::from_name("W+CMYK"), Some(InkMode::CmykWhite));
        assert_eq!(InkMode::from_name("cmyk + white + varnish"), Some(InkMode::CmykWhiteGloss));
        assert_eq!(InkMode::from_name("rgb"), None);
        assert_eq!(InkMode::from_name(""), None);
    }

    #[test]
    fn test_mode_channels_ordered() {
        assert_eq!(InkMode::Cmyk.channels().len(), 4);
        assert_eq!(InkMode::CmykWhiteGloss.channels().last(), Some(&Channel::Gloss));
        assert!(InkMode::CmykGloss.contains(Channel::Gloss));
        assert!(!InkMode::CmykGloss.contains(Channel::White));
    }
}
