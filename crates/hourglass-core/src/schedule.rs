//! Fasting protocol catalog.
//!
//! A protocol splits the 24-hour day into a fasting window and an eating
//! window. The named protocols are fixed; `Custom` takes its fasting hours
//! from user preference, clamped to a sane range on read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bounds for the custom protocol's fasting hours.
pub const CUSTOM_HOURS_MIN: u8 = 1;
pub const CUSTOM_HOURS_MAX: u8 = 23;

/// A named fasting/eating split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FastingProtocol {
    /// 12 hours fasting, 12 hours eating. Entry level.
    TwelveTwelve,
    /// 14:10 split.
    FourteenTen,
    /// 16:8 split. The most common daily protocol.
    SixteenEight,
    /// 18:6 split.
    EighteenSix,
    /// 20:4 split, the "warrior" schedule.
    Warrior,
    /// Fasting hours come from user preference (1-23).
    Custom,
}

impl FastingProtocol {
    /// Every protocol, in ascending order of fasting hours.
    pub fn all() -> &'static [FastingProtocol] {
        &[
            FastingProtocol::TwelveTwelve,
            FastingProtocol::FourteenTen,
            FastingProtocol::SixteenEight,
            FastingProtocol::EighteenSix,
            FastingProtocol::Warrior,
            FastingProtocol::Custom,
        ]
    }

    /// Short display label, e.g. `16:8`.
    pub fn label(&self) -> &'static str {
        match self {
            FastingProtocol::TwelveTwelve => "12:12",
            FastingProtocol::FourteenTen => "14:10",
            FastingProtocol::SixteenEight => "16:8",
            FastingProtocol::EighteenSix => "18:6",
            FastingProtocol::Warrior => "20:4",
            FastingProtocol::Custom => "custom",
        }
    }

    /// Stable identifier used in storage and config files.
    pub fn as_token(&self) -> &'static str {
        match self {
            FastingProtocol::TwelveTwelve => "twelve_twelve",
            FastingProtocol::FourteenTen => "fourteen_ten",
            FastingProtocol::SixteenEight => "sixteen_eight",
            FastingProtocol::EighteenSix => "eighteen_six",
            FastingProtocol::Warrior => "warrior",
            FastingProtocol::Custom => "custom",
        }
    }

    pub fn from_token(token: &str) -> Option<FastingProtocol> {
        FastingProtocol::all()
            .iter()
            .copied()
            .find(|p| p.as_token() == token)
    }

    /// Resolve to `(fasting_hours, eating_hours)`.
    ///
    /// `custom_hours` is only consulted for [`FastingProtocol::Custom`] and
    /// is clamped to `1..=23` so that a bad preference value can never
    /// produce a zero-length or day-exceeding window. The two halves always
    /// sum to 24.
    pub fn resolve(&self, custom_hours: u8) -> (u8, u8) {
        let fasting = match self {
            FastingProtocol::TwelveTwelve => 12,
            FastingProtocol::FourteenTen => 14,
            FastingProtocol::SixteenEight => 16,
            FastingProtocol::EighteenSix => 18,
            FastingProtocol::Warrior => 20,
            FastingProtocol::Custom => custom_hours.clamp(CUSTOM_HOURS_MIN, CUSTOM_HOURS_MAX),
        };
        (fasting, 24 - fasting)
    }

    pub fn fasting_hours(&self, custom_hours: u8) -> u8 {
        self.resolve(custom_hours).0
    }

    pub fn eating_hours(&self, custom_hours: u8) -> u8 {
        self.resolve(custom_hours).1
    }
}

impl Default for FastingProtocol {
    fn default() -> Self {
        FastingProtocol::SixteenEight
    }
}

impl fmt::Display for FastingProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts both labels (`16:8`) and tokens (`sixteen_eight`).
impl FromStr for FastingProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        FastingProtocol::all()
            .iter()
            .copied()
            .find(|p| p.label() == needle || p.as_token() == needle)
            .ok_or_else(|| format!("unknown protocol '{s}' (try one of: 12:12, 14:10, 16:8, 18:6, 20:4, custom)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_protocols_resolve_to_fixed_splits() {
        assert_eq!(FastingProtocol::TwelveTwelve.resolve(0), (12, 12));
        assert_eq!(FastingProtocol::FourteenTen.resolve(0), (14, 10));
        assert_eq!(FastingProtocol::SixteenEight.resolve(0), (16, 8));
        assert_eq!(FastingProtocol::EighteenSix.resolve(0), (18, 6));
        assert_eq!(FastingProtocol::Warrior.resolve(0), (20, 4));
    }

    #[test]
    fn named_protocols_ignore_custom_hours() {
        assert_eq!(FastingProtocol::SixteenEight.resolve(5), (16, 8));
        assert_eq!(FastingProtocol::Warrior.resolve(23), (20, 4));
    }

    #[test]
    fn custom_uses_preference() {
        assert_eq!(FastingProtocol::Custom.resolve(13), (13, 11));
        assert_eq!(FastingProtocol::Custom.resolve(20), (20, 4));
        assert_eq!(FastingProtocol::Custom.resolve(1), (1, 23));
        assert_eq!(FastingProtocol::Custom.resolve(23), (23, 1));
    }

    #[test]
    fn custom_clamps_out_of_range_preference() {
        assert_eq!(FastingProtocol::Custom.resolve(0), (1, 23));
        assert_eq!(FastingProtocol::Custom.resolve(24), (23, 1));
        assert_eq!(FastingProtocol::Custom.resolve(255), (23, 1));
    }

    #[test]
    fn windows_always_sum_to_a_day() {
        for protocol in FastingProtocol::all() {
            for hours in [0u8, 1, 12, 23, 100] {
                let (fasting, eating) = protocol.resolve(hours);
                assert_eq!(fasting + eating, 24, "{protocol:?} with pref {hours}");
            }
        }
    }

    #[test]
    fn default_is_sixteen_eight() {
        assert_eq!(FastingProtocol::default(), FastingProtocol::SixteenEight);
    }

    #[test]
    fn parses_labels_and_tokens() {
        assert_eq!("16:8".parse::<FastingProtocol>(), Ok(FastingProtocol::SixteenEight));
        assert_eq!("warrior".parse::<FastingProtocol>(), Ok(FastingProtocol::Warrior));
        assert_eq!("20:4".parse::<FastingProtocol>(), Ok(FastingProtocol::Warrior));
        assert_eq!(" Custom ".parse::<FastingProtocol>(), Ok(FastingProtocol::Custom));
        assert!("15:9".parse::<FastingProtocol>().is_err());
    }

    #[test]
    fn tokens_round_trip() {
        for protocol in FastingProtocol::all() {
            assert_eq!(FastingProtocol::from_token(protocol.as_token()), Some(*protocol));
        }
        assert_eq!(FastingProtocol::from_token("nope"), None);
    }
}
