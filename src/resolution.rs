use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::identity::Game;

/// Every dimension must fit a signed 32-bit immediate once negated.
const MAX_DIMENSION: u32 = i32::MAX as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The 4:3 resolution sharing this one's height.
    ///
    /// A few of those heights make the engine fall back to rendering at
    /// 640x480, so they are swapped for a nearby resolution that works.
    pub fn letterbox(self) -> Self {
        let height = self.height as u64;
        // round(4h / 3); the fraction is never exactly one half
        let width = ((4 * height + 1) / 3) as u32;
        let boxed = Self::new(width, self.height);

        LETTERBOX_OVERRIDES
            .iter()
            .find(|(broken, _)| *broken == boxed)
            .map(|(_, fallback)| *fallback)
            .unwrap_or(boxed)
    }

    /// Whether the patch needs more than 2GB of address space at this size.
    pub fn is_large(self) -> bool {
        self.width >= 2560 || self.height >= 1440
    }

    pub fn is_tested_for(self, game: Game) -> bool {
        tested_resolutions(game).contains(&self)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidResolution(s.to_string());

        let (width, height) = s.split_once(['x', 'X']).ok_or_else(invalid)?;
        if width.is_empty()
            || height.is_empty()
            || !width.bytes().all(|b| b.is_ascii_digit())
            || !height.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let width: u32 = width.parse().map_err(|_| invalid())?;
        let height: u32 = height.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(invalid());
        }

        Ok(Self::new(width, height))
    }
}

#[rustfmt::skip]
const LETTERBOX_OVERRIDES: &[(Resolution, Resolution)] = &[
    (Resolution::new(1067, 800),  Resolution::new(1024, 768)),
    (Resolution::new(1200, 900),  Resolution::new(1024, 768)),
    (Resolution::new(960, 720),   Resolution::new(800, 600)),
    (Resolution::new(2880, 2160), Resolution::new(1920, 1440)),
];

const TESTED_CRUISE: &[Resolution] = &[
    Resolution::new(800, 600),
    Resolution::new(1024, 768),
    Resolution::new(1280, 720),
    Resolution::new(1280, 800),
    Resolution::new(1280, 960),
    Resolution::new(1360, 768),
    Resolution::new(1366, 768),
    Resolution::new(1440, 1080),
    Resolution::new(1600, 900),
    Resolution::new(1920, 1080),
    Resolution::new(1920, 1440),
    Resolution::new(2560, 1440),
    Resolution::new(3840, 2160),
];

const TESTED_EXTREME: &[Resolution] = &[
    Resolution::new(1280, 720),
    Resolution::new(1280, 800),
    Resolution::new(1360, 768),
    Resolution::new(1366, 768),
    Resolution::new(1600, 900),
    Resolution::new(1920, 1080),
];

const TESTED_COMMON: &[Resolution] = &[
    Resolution::new(1280, 720),
    Resolution::new(1280, 800),
    Resolution::new(1360, 768),
    Resolution::new(1366, 768),
    Resolution::new(1600, 900),
    Resolution::new(1920, 1080),
    Resolution::new(2560, 1440),
    Resolution::new(3840, 2160),
];

pub fn tested_resolutions(game: Game) -> &'static [Resolution] {
    match game {
        Game::Cruise => TESTED_CRUISE,
        Game::Extreme | Game::Wildfire => TESTED_EXTREME,
        _ => TESTED_COMMON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!("1920x1080".parse::<Resolution>().unwrap(), Resolution::new(1920, 1080));
        assert_eq!("2560X1440".parse::<Resolution>().unwrap(), Resolution::new(2560, 1440));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["1920", "x1080", "1920x", "0x1080", "-1x5", "19a0x1080", "1920x1080x2", ""] {
            assert!(input.parse::<Resolution>().is_err(), "{input}");
        }
    }

    #[test]
    fn test_parse_rejects_dimensions_past_i32() {
        assert!("2147483648x1080".parse::<Resolution>().is_err());
        assert!("1920x4000000000".parse::<Resolution>().is_err());
        let widest = "2147483647x1080".parse::<Resolution>().unwrap();
        assert_eq!(widest.width, i32::MAX as u32);
        // the tallest accepted height still letterboxes without truncation
        let tallest = Resolution::new(1, MAX_DIMENSION).letterbox();
        assert_eq!(tallest.width as u64, (4 * MAX_DIMENSION as u64 + 1) / 3);
    }

    #[test]
    fn test_letterbox_800_collapses_to_1024x768() {
        let height = 800u64;
        assert_eq!((4 * height + 1) / 3, 1067);
        assert_eq!(Resolution::new(1280, 800).letterbox(), Resolution::new(1024, 768));
    }

    #[test]
    fn test_letterbox_overrides() {
        assert_eq!(Resolution::new(1600, 900).letterbox(), Resolution::new(1024, 768));
        assert_eq!(Resolution::new(1280, 720).letterbox(), Resolution::new(800, 600));
        assert_eq!(Resolution::new(3840, 2160).letterbox(), Resolution::new(1920, 1440));
    }

    #[test]
    fn test_letterbox_plain() {
        assert_eq!(Resolution::new(1920, 1080).letterbox(), Resolution::new(1440, 1080));
        assert_eq!(Resolution::new(1366, 768).letterbox(), Resolution::new(1024, 768));
        assert_eq!(Resolution::new(2560, 1440).letterbox(), Resolution::new(1920, 1440));
        // 4 * 601 / 3 = 801.33
        assert_eq!(Resolution::new(1000, 601).letterbox(), Resolution::new(801, 601));
        // 4 * 602 / 3 = 802.67
        assert_eq!(Resolution::new(1000, 602).letterbox(), Resolution::new(803, 602));
    }

    #[test]
    fn test_is_large() {
        assert!(Resolution::new(2560, 1440).is_large());
        assert!(Resolution::new(1920, 1440).is_large());
        assert!(Resolution::new(2560, 1080).is_large());
        assert!(!Resolution::new(1920, 1080).is_large());
    }

    #[test]
    fn test_tested_resolutions_per_game() {
        assert!(Resolution::new(1920, 1440).is_tested_for(Game::Cruise));
        assert!(!Resolution::new(1920, 1440).is_tested_for(Game::Mall3));
        assert!(!Resolution::new(2560, 1440).is_tested_for(Game::Extreme));
        assert!(Resolution::new(2560, 1440).is_tested_for(Game::School));
        assert!(!Resolution::new(1234, 567).is_tested_for(Game::Cruise));
    }

    #[test]
    fn test_display() {
        assert_eq!(Resolution::new(1366, 768).to_string(), "1366x768");
    }
}
