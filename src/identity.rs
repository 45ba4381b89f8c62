//! Build identification by whole-file checksum.
//!
//! Every byte pattern the patcher knows is only valid for one exact build, so
//! nothing is inferred beyond an exact checksum match.

use strum::{Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Game {
    #[strum(serialize = "Ski Resort Tycoon")]
    Ski,
    #[strum(serialize = "Cruise Ship Tycoon")]
    Cruise,
    #[strum(serialize = "Outdoor Life: Sportsman's Challenge")]
    Challenge,
    #[strum(serialize = "School Tycoon")]
    School,
    #[strum(serialize = "Ski Resort Extreme")]
    Extreme,
    #[strum(serialize = "Wildfire")]
    Wildfire,
    #[strum(serialize = "Mall Tycoon 3")]
    Mall3,
}

impl Game {
    pub fn executable(self) -> &'static str {
        match self {
            Game::Ski => "SkiGame.exe",
            Game::Cruise => "CruiseShipTycoon.exe",
            Game::Challenge => "SC.exe",
            Game::School => "SchoolTycoon.exe",
            Game::Extreme => "SRE.exe",
            Game::Wildfire => "Wildfire.exe",
            Game::Mall3 => "Mall3Game.exe",
        }
    }

    pub fn release_year(self) -> u16 {
        match self {
            Game::Cruise => 2003,
            Game::Mall3 => 2005,
            _ => 2004,
        }
    }

    /// Extra hint printed when an outdated build is found.
    pub fn update_hint(self) -> Option<&'static str> {
        match self {
            Game::Extreme => Some(
                "Press \"Check for updates\" in the game's launcher (SREUpdater.exe), then run the patch again.",
            ),
            _ => None,
        }
    }
}

/// A build that receives the resolution patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Build {
    Ski,
    CruiseV1001,
    CruiseUpdate3,
    Challenge,
    SchoolOriginal,
    School,
    Extreme,
    Wildfire,
    Mall3,
}

impl Build {
    pub fn game(self) -> Game {
        match self {
            Build::Ski => Game::Ski,
            Build::CruiseV1001 | Build::CruiseUpdate3 => Game::Cruise,
            Build::Challenge => Game::Challenge,
            Build::SchoolOriginal | Build::School => Game::School,
            Build::Extreme => Game::Extreme,
            Build::Wildfire => Game::Wildfire,
            Build::Mall3 => Game::Mall3,
        }
    }

    /// Whether a newer build of the same game exists.
    pub fn is_latest(self) -> bool {
        !matches!(self, Build::CruiseV1001 | Build::SchoolOriginal)
    }
}

/// A build whose disk check has to be removed before it can be patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtectedBuild(pub Game);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Supported(Build),
    CopyProtected(ProtectedBuild),
    Outdated(Game),
    Unrecognized(u32),
}

#[rustfmt::skip]
pub const KNOWN_BUILDS: &[(u32, Build)] = &[
    (1447773004, Build::Ski),
    (1142252342, Build::CruiseV1001),
    (3759243516, Build::CruiseUpdate3),
    (554985168,  Build::Challenge),      // disk check already removed
    (1373379655, Build::SchoolOriginal),
    (490347772,  Build::School),
    (3371513462, Build::Extreme),
    (667719983,  Build::Wildfire),
    (495043694,  Build::Mall3),
];

#[rustfmt::skip]
pub const COPY_PROTECTED_BUILDS: &[(u32, ProtectedBuild)] = &[
    (3047680879, ProtectedBuild(Game::Ski)),
    (695746026,  ProtectedBuild(Game::Challenge)),
    (4056039368, ProtectedBuild(Game::School)),
    (3801619499, ProtectedBuild(Game::Extreme)),
    (1646831127, ProtectedBuild(Game::Wildfire)),
    (1814945630, ProtectedBuild(Game::Mall3)),
];

#[rustfmt::skip]
pub const OUTDATED_BUILDS: &[(u32, Game)] = &[
    (3298446386, Game::Ski),
    (2176966923, Game::Extreme),
];

pub fn identify(checksum: u32) -> Identity {
    if let Some(&(_, build)) = KNOWN_BUILDS.iter().find(|(crc, _)| *crc == checksum) {
        return Identity::Supported(build);
    }
    if let Some(&(_, build)) = COPY_PROTECTED_BUILDS.iter().find(|(crc, _)| *crc == checksum) {
        return Identity::CopyProtected(build);
    }
    if let Some(&(_, game)) = OUTDATED_BUILDS.iter().find(|(crc, _)| *crc == checksum) {
        return Identity::Outdated(game);
    }
    Identity::Unrecognized(checksum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    fn all_checksums() -> Vec<u32> {
        KNOWN_BUILDS
            .iter()
            .map(|(crc, _)| *crc)
            .chain(COPY_PROTECTED_BUILDS.iter().map(|(crc, _)| *crc))
            .chain(OUTDATED_BUILDS.iter().map(|(crc, _)| *crc))
            .collect()
    }

    #[test]
    fn test_tables_are_conflict_free() {
        let checksums = all_checksums();
        let unique: HashSet<u32> = checksums.iter().copied().collect();
        assert_eq!(unique.len(), checksums.len());
    }

    #[test]
    fn test_identify_cruise_update3() {
        assert_eq!(identify(3759243516), Identity::Supported(Build::CruiseUpdate3));
    }

    #[test]
    fn test_identify_copy_protected() {
        assert_eq!(
            identify(4056039368),
            Identity::CopyProtected(ProtectedBuild(Game::School))
        );
    }

    #[test]
    fn test_identify_outdated() {
        assert_eq!(identify(2176966923), Identity::Outdated(Game::Extreme));
    }

    #[test]
    fn test_identify_unknown() {
        assert_eq!(identify(0xDEAD_BEEF), Identity::Unrecognized(0xDEAD_BEEF));
    }

    #[test]
    fn test_every_known_checksum_resolves_to_its_row() {
        for &(crc, build) in KNOWN_BUILDS {
            assert_eq!(identify(crc), Identity::Supported(build));
        }
        for &(crc, build) in COPY_PROTECTED_BUILDS {
            assert_eq!(identify(crc), Identity::CopyProtected(build));
        }
    }

    #[test]
    fn test_every_game_has_a_supported_build() {
        for game in Game::iter() {
            assert!(KNOWN_BUILDS.iter().any(|(_, b)| b.game() == game), "{game}");
        }
    }

    #[test]
    fn test_game_display() {
        assert_eq!(Game::Mall3.to_string(), "Mall Tycoon 3");
    }
}
