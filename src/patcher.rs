use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::checksum::checksum_file;
use crate::display;
use crate::error::{Error, Result};
use crate::identity::{identify, Build, Game, Identity, ProtectedBuild};
use crate::laa;
use crate::prompt::Confirm;
use crate::protection;
use crate::recipe::{self, Targets};
use crate::resolution::Resolution;
use crate::substitute::{apply, ApplyReport, Edit};

const SETTINGS_FILE: &str = "settings.dat";

/// Everything a run needs, fixed before the first file is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOptions {
    pub path: PathBuf,
    /// `None` means the primary display's resolution.
    pub resolution: Option<Resolution>,
    pub letterbox: bool,
    pub wide_menu: bool,
    /// Explicit `--lla=true|false`.
    pub laa: Option<bool>,
    pub strict: bool,
}

impl PatchOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            resolution: None,
            letterbox: false,
            wide_menu: false,
            laa: None,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSummary {
    pub build: Build,
    pub targets: Targets,
    pub laa: bool,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Patched(PatchSummary),
    ProtectionRemoved(Game),
    Declined,
}

/// `<path><suffix>`, keeping the original extension.
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, ".bak")
}

pub fn original_path(path: &Path) -> PathBuf {
    sibling(path, ".orig")
}

fn settings_path(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) => dir.join(SETTINGS_FILE),
        None => PathBuf::from(SETTINGS_FILE),
    }
}

/// First known executable present in `dir`.
pub fn locate(dir: &Path) -> Result<PathBuf> {
    Game::iter()
        .map(|game| dir.join(game.executable()))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::GameNotFound(dir.to_path_buf()))
}

/// Identify the file at `options.path` and run whichever operation its build
/// calls for.
pub fn run(options: &PatchOptions, confirm: &dyn Confirm) -> Result<Outcome> {
    if !options.path.is_file() {
        return Err(Error::GameNotFound(options.path.clone()));
    }

    let checksum = checksum_file(&options.path)?;
    debug!("CRC of {}: {}", options.path.display(), checksum);

    match identify(checksum) {
        Identity::Supported(build) => patch(options, build).map(Outcome::Patched),
        Identity::CopyProtected(build) => remove_protection(options, build, confirm),
        Identity::Outdated(game) => Err(Error::OutdatedBuild { game }),
        Identity::Unrecognized(checksum) => Err(Error::UnrecognizedBuild { checksum }),
    }
}

/// Read `path`, apply `plan` and write the result back. Nothing is written
/// when the plan fails.
fn rewrite(path: &Path, plan: &[Edit], strict: bool) -> Result<(Vec<u8>, ApplyReport)> {
    let mut image = fs::read(path)?;
    let report = apply(&mut image, plan, strict)?;
    for label in report.missed() {
        debug!("Pattern not found, skipped: {}", label);
    }
    fs::write(path, &image)?;
    Ok((image, report))
}

/// Apply the resolution recipe of `build`, backing the file up first.
pub fn patch(options: &PatchOptions, build: Build) -> Result<PatchSummary> {
    let game = build.game();
    info!("Found {} ({})", game, game.release_year());
    if !build.is_latest() {
        info!("FYI: this is not the latest version of the game. The patch works as is, but you may want to update and patch again.");
    }

    let requested = match options.resolution {
        Some(resolution) => {
            info!("Using custom resolution");
            resolution
        }
        None => display::primary_resolution()?,
    };
    let targets = Targets::resolve(requested, options.letterbox, options.wide_menu);

    info!("Changing resolution to {}", targets.game);
    warn_if_untested(targets.game, game);
    if game == Game::Cruise {
        info!("Changing menu resolution to {}", targets.menu);
        if options.wide_menu {
            warn!("Menu will likely get cropped!");
        } else {
            warn_if_untested(targets.menu, game);
        }
    } else if options.wide_menu {
        warn!("--wide_menu only affects {}, ignoring it", Game::Cruise);
    }

    let laa = laa::should_enable(targets.game, options.laa);
    let mut plan = Vec::new();
    if laa {
        info!("LAA fix for better stability");
        plan.push(laa::edit());
    } else if targets.game.is_large() {
        warn!("LAA fix is disabled, things may be unstable");
    }
    plan.extend(recipe::plan(build, &targets));
    if build == Build::Ski {
        warn!("No resolution patch is known for {}, only the LAA fix is applied", game);
    }

    info!("Making a backup");
    fs::copy(&options.path, backup_path(&options.path))?;

    info!("Patching the game");
    let (image, report) = rewrite(&options.path, &plan, options.strict)?;

    if laa {
        match laa::large_address_aware(&image) {
            Some(flag) => info!("Large address aware: {}", flag),
            None => info!("Large address awareness could not be verified"),
        }
    }

    Ok(PatchSummary {
        build,
        targets,
        laa,
        replaced: report.total(),
    })
}

fn warn_if_untested(resolution: Resolution, game: Game) {
    if !resolution.is_tested_for(game) {
        warn!(
            "NOTE: {} resolution was not tested, it might or might not work.",
            resolution
        );
    }
}

/// Strip the disk check of a copy-protected build after the user agrees.
/// The untouched file is kept as `<path>.orig`.
pub fn remove_protection(
    options: &PatchOptions,
    build: ProtectedBuild,
    confirm: &dyn Confirm,
) -> Result<Outcome> {
    let game = build.0;
    warn!("This version of {} requires the CD to play the game.", game);
    if !confirm.confirm("Remove the disk check?") {
        info!("Disk check was left in place");
        return Ok(Outcome::Declined);
    }

    let original = original_path(&options.path);
    fs::copy(&options.path, &original)?;
    info!("Original executable is saved to \"{}\"", original.display());

    let plan = protection::plan(build);
    let image = fs::read(&options.path)?;
    for change in protection::describe(&image, &plan) {
        debug!(
            "{:#x}: {:?} -> {:?} ({})",
            change.offset, change.before, change.after, change.description
        );
    }

    info!("Removing disk check");
    rewrite(&options.path, &plan, options.strict)?;

    Ok(Outcome::ProtectionRemoved(game))
}

/// Put the backup back in place and drop the game's saved settings, which may
/// reference the patched resolution.
pub fn restore(path: &Path) -> Result<()> {
    let backup = backup_path(path);
    if !backup.is_file() {
        return Err(Error::BackupMissing(backup));
    }

    let settings = settings_path(path);
    if settings.is_file() {
        info!("Resetting settings");
        fs::remove_file(&settings)?;
    }

    info!("Restoring backup");
    fs::copy(&backup, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    struct Answer {
        yes: bool,
        asked: Cell<bool>,
    }

    impl Answer {
        fn new(yes: bool) -> Self {
            Self {
                yes,
                asked: Cell::new(false),
            }
        }
    }

    impl Confirm for Answer {
        fn confirm(&self, _message: &str) -> bool {
            self.asked.set(true);
            self.yes
        }
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[rustfmt::skip]
    fn mall3_image() -> Vec<u8> {
        let parts: [&[u8]; 4] = [
            b"MZ-ish header ",
            &[0x4C, 0x01, 0x0F, 0x01, 0x0B, 0x01],
            &[0xC7, 0x40, 0x28, 0x00, 0x05, 0x00, 0x00, 0xC7, 0x40, 0x2C, 0xC0, 0x03, 0x00, 0x00],
            &[0x74, 0x0E, 0x3D, 0x00, 0x05, 0x00, 0x00],
        ];
        parts.concat()
    }

    fn options(path: &Path, width: u32, height: u32) -> PatchOptions {
        PatchOptions {
            resolution: Some(Resolution::new(width, height)),
            ..PatchOptions::new(path)
        }
    }

    #[test]
    fn test_sibling_paths_keep_extension() {
        let path = Path::new("games/SRE.exe");
        assert_eq!(backup_path(path), PathBuf::from("games/SRE.exe.bak"));
        assert_eq!(original_path(path), PathBuf::from("games/SRE.exe.orig"));
    }

    #[test]
    fn test_settings_path_next_to_executable() {
        assert_eq!(
            settings_path(Path::new("games/SRE.exe")),
            PathBuf::from("games/settings.dat")
        );
        assert_eq!(settings_path(Path::new("SRE.exe")), PathBuf::from("settings.dat"));
    }

    #[test]
    fn test_locate_known_executable() {
        let dir = tempdir().unwrap();
        assert!(matches!(locate(dir.path()), Err(Error::GameNotFound(_))));

        fs::write(dir.path().join("Mall3Game.exe"), b"x").unwrap();
        fs::write(dir.path().join("SRE.exe"), b"x").unwrap();
        assert_eq!(locate(dir.path()).unwrap(), dir.path().join("SRE.exe"));
    }

    #[test]
    fn test_run_missing_file() {
        let dir = tempdir().unwrap();
        let opts = PatchOptions::new(dir.path().join("SRE.exe"));
        let err = run(&opts, &Answer::new(true)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_run_unrecognized_build_leaves_file_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SRE.exe");
        fs::write(&path, b"definitely not a known build").unwrap();

        let err = run(&options(&path, 1920, 1080), &Answer::new(true)).unwrap_err();

        assert!(matches!(err, Error::UnrecognizedBuild { .. }));
        assert!(!backup_path(&path).exists());
        assert_eq!(fs::read(&path).unwrap(), b"definitely not a known build");
    }

    #[test]
    fn test_patch_large_resolution_enables_laa() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Mall3Game.exe");
        let original = mall3_image();
        fs::write(&path, &original).unwrap();

        let summary = patch(&options(&path, 2560, 1440), Build::Mall3).unwrap();
        let patched = fs::read(&path).unwrap();

        assert!(summary.laa);
        assert!(contains(&patched, &[0x2F, 0x01, 0x0B, 0x01]));
        assert!(contains(&patched, &[0xC7, 0x40, 0x28, 0x00, 0x0A, 0x00, 0x00]));
        assert!(contains(&patched, &[0x74, 0x0E, 0x3D, 0x00, 0x0A, 0x00, 0x00]));
        assert_eq!(fs::read(backup_path(&path)).unwrap(), original);
        assert_eq!(patched.len(), original.len());
    }

    #[test]
    fn test_patch_1080p_leaves_laa_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Mall3Game.exe");
        fs::write(&path, mall3_image()).unwrap();

        let summary = patch(&options(&path, 1920, 1080), Build::Mall3).unwrap();
        let patched = fs::read(&path).unwrap();

        assert!(!summary.laa);
        assert!(contains(&patched, &[0x0F, 0x01, 0x0B, 0x01]));
        assert!(!contains(&patched, &[0x2F, 0x01, 0x0B, 0x01]));
    }

    #[test]
    fn test_patch_laa_forced_off() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Mall3Game.exe");
        fs::write(&path, mall3_image()).unwrap();

        let opts = PatchOptions {
            laa: Some(false),
            ..options(&path, 3840, 2160)
        };
        let summary = patch(&opts, Build::Mall3).unwrap();

        assert!(!summary.laa);
        assert!(!contains(&fs::read(&path).unwrap(), &[0x2F, 0x01, 0x0B, 0x01]));
    }

    #[test]
    fn test_strict_patch_does_not_write_on_missing_pattern() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Mall3Game.exe");
        // no hud compare sites
        let original = mall3_image()[..34].to_vec();
        fs::write(&path, &original).unwrap();

        let opts = PatchOptions {
            strict: true,
            ..options(&path, 1920, 1080)
        };
        let err = patch(&opts, Build::Mall3).unwrap_err();

        assert!(matches!(err, Error::PatternNotFound { .. }));
        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(backup_path(&path).exists());
    }

    #[test]
    fn test_restore_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Mall3Game.exe");
        let settings = dir.path().join(SETTINGS_FILE);
        let original = mall3_image();
        fs::write(&path, &original).unwrap();

        patch(&options(&path, 2560, 1440), Build::Mall3).unwrap();
        fs::write(&settings, b"resolution").unwrap();
        assert_ne!(fs::read(&path).unwrap(), original);

        restore(&path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!settings.exists());
    }

    #[test]
    fn test_restore_works_without_executable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SRE.exe");
        fs::write(backup_path(&path), b"backup").unwrap();

        restore(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"backup");
    }

    #[test]
    fn test_restore_without_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SRE.exe");
        fs::write(&path, b"exe").unwrap();

        assert!(matches!(restore(&path), Err(Error::BackupMissing(_))));
        assert_eq!(fs::read(&path).unwrap(), b"exe");
    }

    #[test]
    fn test_remove_protection_declined() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SkiGame.exe");
        let original = vec![0x55, 0x74, 0x20, 0x6A, 0x15, 0xC3];
        fs::write(&path, &original).unwrap();

        let answer = Answer::new(false);
        let outcome = remove_protection(&PatchOptions::new(&path), ProtectedBuild(Game::Ski), &answer).unwrap();

        assert!(answer.asked.get());
        assert_eq!(outcome, Outcome::Declined);
        assert_eq!(fs::read(&path).unwrap(), original);
        assert!(!original_path(&path).exists());
    }

    #[test]
    fn test_remove_protection_confirmed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("SkiGame.exe");
        let original = vec![0x55, 0x74, 0x20, 0x6A, 0x15, 0xC3];
        fs::write(&path, &original).unwrap();

        let outcome = remove_protection(
            &PatchOptions::new(&path),
            ProtectedBuild(Game::Ski),
            &Answer::new(true),
        )
        .unwrap();

        assert_eq!(outcome, Outcome::ProtectionRemoved(Game::Ski));
        assert_eq!(fs::read(&path).unwrap(), vec![0x55, 0xEB, 0x20, 0x6A, 0x15, 0xC3]);
        assert_eq!(fs::read(original_path(&path)).unwrap(), original);
        assert!(!backup_path(&path).exists());
    }
}
