mod checksum;
mod display;
mod error;
mod identity;
mod laa;
mod layout;
mod patcher;
mod prompt;
mod protection;
mod recipe;
mod resolution;
mod substitute;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use strum::IntoEnumIterator;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG: &str = "tycoon_patch=info";

use crate::error::Error;
use crate::identity::{Build, Game};
use crate::patcher::{Outcome, PatchOptions};
use crate::prompt::StdinConfirm;
use crate::resolution::Resolution;

/// Replaces the 1280x960 mode of several early-2000s tycoon games with a
/// widescreen resolution and fixes their HUD to match.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Run it from the game folder to use your screen's resolution.\n\
Don't forget to select 1280x960 in the game's options afterwards.")]
struct Cli {
    /// Path to the game executable and/or a resolution such as 1920x1080, in any order
    #[arg(value_name = "GAME.exe|WIDTHxHEIGHT")]
    targets: Vec<String>,

    /// Restore the executable from its backup and reset the game's settings
    #[arg(short, long)]
    restore: bool,

    /// Use the full resolution in Cruise Ship Tycoon's menu too (it may get cropped)
    #[arg(short = 'w', long = "wide_menu", alias = "wide-menu")]
    wide_menu: bool,

    /// Use the 4:3 resolution closest to the chosen one
    #[arg(short, long)]
    letterbox: bool,

    /// Force the LAA fix (4GB patch) on or off; on by default from 2560x1440
    #[arg(long = "lla", alias = "laa", value_name = "BOOL", require_equals = true)]
    laa: Option<bool>,

    /// List the supported games
    #[arg(short, long)]
    games: bool,

    /// Fail instead of skipping byte patterns that are not found
    #[arg(long)]
    strict: bool,
}

/// Sort positional tokens into the executable path and the resolution.
fn classify(tokens: &[String]) -> Result<(Option<PathBuf>, Option<Resolution>)> {
    let mut path = None;
    let mut resolution = None;

    for token in tokens {
        if token.to_ascii_lowercase().ends_with(".exe") {
            if path.replace(PathBuf::from(token)).is_some() {
                bail!("More than one executable given");
            }
        } else if let Ok(parsed) = token.parse::<Resolution>() {
            if resolution.replace(parsed).is_some() {
                bail!("More than one resolution given");
            }
        } else {
            bail!("Unexpected argument '{}', expected GAME.exe or WIDTHxHEIGHT", token);
        }
    }

    Ok((path, resolution))
}

fn print_games() {
    println!("List of supported games:");
    for game in Game::iter() {
        if game == Game::Ski {
            println!("    - {} ({}), LAA fix only", game, game.release_year());
        } else {
            println!(
                "    - {} ({}), replaces 1280x960 resolution",
                game,
                game.release_year()
            );
        }
    }
}

/// `RUST_LOG` wins when it parses; otherwise info for this crate only.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG))
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .without_time()
        .with_target(false)
        .init();

    let cli = Cli::parse();

    if cli.games {
        print_games();
        return Ok(());
    }

    let (path, resolution) = classify(&cli.targets)?;
    let path = match path {
        Some(path) => path,
        None => patcher::locate(Path::new(".")).context("Game is not found!")?,
    };

    if cli.restore {
        patcher::restore(&path).with_context(|| format!("Could not restore {}", path.display()))?;
        info!("Backup restored");
        return Ok(());
    }

    let options = PatchOptions {
        resolution,
        letterbox: cli.letterbox,
        wide_menu: cli.wide_menu,
        laa: cli.laa,
        strict: cli.strict,
        ..PatchOptions::new(path)
    };

    let now = Instant::now();
    let result = patcher::run(&options, &StdinConfirm);
    match &result {
        Err(Error::OutdatedBuild { game }) => {
            if let Some(hint) = game.update_hint() {
                warn!("{}", hint);
            }
        }
        Err(e) if e.is_not_found() => {
            warn!("Run the patch from the game folder or pass the path to the game's executable");
        }
        _ => {}
    }

    match result.with_context(|| format!("Could not patch {}", options.path.display()))? {
        Outcome::Patched(summary) => {
            info!(
                "File has been patched successfully: {}{} ({} edits in {:?})",
                summary.targets.game,
                if summary.laa { " with LAA fix" } else { "" },
                summary.replaced,
                now.elapsed()
            );
            if summary.build != Build::Ski {
                info!("Don't forget to set game resolution to 1280x960 in options!");
            }
        }
        Outcome::ProtectionRemoved(game) => {
            info!("Disk check was removed");
            info!("Re-run this patch to change the resolution of {}", game);
        }
        Outcome::Declined => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tracing::level_filters::LevelFilter;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_classify_any_order() {
        let (path, resolution) = classify(&tokens(&["2560x1440", "games/SRE.EXE"])).unwrap();
        assert_eq!(path, Some(PathBuf::from("games/SRE.EXE")));
        assert_eq!(resolution, Some(Resolution::new(2560, 1440)));
    }

    #[test]
    fn test_classify_nothing() {
        assert_eq!(classify(&[]).unwrap(), (None, None));
    }

    #[test]
    fn test_classify_rejects_junk() {
        assert!(classify(&tokens(&["readme.txt"])).is_err());
        assert!(classify(&tokens(&["1920x1080", "1280x720"])).is_err());
    }

    #[test]
    fn test_log_filter_honors_rust_log() {
        let filter = log_filter(Some("tycoon_patch=debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = log_filter(Some("trace"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn test_log_filter_defaults_to_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(Some("tycoon_patch=loud")).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from(["tycoon-patch", "SC.exe", "-l", "--wide_menu", "--lla=false"]).unwrap();
        assert!(cli.letterbox);
        assert!(cli.wide_menu);
        assert_eq!(cli.laa, Some(false));
        assert!(!cli.restore);

        let cli = Cli::try_parse_from(["tycoon-patch", "--lla=true", "-r"]).unwrap();
        assert_eq!(cli.laa, Some(true));
        assert!(cli.restore);
        assert!(cli.targets.is_empty());
    }
}
