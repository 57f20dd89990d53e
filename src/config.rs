//! # Configuration Module
//!
//! Resolves where the song catalog lives and which difficulty scale, channel
//! filter and random source the bot runs with.
//!
//! ## Catalog Location
//!
//! The first of these that applies is used:
//! 1. `--catalog` or `KADAIKYOKU_CATALOG`
//! 2. `songs.txt` in the working directory
//! 3. `songs.txt` in the platform data directory:
//!    - Linux: `~/.local/share/kadaikyoku/`
//!    - macOS: `~/Library/Application Support/kadaikyoku/`
//!    - Windows: `%APPDATA%\kadaikyoku\`
//!
//! When no candidate exists the working directory path is returned anyway, so
//! loading fails with a message naming the file that was expected.

use crate::cli::Args;
use crate::difficulty::DifficultyScale;
use crate::selector::{RandomSource, RngSource};
use anyhow::{Context, Result};
use log::debug;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default catalog file name.
pub const CATALOG_FILE_NAME: &str = "songs.txt";

/// Returns the platform-appropriate data directory for Kadaikyoku.
///
/// Unlike a writable cache this directory is only read from, so it is not
/// created here.
///
/// # Errors
///
/// Fails when the platform has no standard data directory.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Pass --catalog to name the song list explicitly."
        )
    })?;

    Ok(data_dir.join("kadaikyoku"))
}

/// Places searched for the catalog when none is given, in order.
#[must_use]
pub fn catalog_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CATALOG_FILE_NAME)];
    if let Ok(data_dir) = get_data_dir() {
        candidates.push(data_dir.join(CATALOG_FILE_NAME));
    }
    candidates
}

/// Pick the catalog file to load, as an absolute path.
///
/// # Errors
///
/// Fails only when the working directory cannot be determined.
pub fn resolve_catalog_path(explicit: Option<&Path>) -> Result<PathBuf> {
    let chosen = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let candidates = catalog_candidates();
            candidates
                .iter()
                .find(|path| path.is_file())
                .cloned()
                .unwrap_or_else(|| PathBuf::from(CATALOG_FILE_NAME))
        }
    };

    let absolute = chosen
        .absolutize()
        .with_context(|| format!("Failed to resolve catalog path {}", chosen.display()))?
        .into_owned();

    debug!("Using catalog {}", absolute.display());
    Ok(absolute)
}

/// Everything the bot needs at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// Catalog file to load
    pub catalog_path: PathBuf,
    /// Difficulty labels, easiest first
    pub scale: DifficultyScale,
    /// Only answer messages tagged with this channel
    pub allowed_channel: Option<String>,
    /// Fixed RNG seed for reproducible picks
    pub seed: Option<u64>,
}

impl BotConfig {
    /// Build configuration from parsed command-line arguments.
    ///
    /// # Errors
    ///
    /// Fails on an invalid `--levels` list or an unresolvable catalog path.
    pub fn from_args(args: &Args) -> Result<Self> {
        let scale = match &args.levels {
            Some(list) => DifficultyScale::parse_list(list)
                .with_context(|| format!("Invalid difficulty scale `{list}`"))?,
            None => DifficultyScale::default(),
        };

        Ok(Self {
            catalog_path: resolve_catalog_path(args.catalog.as_deref())?,
            scale,
            allowed_channel: args.channel.clone(),
            seed: args.seed,
        })
    }

    /// Random source for request handling: seeded when a seed is configured.
    #[must_use]
    pub fn random_source(&self) -> Box<dyn RandomSource> {
        match self.seed {
            Some(seed) => Box::new(RngSource::seeded(seed)),
            None => Box::new(RngSource::thread()),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from(CATALOG_FILE_NAME),
            scale: DifficultyScale::default(),
            allowed_channel: None,
            seed: None,
        }
    }
}
