//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `kadaikyoku` binary. One-shot commands
//! answer a single request and exit; `serve` answers chat messages from
//! standard input until it closes.
//!
//! ## Commands
//!
//! - `song`: Recommend any song from the catalog
//! - `level`: Recommend a song within a level range
//! - `course`: Build a three song course of non-decreasing difficulty
//! - `serve`: Answer `/song`, `/level` and `/course` messages line by line
//! - `check`: Validate the catalog and summarise it per level
//!
//! ## Examples
//!
//! ```bash
//! kadaikyoku --catalog songs.txt level --min 12 --max 13
//! kadaikyoku course --min 12+
//! echo "/course 12 14" | kadaikyoku serve
//! ```

use crate::difficulty::LevelRange;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Catalog and scale options are global so they can follow any subcommand.
#[derive(Parser, Debug)]
#[command(name = "kadaikyoku")]
#[command(about = "Kadaikyoku: random practice songs and courses from a difficulty-ranked catalog")]
#[command(version)]
pub struct Args {
    /// Song catalog file (`title,level` or `"title","level"` per line)
    #[arg(long, global = true, env = "KADAIKYOKU_CATALOG", value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Comma separated difficulty labels, easiest first
    #[arg(long, global = true, env = "KADAIKYOKU_LEVELS", value_name = "LABELS")]
    pub levels: Option<String>,

    /// Only answer messages tagged with this channel (serve mode)
    #[arg(long, global = true, env = "KADAIKYOKU_CHANNEL", value_name = "NAME")]
    pub channel: Option<String>,

    /// Seed the random source for reproducible picks
    #[arg(long, global = true, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Print replies as JSON instead of chat text
    #[arg(long, global = true)]
    pub json: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Optional level bounds shared by `level` and `course`
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Easiest level to include (defaults to the bottom of the scale)
    #[arg(long, value_name = "LEVEL")]
    pub min: Option<String>,

    /// Hardest level to include (defaults to the top of the scale)
    #[arg(long, value_name = "LEVEL")]
    pub max: Option<String>,
}

impl From<RangeArgs> for LevelRange {
    fn from(args: RangeArgs) -> Self {
        Self {
            min: args.min,
            max: args.max,
        }
    }
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend one song from the whole catalog
    Song,

    /// Recommend one song within a level range
    ///
    /// Unknown labels and ranges whose minimum is above their maximum are
    /// reported instead of silently matching nothing.
    Level {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Build a course of three songs with non-decreasing difficulty
    ///
    /// Candidates are shuffled once and walked once; an unlucky shuffle can
    /// fail even when a course exists, so simply ask again.
    Course {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Answer chat commands read from standard input
    ///
    /// Each input line is a message such as `#channel /level 12 13`. Replies
    /// are written to standard output separated by blank lines.
    Serve,

    /// Validate the catalog and print how many songs each level has
    Check {
        /// Print the catalog in canonical `"title","level"` form instead
        #[arg(long)]
        normalize: bool,
    },

    /// Generate shell completions
    ///
    /// Bash and fish scripts also complete `--min`/`--max` with the labels of
    /// the configured scale.
    ///
    /// Usage: kadaikyoku completion bash > ~/.local/share/bash-completion/completions/kadaikyoku
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List difficulty labels for `--min`/`--max` completion (hidden command)
    #[command(hide = true)]
    CompleteLevels,
}
