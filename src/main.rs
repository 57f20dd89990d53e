//! # Kadaikyoku - Practice Song Picker
//!
//! Picks practice songs ("課題曲") from a static catalog ranked by
//! difficulty. Answers one request from the command line, or serves chat
//! commands read from standard input.
//!
//! ## Usage
//!
//! ```bash
//! # Any song
//! kadaikyoku song
//!
//! # A song between 12 and 13
//! kadaikyoku level --min 12 --max 13
//!
//! # Three songs of rising difficulty, 12+ and up
//! kadaikyoku course --min 12+
//!
//! # Chat mode, only answering the practice channel
//! kadaikyoku serve --channel 課題曲bot
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use kadaikyoku::bot::{Bot, BotCommand};
use kadaikyoku::catalog::Catalog;
use kadaikyoku::config::BotConfig;
use kadaikyoku::{cli, completion};
use log::{debug, info};
use std::io::{self, Write};
use std::sync::Arc;

/// Main entry point for Kadaikyoku.
///
/// Initializes logging, parses command-line arguments, loads the catalog and
/// routes the command. A catalog that cannot be loaded ends the process with
/// an error; request outcomes never do.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug kadaikyoku serve` - Enable debug logging
/// - `RUST_LOG=kadaikyoku::catalog=warn kadaikyoku check` - Report skipped lines
fn main() -> Result<()> {
    // Initialize environment logger for debugging and monitoring
    env_logger::init();

    let args = cli::Args::parse();

    // Commands that never touch the catalog
    match &args.command {
        cli::Command::Completion { shell } => {
            completion::write_completions(*shell, &mut cli::Args::command(), &mut io::stdout().lock())?;
            return Ok(());
        }
        cli::Command::CompleteLevels => {
            let config = BotConfig::from_args(&args)?;
            completion::write_level_completions(&config.scale, &mut io::stdout().lock())?;
            return Ok(());
        }
        _ => {}
    }

    let config = BotConfig::from_args(&args)?;
    debug!("Configuration: {}", serde_json::to_string(&config)?);

    let catalog = Catalog::load(&config.catalog_path, &config.scale)
        .context("Cannot start without a song catalog")?;
    let bot = Bot::new(Arc::new(catalog), config.scale.clone())
        .with_allowed_channel(config.allowed_channel.clone());
    let mut rng = config.random_source();

    let command = match args.command {
        cli::Command::Song => BotCommand::Song,
        cli::Command::Level { range } => BotCommand::Level(range.into()),
        cli::Command::Course { range } => BotCommand::Course(range.into()),
        cli::Command::Serve => {
            info!("Serving chat commands from standard input");
            let stdin = io::stdin();
            bot.serve(stdin.lock(), io::stdout().lock(), rng.as_mut())?;
            return Ok(());
        }
        cli::Command::Check { normalize } => {
            check_catalog(&bot, normalize)?;
            return Ok(());
        }
        cli::Command::Completion { .. } | cli::Command::CompleteLevels => return Ok(()),
    };

    let text = if args.json {
        serde_json::to_string_pretty(&bot.answer_json(&command, rng.as_mut()))?
    } else {
        bot.answer(&command, rng.as_mut())
    };

    println!("{text}");
    Ok(())
}

/// Print a per-level summary of the loaded catalog, or the catalog itself in
/// canonical form.
fn check_catalog(bot: &Bot, normalize: bool) -> Result<()> {
    let mut out = io::stdout().lock();

    if normalize {
        write!(out, "{}", bot.catalog().to_records())?;
        return Ok(());
    }

    writeln!(out, "{} songs on scale {}", bot.catalog().len(), bot.scale())?;
    for (label, count) in bot.catalog().level_counts(bot.scale()) {
        writeln!(out, "{label:>5}  {count}")?;
    }
    Ok(())
}
