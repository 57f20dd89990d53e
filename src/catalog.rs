//! # Song Catalog Module
//!
//! Loads the static list of practice songs the bot picks from. The catalog is
//! read once at startup and never written back.
//!
//! ## File Format
//!
//! UTF-8 text, one song per line, in either of two shapes:
//!
//! ```text
//! "Title, with comma","12+"
//! Plain Title,13
//! ```
//!
//! The quoted shape is canonical and is what [`Song::to_record`] writes. In the
//! bare shape the level follows the *last* comma, so titles may contain
//! commas. Blank lines are ignored, and so are `#` lines without a comma:
//! titles such as `#fairy_dancing_in_lake` are ordinary records. Any other
//! line that does not yield a title and a level on the scale is skipped with
//! a warning.

use crate::difficulty::{DifficultyScale, ResolvedRange};
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// A single catalog entry. Titles identify songs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub level: String,
}

impl Song {
    pub fn new(title: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            level: level.into(),
        }
    }

    /// Render as a canonical quoted record line.
    #[must_use]
    pub fn to_record(&self) -> String {
        format!("{},{}", quote(&self.title), quote(&self.level))
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}（{}）", self.title, self.level)
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Why a single line did not produce a song
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("no comma between title and level")]
    MissingSeparator,

    #[error("title is empty")]
    EmptyTitle,

    #[error("level is empty")]
    EmptyLevel,

    #[error("quoted field is not terminated")]
    UnterminatedQuote,

    #[error("unexpected text after level: `{0}`")]
    TrailingText(String),

    #[error("level `{0}` is not on the difficulty scale")]
    UnknownLevel(String),
}

/// Parse one non-blank line into a song, without consulting the scale.
pub fn parse_record(line: &str) -> Result<Song, RecordError> {
    let line = line.trim();

    let (title, level) = if line.starts_with('"') {
        parse_quoted(line)?
    } else {
        let (title, level) = line.rsplit_once(',').ok_or(RecordError::MissingSeparator)?;
        (title.trim().to_string(), level.trim().to_string())
    };

    if title.is_empty() {
        return Err(RecordError::EmptyTitle);
    }
    if level.is_empty() {
        return Err(RecordError::EmptyLevel);
    }

    Ok(Song { title, level })
}

/// `"title","level"` with `""` escapes; the level may also be left bare.
fn parse_quoted(line: &str) -> Result<(String, String), RecordError> {
    let (title, rest) = take_quoted(line)?;
    let rest = rest
        .trim_start()
        .strip_prefix(',')
        .ok_or(RecordError::MissingSeparator)?
        .trim();

    let (level, trailing) = if rest.starts_with('"') {
        let (level, trailing) = take_quoted(rest)?;
        (level, trailing.trim())
    } else {
        match rest.split_once(',') {
            Some((level, trailing)) => (level.trim().to_string(), trailing.trim()),
            None => (rest.to_string(), ""),
        }
    };

    if !trailing.is_empty() {
        return Err(RecordError::TrailingText(trailing.to_string()));
    }

    Ok((title.trim().to_string(), level.trim().to_string()))
}

/// Split a leading quoted field off `input`, returning it unescaped.
fn take_quoted(input: &str) -> Result<(String, &str), RecordError> {
    let body = input.strip_prefix('"').ok_or(RecordError::UnterminatedQuote)?;
    let mut field = String::new();
    let mut chars = body.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c != '"' {
            field.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '"'))) {
            chars.next();
            field.push('"');
            continue;
        }
        return Ok((field, &body[offset + 1..]));
    }

    Err(RecordError::UnterminatedQuote)
}

/// Read-only list of songs in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    songs: Vec<Song>,
}

impl Catalog {
    #[must_use]
    pub fn from_songs(songs: Vec<Song>) -> Self {
        Self { songs }
    }

    /// Parse catalog text, keeping only lines that form a song on `scale`.
    ///
    /// Never fails; rejected lines are logged and dropped whole.
    #[must_use]
    pub fn parse(text: &str, scale: &DifficultyScale) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut songs = Vec::new();

        for (number, line) in text.lines().enumerate().map(|(i, line)| (i + 1, line)) {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') && !trimmed.contains(',') {
                debug!("Catalog line {number} is a comment");
                continue;
            }

            let parsed = parse_record(trimmed).and_then(|song| {
                if scale.contains(&song.level) {
                    Ok(song)
                } else {
                    Err(RecordError::UnknownLevel(song.level))
                }
            });

            match parsed {
                Ok(song) => songs.push(song),
                Err(e) => warn!("Skipping catalog line {number}: {e} (`{trimmed}`)"),
            }
        }

        debug!("Parsed {} songs from catalog text", songs.len());
        Self { songs }
    }

    /// Load the catalog file at `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or contains no usable song. An
    /// empty catalog would answer every request with "no match", so startup
    /// must stop instead.
    pub fn load(path: &Path, scale: &DifficultyScale) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read song catalog at {}", path.display()))?;

        let catalog = Self::parse(&text, scale);
        if catalog.is_empty() {
            bail!(
                "Song catalog at {} contains no valid `title,level` records",
                path.display()
            );
        }

        info!("Loaded {} songs from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Songs whose level falls inside `range`, in catalog order.
    #[must_use]
    pub fn within<'a>(&'a self, scale: &DifficultyScale, range: ResolvedRange) -> Vec<&'a Song> {
        self.songs
            .iter()
            .filter(|song| scale.index_of(&song.level).is_some_and(|index| range.contains(index)))
            .collect()
    }

    /// Number of songs per scale label, easiest first.
    #[must_use]
    pub fn level_counts<'s>(&self, scale: &'s DifficultyScale) -> Vec<(&'s str, usize)> {
        scale
            .labels()
            .iter()
            .map(|label| {
                let count = self.songs.iter().filter(|song| &song.level == label).count();
                (label.as_str(), count)
            })
            .collect()
    }

    /// The whole catalog in canonical record form.
    #[must_use]
    pub fn to_records(&self) -> String {
        self.songs
            .iter()
            .map(|song| song.to_record() + "\n")
            .collect()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a Song;
    type IntoIter = std::slice::Iter<'a, Song>;

    fn into_iter(self) -> Self::IntoIter {
        self.songs.iter()
    }
}
