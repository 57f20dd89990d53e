//! # Difficulty Scale Module
//!
//! Difficulty labels (`"12"`, `"12+"`, ...) form a fixed, totally ordered
//! scale. Every comparison between levels goes through a label's position on
//! that scale, its *difficulty index*.
//!
//! ## Range Resolution
//!
//! A [`LevelRange`] is what a user asks for: an optional lower and an optional
//! upper label. Resolving it against a [`DifficultyScale`] yields a
//! [`ResolvedRange`] of indices:
//!
//! - an *absent* endpoint defaults to the scale's first or last label
//! - a *present but unknown* endpoint is an error, never coerced to a bound
//! - an inverted range (`min` above `max`) is an error
//!
//! ```
//! use kadaikyoku::difficulty::{DifficultyScale, LevelRange};
//!
//! let scale = DifficultyScale::default();
//! let range = scale.resolve(&LevelRange::new(Some("12"), None))?;
//! assert!(range.contains(scale.index_of("14+").unwrap()));
//! assert!(!range.contains(scale.index_of("11+").unwrap()));
//! # Ok::<(), kadaikyoku::difficulty::RangeError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Labels of the standard scale, easiest first.
pub const DEFAULT_LEVELS: [&str; 10] = [
    "10+", "11", "11+", "12", "12+", "13", "13+", "14", "14+", "15",
];

lazy_static::lazy_static! {
    /// Process-wide standard scale built from [`DEFAULT_LEVELS`]
    static ref STANDARD_SCALE: DifficultyScale = DifficultyScale::index_labels(
        DEFAULT_LEVELS.iter().map(ToString::to_string).collect()
    );
}

/// Reasons a list of labels cannot form a scale
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScaleError {
    #[error("difficulty scale has no labels")]
    Empty,

    #[error("difficulty label at position {position} is empty")]
    EmptyLabel { position: usize },

    #[error("difficulty label `{0}` appears more than once")]
    Duplicate(String),
}

/// Reasons a requested [`LevelRange`] cannot be resolved
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("unknown difficulty label `{0}`")]
    UnknownLabel(String),

    #[error("minimum `{min}` is above maximum `{max}`")]
    Inverted { min: String, max: String },
}

/// Ordered sequence of unique difficulty labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DifficultyScale {
    labels: Vec<String>,
    positions: HashMap<String, usize>,
}

impl DifficultyScale {
    /// Build a scale from labels ordered easiest first.
    ///
    /// Labels are trimmed. Rejects an empty list, empty labels and duplicates.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, ScaleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = Vec::new();
        for (position, label) in labels.into_iter().enumerate() {
            let label = label.as_ref().trim();
            if label.is_empty() {
                return Err(ScaleError::EmptyLabel { position });
            }
            if seen.iter().any(|known: &String| known == label) {
                return Err(ScaleError::Duplicate(label.to_string()));
            }
            seen.push(label.to_string());
        }

        if seen.is_empty() {
            return Err(ScaleError::Empty);
        }

        Ok(Self::index_labels(seen))
    }

    /// Parse a comma separated list such as `"10+,11,11+"`.
    pub fn parse_list(list: &str) -> Result<Self, ScaleError> {
        Self::from_labels(list.split(','))
    }

    /// The shared standard scale.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD_SCALE
    }

    // Callers guarantee `labels` is non-empty and duplicate free.
    fn index_labels(labels: Vec<String>) -> Self {
        let positions = labels
            .iter()
            .enumerate()
            .map(|(index, label)| (label.clone(), index))
            .collect();
        Self { labels, positions }
    }

    /// Difficulty index of `label`, or `None` when it is not on the scale.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.positions.contains_key(label)
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index of the easiest label.
    #[must_use]
    pub const fn first_index(&self) -> usize {
        0
    }

    /// Index of the hardest label.
    #[must_use]
    pub fn last_index(&self) -> usize {
        self.labels.len().saturating_sub(1)
    }

    /// Resolve user supplied endpoints into an inclusive index range.
    ///
    /// # Errors
    ///
    /// [`RangeError::UnknownLabel`] when a present endpoint is not on the
    /// scale, [`RangeError::Inverted`] when the resolved minimum lies above
    /// the resolved maximum.
    pub fn resolve(&self, range: &LevelRange) -> Result<ResolvedRange, RangeError> {
        let min = self.resolve_endpoint(range.min.as_deref(), self.first_index())?;
        let max = self.resolve_endpoint(range.max.as_deref(), self.last_index())?;

        if min > max {
            return Err(RangeError::Inverted {
                min: self.labels[min].clone(),
                max: self.labels[max].clone(),
            });
        }

        Ok(ResolvedRange { min, max })
    }

    fn resolve_endpoint(&self, label: Option<&str>, default: usize) -> Result<usize, RangeError> {
        match label {
            None => Ok(default),
            Some(label) => self
                .index_of(label)
                .ok_or_else(|| RangeError::UnknownLabel(label.to_string())),
        }
    }

    /// Whether `label` lies within `[min, max]`, absent endpoints meaning the
    /// scale bounds.
    ///
    /// Never fails: an unknown `label`, `min` or `max` simply yields `false`.
    #[must_use]
    pub fn is_within_range(&self, label: &str, min: Option<&str>, max: Option<&str>) -> bool {
        let range = LevelRange::new(min, max);
        match (self.index_of(label), self.resolve(&range)) {
            (Some(index), Ok(resolved)) => resolved.contains(index),
            // An inverted range contains nothing; unknown labels match nothing.
            _ => false,
        }
    }
}

impl Default for DifficultyScale {
    fn default() -> Self {
        STANDARD_SCALE.clone()
    }
}

impl TryFrom<Vec<String>> for DifficultyScale {
    type Error = ScaleError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_labels(labels)
    }
}

impl From<DifficultyScale> for Vec<String> {
    fn from(scale: DifficultyScale) -> Self {
        scale.labels
    }
}

impl fmt::Display for DifficultyScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.labels.join(", "))
    }
}

/// Requested level bounds as typed by a user; either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRange {
    pub min: Option<String>,
    pub max: Option<String>,
}

impl LevelRange {
    #[must_use]
    pub fn new(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min: min.map(str::to_string),
            max: max.map(str::to_string),
        }
    }

    /// The whole scale.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for LevelRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}〜{}",
            self.min.as_deref().unwrap_or(""),
            self.max.as_deref().unwrap_or("")
        )
    }
}

/// Inclusive range of difficulty indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub min: usize,
    pub max: usize,
}

impl ResolvedRange {
    #[must_use]
    pub const fn contains(&self, index: usize) -> bool {
        self.min <= index && index <= self.max
    }
}
