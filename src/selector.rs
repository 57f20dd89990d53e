//! # Song Selection Module
//!
//! Random picks over a [`Catalog`]:
//!
//! - [`Selector::pick_any`] - one song from the whole catalog
//! - [`Selector::pick_in_range`] - one song within a level range
//! - [`Selector::pick_course`] - three songs of non-decreasing difficulty
//!
//! Selection never mutates the catalog. Randomness comes from a caller owned
//! [`RandomSource`], so each request draws independently and tests can script
//! exact outcomes.
//!
//! ## Course Walk
//!
//! A course is built by shuffling the candidates once and walking the
//! shuffle a single time, keeping a song when its difficulty is not below the
//! last kept song and its title is not already in the course. The walk does
//! not backtrack or retry, so an unlucky shuffle can report
//! [`SelectionError::CourseUnsatisfiable`] even though some ordering of the
//! candidates would have produced a course.

use crate::catalog::{Catalog, Song};
use crate::difficulty::{DifficultyScale, LevelRange, RangeError};
use log::{debug, trace};
use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of songs in a course.
pub const COURSE_LENGTH: usize = 3;

/// Uniform randomness used by the selector.
pub trait RandomSource {
    /// Uniform index in `0..len`. Only called with `len > 0`.
    fn index(&mut self, len: usize) -> usize;

    /// Uniformly random permutation of `0..len`.
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<ThreadRng> {
    /// Thread local generator, seeded by the OS.
    #[must_use]
    pub fn thread() -> Self {
        Self(thread_rng())
    }
}

impl RngSource<StdRng> {
    /// Reproducible generator for a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.0);
        order
    }
}

/// Outcomes that produce no selection. Each is reported to the user
/// differently.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("invalid level range: {0}")]
    RangeInvalid(#[from] RangeError),

    #[error("no songs match the requested range")]
    NoMatch,

    #[error("only {found} songs match the requested range, a course needs {}", COURSE_LENGTH)]
    InsufficientCandidates { found: usize },

    #[error("could not walk {} songs of non-decreasing difficulty out of {candidates} candidates", COURSE_LENGTH)]
    CourseUnsatisfiable { candidates: usize },
}

impl SelectionError {
    /// Stable machine readable name of the outcome.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RangeInvalid(_) => "range_invalid",
            Self::NoMatch => "no_match",
            Self::InsufficientCandidates { .. } => "insufficient_candidates",
            Self::CourseUnsatisfiable { .. } => "course_unsatisfiable",
        }
    }
}

/// Ordered songs of non-decreasing difficulty with distinct titles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    songs: [Song; COURSE_LENGTH],
}

impl Course {
    /// Songs in walk order.
    #[must_use]
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.iter()
    }
}

/// Read-only view over a catalog and the scale its levels live on.
#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
    catalog: &'a Catalog,
    scale: &'a DifficultyScale,
}

impl<'a> Selector<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, scale: &'a DifficultyScale) -> Self {
        Self { catalog, scale }
    }

    /// Songs inside `range`, in catalog order.
    ///
    /// # Errors
    ///
    /// [`SelectionError::RangeInvalid`] for unknown or inverted endpoints.
    pub fn candidates(&self, range: &LevelRange) -> Result<Vec<&'a Song>, SelectionError> {
        let resolved = self.scale.resolve(range)?;
        let candidates = self.catalog.within(self.scale, resolved);
        debug!("{} candidates for range {range}", candidates.len());
        Ok(candidates)
    }

    /// One song from the whole catalog, ignoring levels.
    ///
    /// # Errors
    ///
    /// [`SelectionError::NoMatch`] when the catalog is empty.
    pub fn pick_any<R>(&self, rng: &mut R) -> Result<&'a Song, SelectionError>
    where
        R: RandomSource + ?Sized,
    {
        choose(self.catalog.songs().iter().collect(), rng)
    }

    /// One song whose level lies in `range`.
    ///
    /// # Errors
    ///
    /// [`SelectionError::RangeInvalid`] before any filtering, or
    /// [`SelectionError::NoMatch`] when nothing is in range.
    pub fn pick_in_range<R>(&self, range: &LevelRange, rng: &mut R) -> Result<&'a Song, SelectionError>
    where
        R: RandomSource + ?Sized,
    {
        let candidates = self.candidates(range)?;
        choose(candidates, rng)
    }

    /// Three songs from `range` forming a [`Course`].
    ///
    /// # Errors
    ///
    /// [`SelectionError::RangeInvalid`],
    /// [`SelectionError::InsufficientCandidates`] when fewer than three songs
    /// are in range, or [`SelectionError::CourseUnsatisfiable`] when the
    /// single greedy walk ends short.
    pub fn pick_course<R>(&self, range: &LevelRange, rng: &mut R) -> Result<Course, SelectionError>
    where
        R: RandomSource + ?Sized,
    {
        let candidates = self.candidates(range)?;
        if candidates.len() < COURSE_LENGTH {
            return Err(SelectionError::InsufficientCandidates {
                found: candidates.len(),
            });
        }

        let order = rng.permutation(candidates.len());
        let walk = order.iter().filter_map(|&i| candidates.get(i).copied());
        let selected = self.walk_course(walk);

        let picked = selected.len();
        let songs: [Song; COURSE_LENGTH] = selected
            .into_iter()
            .cloned()
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| {
                debug!("Course walk kept {picked} of {} candidates", candidates.len());
                SelectionError::CourseUnsatisfiable {
                    candidates: candidates.len(),
                }
            })?;

        Ok(Course { songs })
    }

    /// Single forward pass keeping songs that do not drop in difficulty and
    /// do not repeat a title.
    fn walk_course<I>(&self, walk: I) -> Vec<&'a Song>
    where
        I: IntoIterator<Item = &'a Song>,
    {
        let mut selected: Vec<(&'a Song, usize)> = Vec::with_capacity(COURSE_LENGTH);

        for song in walk {
            let Some(index) = self.scale.index_of(&song.level) else {
                continue;
            };

            let keep = match selected.last() {
                None => true,
                Some(&(_, last_index)) => {
                    index >= last_index && selected.iter().all(|(kept, _)| kept.title != song.title)
                }
            };

            trace!("Course walk: {song} {}", if keep { "kept" } else { "passed" });
            if keep {
                selected.push((song, index));
                if selected.len() == COURSE_LENGTH {
                    break;
                }
            }
        }

        selected.into_iter().map(|(song, _)| song).collect()
    }
}

fn choose<'a, R>(candidates: Vec<&'a Song>, rng: &mut R) -> Result<&'a Song, SelectionError>
where
    R: RandomSource + ?Sized,
{
    if candidates.is_empty() {
        return Err(SelectionError::NoMatch);
    }
    let index = rng.index(candidates.len());
    candidates.get(index).copied().ok_or(SelectionError::NoMatch)
}
