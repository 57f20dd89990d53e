//! Practice song picker for rhythm game chat channels.
//!
//! Core modules:
//! - [`difficulty`] - Ordered difficulty labels and level ranges
//! - [`catalog`] - Song catalog parsing and loading
//! - [`selector`] - Random song and course selection
//! - [`bot`] - Chat command parsing and reply dispatch
//!
//! ### Supporting Modules
//!
//! - [`reply`] - Chat text and JSON rendering of answers
//! - [`config`] - Catalog location and runtime settings
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use kadaikyoku::catalog::Catalog;
//! use kadaikyoku::difficulty::{DifficultyScale, LevelRange};
//! use kadaikyoku::selector::{RngSource, Selector};
//!
//! let scale = DifficultyScale::default();
//! let catalog = Catalog::parse("Teriqma,13\n\"Aleph-0\",\"14+\"\nPygmalion,14\n", &scale);
//! let selector = Selector::new(&catalog, &scale);
//! let mut rng = RngSource::seeded(1);
//!
//! let song = selector.pick_in_range(&LevelRange::new(Some("14"), None), &mut rng)?;
//! assert!(song.level == "14" || song.level == "14+");
//!
//! match selector.pick_course(&LevelRange::unbounded(), &mut rng) {
//!     Ok(course) => assert_eq!(course.songs().len(), 3),
//!     // A single shuffle may not walk upwards; asking again can succeed.
//!     Err(e) => assert_eq!(e.kind(), "course_unsatisfiable"),
//! }
//! # Ok::<(), kadaikyoku::selector::SelectionError>(())
//! ```
//!
//! ## Error Handling
//!
//! Startup work (reading the catalog, resolving configuration) returns
//! `anyhow::Result`. An unreadable catalog, or one without a single valid
//! record, stops the process. Per-request outcomes are typed
//! ([`selector::SelectionError`]) and are always answered, never fatal.
//!
//! ## Logging
//!
//! Uses the `log` facade; the binary installs `env_logger`, so `RUST_LOG`
//! controls verbosity (`RUST_LOG=kadaikyoku::selector=trace` shows each
//! step of the course walk).

pub mod bot;
pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod difficulty;
pub mod reply;
pub mod selector;
