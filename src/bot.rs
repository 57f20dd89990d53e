//! # Bot Module
//!
//! Turns chat messages into selections and selections into replies. This is
//! the only layer that knows about message text, channels and the apology
//! sent when something goes wrong; everything below it returns typed results.
//!
//! ## Message Shape
//!
//! ```text
//! [#channel] /command [min] [max]
//! ```
//!
//! Commands are `/song`, `/level` and `/course`. Bounds may be positional or
//! named (`min:12+`, `max=14`), and `-` leaves a positional bound open.
//! Messages whose body does not start with `/` are ordinary chat and get no
//! reply.

use crate::catalog::Catalog;
use crate::difficulty::{DifficultyScale, LevelRange};
use crate::reply::{self, Reply};
use crate::selector::{RandomSource, SelectionError, Selector};
use anyhow::{Context, Result};
use log::{debug, error, info};
use std::any::Any;
use std::fmt;
use std::io::{BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// A command the bot understands, with its requested level bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Song,
    Level(LevelRange),
    Course(LevelRange),
}

/// Why a `/` message could not be turned into a [`BotCommand`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("コマンドがありません")]
    MissingCommand,

    #[error("「/{0}」というコマンドはありません")]
    UnknownCommand(String),

    #[error("「/{command}」に余分な指定があります：{argument}")]
    UnexpectedArgument { command: String, argument: String },

    #[error("{0}が二回指定されています")]
    DuplicateBound(&'static str),

    #[error("{0}の値がありません")]
    MissingValue(&'static str),
}

/// A request that failed outside the selection outcomes, such as a panic
/// while picking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unhandled fault: {0}")]
pub struct Fault(pub String);

impl BotCommand {
    /// Parse a message body.
    ///
    /// Returns `Ok(None)` for text that is not addressed to the bot.
    pub fn parse(body: &str) -> Result<Option<Self>, InvocationError> {
        let Some(rest) = body.trim().strip_prefix('/') else {
            return Ok(None);
        };

        let mut tokens = rest.split_whitespace();
        let name = tokens
            .next()
            .ok_or(InvocationError::MissingCommand)?
            .to_lowercase();
        let args: Vec<&str> = tokens.collect();

        match name.as_str() {
            "song" => match args.first() {
                None => Ok(Some(Self::Song)),
                Some(argument) => Err(InvocationError::UnexpectedArgument {
                    command: name.clone(),
                    argument: (*argument).to_string(),
                }),
            },
            "level" => parse_range(&name, &args).map(|range| Some(Self::Level(range))),
            "course" => parse_range(&name, &args).map(|range| Some(Self::Course(range))),
            other => Err(InvocationError::UnknownCommand(other.to_string())),
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Song => "song",
            Self::Level(_) => "level",
            Self::Course(_) => "course",
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Song => write!(f, "/song"),
            Self::Level(range) | Self::Course(range) => write!(f, "/{} {range}", self.name()),
        }
    }
}

/// Named bounds are applied first; positional bounds then fill whichever of
/// min and max is still unset, in that order.
fn parse_range(command: &str, args: &[&str]) -> Result<LevelRange, InvocationError> {
    let mut min: Option<Option<String>> = None;
    let mut max: Option<Option<String>> = None;
    let mut positional = Vec::new();

    for &arg in args {
        let named = arg
            .split_once(':')
            .or_else(|| arg.split_once('='))
            .filter(|(key, _)| matches!(key.to_lowercase().as_str(), "min" | "max"));

        let Some((key, value)) = named else {
            positional.push(arg);
            continue;
        };

        let (slot, bound) = if key.eq_ignore_ascii_case("min") {
            (&mut min, "最小")
        } else {
            (&mut max, "最大")
        };
        if slot.is_some() {
            return Err(InvocationError::DuplicateBound(bound));
        }
        if value.is_empty() {
            return Err(InvocationError::MissingValue(bound));
        }
        *slot = Some(bound_value(value));
    }

    for arg in positional {
        let slot = if min.is_none() {
            &mut min
        } else if max.is_none() {
            &mut max
        } else {
            return Err(InvocationError::UnexpectedArgument {
                command: command.to_string(),
                argument: arg.to_string(),
            });
        };
        *slot = Some(bound_value(arg));
    }

    Ok(LevelRange {
        min: min.flatten(),
        max: max.flatten(),
    })
}

/// `-` leaves a bound open.
fn bound_value(value: &str) -> Option<String> {
    (value != "-").then(|| value.to_string())
}

/// A chat message split into its optional channel tag and body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub channel: Option<&'a str>,
    pub body: &'a str,
}

impl<'a> Message<'a> {
    /// Split `#channel rest` into its parts. Untagged text has no channel.
    #[must_use]
    pub fn split(text: &'a str) -> Self {
        let text = text.trim();
        match text.strip_prefix('#') {
            Some(tagged) => {
                let (channel, body) = tagged
                    .split_once(char::is_whitespace)
                    .unwrap_or((tagged, ""));
                Self {
                    channel: Some(channel),
                    body: body.trim(),
                }
            }
            None => Self { channel: None, body: text },
        }
    }
}

/// Answers commands from a shared, read-only catalog.
#[derive(Debug, Clone)]
pub struct Bot {
    catalog: Arc<Catalog>,
    scale: DifficultyScale,
    allowed_channel: Option<String>,
}

impl Bot {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, scale: DifficultyScale) -> Self {
        Self {
            catalog,
            scale,
            allowed_channel: None,
        }
    }

    /// Only answer messages tagged with `channel`.
    #[must_use]
    pub fn with_allowed_channel(mut self, channel: Option<String>) -> Self {
        self.allowed_channel = channel.map(|c| c.trim_start_matches('#').to_string());
        self
    }

    #[must_use]
    pub fn selector(&self) -> Selector<'_> {
        Selector::new(&self.catalog, &self.scale)
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn scale(&self) -> &DifficultyScale {
        &self.scale
    }

    /// Whether a message from `channel` should be answered.
    #[must_use]
    pub fn accepts(&self, channel: Option<&str>) -> bool {
        match &self.allowed_channel {
            None => true,
            Some(allowed) => channel == Some(allowed.as_str()),
        }
    }

    /// Run the selection behind `command`.
    ///
    /// # Errors
    ///
    /// Returns the [`SelectionError`] describing why nothing was selected.
    pub fn handle(&self, command: &BotCommand, rng: &mut dyn RandomSource) -> Result<Reply, SelectionError> {
        let selector = self.selector();
        match command {
            BotCommand::Song => selector.pick_any(rng).map(|song| Reply::Song(song.clone())),
            BotCommand::Level(range) => selector
                .pick_in_range(range, rng)
                .map(|song| Reply::Song(song.clone())),
            BotCommand::Course(range) => selector.pick_course(range, rng).map(Reply::Course),
        }
    }

    /// Run [`Bot::handle`], turning a panic inside selection into a logged
    /// [`Fault`].
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] when selection panicked.
    pub fn try_handle(
        &self,
        command: &BotCommand,
        rng: &mut dyn RandomSource,
    ) -> Result<Result<Reply, SelectionError>, Fault> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handle(command, rng)));

        match outcome {
            Ok(Ok(reply)) => {
                debug!("Answered {command} with {reply:?}");
                Ok(Ok(reply))
            }
            Ok(Err(err)) => {
                info!("No selection for {command}: {err}");
                Ok(Err(err))
            }
            Err(payload) => {
                let fault = Fault(panic_message(&*payload));
                error!("Unhandled fault while answering {command}: {}", fault.0);
                Err(fault)
            }
        }
    }

    /// Reply text for `command`. Never panics: failures inside selection are
    /// answered with [`reply::APOLOGY`].
    pub fn answer(&self, command: &BotCommand, rng: &mut dyn RandomSource) -> String {
        match self.try_handle(command, rng) {
            Ok(Ok(reply)) => reply.render(),
            Ok(Err(err)) => reply::render_error(&err),
            Err(_) => reply::APOLOGY.to_string(),
        }
    }

    /// JSON answer for `command`, with the same guarantees as [`Bot::answer`].
    pub fn answer_json(&self, command: &BotCommand, rng: &mut dyn RandomSource) -> serde_json::Value {
        match self.try_handle(command, rng) {
            Ok(Ok(answer)) => answer.to_json().unwrap_or_else(|e| {
                error!("Failed to serialize reply to {command}: {e}");
                reply::fault_json()
            }),
            Ok(Err(err)) => reply::error_json(&err),
            Err(_) => reply::fault_json(),
        }
    }

    /// Reply to one chat message, or `None` when the message is not for the bot.
    pub fn respond(&self, text: &str, rng: &mut dyn RandomSource) -> Option<String> {
        let message = Message::split(text);
        if !self.accepts(message.channel) {
            debug!("Ignoring message from channel {:?}", message.channel);
            return None;
        }

        match BotCommand::parse(message.body) {
            Ok(None) => None,
            Ok(Some(command)) => Some(self.answer(&command, rng)),
            Err(err) => {
                debug!("Rejected invocation `{}`: {err}", message.body);
                Some(reply::render_usage(&err))
            }
        }
    }

    /// Answer messages from `input`, one per line, until end of input.
    ///
    /// Each reply is written to `output` followed by a blank line. Returns
    /// the number of replies sent.
    ///
    /// # Errors
    ///
    /// Only I/O failures end the loop; request failures are answered in place.
    pub fn serve<R, W>(&self, input: R, mut output: W, rng: &mut dyn RandomSource) -> Result<usize>
    where
        R: BufRead,
        W: Write,
    {
        info!("Answering commands from {} songs", self.catalog.len());
        let mut answered = 0;

        for line in input.lines() {
            let line = line.context("Failed to read message from input")?;
            if let Some(text) = self.respond(&line, rng) {
                writeln!(output, "{text}\n").context("Failed to write reply")?;
                output.flush().context("Failed to flush reply")?;
                answered += 1;
            }
        }

        info!("Input closed after {answered} replies");
        Ok(answered)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Song;
    use crate::selector::RngSource;

    fn sample_bot() -> Bot {
        let catalog = Catalog::from_songs(vec![
            Song::new("Oshama Scramble!", "12"),
            Song::new("Teriqma", "13"),
            Song::new("Pygmalion", "14"),
        ]);
        Bot::new(Arc::new(catalog), DifficultyScale::default())
    }

    /// Panics on every draw.
    struct BrokenSource;

    impl RandomSource for BrokenSource {
        fn index(&mut self, _len: usize) -> usize {
            panic!("entropy pool exhausted")
        }

        fn permutation(&mut self, _len: usize) -> Vec<usize> {
            panic!("entropy pool exhausted")
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(BotCommand::parse("/song"), Ok(Some(BotCommand::Song)));
        assert_eq!(BotCommand::parse("  /SONG  "), Ok(Some(BotCommand::Song)));
        assert_eq!(
            BotCommand::parse("/level 12 13"),
            Ok(Some(BotCommand::Level(LevelRange::new(Some("12"), Some("13")))))
        );
        assert_eq!(
            BotCommand::parse("/course"),
            Ok(Some(BotCommand::Course(LevelRange::unbounded())))
        );
    }

    #[test]
    fn test_parse_named_and_open_bounds() {
        assert_eq!(
            BotCommand::parse("/level max:13+ min=12"),
            Ok(Some(BotCommand::Level(LevelRange::new(Some("12"), Some("13+")))))
        );
        assert_eq!(
            BotCommand::parse("/course - 14"),
            Ok(Some(BotCommand::Course(LevelRange::new(None, Some("14")))))
        );
        assert_eq!(
            BotCommand::parse("/course MAX:14"),
            Ok(Some(BotCommand::Course(LevelRange::new(None, Some("14")))))
        );
        assert_eq!(
            BotCommand::parse("/level min:12 14"),
            Ok(Some(BotCommand::Level(LevelRange::new(Some("12"), Some("14")))))
        );
        assert_eq!(
            BotCommand::parse("/level 14 min:12"),
            Ok(Some(BotCommand::Level(LevelRange::new(Some("12"), Some("14")))))
        );
        assert_eq!(
            BotCommand::parse("/course max:13 12+"),
            Ok(Some(BotCommand::Course(LevelRange::new(Some("12+"), Some("13")))))
        );
    }

    #[test]
    fn test_parse_ignores_plain_chat() {
        assert_eq!(BotCommand::parse("おすすめ教えて"), Ok(None));
        assert_eq!(BotCommand::parse(""), Ok(None));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(BotCommand::parse("/"), Err(InvocationError::MissingCommand));
        assert_eq!(
            BotCommand::parse("/dance"),
            Err(InvocationError::UnknownCommand("dance".to_string()))
        );
        assert_eq!(
            BotCommand::parse("/song 12"),
            Err(InvocationError::UnexpectedArgument {
                command: "song".to_string(),
                argument: "12".to_string()
            })
        );
        assert_eq!(
            BotCommand::parse("/level 12 13 14"),
            Err(InvocationError::UnexpectedArgument {
                command: "level".to_string(),
                argument: "14".to_string()
            })
        );
        assert_eq!(
            BotCommand::parse("/level min:12 min=13"),
            Err(InvocationError::DuplicateBound("最小"))
        );
        assert_eq!(
            BotCommand::parse("/level min:12 13 14"),
            Err(InvocationError::UnexpectedArgument {
                command: "level".to_string(),
                argument: "14".to_string()
            })
        );
        assert_eq!(BotCommand::parse("/course max:"), Err(InvocationError::MissingValue("最大")));
    }

    #[test]
    fn test_message_split() {
        assert_eq!(
            Message::split("#課題曲bot /song"),
            Message { channel: Some("課題曲bot"), body: "/song" }
        );
        assert_eq!(Message::split("/song"), Message { channel: None, body: "/song" });
        assert_eq!(Message::split("#general"), Message { channel: Some("general"), body: "" });
    }

    #[test]
    fn test_respond_song() {
        let bot = sample_bot();
        let text = bot.respond("/song", &mut RngSource::seeded(1)).unwrap();
        assert!(text.starts_with(reply::RECOMMEND_HEADER));
        assert!(bot.catalog().iter().any(|song| text.ends_with(&song.to_string())));
    }

    #[test]
    fn test_respond_reports_each_outcome_distinctly() {
        let bot = sample_bot();
        let mut rng = RngSource::seeded(1);

        let invalid = bot.respond("/level 13 12", &mut rng).unwrap();
        let none = bot.respond("/level 10+ 11", &mut rng).unwrap();
        let short = bot.respond("/course 13 14", &mut rng).unwrap();

        assert_eq!(invalid, reply::render_error(&SelectionError::RangeInvalid(
            crate::difficulty::RangeError::Inverted { min: "13".to_string(), max: "12".to_string() }
        )));
        assert_eq!(none, reply::render_error(&SelectionError::NoMatch));
        assert_eq!(short, reply::render_error(&SelectionError::InsufficientCandidates { found: 2 }));
    }

    #[test]
    fn test_respond_course() {
        let bot = sample_bot();
        // Three candidates of rising difficulty: only the sorted walk succeeds,
        // so retry with fresh draws until one lands.
        let mut rng = RngSource::seeded(3);
        let text = (0..200)
            .map(|_| bot.respond("/course", &mut rng).unwrap())
            .find(|text| text.starts_with(reply::COURSE_HEADER))
            .expect("some shuffle should be sorted");

        assert!(text.contains("1曲目：Oshama Scramble!（12）"));
        assert!(text.contains("2曲目：Teriqma（13）"));
        assert!(text.contains("3曲目：Pygmalion（14）"));
    }

    #[test]
    fn test_respond_usage_on_bad_command() {
        let bot = sample_bot();
        let text = bot.respond("/dance", &mut RngSource::seeded(0)).unwrap();
        assert!(text.contains("dance"));
        assert!(text.contains("/course"));
    }

    #[test]
    fn test_channel_filter() {
        let bot = sample_bot().with_allowed_channel(Some("#課題曲bot".to_string()));
        let mut rng = RngSource::seeded(0);

        assert!(bot.respond("#課題曲bot /song", &mut rng).is_some());
        assert!(bot.respond("#general /song", &mut rng).is_none());
        assert!(bot.respond("/song", &mut rng).is_none());
        assert!(bot.respond("#general /dance", &mut rng).is_none());
    }

    #[test]
    fn test_unhandled_fault_becomes_apology() {
        let bot = sample_bot();
        assert_eq!(bot.answer(&BotCommand::Song, &mut BrokenSource), reply::APOLOGY);

        // The bot keeps answering afterwards.
        assert!(bot.respond("/song", &mut RngSource::seeded(0)).is_some());
    }

    #[test]
    fn test_try_handle_reports_fault() {
        let bot = sample_bot();
        assert_eq!(
            bot.try_handle(&BotCommand::Course(LevelRange::unbounded()), &mut BrokenSource),
            Err(Fault("entropy pool exhausted".to_string()))
        );
        assert!(matches!(
            bot.try_handle(&BotCommand::Song, &mut RngSource::seeded(0)),
            Ok(Ok(Reply::Song(_)))
        ));
    }

    #[test]
    fn test_json_answers_share_the_fault_boundary() {
        let bot = sample_bot();

        let fault = bot.answer_json(&BotCommand::Song, &mut BrokenSource);
        assert_eq!(fault["kind"], "error");
        assert_eq!(fault["error"], "unhandled_fault");
        assert_eq!(fault["message"], reply::APOLOGY);

        let song = bot.answer_json(&BotCommand::Song, &mut RngSource::seeded(0));
        assert_eq!(song["kind"], "song");

        let none = bot.answer_json(
            &BotCommand::Level(LevelRange::new(Some("15"), None)),
            &mut RngSource::seeded(0),
        );
        assert_eq!(none["error"], "no_match");
    }

    #[test]
    fn test_serve_answers_each_command() {
        let bot = sample_bot();
        let input = "/song\nhello\n/level 14 14\n/level 15\n";
        let mut output = Vec::new();

        let answered = bot.serve(input.as_bytes(), &mut output, &mut RngSource::seeded(8)).unwrap();
        assert_eq!(answered, 3);

        let text = String::from_utf8(output).unwrap();
        let replies: Vec<_> = text.split("\n\n").filter(|r| !r.trim().is_empty()).collect();
        assert_eq!(replies.len(), 3);
        assert!(replies[1].ends_with("Pygmalion（14）"));
        assert_eq!(replies[2], reply::render_error(&SelectionError::NoMatch));
    }
}
