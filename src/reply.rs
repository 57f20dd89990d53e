//! Reply rendering for chat and JSON output.

use crate::bot::InvocationError;
use crate::catalog::Song;
use crate::difficulty::RangeError;
use crate::selector::{Course, SelectionError, COURSE_LENGTH};
use serde::Serialize;

/// First line of every single-song recommendation.
pub const RECOMMEND_HEADER: &str = "あなたにおすすめの曲はこれです！🎧";

/// First line of every course.
pub const COURSE_HEADER: &str = "今日の課題曲コースはこちら！🎧";

/// Sent when answering a request failed unexpectedly.
pub const APOLOGY: &str = "ごめんなさい、エラーが発生しました😢 もう一度試してみてください。";

/// A successful answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    Song(Song),
    Course(Course),
}

impl Reply {
    /// Chat text for this answer.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Song(song) => format!("{RECOMMEND_HEADER}\n🎵 {song}"),
            Self::Course(course) => {
                let lines: Vec<String> = course
                    .iter()
                    .enumerate()
                    .map(|(i, song)| format!("{}曲目：{song}", i + 1))
                    .collect();
                format!("{COURSE_HEADER}\n{}", lines.join("\n"))
            }
        }
    }

    /// JSON object for this answer, tagged with its `kind`.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if the answer cannot be represented.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Chat text for a request that produced no selection.
#[must_use]
pub fn render_error(err: &SelectionError) -> String {
    match err {
        SelectionError::RangeInvalid(RangeError::UnknownLabel(label)) => {
            format!("⚠️ レベルの指定が正しくありません：「{label}」というレベルはありません。")
        }
        SelectionError::RangeInvalid(RangeError::Inverted { min, max }) => {
            format!("⚠️ レベルの指定が正しくありません：最小（{min}）が最大（{max}）より上になっています。")
        }
        SelectionError::NoMatch => "😢 条件に合う曲が見つかりませんでした。".to_string(),
        SelectionError::InsufficientCandidates { found } => format!(
            "😢 条件に合う曲が{found}曲しかないため、{COURSE_LENGTH}曲のコースを作れません。"
        ),
        SelectionError::CourseUnsatisfiable { .. } => format!(
            "😢 条件を満たす曲を{COURSE_LENGTH}曲そろえられませんでした。もう一度試してみてください。"
        ),
    }
}

/// JSON object for a request that produced no selection.
#[must_use]
pub fn error_json(err: &SelectionError) -> serde_json::Value {
    serde_json::json!({
        "kind": "error",
        "error": err.kind(),
        "message": render_error(err),
    })
}

/// JSON object sent in place of [`APOLOGY`].
#[must_use]
pub fn fault_json() -> serde_json::Value {
    serde_json::json!({
        "kind": "error",
        "error": "unhandled_fault",
        "message": APOLOGY,
    })
}

/// Chat text for a command that could not be understood.
#[must_use]
pub fn render_usage(err: &InvocationError) -> String {
    format!(
        "⚠️ {err}\n使い方：/song ・ /level [最小] [最大] ・ /course [最小] [最大]\n\
         （例：/level 12 13、/course min:12+ max:14）"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::difficulty::{DifficultyScale, LevelRange};
    use crate::selector::{RngSource, Selector};

    #[test]
    fn test_song_reply_text() {
        let reply = Reply::Song(Song::new("Aleph-0", "14+"));
        assert_eq!(reply.render(), format!("{RECOMMEND_HEADER}\n🎵 Aleph-0（14+）"));
    }

    #[test]
    fn test_course_reply_lists_songs_in_order() {
        let catalog = Catalog::from_songs(vec![
            Song::new("a", "12"),
            Song::new("b", "12"),
            Song::new("c", "12"),
        ]);
        let scale = DifficultyScale::default();
        let course = Selector::new(&catalog, &scale)
            .pick_course(&LevelRange::unbounded(), &mut RngSource::seeded(1))
            .unwrap();
        let expected: Vec<String> = course
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}曲目：{}（12）", i + 1, s.title))
            .collect();

        let text = Reply::Course(course).render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], COURSE_HEADER);
        assert_eq!(&lines[1..], expected.as_slice());
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let errors = [
            SelectionError::RangeInvalid(RangeError::UnknownLabel("99".to_string())),
            SelectionError::NoMatch,
            SelectionError::InsufficientCandidates { found: 2 },
            SelectionError::CourseUnsatisfiable { candidates: 5 },
        ];

        let texts: std::collections::HashSet<_> = errors.iter().map(render_error).collect();
        assert_eq!(texts.len(), errors.len());

        let kinds: std::collections::HashSet<_> = errors.iter().map(SelectionError::kind).collect();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_range_error_mentions_label() {
        let text = render_error(&SelectionError::RangeInvalid(RangeError::UnknownLabel("16".to_string())));
        assert!(text.contains("16"));
    }

    #[test]
    fn test_song_reply_json() {
        let json = Reply::Song(Song::new("Teriqma", "13")).to_json().unwrap();
        assert_eq!(json["kind"], "song");
        assert_eq!(json["title"], "Teriqma");
        assert_eq!(json["level"], "13");
    }

    #[test]
    fn test_error_json() {
        let json = error_json(&SelectionError::InsufficientCandidates { found: 1 });
        assert_eq!(json["kind"], "error");
        assert_eq!(json["error"], "insufficient_candidates");
    }

    #[test]
    fn test_fault_json_is_distinct_from_selection_errors() {
        let json = fault_json();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["error"], "unhandled_fault");
        assert_eq!(json["message"], APOLOGY);
        assert_ne!(json["error"], error_json(&SelectionError::NoMatch)["error"]);
    }
}
