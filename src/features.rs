//! Feature registry.
//!
//! Every menu entry is a handler record looked up by id. Templates are data:
//! the pipeline composes `template + body` and never branches on the feature.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Typed text and/or an uploaded PDF, text file or slide deck.
    Document,
    /// A single typed line.
    Topic,
    /// Subject, daily hours and exam date.
    Planner,
    /// An uploaded WAV clip.
    Audio,
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Document => "text or document",
            Self::Topic => "topic",
            Self::Planner => "planner",
            Self::Audio => "audio",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Revealed one character at a time.
    Stream,
    /// Shown at once.
    Plain,
    /// Shown at once, plus a concept map diagram.
    Diagram,
    /// Shown at once and saved as a one-slide deck.
    Deck,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Feature {
    pub id: &'static str,
    pub title: &'static str,
    icon_shortcode: &'static str,
    pub input_shape: InputShape,
    pub template: &'static str,
    pub render_mode: RenderMode,
}

impl Feature {
    #[must_use]
    pub fn icon(&self) -> &'static str {
        emojis::get_by_shortcode(self.icon_shortcode)
            .map(|emoji| emoji.as_str())
            .unwrap_or("*")
    }
}

const fn feature(
    id: &'static str,
    title: &'static str,
    icon_shortcode: &'static str,
    input_shape: InputShape,
    template: &'static str,
    render_mode: RenderMode,
) -> Feature {
    Feature {
        id,
        title,
        icon_shortcode,
        input_shape,
        template,
        render_mode,
    }
}

pub const PLANNER_TEMPLATE: &str = "Create a daily study plan for ";

pub static FEATURES: [Feature; 13] = [
    feature(
        "explain",
        "Explain Topic",
        "brain",
        InputShape::Document,
        "Explain in simple words:\n",
        RenderMode::Stream,
    ),
    feature(
        "summarize",
        "Summarize Notes",
        "memo",
        InputShape::Document,
        "Summarize into bullet points:\n",
        RenderMode::Stream,
    ),
    feature(
        "pdf-summary",
        "PDF Summary",
        "page_facing_up",
        InputShape::Document,
        "Summarize student-friendly:\n",
        RenderMode::Stream,
    ),
    feature(
        "quiz",
        "Quiz Generator",
        "dart",
        InputShape::Document,
        "Create 5 MCQs with answers:\n",
        RenderMode::Stream,
    ),
    feature(
        "flashcards",
        "Flashcards",
        "bulb",
        InputShape::Document,
        "Create flashcards term:definition:\n",
        RenderMode::Stream,
    ),
    feature(
        "revision",
        "Revision Mode",
        "repeat",
        InputShape::Document,
        "Exam-focused revision notes:\n",
        RenderMode::Stream,
    ),
    feature(
        "analyzer",
        "Knowledge Analyzer",
        "chart_with_upwards_trend",
        InputShape::Document,
        "Analyze knowledge level and tips:\n",
        RenderMode::Stream,
    ),
    feature(
        "focus-booster",
        "Focus Booster",
        "stopwatch",
        InputShape::Document,
        "Give motivation for focused study:\n",
        RenderMode::Stream,
    ),
    feature(
        "notes-ppt",
        "Notes → PPT",
        "bar_chart",
        InputShape::Document,
        "",
        RenderMode::Deck,
    ),
    feature(
        "planner",
        "Smart Study Planner",
        "calendar",
        InputShape::Planner,
        PLANNER_TEMPLATE,
        RenderMode::Plain,
    ),
    feature(
        "memory-challenge",
        "Memory Challenge",
        "video_game",
        InputShape::Topic,
        "Create 3 quick questions with answers in short game style to test memory of:\n",
        RenderMode::Plain,
    ),
    feature(
        "voice",
        "Voice Question",
        "microphone",
        InputShape::Audio,
        "",
        RenderMode::Plain,
    ),
    feature(
        "concept-map",
        "Concept Map",
        "framed_picture",
        InputShape::Topic,
        "List the 4 most important subtopics of the following topic, one per line, without numbering:\n",
        RenderMode::Diagram,
    ),
];

static BY_ID: Lazy<HashMap<&'static str, &'static Feature>> =
    Lazy::new(|| FEATURES.iter().map(|feature| (feature.id, feature)).collect());

#[must_use]
pub fn lookup(id: &str) -> Option<&'static Feature> {
    BY_ID.get(id.trim()).copied()
}

#[must_use]
pub fn all() -> &'static [Feature] {
    &FEATURES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_resolvable() {
        assert_eq!(BY_ID.len(), FEATURES.len());
        for feature in all() {
            assert_eq!(lookup(feature.id), Some(feature));
        }
        assert_eq!(lookup("unknown"), None);
    }

    #[test]
    fn document_features_stream_their_answers() {
        for feature in all().iter().filter(|feature| {
            feature.input_shape == InputShape::Document && feature.render_mode != RenderMode::Deck
        }) {
            assert_eq!(feature.render_mode, RenderMode::Stream, "{}", feature.id);
            assert!(feature.template.ends_with('\n'), "{}", feature.id);
        }
    }

    #[test]
    fn templates_match_menu_wording() {
        assert_eq!(
            lookup("summarize").map(|f| f.template),
            Some("Summarize into bullet points:\n")
        );
        assert_eq!(lookup("planner").map(|f| f.template), Some(PLANNER_TEMPLATE));
        assert_eq!(lookup("voice").map(|f| f.template), Some(""));
    }

    #[test]
    fn notes_deck_sends_the_notes_verbatim() {
        let notes = lookup("notes-ppt").expect("notes-ppt is registered");

        assert_eq!(notes.template, "");
        assert_eq!(notes.input_shape, InputShape::Document);
        assert_eq!(notes.render_mode, RenderMode::Deck);
        assert_eq!(notes.icon(), "📊");
    }

    #[test]
    fn icons_resolve_to_emoji() {
        assert_eq!(lookup("explain").map(Feature::icon), Some("🧠"));
        assert_eq!(lookup("voice").map(Feature::icon), Some("🎤"));
        for feature in all() {
            assert!(!feature.icon().is_empty());
        }
    }
}
