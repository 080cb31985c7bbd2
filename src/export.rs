//! History export on demand. The session itself is never persisted.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use session_log::{SessionLogError, SessionState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to export history to {path}: {source}")]
    SessionLog {
        path: PathBuf,
        #[source]
        source: SessionLogError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    JsonLines,
    Text,
}

impl ExportFormat {
    /// `.html`/`.htm` and `.jsonl` by extension, plain text otherwise.
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("html" | "htm") => Self::Html,
            Some("jsonl") => Self::JsonLines,
            _ => Self::Text,
        }
    }
}

/// Writes the session history to `path` in the format its extension names.
pub fn write_history(state: &SessionState, path: &Path) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::for_path(path);
    let io_error = |source: io::Error| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let log_error = |source: SessionLogError| ExportError::SessionLog {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    match format {
        ExportFormat::Html => {
            writer
                .write_all(history_html(state).as_bytes())
                .map_err(io_error)?;
            writer.flush().map_err(io_error)?;
        }
        ExportFormat::JsonLines => state.log.export_jsonl(&mut writer).map_err(log_error)?,
        ExportFormat::Text => state.log.export_text(&mut writer).map_err(log_error)?,
    }

    tracing::info!(path = %path.display(), ?format, records = state.log.len(), "history exported");
    Ok(format)
}

/// Standalone HTML page, most recent interaction first, answers rendered from markdown.
#[must_use]
pub fn history_html(state: &SessionState) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Study history</title>\n<style>\n");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n");
    html.push_str(&format!("<body class=\"{}\">\n", state.theme));
    html.push_str(&format!(
        "<h1>Study history</h1>\n<p class=\"progress\">{} interactions, progress {}%</p>\n",
        state.log.activity_count(),
        state.log.progress()
    ));

    for record in state.log.read_all_reverse() {
        html.push_str("<section>\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&record.feature_name)));
        html.push_str(&format!(
            "<pre class=\"input\">{}</pre>\n",
            escape_html(&record.input_text)
        ));
        html.push_str(&markdown::to_html(&record.output_text));
        html.push_str("\n</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

const STYLE: &str = "body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
body.dark { background: #111827; color: #e5e7eb; }
section { border-left: 4px solid #8b5cf6; padding-left: 1rem; margin-bottom: 2rem; }
pre.input { white-space: pre-wrap; opacity: 0.7; }
";

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_history() -> SessionState {
        let mut state = SessionState::new();
        state.log.append("Explain Topic", "atoms", "Atoms are **small**.");
        state.log.append("Quiz Generator", "<cells>", "1. What is a cell?");
        state
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::for_path(Path::new("h.HTML")), ExportFormat::Html);
        assert_eq!(ExportFormat::for_path(Path::new("h.jsonl")), ExportFormat::JsonLines);
        assert_eq!(ExportFormat::for_path(Path::new("h.txt")), ExportFormat::Text);
        assert_eq!(ExportFormat::for_path(Path::new("history")), ExportFormat::Text);
    }

    #[test]
    fn html_lists_most_recent_first_and_renders_markdown() {
        let html = history_html(&state_with_history());

        let quiz = html.find("Quiz Generator").expect("quiz section");
        let explain = html.find("Explain Topic").expect("explain section");
        assert!(quiz < explain);
        assert!(html.contains("<strong>small</strong>"));
        assert!(html.contains("&lt;cells&gt;"));
        assert!(html.contains("2 interactions, progress 14%"));
        assert!(html.contains("<body class=\"light\">"));
    }

    #[test]
    fn raw_html_in_answers_is_not_passed_through() {
        let mut state = SessionState::new();
        state.log.append("Explain Topic", "x", "<script>alert(1)</script>");

        assert!(!history_html(&state).contains("<script>"));
    }

    #[test]
    fn write_history_picks_writer_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let state = state_with_history();

        let text_path = dir.path().join("history.txt");
        let jsonl_path = dir.path().join("history.jsonl");

        assert_eq!(write_history(&state, &text_path).expect("text"), ExportFormat::Text);
        assert_eq!(
            write_history(&state, &jsonl_path).expect("jsonl"),
            ExportFormat::JsonLines
        );

        assert_eq!(
            std::fs::read_to_string(&text_path).expect("read"),
            "Quiz Generator:\n1. What is a cell?\n\nExplain Topic:\nAtoms are **small**.\n\n"
        );
        assert_eq!(std::fs::read_to_string(&jsonl_path).expect("read").lines().count(), 2);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("missing").join("history.txt");

        assert!(matches!(
            write_history(&SessionState::new(), &path),
            Err(ExportError::Io { .. })
        ));
    }
}
