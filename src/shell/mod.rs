//! Line-oriented study shell.
//!
//! Plain text runs the selected feature, `/<feature> <input>` runs any feature,
//! and the remaining slash commands inspect or export the session.

pub mod commands;
pub mod palette;
pub mod spinner;

use std::borrow::Cow::{self, Borrowed, Owned};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use session_log::SessionState;
use signal_hook::SigId;
use unicode_width::UnicodeWidthStr;

use crate::completion::CompletionResult;
use crate::concept_map::ConceptMap;
use crate::config::RenderSettings;
use crate::deck::{self, NOTES_DECK_FILE, NOTES_DECK_TITLE};
use crate::export;
use crate::features::{self, Feature, InputShape, RenderMode};
use crate::input::Upload;
use crate::pipeline::{Completed, FeatureInput, Pipeline, PipelineError, PlannerRequest};
use crate::render::StreamingRenderer;

use self::commands::{parse_feature_argument, parse_slash_command, FeatureArgument, SlashCommand};
use self::palette::Palette;
use self::spinner::Spinner;

const PROGRESS_BAR_CELLS: usize = 20;
const ICON_COLUMNS: usize = 2;

const BUILTIN_COMMANDS: [(&str, &str); 7] = [
    ("/menu", "list features"),
    ("/history", "show this session's answers, newest first"),
    ("/progress", "show study progress"),
    ("/theme", "switch between light and dark"),
    ("/export <file>", "write history as .txt, .jsonl or .html"),
    ("/help", "show this help"),
    ("/quit", "leave"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub render: RenderSettings,
    /// Where concept-map SVG files are written.
    pub output_dir: PathBuf,
    pub spinner: bool,
    pub color: bool,
}

pub struct Shell<W: Write> {
    pipeline: Pipeline,
    session: SessionState,
    options: ShellOptions,
    palette: Palette,
    cancel: Arc<AtomicBool>,
    selected: &'static Feature,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(pipeline: Pipeline, options: ShellOptions, out: W) -> Self {
        let session = SessionState::new();
        let palette = Palette::new(session.theme, options.color);
        Self {
            pipeline,
            session,
            options,
            palette,
            cancel: Arc::new(AtomicBool::new(false)),
            selected: &features::FEATURES[0],
            out,
        }
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    #[must_use]
    pub fn selected(&self) -> &'static Feature {
        self.selected
    }

    /// Raised by Ctrl-C; the renderer checks it between steps.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    #[must_use]
    pub fn prompt(&self) -> String {
        format!("{} {}> ", self.selected.icon(), self.selected.id)
    }

    pub fn out(&self) -> &W {
        &self.out
    }

    pub fn banner(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", self.palette.heading("Study Buddy"))?;
        match self.pipeline.client().profile() {
            Some(profile) => {
                let model = format!("{} / {}", profile.provider_id, profile.model_id);
                writeln!(self.out, "{}", self.palette.muted(&model))?;
            }
            None => {
                let reason = self.pipeline.client().disabled_reason().unwrap_or_default();
                let disabled = format!("Answers are disabled: {reason}");
                writeln!(self.out, "{}", self.palette.warning(&disabled))?;
            }
        }
        let hint = "Type /menu for features, /help for commands.";
        writeln!(self.out, "{}", self.palette.muted(hint))
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }

        let Some(command) = parse_slash_command(line) else {
            self.run_feature(self.selected, line)?;
            return Ok(Flow::Continue);
        };

        match command {
            SlashCommand::Menu => self.show_menu()?,
            SlashCommand::Help => self.show_help()?,
            SlashCommand::History => self.show_history()?,
            SlashCommand::Progress => self.show_progress()?,
            SlashCommand::Theme => {
                let theme = self.session.toggle_theme();
                self.palette = self.palette.with_theme(theme);
                writeln!(self.out, "Theme: {}", self.palette.accent(theme.as_str()))?;
            }
            SlashCommand::Export(path) => self.export(&path)?,
            SlashCommand::Quit => {
                writeln!(self.out, "{}", self.palette.muted("Goodbye!"))?;
                return Ok(Flow::Quit);
            }
            SlashCommand::Feature {
                feature,
                argument: None,
            } => {
                self.selected = feature;
                writeln!(
                    self.out,
                    "{} {} selected. {}",
                    feature.icon(),
                    self.palette.heading(feature.title),
                    self.palette.muted(input_hint(feature.input_shape))
                )?;
            }
            SlashCommand::Feature {
                feature,
                argument: Some(argument),
            } => self.run_feature(feature, &argument)?,
            SlashCommand::Unknown(command) => {
                let unknown = format!("Unknown command {command}. Type /help.");
                writeln!(self.out, "{}", self.palette.warning(&unknown))?;
            }
        }

        Ok(Flow::Continue)
    }

    fn run_feature(&mut self, feature: &'static Feature, raw: &str) -> io::Result<()> {
        let input = match parse_feature_argument(feature.input_shape, raw)
            .and_then(|argument| build_input(feature, argument))
        {
            Ok(input) => input,
            Err(message) => {
                return writeln!(self.out, "{}", self.palette.warning(&message));
            }
        };

        self.cancel.store(false, Ordering::SeqCst);
        let spinner = self
            .options
            .spinner
            .then(|| Spinner::start(format!("{} is thinking...", feature.title)));
        let outcome = self.pipeline.run(&mut self.session, feature.id, input);
        drop(spinner);

        match outcome {
            Ok(completed) => self.show_completed(completed),
            Err(error) => self.show_pipeline_error(&error),
        }
    }

    fn show_completed(&mut self, completed: Completed) -> io::Result<()> {
        let feature = completed.feature;
        if let Some(ignored) = &completed.ignored_upload {
            let fallback = format!("{ignored}; using the typed text instead.");
            writeln!(self.out, "{}", self.palette.warning(&fallback))?;
        }

        writeln!(
            self.out,
            "{} {}",
            feature.icon(),
            self.palette.heading(feature.title)
        )?;

        if let CompletionResult::Failure(_) = &completed.result {
            writeln!(self.out, "{}", self.palette.error("The assistant could not answer:"))?;
        }

        let animate = feature.render_mode == RenderMode::Stream && self.options.render.animate;
        let renderer = StreamingRenderer::new(self.options.render.char_delay, animate);
        let report = renderer.render(&completed.result, &mut self.out, &self.cancel)?;
        tracing::debug!(
            feature = feature.id,
            steps = report.streamed_steps,
            cancelled = report.cancelled,
            "answer rendered"
        );

        if let Some(map) = &completed.concept_map {
            self.show_concept_map(map)?;
        }
        match (&completed.result, feature.render_mode) {
            (CompletionResult::Success(answer), RenderMode::Deck) => self.save_notes_deck(answer),
            _ => Ok(()),
        }
    }

    fn save_notes_deck(&mut self, answer: &str) -> io::Result<()> {
        let path = self.options.output_dir.join(NOTES_DECK_FILE);
        match deck::write_notes_deck(&path, NOTES_DECK_TITLE, answer) {
            Ok(()) => {
                let saved = format!("Slides saved to {}", path.display());
                writeln!(self.out, "{}", self.palette.muted(&saved))
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "notes deck not saved");
                writeln!(self.out, "{}", self.palette.error(&error.to_string()))
            }
        }
    }

    fn show_concept_map(&mut self, map: &ConceptMap) -> io::Result<()> {
        writeln!(self.out, "{}", self.palette.accent(&map.root))?;
        for (index, branch) in map.branches.iter().enumerate() {
            let connector = if index + 1 == map.branches.len() {
                "└─"
            } else {
                "├─"
            };
            writeln!(self.out, "  {connector} {branch}")?;
        }

        let path = self
            .options
            .output_dir
            .join(format!("concept-map-{}.svg", slug(&map.root)));
        match fs::write(&path, map.to_svg()) {
            Ok(()) => {
                let saved = format!("Concept map saved to {}", path.display());
                writeln!(self.out, "{}", self.palette.muted(&saved))
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "concept map not saved");
                let failed = format!("Could not save {}: {error}", path.display());
                writeln!(self.out, "{}", self.palette.error(&failed))
            }
        }
    }

    fn show_pipeline_error(&mut self, error: &PipelineError) -> io::Result<()> {
        match error {
            PipelineError::InputMissing { cause } => {
                writeln!(
                    self.out,
                    "{}",
                    self.palette.warning("Please provide some input first.")
                )?;
                if let Some(cause) = cause {
                    writeln!(self.out, "{}", self.palette.muted(&cause.to_string()))?;
                }
                Ok(())
            }
            other => writeln!(self.out, "{}", self.palette.error(&other.to_string())),
        }
    }

    fn show_menu(&mut self) -> io::Result<()> {
        let id_width = features::all()
            .iter()
            .map(|feature| feature.id.width() + 1)
            .max()
            .unwrap_or_default();

        writeln!(self.out, "{}", self.palette.heading("Features"))?;
        for feature in features::all() {
            let marker = if feature.id == self.selected.id {
                "▸"
            } else {
                " "
            };
            let icon = feature.icon();
            let icon_padding = " ".repeat(ICON_COLUMNS.saturating_sub(icon.width()));
            let command = format!("/{}", feature.id);
            let command_padding = " ".repeat(id_width - command.width());
            writeln!(
                self.out,
                "{marker} {icon}{icon_padding} {}{command_padding}  {}",
                self.palette.accent(&command),
                feature.title
            )?;
        }
        Ok(())
    }

    fn show_help(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", self.palette.heading("Commands"))?;
        for (command, description) in BUILTIN_COMMANDS {
            writeln!(
                self.out,
                "  {}  {}",
                self.palette.accent(&format!("{command:<15}")),
                description
            )?;
        }
        writeln!(
            self.out,
            "{}",
            self.palette.muted(
                "/<feature> selects a feature; /<feature> <input> runs it. Plain text runs the selected feature."
            )
        )
    }

    fn show_history(&mut self) -> io::Result<()> {
        if self.session.log.is_empty() {
            return writeln!(self.out, "{}", self.palette.muted("No interactions yet."));
        }

        for record in self.session.log.read_all_reverse() {
            writeln!(
                self.out,
                "🔹 {}",
                self.palette.heading(&record.feature_name)
            )?;
            writeln!(self.out, "{}", record.output_text)?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn show_progress(&mut self) -> io::Result<()> {
        let progress = self.session.log.progress();
        let filled = usize::from(progress) * PROGRESS_BAR_CELLS / 100;
        let bar = format!(
            "{}{}",
            "█".repeat(filled),
            "░".repeat(PROGRESS_BAR_CELLS - filled)
        );

        writeln!(self.out, "{} {progress}%", self.palette.accent(&bar))?;
        writeln!(
            self.out,
            "Total interactions: {}",
            self.session.log.activity_count()
        )?;
        writeln!(self.out, "🔥 Consistency = Success")
    }

    fn export(&mut self, path: &Path) -> io::Result<()> {
        match export::write_history(&self.session, path) {
            Ok(format) => writeln!(
                self.out,
                "{}",
                self.palette.muted(&format!(
                    "Exported {} interactions to {} ({format:?})",
                    self.session.log.len(),
                    path.display()
                ))
            ),
            Err(error) => writeln!(self.out, "{}", self.palette.error(&error.to_string())),
        }
    }
}

fn build_input(feature: &Feature, argument: FeatureArgument) -> Result<FeatureInput, String> {
    match (feature.input_shape, argument) {
        (InputShape::Document, FeatureArgument::Text(text)) => Ok(FeatureInput::text(text)),
        (InputShape::Topic, FeatureArgument::Text(topic)) => Ok(FeatureInput::Topic(topic)),
        (InputShape::Document, FeatureArgument::Attachment { path, text }) => {
            Ok(FeatureInput::Document {
                text,
                upload: Some(read_upload(&path)?),
            })
        }
        (InputShape::Audio, FeatureArgument::Attachment { path, .. }) => {
            Ok(FeatureInput::Audio(read_upload(&path)?))
        }
        (
            InputShape::Planner,
            FeatureArgument::Planner {
                subject,
                hours,
                exam_date,
            },
        ) => PlannerRequest::parse(&subject, &hours, &exam_date)
            .map(FeatureInput::Planner)
            .map_err(|error| error.to_string()),
        (shape, _) => Err(format!("{} expects {shape} input", feature.title)),
    }
}

fn read_upload(path: &Path) -> Result<Upload, String> {
    Upload::read(path).map_err(|error| format!("could not read {}: {error}", path.display()))
}

fn input_hint(shape: InputShape) -> &'static str {
    match shape {
        InputShape::Document => "Type text, or @file.pdf|.txt|.pptx [text].",
        InputShape::Topic => "Type a topic.",
        InputShape::Planner => "Type: subject | hours per day | YYYY-MM-DD.",
        InputShape::Audio => "Type @recording.wav.",
    }
}

fn slug(text: &str) -> String {
    let mut slug = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "topic".to_string()
    } else {
        slug.to_string()
    }
}

/// Routes SIGINT into the shell's cancel flag while the shell runs.
struct InterruptGuard(SigId);

impl InterruptGuard {
    fn install(flag: Arc<AtomicBool>) -> io::Result<Self> {
        signal_hook::flag::register(signal_hook::consts::SIGINT, flag).map(Self)
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.0);
    }
}

struct SlashHelper {
    commands: Vec<String>,
    color: bool,
}

impl SlashHelper {
    fn new(color: bool) -> Self {
        let builtins = ["/menu", "/history", "/progress", "/theme", "/export", "/help", "/quit"];
        let commands = builtins
            .iter()
            .map(|command| command.to_string())
            .chain(features::all().iter().map(|feature| format!("/{}", feature.id)))
            .collect();
        Self { commands, color }
    }
}

impl Helper for SlashHelper {}

impl Completer for SlashHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, Vec::new()));
        }

        let candidates = self
            .commands
            .iter()
            .filter(|command| command.starts_with(line))
            .map(|command| Pair {
                display: command.clone(),
                replacement: command.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for SlashHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        self.commands
            .iter()
            .find(|command| command.starts_with(line) && command.len() > line.len())
            .map(|command| command[line.len()..].to_string())
    }
}

impl Highlighter for SlashHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.color && line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if self.color {
            Owned(hint.bright_black().to_string())
        } else {
            Borrowed(hint)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        self.color
    }
}

impl Validator for SlashHelper {}

/// Reads lines from the terminal until `/quit` or end of input.
pub fn run_interactive(pipeline: Pipeline, options: ShellOptions) -> rustyline::Result<()> {
    let color = options.color;
    let mut shell = Shell::new(pipeline, options, io::stdout());
    let _interrupt = InterruptGuard::install(shell.cancel_flag())?;

    let mut editor = Editor::new()?;
    editor.set_helper(Some(SlashHelper::new(color)));

    shell.banner()?;
    tracing::info!(session = shell.session().session_id(), "shell started");

    loop {
        match editor.readline(&shell.prompt()) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line.as_str());
                if shell.handle_line(&line)? == Flow::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                writeln!(io::stdout(), "Ctrl-C: type /quit to leave.")?;
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(error),
        }
    }

    tracing::info!(
        interactions = shell.session().log.activity_count(),
        "shell finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_keeps_alphanumerics() {
        assert_eq!(slug("Cell Biology!"), "cell-biology");
        assert_eq!(slug("  Photo--synthesis  "), "photo-synthesis");
        assert_eq!(slug("???"), "topic");
    }

    #[test]
    fn helper_completes_commands_and_features() {
        let helper = SlashHelper::new(false);

        assert!(helper.commands.contains(&"/quiz".to_string()));
        assert!(helper.commands.contains(&"/export".to_string()));
        assert_eq!(helper.commands.len(), 7 + features::all().len());
    }

    #[test]
    fn input_is_built_for_the_feature_shape() {
        let topic = features::lookup("memory-challenge").expect("feature");
        assert_eq!(
            build_input(topic, FeatureArgument::Text("atoms".to_string())),
            Ok(FeatureInput::Topic("atoms".to_string()))
        );

        let planner = features::lookup("planner").expect("feature");
        assert!(build_input(planner, FeatureArgument::Text("atoms".to_string())).is_err());
        assert!(build_input(
            planner,
            FeatureArgument::Planner {
                subject: "Physics".to_string(),
                hours: "12".to_string(),
                exam_date: "2026-12-01".to_string(),
            }
        )
        .is_err_and(|message| message.contains("between 1 and 10")));
    }

    #[test]
    fn missing_attachment_is_reported() {
        let explain = features::lookup("explain").expect("feature");
        let error = build_input(
            explain,
            FeatureArgument::Attachment {
                path: PathBuf::from("/definitely/not/here.pdf"),
                text: String::new(),
            },
        )
        .expect_err("missing file");

        assert!(error.starts_with("could not read /definitely/not/here.pdf"));
    }
}
