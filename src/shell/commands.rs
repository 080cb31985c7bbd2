use std::path::PathBuf;

use crate::features::{self, Feature, InputShape};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Menu,
    Help,
    History,
    Progress,
    Theme,
    Export(PathBuf),
    Quit,
    /// `/<feature-id>` alone selects the feature; with an argument it also runs it.
    Feature {
        feature: &'static Feature,
        argument: Option<String>,
    },
    Unknown(String),
}

/// `None` for plain text, which runs the selected feature.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/menu" => SlashCommand::Menu,
        "/help" => SlashCommand::Help,
        "/history" => SlashCommand::History,
        "/progress" => SlashCommand::Progress,
        "/theme" => SlashCommand::Theme,
        "/export" if !rest.is_empty() => SlashCommand::Export(PathBuf::from(rest)),
        "/quit" | "/exit" => SlashCommand::Quit,
        _ => match features::lookup(&command[1..]) {
            Some(feature) => SlashCommand::Feature {
                feature,
                argument: (!rest.is_empty()).then(|| rest.to_string()),
            },
            None => SlashCommand::Unknown(command.to_string()),
        },
    };

    Some(parsed)
}

/// What the user typed for one feature, before any file is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureArgument {
    Text(String),
    Attachment { path: PathBuf, text: String },
    Planner {
        subject: String,
        hours: String,
        exam_date: String,
    },
}

/// Splits a feature argument according to the feature's input shape:
/// `@path [text]` attaches a file, planner fields are `subject | hours | date`.
pub fn parse_feature_argument(
    shape: InputShape,
    argument: &str,
) -> Result<FeatureArgument, String> {
    let argument = argument.trim();

    match shape {
        InputShape::Planner => {
            let fields: Vec<&str> = argument.split('|').map(str::trim).collect();
            match fields.as_slice() {
                [subject, hours, exam_date] => Ok(FeatureArgument::Planner {
                    subject: subject.to_string(),
                    hours: hours.to_string(),
                    exam_date: exam_date.to_string(),
                }),
                _ => Err("usage: /planner <subject> | <hours per day> | <YYYY-MM-DD>".to_string()),
            }
        }
        InputShape::Audio => {
            let path = argument.strip_prefix('@').unwrap_or(argument).trim();
            if path.is_empty() {
                return Err("usage: /voice @<recording.wav>".to_string());
            }
            Ok(FeatureArgument::Attachment {
                path: PathBuf::from(path),
                text: String::new(),
            })
        }
        InputShape::Document => match argument.strip_prefix('@') {
            Some(rest) => {
                let (path, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                if path.is_empty() {
                    return Err("usage: @<file> [text]".to_string());
                }
                Ok(FeatureArgument::Attachment {
                    path: PathBuf::from(path),
                    text: text.trim().to_string(),
                })
            }
            None => Ok(FeatureArgument::Text(argument.to_string())),
        },
        InputShape::Topic => Ok(FeatureArgument::Text(argument.to_string())),
    }
}
