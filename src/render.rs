//! Streaming renderer.
//!
//! [`PrefixStream`] yields strictly longer prefixes of an already known answer,
//! one user-perceived character (grapheme cluster) per step. [`StreamingRenderer`]
//! paces those steps onto a writer and can be cut short, in which case the
//! remainder is written at once. Content is never altered or dropped.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use unicode_segmentation::{GraphemeIndices, UnicodeSegmentation};

use crate::completion::CompletionResult;

/// One reveal step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    /// Everything revealed so far, including `delta`.
    pub prefix: &'a str,
    /// The character added by this step.
    pub delta: &'a str,
}

pub struct PrefixStream<'a> {
    text: &'a str,
    graphemes: GraphemeIndices<'a>,
}

impl<'a> Iterator for PrefixStream<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (start, grapheme) = self.graphemes.next()?;
        let end = start + grapheme.len();
        Some(Frame {
            prefix: &self.text[..end],
            delta: grapheme,
        })
    }
}

#[must_use]
pub fn prefixes(text: &str) -> PrefixStream<'_> {
    PrefixStream {
        text,
        graphemes: text.grapheme_indices(true),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderReport {
    /// Characters revealed one at a time.
    pub streamed_steps: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingRenderer {
    delay: Duration,
    animate: bool,
}

impl StreamingRenderer {
    #[must_use]
    pub fn new(delay: Duration, animate: bool) -> Self {
        Self { delay, animate }
    }

    /// Streams a success character by character; shows a failure reason once.
    /// Output always ends with a newline.
    pub fn render<W: Write>(
        &self,
        result: &CompletionResult,
        out: &mut W,
        cancel: &AtomicBool,
    ) -> io::Result<RenderReport> {
        match result {
            CompletionResult::Success(text) if self.animate => self.stream(text, out, cancel),
            CompletionResult::Success(text) | CompletionResult::Failure(text) => {
                write_block(text, out)?;
                Ok(RenderReport {
                    streamed_steps: 0,
                    cancelled: false,
                })
            }
        }
    }

    fn stream<W: Write>(
        &self,
        text: &str,
        out: &mut W,
        cancel: &AtomicBool,
    ) -> io::Result<RenderReport> {
        let mut report = RenderReport {
            streamed_steps: 0,
            cancelled: false,
        };

        for frame in prefixes(text) {
            if cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                // The frame's delta has not been written yet.
                let written = frame.prefix.len() - frame.delta.len();
                out.write_all(text[written..].as_bytes())?;
                break;
            }

            out.write_all(frame.delta.as_bytes())?;
            out.flush()?;
            report.streamed_steps += 1;

            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
        }

        if !text.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(report)
    }
}

fn write_block<W: Write>(text: &str, out: &mut W) -> io::Result<()> {
    out.write_all(text.as_bytes())?;
    if !text.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}
