//! Busy indicator shown while a provider call is in flight.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Animates on stderr from a background thread until stopped or dropped.
pub struct Spinner {
    stop_flag: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn start(message: impl Into<String>) -> Self {
        Self::start_with(message.into(), io::stderr)
    }

    fn start_with<W, F>(message: String, make_writer: F) -> Self
    where
        W: Write,
        F: Fn() -> W + Send + 'static,
    {
        let stop_flag = Arc::new(AtomicBool::new(false));

        let thread = thread::spawn({
            let stop_flag = Arc::clone(&stop_flag);
            move || {
                let mut frame = 0;
                while !stop_flag.load(Ordering::SeqCst) {
                    let mut out = make_writer();
                    let glyph = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
                    let _ = write!(out, "\r{glyph} {message}");
                    let _ = out.flush();
                    frame += 1;
                    thread::sleep(FRAME_INTERVAL);
                }

                let mut out = make_writer();
                let _ = write!(out, "\r\x1b[2K");
                let _ = out.flush();
            }
        });

        Self {
            stop_flag,
            thread: Some(thread),
        }
    }

    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}
