mod error;
mod log;
mod progress;
mod record;
mod state;

pub use error::SessionLogError;
pub use log::{ReverseRecords, SessionLog};
pub use progress::{progress_for, PROGRESS_CAP, PROGRESS_STEP};
pub use record::InteractionRecord;
pub use state::{SessionState, Theme};
