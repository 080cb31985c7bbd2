use std::io::Write;
use std::iter::Rev;
use std::slice::Iter;

use crate::error::SessionLogError;
use crate::progress::progress_for;
use crate::record::InteractionRecord;

/// Append-only history of successful interactions for one session.
///
/// `activity_count` is bumped by exactly one per [`SessionLog::append`], so it
/// always equals the number of records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLog {
    records: Vec<InteractionRecord>,
    activity_count: u64,
}

/// Most-recent-first view over the log. Each call to
/// [`SessionLog::read_all_reverse`] starts a fresh pass.
pub type ReverseRecords<'a> = Rev<Iter<'a, InteractionRecord>>;

impl SessionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one interaction with `ordinal = len()` and counts it.
    pub fn append(
        &mut self,
        feature_name: impl Into<String>,
        input_text: impl Into<String>,
        output_text: impl Into<String>,
    ) -> &InteractionRecord {
        let ordinal = self.records.len();
        self.records.push(InteractionRecord::new(
            ordinal,
            feature_name,
            input_text,
            output_text,
        ));
        self.activity_count += 1;
        &self.records[ordinal]
    }

    /// Records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    #[must_use]
    pub fn read_all_reverse(&self) -> ReverseRecords<'_> {
        self.records.iter().rev()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn activity_count(&self) -> u64 {
        self.activity_count
    }

    /// Learning progress in percent, derived from `activity_count` on every call.
    #[must_use]
    pub fn progress(&self) -> u8 {
        progress_for(self.activity_count)
    }

    /// Writes `"{feature}:\n{output}\n\n"` per record, most recent first.
    pub fn export_text<W: Write>(&self, mut writer: W) -> Result<(), SessionLogError> {
        for record in self.read_all_reverse() {
            write!(
                writer,
                "{}:\n{}\n\n",
                record.feature_name, record.output_text
            )
            .map_err(|source| SessionLogError::io("writing text export", source))?;
        }

        writer
            .flush()
            .map_err(|source| SessionLogError::io("flushing text export", source))
    }

    /// Writes one JSON object per line, in insertion order.
    pub fn export_jsonl<W: Write>(&self, mut writer: W) -> Result<(), SessionLogError> {
        for record in &self.records {
            let line = serde_json::to_string(record)
                .map_err(|source| SessionLogError::json_serialize(record.ordinal, source))?;
            writeln!(writer, "{line}")
                .map_err(|source| SessionLogError::io("writing jsonl export", source))?;
        }

        writer
            .flush()
            .map_err(|source| SessionLogError::io("flushing jsonl export", source))
    }
}
