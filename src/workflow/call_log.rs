//! Per-call model log for run transparency.
//!
//! When `--call-log <path>` is given, one JSON line is written for every row
//! that reached the model:
//!
//! ```jsonl
//! {"schema_version":1,"ts":1707900000000,"row":2,"duration_ms":840,"outcome":"classified","result":"Billing",...}
//! {"schema_version":1,"ts":1707900001200,"row":4,"duration_ms":60012,"outcome":"failed","result":"ERROR",...}
//! ```
//!
//! Rows with no feedback never reach the model and are not logged.

use crate::model::CallError;
use crate::util::{now_epoch_ms, preview};
use crate::workflow::process::{RowOutcome, RowRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CALL_LOG_SCHEMA_VERSION: u32 = 1;

const PROMPT_PREVIEW_CHARS: usize = 500;
const REPLY_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The reply matched a label.
    Classified,
    /// The reply arrived but matched no label.
    Uncategorized,
    /// No usable reply.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogEntry {
    pub schema_version: u32,

    /// Unix timestamp in milliseconds when the entry was written.
    pub ts: u64,

    /// Spreadsheet row number (header is row 1).
    pub row: usize,

    pub duration_ms: u64,

    pub outcome: CallOutcome,

    /// Value written to the result column.
    pub result: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw_reply: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prompt_preview: Option<String>,
}

/// Builder for call log entries.
pub struct CallLogBuilder {
    row: usize,
    duration: Duration,
    prompt_preview: Option<String>,
}

impl CallLogBuilder {
    pub fn new(row: usize, duration: Duration) -> Self {
        Self {
            row,
            duration,
            prompt_preview: None,
        }
    }

    /// Attach a preview of the prompt, truncated to 500 characters.
    pub fn with_prompt_preview(mut self, prompt: &str) -> Self {
        self.prompt_preview = Some(preview(prompt, PROMPT_PREVIEW_CHARS));
        self
    }

    pub fn classified(self, raw_reply: &str, label: &str) -> CallLogEntry {
        self.build(CallOutcome::Classified, label, Some(raw_reply), None)
    }

    pub fn uncategorized(self, raw_reply: &str, result: &str) -> CallLogEntry {
        self.build(CallOutcome::Uncategorized, result, Some(raw_reply), None)
    }

    pub fn failed(self, error: &CallError, result: &str) -> CallLogEntry {
        self.build(CallOutcome::Failed, result, None, Some(error))
    }

    fn build(
        self,
        outcome: CallOutcome,
        result: &str,
        raw_reply: Option<&str>,
        error: Option<&CallError>,
    ) -> CallLogEntry {
        CallLogEntry {
            schema_version: CALL_LOG_SCHEMA_VERSION,
            ts: now_epoch_ms(),
            row: self.row,
            duration_ms: self.duration.as_millis() as u64,
            outcome,
            result: result.to_string(),
            raw_reply: raw_reply.map(|reply| preview(reply, REPLY_PREVIEW_CHARS)),
            error_kind: error.map(|err| err.kind().to_string()),
            error: error.map(ToString::to_string),
            prompt_preview: self.prompt_preview,
        }
    }
}

/// Build the log entry for a processed row, if it reached the model.
pub fn entry_for_record(record: &RowRecord) -> Option<CallLogEntry> {
    let call = record.call.as_ref()?;
    let builder =
        CallLogBuilder::new(record.sheet_row(), call.duration).with_prompt_preview(&call.prompt);
    let result = record.outcome.result();

    let entry = match (&record.outcome, &call.reply) {
        (RowOutcome::Classified { label }, Ok(raw)) => builder.classified(raw, label),
        (_, Ok(raw)) => builder.uncategorized(raw, result),
        (_, Err(err)) => builder.failed(err, result),
    };
    Some(entry)
}

/// An open JSONL call log. Each run starts a fresh file.
pub struct CallLog {
    path: PathBuf,
    file: File,
}

impl CallLog {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create call log directory {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("create call log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, entry: &CallLogEntry) -> Result<()> {
        let line = serde_json::to_string(entry).context("serialize call log entry")?;
        writeln!(self.file, "{line}")
            .with_context(|| format!("write call log {}", self.path.display()))?;
        self.file
            .flush()
            .with_context(|| format!("flush call log {}", self.path.display()))
    }
}
