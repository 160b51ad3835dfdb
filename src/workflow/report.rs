//! JSON run report written by `classify --report`.

use crate::util::{display_path, preview};
use crate::workflow::process::{RowOutcome, RowRecord};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub const REPORT_SCHEMA_VERSION: u32 = 1;

const RAW_REPLY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: u32,
    pub input: String,
    pub output: String,
    pub output_content_type: String,
    pub provider: String,
    pub model: String,
    pub total_rows: usize,
    /// Model calls made (rows with feedback).
    pub calls: usize,
    /// Row count per result value, labels and sentinels alike.
    pub counts: BTreeMap<String, usize>,
    pub unmatched: Vec<UnmatchedReply>,
    pub errors: Vec<RowError>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnmatchedReply {
    pub row: usize,
    pub feedback: String,
    pub raw_reply: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub feedback: String,
    pub kind: String,
    pub message: String,
}

/// Where a run read from and wrote to.
pub struct RunTarget<'a> {
    /// Paths are shown relative to this directory when under it.
    pub base: Option<&'a Path>,
    pub input: &'a Path,
    pub output: &'a Path,
    pub content_type: &'a str,
    pub provider: &'a str,
    pub model: &'a str,
}

impl RunReport {
    pub fn from_records(target: &RunTarget<'_>, records: &[RowRecord], elapsed: Duration) -> Self {
        let mut counts = BTreeMap::new();
        let mut unmatched = Vec::new();
        let mut errors = Vec::new();
        let mut calls = 0;

        for record in records {
            *counts
                .entry(record.outcome.result().to_string())
                .or_insert(0) += 1;
            if let Some(call) = &record.call {
                calls += 1;
                if let (RowOutcome::Uncategorized, Ok(raw)) = (&record.outcome, &call.reply) {
                    unmatched.push(UnmatchedReply {
                        row: record.sheet_row(),
                        feedback: record.feedback.clone(),
                        raw_reply: preview(raw, RAW_REPLY_PREVIEW_CHARS),
                    });
                }
            }
            if let RowOutcome::RequestError { error } = &record.outcome {
                errors.push(RowError {
                    row: record.sheet_row(),
                    feedback: record.feedback.clone(),
                    kind: error.kind().to_string(),
                    message: error.to_string(),
                });
            }
        }

        Self {
            schema_version: REPORT_SCHEMA_VERSION,
            input: display_path(target.input, target.base),
            output: display_path(target.output, target.base),
            output_content_type: target.content_type.to_string(),
            provider: target.provider.to_string(),
            model: target.model.to_string(),
            total_rows: records.len(),
            calls,
            counts,
            unmatched,
            errors,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// One-line human summary, e.g. `3 rows: Billing=1, ERROR=1, ...`.
    pub fn summary_line(&self) -> String {
        let counts: Vec<String> = self
            .counts
            .iter()
            .map(|(result, count)| format!("{result}={count}"))
            .collect();
        format!("{} rows: {}", self.total_rows, counts.join(", "))
    }
}
