//! Sequential row processing: compose, call, normalize.
//!
//! Rows are handled strictly in input order and one at a time. A failure on
//! one row is recorded as that row's outcome and never stops the run.

use crate::model::{CallError, ModelClient};
use crate::normalize::normalize;
use crate::prompt::compose;
use crate::taxonomy;
use std::time::{Duration, Instant};

/// Labels and descriptions a run classifies against.
#[derive(Debug, Clone, Copy)]
pub struct Taxonomy<'a> {
    pub labels: &'a [String],
    pub descriptions: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Classified { label: String },
    NoFeedback,
    Uncategorized,
    RequestError { error: CallError },
}

impl RowOutcome {
    /// The value written to the result column.
    pub fn result(&self) -> &str {
        match self {
            Self::Classified { label } => label,
            Self::NoFeedback => taxonomy::NO_FEEDBACK,
            Self::Uncategorized => taxonomy::UNCATEGORIZED,
            Self::RequestError { .. } => taxonomy::REQUEST_ERROR,
        }
    }
}

/// What happened during the model call for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTrace {
    pub prompt: String,
    pub reply: Result<String, CallError>,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    /// 0-based index into the data rows.
    pub index: usize,
    pub feedback: String,
    pub outcome: RowOutcome,
    /// Absent when no call was made.
    pub call: Option<CallTrace>,
}

impl RowRecord {
    /// 1-based spreadsheet row number, counting the header row.
    pub fn sheet_row(&self) -> usize {
        self.index + 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }
}

/// Classify every row, calling `on_row` after each one completes.
pub fn process_rows<C, F>(
    client: &C,
    topics: Taxonomy<'_>,
    feedback: &[&str],
    mut on_row: F,
) -> Vec<RowRecord>
where
    C: ModelClient + ?Sized,
    F: FnMut(&RowRecord, Progress),
{
    let total = feedback.len();
    let mut records = Vec::with_capacity(total);

    for (index, text) in feedback.iter().enumerate() {
        let record = process_row(client, topics, index, text);
        tracing::info!(
            row = record.sheet_row(),
            result = record.outcome.result(),
            "row processed"
        );
        let progress = Progress {
            completed: index + 1,
            total,
        };
        on_row(&record, progress);
        records.push(record);
    }

    records
}

fn process_row<C: ModelClient + ?Sized>(
    client: &C,
    topics: Taxonomy<'_>,
    index: usize,
    feedback: &str,
) -> RowRecord {
    let trimmed = feedback.trim();
    if trimmed.is_empty() {
        return RowRecord {
            index,
            feedback: feedback.to_string(),
            outcome: RowOutcome::NoFeedback,
            call: None,
        };
    }

    let prompt = compose(feedback, topics.labels, topics.descriptions);
    let start = Instant::now();
    let reply = client.complete(&prompt);
    let duration = start.elapsed();

    let outcome = match &reply {
        Ok(raw) => match normalize(raw, topics.labels) {
            taxonomy::UNCATEGORIZED => {
                tracing::warn!(
                    row = index + 2,
                    raw_reply = %raw,
                    feedback = %feedback,
                    "model reply matched no label"
                );
                RowOutcome::Uncategorized
            }
            label => RowOutcome::Classified {
                label: label.to_string(),
            },
        },
        Err(error) => {
            tracing::error!(
                row = index + 2,
                feedback = %feedback,
                error = %error,
                "classification failed"
            );
            RowOutcome::RequestError {
                error: error.clone(),
            }
        }
    };

    RowRecord {
        index,
        feedback: feedback.to_string(),
        outcome,
        call: Some(CallTrace {
            prompt,
            reply,
            duration,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Replies by looking the prompt up against feedback keywords.
    struct KeywordClient {
        rules: Vec<(&'static str, Result<&'static str, CallError>)>,
        prompts: RefCell<Vec<String>>,
    }

    impl KeywordClient {
        fn new(rules: Vec<(&'static str, Result<&'static str, CallError>)>) -> Self {
            Self {
                rules,
                prompts: RefCell::new(Vec::new()),
            }
        }
    }

    impl ModelClient for KeywordClient {
        fn complete(&self, prompt: &str) -> Result<String, CallError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            let feedback = prompt
                .rsplit_once("Feedback: ")
                .map(|(_, tail)| tail)
                .unwrap_or_default();
            for (keyword, reply) in &self.rules {
                if feedback.contains(keyword) {
                    return reply.clone().map(str::to_string);
                }
            }
            Ok("no idea".to_string())
        }
    }

    fn labels() -> Vec<String> {
        ["Billing", "Package Information", "Others"]
            .iter()
            .map(|label| label.to_string())
            .collect()
    }

    #[test]
    fn blank_rows_get_no_feedback_without_calls() {
        let client = KeywordClient::new(Vec::new());
        let labels = labels();
        let topics = Taxonomy {
            labels: &labels,
            descriptions: &[],
        };

        let records = process_rows(&client, topics, &["", "   ", "\t\n"], |_, _| {});

        assert!(records
            .iter()
            .all(|record| record.outcome == RowOutcome::NoFeedback && record.call.is_none()));
        assert!(client.prompts.borrow().is_empty());
    }

    #[test]
    fn mixed_rows_keep_order_and_count() {
        let client = KeywordClient::new(vec![
            ("paket", Ok("package information")),
            ("tagihan", Ok("I think this is about billing and payments")),
            ("rusak", Err(CallError::UnexpectedShape)),
        ]);
        let labels = labels();
        let topics = Taxonomy {
            labels: &labels,
            descriptions: &[],
        };
        let feedback = [
            "",
            "Saya mau tanya paket internet",
            "tagihan bulan ini",
            "respon rusak",
            "halo",
        ];

        let records = process_rows(&client, topics, &feedback, |_, _| {});

        let results: Vec<&str> = records.iter().map(|r| r.outcome.result()).collect();
        assert_eq!(
            results,
            vec![
                taxonomy::NO_FEEDBACK,
                "Package Information",
                "Billing",
                taxonomy::REQUEST_ERROR,
                taxonomy::UNCATEGORIZED,
            ]
        );
        assert_eq!(records.len(), feedback.len());
        assert_eq!(client.prompts.borrow().len(), 4);
        assert_eq!(records[3].sheet_row(), 5);
    }

    #[test]
    fn progress_is_reported_after_every_row() {
        let client = KeywordClient::new(Vec::new());
        let labels = labels();
        let topics = Taxonomy {
            labels: &labels,
            descriptions: &[],
        };
        let mut seen = Vec::new();

        process_rows(&client, topics, &["a", "", "c", "d"], |record, progress| {
            seen.push((record.index, progress.completed, progress.fraction()));
        });

        assert_eq!(
            seen,
            vec![(0, 1, 0.25), (1, 2, 0.5), (2, 3, 0.75), (3, 4, 1.0)]
        );
    }

    #[test]
    fn prompt_embeds_feedback_verbatim() {
        let client = KeywordClient::new(Vec::new());
        let labels = labels();
        let topics = Taxonomy {
            labels: &labels,
            descriptions: &[],
        };

        let records = process_rows(&client, topics, &["  spaced \"quoted\"  "], |_, _| {});

        let call = records[0].call.as_ref().expect("call made");
        assert!(call.prompt.contains("Feedback: \"  spaced \"quoted\"  \""));
        assert_eq!(call.reply, Ok("no idea".to_string()));
    }

    #[test]
    fn empty_input_reports_complete() {
        assert_eq!(
            Progress {
                completed: 0,
                total: 0
            }
            .fraction(),
            1.0
        );
    }
}
