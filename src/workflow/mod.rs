//! Command orchestration for the feedback tagger.
//!
//! `process` holds the per-row loop; the other modules wire it to files,
//! reports and logs so the CLI stays thin.
mod call_log;
mod classify;
mod process;
mod report;
mod show;

pub use classify::run_classify;
pub use show::{run_labels, run_prompt};
