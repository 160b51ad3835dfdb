use crate::cli::ClassifyArgs;
use crate::config::{self, ModelOverrides, TaggerConfig};
use crate::model::{HttpModelClient, ModelClient};
use crate::sheet::{self, Table};
use crate::staging;
use crate::workflow::call_log::{self, CallLog};
use crate::workflow::process::{process_rows, Progress, RowRecord, Taxonomy};
use crate::workflow::report::{RunReport, RunTarget};
use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Run `ftag classify`.
///
/// Every fatal condition (unreadable input, missing column, incomplete model
/// settings) is detected before the first model call, and the output file is
/// only published once all rows are done.
pub fn run_classify(args: &ClassifyArgs) -> Result<()> {
    let start = Instant::now();
    let (config, config_path) = config::load_effective_config(args.config.as_deref())?;
    match &config_path {
        Some(path) => tracing::debug!(path = %path.display(), "loaded config"),
        None => tracing::debug!("no config file; using built-in taxonomy"),
    }

    let overrides = ModelOverrides {
        provider: args.provider,
        endpoint: args.endpoint.clone(),
        api_key: args.api_key.clone(),
        model: args.model.clone(),
    };
    let model_config =
        config::resolve_model_config(&config, &overrides, |name| std::env::var(name).ok())?;

    let output = output_path(&args.input, args.output.as_deref());
    if same_file(&args.input, &output) {
        return Err(anyhow!(
            "output {} would overwrite the input spreadsheet",
            output.display()
        ));
    }

    let table = sheet::read_table(&args.input)?;
    table.require_column(&config.feedback_column)?;

    let client = HttpModelClient::new(model_config);
    let provider = client.config().provider.to_string();
    let model = client.config().model.clone();
    tracing::info!(
        provider = %provider,
        model = %model,
        rows = table.row_count(),
        input = %args.input.display(),
        "starting classification"
    );

    let mut call_log = args.call_log.as_deref().map(CallLog::create).transpose()?;
    report_progress(Progress {
        completed: 0,
        total: table.row_count(),
    });
    let (annotated, records) = classify_table(table, &config, &client, |record, progress| {
        report_progress(progress);
        if let Some(log) = call_log.as_mut() {
            append_call_log(log, record);
        }
    })?;

    let bytes = sheet::workbook_bytes(&annotated)?;
    staging::publish_bytes(&output, &bytes)?;

    let cwd = std::env::current_dir().ok();
    let target = RunTarget {
        base: cwd.as_deref(),
        input: &args.input,
        output: &output,
        content_type: sheet::OUTPUT_CONTENT_TYPE,
        provider: &provider,
        model: &model,
    };
    let report = RunReport::from_records(&target, &records, start.elapsed());
    if let Some(path) = &args.report {
        staging::publish_json(path, &report)?;
    }

    tracing::info!(
        elapsed_ms = report.elapsed_ms,
        unmatched = report.unmatched.len(),
        errors = report.errors.len(),
        "classification complete"
    );
    println!("{}", report.summary_line());
    println!("wrote {} ({})", report.output, report.output_content_type);
    Ok(())
}

/// Classify the feedback column of `table` and attach the result column.
pub fn classify_table<C, F>(
    table: Table,
    config: &TaggerConfig,
    client: &C,
    on_row: F,
) -> Result<(Table, Vec<RowRecord>)>
where
    C: ModelClient + ?Sized,
    F: FnMut(&RowRecord, Progress),
{
    let column = table.require_column(&config.feedback_column)?;
    let taxonomy = Taxonomy {
        labels: &config.labels,
        descriptions: &config.descriptions,
    };

    let records = {
        let values = table.column_values(column);
        let feedback: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
        process_rows(client, taxonomy, &feedback, on_row)
    };

    let results = records
        .iter()
        .map(|record| record.outcome.result().to_string())
        .collect();
    let table = table.with_column(&config.result_column, results)?;
    Ok((table, records))
}

fn output_path(input: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(sheet::OUTPUT_FILE_NAME),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn report_progress(progress: Progress) {
    eprintln!(
        "{}/{} feedback diproses ({:.0}%)",
        progress.completed,
        progress.total,
        progress.fraction() * 100.0
    );
}

fn append_call_log(log: &mut CallLog, record: &RowRecord) {
    let Some(entry) = call_log::entry_for_record(record) else {
        return;
    };
    if let Err(err) = log.append(&entry) {
        tracing::warn!(
            path = %log.path().display(),
            error = %format!("{err:#}"),
            "failed to write call log entry"
        );
    }
}
