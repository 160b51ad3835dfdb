use crate::cli::{LabelsArgs, PromptArgs};
use crate::config::{load_effective_config, TaggerConfig};
use crate::prompt::compose;
use crate::taxonomy;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct LabelsView<'a> {
    labels: &'a [String],
    descriptions: &'a [String],
    sentinels: Sentinels,
    feedback_column: &'a str,
    result_column: &'a str,
}

#[derive(Debug, Serialize)]
struct Sentinels {
    no_feedback: &'static str,
    uncategorized: &'static str,
    request_error: &'static str,
}

/// Print the prompt one feedback string would produce. Makes no network call.
pub fn run_prompt(args: &PromptArgs) -> Result<()> {
    let (config, _) = load_effective_config(args.config.as_deref())?;
    print!(
        "{}",
        compose(&args.feedback, &config.labels, &config.descriptions)
    );
    Ok(())
}

pub fn run_labels(args: &LabelsArgs) -> Result<()> {
    let (config, source) = load_effective_config(args.config.as_deref())?;
    if args.json {
        let text = serde_json::to_string_pretty(&labels_view(&config))
            .context("serialize labels")?;
        println!("{text}");
        return Ok(());
    }

    match source {
        Some(path) => println!("config: {}", path.display()),
        None => println!("config: built-in defaults"),
    }
    println!(
        "columns: {} -> {}",
        config.feedback_column, config.result_column
    );
    println!("labels:");
    for (index, label) in config.labels.iter().enumerate() {
        println!("  {:>2}. {label}", index + 1);
    }
    println!("sentinels:");
    println!("  no feedback:   {}", taxonomy::NO_FEEDBACK);
    println!("  uncategorized: {}", taxonomy::UNCATEGORIZED);
    println!("  request error: {}", taxonomy::REQUEST_ERROR);
    Ok(())
}

fn labels_view(config: &TaggerConfig) -> LabelsView<'_> {
    LabelsView {
        labels: &config.labels,
        descriptions: &config.descriptions,
        sentinels: Sentinels {
            no_feedback: taxonomy::NO_FEEDBACK,
            uncategorized: taxonomy::UNCATEGORIZED,
            request_error: taxonomy::REQUEST_ERROR,
        },
        feedback_column: &config.feedback_column,
        result_column: &config.result_column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    #[test]
    fn labels_view_lists_labels_and_sentinels() {
        let config = default_config();
        let value = serde_json::to_value(labels_view(&config)).expect("serialize");

        assert_eq!(value["labels"].as_array().map(Vec::len), Some(14));
        assert_eq!(value["sentinels"]["request_error"], "ERROR");
        assert_eq!(value["result_column"], "Kategori Feedback");
    }
}
