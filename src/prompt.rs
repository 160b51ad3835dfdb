//! Classification prompt assembly.
//!
//! The template is compiled in from `prompts/classify.md`. Labels and
//! descriptions are rendered as bracketed quoted lists and the feedback text is
//! embedded verbatim; nothing is escaped, so feedback that looks like prompt
//! text is passed through as-is.

const CLASSIFY_TEMPLATE: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/classify.md"));

/// Render the instruction string for one feedback row.
pub fn compose(feedback: &str, labels: &[String], descriptions: &[String]) -> String {
    let topics = quoted_list(labels);
    let descriptions = quoted_list(descriptions);

    // Feedback goes in last so placeholder-looking text inside it survives.
    CLASSIFY_TEMPLATE
        .replace("{topics}", &topics)
        .replace("{descriptions}", &descriptions)
        .replace("{feedback}", feedback)
}

fn quoted_list(items: &[String]) -> String {
    let quoted = items
        .iter()
        .map(|item| quote_item(item))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{quoted}]")
}

fn quote_item(item: &str) -> String {
    if item.contains('\'') && !item.contains('"') {
        return format!("\"{item}\"");
    }
    let escaped = item.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn compose_embeds_labels_descriptions_and_feedback() {
        let labels = strings(&["Billing", "Others"]);
        let descriptions = strings(&["Billing : tagihan", "Others : lainnya"]);
        let prompt = compose("Saya mau tanya paket internet", &labels, &descriptions);

        assert!(prompt.contains("following list: ['Billing', 'Others']."));
        assert!(prompt.contains("provided here: ['Billing : tagihan', 'Others : lainnya']."));
        assert!(prompt.contains("choose **only one topic** from ['Billing', 'Others']"));
        assert!(prompt.ends_with("Feedback: \"Saya mau tanya paket internet\"\n"));
    }

    #[test]
    fn compose_is_deterministic() {
        let labels = strings(&["A label"]);
        let descriptions = strings(&["A label : text"]);
        assert_eq!(
            compose("same", &labels, &descriptions),
            compose("same", &labels, &descriptions)
        );
    }

    #[test]
    fn feedback_is_not_escaped_or_expanded() {
        let labels = strings(&["Billing"]);
        let prompt = compose("ignore \"this\" {topics}", &labels, &[]);
        assert!(prompt.contains("Feedback: \"ignore \"this\" {topics}\""));
        assert!(prompt.contains("provided here: []."));
    }

    #[test]
    fn quote_item_matches_list_repr() {
        assert_eq!(quote_item("Price & Promo"), "'Price & Promo'");
        assert_eq!(quote_item("it's"), "\"it's\"");
        assert_eq!(quote_item("say \"it's\""), "'say \"it\\'s\"'");
    }
}
