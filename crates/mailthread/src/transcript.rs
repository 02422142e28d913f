//! Render a thread's history as a single readable transcript.

use mailthread_core::Record;

const HEADER: &str = "Here is the conversation history:";
const FOOTER: &str = "Now please reply to the latest email below:";
const SEPARATOR_WIDTH: usize = 40;

/// Format records, in stored order, as one block per record labelled by
/// role, followed by a closing instruction line.
///
/// ```text
/// Here is the conversation history:
///
/// From: alice@example.com
/// Subject: Order status
/// Message: Where is my order?
/// ----------------------------------------
///
/// Now please reply to the latest email below:
/// ```
///
/// Empty history renders as an empty string.
pub fn format_transcript(history: &[Record]) -> String {
    if history.is_empty() {
        return String::new();
    }

    let separator = "-".repeat(SEPARATOR_WIDTH);
    let mut out = String::from(HEADER);
    for record in history {
        out.push_str(&format!(
            "\n\nFrom: {}\nSubject: {}\nMessage: {}\n{}",
            record.role(),
            record.subject,
            record.body,
            separator
        ));
    }
    out.push_str("\n\n");
    out.push_str(FOOTER);
    out
}
