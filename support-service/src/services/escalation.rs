//! Escalation detection.
//!
//! A heuristic, not a guarantee: false positives and false negatives are
//! accepted. The phrase list is fixed; any single hit suffices.

const ESCALATION_PHRASES: &[&str] = &[
    "i don't know",
    "unable to",
    "cannot",
    "escalate",
    "not sure",
    "transfer to",
];

/// Whether a generated reply suggests handing the conversation to a human.
/// Case-insensitive substring match against the fixed phrase set.
pub fn needs_escalation(reply_text: &str) -> bool {
    let lowered = reply_text.to_lowercase();
    ESCALATION_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}
