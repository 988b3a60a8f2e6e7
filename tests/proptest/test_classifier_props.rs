//! Property-based tests for reply classification

use monitor_bridge::monitor::prompt::ResponseTerminator;
use monitor_bridge::{ClassifiedResult, ReplyClassifier};
use proptest::prelude::*;

const PROMPT: &str = "MONITOR>";

fn classifier() -> ReplyClassifier {
    ReplyClassifier::new(
        ResponseTerminator::literal_prompt(PROMPT),
        vec!["Error:".to_string()],
    )
}

/// Console lines that are neither blank at the edges nor prompts
fn body_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 .,:()=-]{0,30}[a-zA-Z0-9]"
}

proptest! {
    #[test]
    fn test_classify_is_pure(raw in "\\PC*") {
        let classifier = classifier();
        prop_assert_eq!(classifier.classify(&raw), classifier.classify(&raw));
    }

    #[test]
    fn test_classify_doesnt_panic(raw in "(\\PC|\\n)*") {
        let _ = classifier().classify(&raw);
    }

    #[test]
    fn test_plain_output_is_ok(lines in prop::collection::vec(body_line(), 1..5)) {
        prop_assume!(!lines[0].starts_with("Error:"));
        let body = lines.join("\n");
        let raw = format!("{}\n{}", body, PROMPT);
        prop_assert_eq!(classifier().classify(&raw), ClassifiedResult::Ok(body));
    }

    #[test]
    fn test_marked_output_is_err(lines in prop::collection::vec(body_line(), 1..5)) {
        let message = lines.join("\n");
        let raw = format!("Error: {}\n{}", message, PROMPT);
        prop_assert_eq!(classifier().classify(&raw), ClassifiedResult::Err(message));
    }
}
