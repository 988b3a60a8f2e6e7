//! Unit Tests for Reply Classification
//!
//! Console replies as they come off the wire, after ANSI and carriage
//! return removal, against the default and custom console conventions.

use monitor_bridge::ansi::strip_ansi;
use monitor_bridge::config::{Config, TerminatorKind};
use monitor_bridge::monitor::prompt::ResponseTerminator;
use monitor_bridge::{ClassifiedResult, RawReply, ReplyClassifier};

fn default_classifier() -> ReplyClassifier {
    ReplyClassifier::from_config(&Config::default()).unwrap()
}

fn reply(command: &str, text: &str) -> RawReply {
    RawReply {
        command: command.to_string(),
        text: text.to_string(),
    }
}

#[test]
fn test_literal_prompt_examples() {
    let classifier = ReplyClassifier::new(
        ResponseTerminator::literal_prompt("MONITOR>"),
        vec!["Error:".to_string()],
    );

    assert_eq!(
        classifier.classify("42\nMONITOR>"),
        ClassifiedResult::Ok("42".to_string())
    );
    assert_eq!(
        classifier.classify("Error: unknown command\nMONITOR>"),
        ClassifiedResult::Err("unknown command".to_string())
    );
    assert_eq!(
        classifier.classify("MONITOR>"),
        ClassifiedResult::Ok(String::new())
    );
}

#[test]
fn test_machine_prompt() {
    let classifier = default_classifier();
    let result = classifier.classify_reply(&reply(
        "sysbus.cpu PC",
        "sysbus.cpu PC\n0x00000000\n(machine-0) ",
    ));
    assert_eq!(result, ClassifiedResult::Ok("0x00000000".to_string()));
}

#[test]
fn test_colored_error_after_ansi_stripping() {
    let raw = "bogus\n\x1b[31;1mError: No such command or device: bogus\x1b[0m\n(monitor) ";
    let text = strip_ansi(raw);
    let result = default_classifier().classify_reply(&reply("bogus", &text));
    assert_eq!(
        result,
        ClassifiedResult::Err("No such command or device: bogus".to_string())
    );
}

#[test]
fn test_custom_error_markers() {
    let mut config = Config::default();
    config.gateway.error_markers = vec!["Error:".to_string(), "There was an error".to_string()];
    let classifier = ReplyClassifier::from_config(&config).unwrap();

    assert_eq!(
        classifier.classify("There was an error executing command 'x'\n(monitor) "),
        ClassifiedResult::Err("executing command 'x'".to_string())
    );
    assert_eq!(classifier.error_markers().len(), 2);
}

#[test]
fn test_blank_line_convention() {
    let mut config = Config::default();
    config.monitor.terminator = TerminatorKind::BlankLine;
    let classifier = ReplyClassifier::from_config(&config).unwrap();

    assert_eq!(
        classifier.classify("value one\nvalue two\n\n"),
        ClassifiedResult::Ok("value one\nvalue two".to_string())
    );
    assert_eq!(
        classifier.classify("Error: failed\n\n"),
        ClassifiedResult::Err("failed".to_string())
    );
}

#[test]
fn test_echo_not_stripped_when_different() {
    let result = default_classifier().classify_reply(&reply("start", "Starting emulation...\n(monitor) "));
    assert_eq!(result, ClassifiedResult::Ok("Starting emulation...".to_string()));
}

#[test]
fn test_echo_only_reply_is_empty() {
    let result = default_classifier().classify_reply(&reply("pause", "pause\n(monitor) "));
    assert_eq!(result, ClassifiedResult::Ok(String::new()));
}

#[test]
fn test_error_marker_alone() {
    let result = default_classifier().classify("Error:\n(monitor) ");
    assert_eq!(result, ClassifiedResult::Err(String::new()));
}

#[test]
fn test_default_config_recognizes_execution_errors() {
    let raw = "foo\n\x1b[31;1mThere was an error executing command 'foo'\x1b[0m\n(monitor) ";
    let text = strip_ansi(raw);
    let result = default_classifier().classify_reply(&reply("foo", &text));
    assert_eq!(
        result,
        ClassifiedResult::Err("executing command 'foo'".to_string())
    );
}
