//! Unit Tests for Command Line Rendering

use monitor_bridge::command::{render_token, tokenize};
use monitor_bridge::{CommandLine, ErrorKind};
use serde_json::json;

#[test]
fn test_monitor_style_commands() {
    let cases = vec![
        ("start", vec![], "start"),
        ("mach", vec![json!("set"), json!(0)], "mach set 0"),
        (
            "machine",
            vec![json!("LoadPlatformDescription"), json!("@platforms/cpus/stm32f4.repl")],
            "machine LoadPlatformDescription @platforms/cpus/stm32f4.repl",
        ),
        (
            "sysbus.cpu",
            vec![json!("PC"), json!(0x8000)],
            "sysbus.cpu PC 32768",
        ),
        ("emulation", vec![json!("SetGlobalQuantum"), json!(0.25)], "emulation SetGlobalQuantum 0.25"),
    ];

    for (method, args, expected) in cases {
        let line = CommandLine::render(method, &args).unwrap();
        assert_eq!(line.as_str(), expected);
        assert_eq!(line.method(), method);
    }
}

#[test]
fn test_nulls_are_omitted() {
    let line = CommandLine::render("sysbus", &[json!(null), json!("WhatPeripheralIsAt"), json!(null)]).unwrap();
    assert_eq!(line.as_str(), "sysbus WhatPeripheralIsAt");
}

#[test]
fn test_strings_needing_quotes() {
    let line = CommandLine::render("logLevel", &[json!("say \"hi\""), json!("")]).unwrap();
    assert_eq!(line.as_str(), r#"logLevel "say \"hi\"" """#);
    assert_eq!(tokenize(line.as_str()).unwrap(), vec!["logLevel", "say \"hi\"", ""]);
}

#[test]
fn test_multiline_string_stays_on_one_line() {
    let line = CommandLine::render("echo", &[json!("one\ntwo\r\n")]).unwrap();
    assert!(!line.as_str().contains('\n'));
    assert!(!line.as_str().contains('\r'));
    assert_eq!(tokenize(line.as_str()).unwrap()[1], "one\ntwo\r\n");
}

#[test]
fn test_render_token_bare() {
    assert_eq!(render_token("@file.resc"), "@file.resc");
    assert_eq!(render_token("a b"), "\"a b\"");
    assert_eq!(render_token("tab\there"), "\"tab\\there\"");
}

#[test]
fn test_bad_method_names() {
    for method in ["", "two words", "new\nline", "quo\"te"] {
        let err = CommandLine::render(method, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCommand, "method {:?}", method);
    }
}

#[test]
fn test_raw_line_verbatim() {
    let line = CommandLine::raw("logFile @/tmp/log.txt true").unwrap();
    assert_eq!(line.method(), "logFile");
    assert_eq!(line.to_string(), "logFile @/tmp/log.txt true");
    assert!(CommandLine::raw("").unwrap().is_empty());
    assert!(CommandLine::raw("a\nb").is_err());
}
