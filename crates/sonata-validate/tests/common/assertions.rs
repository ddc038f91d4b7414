//! Assertion helpers for validation reports

#![allow(dead_code)]

use sonata_core::Event;
use sonata_validate::{TraceStep, ValidationReport};

/// Assert that a report carries no error events
pub fn assert_no_errors(report: &ValidationReport) {
    assert_eq!(
        report.error_count, 0,
        "expected no errors for {}, got: {:#?}",
        report.object_id, report.errors
    );
}

/// Assert that exactly `count` events carry `code`
pub fn assert_event_count(report: &ValidationReport, code: &str, count: usize) {
    let events = report.events_with_code(code);
    assert_eq!(
        events.len(),
        count,
        "expected {} '{}' event(s), got: {:#?}",
        count,
        code,
        events
    );
}

/// The single event carrying `code`
pub fn single_event<'a>(report: &'a ValidationReport, code: &str) -> &'a Event {
    assert_event_count(report, code, 1);
    report.events_with_code(code)[0]
}

/// Assert that some message of the event carrying `code` contains `needle`
pub fn assert_event_mentions(report: &ValidationReport, code: &str, needle: &str) {
    let event = single_event(report, code);
    assert!(
        event.messages.iter().any(|m| m.contains(needle)),
        "no '{}' message mentions '{}': {:?}",
        code,
        needle,
        event.messages
    );
}

/// Trace steps rendered as strings, `BREAK` for breaks
pub fn rendered_steps(steps: &[TraceStep]) -> Vec<String> {
    steps.iter().map(|s| s.to_string()).collect()
}
