//! Then step definitions
//!
//! Steps that verify outcomes and assertions.

use cucumber::then;
use pretty_assertions::assert_eq;

use crate::world::BehaviourWorld;

#[then(expr = "the log is {string}")]
fn assert_log(world: &mut BehaviourWorld, expected: String) {
    let expected: Vec<String> = expected
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    assert_eq!(world.log, expected);
}

#[then("the log is empty")]
fn assert_log_empty(world: &mut BehaviourWorld) {
    assert!(world.log.is_empty(), "Expected no invocations, got {:?}", world.log);
}

#[then(expr = "the registry holds {int} rules")]
fn assert_rule_count(world: &mut BehaviourWorld, expected: usize) {
    assert_eq!(world.rule_count, expected);
}

#[then("every pass succeeds")]
fn assert_success(world: &mut BehaviourWorld) {
    assert!(
        world.error.is_none(),
        "Expected every pass to succeed, got error: {:?}",
        world.error
    );
}

#[then(expr = "the pass fails with {string}")]
fn assert_failure(world: &mut BehaviourWorld, expected: String) {
    match &world.error {
        Some(message) => assert!(
            message.contains(&expected),
            "Expected error containing '{}', got '{}'",
            expected,
            message
        ),
        None => panic!("Expected the pass to fail with '{}'", expected),
    }
}

#[then(expr = "the report records {int} failures")]
fn assert_failure_count(world: &mut BehaviourWorld, expected: usize) {
    assert_eq!(world.last_report().failure_count(), expected);
}

#[then(expr = "{int} passes completed")]
fn assert_pass_count(world: &mut BehaviourWorld, expected: usize) {
    assert_eq!(world.reports.len(), expected);
}

#[then(expr = "rule {string} with id {string} matched {int} elements")]
fn assert_rule_matches(world: &mut BehaviourWorld, selector: String, id: String, expected: usize) {
    let report = world.last_report();
    let entry = report
        .rule(&selector, &id)
        .unwrap_or_else(|| panic!("No report entry for {}:{}\n{}", id, selector, report.render()));
    assert_eq!(entry.matched, expected);
}
