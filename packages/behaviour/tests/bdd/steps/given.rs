//! Given step definitions
//!
//! Steps that describe the page and the registered behaviours.

use cucumber::{gherkin::Step, given};

use crate::world::{Action, BehaviourWorld, ElementSpec, RuleSpec};

// =============================================================================
// Page setup
// =============================================================================

/// Table columns: `id | tag | class | parent`. Classes are space separated;
/// an empty parent puts the element directly under the document.
#[given("a document with elements:")]
fn set_elements(world: &mut BehaviourWorld, step: &Step) {
    let table = step
        .table
        .as_ref()
        .expect("Element step requires a data table");

    world.elements = table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or_default();
            ElementSpec {
                id: cell(0).to_string(),
                tag: cell(1).to_string(),
                classes: cell(2).split_whitespace().map(String::from).collect(),
                parent: Some(cell(3))
                    .filter(|p| !p.is_empty())
                    .map(String::from),
            }
        })
        .collect();
}

#[given(expr = "the failure policy is {string}")]
fn set_failure_policy(world: &mut BehaviourWorld, policy: String) {
    world.set_failure_policy(&policy);
}

// =============================================================================
// Behaviour registration
// =============================================================================

fn register(
    world: &mut BehaviourWorld,
    label: String,
    id: String,
    selector: String,
    priority: i64,
    action: Action,
) {
    world.rules.push(RuleSpec {
        label,
        id,
        selector,
        priority,
        action,
    });
}

#[given(expr = "a behaviour {string} with id {string} on {string} at priority {int}")]
fn recording_behaviour(
    world: &mut BehaviourWorld,
    label: String,
    id: String,
    selector: String,
    priority: i64,
) {
    register(world, label, id, selector, priority, Action::Record);
}

#[given(expr = "a marking behaviour {string} with id {string} on {string} at priority {int}")]
fn marking_behaviour(
    world: &mut BehaviourWorld,
    label: String,
    id: String,
    selector: String,
    priority: i64,
) {
    register(world, label, id, selector, priority, Action::Mark);
}

#[given(
    expr = "a behaviour {string} requiring marks with id {string} on {string} at priority {int}"
)]
fn requiring_behaviour(
    world: &mut BehaviourWorld,
    label: String,
    id: String,
    selector: String,
    priority: i64,
) {
    register(world, label, id, selector, priority, Action::RequireMark);
}

#[given(expr = "a failing behaviour {string} with id {string} on {string} at priority {int}")]
fn failing_behaviour(
    world: &mut BehaviourWorld,
    label: String,
    id: String,
    selector: String,
    priority: i64,
) {
    register(world, label, id, selector, priority, Action::Fail);
}
