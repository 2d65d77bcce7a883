//! When step definitions
//!
//! Steps that run apply passes.

use cucumber::when;

use crate::world::{BehaviourWorld, Target};

fn element_ids(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[when("the behaviours are applied to the document")]
fn apply_document(world: &mut BehaviourWorld) {
    world.run(&[Target::Document]);
}

#[when("the behaviours are applied to the document twice")]
fn apply_document_twice(world: &mut BehaviourWorld) {
    world.run(&[Target::Document, Target::Document]);
}

#[when(expr = "the behaviours are applied to {string}")]
fn apply_elements(world: &mut BehaviourWorld, ids: String) {
    world.run(&[Target::Elements {
        ids: element_ids(&ids),
        include_self: false,
    }]);
}

#[when(expr = "the behaviours are applied to {string} including self")]
fn apply_elements_including_self(world: &mut BehaviourWorld, ids: String) {
    world.run(&[Target::Elements {
        ids: element_ids(&ids),
        include_self: true,
    }]);
}
