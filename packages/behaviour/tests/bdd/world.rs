//! World struct for Cucumber BDD tests
//!
//! Holds a declarative description of the page and the registered rules.
//! The registry itself is `Rc`-based, so it is built fresh inside each
//! `When` step and only its observable results are kept here.

use behaviour_engine::memory::{Document, Element};
use behaviour_engine::{
    ApplyReport, BehaviourRegistry, BehaviourResult, FailurePolicy, RegistryConfig,
};
use cucumber::World;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One row of the element table.
#[derive(Debug, Clone)]
pub struct ElementSpec {
    pub id: String,
    pub tag: String,
    pub classes: Vec<String>,
    /// Id of the parent element; top-level elements hang off the document
    pub parent: Option<String>,
}

/// What a registered behaviour does when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Log `label:element-id`
    Record,
    /// Set `data-marked` and log
    Mark,
    /// Fail unless `data-marked` is set, otherwise log
    RequireMark,
    /// Always fail
    Fail,
}

#[derive(Debug, Clone)]
pub struct RuleSpec {
    pub label: String,
    pub id: String,
    pub selector: String,
    pub priority: i64,
    pub action: Action,
}

/// Which nodes a pass starts from.
#[derive(Debug, Clone)]
pub enum Target {
    Document,
    Elements {
        ids: Vec<String>,
        include_self: bool,
    },
}

/// Test world that holds state across steps in a Cucumber scenario.
#[derive(Debug, Default, World)]
pub struct BehaviourWorld {
    pub elements: Vec<ElementSpec>,
    pub rules: Vec<RuleSpec>,
    pub failure_policy: FailurePolicy,
    /// Behaviour invocations of the last run, in order
    pub log: Vec<String>,
    /// Rule count after registration
    pub rule_count: usize,
    pub reports: Vec<ApplyReport>,
    pub error: Option<String>,
}

type Log = Rc<RefCell<Vec<String>>>;

fn behaviour_for(spec: &RuleSpec, log: &Log) -> impl Fn(&Element) -> BehaviourResult + 'static {
    let log = Rc::clone(log);
    let label = spec.label.clone();
    let action = spec.action;
    move |el: &Element| {
        let id = el.id().unwrap_or_default();
        match action {
            Action::Fail => return Err(format!("{} refused {}", label, id).into()),
            Action::RequireMark if !el.has_attr("data-marked") => {
                return Err(format!("{} is not marked", id).into());
            }
            Action::Mark => el.set_attr("data-marked", "true"),
            Action::Record | Action::RequireMark => {}
        }
        log.borrow_mut().push(format!("{}:{}", label, id));
        Ok(())
    }
}

impl BehaviourWorld {
    pub fn set_failure_policy(&mut self, policy: &str) {
        let config = RegistryConfig::from_yaml_str(&format!("failure_policy: {}", policy))
            .unwrap_or_else(|e| panic!("Invalid failure policy '{}': {}", policy, e));
        self.failure_policy = config.failure_policy;
    }

    fn build_document(&self) -> (Document, HashMap<String, Element>) {
        let doc = Document::new();
        let mut by_id: HashMap<String, Element> = HashMap::new();
        for spec in &self.elements {
            let mut element = Element::new(&spec.tag).with_id(&spec.id);
            for class in &spec.classes {
                element = element.with_class(class);
            }
            let parent = match &spec.parent {
                Some(parent) => by_id
                    .get(parent)
                    .cloned()
                    .unwrap_or_else(|| panic!("Parent '{}' must be listed before '{}'", parent, spec.id)),
                None => doc.root(),
            };
            parent.append_child(element.clone());
            by_id.insert(spec.id.clone(), element);
        }
        (doc, by_id)
    }

    /// Build the page and registry, then run one pass per target.
    pub fn run(&mut self, targets: &[Target]) {
        let (doc, by_id) = self.build_document();
        let config = RegistryConfig::default().with_failure_policy(self.failure_policy);
        let registry = BehaviourRegistry::with_config(doc, config);
        let log: Log = Rc::new(RefCell::new(Vec::new()));

        for spec in &self.rules {
            registry.specify(
                spec.selector.as_str(),
                spec.id.as_str(),
                spec.priority,
                behaviour_for(spec, &log),
            );
        }
        self.rule_count = registry.len();
        self.reports.clear();
        self.error = None;

        for target in targets {
            let result = match target {
                Target::Document => registry.apply(),
                Target::Elements { ids, include_self } => {
                    let roots: Vec<Element> = ids
                        .iter()
                        .map(|id| {
                            by_id
                                .get(id)
                                .cloned()
                                .unwrap_or_else(|| panic!("Unknown element '{}'", id))
                        })
                        .collect();
                    registry.apply_subtree(roots, *include_self)
                }
            };
            match result {
                Ok(report) => self.reports.push(report),
                Err(e) => {
                    self.error = Some(e.to_string());
                    break;
                }
            }
        }

        self.log = log.borrow().clone();
    }

    pub fn last_report(&self) -> &ApplyReport {
        self.reports
            .last()
            .unwrap_or_else(|| panic!("No pass completed, error: {:?}", self.error))
    }
}
