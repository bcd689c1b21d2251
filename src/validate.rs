//! Structural validation of a workflow graph.
//!
//! Checks run in a fixed order and every finding is collected, so one
//! broken transition does not hide the next. Order within a check is
//! deterministic: steps in id order, transitions in insertion order.

use std::collections::{BTreeMap, HashSet};

use crate::types::{GraphError, StepId, WorkflowGraph};

/// Which rules apply. A graph mid-edit legitimately has no start step
/// yet; one being activated does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValidationMode {
    Editing,
    Activation,
}

pub(crate) fn validate_graph(graph: &WorkflowGraph, mode: ValidationMode) -> Vec<GraphError> {
    let mut errors = Vec::new();
    check_transition_references(graph, &mut errors);
    check_duplicate_transition_ids(graph, &mut errors);
    check_start_steps(graph, mode, &mut errors);
    check_default_transitions(graph, &mut errors);
    check_step_reachability(graph, &mut errors);
    check_conditions(graph, &mut errors);
    errors
}

/// Both endpoints of every transition must name an existing step.
fn check_transition_references(graph: &WorkflowGraph, errors: &mut Vec<GraphError>) {
    for transition in graph.transitions() {
        for step in [transition.from(), transition.to()] {
            if graph.step(step).is_none() {
                errors.push(GraphError::DanglingReference {
                    transition: transition.id().clone(),
                    step: step.clone(),
                });
            }
        }
    }
}

/// Transition ids must be unique across the whole graph. Each repeated
/// occurrence after the first is reported.
fn check_duplicate_transition_ids(graph: &WorkflowGraph, errors: &mut Vec<GraphError>) {
    let mut seen = HashSet::new();
    for transition in graph.transitions() {
        if !seen.insert(transition.id()) {
            errors.push(GraphError::DuplicateTransitionId {
                transition: transition.id().clone(),
            });
        }
    }
}

/// Exactly one step may be marked start. Zero is only an error at
/// activation; more than one is always an error.
fn check_start_steps(graph: &WorkflowGraph, mode: ValidationMode, errors: &mut Vec<GraphError>) {
    let starts: Vec<StepId> = graph
        .steps()
        .filter(|s| s.is_start())
        .map(|s| s.id().clone())
        .collect();
    if starts.is_empty() {
        if mode == ValidationMode::Activation {
            errors.push(GraphError::NoStartStep);
        }
    } else if starts.len() > 1 {
        errors.push(GraphError::MultipleStartSteps { steps: starts });
    }
}

/// A step may have at most one default among its outgoing transitions.
fn check_default_transitions(graph: &WorkflowGraph, errors: &mut Vec<GraphError>) {
    let mut defaults: BTreeMap<&StepId, usize> = BTreeMap::new();
    for transition in graph.transitions() {
        if transition.is_default() {
            *defaults.entry(transition.from()).or_insert(0) += 1;
        }
    }
    for (step, count) in defaults {
        if count > 1 {
            errors.push(GraphError::MultipleDefaultTransitions {
                step: step.clone(),
                count,
            });
        }
    }
}

/// Every non-start step must be the target of at least one transition.
/// This is a local in-degree check, not a walk from the start step.
fn check_step_reachability(graph: &WorkflowGraph, errors: &mut Vec<GraphError>) {
    let targets: HashSet<&StepId> = graph.transitions().iter().map(|t| t.to()).collect();
    for step in graph.steps() {
        if !step.is_start() && !targets.contains(step.id()) {
            errors.push(GraphError::UnreachableStep {
                step: step.id().clone(),
            });
        }
    }
}

/// Gates must hold well-formed condition trees. Empty gates cannot occur
/// here, the transition normalizes them away on construction.
fn check_conditions(graph: &WorkflowGraph, errors: &mut Vec<GraphError>) {
    for transition in graph.transitions() {
        if let Some(condition) = transition.condition() {
            for finding in condition.validate() {
                errors.push(GraphError::InvalidCondition {
                    transition: transition.id().clone(),
                    message: finding.to_string(),
                });
            }
        }
    }
}
