use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::context::EvaluationContext;
use super::error::{GraphError, ValidationError};
use super::report::SelectionReport;
use super::step::{Step, StepId, StepProperties};
use super::transition::{Transition, TransitionId};

/// A workflow definition: steps keyed by id plus an ordered list of
/// transitions between them.
///
/// The graph is an editing surface first. Mutations are permissive
/// (dangling references and duplicate ids are representable) and
/// [`validate`](Self::validate) reports everything wrong at once instead
/// of rejecting the first edit that would break an invariant; a graph
/// must pass [`validate_for_activation`](Self::validate_for_activation)
/// before the runtime ever selects transitions from it.
///
/// ```
/// use flowgate::{Condition, EvaluationContext, Rule, Step, TaskProperties, Transition, WorkflowGraph};
///
/// let graph = WorkflowGraph::new()
///     .with_step(Step::task("draft", "Draft", TaskProperties { due_hours: Some(24), ..TaskProperties::default() }).with_start(true))
///     .with_step(Step::task("review", "Review", TaskProperties { due_hours: Some(48), ..TaskProperties::default() }))
///     .with_transition(
///         Transition::new("t1", "draft", "review")
///             .with_condition(Some(Condition::all().with_rule(Rule::equals("form.complete", true)))),
///     );
///
/// let ctx = EvaluationContext::new().set("form.complete", true);
/// let next = graph.next_transition(&"draft".into(), &ctx);
/// assert_eq!(next.map(|t| t.id().as_str()), Some("t1"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkflowGraph {
    pub(crate) steps: BTreeMap<StepId, Step>,
    pub(crate) transitions: Vec<Transition>,
}

impl WorkflowGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a step, keyed by its id.
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.upsert_step(step);
        self
    }

    /// Append a transition.
    #[must_use]
    pub fn with_transition(mut self, transition: Transition) -> Self {
        self.add_transition(transition);
        self
    }

    /// Insert a step, replacing any existing step with the same id.
    pub fn upsert_step(&mut self, step: Step) {
        self.steps.insert(step.id().clone(), step);
    }

    /// Append a transition. Duplicate ids are accepted here and reported
    /// by [`validate`](Self::validate).
    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Remove a step and every transition that touches it.
    pub fn remove_step(&mut self, id: &StepId) -> Option<Step> {
        let removed = self.steps.remove(id);
        if removed.is_some() {
            self.transitions.retain(|t| t.from() != id && t.to() != id);
        }
        removed
    }

    /// Remove the first transition with the given id.
    pub fn remove_transition(&mut self, id: &TransitionId) -> Option<Transition> {
        let pos = self.transitions.iter().position(|t| t.id() == id)?;
        Some(self.transitions.remove(pos))
    }

    /// Replace the step with the given id by whatever the closure
    /// returns. The replacement is re-keyed by its own id, so the
    /// closure can rename the step. Returns false when no step has the
    /// id.
    pub fn update_step(&mut self, id: &StepId, f: impl FnOnce(Step) -> Step) -> bool {
        let Some(step) = self.steps.remove(id) else {
            return false;
        };
        let updated = f(step);
        self.steps.insert(updated.id().clone(), updated);
        true
    }

    /// Replace the transition with the given id by whatever the closure
    /// returns, keeping its position in the list. Returns false when no
    /// transition has the id.
    pub fn update_transition(&mut self, id: &TransitionId, f: impl FnOnce(Transition) -> Transition) -> bool {
        let Some(slot) = self.transitions.iter_mut().find(|t| t.id() == id) else {
            return false;
        };
        *slot = f(slot.clone());
        true
    }

    /// Make the given transition the single default of its source step,
    /// clearing the flag on every sibling. Returns false when no
    /// transition has the id.
    pub fn set_default_transition(&mut self, id: &TransitionId) -> bool {
        let Some(from) = self
            .transitions
            .iter()
            .find(|t| t.id() == id)
            .map(|t| t.from().clone())
        else {
            return false;
        };
        for t in &mut self.transitions {
            if t.from() == &from {
                t.set_default(t.id() == id);
            }
        }
        true
    }

    /// Make the given step the single start step, clearing the flag on
    /// every other step. Returns false when no step has the id.
    pub fn set_start_step(&mut self, id: &StepId) -> bool {
        if !self.steps.contains_key(id) {
            return false;
        }
        for (step_id, step) in &mut self.steps {
            step.set_start(step_id == id);
        }
        true
    }

    #[must_use]
    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.get(id)
    }

    /// The first transition with the given id.
    #[must_use]
    pub fn transition(&self, id: &TransitionId) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id() == id)
    }

    /// All steps in id order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values()
    }

    /// All transitions in insertion order.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    /// The step marked as the entry point. When several are marked
    /// (a state [`validate`](Self::validate) reports), the first in id
    /// order wins.
    #[must_use]
    pub fn start_step(&self) -> Option<&Step> {
        self.steps.values().find(|s| s.is_start())
    }

    /// Transitions leaving the given step, in insertion order.
    pub fn transitions_from<'a>(&'a self, from: &'a StepId) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.from() == from)
    }

    /// Transitions entering the given step, in insertion order.
    pub fn transitions_into<'a>(&'a self, to: &'a StepId) -> impl Iterator<Item = &'a Transition> + 'a {
        self.transitions.iter().filter(move |t| t.to() == to)
    }

    /// Every context field path referenced by any transition gate or
    /// condition step, in sorted order. This is the data contract the
    /// workflow expects of its runtime payloads.
    #[must_use]
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        for transition in &self.transitions {
            if let Some(condition) = transition.condition() {
                condition.collect_fields(&mut fields);
            }
        }
        for step in self.steps.values() {
            if let StepProperties::Condition(props) = step.properties() {
                props.condition.collect_fields(&mut fields);
            }
        }
        fields
    }

    /// Structural checks suitable while editing: everything except the
    /// missing-start-step check, which only matters at activation.
    #[must_use]
    pub fn validate(&self) -> Vec<GraphError> {
        crate::validate::validate_graph(self, crate::validate::ValidationMode::Editing)
    }

    /// Structural checks a workflow must pass before activation.
    #[must_use]
    pub fn validate_for_activation(&self) -> Vec<GraphError> {
        crate::validate::validate_graph(self, crate::validate::ValidationMode::Activation)
    }

    /// Per-step schema findings, paired with the owning step's id.
    #[must_use]
    pub fn validate_steps(&self) -> Vec<(StepId, ValidationError)> {
        self.steps
            .values()
            .flat_map(|step| {
                crate::schema::validate_step(step)
                    .into_iter()
                    .map(move |err| (step.id().clone(), err))
            })
            .collect()
    }

    /// Whether this graph passes activation-grade structural checks and
    /// has no blocking schema findings. Warnings do not block.
    #[must_use]
    pub fn can_activate(&self) -> bool {
        self.validate_for_activation().is_empty()
            && self.validate_steps().iter().all(|(_, err)| !err.is_blocking())
    }

    /// Select the transition that fires out of `from` under the given
    /// context: gated and ungated candidates by priority (insertion
    /// order within a priority), then the default as fallback.
    #[must_use]
    pub fn next_transition(&self, from: &StepId, ctx: &EvaluationContext) -> Option<&Transition> {
        crate::evaluate::select(self, from, ctx)
    }

    /// Like [`next_transition`](Self::next_transition), with a per-candidate
    /// report of what was considered and what matched.
    pub fn next_transition_detailed(&self, from: &StepId, ctx: &EvaluationContext) -> SelectionReport {
        crate::evaluate::select_detailed(self, from, ctx)
    }

    /// Serialize to the JSON document shape the workflow designer
    /// persists.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`](crate::PersistError) if encoding fails.
    pub fn to_json_string(&self) -> Result<String, crate::PersistError> {
        crate::persist::encode_string(self)
    }

    /// Pretty-printed variant of [`to_json_string`](Self::to_json_string).
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`](crate::PersistError) if encoding fails.
    pub fn to_json_string_pretty(&self) -> Result<String, crate::PersistError> {
        crate::persist::encode_string_pretty(self)
    }

    /// Parse a persisted JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`](crate::PersistError) on malformed JSON,
    /// unknown step or operator kinds, or duplicate step ids.
    pub fn from_json_str(json: &str) -> Result<Self, crate::PersistError> {
        crate::persist::decode_str(json)
    }

    /// Serialize to JSON and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`FlowgateError`](crate::FlowgateError) on encoding or I/O failure.
    pub fn to_json_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), crate::FlowgateError> {
        let json = self.to_json_string_pretty()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a file and parse the persisted JSON document it contains.
    ///
    /// # Errors
    ///
    /// Returns [`FlowgateError`](crate::FlowgateError) on I/O or decode failure.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::FlowgateError> {
        let json = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&json)?)
    }
}

#[cfg(feature = "binary-cache")]
impl WorkflowGraph {
    /// Serialize this graph to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// payload metadata. Callers can use this to detect when the JSON
    /// document the snapshot was built from has changed and the cache
    /// should be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(
        &self,
        source_text: Option<&str>,
    ) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self, source_text)
    }

    /// Deserialize a graph from a byte slice previously produced by
    /// [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }

    /// Serialize this graph and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) on
    /// encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), crate::serial::SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a file and deserialize the graph it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// I/O, format, integrity, or validation failure.
    pub fn from_binary_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, crate::serial::DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for WorkflowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorkflowGraph({} steps, {} transitions)",
            self.steps.len(),
            self.transitions.len(),
        )
    }
}
