use thiserror::Error;

use super::step::StepId;
use super::transition::TransitionId;

/// Structural problems found by [`WorkflowGraph::validate`].
///
/// [`WorkflowGraph::validate`]: super::graph::WorkflowGraph::validate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("transition '{transition}' references missing step '{step}'")]
    DanglingReference {
        transition: TransitionId,
        step: StepId,
    },

    #[error("duplicate transition id '{transition}'")]
    DuplicateTransitionId { transition: TransitionId },

    #[error("workflow has no start step")]
    NoStartStep,

    #[error("multiple start steps: {}", steps.iter().map(StepId::as_str).collect::<Vec<_>>().join(", "))]
    MultipleStartSteps { steps: Vec<StepId> },

    #[error("step '{step}' has {count} default transitions; at most one is allowed")]
    MultipleDefaultTransitions { step: StepId, count: usize },

    #[error("step '{step}' is not the target of any transition")]
    UnreachableStep { step: StepId },

    #[error("transition '{transition}' has an invalid condition: {message}")]
    InvalidCondition {
        transition: TransitionId,
        message: String,
    },
}

impl GraphError {
    /// Stable machine-readable code, usable as an i18n key.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::DanglingReference { .. } => "dangling_reference",
            GraphError::DuplicateTransitionId { .. } => "duplicate_transition_id",
            GraphError::NoStartStep => "no_start_step",
            GraphError::MultipleStartSteps { .. } => "multiple_start_steps",
            GraphError::MultipleDefaultTransitions { .. } => "multiple_default_transitions",
            GraphError::UnreachableStep { .. } => "unreachable_step",
            GraphError::InvalidCondition { .. } => "invalid_condition",
        }
    }
}

/// How strongly a schema finding blocks activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Advisory; the workflow can still be activated.
    Warning,
    /// Blocking; activation is refused until fixed.
    Error,
}

/// A schema finding for a single property, keyed by the wire name of the
/// offending field so editors can attach it to the matching input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    #[must_use]
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Whether this finding blocks activation.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}
