mod error;
mod evaluate;
mod persist;
mod schema;
#[cfg(feature = "binary-cache")]
mod serial;
mod types;
mod validate;

pub use error::FlowgateError;
pub use evaluate::{evaluate, evaluate_rule};
pub use persist::PersistError;
pub use schema::{
    validate_step, MAX_DUE_HOURS, MAX_RETRY_ATTEMPTS, MAX_TIMEOUT_SECONDS, MIN_DUE_HOURS,
    MIN_RETRY_ATTEMPTS, MIN_TIMEOUT_SECONDS,
};
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    ApprovalProperties, ApprovalType, AutomationProperties, Channel, Combinator, ComparisonOp,
    Condition, ConditionNode, ConditionProperties, ErrorHandling, EvaluationContext, GraphError,
    NotificationProperties, Priority, Rule, RulePatch, ScriptType, SelectionReport, Severity, Step,
    StepId, StepKind, StepProperties, TaskProperties, Transition, TransitionId, TransitionOutcome,
    ValidationError, Value, WorkflowGraph, MAX_DELAY_SECONDS,
};
