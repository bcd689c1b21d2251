mod condition;
mod context;
mod error;
mod graph;
mod report;
mod rule;
mod step;
mod transition;
mod value;

pub use condition::{Combinator, Condition, ConditionNode};
pub use context::EvaluationContext;
pub use error::{GraphError, Severity, ValidationError};
pub use graph::WorkflowGraph;
pub use report::{SelectionReport, TransitionOutcome};
pub use rule::{ComparisonOp, Rule, RulePatch};
pub use step::{
    ApprovalProperties, ApprovalType, AutomationProperties, Channel, ConditionProperties,
    ErrorHandling, NotificationProperties, ScriptType, Step, StepId, StepKind, StepProperties,
    TaskProperties,
};
pub use transition::{Priority, Transition, TransitionId, MAX_DELAY_SECONDS};
pub use value::Value;
