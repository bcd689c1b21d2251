//! The JSON document shape the workflow designer persists.
//!
//! The document is a pair of arrays, `steps` and `transitions`. Step
//! properties are adjacently tagged by step kind (`"type"` plus a
//! `"properties"` object); a transition's gate is either a condition
//! object or an explicit `null`. Decoding is tolerant of omitted
//! optional keys and strict about unknown kinds and operators, and
//! re-normalizes what the editing API normalizes: empty gates become no
//! gate, unary operands are dropped, delays are clamped, rule ids are
//! reassigned in tree order.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    ApprovalProperties, ApprovalType, AutomationProperties, Channel, Combinator, ComparisonOp,
    Condition, ConditionNode, ConditionProperties, ErrorHandling, NotificationProperties, Priority,
    Rule, ScriptType, Step, StepId, StepProperties, TaskProperties, Transition, Value,
    WorkflowGraph,
};

/// Error decoding or encoding a persisted workflow document.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("invalid workflow JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate step id '{step}'")]
    DuplicateStepId { step: StepId },
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedGraph {
    steps: Vec<PersistedStep>,
    transitions: Vec<PersistedTransition>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedStep {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    is_start: bool,
    #[serde(flatten)]
    properties: PersistedProperties,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "properties", rename_all = "lowercase")]
enum PersistedProperties {
    Task(PersistedTaskProps),
    Approval(PersistedApprovalProps),
    Notification(PersistedNotificationProps),
    Condition(PersistedCondition),
    Automation(PersistedAutomationProps),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedTaskProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    due_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_id: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedApprovalProps {
    approvers: Vec<String>,
    approval_type: ApprovalType,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_hours: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedNotificationProps {
    recipients: Vec<String>,
    template: String,
    channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PersistedAutomationProps {
    script: String,
    script_type: ScriptType,
    #[serde(rename = "timeout", skip_serializing_if = "Option::is_none")]
    timeout_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_attempts: Option<u32>,
    error_handling: ErrorHandling,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTransition {
    id: String,
    from: String,
    to: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    /// Emitted as explicit `null` for ungated transitions.
    #[serde(default)]
    condition: Option<PersistedCondition>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    is_default: bool,
    #[serde(default, rename = "delay")]
    delay_seconds: u32,
}

/// The combinator is required so that a malformed rule object cannot
/// masquerade as an empty group under the untagged node parse.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCondition {
    operator: Combinator,
    #[serde(default)]
    rules: Vec<PersistedNode>,
}

/// Condition children are distinguished structurally: a group carries an
/// `and`/`or` operator, a rule a comparison operator, so the untagged
/// variants cannot collide.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum PersistedNode {
    Group(PersistedCondition),
    Rule(PersistedRule),
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedRule {
    field: String,
    operator: ComparisonOp,
    /// Emitted as explicit `null` for unary operators.
    #[serde(default)]
    value: Option<serde_json::Value>,
}

// ----------------------------------------------------------------------
// Entry points
// ----------------------------------------------------------------------

pub(crate) fn encode_string(graph: &WorkflowGraph) -> Result<String, PersistError> {
    Ok(serde_json::to_string(&encode(graph))?)
}

pub(crate) fn encode_string_pretty(graph: &WorkflowGraph) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(&encode(graph))?)
}

pub(crate) fn decode_str(json: &str) -> Result<WorkflowGraph, PersistError> {
    let doc: PersistedGraph = serde_json::from_str(json)?;
    decode(doc)
}

// ----------------------------------------------------------------------
// Model -> document
// ----------------------------------------------------------------------

fn encode(graph: &WorkflowGraph) -> PersistedGraph {
    PersistedGraph {
        steps: graph.steps().map(step_to_doc).collect(),
        transitions: graph.transitions().iter().map(transition_to_doc).collect(),
    }
}

fn step_to_doc(step: &Step) -> PersistedStep {
    let properties = match step.properties() {
        StepProperties::Task(p) => PersistedProperties::Task(PersistedTaskProps {
            due_hours: p.due_hours,
            assignee: p.assignee.clone(),
            form_id: p.form_id.clone(),
        }),
        StepProperties::Approval(p) => PersistedProperties::Approval(PersistedApprovalProps {
            approvers: p.approvers.clone(),
            approval_type: p.approval_type,
            due_hours: p.due_hours,
        }),
        StepProperties::Notification(p) => {
            PersistedProperties::Notification(PersistedNotificationProps {
                recipients: p.recipients.clone(),
                template: p.template.clone(),
                channel: p.channel,
                subject: p.subject.clone(),
                webhook_url: p.webhook_url.clone(),
            })
        }
        StepProperties::Condition(p) => {
            PersistedProperties::Condition(condition_to_doc(&p.condition))
        }
        StepProperties::Automation(p) => PersistedProperties::Automation(PersistedAutomationProps {
            script: p.script.clone(),
            script_type: p.script_type,
            timeout_seconds: p.timeout_seconds,
            retry_attempts: p.retry_attempts,
            error_handling: p.error_handling,
        }),
    };
    PersistedStep {
        id: step.id().to_string(),
        name: step.name().to_owned(),
        description: step.description().to_owned(),
        is_start: step.is_start(),
        properties,
    }
}

fn transition_to_doc(transition: &Transition) -> PersistedTransition {
    PersistedTransition {
        id: transition.id().to_string(),
        from: transition.from().to_string(),
        to: transition.to().to_string(),
        name: transition.name().to_owned(),
        description: transition.description().to_owned(),
        condition: transition.condition().map(condition_to_doc),
        priority: transition.priority(),
        is_default: transition.is_default(),
        delay_seconds: transition.delay_seconds(),
    }
}

fn condition_to_doc(condition: &Condition) -> PersistedCondition {
    PersistedCondition {
        operator: condition.operator(),
        rules: condition.rules().iter().map(node_to_doc).collect(),
    }
}

fn node_to_doc(node: &ConditionNode) -> PersistedNode {
    match node {
        ConditionNode::Rule(rule) => PersistedNode::Rule(PersistedRule {
            field: rule.field().to_owned(),
            operator: rule.operator(),
            value: rule.value().map(Value::to_json),
        }),
        ConditionNode::Group(group) => PersistedNode::Group(condition_to_doc(group)),
    }
}

// ----------------------------------------------------------------------
// Document -> model
// ----------------------------------------------------------------------

fn decode(doc: PersistedGraph) -> Result<WorkflowGraph, PersistError> {
    let mut graph = WorkflowGraph::new();
    for step_doc in doc.steps {
        let step = step_from_doc(step_doc);
        if graph.step(step.id()).is_some() {
            return Err(PersistError::DuplicateStepId {
                step: step.id().clone(),
            });
        }
        graph.upsert_step(step);
    }
    for transition_doc in doc.transitions {
        graph.add_transition(transition_from_doc(transition_doc));
    }
    Ok(graph)
}

fn step_from_doc(doc: PersistedStep) -> Step {
    let properties = match doc.properties {
        PersistedProperties::Task(p) => StepProperties::Task(TaskProperties {
            due_hours: p.due_hours,
            assignee: p.assignee,
            form_id: p.form_id,
        }),
        PersistedProperties::Approval(p) => StepProperties::Approval(ApprovalProperties {
            approvers: p.approvers,
            approval_type: p.approval_type,
            due_hours: p.due_hours,
        }),
        PersistedProperties::Notification(p) => {
            StepProperties::Notification(NotificationProperties {
                recipients: p.recipients,
                template: p.template,
                channel: p.channel,
                subject: p.subject,
                webhook_url: p.webhook_url,
            })
        }
        PersistedProperties::Condition(c) => StepProperties::Condition(ConditionProperties {
            condition: condition_from_doc(c),
        }),
        PersistedProperties::Automation(p) => StepProperties::Automation(AutomationProperties {
            script: p.script,
            script_type: p.script_type,
            timeout_seconds: p.timeout_seconds,
            retry_attempts: p.retry_attempts,
            error_handling: p.error_handling,
        }),
    };
    Step::new(doc.id, doc.name, properties)
        .with_description(doc.description)
        .with_start(doc.is_start)
}

fn transition_from_doc(doc: PersistedTransition) -> Transition {
    Transition::new(doc.id, doc.from, doc.to)
        .with_name(doc.name)
        .with_description(doc.description)
        .with_priority(doc.priority)
        .with_default(doc.is_default)
        .with_delay(doc.delay_seconds)
        .with_condition(doc.condition.map(condition_from_doc))
}

fn condition_from_doc(doc: PersistedCondition) -> Condition {
    let mut condition = condition_tree_from_doc(doc);
    let mut next = 0;
    condition.renumber_from(&mut next);
    condition
}

fn condition_tree_from_doc(doc: PersistedCondition) -> Condition {
    let mut condition = Condition::new(doc.operator);
    for node in doc.rules {
        condition = match node {
            PersistedNode::Rule(rule) => {
                // Rule::new drops operands on unary operators.
                let value = rule.value.as_ref().map(Value::from_json);
                condition.with_rule(Rule::new(rule.field, rule.operator, value))
            }
            PersistedNode::Group(group) => condition.with_group(condition_tree_from_doc(group)),
        };
    }
    condition
}
