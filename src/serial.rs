//! Binary snapshot format for workflow graphs.
//!
//! This module provides a stable binary format for caching
//! [`WorkflowGraph`](crate::WorkflowGraph) values so hot startup paths can
//! skip the JSON parse. The format consists of a 32-byte fixed header
//! followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"FLOW"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version in the header must match exactly. If it does not,
//! deserialization fails immediately with [`DeserializeError::IncompatibleVersion`].
//! The engine version is informational only.
//!
//! Session-local rule ids are not part of the payload. They are
//! reassigned in tree order when a snapshot is decoded.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    ApprovalProperties, ApprovalType, AutomationProperties, Channel, Combinator, ComparisonOp,
    Condition, ConditionNode, ConditionProperties, ErrorHandling, NotificationProperties, Priority,
    Rule, ScriptType, Step, StepProperties, TaskProperties, Transition, Value, WorkflowGraph,
    MAX_DELAY_SECONDS,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"FLOW";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`WorkflowGraph`](crate::WorkflowGraph) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode workflow graph: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`WorkflowGraph`](crate::WorkflowGraph) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a flowgate binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

// Composite model types get mirrors here; the leaf enums already derive
// serde and bincode stores them by variant index.

#[derive(Debug, Serialize, Deserialize)]
struct SerializedGraph {
    metadata: GraphMetadata,
    steps: Vec<SerializedStep>,
    transitions: Vec<SerializedTransition>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphMetadata {
    step_count: usize,
    transition_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedStep {
    id: String,
    name: String,
    description: String,
    is_start: bool,
    properties: SerializedProperties,
}

#[derive(Debug, Serialize, Deserialize)]
enum SerializedProperties {
    Task {
        due_hours: Option<u32>,
        assignee: Option<String>,
        form_id: Option<String>,
    },
    Approval {
        approvers: Vec<String>,
        approval_type: ApprovalType,
        due_hours: Option<u32>,
    },
    Notification {
        recipients: Vec<String>,
        template: String,
        channel: Channel,
        subject: Option<String>,
        webhook_url: Option<String>,
    },
    Condition(SerializedCondition),
    Automation {
        script: String,
        script_type: ScriptType,
        timeout_seconds: Option<u32>,
        retry_attempts: Option<u32>,
        error_handling: ErrorHandling,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedTransition {
    id: String,
    from: String,
    to: String,
    name: String,
    description: String,
    condition: Option<SerializedCondition>,
    priority: Priority,
    is_default: bool,
    delay_seconds: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedCondition {
    operator: Combinator,
    nodes: Vec<SerializedNode>,
}

#[derive(Debug, Serialize, Deserialize)]
enum SerializedNode {
    Rule(SerializedRule),
    Group(SerializedCondition),
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    field: String,
    operator: ComparisonOp,
    value: Option<SerializedValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum SerializedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<SerializedValue>),
}

// ---------------------------------------------------------------------------
// Value conversion
// ---------------------------------------------------------------------------

fn serialize_value(value: &Value) -> SerializedValue {
    match value {
        Value::Null => SerializedValue::Null,
        Value::Bool(v) => SerializedValue::Bool(*v),
        Value::Int(v) => SerializedValue::Int(*v),
        Value::Float(v) => SerializedValue::Float(*v),
        Value::String(v) => SerializedValue::Str(v.clone()),
        Value::List(items) => SerializedValue::List(items.iter().map(serialize_value).collect()),
    }
}

fn deserialize_value(value: SerializedValue) -> Value {
    match value {
        SerializedValue::Null => Value::Null,
        SerializedValue::Bool(v) => Value::Bool(v),
        SerializedValue::Int(v) => Value::Int(v),
        SerializedValue::Float(v) => Value::Float(v),
        SerializedValue::Str(v) => Value::String(v),
        SerializedValue::List(items) => {
            Value::List(items.into_iter().map(deserialize_value).collect())
        }
    }
}

// ---------------------------------------------------------------------------
// Condition conversion
// ---------------------------------------------------------------------------

fn serialize_condition(condition: &Condition) -> SerializedCondition {
    SerializedCondition {
        operator: condition.operator(),
        nodes: condition
            .rules()
            .iter()
            .map(|node| match node {
                ConditionNode::Rule(rule) => SerializedNode::Rule(SerializedRule {
                    field: rule.field().to_owned(),
                    operator: rule.operator(),
                    value: rule.value().map(serialize_value),
                }),
                ConditionNode::Group(group) => SerializedNode::Group(serialize_condition(group)),
            })
            .collect(),
    }
}

/// Rebuild a condition tree, reassigning rule ids in tree order.
fn deserialize_condition(ser: SerializedCondition) -> Condition {
    let mut condition = condition_tree(ser);
    let mut next = 0;
    condition.renumber_from(&mut next);
    condition
}

fn condition_tree(ser: SerializedCondition) -> Condition {
    let mut condition = Condition::new(ser.operator);
    for node in ser.nodes {
        condition = match node {
            SerializedNode::Rule(rule) => {
                let value = rule.value.map(deserialize_value);
                condition.with_rule(Rule::new(rule.field, rule.operator, value))
            }
            SerializedNode::Group(group) => condition.with_group(condition_tree(group)),
        };
    }
    condition
}

// ---------------------------------------------------------------------------
// WorkflowGraph -> SerializedGraph
// ---------------------------------------------------------------------------

fn graph_to_serialized(graph: &WorkflowGraph, source_text: Option<&str>) -> SerializedGraph {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    // Steps iterate in id order, so the payload is deterministic for a
    // given graph.
    let steps: Vec<SerializedStep> = graph.steps().map(serialize_step).collect();
    let transitions: Vec<SerializedTransition> =
        graph.transitions().iter().map(serialize_transition).collect();

    SerializedGraph {
        metadata: GraphMetadata {
            step_count: steps.len(),
            transition_count: transitions.len(),
            source_digest,
        },
        steps,
        transitions,
    }
}

fn serialize_step(step: &Step) -> SerializedStep {
    let properties = match step.properties() {
        StepProperties::Task(p) => SerializedProperties::Task {
            due_hours: p.due_hours,
            assignee: p.assignee.clone(),
            form_id: p.form_id.clone(),
        },
        StepProperties::Approval(p) => SerializedProperties::Approval {
            approvers: p.approvers.clone(),
            approval_type: p.approval_type,
            due_hours: p.due_hours,
        },
        StepProperties::Notification(p) => SerializedProperties::Notification {
            recipients: p.recipients.clone(),
            template: p.template.clone(),
            channel: p.channel,
            subject: p.subject.clone(),
            webhook_url: p.webhook_url.clone(),
        },
        StepProperties::Condition(p) => {
            SerializedProperties::Condition(serialize_condition(&p.condition))
        }
        StepProperties::Automation(p) => SerializedProperties::Automation {
            script: p.script.clone(),
            script_type: p.script_type,
            timeout_seconds: p.timeout_seconds,
            retry_attempts: p.retry_attempts,
            error_handling: p.error_handling,
        },
    };

    SerializedStep {
        id: step.id().as_str().to_owned(),
        name: step.name().to_owned(),
        description: step.description().to_owned(),
        is_start: step.is_start(),
        properties,
    }
}

fn serialize_transition(transition: &Transition) -> SerializedTransition {
    SerializedTransition {
        id: transition.id().as_str().to_owned(),
        from: transition.from().as_str().to_owned(),
        to: transition.to().as_str().to_owned(),
        name: transition.name().to_owned(),
        description: transition.description().to_owned(),
        condition: transition.condition().map(serialize_condition),
        priority: transition.priority(),
        is_default: transition.is_default(),
        delay_seconds: transition.delay_seconds(),
    }
}

// ---------------------------------------------------------------------------
// SerializedGraph -> WorkflowGraph
// ---------------------------------------------------------------------------

fn serialized_to_graph(ser: SerializedGraph) -> Result<WorkflowGraph, DeserializeError> {
    validate(&ser)?;

    let mut steps = BTreeMap::new();
    for step in ser.steps {
        let step = deserialize_step(step);
        steps.insert(step.id().clone(), step);
    }

    let transitions = ser
        .transitions
        .into_iter()
        .map(deserialize_transition)
        .collect();

    Ok(WorkflowGraph { steps, transitions })
}

fn deserialize_step(ser: SerializedStep) -> Step {
    let properties = match ser.properties {
        SerializedProperties::Task {
            due_hours,
            assignee,
            form_id,
        } => StepProperties::Task(TaskProperties {
            due_hours,
            assignee,
            form_id,
        }),
        SerializedProperties::Approval {
            approvers,
            approval_type,
            due_hours,
        } => StepProperties::Approval(ApprovalProperties {
            approvers,
            approval_type,
            due_hours,
        }),
        SerializedProperties::Notification {
            recipients,
            template,
            channel,
            subject,
            webhook_url,
        } => StepProperties::Notification(NotificationProperties {
            recipients,
            template,
            channel,
            subject,
            webhook_url,
        }),
        SerializedProperties::Condition(condition) => {
            StepProperties::Condition(ConditionProperties {
                condition: deserialize_condition(condition),
            })
        }
        SerializedProperties::Automation {
            script,
            script_type,
            timeout_seconds,
            retry_attempts,
            error_handling,
        } => StepProperties::Automation(AutomationProperties {
            script,
            script_type,
            timeout_seconds,
            retry_attempts,
            error_handling,
        }),
    };

    Step::new(ser.id, ser.name, properties)
        .with_description(ser.description)
        .with_start(ser.is_start)
}

fn deserialize_transition(ser: SerializedTransition) -> Transition {
    // Going through the builders keeps the model normalizations: an
    // empty condition collapses to no gate at all.
    Transition::new(ser.id, ser.from, ser.to)
        .with_name(ser.name)
        .with_description(ser.description)
        .with_priority(ser.priority)
        .with_default(ser.is_default)
        .with_delay(ser.delay_seconds)
        .with_condition(ser.condition.map(deserialize_condition))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject payload states the encoder cannot produce. Everything a live
/// graph can represent (dangling references, draft rules, empty
/// condition-step conditions) is let through; those are editing states,
/// not corruption.
fn validate(ser: &SerializedGraph) -> Result<(), DeserializeError> {
    if ser.metadata.step_count != ser.steps.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} steps but payload has {}",
            ser.metadata.step_count,
            ser.steps.len()
        )));
    }
    if ser.metadata.transition_count != ser.transitions.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} transitions but payload has {}",
            ser.metadata.transition_count,
            ser.transitions.len()
        )));
    }

    let mut seen = HashSet::new();
    for step in &ser.steps {
        if !seen.insert(step.id.as_str()) {
            return Err(DeserializeError::Validation(format!(
                "duplicate step id '{}'",
                step.id
            )));
        }
        if let SerializedProperties::Condition(condition) = &step.properties {
            validate_condition(condition)?;
        }
    }

    for transition in &ser.transitions {
        if transition.delay_seconds > MAX_DELAY_SECONDS {
            return Err(DeserializeError::Validation(format!(
                "transition '{}' has delay {}s, cap is {}s",
                transition.id, transition.delay_seconds, MAX_DELAY_SECONDS
            )));
        }
        if let Some(condition) = &transition.condition {
            validate_condition(condition)?;
        }
    }

    Ok(())
}

fn validate_condition(ser: &SerializedCondition) -> Result<(), DeserializeError> {
    for node in &ser.nodes {
        match node {
            SerializedNode::Rule(rule) => {
                if rule.operator.is_unary() && rule.value.is_some() {
                    return Err(DeserializeError::Validation(format!(
                        "unary operator '{}' on field '{}' carries an operand",
                        rule.operator, rule.field
                    )));
                }
            }
            SerializedNode::Group(group) => validate_condition(group)?,
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] is engine_version (informational, not used for checks)
    // bytes[8..12] is flags (reserved)
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    graph: &WorkflowGraph,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = graph_to_serialized(graph, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<WorkflowGraph, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_start = HEADER_SIZE;
    let payload_end = payload_start + payload_len as usize;
    if bytes.len() < payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[payload_start..payload_end];

    // Integrity check
    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedGraph, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;

    serialized_to_graph(serialized)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
