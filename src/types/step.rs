use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::Condition;

/// Identifier of a step within one workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StepId(String);

impl StepId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The five step kinds. The kind is derived from the properties a step
/// carries, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Task,
    Approval,
    Notification,
    Condition,
    Automation,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Task => "task",
            StepKind::Approval => "approval",
            StepKind::Notification => "notification",
            StepKind::Condition => "condition",
            StepKind::Automation => "automation",
        };
        write!(f, "{name}")
    }
}

/// How many approvers must act before an approval step completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalType {
    #[default]
    Any,
    All,
    Majority,
    Sequential,
}

/// Delivery channel for a notification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Email,
    Sms,
    InApp,
    Webhook,
}

/// What an automation step executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    #[default]
    Javascript,
    Webhook,
    Email,
    Database,
}

/// What the runtime does when an automation step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorHandling {
    #[default]
    Stop,
    Retry,
    Continue,
}

/// Properties of a human task step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskProperties {
    /// Deadline in hours. Required for a task to activate.
    pub due_hours: Option<u32>,
    /// Email address of the assignee.
    pub assignee: Option<String>,
    /// Form presented to the assignee.
    pub form_id: Option<String>,
}

/// Properties of an approval step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApprovalProperties {
    /// Email addresses of the approvers. At least one is required.
    pub approvers: Vec<String>,
    pub approval_type: ApprovalType,
    pub due_hours: Option<u32>,
}

/// Properties of a notification step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotificationProperties {
    pub recipients: Vec<String>,
    pub template: String,
    pub channel: Channel,
    pub subject: Option<String>,
    /// Required when the channel is [`Channel::Webhook`].
    pub webhook_url: Option<String>,
}

/// Properties of a condition (branching) step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionProperties {
    pub condition: Condition,
}

/// Properties of an automation step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AutomationProperties {
    pub script: String,
    pub script_type: ScriptType,
    /// Execution budget in seconds.
    pub timeout_seconds: Option<u32>,
    /// Required when `error_handling` is [`ErrorHandling::Retry`].
    pub retry_attempts: Option<u32>,
    pub error_handling: ErrorHandling,
}

/// Kind-specific step payload. The variant determines the step kind.
#[derive(Debug, Clone, PartialEq)]
pub enum StepProperties {
    Task(TaskProperties),
    Approval(ApprovalProperties),
    Notification(NotificationProperties),
    Condition(ConditionProperties),
    Automation(AutomationProperties),
}

impl StepProperties {
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            StepProperties::Task(_) => StepKind::Task,
            StepProperties::Approval(_) => StepKind::Approval,
            StepProperties::Notification(_) => StepKind::Notification,
            StepProperties::Condition(_) => StepKind::Condition,
            StepProperties::Automation(_) => StepKind::Automation,
        }
    }
}

/// A node in the workflow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    id: StepId,
    name: String,
    description: String,
    is_start: bool,
    properties: StepProperties,
}

impl Step {
    #[must_use]
    pub fn new(id: impl Into<StepId>, name: impl Into<String>, properties: StepProperties) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            is_start: false,
            properties,
        }
    }

    #[must_use]
    pub fn task(id: impl Into<StepId>, name: impl Into<String>, props: TaskProperties) -> Self {
        Self::new(id, name, StepProperties::Task(props))
    }

    #[must_use]
    pub fn approval(
        id: impl Into<StepId>,
        name: impl Into<String>,
        props: ApprovalProperties,
    ) -> Self {
        Self::new(id, name, StepProperties::Approval(props))
    }

    #[must_use]
    pub fn notification(
        id: impl Into<StepId>,
        name: impl Into<String>,
        props: NotificationProperties,
    ) -> Self {
        Self::new(id, name, StepProperties::Notification(props))
    }

    #[must_use]
    pub fn condition(
        id: impl Into<StepId>,
        name: impl Into<String>,
        props: ConditionProperties,
    ) -> Self {
        Self::new(id, name, StepProperties::Condition(props))
    }

    #[must_use]
    pub fn automation(
        id: impl Into<StepId>,
        name: impl Into<String>,
        props: AutomationProperties,
    ) -> Self {
        Self::new(id, name, StepProperties::Automation(props))
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark or unmark this step as the workflow entry point.
    #[must_use]
    pub fn with_start(mut self, is_start: bool) -> Self {
        self.is_start = is_start;
        self
    }

    #[must_use]
    pub fn with_properties(mut self, properties: StepProperties) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn id(&self) -> &StepId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn is_start(&self) -> bool {
        self.is_start
    }

    /// Kind derived from the properties variant.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        self.properties.kind()
    }

    #[must_use]
    pub fn properties(&self) -> &StepProperties {
        &self.properties
    }

    pub(crate) fn set_start(&mut self, is_start: bool) {
        self.is_start = is_start;
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' ({})", self.kind(), self.name, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_properties() {
        let step = Step::task("t1", "Review", TaskProperties::default());
        assert_eq!(step.kind(), StepKind::Task);

        let step = step.with_properties(StepProperties::Automation(AutomationProperties::default()));
        assert_eq!(step.kind(), StepKind::Automation);
    }

    #[test]
    fn builder_chain() {
        let step = Step::approval(
            "a1",
            "Manager sign-off",
            ApprovalProperties {
                approvers: vec!["boss@example.com".to_owned()],
                ..ApprovalProperties::default()
            },
        )
        .with_description("Second-level review")
        .with_start(true);

        assert_eq!(step.id().as_str(), "a1");
        assert_eq!(step.name(), "Manager sign-off");
        assert_eq!(step.description(), "Second-level review");
        assert!(step.is_start());
    }

    #[test]
    fn property_defaults() {
        assert_eq!(ApprovalProperties::default().approval_type, ApprovalType::Any);
        assert_eq!(NotificationProperties::default().channel, Channel::Email);
        assert_eq!(AutomationProperties::default().script_type, ScriptType::Javascript);
        assert_eq!(AutomationProperties::default().error_handling, ErrorHandling::Stop);
    }

    #[test]
    fn enum_wire_names() {
        assert_eq!(serde_json::to_string(&StepKind::Approval).unwrap(), "\"approval\"");
        assert_eq!(serde_json::to_string(&Channel::InApp).unwrap(), "\"in_app\"");
        assert_eq!(serde_json::to_string(&ApprovalType::Sequential).unwrap(), "\"sequential\"");
        assert_eq!(serde_json::to_string(&ErrorHandling::Retry).unwrap(), "\"retry\"");
    }

    #[test]
    fn display() {
        let step = Step::notification("n1", "Notify team", NotificationProperties::default());
        assert_eq!(step.to_string(), "notification 'Notify team' (n1)");
    }

    #[test]
    fn step_id_ordering_is_lexicographic() {
        let mut ids = vec![StepId::from("b"), StepId::from("a"), StepId::from("c")];
        ids.sort();
        assert_eq!(ids, vec![StepId::from("a"), StepId::from("b"), StepId::from("c")]);
    }
}
