use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::step::StepId;

/// Identifier of a transition within one workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransitionId(String);

impl TransitionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransitionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for TransitionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Selection priority of a transition. Higher priorities are considered
/// first; ties keep insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
        };
        write!(f, "{name}")
    }
}

/// Upper bound on a transition's firing delay. Longer waits belong in a
/// task deadline, not a transition.
pub const MAX_DELAY_SECONDS: u32 = 3600;

/// A directed edge between two steps, optionally gated by a condition.
///
/// An ungated transition always fires when considered. A transition
/// marked default is the fallback taken when no gated sibling matches;
/// its own condition, if any, is never consulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    id: TransitionId,
    from: StepId,
    to: StepId,
    name: String,
    description: String,
    condition: Option<Condition>,
    priority: Priority,
    is_default: bool,
    delay_seconds: u32,
}

impl Transition {
    #[must_use]
    pub fn new(id: impl Into<TransitionId>, from: impl Into<StepId>, to: impl Into<StepId>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            name: String::new(),
            description: String::new(),
            condition: None,
            priority: Priority::default(),
            is_default: false,
            delay_seconds: 0,
        }
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

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Mark or unmark this transition as its source step's fallback.
    #[must_use]
    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Set the firing delay, clamped to [`MAX_DELAY_SECONDS`].
    #[must_use]
    pub fn with_delay(mut self, seconds: u32) -> Self {
        self.delay_seconds = seconds.min(MAX_DELAY_SECONDS);
        self
    }

    /// Set or clear the gate. A condition with no rules is normalized to
    /// no gate at all, so "empty condition" and "no condition" cannot
    /// drift apart.
    #[must_use]
    pub fn with_condition(mut self, condition: Option<Condition>) -> Self {
        self.condition = condition.filter(|c| !c.is_empty());
        self
    }

    /// The "enable conditions" editing action: gate with a fresh draft
    /// condition holding one blank rule. Already-gated transitions are
    /// left untouched.
    #[must_use]
    pub fn with_conditions_enabled(mut self) -> Self {
        if self.condition.is_none() {
            self.condition = Some(Condition::all().with_new_rule());
        }
        self
    }

    #[must_use]
    pub fn id(&self) -> &TransitionId {
        &self.id
    }

    #[must_use]
    pub fn from(&self) -> &StepId {
        &self.from
    }

    #[must_use]
    pub fn to(&self) -> &StepId {
        &self.to
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
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    #[must_use]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    #[must_use]
    pub fn delay_seconds(&self) -> u32 {
        self.delay_seconds
    }

    /// Whether a condition gates this transition.
    #[must_use]
    pub fn is_gated(&self) -> bool {
        self.condition.is_some()
    }

    pub(crate) fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.id)?;
        if let Some(condition) = &self.condition {
            write!(f, " when {condition}")?;
        }
        if self.is_default {
            write!(f, " [default]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rule::Rule;

    #[test]
    fn new_is_ungated_normal_priority() {
        let t = Transition::new("t1", "a", "b");
        assert_eq!(t.id().as_str(), "t1");
        assert_eq!(t.from().as_str(), "a");
        assert_eq!(t.to().as_str(), "b");
        assert!(!t.is_gated());
        assert!(!t.is_default());
        assert_eq!(t.priority(), Priority::Normal);
        assert_eq!(t.delay_seconds(), 0);
    }

    #[test]
    fn delay_clamps_to_one_hour() {
        let t = Transition::new("t1", "a", "b").with_delay(7200);
        assert_eq!(t.delay_seconds(), MAX_DELAY_SECONDS);

        let t = Transition::new("t1", "a", "b").with_delay(90);
        assert_eq!(t.delay_seconds(), 90);
    }

    #[test]
    fn empty_condition_normalizes_to_ungated() {
        let t = Transition::new("t1", "a", "b").with_condition(Some(Condition::all()));
        assert!(!t.is_gated());
        assert_eq!(t.condition(), None);
    }

    #[test]
    fn non_empty_condition_is_kept() {
        let t = Transition::new("t1", "a", "b")
            .with_condition(Some(Condition::all().with_rule(Rule::equals("x", 1_i64))));
        assert!(t.is_gated());
    }

    #[test]
    fn clearing_condition() {
        let t = Transition::new("t1", "a", "b")
            .with_condition(Some(Condition::all().with_rule(Rule::equals("x", 1_i64))))
            .with_condition(None);
        assert!(!t.is_gated());
    }

    #[test]
    fn enabling_conditions_seeds_one_draft_rule() {
        let t = Transition::new("t1", "a", "b").with_conditions_enabled();
        let condition = t.condition().unwrap();
        assert_eq!(condition.len(), 1);
    }

    #[test]
    fn enabling_conditions_twice_keeps_existing_gate() {
        let gated = Transition::new("t1", "a", "b")
            .with_condition(Some(Condition::all().with_rule(Rule::equals("x", 1_i64))))
            .with_conditions_enabled();
        let condition = gated.condition().unwrap();
        assert_eq!(condition.rule_count(), 1);
        match &condition.rules()[0] {
            crate::ConditionNode::Rule(rule) => assert_eq!(rule.field(), "x"),
            crate::ConditionNode::Group(_) => unreachable!(),
        }
    }

    #[test]
    fn priority_ordering() {
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn display() {
        let t = Transition::new("t1", "draft", "review")
            .with_condition(Some(Condition::all().with_rule(Rule::equals("ok", true))))
            .with_default(false);
        assert_eq!(t.to_string(), "draft -> review (t1) when (ok equals true)");

        let d = Transition::new("t2", "draft", "archive").with_default(true);
        assert_eq!(d.to_string(), "draft -> archive (t2) [default]");
    }
}
