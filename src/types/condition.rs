use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;
use super::rule::{Rule, RulePatch};

/// How a condition combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    /// Every child must match. An `And` with no children matches.
    #[default]
    And,
    /// At least one child must match. An `Or` with no children does not match.
    Or,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => write!(f, "and"),
            Combinator::Or => write!(f, "or"),
        }
    }
}

/// One child of a condition: either a leaf rule or a nested group.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Rule(Rule),
    Group(Condition),
}

/// A boolean combination of rules gating a transition.
///
/// Conditions form a tree; the flat editor case is a single level of
/// rules under one combinator, and nested groups extend that without a
/// separate representation. All editing operations return the modified
/// condition so edits chain the same way construction does.
///
/// ```
/// use flowgate::{Condition, Rule};
///
/// let cond = Condition::all()
///     .with_rule(Rule::equals("task.status", "done"))
///     .with_group(Condition::any()
///         .with_rule(Rule::greater_than("form.score", 80_i64))
///         .with_rule(Rule::equals("form.override", true)));
/// assert_eq!(cond.rule_count(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    operator: Combinator,
    rules: Vec<ConditionNode>,
}

impl Condition {
    /// An empty condition with the given combinator.
    #[must_use]
    pub fn new(operator: Combinator) -> Self {
        Self {
            operator,
            rules: Vec::new(),
        }
    }

    /// An empty `And` condition.
    #[must_use]
    pub fn all() -> Self {
        Self::new(Combinator::And)
    }

    /// An empty `Or` condition.
    #[must_use]
    pub fn any() -> Self {
        Self::new(Combinator::Or)
    }

    /// Append a rule, assigning it the next free session-local id.
    #[must_use]
    pub fn with_rule(mut self, mut rule: Rule) -> Self {
        rule.id = self.next_rule_id();
        self.rules.push(ConditionNode::Rule(rule));
        self
    }

    /// Append a nested group as-is. Rule ids inside the group are kept.
    #[must_use]
    pub fn with_group(mut self, group: Condition) -> Self {
        self.rules.push(ConditionNode::Group(group));
        self
    }

    /// Append a blank rule (empty field, `equals`, no operand), the
    /// "add rule" editing action. The draft fails validation until the
    /// field is filled in.
    #[must_use]
    pub fn with_new_rule(mut self) -> Self {
        let id = self.next_rule_id();
        self.rules.push(ConditionNode::Rule(Rule::draft(id)));
        self
    }

    /// Apply a patch to the direct child at `index`. Out-of-range
    /// indices and group children are left untouched.
    #[must_use]
    pub fn with_rule_update(mut self, index: usize, patch: RulePatch) -> Self {
        if let Some(ConditionNode::Rule(rule)) = self.rules.get_mut(index) {
            rule.apply(patch);
        }
        self
    }

    /// Remove the direct child at `index`. Out-of-range indices are a no-op.
    #[must_use]
    pub fn with_rule_removed(mut self, index: usize) -> Self {
        if index < self.rules.len() {
            self.rules.remove(index);
        }
        self
    }

    #[must_use]
    pub fn operator(&self) -> Combinator {
        self.operator
    }

    /// Direct children, in order.
    #[must_use]
    pub fn rules(&self) -> &[ConditionNode] {
        &self.rules
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether this condition has no children at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Total number of leaf rules, including those in nested groups.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules
            .iter()
            .map(|node| match node {
                ConditionNode::Rule(_) => 1,
                ConditionNode::Group(group) => group.rule_count(),
            })
            .sum()
    }

    /// Every distinct field path referenced by a leaf rule, in sorted
    /// order. Blank draft fields are skipped.
    #[must_use]
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    pub(crate) fn collect_fields(&self, fields: &mut BTreeSet<String>) {
        for node in &self.rules {
            match node {
                ConditionNode::Rule(rule) => {
                    if !rule.field.is_empty() {
                        fields.insert(rule.field.clone());
                    }
                }
                ConditionNode::Group(group) => group.collect_fields(fields),
            }
        }
    }

    /// Schema checks over the whole tree. Findings are keyed by an
    /// indexed path like `rules[1].field` so editors can point at the
    /// offending row. A nested group with no rules is an error; a whole
    /// condition with no rules is handled by its owner (transition
    /// conditions are normalized away, condition steps reject it).
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.validate_into("rules", &mut errors);
        errors
    }

    fn validate_into(&self, prefix: &str, errors: &mut Vec<ValidationError>) {
        for (i, node) in self.rules.iter().enumerate() {
            match node {
                ConditionNode::Rule(rule) => {
                    for err in rule.validate() {
                        errors.push(ValidationError {
                            field: format!("{prefix}[{i}].{}", err.field),
                            message: err.message,
                            severity: err.severity,
                        });
                    }
                }
                ConditionNode::Group(group) => {
                    if group.is_empty() {
                        errors.push(ValidationError::new(
                            format!("{prefix}[{i}]"),
                            "group has no rules",
                        ));
                    } else {
                        group.validate_into(&format!("{prefix}[{i}].rules"), errors);
                    }
                }
            }
        }
    }

    /// One more than the highest leaf rule id anywhere in the tree.
    pub(crate) fn next_rule_id(&self) -> u64 {
        self.max_rule_id().map_or(0, |max| max + 1)
    }

    /// Reassign leaf ids in tree order starting from `next`. Used after
    /// loading a persisted document, where ids are not stored.
    pub(crate) fn renumber_from(&mut self, next: &mut u64) {
        for node in &mut self.rules {
            match node {
                ConditionNode::Rule(rule) => {
                    rule.id = *next;
                    *next += 1;
                }
                ConditionNode::Group(group) => group.renumber_from(next),
            }
        }
    }

    fn max_rule_id(&self) -> Option<u64> {
        self.rules
            .iter()
            .filter_map(|node| match node {
                ConditionNode::Rule(rule) => Some(rule.id),
                ConditionNode::Group(group) => group.max_rule_id(),
            })
            .max()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, node) in self.rules.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.operator)?;
            }
            match node {
                ConditionNode::Rule(rule) => write!(f, "{rule}")?,
                ConditionNode::Group(group) => write!(f, "{group}")?,
            }
        }
        write!(f, ")")
    }
}
