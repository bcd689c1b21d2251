use flowgate::{
    Combinator, Condition, EvaluationContext, Priority, Rule, Step, TaskProperties, Transition,
    WorkflowGraph,
};
use proptest::prelude::*;

// --- Fixed field schema ---
// form.score    : i64 (0..=100)
// task.status   : string, one of {"open", "review", "done", "blocked"}
// form.complete : bool
// form.notes    : string (may be empty), sometimes absent entirely
// user.region   : string, one of {"us-east", "us-west", "eu", "ap"}

const STATUSES: &[&str] = &["open", "review", "done", "blocked"];
const NOTES: &[&str] = &["", "needs rework", "approved by legal"];
const REGIONS: &[&str] = &["us-east", "us-west", "eu", "ap"];

/// Generate a context that aligns with the fixed field schema.
pub fn arb_context() -> impl Strategy<Value = EvaluationContext> {
    (
        0_i64..=100,
        prop::sample::select(STATUSES),
        any::<bool>(),
        prop::option::of(prop::sample::select(NOTES)),
        prop::sample::select(REGIONS),
    )
        .prop_map(|(score, status, complete, notes, region)| {
            let mut ctx = EvaluationContext::new()
                .set("form.score", score)
                .set("task.status", status)
                .set("form.complete", complete)
                .set("user.region", region);
            if let Some(notes) = notes {
                ctx = ctx.set("form.notes", notes);
            }
            ctx
        })
}

/// Generate a leaf rule on a random field from the schema.
pub fn arb_leaf_rule() -> impl Strategy<Value = Rule> {
    prop_oneof![
        // form.score comparisons
        (0_i64..=100, prop::sample::select(&[0u8, 1, 2, 3][..])).prop_map(|(val, op)| match op {
            0 => Rule::equals("form.score", val),
            1 => Rule::not_equals("form.score", val),
            2 => Rule::greater_than("form.score", val),
            _ => Rule::less_than("form.score", val),
        }),
        // task.status comparisons (eq/neq only)
        (prop::sample::select(STATUSES), prop::bool::ANY).prop_map(|(val, is_eq)| {
            if is_eq {
                Rule::equals("task.status", val)
            } else {
                Rule::not_equals("task.status", val)
            }
        }),
        // form.complete comparisons
        any::<bool>().prop_map(|val| Rule::equals("form.complete", val)),
        // form.notes presence checks (the unary operators)
        prop::bool::ANY.prop_map(|not_empty| {
            if not_empty {
                Rule::is_not_empty("form.notes")
            } else {
                Rule::is_empty("form.notes")
            }
        }),
        // user.region comparisons (eq/neq only)
        (prop::sample::select(REGIONS), prop::bool::ANY).prop_map(|(val, is_eq)| {
            if is_eq {
                Rule::equals("user.region", val)
            } else {
                Rule::not_equals("user.region", val)
            }
        }),
    ]
}

fn arb_combinator() -> impl Strategy<Value = Combinator> {
    prop::bool::ANY.prop_map(|and| if and { Combinator::And } else { Combinator::Or })
}

/// One child of a generated condition tree.
#[derive(Debug, Clone)]
pub enum GenNode {
    Rule(Rule),
    Group(GenCondition),
}

/// A generated condition tree, kept as plain data so shrinking stays
/// structural.
#[derive(Debug, Clone)]
pub struct GenCondition {
    pub operator: Combinator,
    pub nodes: Vec<GenNode>,
}

impl GenCondition {
    /// Assemble into an actual `Condition`.
    #[must_use]
    pub fn build(&self) -> Condition {
        let mut condition = Condition::new(self.operator);
        for node in &self.nodes {
            condition = match node {
                GenNode::Rule(rule) => condition.with_rule(rule.clone()),
                GenNode::Group(group) => condition.with_group(group.build()),
            };
        }
        condition
    }
}

/// Generate a condition tree (rules and nested groups), bounded depth.
/// Every generated tree has at least one rule, so it never normalizes
/// away to an ungated transition.
pub fn arb_gen_condition(max_depth: u32) -> impl Strategy<Value = GenCondition> {
    let leaf = (
        arb_combinator(),
        prop::collection::vec(arb_leaf_rule().prop_map(GenNode::Rule), 1..=4),
    )
        .prop_map(|(operator, nodes)| GenCondition { operator, nodes });
    leaf.prop_recursive(max_depth, 16, 4, |inner| {
        (
            arb_combinator(),
            prop::collection::vec(
                prop_oneof![
                    3 => arb_leaf_rule().prop_map(GenNode::Rule),
                    1 => inner.prop_map(GenNode::Group),
                ],
                1..=4,
            ),
        )
            .prop_map(|(operator, nodes)| GenCondition { operator, nodes })
    })
}

/// Generate a built condition directly.
pub fn arb_condition() -> impl Strategy<Value = Condition> {
    arb_gen_condition(3).prop_map(|gen| gen.build())
}

/// A generated outgoing transition (gate + priority + default flag).
#[derive(Debug, Clone)]
pub struct GenTransition {
    pub priority: Priority,
    pub gate: Option<GenCondition>,
    pub is_default: bool,
}

/// A generated hub-and-spoke workflow: one start step fanning out into
/// one target step per transition.
#[derive(Debug, Clone)]
pub struct GenGraph {
    pub transitions: Vec<GenTransition>,
}

impl GenGraph {
    /// Build into an actual `WorkflowGraph`. Transition `t{i}` leaves
    /// `hub` for step `s{i}`.
    #[must_use]
    pub fn build(&self) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new().with_step(task_step("hub").with_start(true));
        for (i, spec) in self.transitions.iter().enumerate() {
            let target = format!("s{i}");
            graph = graph.with_step(task_step(&target)).with_transition(
                Transition::new(format!("t{i}"), "hub", target)
                    .with_priority(spec.priority)
                    .with_default(spec.is_default)
                    .with_condition(spec.gate.as_ref().map(GenCondition::build)),
            );
        }
        graph
    }
}

fn task_step(id: &str) -> Step {
    Step::task(
        id,
        id,
        TaskProperties {
            due_hours: Some(24),
            ..TaskProperties::default()
        },
    )
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop::sample::select(&[Priority::Low, Priority::Normal, Priority::High][..])
}

/// Generate a graph with 1..=6 outgoing transitions from the hub: random
/// priorities, random gates (`None` means ungated), and at most one
/// default.
pub fn arb_graph() -> impl Strategy<Value = GenGraph> {
    (1_usize..=6)
        .prop_flat_map(|n| {
            (
                prop::collection::vec(
                    (arb_priority(), prop::option::of(arb_gen_condition(2))),
                    n,
                ),
                prop::option::of(0..n),
            )
        })
        .prop_map(|(parts, default_at)| GenGraph {
            transitions: parts
                .into_iter()
                .enumerate()
                .map(|(i, (priority, gate))| GenTransition {
                    priority,
                    gate,
                    is_default: default_at == Some(i),
                })
                .collect(),
        })
}
