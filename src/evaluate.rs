use std::time::Instant;

use crate::types::{
    Combinator, ComparisonOp, Condition, ConditionNode, EvaluationContext, Rule, SelectionReport,
    StepId, Transition, TransitionOutcome, Value, WorkflowGraph,
};

/// Evaluate a condition tree against a context.
///
/// `And` with no children matches; `Or` with no children does not. This
/// follows directly from the fold and keeps gating conservative: an `Or`
/// that lost its last rule stops matching instead of silently passing
/// everything through.
#[must_use]
pub fn evaluate(condition: &Condition, ctx: &EvaluationContext) -> bool {
    match condition.operator() {
        Combinator::And => condition.rules().iter().all(|node| eval_node(node, ctx)),
        Combinator::Or => condition.rules().iter().any(|node| eval_node(node, ctx)),
    }
}

fn eval_node(node: &ConditionNode, ctx: &EvaluationContext) -> bool {
    match node {
        ConditionNode::Rule(rule) => evaluate_rule(rule, ctx),
        ConditionNode::Group(group) => evaluate(group, ctx),
    }
}

/// Evaluate a single rule against a context. Fails closed: an
/// unresolvable field, a missing operand, or an inapplicable comparison
/// is a failed match, never an error.
///
/// The unary operators are the one place absence means something:
/// a field that does not resolve is empty, so `is_empty` matches it and
/// `is_not_empty` does not.
#[must_use]
pub fn evaluate_rule(rule: &Rule, ctx: &EvaluationContext) -> bool {
    let resolved = ctx.resolve(rule.field());
    match rule.operator() {
        ComparisonOp::IsEmpty => resolved.map_or(true, Value::is_empty),
        ComparisonOp::IsNotEmpty => resolved.map_or(false, |v| !v.is_empty()),
        op => resolved
            .zip(rule.value())
            .and_then(|(found, operand)| found.compare(op, operand))
            .unwrap_or(false),
    }
}

/// Pick the transition that fires out of `from`.
///
/// Non-default candidates are considered by priority, descending, with
/// insertion order breaking ties; an ungated candidate matches
/// unconditionally. When none matches, the first default out of `from`
/// fires without its condition ever being consulted.
pub(crate) fn select<'a>(
    graph: &'a WorkflowGraph,
    from: &StepId,
    ctx: &EvaluationContext,
) -> Option<&'a Transition> {
    for candidate in candidates(graph, from) {
        if candidate.is_default() {
            return Some(candidate);
        }
        if candidate.condition().map_or(true, |c| evaluate(c, ctx)) {
            return Some(candidate);
        }
    }
    None
}

/// Like [`select`], but records an outcome for every candidate. The
/// default, when present, is always reported matched since it fires
/// unconditionally once reached.
pub(crate) fn select_detailed(
    graph: &WorkflowGraph,
    from: &StepId,
    ctx: &EvaluationContext,
) -> SelectionReport {
    let start = Instant::now();
    let outcomes: Vec<TransitionOutcome> = candidates(graph, from)
        .into_iter()
        .map(|t| {
            let matched = t.is_default() || t.condition().map_or(true, |c| evaluate(c, ctx));
            TransitionOutcome::new(t.id().clone(), matched, t.is_default())
        })
        .collect();
    let selected = outcomes
        .iter()
        .find(|o| o.matched())
        .map(|o| o.transition().clone());
    SelectionReport::new(selected, outcomes, start.elapsed())
}

/// Candidates out of `from` in consideration order: non-defaults by
/// priority descending (stable, so insertion order breaks ties), then
/// the first default last.
fn candidates<'a>(graph: &'a WorkflowGraph, from: &StepId) -> Vec<&'a Transition> {
    let mut ordered: Vec<&Transition> = graph
        .transitions()
        .iter()
        .filter(|t| t.from() == from && !t.is_default())
        .collect();
    ordered.sort_by(|a, b| b.priority().cmp(&a.priority()));
    if let Some(default) = graph.transitions().iter().find(|t| t.from() == from && t.is_default()) {
        ordered.push(default);
    }
    ordered
}
