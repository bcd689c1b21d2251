use flowgate::{
    Condition, EvaluationContext, Priority, Rule, Step, TaskProperties, Transition, WorkflowGraph,
};

fn task(id: &str, name: &str) -> Step {
    Step::task(
        id,
        name,
        TaskProperties {
            due_hours: Some(24),
            ..TaskProperties::default()
        },
    )
}

fn main() {
    // Escalate-before-route pattern using transition priorities.
    // Higher priorities are considered first; the default fires last.
    let graph = WorkflowGraph::new()
        .with_step(task("triage", "Triage").with_start(true))
        .with_step(task("escalate", "Escalate"))
        .with_step(task("agent", "Agent queue"))
        .with_step(task("backlog", "Backlog"))
        .with_transition(
            Transition::new("t1", "triage", "escalate")
                .with_priority(Priority::High) // checked first
                .with_condition(Some(
                    Condition::all().with_rule(Rule::greater_than("ticket.severity", 7_i64)),
                )),
        )
        .with_transition(
            Transition::new("t2", "triage", "agent") // normal priority: only if no escalation
                .with_condition(Some(
                    Condition::all().with_rule(Rule::equals("ticket.kind", "question")),
                )),
        )
        .with_transition(Transition::new("t3", "triage", "backlog").with_default(true));

    let from = "triage".into();

    // Severe question: escalation wins despite the routing gate matching too
    let ctx = EvaluationContext::new()
        .set("ticket.severity", 9_i64)
        .set("ticket.kind", "question");

    match graph.next_transition(&from, &ctx) {
        Some(t) => println!("Severe question: {} -> {}", t.id(), t.to()),
        None => println!("Severe question: no match"),
    }

    // Mild question: routed to an agent
    let ctx = EvaluationContext::new()
        .set("ticket.severity", 2_i64)
        .set("ticket.kind", "question");

    match graph.next_transition(&from, &ctx) {
        Some(t) => println!("Mild question: {} -> {}", t.id(), t.to()),
        None => println!("Mild question: no match"),
    }

    // Mild complaint: neither gate matches, the default parks it
    let ctx = EvaluationContext::new()
        .set("ticket.severity", 2_i64)
        .set("ticket.kind", "complaint");

    match graph.next_transition(&from, &ctx) {
        Some(t) => println!("Mild complaint: {} -> {}", t.id(), t.to()),
        None => println!("Mild complaint: no match"),
    }
}
