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
    let graph = WorkflowGraph::new()
        .with_step(task("triage", "Triage ticket").with_start(true))
        .with_step(task("escalate", "Escalate to on-call"))
        .with_step(task("agent", "Route to agent"))
        .with_step(task("backlog", "Park in backlog"))
        .with_transition(
            Transition::new("t1", "triage", "escalate")
                .with_priority(Priority::High)
                .with_condition(Some(
                    Condition::all().with_rule(Rule::greater_than("ticket.severity", 7_i64)),
                )),
        )
        .with_transition(
            Transition::new("t2", "triage", "agent").with_condition(Some(
                Condition::all().with_rule(Rule::equals("ticket.kind", "question")),
            )),
        )
        .with_transition(Transition::new("t3", "triage", "backlog").with_default(true));

    let ctx = EvaluationContext::new()
        .set("ticket.severity", 3_i64)
        .set("ticket.kind", "question");

    let report = graph.next_transition_detailed(&"triage".into(), &ctx);

    println!("{report}");
    println!();
    for outcome in report.outcomes() {
        println!(
            "  {} matched={} default={}",
            outcome.transition(),
            outcome.matched(),
            outcome.is_default()
        );
    }
    println!("Matched candidates: {}", report.matched_count());
    println!("Duration: {:?}", report.duration());
}
