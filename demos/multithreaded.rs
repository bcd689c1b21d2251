use std::sync::Arc;
use std::thread;

use flowgate::{
    Condition, EvaluationContext, Priority, Rule, Step, StepId, TaskProperties, Transition,
    WorkflowGraph,
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
    let graph = Arc::new(
        WorkflowGraph::new()
            .with_step(task("triage", "Triage").with_start(true))
            .with_step(task("escalate", "Escalate"))
            .with_step(task("backlog", "Backlog"))
            .with_transition(
                Transition::new("t1", "triage", "escalate")
                    .with_priority(Priority::High)
                    .with_condition(Some(
                        Condition::all().with_rule(Rule::greater_than("ticket.severity", 7_i64)),
                    )),
            )
            .with_transition(Transition::new("t2", "triage", "backlog").with_default(true)),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let g = Arc::clone(&graph);
            thread::spawn(move || {
                let severity = 6_i64 + i64::from(i);
                let ctx = EvaluationContext::new().set("ticket.severity", severity);

                let next = g
                    .next_transition(&StepId::from("triage"), &ctx)
                    .map(|t| t.id().as_str().to_owned());
                println!("Thread {i} (severity {severity}): {next:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
