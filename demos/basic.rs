use flowgate::{
    Condition, EvaluationContext, Rule, Step, TaskProperties, Transition, WorkflowGraph,
};

fn main() {
    // Define a two-step workflow with a gated transition
    let graph = WorkflowGraph::new()
        .with_step(
            Step::task(
                "submit",
                "Submit expense",
                TaskProperties {
                    due_hours: Some(24),
                    ..TaskProperties::default()
                },
            )
            .with_start(true),
        )
        .with_step(Step::task(
            "review",
            "Manager review",
            TaskProperties {
                due_hours: Some(48),
                ..TaskProperties::default()
            },
        ))
        .with_transition(
            Transition::new("t1", "submit", "review").with_condition(Some(
                Condition::all().with_rule(Rule::greater_than("expense.total", 500_i64)),
            )),
        );

    println!("{graph}");
    println!("activation errors: {:?}", graph.validate_for_activation());

    // Decide which transition fires for a given runtime context
    let ctx = EvaluationContext::new().set("expense.total", 800_i64);

    match graph.next_transition(&"submit".into(), &ctx) {
        Some(t) => println!("Next: {} -> {}", t.id(), t.to()),
        None => println!("No transition fires."),
    }
}
