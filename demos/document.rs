use flowgate::{EvaluationContext, WorkflowGraph};

fn main() {
    let graph = WorkflowGraph::from_json_file("demos/expense.json").expect("failed to load graph");

    println!("{graph}");
    println!("fields the gates read: {:?}", graph.referenced_fields());
    println!("ready to activate: {}", graph.can_activate());

    let ctx = EvaluationContext::new().set("expense.total", 820_i64);

    match graph.next_transition(&"submit".into(), &ctx) {
        Some(t) => println!("Next: {} -> {}", t.id(), t.to()),
        None => println!("No transition fires."),
    }
}
