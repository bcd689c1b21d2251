use std::collections::HashMap;

use super::value::Value;

/// Runtime data a workflow instance carries, addressed by dot-separated
/// field paths like `"form.score"` or `"task.assignee.email"`.
///
/// Rule fields resolve against this structure; a path that is missing or
/// that stops at a nested map resolves to nothing, which the evaluator
/// treats as a failed match.
#[derive(Debug, Clone, Default)]
pub struct EvaluationContext {
    data: HashMap<String, ContextValue>,
}

#[derive(Debug, Clone)]
enum ContextValue {
    Leaf(Value),
    Nested(HashMap<String, ContextValue>),
}

impl EvaluationContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value at a dot-separated path. Creates intermediate nested maps as needed.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value.into());
        self
    }

    /// Insert a value at a dot-separated path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        Self::insert_recursive(&mut self.data, &segments, value);
    }

    /// Resolve a dot-separated path to its leaf value.
    /// Returns `None` if the path does not exist or points to a nested map.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        Self::resolve_recursive(&self.data, &segments)
    }

    /// Build a context from a JSON object, the shape workflow instance
    /// payloads arrive in. Nested objects become nested paths; `null`
    /// leaves stay resolvable as [`Value::Null`]. Non-object roots give
    /// an empty context.
    #[must_use]
    pub fn from_json(root: &serde_json::Value) -> Self {
        let mut ctx = Self::new();
        if let serde_json::Value::Object(map) = root {
            for (key, value) in map {
                ctx.data.insert(key.clone(), Self::json_to_context_value(value));
            }
        }
        ctx
    }

    fn json_to_context_value(value: &serde_json::Value) -> ContextValue {
        match value {
            serde_json::Value::Object(map) => ContextValue::Nested(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::json_to_context_value(v)))
                    .collect(),
            ),
            leaf => ContextValue::Leaf(Value::from_json(leaf)),
        }
    }

    fn insert_recursive(map: &mut HashMap<String, ContextValue>, segments: &[&str], value: Value) {
        match segments {
            [] => {}
            [last] => {
                map.insert((*last).to_owned(), ContextValue::Leaf(value));
            }
            [first, rest @ ..] => {
                let entry = map
                    .entry((*first).to_owned())
                    .or_insert_with(|| ContextValue::Nested(HashMap::new()));
                match entry {
                    ContextValue::Nested(nested) => {
                        Self::insert_recursive(nested, rest, value);
                    }
                    ContextValue::Leaf(_) => {
                        let mut nested = HashMap::new();
                        Self::insert_recursive(&mut nested, rest, value);
                        *entry = ContextValue::Nested(nested);
                    }
                }
            }
        }
    }

    fn resolve_recursive<'a>(
        map: &'a HashMap<String, ContextValue>,
        segments: &[&str],
    ) -> Option<&'a Value> {
        match segments {
            [] => None,
            [last] => match map.get(*last)? {
                ContextValue::Leaf(v) => Some(v),
                ContextValue::Nested(_) => None,
            },
            [first, rest @ ..] => match map.get(*first)? {
                ContextValue::Nested(nested) => Self::resolve_recursive(nested, rest),
                ContextValue::Leaf(_) => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_resolve_simple() {
        let ctx = EvaluationContext::new().set("status", "active");
        assert_eq!(ctx.resolve("status"), Some(&Value::String("active".to_owned())));
    }

    #[test]
    fn set_and_resolve_nested() {
        let ctx = EvaluationContext::new().set("task.assignee.age", 25_i64);
        assert_eq!(ctx.resolve("task.assignee.age"), Some(&Value::Int(25)));
    }

    #[test]
    fn resolve_missing_returns_none() {
        let ctx = EvaluationContext::new().set("form.score", 80_i64);
        assert_eq!(ctx.resolve("form.total"), None);
        assert_eq!(ctx.resolve("nonexistent"), None);
    }

    #[test]
    fn resolve_intermediate_path_returns_none() {
        let ctx = EvaluationContext::new().set("form.score", 80_i64);
        assert_eq!(ctx.resolve("form"), None);
    }

    #[test]
    fn multiple_nested_fields() {
        let ctx = EvaluationContext::new()
            .set("form.score", 92_i64)
            .set("form.reviewer", "alice")
            .set("task.status", "done");

        assert_eq!(ctx.resolve("form.score"), Some(&Value::Int(92)));
        assert_eq!(
            ctx.resolve("form.reviewer"),
            Some(&Value::String("alice".to_owned()))
        );
        assert_eq!(
            ctx.resolve("task.status"),
            Some(&Value::String("done".to_owned()))
        );
    }

    #[test]
    fn overwrite_leaf_with_nested() {
        let ctx = EvaluationContext::new()
            .set("task", "old_value")
            .set("task.status", "done");
        assert_eq!(ctx.resolve("task.status"), Some(&Value::String("done".to_owned())));
        assert_eq!(ctx.resolve("task"), None);
    }

    #[test]
    fn overwrite_value() {
        let ctx = EvaluationContext::new().set("score", 10_i64).set("score", 20_i64);
        assert_eq!(ctx.resolve("score"), Some(&Value::Int(20)));
    }

    #[test]
    fn insert_mutable_ref() {
        let mut ctx = EvaluationContext::new();
        ctx.insert("approved", Value::Bool(true));
        assert_eq!(ctx.resolve("approved"), Some(&Value::Bool(true)));
    }

    #[test]
    fn empty_context_resolves_nothing() {
        let ctx = EvaluationContext::new();
        assert_eq!(ctx.resolve("anything"), None);
    }

    #[test]
    fn deeply_nested_path() {
        let ctx = EvaluationContext::new().set("a.b.c.d.e", 42_i64);
        assert_eq!(ctx.resolve("a.b.c.d.e"), Some(&Value::Int(42)));
        assert_eq!(ctx.resolve("a.b.c.d"), None);
        assert_eq!(ctx.resolve("a.b.c"), None);
    }

    #[test]
    fn from_json_nested_object() {
        let payload = serde_json::json!({
            "task": { "status": "done", "priority": 2 },
            "form": { "score": 92.5, "tags": ["urgent", "finance"] },
            "approved": true
        });
        let ctx = EvaluationContext::from_json(&payload);
        assert_eq!(ctx.resolve("task.status"), Some(&Value::String("done".to_owned())));
        assert_eq!(ctx.resolve("task.priority"), Some(&Value::Int(2)));
        assert_eq!(ctx.resolve("form.score"), Some(&Value::Float(92.5)));
        assert_eq!(
            ctx.resolve("form.tags"),
            Some(&Value::List(vec![
                Value::String("urgent".to_owned()),
                Value::String("finance".to_owned()),
            ]))
        );
        assert_eq!(ctx.resolve("approved"), Some(&Value::Bool(true)));
    }

    #[test]
    fn from_json_null_leaf_is_resolvable() {
        let ctx = EvaluationContext::from_json(&serde_json::json!({ "form": { "notes": null } }));
        assert_eq!(ctx.resolve("form.notes"), Some(&Value::Null));
    }

    #[test]
    fn from_json_non_object_root_is_empty() {
        let ctx = EvaluationContext::from_json(&serde_json::json!([1, 2, 3]));
        assert_eq!(ctx.resolve("0"), None);
    }
}
