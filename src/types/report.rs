use std::fmt;
use std::time::Duration;

use super::transition::TransitionId;

/// Per-candidate outcome inside a [`SelectionReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    transition: TransitionId,
    matched: bool,
    is_default: bool,
}

impl TransitionOutcome {
    pub(crate) fn new(transition: TransitionId, matched: bool, is_default: bool) -> Self {
        Self {
            transition,
            matched,
            is_default,
        }
    }

    #[must_use]
    pub fn transition(&self) -> &TransitionId {
        &self.transition
    }

    /// Whether this candidate's gate passed. A default transition is
    /// reported as matched unconditionally; its gate is never consulted.
    #[must_use]
    pub fn matched(&self) -> bool {
        self.matched
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

/// Detailed selection report returned by
/// [`WorkflowGraph::next_transition_detailed()`](super::graph::WorkflowGraph::next_transition_detailed).
///
/// Lists every candidate in consideration order (gated and ungated
/// transitions by priority, the default last), which of them matched,
/// the selected transition, and the wall-clock duration of the
/// selection.
#[derive(Debug, Clone)]
#[must_use]
pub struct SelectionReport {
    selected: Option<TransitionId>,
    outcomes: Vec<TransitionOutcome>,
    duration: Duration,
}

impl SelectionReport {
    pub(crate) fn new(
        selected: Option<TransitionId>,
        outcomes: Vec<TransitionOutcome>,
        duration: Duration,
    ) -> Self {
        Self {
            selected,
            outcomes,
            duration,
        }
    }

    /// The transition that fires, same as
    /// [`WorkflowGraph::next_transition()`](super::graph::WorkflowGraph::next_transition).
    #[must_use]
    pub fn selected(&self) -> Option<&TransitionId> {
        self.selected.as_ref()
    }

    /// All candidates in the order they were considered.
    #[must_use]
    pub fn outcomes(&self) -> &[TransitionOutcome] {
        &self.outcomes
    }

    /// Number of candidates whose gate passed.
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.matched).count()
    }

    /// Wall-clock duration of the selection.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selected {
            Some(id) => write!(f, "selected: {id}")?,
            None => write!(f, "selected: none")?,
        }
        let considered: Vec<&str> = self
            .outcomes
            .iter()
            .map(|o| o.transition.as_str())
            .collect();
        write!(f, ", considered: [{}]", considered.join(", "))?;
        write!(f, ", duration: {:?}", self.duration)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_accessors() {
        let report = SelectionReport::new(
            Some("t2".into()),
            vec![
                TransitionOutcome::new("t1".into(), false, false),
                TransitionOutcome::new("t2".into(), true, false),
                TransitionOutcome::new("t3".into(), true, true),
            ],
            Duration::from_nanos(500),
        );

        assert_eq!(report.selected(), Some(&"t2".into()));
        assert_eq!(report.outcomes().len(), 3);
        assert_eq!(report.matched_count(), 2);
        assert!(report.outcomes()[2].is_default());
        assert_eq!(report.duration(), Duration::from_nanos(500));
    }

    #[test]
    fn report_display_with_selection() {
        let report = SelectionReport::new(
            Some("t2".into()),
            vec![
                TransitionOutcome::new("t1".into(), false, false),
                TransitionOutcome::new("t2".into(), true, false),
            ],
            Duration::from_nanos(500),
        );
        let s = report.to_string();
        assert!(s.contains("selected: t2"));
        assert!(s.contains("considered: [t1, t2]"));
    }

    #[test]
    fn report_display_no_selection() {
        let report = SelectionReport::new(None, vec![], Duration::from_nanos(100));
        let s = report.to_string();
        assert!(s.contains("selected: none"));
        assert!(s.contains("considered: []"));
    }
}
