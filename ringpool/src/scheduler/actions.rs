//! Scheduled actions keyed by round.

use std::collections::BTreeMap;

use crate::scenario::{Action, ActionKind};

/// Actions not yet applied, grouped by round.
///
/// Rounds are applied once and removed, so the table is empty exactly when
/// nothing is scheduled for the current or any later round.
#[derive(Debug, Clone, Default)]
pub struct RoundActions {
    by_round: BTreeMap<u64, Vec<ActionKind>>,
}

impl RoundActions {
    /// Group actions by round, keeping input order within a round.
    pub fn new<'a>(actions: impl IntoIterator<Item = &'a Action>) -> Self {
        let mut by_round: BTreeMap<u64, Vec<ActionKind>> = BTreeMap::new();
        for action in actions {
            by_round
                .entry(action.round)
                .or_default()
                .push(action.kind.clone());
        }
        Self { by_round }
    }

    /// Remove and return the actions for `round`.
    ///
    /// Rounds that were skipped are drained as well, so a late caller never
    /// leaves actions stranded.
    pub fn take(&mut self, round: u64) -> Vec<ActionKind> {
        let later = self.by_round.split_off(&(round + 1));
        let due = std::mem::replace(&mut self.by_round, later);
        due.into_values().flatten().collect()
    }

    /// Whether any action remains.
    pub fn is_empty(&self) -> bool {
        self.by_round.is_empty()
    }

    /// Earliest round that still has actions.
    pub fn next_round(&self) -> Option<u64> {
        self.by_round.keys().next().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NodeId;

    fn fail(round: u64, node: u64) -> Action {
        Action {
            round,
            kind: ActionKind::ScheduleFailure { node: NodeId(node) },
        }
    }

    #[test]
    fn take_drains_due_rounds_only() {
        let actions = [fail(3, 1), fail(1, 2), fail(3, 3), fail(7, 4)];
        let mut table = RoundActions::new(&actions);

        assert_eq!(table.next_round(), Some(1));
        assert_eq!(table.take(2).len(), 1);
        assert_eq!(
            table.take(3),
            vec![
                ActionKind::ScheduleFailure { node: NodeId(1) },
                ActionKind::ScheduleFailure { node: NodeId(3) },
            ]
        );
        assert!(!table.is_empty());
        assert!(table.take(6).is_empty());
        assert_eq!(table.take(7).len(), 1);
        assert!(table.is_empty());
    }
}
