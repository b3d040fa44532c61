use glam::Vec2;

use crate::net::{Action, ActionKind};

/// Locally originated actions waiting for the next flush, in origin order.
#[derive(Debug, Default)]
pub struct OutgoingQueue {
    actions: Vec<Action>,
}

impl OutgoingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_action(&mut self, kind: ActionKind, position: Vec2) {
        self.push(Action::new(kind, position));
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Take everything queued so far; the queue is empty afterwards.
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    pub fn pending(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_takes_all_in_order() {
        let mut queue = OutgoingQueue::new();
        queue.add_action(ActionKind::CreateUnit, Vec2::new(1.0, 1.0));
        queue.add_action(ActionKind::ToggleAnimAll, Vec2::ZERO);
        queue.add_action(ActionKind::DestroyUnit, Vec2::new(1.0, 1.0));

        let drained = queue.drain();

        assert_eq!(
            drained.iter().map(|a| a.kind).collect::<Vec<_>>(),
            vec![
                ActionKind::CreateUnit,
                ActionKind::ToggleAnimAll,
                ActionKind::DestroyUnit
            ]
        );
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }
}
