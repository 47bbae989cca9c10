/// Lifecycle notifications of an in-place edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditEvent<Id> {
    /// Editing began on the node.
    Start(Id),
    /// The edit was accepted.
    Commit(Id),
    /// The edit was abandoned, explicitly or because the node left the tree.
    Cancel(Id),
}

impl<Id: Copy> EditEvent<Id> {
    /// Node the event refers to.
    pub const fn node(&self) -> Id {
        match *self {
            Self::Start(id) | Self::Commit(id) | Self::Cancel(id) => id,
        }
    }
}

/// At most one node being edited at a time.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EditSession<Id> {
    editing: Option<Id>,
}

impl<Id> Default for EditSession<Id> {
    fn default() -> Self {
        Self { editing: None }
    }
}

impl<Id: Copy + PartialEq> EditSession<Id> {
    pub(crate) const fn editing(&self) -> Option<Id> {
        self.editing
    }

    /// Starts editing `id`; returns the events to publish, a cancel for any
    /// previous session first.
    pub(crate) fn start(&mut self, id: Id) -> Vec<EditEvent<Id>> {
        if self.editing == Some(id) {
            return Vec::new();
        }
        let mut events = Vec::with_capacity(2);
        if let Some(previous) = self.editing.replace(id) {
            events.push(EditEvent::Cancel(previous));
        }
        events.push(EditEvent::Start(id));
        events
    }

    pub(crate) fn commit(&mut self) -> Option<EditEvent<Id>> {
        self.editing.take().map(EditEvent::Commit)
    }

    pub(crate) fn cancel(&mut self) -> Option<EditEvent<Id>> {
        self.editing.take().map(EditEvent::Cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_a_second_edit_cancels_the_first() {
        let mut session = EditSession::default();

        assert_eq!(session.start(1), vec![EditEvent::Start(1)]);
        assert_eq!(
            session.start(2),
            vec![EditEvent::Cancel(1), EditEvent::Start(2)]
        );
        assert!(session.start(2).is_empty());
        assert_eq!(session.editing(), Some(2));
    }

    #[test]
    fn commit_and_cancel_end_the_session_once() {
        let mut session = EditSession::default();
        session.start('a');

        assert_eq!(session.commit(), Some(EditEvent::Commit('a')));
        assert_eq!(session.commit(), None);
        assert_eq!(session.cancel(), None);
    }
}
