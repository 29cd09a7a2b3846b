//! Bounded undo/redo history of committed spatial edits.
//!
//! The stack stores only station ids and value snapshots, never references
//! to live objects, so a long history is cheap to keep around. Applying a
//! replayed value back onto the station is the subscriber's job.

use std::collections::VecDeque;

use glam::Vec3;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Move,
}

/// An immutable record of one reversible edit
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub target: String,
    pub before: Vec3,
    pub after: Vec3,
}

impl Command {
    pub fn moved(target: impl Into<String>, before: Vec3, after: Vec3) -> Self {
        Self {
            kind: CommandKind::Move,
            target: target.into(),
            before,
            after,
        }
    }

    /// The value to apply when replaying this command.
    pub fn value(&self, is_undo: bool) -> Vec3 {
        if is_undo { self.before } else { self.after }
    }
}

pub type CommandListener = Box<dyn FnMut(&Command, bool)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct CommandStack {
    entries: VecDeque<Command>,
    /// Number of applied entries. The history pointer is `cursor - 1`.
    cursor: usize,
    capacity: usize,
    listeners: Vec<(ListenerId, CommandListener)>,
    next_listener: u64,
}

impl CommandStack {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Record a new edit. Anything after the pointer (the redo history) is
    /// discarded, and the oldest entry is evicted when over capacity.
    pub fn push(&mut self, command: Command) {
        self.entries.truncate(self.cursor);
        self.entries.push_back(command);
        self.cursor = self.entries.len();

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.cursor -= 1;
        }
    }

    /// Step back one edit. Listeners are told with `is_undo = true` so they
    /// can apply the `before` value.
    pub fn undo(&mut self) -> Option<Command> {
        if self.cursor == 0 {
            debug!("undo: at start of history");
            return None;
        }
        self.cursor -= 1;
        let command = self.entries[self.cursor].clone();
        self.notify(&command, true);
        Some(command)
    }

    /// Step forward one edit, applying its `after` value.
    pub fn redo(&mut self) -> Option<Command> {
        if self.cursor == self.entries.len() {
            debug!("redo: nothing to redo");
            return None;
        }
        let command = self.entries[self.cursor].clone();
        self.cursor += 1;
        self.notify(&command, false);
        Some(command)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Index of the last applied entry, None when before the first.
    pub fn pointer(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn subscribe(&mut self, listener: CommandListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len()
    }

    fn notify(&mut self, command: &Command, is_undo: bool) {
        for (_, listener) in &mut self.listeners {
            listener(command, is_undo);
        }
    }
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new(50)
    }
}

impl std::fmt::Debug for CommandStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStack")
            .field("entries", &self.entries)
            .field("cursor", &self.cursor)
            .field("capacity", &self.capacity)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn mv(n: f32) -> Command {
        Command::moved("a", Vec3::new(n - 1.0, 0.0, 0.0), Vec3::new(n, 0.0, 0.0))
    }

    #[test]
    fn push_after_undo_discards_redo_history() {
        let mut stack = CommandStack::new(10);
        stack.push(mv(1.0));
        stack.push(mv(2.0));
        stack.push(mv(3.0));

        stack.undo();
        stack.undo();
        assert_eq!(stack.pointer(), Some(0));

        stack.push(mv(9.0));
        let kept: Vec<_> = stack.iter().cloned().collect();
        assert_eq!(kept, vec![mv(1.0), mv(9.0)]);
        assert!(!stack.can_redo());
        assert_eq!(stack.redo(), None);
    }

    #[test]
    fn undo_then_redo_round_trips_values() {
        let mut stack = CommandStack::new(10);
        stack.push(mv(1.0));

        let undone = stack.undo().expect("undo");
        assert_eq!(undone.value(true), Vec3::new(0.0, 0.0, 0.0));
        let redone = stack.redo().expect("redo");
        assert_eq!(redone.value(false), Vec3::new(1.0, 0.0, 0.0));
        let undone = stack.undo().expect("undo");
        assert_eq!(undone.value(true), Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn undo_past_start_is_noop() {
        let mut stack = CommandStack::new(10);
        assert_eq!(stack.undo(), None);
        stack.push(mv(1.0));
        assert!(stack.undo().is_some());
        assert_eq!(stack.undo(), None);
        assert_eq!(stack.pointer(), None);
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut stack = CommandStack::new(3);
        for n in 1..=5 {
            stack.push(mv(n as f32));
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.iter().next(), Some(&mv(3.0)));
        assert_eq!(stack.pointer(), Some(2));

        // eviction while part of the history is undone
        let mut stack = CommandStack::new(3);
        stack.push(mv(1.0));
        stack.push(mv(2.0));
        stack.push(mv(3.0));
        stack.undo();
        stack.push(mv(4.0));
        stack.push(mv(5.0));
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pointer(), Some(2));
        assert_eq!(stack.iter().next(), Some(&mv(2.0)));
    }

    #[test]
    fn listeners_see_direction() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut stack = CommandStack::new(5);
        let sink = seen.clone();
        let id = stack.subscribe(Box::new(move |cmd: &Command, is_undo: bool| {
            sink.borrow_mut().push((cmd.value(is_undo), is_undo));
        }));

        stack.push(mv(1.0));
        stack.undo();
        stack.redo();
        assert_eq!(
            *seen.borrow(),
            vec![(Vec3::ZERO, true), (Vec3::new(1.0, 0.0, 0.0), false)]
        );

        assert!(stack.unsubscribe(id));
        stack.undo();
        assert_eq!(seen.borrow().len(), 2);
    }
}
