//! FIFO of pending messages, owned by the transport layer.

use std::collections::VecDeque;

use crate::message::Message;

/// Ordered queue of messages waiting to be sent or processed.
#[derive(Debug, Default)]
pub struct MessageQueue<'a> {
    items: VecDeque<Message<'a>>,
}

impl<'a> MessageQueue<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the back.
    pub fn push(&mut self, msg: Message<'a>) {
        tracing::debug!(%msg, queued = self.items.len() + 1, "queued message");
        self.items.push_back(msg);
    }

    /// Remove the front message.
    pub fn pop(&mut self) -> Option<Message<'a>> {
        let msg = self.items.pop_front()?;
        tracing::debug!(%msg, queued = self.items.len(), "dequeued message");
        Some(msg)
    }

    pub fn peek(&self) -> Option<&Message<'a>> {
        self.items.front()
    }

    pub fn peek_mut(&mut self) -> Option<&mut Message<'a>> {
        self.items.front_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message<'a>> {
        self.items.iter()
    }

    /// Remove every message whose outcome is terminal, keeping the order of
    /// the rest. Removed messages are returned in queue order.
    pub fn drain_finished(&mut self) -> Vec<Message<'a>> {
        let mut finished = Vec::new();
        let mut pending = VecDeque::with_capacity(self.items.len());
        for msg in self.items.drain(..) {
            if msg.result().is_terminal() {
                finished.push(msg);
            } else {
                pending.push_back(msg);
            }
        }
        self.items = pending;
        if !finished.is_empty() {
            tracing::debug!(
                finished = finished.len(),
                queued = self.items.len(),
                "drained finished messages"
            );
        }
        finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;

    fn msg(code: u8) -> Message<'static> {
        let mut msg = Message::allocate(4).unwrap();
        msg.code = code;
        msg
    }

    #[test]
    fn fifo_order() {
        let mut queue = MessageQueue::new();
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());

        for code in 1..=3 {
            queue.push(msg(code));
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.peek().map(|m| m.code), Some(1));

        let codes: Vec<u8> = std::iter::from_fn(|| queue.pop()).map(|m| m.code).collect();
        assert_eq!(codes, [1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_finished_keeps_working_messages() {
        let mut queue = MessageQueue::new();
        for code in 0..6 {
            queue.push(msg(code));
        }
        for (i, m) in queue.items.iter_mut().enumerate() {
            match i {
                1 => m.set_result(Outcome::Success).unwrap(),
                3 => m.set_result(Outcome::Fatal).unwrap(),
                4 => m.set_result(Outcome::Missing).unwrap(),
                _ => {}
            }
        }

        let done: Vec<u8> = queue.drain_finished().iter().map(|m| m.code).collect();
        assert_eq!(done, [1, 3, 4]);
        let left: Vec<u8> = queue.iter().map(|m| m.code).collect();
        assert_eq!(left, [0, 2, 5]);

        assert!(queue.drain_finished().is_empty());
    }

    #[test]
    fn peek_mut_updates_front() {
        let mut queue = MessageQueue::new();
        queue.push(msg(7));
        if let Some(front) = queue.peek_mut() {
            front.set_result(Outcome::Error).unwrap();
        }
        assert_eq!(queue.drain_finished().len(), 1);
        assert!(queue.is_empty());
    }
}
