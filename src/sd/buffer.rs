use crate::sd::message::SdMessage;
use std::collections::VecDeque;
use std::collections::vec_deque;

/// Outgoing SD messages in transmission order.
///
/// Only appended to by the server and only drained from the front; entries are
/// never reordered. Messages leave by value, so nothing is shared with the sender.
#[derive(Debug, Default)]
pub struct MessageBuffer {
    queue: VecDeque<SdMessage>,
}

impl MessageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: SdMessage) {
        self.queue.push_back(message);
    }

    pub fn pop(&mut self) -> Option<SdMessage> {
        self.queue.pop_front()
    }

    /// Put a message back at the head, e.g. after a failed send.
    pub fn push_front(&mut self, message: SdMessage) {
        self.queue.push_front(message);
    }

    pub fn front(&self) -> Option<&SdMessage> {
        self.queue.front()
    }

    pub fn drain(&mut self) -> vec_deque::Drain<'_, SdMessage> {
        self.queue.drain(..)
    }

    pub fn iter(&self) -> vec_deque::Iter<'_, SdMessage> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
