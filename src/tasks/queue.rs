use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::domain::MessageEvent;

/// Work item for the processor, handled in arrival order.
#[derive(Debug, Clone)]
pub enum Command {
    Learn(MessageEvent),
    Save,
    Reset,
}

#[derive(Debug)]
pub struct CommandQueue<T> {
    items: Mutex<VecDeque<T>>,
}

impl<T> Default for CommandQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CommandQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, value: T) {
        self.items.lock().push_back(value);
    }

    pub fn drain(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_keeps_fifo_order_and_empties() {
        let queue = CommandQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(queue.is_empty());
    }
}
