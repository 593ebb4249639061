//! Session-scoped undo history.

/// Last-in-first-out record of actions taken this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStack<T> {
    items: Vec<T>,
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> UndoStack<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<T> From<Vec<T>> for UndoStack<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}
