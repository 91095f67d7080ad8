use crate::{Error, Obj, Result};

pub const DEFAULT_ROOT_STACK_SIZE: usize = 256;

/// Depth of a [`RootStack`] at the time of [`RootStack::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RootMark(usize);

/// Transient GC roots.
///
/// Fixed capacity, reserved up front and never grown: the stack has to keep
/// working while the arena is exhausted.
#[derive(Debug, Clone)]
pub struct RootStack {
    entries: Vec<Obj>,
    capacity: usize,
}

impl RootStack {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Protects `object` until the stack is restored below this entry.
    pub fn push(&mut self, object: Obj) -> Result<()> {
        if self.entries.len() >= self.capacity {
            return Err(Error::StackOverflow);
        }
        self.entries.push(object);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Obj> {
        self.entries.pop()
    }

    #[must_use]
    pub fn save(&self) -> RootMark {
        RootMark(self.entries.len())
    }

    /// Releases everything pushed since `mark` was taken.
    /// A mark above the current depth is a no-op.
    pub fn restore(&mut self, mark: RootMark) {
        self.entries.truncate(mark.0);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn entries(&self) -> &[Obj] {
        &self.entries
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl RootMark {
    #[must_use]
    pub fn depth(self) -> usize {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(index: usize) -> Obj {
        Obj::from_index(index)
    }

    #[test]
    fn new_stack_is_empty() {
        let roots = RootStack::new(8);
        assert_eq!(roots.depth(), 0);
        assert_eq!(roots.capacity(), 8);
        assert_eq!(roots.save().depth(), 0);
    }

    #[test]
    fn save_and_restore_truncate_to_mark() {
        let mut roots = RootStack::new(8);
        roots.push(obj(0)).unwrap();
        let mark = roots.save();
        roots.push(obj(1)).unwrap();
        roots.push(obj(2)).unwrap();
        assert_eq!(roots.depth(), 3);

        roots.restore(mark);
        assert_eq!(roots.entries(), &[obj(0)]);
    }

    #[test]
    fn push_beyond_capacity_overflows() {
        let mut roots = RootStack::new(2);
        roots.push(obj(0)).unwrap();
        roots.push(obj(1)).unwrap();
        assert_eq!(roots.push(obj(2)), Err(Error::StackOverflow));
        assert_eq!(roots.depth(), 2);
    }

    #[test]
    fn capacity_is_reserved_up_front() {
        let mut roots = RootStack::new(16);
        let reserved = roots.entries.capacity();
        for index in 0..16 {
            roots.push(obj(index)).unwrap();
        }
        assert_eq!(roots.entries.capacity(), reserved);
    }

    #[test]
    fn restore_to_later_mark_is_noop() {
        let mut roots = RootStack::new(4);
        roots.push(obj(0)).unwrap();
        roots.push(obj(1)).unwrap();
        let mark = roots.save();
        roots.restore(RootMark(0));
        roots.restore(mark);
        assert_eq!(roots.depth(), 0);
    }

    #[test]
    fn pop_and_clear() {
        let mut roots = RootStack::new(4);
        roots.push(obj(0)).unwrap();
        roots.push(obj(1)).unwrap();
        assert_eq!(roots.pop(), Some(obj(1)));
        roots.clear();
        assert_eq!(roots.pop(), None);
    }
}
