use std::mem;

use crate::{Cell, Kind, Obj};

/// Arena size used when the create info leaves it at zero.
pub const DEFAULT_ARENA_SIZE: usize = 64 * 1024;

/// Bytes of arena memory one cell occupies.
pub const CELL_SIZE: usize = mem::size_of::<Cell>();

/// Fixed-capacity cell arena with an intrusive free list.
///
/// Free cells are chained through [`Cell::Free`]; allocation pops the head,
/// the sweep pushes reclaimed cells back. The arena never grows and never
/// moves a cell.
#[derive(Debug)]
pub struct Heap {
    cells: Box<[Cell]>,
    free: Obj,
    free_count: usize,
}

impl Heap {
    pub fn new(capacity: usize) -> Self {
        let cells: Box<[Cell]> = (0..capacity)
            .map(|index| {
                let next = if index + 1 < capacity {
                    Obj::from_index(index + 1)
                } else {
                    Obj::NIL
                };
                Cell::Free { next }
            })
            .collect();

        let free = if capacity > 0 {
            Obj::from_index(0)
        } else {
            Obj::NIL
        };

        Self {
            cells,
            free,
            free_count: capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.capacity() - self.free_count
    }

    /// Walks the free list, for consistency checks.
    pub fn free_list_len(&self) -> usize {
        let mut len = 0;
        let mut current = self.free;
        while let Some(Cell::Free { next }) = self.get(current) {
            len += 1;
            current = *next;
        }
        len
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// The cell behind `object`, `None` for nil.
    #[inline]
    pub fn get(&self, object: Obj) -> Option<&Cell> {
        self.cells.get(object.index()?)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, object: Obj) -> Option<&mut Cell> {
        self.cells.get_mut(object.index()?)
    }

    #[inline]
    pub fn kind(&self, object: Obj) -> Kind {
        self.get(object).map_or(Kind::Nil, Cell::kind)
    }

    /// `(first, rest)` of a pair.
    #[inline]
    pub fn pair(&self, object: Obj) -> Option<(Obj, Obj)> {
        match self.get(object)? {
            Cell::Pair { first, rest } => Some((*first, *rest)),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn write(&mut self, object: Obj, cell: Cell) {
        if let Some(slot) = self.get_mut(object) {
            *slot = cell;
        }
    }

    /// Unlinks the head of the free list.
    pub(crate) fn take_free(&mut self) -> Option<Obj> {
        let object = self.free;
        let index = object.index()?;
        match self.cells[index] {
            Cell::Free { next } => {
                self.free = next;
                self.free_count -= 1;
                Some(object)
            }
            other => panic!("free list corrupted: head is a {}", other.kind()),
        }
    }

    /// Turns `object` into a free cell and pushes it onto the free list.
    pub(crate) fn release(&mut self, object: Obj) {
        let Some(index) = object.index() else {
            return;
        };
        self.cells[index] = Cell::Free { next: self.free };
        self.free = object;
        self.free_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_heap_is_all_free() {
        let heap = Heap::new(16);
        assert_eq!(heap.capacity(), 16);
        assert_eq!(heap.free_count(), 16);
        assert_eq!(heap.free_list_len(), 16);
        assert_eq!(heap.live_count(), 0);
        assert!(heap.cells().iter().all(|cell| cell.kind() == Kind::Free));
    }

    #[test]
    fn empty_heap_has_no_free_cells() {
        let mut heap = Heap::new(0);
        assert_eq!(heap.take_free(), None);
        assert_eq!(heap.free_list_len(), 0);
    }

    #[test]
    fn take_free_exhausts_then_stops() {
        let mut heap = Heap::new(3);
        let taken: Vec<_> = std::iter::from_fn(|| heap.take_free()).collect();
        assert_eq!(taken.len(), 3);
        assert_eq!(heap.free_count(), 0);
        assert_eq!(heap.take_free(), None);
    }

    #[test]
    fn release_pushes_onto_free_list() {
        let mut heap = Heap::new(2);
        let a = heap.take_free().unwrap();
        let b = heap.take_free().unwrap();
        heap.write(a, Cell::Number(1.0));
        heap.write(b, Cell::Number(2.0));

        heap.release(a);
        assert_eq!(heap.kind(a), Kind::Free);
        assert_eq!(heap.kind(b), Kind::Number);
        assert_eq!(heap.free_count(), 1);
        assert_eq!(heap.take_free(), Some(a));
    }

    #[test]
    fn nil_reads_as_nil_kind() {
        let heap = Heap::new(1);
        assert_eq!(heap.kind(Obj::NIL), Kind::Nil);
        assert!(heap.get(Obj::NIL).is_none());
        assert_eq!(heap.pair(Obj::NIL), None);
    }

    #[test]
    fn pair_reads_both_slots() {
        let mut heap = Heap::new(2);
        let a = heap.take_free().unwrap();
        let b = heap.take_free().unwrap();
        heap.write(b, Cell::Number(3.0));
        heap.write(
            a,
            Cell::Pair {
                first: b,
                rest: Obj::NIL,
            },
        );
        assert_eq!(heap.pair(a), Some((b, Obj::NIL)));
        assert_eq!(heap.pair(b), None);
    }

    #[test]
    #[should_panic(expected = "free list corrupted")]
    fn corrupted_free_list_panics() {
        let mut heap = Heap::new(1);
        let head = heap.free;
        heap.write(head, Cell::Number(0.0));
        heap.take_free();
    }
}
