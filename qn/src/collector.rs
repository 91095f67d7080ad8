//! Stop-the-world mark and sweep over the cell arena.
//!
//! Marks live out of band, one bit per arena slot. Marking drains an explicit
//! worklist so native stack usage does not depend on list length. Sweeping
//! walks the whole arena, hands unreached foreign pointers to the host and
//! pushes every unreached cell onto the free list.

use crate::{Cell, Heap, Host, Obj, Visitable, Visitor};

/// Out of band mark table, one bit per arena slot.
#[derive(Debug, Clone)]
pub struct MarkBits {
    words: Box<[u64]>,
}

impl MarkBits {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn is_marked(&self, index: usize) -> bool {
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Sets the bit, returns `true` if it was not set before.
    #[inline]
    pub fn mark(&mut self, index: usize) -> bool {
        let word = &mut self.words[index / 64];
        let bit = 1 << (index % 64);
        let fresh = *word & bit == 0;
        *word |= bit;
        fresh
    }

    #[inline]
    pub fn clear(&mut self, index: usize) {
        self.words[index / 64] &= !(1 << (index % 64));
    }

    pub fn clear_all(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    pub fn count(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    pub collections: usize,
    pub last_reclaimed: usize,
    pub total_reclaimed: usize,
    pub live: usize,
    pub free: usize,
}

/// Marking state handed to [`Host::mark`].
pub struct Marker<'a> {
    heap: &'a Heap,
    marks: &'a mut MarkBits,
    worklist: &'a mut Vec<Obj>,
}

impl Marker<'_> {
    /// Marks `object` reachable, its references are traced later.
    pub fn mark(&mut self, object: Obj) {
        // nil, or not a slot of this heap
        let Some(index) = object.index().filter(|&index| index < self.heap.capacity()) else {
            return;
        };
        if self.marks.mark(index) {
            self.worklist.push(object);
        }
    }

    pub fn heap(&self) -> &Heap {
        self.heap
    }

    fn drain(&mut self, host: &mut dyn Host) {
        let heap = self.heap;
        while let Some(object) = self.worklist.pop() {
            let Some(&cell) = heap.get(object) else {
                continue;
            };
            match cell {
                Cell::ForeignPointer(_) => host.mark(self, object),
                _ => cell.visit_edges(self),
            }
        }
    }
}

impl Visitor for Marker<'_> {
    #[inline]
    fn visit(&mut self, object: Obj) {
        self.mark(object);
    }
}

#[derive(Debug)]
pub struct Collector {
    marks: MarkBits,
    worklist: Vec<Obj>,
    stats: GcStats,
}

impl Collector {
    pub fn new(capacity: usize) -> Self {
        Self {
            marks: MarkBits::new(capacity),
            worklist: Vec::new(),
            stats: GcStats::default(),
        }
    }

    /// Runs a full cycle and returns the number of reclaimed cells.
    pub fn collect(
        &mut self,
        heap: &mut Heap,
        roots: impl IntoIterator<Item = Obj>,
        host: &mut dyn Host,
    ) -> usize {
        self.mark(heap, roots, host);
        let reclaimed = self.sweep(heap, host);

        self.stats.collections += 1;
        self.stats.last_reclaimed = reclaimed;
        self.stats.total_reclaimed += reclaimed;
        self.stats.live = heap.live_count();
        self.stats.free = heap.free_count();

        log::debug!(
            "gc #{}: reclaimed {} cells, {} live, {} free",
            self.stats.collections,
            reclaimed,
            self.stats.live,
            self.stats.free
        );
        reclaimed
    }

    pub fn stats(&self) -> GcStats {
        self.stats
    }

    fn mark(
        &mut self,
        heap: &Heap,
        roots: impl IntoIterator<Item = Obj>,
        host: &mut dyn Host,
    ) {
        let mut marker = Marker {
            heap,
            marks: &mut self.marks,
            worklist: &mut self.worklist,
        };
        for root in roots {
            marker.mark(root);
        }
        marker.drain(host);
    }

    fn sweep(&mut self, heap: &mut Heap, host: &mut dyn Host) -> usize {
        let mut reclaimed = 0;
        for index in 0..heap.capacity() {
            if self.marks.is_marked(index) {
                self.marks.clear(index);
                continue;
            }

            let object = Obj::from_index(index);
            match heap.cells()[index] {
                Cell::Free { .. } => continue,
                Cell::ForeignPointer(_) => host.gc(heap, object),
                _ => (),
            }
            heap.release(object);
            reclaimed += 1;
        }
        debug_assert_eq!(self.marks.count(), 0, "marks left after sweep");
        reclaimed
    }
}
