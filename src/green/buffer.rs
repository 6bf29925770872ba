use std::{
    fmt::{self, Write as _},
    hash::{Hash, Hasher},
};

use countme::Count;
use triomphe::Arc;

use crate::{
    green::SyntaxKind,
    utility_types::{Side, Visit},
    TagTable, TextRange, TextSize,
};

#[derive(Debug)]
struct GreenBufferData {
    /// `(kind, start, end, child_count)` quads in prefix order. `start` and
    /// `end` are relative to the buffer's start within its containing node;
    /// `child_count` is the number of *direct* child records, which
    /// immediately follow their parent.
    slots: Vec<u16>,
    _c: Count<GreenBuffer>,
}

/// Packed store for a dense, leafy region of the tree.
///
/// Keeping such regions in a flat array of numeric records avoids a heap
/// allocation per node; the prefix record order permits linear descent
/// without random access. Buffers never contain reused subtrees.
#[derive(Clone)]
pub struct GreenBuffer {
    data: Arc<GreenBufferData>,
}

impl GreenBuffer {
    #[inline]
    pub(crate) fn new(slots: Vec<u16>) -> GreenBuffer {
        debug_assert!(slots.len() % 4 == 0);
        GreenBuffer { data: Arc::new(GreenBufferData { slots, _c: Count::new() }) }
    }

    #[inline]
    pub(crate) fn slot_len(&self) -> usize {
        self.data.slots.len()
    }

    #[inline]
    pub(crate) fn kind_at(&self, slot: usize) -> SyntaxKind {
        SyntaxKind(self.data.slots[slot])
    }

    #[inline]
    pub(crate) fn start_at(&self, slot: usize) -> TextSize {
        TextSize::new(u32::from(self.data.slots[slot + 1]))
    }

    #[inline]
    pub(crate) fn end_at(&self, slot: usize) -> TextSize {
        TextSize::new(u32::from(self.data.slots[slot + 2]))
    }

    #[inline]
    pub(crate) fn count_at(&self, slot: usize) -> usize {
        usize::from(self.data.slots[slot + 3])
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const u8 {
        Arc::as_ptr(&self.data).cast()
    }

    /// Total slots occupied by the record at `slot` and all its descendants.
    pub(crate) fn footprint(&self, slot: usize) -> usize {
        let mut end = slot + 4;
        for _ in 0..self.count_at(slot) {
            end += self.footprint(end);
        }
        end - slot
    }

    /// Returns the length of the text covered by this buffer, read off the
    /// final record's `end` slot.
    #[inline]
    pub fn text_len(&self) -> TextSize {
        match self.data.slots.len() {
            0 => TextSize::new(0),
            len => TextSize::new(u32::from(self.data.slots[len - 2])),
        }
    }

    /// Visits the records whose span, shifted by `offset`, intersects
    /// `[from, to]`, in prefix order.
    ///
    /// Callback semantics deliberately match tree-level iteration rather
    /// than exposing the raw record stream: only tagged records fire
    /// `enter`/`leave`, while anonymous grouping records are traversed
    /// without a callback, so a buffer iterated directly reports the same
    /// nodes it would as part of a tree. `enter` returning [`Visit::Skip`]
    /// suppresses the record's descendants and its `leave`.
    pub fn iterate<E, L>(
        &self,
        from: TextSize,
        to: TextSize,
        offset: TextSize,
        mut enter: E,
        mut leave: L,
    ) where
        E: FnMut(SyntaxKind, TextRange) -> Visit,
        L: FnMut(SyntaxKind, TextRange),
    {
        self.iterate_records(0, self.slot_len(), offset, from, to, &mut enter, &mut leave);
    }

    pub(crate) fn iterate_records<E, L>(
        &self,
        slot_from: usize,
        slot_to: usize,
        offset: TextSize,
        from: TextSize,
        to: TextSize,
        enter: &mut E,
        leave: &mut L,
    ) where
        E: FnMut(SyntaxKind, TextRange) -> Visit,
        L: FnMut(SyntaxKind, TextRange),
    {
        let mut slot = slot_from;
        while slot < slot_to {
            slot = self.iter_rec(slot, offset, from, to, enter, leave);
        }
    }

    fn iter_rec<E, L>(
        &self,
        slot: usize,
        offset: TextSize,
        from: TextSize,
        to: TextSize,
        enter: &mut E,
        leave: &mut L,
    ) -> usize
    where
        E: FnMut(SyntaxKind, TextRange) -> Visit,
        L: FnMut(SyntaxKind, TextRange),
    {
        let kind = self.kind_at(slot);
        let start = offset + self.start_at(slot);
        let end = offset + self.end_at(slot);
        // Descendant spans nest inside this one, so a miss skips the subtree.
        if start > to || end < from {
            return slot + self.footprint(slot);
        }
        let range = TextRange::new(start, end);
        let tagged = kind.is_tagged();
        if tagged && enter(kind, range) == Visit::Skip {
            return slot + self.footprint(slot);
        }
        let mut next = slot + 4;
        for _ in 0..self.count_at(slot) {
            next = self.iter_rec(next, offset, from, to, enter, leave);
        }
        if tagged {
            leave(kind, range);
        }
        next
    }

    /// Locates the top-level record in the slot range `[from, to)` that a
    /// positional query at `pos` should select. Zero-width records exactly
    /// at `pos` are skipped for every side.
    pub(crate) fn find_index(
        &self,
        pos: TextSize,
        side: Side,
        buffer_start: TextSize,
        from: usize,
        to: usize,
    ) -> Option<usize> {
        let mut last_before = None;
        let mut slot = from;
        while slot < to {
            let start = buffer_start + self.start_at(slot);
            let end = buffer_start + self.end_at(slot);
            let ignore = start == end && start == pos;
            if !ignore {
                // A record at or past the position ends the scan; only an
                // `After` query selects it. `Before` treats a start exactly
                // at the position as already past it.
                if start > pos || (start == pos && side == Side::Before) {
                    if side == Side::After {
                        return Some(slot);
                    }
                    break;
                }
                if end > pos {
                    return Some(slot);
                }
                if side == Side::Before {
                    last_before = Some(slot);
                }
            }
            slot += self.footprint(slot);
        }
        match side {
            Side::Before => last_before,
            Side::At | Side::After => None,
        }
    }

    /// Returns a buffer containing only the records that start before `at`,
    /// with spans clamped to `at` and child counts clamped to the records
    /// that survived the truncation.
    pub fn cut(&self, at: TextSize) -> GreenBuffer {
        if at >= self.text_len() {
            return self.clone();
        }
        // Record starts are nondecreasing in prefix order, so the survivors
        // form a prefix of the slot array.
        let mut cut_slot = 0;
        while cut_slot < self.slot_len() && self.start_at(cut_slot) < at {
            cut_slot += 4;
        }
        let mut slots = self.data.slots[..cut_slot].to_vec();
        let clamp = u32::from(at) as u16;
        for slot in (0..cut_slot).step_by(4) {
            slots[slot + 2] = slots[slot + 2].min(clamp);
        }
        let mut slot = 0;
        while slot < slots.len() {
            slot = clamp_counts(&mut slots, slot);
        }
        GreenBuffer::new(slots)
    }

    /// Renders the subtree rooted at record `index` into `sink`. Names come
    /// from `tags` when provided, else the raw kind id. A record with
    /// children renders as `NAME(c1,c2,…)`, a leaf as `NAME`.
    pub fn child_to_string<T: fmt::Display>(
        &self,
        index: usize,
        sink: &mut String,
        tags: Option<&TagTable<T>>,
    ) {
        let kind = self.kind_at(index);
        match tags.and_then(|tags| tags.get(kind)) {
            Some(name) => {
                let _ = write!(sink, "{}", name);
            }
            None => {
                let _ = write!(sink, "{}", kind.0);
            }
        }
        let count = self.count_at(index);
        if count > 0 {
            sink.push('(');
            let mut slot = index + 4;
            for i in 0..count {
                if i > 0 {
                    sink.push(',');
                }
                self.child_to_string(slot, sink, tags);
                slot += self.footprint(slot);
            }
            sink.push(')');
        }
    }
}

/// Re-derives a record's direct child count after the slot array was
/// truncated. Returns the slot just past the record's subtree.
fn clamp_counts(slots: &mut [u16], slot: usize) -> usize {
    let declared = usize::from(slots[slot + 3]);
    let mut kept = 0u16;
    let mut next = slot + 4;
    for _ in 0..declared {
        if next >= slots.len() {
            break;
        }
        next = clamp_counts(slots, next);
        kept += 1;
    }
    slots[slot + 3] = kept;
    next
}

impl PartialEq for GreenBuffer {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.data.slots == other.data.slots
    }
}

impl Eq for GreenBuffer {}

impl Hash for GreenBuffer {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.slots.hash(state);
    }
}

impl fmt::Debug for GreenBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenBuffer")
            .field("nodes", &(self.slot_len() / 4))
            .field("text_len", &self.text_len())
            .finish()
    }
}

impl fmt::Display for GreenBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let mut slot = 0;
        while slot < self.slot_len() {
            if slot > 0 {
                out.push(',');
            }
            self.child_to_string(slot, &mut out, None::<&TagTable<String>>);
            slot += self.footprint(slot);
        }
        f.write_str(&out)
    }
}
