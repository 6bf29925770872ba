use crate::{
    green::{buffer::GreenBuffer, node::GreenChild, GreenNode, SyntaxKind},
    TextSize,
};

/// Default upper bound on the span covered by a single packed buffer.
pub const DEFAULT_BUFFER_LENGTH: u32 = 1024;

/// Bound on the fanout produced by balancing wide child sequences.
pub(crate) const BRANCH_FACTOR: usize = 8;

/// Sentinel in a cursor record's `size` slot marking a reuse slot: the
/// record's `id` indexes an externally supplied table of previously built
/// trees instead of naming a kind.
pub const REUSED_VALUE: i32 = -1;

/// Reverse reader over the postfix `(id, start, end, size)` stream a parser
/// emits. Each [`next`](BufferCursor::next) steps past one record toward the
/// stream's start; `pos() == 0` is the termination signal, and the stream is
/// trusted to be well formed beyond that.
pub trait BufferCursor {
    /// Kind id of the record, or a reuse-table index when
    /// `size() == REUSED_VALUE`.
    fn id(&self) -> u16;
    /// Absolute start offset of the node.
    fn start(&self) -> TextSize;
    /// Absolute end offset of the node.
    fn end(&self) -> TextSize;
    /// Total slot footprint of the node including all descendants, i.e.
    /// `4 * (1 + descendants)`, or [`REUSED_VALUE`].
    fn size(&self) -> i32;
    /// Current slot position; the record occupies the four slots below it.
    fn pos(&self) -> usize;
    /// Steps backwards past the current record.
    fn next(&mut self);
    /// An independent cursor at the same position, for look-ahead.
    fn fork(&self) -> Self
    where
        Self: Sized;
}

/// [`BufferCursor`] over a flat array of postfix quads.
#[derive(Debug, Clone)]
pub struct FlatBufferCursor<'a> {
    buffer: &'a [i32],
    index: usize,
}

impl<'a> FlatBufferCursor<'a> {
    pub fn new(buffer: &'a [i32]) -> FlatBufferCursor<'a> {
        FlatBufferCursor { buffer, index: buffer.len() }
    }
}

impl<'a> BufferCursor for FlatBufferCursor<'a> {
    #[inline]
    fn id(&self) -> u16 {
        self.buffer[self.index - 4] as u16
    }

    #[inline]
    fn start(&self) -> TextSize {
        TextSize::new(self.buffer[self.index - 3] as u32)
    }

    #[inline]
    fn end(&self) -> TextSize {
        TextSize::new(self.buffer[self.index - 2] as u32)
    }

    #[inline]
    fn size(&self) -> i32 {
        self.buffer[self.index - 1]
    }

    #[inline]
    fn pos(&self) -> usize {
        self.index
    }

    #[inline]
    fn next(&mut self) {
        self.index -= 4;
    }

    #[inline]
    fn fork(&self) -> Self {
        FlatBufferCursor { buffer: self.buffer, index: self.index }
    }
}

/// Constructs a [`GreenNode`] from a parser's postfix record stream,
/// deciding which regions to pack into [`GreenBuffer`]s and keeping wide
/// anonymous child sequences balanced.
#[derive(Debug, Clone)]
pub struct TreeBuilder<'a> {
    top: SyntaxKind,
    max_buffer_length: u32,
    reused: &'a [GreenNode],
    distribute: bool,
}

impl Default for TreeBuilder<'static> {
    fn default() -> Self {
        TreeBuilder::new()
    }
}

impl TreeBuilder<'static> {
    pub fn new() -> TreeBuilder<'static> {
        TreeBuilder {
            top: SyntaxKind::NONE,
            max_buffer_length: DEFAULT_BUFFER_LENGTH,
            reused: &[],
            distribute: false,
        }
    }
}

impl<'a> TreeBuilder<'a> {
    /// Kind given to the built root. Defaults to [`SyntaxKind::NONE`].
    pub fn top(mut self, top: SyntaxKind) -> TreeBuilder<'a> {
        self.top = top;
        self
    }

    /// Upper bound on the span covered by a single packed buffer. Buffer
    /// records store their offsets in 16 bits, so the bound may not exceed
    /// `u16::MAX`.
    ///
    /// # Panics
    ///
    /// Panics when `max_buffer_length` does not fit the packed record range.
    pub fn max_buffer_length(mut self, max_buffer_length: u32) -> TreeBuilder<'a> {
        assert!(
            max_buffer_length <= u32::from(u16::MAX),
            "max_buffer_length {} exceeds the packed record range",
            max_buffer_length,
        );
        self.max_buffer_length = max_buffer_length;
        self
    }

    /// Table of previously built trees that reuse slots in the stream refer
    /// to by index.
    pub fn reused<'b>(self, reused: &'b [GreenNode]) -> TreeBuilder<'b> {
        TreeBuilder {
            top: self.top,
            max_buffer_length: self.max_buffer_length,
            reused,
            distribute: self.distribute,
        }
    }

    /// Balance the root itself when it ends up with more than the branch
    /// factor's worth of children.
    pub fn distribute(mut self, distribute: bool) -> TreeBuilder<'a> {
        self.distribute = distribute;
        self
    }

    /// Consumes `cursor` down to `pos() == 0` and returns the built tree.
    /// An empty stream yields an empty tree of the configured top kind.
    pub fn build<C: BufferCursor>(&self, cursor: C) -> GreenNode {
        let build = Build {
            cursor,
            reused: self.reused,
            max_buffer_length: self.max_buffer_length,
        };
        build.build_root(self.top, self.distribute)
    }
}

struct FoundBuffer {
    size: usize,
    start: TextSize,
}

struct Build<'a, C> {
    cursor: C,
    reused: &'a [GreenNode],
    max_buffer_length: u32,
}

impl<C: BufferCursor> Build<'_, C> {
    fn build_root(mut self, top: SyntaxKind, distribute: bool) -> GreenNode {
        let mut children = Vec::new();
        while self.cursor.pos() > 0 {
            self.take_node(TextSize::new(0), 0, &mut children);
        }
        children.reverse();
        if distribute && children.len() > BRANCH_FACTOR {
            return balance_range(top, &children, 0, children.len(), self.max_buffer_length);
        }
        let text_len = children
            .last()
            .map(|child| child.rel_offset() + child.text_len())
            .unwrap_or_default();
        GreenNode::from_child_vec(top, children, text_len)
    }

    /// Emits exactly one child of the node starting at `parent_start` into
    /// `children`, consuming the corresponding records. `min_pos` is the
    /// slot position where the parent's children end.
    fn take_node(&mut self, parent_start: TextSize, min_pos: usize, children: &mut Vec<GreenChild>) {
        let id = self.cursor.id();
        let start = self.cursor.start();
        let end = self.cursor.end();
        let size = self.cursor.size();

        if size == REUSED_VALUE {
            children.push(GreenChild::Node {
                rel_offset: start - parent_start,
                node: self.reused[usize::from(id)].clone(),
            });
            self.cursor.next();
            return;
        }

        // Small enough for a buffer, and a run of preceding siblings with no
        // reused nodes inside?
        if u32::from(end - start) <= self.max_buffer_length {
            if let Some(found) = self.find_buffer_size(self.cursor.pos() - min_pos) {
                let mut slots = vec![0u16; found.size];
                let end_pos = self.cursor.pos() - found.size;
                let mut index = found.size;
                while self.cursor.pos() > end_pos {
                    index = self.copy_to_buffer(found.start, &mut slots, index);
                }
                debug_assert_eq!(index, 0);
                children.push(GreenChild::Buffer {
                    rel_offset: found.start - parent_start,
                    buffer: GreenBuffer::new(slots),
                });
                return;
            }
        }

        // Make it a pointer node.
        let end_pos = self.cursor.pos() - size as usize;
        self.cursor.next();
        let mut local = Vec::new();
        while self.cursor.pos() > end_pos {
            self.take_node(start, end_pos, &mut local);
        }
        // The cursor walks backwards, so the children came out reversed.
        local.reverse();

        let kind = SyntaxKind(id);
        if kind.is_tagged() || local.is_empty() {
            let node = GreenNode::from_child_vec(kind, local, end - start);
            children.push(GreenChild::Node { rel_offset: start - parent_start, node });
        } else {
            // Anonymous collectors get balanced so wide repetitions stay
            // shallow; the balanced tree starts at its first child.
            let first = local[0].rel_offset();
            let node = balance_range(kind, &local, 0, local.len(), self.max_buffer_length);
            children.push(GreenChild::Node { rel_offset: start - parent_start + first, node });
        }
    }

    /// Forked backwards scan for a contiguous run of whole sibling subtrees
    /// that fits one buffer: combined span within `max_buffer_length`, slot
    /// count within `max_size`, no reuse sentinel anywhere in the run.
    /// Returns the run's slot count and start offset, or `None` when the
    /// run is not worth packing (4 slots or fewer).
    fn find_buffer_size(&self, max_size: usize) -> Option<FoundBuffer> {
        let mut fork = self.cursor.fork();
        let mut size = 0usize;
        let mut start = TextSize::new(0);
        let min_start = fork
            .end()
            .checked_sub(TextSize::new(self.max_buffer_length))
            .unwrap_or_default();
        let min_pos = fork.pos().saturating_sub(max_size);
        'scan: while fork.pos() > min_pos {
            let node_size = fork.size();
            if node_size < 0 {
                break;
            }
            let node_size = node_size as usize;
            let start_pos = fork.pos() - node_size;
            if start_pos < min_pos || fork.start() < min_start {
                break;
            }
            let node_start = fork.start();
            fork.next();
            while fork.pos() > start_pos {
                if fork.size() < 0 {
                    break 'scan;
                }
                fork.next();
            }
            start = node_start;
            size += node_size;
        }
        if size > 4 {
            Some(FoundBuffer { size, start })
        } else {
            None
        }
    }

    /// Copies one postfix subtree into `slots`, filling from `index`
    /// downwards: descendants land above their parent, which restores
    /// prefix order on read. Returns the new fill position.
    fn copy_to_buffer(&mut self, buffer_start: TextSize, slots: &mut [u16], mut index: usize) -> usize {
        let id = self.cursor.id();
        let start = self.cursor.start();
        let end = self.cursor.end();
        let size = self.cursor.size() as usize;
        self.cursor.next();
        let mut count = 0u16;
        if size > 4 {
            let end_pos = self.cursor.pos() - (size - 4);
            while self.cursor.pos() > end_pos {
                index = self.copy_to_buffer(buffer_start, slots, index);
                count += 1;
            }
        }
        index -= 4;
        slots[index] = id;
        slots[index + 1] = u32::from(start - buffer_start) as u16;
        slots[index + 2] = u32::from(end - buffer_start) as u16;
        slots[index + 3] = count;
        index
    }
}

fn max_child_span(length: u32, max_buffer_length: u32) -> u32 {
    // The 3/2 slack keeps the group count within the branch factor when
    // child spans don't divide the range evenly.
    max_buffer_length.max((length * 3).div_ceil(BRANCH_FACTOR as u32 * 2))
}

/// Restructures `children[from..to]` into a tree of `kind` with bounded
/// fanout. Ranges that fit one buffer's span flatten instead, inlining
/// nested subtrees of the same kind into a single level. The returned tree
/// spans from the first child's offset to the last child's end.
pub(crate) fn balance_range(
    kind: SyntaxKind,
    children: &[GreenChild],
    from: usize,
    to: usize,
    max_buffer_length: u32,
) -> GreenNode {
    let start = children[from].rel_offset();
    let last = &children[to - 1];
    let length = last.rel_offset() + last.text_len() - start;
    let mut local: Vec<GreenChild> = Vec::new();

    if u32::from(length) <= max_buffer_length {
        for child in &children[from..to] {
            inline_or_push(kind, child, child.rel_offset() - start, &mut local);
        }
    } else {
        let max_child = max_child_span(u32::from(length), max_buffer_length);
        let mut i = from;
        while i < to {
            let group_from = i;
            let group_start = children[i].rel_offset();
            i += 1;
            while i < to {
                let next_end = children[i].rel_offset() + children[i].text_len();
                if u32::from(next_end - group_start) > max_child {
                    break;
                }
                i += 1;
            }
            if i == group_from + 1 {
                let only = &children[group_from];
                let rel = group_start - start;
                match only {
                    GreenChild::Node { node, .. } if node.kind() == kind => {
                        if u32::from(node.text_len()) > max_child * 2 {
                            // Grossly oversized: hoist its children so they
                            // can be regrouped at this level.
                            for grand in node.green_children() {
                                local.push(grand.with_rel_offset(rel + grand.rel_offset()));
                            }
                        } else {
                            local.push(only.with_rel_offset(rel));
                        }
                    }
                    _ => {
                        // Wrap other children in a single-child node of this
                        // kind so a later balance can collapse the level.
                        let wrapped = GreenNode::from_child_vec(
                            kind,
                            vec![only.with_rel_offset(TextSize::new(0))],
                            only.text_len(),
                        );
                        local.push(GreenChild::Node { rel_offset: rel, node: wrapped });
                    }
                }
            } else {
                let node = balance_range(kind, children, group_from, i, max_buffer_length);
                local.push(GreenChild::Node { rel_offset: group_start - start, node });
            }
        }
    }
    GreenNode::from_child_vec(kind, local, length)
}

fn inline_or_push(kind: SyntaxKind, child: &GreenChild, rel: TextSize, out: &mut Vec<GreenChild>) {
    if let GreenChild::Node { node, .. } = child {
        if node.kind() == kind {
            for grand in node.green_children() {
                inline_or_push(kind, grand, rel + grand.rel_offset(), out);
            }
            return;
        }
    }
    out.push(child.with_rel_offset(rel));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_quads(ranges: &[(i32, i32, i32)]) -> Vec<i32> {
        let mut quads = Vec::new();
        for &(id, start, end) in ranges {
            quads.extend_from_slice(&[id, start, end, 4]);
        }
        quads
    }

    fn buffers_of(tree: &GreenNode) -> Vec<&GreenBuffer> {
        tree.green_children()
            .iter()
            .filter_map(|child| match child {
                GreenChild::Buffer { buffer, .. } => Some(buffer),
                GreenChild::Node { .. } => None,
            })
            .collect()
    }

    #[test]
    fn flat_cursor_walks_backwards() {
        let quads = leaf_quads(&[(1, 0, 5), (3, 5, 10)]);
        let mut cursor = FlatBufferCursor::new(&quads);
        assert_eq!(cursor.pos(), 8);
        assert_eq!(cursor.id(), 3);
        assert_eq!(cursor.start(), TextSize::new(5));
        assert_eq!(cursor.size(), 4);
        let fork = cursor.fork();
        cursor.next();
        assert_eq!(cursor.id(), 1);
        assert_eq!(fork.id(), 3);
        cursor.next();
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn packs_sibling_leaves_into_one_buffer() {
        let ranges: Vec<_> = (0..10).map(|i| (2 * i + 1, i * 5, i * 5 + 5)).collect();
        let quads = leaf_quads(&ranges);
        let tree = TreeBuilder::new().build(FlatBufferCursor::new(&quads));

        assert_eq!(tree.kind(), SyntaxKind::NONE);
        assert_eq!(tree.text_len(), TextSize::new(50));
        assert_eq!(tree.green_children().len(), 1);
        let buffers = buffers_of(&tree);
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].slot_len(), 40);
        assert_eq!(buffers[0].text_len(), TextSize::new(50));
        // Records come out in document order despite the backwards copy.
        assert_eq!(buffers[0].kind_at(0), SyntaxKind(1));
        assert_eq!(buffers[0].kind_at(36), SyntaxKind(19));
    }

    #[test]
    fn reused_nodes_break_up_buffers() {
        let reused_tree =
            GreenNode::new(SyntaxKind(7), [], TextSize::new(5));
        let reused = [reused_tree.clone()];

        let mut quads = Vec::new();
        for i in 0..10 {
            let (start, end) = (i * 5, i * 5 + 5);
            if i == 4 {
                quads.extend_from_slice(&[0, start, end, REUSED_VALUE]);
            } else {
                quads.extend_from_slice(&[2 * i + 1, start, end, 4]);
            }
        }
        let tree = TreeBuilder::new().reused(&reused).build(FlatBufferCursor::new(&quads));

        assert_eq!(tree.text_len(), TextSize::new(50));
        assert!(tree.green_children().len() >= 2);
        // The reuse slot resolves to the table entry, shared by reference.
        let shared = tree
            .green_children()
            .iter()
            .find_map(|child| match child {
                GreenChild::Node { rel_offset, node } if node.kind() == SyntaxKind(7) => {
                    Some((*rel_offset, node.clone()))
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(shared.0, TextSize::new(20));
        assert!(std::ptr::eq(shared.1.as_ptr(), reused_tree.as_ptr()));
        // No buffer spans the reused node's range.
        for buffer in buffers_of(&tree) {
            for slot in (0..buffer.slot_len()).step_by(4) {
                assert!(buffer.count_at(slot) == 0);
            }
        }
        let child_ranges: Vec<_> = tree
            .green_children()
            .iter()
            .map(|child| (u32::from(child.rel_offset()), u32::from(child.text_len())))
            .collect();
        assert_eq!(child_ranges, vec![(0, 20), (20, 5), (25, 25)]);
    }

    #[test]
    fn packs_nested_records_with_direct_counts() {
        // Postfix: two leaves, then their parent spanning both.
        let quads = vec![
            1, 0, 2, 4, //
            3, 2, 4, 4, //
            5, 0, 4, 12,
        ];
        let tree = TreeBuilder::new().build(FlatBufferCursor::new(&quads));
        let buffers = buffers_of(&tree);
        assert_eq!(buffers.len(), 1);
        let buffer = buffers[0];
        assert_eq!(buffer.slot_len(), 12);
        // Prefix order: parent first, direct child count stored.
        assert_eq!(buffer.kind_at(0), SyntaxKind(5));
        assert_eq!(buffer.count_at(0), 2);
        assert_eq!(buffer.kind_at(4), SyntaxKind(1));
        assert_eq!(buffer.kind_at(8), SyntaxKind(3));
    }

    #[test]
    fn oversized_nodes_stay_pointer_nodes() {
        // A single leaf wider than the buffer limit cannot be packed.
        let quads = leaf_quads(&[(1, 0, 2000)]);
        let tree = TreeBuilder::new().build(FlatBufferCursor::new(&quads));
        assert_eq!(tree.green_children().len(), 1);
        assert!(matches!(tree.green_children()[0], GreenChild::Node { .. }));
    }

    fn max_fanout_and_depth(node: &GreenNode, depth: usize, fanout: &mut usize, deepest: &mut usize) {
        *deepest = (*deepest).max(depth);
        *fanout = (*fanout).max(node.green_children().len());
        for child in node.green_children() {
            if let GreenChild::Node { node, .. } = child {
                max_fanout_and_depth(node, depth + 1, fanout, deepest);
            }
        }
    }

    #[test]
    fn balances_wide_anonymous_collectors() {
        // 1000 anonymous leaves of span 2 under one anonymous collector.
        let mut quads = Vec::new();
        for i in 0..1000 {
            quads.extend_from_slice(&[4, i * 2, i * 2 + 2, 4]);
        }
        quads.extend_from_slice(&[2, 0, 2000, 4 + 4000]);
        let tree =
            TreeBuilder::new().max_buffer_length(32).build(FlatBufferCursor::new(&quads));

        assert_eq!(tree.text_len(), TextSize::new(2000));
        let mut fanout = 0;
        let mut deepest = 0;
        max_fanout_and_depth(&tree, 0, &mut fanout, &mut deepest);
        assert!(fanout <= BRANCH_FACTOR, "fanout {} exceeds branch factor", fanout);
        // ceil(log8(1000)) plus a small constant.
        assert!(deepest <= 6, "tree too deep: {}", deepest);

        // Balancing must not lose or reorder content.
        let mut covered = Vec::new();
        collect_leaf_spans(&tree, TextSize::new(0), &mut covered);
        assert_eq!(covered.len(), 1000);
        assert_eq!(covered[0], (0, 2));
        assert_eq!(covered[999], (1998, 2000));
        assert!(covered.windows(2).all(|w| w[0].1 == w[1].0));
    }

    fn collect_leaf_spans(node: &GreenNode, offset: TextSize, out: &mut Vec<(u32, u32)>) {
        for child in node.green_children() {
            let at = offset + child.rel_offset();
            match child {
                GreenChild::Node { node, .. } => {
                    if node.green_children().is_empty() {
                        out.push((u32::from(at), u32::from(at + node.text_len())));
                    } else {
                        collect_leaf_spans(node, at, out);
                    }
                }
                GreenChild::Buffer { buffer, .. } => {
                    for slot in (0..buffer.slot_len()).step_by(4) {
                        out.push((
                            u32::from(at + buffer.start_at(slot)),
                            u32::from(at + buffer.end_at(slot)),
                        ));
                    }
                }
            }
        }
    }

    #[test]
    fn distribute_balances_the_root() {
        // Twenty wide tagged leaves, each too big to pack.
        let ranges: Vec<_> =
            (0..20).map(|i| (2 * i + 1, i * 2000, i * 2000 + 2000)).collect();
        let quads = leaf_quads(&ranges);

        let flat = TreeBuilder::new().build(FlatBufferCursor::new(&quads));
        assert_eq!(flat.green_children().len(), 20);

        let spread = TreeBuilder::new().distribute(true).build(FlatBufferCursor::new(&quads));
        assert_eq!(spread.text_len(), TextSize::new(40000));
        let mut fanout = 0;
        let mut deepest = 0;
        max_fanout_and_depth(&spread, 0, &mut fanout, &mut deepest);
        assert!(fanout <= BRANCH_FACTOR);
        // Iteration still sees all twenty leaves in order.
        let mut seen = Vec::new();
        spread.iterate(TextSize::new(0), TextSize::new(40000), |kind, _| {
            seen.push(kind.0);
            crate::Visit::Descend
        });
        let expected: Vec<_> = (0..20u16).map(|i| 2 * i + 1).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_stream_builds_the_empty_tree() {
        let tree = TreeBuilder::new().build(FlatBufferCursor::new(&[]));
        assert_eq!(tree.kind(), SyntaxKind::NONE);
        assert_eq!(tree.text_len(), TextSize::new(0));
        assert_eq!(tree.children().len(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds the packed record range")]
    fn buffer_length_beyond_record_range_is_rejected() {
        let _ = TreeBuilder::new().max_buffer_length(1 << 16);
    }

    #[test]
    fn top_kind_names_the_root() {
        let quads = leaf_quads(&[(3, 0, 5)]);
        let tree = TreeBuilder::new().top(SyntaxKind(1)).build(FlatBufferCursor::new(&quads));
        assert_eq!(tree.kind(), SyntaxKind(1));
        assert_eq!(tree.text_len(), TextSize::new(5));
        assert_eq!(tree.to_string(), "1(3)");
    }

    #[test]
    fn buffer_iteration_matches_input() {
        let ranges: Vec<_> = (0..10).map(|i| (2 * i + 1, i * 5, i * 5 + 5)).collect();
        let quads = leaf_quads(&ranges);
        let tree = TreeBuilder::new().build(FlatBufferCursor::new(&quads));
        let mut seen = Vec::new();
        tree.iterate(TextSize::new(0), TextSize::new(50), |kind, range| {
            seen.push((kind.0, u32::from(range.start()), u32::from(range.end())));
            crate::Visit::Descend
        });
        let expected: Vec<_> =
            (0..10u32).map(|i| ((2 * i + 1) as u16, i * 5, i * 5 + 5)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn reuse_inside_a_subtree_blocks_packing() {
        let reused = [GreenNode::new(SyntaxKind(9), [], TextSize::new(2))];
        // A parent [0,4) whose second child is a reuse slot, then a sibling
        // leaf [4,8): the scan must not pack across the parent.
        let quads = vec![
            1, 0, 2, 4, //
            0, 2, 4, REUSED_VALUE, //
            3, 0, 4, 12, //
            5, 4, 8, 4,
        ];
        let tree = TreeBuilder::new().reused(&reused).build(FlatBufferCursor::new(&quads));
        assert_eq!(tree.text_len(), TextSize::new(8));
        // The trailing leaf may pack alone only if worth it; the parent must
        // be a pointer node holding the reused tree.
        let parent = tree
            .green_children()
            .iter()
            .find_map(|child| match child {
                GreenChild::Node { node, .. } if node.kind() == SyntaxKind(3) => Some(node),
                _ => None,
            })
            .expect("parent stays a pointer node");
        assert_eq!(parent.green_children().len(), 2);
        assert!(parent
            .green_children()
            .iter()
            .any(|child| matches!(child, GreenChild::Node { node, .. } if node.kind() == SyntaxKind(9))));
    }
}
