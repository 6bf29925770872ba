use std::{
    fmt,
    hash::{Hash, Hasher},
    iter::FusedIterator,
    slice,
};

use countme::Count;
use triomphe::Arc;

use crate::{
    green::{buffer::GreenBuffer, element::GreenElement, SyntaxKind},
    utility_types::Side,
    NodeOrBuffer, TagTable, TextRange, TextSize,
};

#[derive(Debug)]
struct GreenNodeData {
    kind: SyntaxKind,
    text_len: TextSize,
    children: Vec<GreenChild>,
    _c: Count<GreenNode>,
}

// The following impls ignore `_c`, it is bookkeeping, not node identity.
impl PartialEq for GreenNodeData {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        let Self { kind, text_len, children, _c: _ } = self;
        let Self { kind: other_kind, text_len: other_text_len, children: other_children, _c: _ } =
            other;
        kind == other_kind && text_len == other_text_len && children == other_children
    }
}

impl Eq for GreenNodeData {}

impl Hash for GreenNodeData {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        let Self { kind, text_len, children, _c: _ } = self;
        kind.hash(state);
        text_len.hash(state);
        children.hash(state);
    }
}

/// A child slot together with its start offset relative to the parent.
///
/// Offsets are stored per child rather than derived by summation because
/// sibling spans may leave gaps (skipped content is not represented).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub(crate) enum GreenChild {
    Node { rel_offset: TextSize, node: GreenNode },
    Buffer { rel_offset: TextSize, buffer: GreenBuffer },
}

impl GreenChild {
    #[inline]
    pub(crate) fn rel_offset(&self) -> TextSize {
        match self {
            GreenChild::Node { rel_offset, .. } | GreenChild::Buffer { rel_offset, .. } => {
                *rel_offset
            }
        }
    }

    #[inline]
    pub(crate) fn text_len(&self) -> TextSize {
        match self {
            GreenChild::Node { node, .. } => node.text_len(),
            GreenChild::Buffer { buffer, .. } => buffer.text_len(),
        }
    }

    #[inline]
    pub(crate) fn as_element(&self) -> GreenElement {
        match self {
            GreenChild::Node { node, .. } => NodeOrBuffer::Node(node.clone()),
            GreenChild::Buffer { buffer, .. } => NodeOrBuffer::Buffer(buffer.clone()),
        }
    }

    #[inline]
    pub(crate) fn with_rel_offset(&self, rel_offset: TextSize) -> GreenChild {
        match self {
            GreenChild::Node { node, .. } => GreenChild::Node { rel_offset, node: node.clone() },
            GreenChild::Buffer { buffer, .. } => {
                GreenChild::Buffer { rel_offset, buffer: buffer.clone() }
            }
        }
    }
}

impl fmt::Display for GreenChild {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GreenChild::Node { node, .. } => fmt::Display::fmt(node, f),
            GreenChild::Buffer { buffer, .. } => fmt::Display::fmt(buffer, f),
        }
    }
}

/// The region `[from_a, to_a)` of the old document was replaced by
/// `[from_b, to_b)` in the new document. Lists of these are sorted by
/// `from_a` and non-overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangedRange {
    pub from_a: TextSize,
    pub to_a: TextSize,
    pub from_b: TextSize,
    pub to_b: TextSize,
}

/// Immutable pointer node of the tree.
///
/// Holds an ordered sequence of children, each a nested node or a packed
/// [`GreenBuffer`], with start offsets relative to this node. Nodes are
/// constructed once and never mutated; edits produce new nodes that share
/// untouched children by reference.
#[derive(Clone)]
pub struct GreenNode {
    data: Arc<GreenNodeData>,
}

impl GreenNode {
    /// Creates a node from `(relative offset, child)` pairs and an explicit
    /// total span. The span must cover every child.
    pub fn new<I>(kind: SyntaxKind, children: I, text_len: TextSize) -> GreenNode
    where
        I: IntoIterator<Item = (TextSize, GreenElement)>,
    {
        let children = children
            .into_iter()
            .map(|(rel_offset, element)| match element {
                NodeOrBuffer::Node(node) => GreenChild::Node { rel_offset, node },
                NodeOrBuffer::Buffer(buffer) => GreenChild::Buffer { rel_offset, buffer },
            })
            .collect();
        GreenNode::from_child_vec(kind, children, text_len)
    }

    /// The zero-length anonymous tree.
    pub fn empty() -> GreenNode {
        GreenNode::from_child_vec(SyntaxKind::NONE, Vec::new(), TextSize::new(0))
    }

    pub(crate) fn from_child_vec(
        kind: SyntaxKind,
        children: Vec<GreenChild>,
        text_len: TextSize,
    ) -> GreenNode {
        GreenNode {
            data: Arc::new(GreenNodeData { kind, text_len, children, _c: Count::new() }),
        }
    }

    /// Kind of this node.
    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        self.data.kind
    }

    /// Returns the total span covered by this node.
    #[inline]
    pub fn text_len(&self) -> TextSize {
        self.data.text_len
    }

    /// Children of this node with their relative start offsets.
    #[inline]
    pub fn children(&self) -> Children<'_> {
        Children { raw: self.data.children.iter() }
    }

    #[inline]
    pub(crate) fn green_children(&self) -> &[GreenChild] {
        &self.data.children
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const u8 {
        Arc::as_ptr(&self.data).cast()
    }

    /// Finds the index of the child a positional query at `pos` selects,
    /// given this node's absolute start. Same selection rules as the packed
    /// buffer's record lookup.
    pub(crate) fn find_child(
        &self,
        pos: TextSize,
        side: Side,
        node_start: TextSize,
    ) -> Option<usize> {
        let mut last_before = None;
        for (i, child) in self.green_children().iter().enumerate() {
            let start = node_start + child.rel_offset();
            let end = start + child.text_len();
            let ignore = start == end && start == pos;
            if !ignore {
                if start > pos || (start == pos && side == Side::Before) {
                    if side == Side::After {
                        return Some(i);
                    }
                    break;
                }
                if end > pos {
                    return Some(i);
                }
                if side == Side::Before {
                    last_before = Some(i);
                }
            }
        }
        match side {
            Side::Before => last_before,
            Side::At | Side::After => None,
        }
    }

    /// Returns a node containing only the content before `at`. A child
    /// straddling the cut is itself cut recursively; children past it are
    /// dropped. Cutting at or beyond the end returns the node itself.
    pub fn cut(&self, at: TextSize) -> GreenNode {
        if at >= self.text_len() {
            return self.clone();
        }
        let mut children = Vec::new();
        for child in self.green_children() {
            let from = child.rel_offset();
            if from >= at {
                break;
            }
            let to = from + child.text_len();
            let kept = if to <= at {
                child.clone()
            } else {
                match child {
                    GreenChild::Node { node, .. } => {
                        GreenChild::Node { rel_offset: from, node: node.cut(at - from) }
                    }
                    GreenChild::Buffer { buffer, .. } => {
                        GreenChild::Buffer { rel_offset: from, buffer: buffer.cut(at - from) }
                    }
                }
            };
            children.push(kept);
        }
        GreenNode::from_child_vec(self.kind(), children, at)
    }

    /// Concatenates `other`'s children onto this node's, keeping their
    /// offsets as-is. An empty argument returns the receiver unchanged.
    ///
    /// # Panics
    ///
    /// Panics when `other`'s first child starts before `self.text_len()`.
    pub fn append(&self, other: &GreenNode) -> GreenNode {
        let tail = other.green_children();
        if tail.is_empty() {
            return self.clone();
        }
        let first = tail[0].rel_offset();
        assert!(
            first >= self.text_len(),
            "appended tree overlaps the receiver: child at {:?}, receiver length {:?}",
            first,
            self.text_len(),
        );
        let mut children = self.green_children().to_vec();
        children.extend_from_slice(tail);
        let text_len = children
            .last()
            .map(|child| child.rel_offset() + child.text_len())
            .unwrap_or_default();
        GreenNode::from_child_vec(self.kind(), children, text_len)
    }

    /// Builds a tree reusing every subtree of this one that lies entirely
    /// inside a region untouched by `changes`, shifted to the coordinates of
    /// the new document. Subtrees straddling a change boundary are partially
    /// copied; straddling buffers are dropped whole, since reparsing a leafy
    /// region is cheaper than splitting its records.
    pub fn unchanged(&self, changes: &[ChangedRange]) -> GreenNode {
        if changes.is_empty() || self.green_children().is_empty() {
            return self.clone();
        }
        let mut children = Vec::new();
        let mut pos = TextSize::new(0);
        let mut off: i64 = 0;
        for i in 0..=changes.len() {
            let next = changes.get(i);
            let next_pos = next.map_or(self.text_len(), |change| change.from_a);
            if next_pos > pos {
                // FIXME: stopping one unit short keeps nodes that may end
                // inside a skipped token out of the reuse set; trimming
                // precisely needs skipped-token boundaries we don't have.
                self.partial(pos, next_pos - TextSize::new(1), off, &mut children);
            }
            let Some(change) = next else { break };
            pos = change.to_a;
            off += i64::from(u32::from(change.to_b - change.from_b))
                - i64::from(u32::from(change.to_a - change.from_a));
        }
        let text_len = (i64::from(u32::from(self.text_len())) + off).max(0) as u32;
        GreenNode::from_child_vec(self.kind(), children, TextSize::new(text_len))
    }

    /// Appends to `out` the children falling inside the untouched region
    /// whose last covered offset is `end`, shifted by `offset`. Children
    /// fully inside are shared by reference; straddling nodes recurse.
    fn partial(&self, start: TextSize, end: TextSize, offset: i64, out: &mut Vec<GreenChild>) {
        for child in self.green_children() {
            let from = child.rel_offset();
            if from > end {
                break;
            }
            let to = from + child.text_len();
            if to < start {
                continue;
            }
            if from >= start && to <= end + TextSize::new(1) {
                let shifted = (i64::from(u32::from(from)) + offset) as u32;
                out.push(child.with_rel_offset(TextSize::new(shifted)));
            } else if let GreenChild::Node { node, .. } = child {
                let child_start = start.checked_sub(from).unwrap_or_default();
                node.partial(child_start, end - from, offset + i64::from(u32::from(from)), out);
            }
        }
    }

    /// Depth-first visitation of every tagged descendant whose span
    /// intersects `[from, to]`, in position order. Anonymous nodes are
    /// transparent: their children are visited but no callback fires.
    pub fn iterate<E>(&self, from: TextSize, to: TextSize, mut enter: E)
    where
        E: FnMut(SyntaxKind, TextRange) -> crate::Visit,
    {
        iter_tree(self, TextSize::new(0), from, to, &mut enter, &mut |_, _| {});
    }

    /// Like [`iterate`](GreenNode::iterate), additionally calling `leave`
    /// after the descendants of every node whose `enter` did not skip.
    pub fn iterate_with<E, L>(&self, from: TextSize, to: TextSize, mut enter: E, mut leave: L)
    where
        E: FnMut(SyntaxKind, TextRange) -> crate::Visit,
        L: FnMut(SyntaxKind, TextRange),
    {
        iter_tree(self, TextSize::new(0), from, to, &mut enter, &mut leave);
    }

    /// Renders the tree as `NAME(child,child,…)`, resolving names through
    /// `tags` when provided. Anonymous nodes render their child list bare.
    pub fn to_tree_string<T: fmt::Display>(&self, tags: Option<&TagTable<T>>) -> String {
        let mut out = String::new();
        let _ = self.write_tree(&mut out, tags);
        out
    }

    fn write_tree<T, W>(&self, w: &mut W, tags: Option<&TagTable<T>>) -> fmt::Result
    where
        T: fmt::Display,
        W: fmt::Write,
    {
        if self.kind().is_tagged() {
            match tags.and_then(|tags| tags.get(self.kind())) {
                Some(name) => write!(w, "{}", name)?,
                None => write!(w, "{}", self.kind().0)?,
            }
            if self.green_children().is_empty() {
                return Ok(());
            }
            w.write_char('(')?;
            let mut first = true;
            self.write_children(w, tags, &mut first)?;
            w.write_char(')')
        } else {
            let mut first = true;
            self.write_children(w, tags, &mut first)
        }
    }

    fn write_children<T, W>(
        &self,
        w: &mut W,
        tags: Option<&TagTable<T>>,
        first: &mut bool,
    ) -> fmt::Result
    where
        T: fmt::Display,
        W: fmt::Write,
    {
        for child in self.green_children() {
            match child {
                GreenChild::Node { node, .. } => {
                    if node.kind().is_tagged() {
                        if !*first {
                            w.write_char(',')?;
                        }
                        *first = false;
                        node.write_tree(w, tags)?;
                    } else {
                        node.write_children(w, tags, first)?;
                    }
                }
                GreenChild::Buffer { buffer, .. } => {
                    let mut slot = 0;
                    while slot < buffer.slot_len() {
                        if !*first {
                            w.write_char(',')?;
                        }
                        *first = false;
                        let mut rendered = String::new();
                        buffer.child_to_string(slot, &mut rendered, tags);
                        w.write_str(&rendered)?;
                        slot += buffer.footprint(slot);
                    }
                }
            }
        }
        Ok(())
    }
}

pub(crate) fn iter_tree<E, L>(
    node: &GreenNode,
    offset: TextSize,
    from: TextSize,
    to: TextSize,
    enter: &mut E,
    leave: &mut L,
) where
    E: FnMut(SyntaxKind, TextRange) -> crate::Visit,
    L: FnMut(SyntaxKind, TextRange),
{
    let start = offset;
    let end = offset + node.text_len();
    if start > to || end < from {
        return;
    }
    let kind = node.kind();
    let tagged = kind.is_tagged();
    let range = TextRange::new(start, end);
    if tagged && enter(kind, range) == crate::Visit::Skip {
        return;
    }
    for child in node.green_children() {
        let child_start = offset + child.rel_offset();
        if child_start > to {
            break;
        }
        if child_start + child.text_len() < from {
            continue;
        }
        match child {
            GreenChild::Node { node, .. } => iter_tree(node, child_start, from, to, enter, leave),
            GreenChild::Buffer { buffer, .. } => {
                buffer.iterate_records(0, buffer.slot_len(), child_start, from, to, enter, leave)
            }
        }
    }
    if tagged {
        leave(kind, range);
    }
}

impl PartialEq for GreenNode {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for GreenNode {}

impl Hash for GreenNode {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl fmt::Debug for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GreenNode")
            .field("kind", &self.kind())
            .field("text_len", &self.text_len())
            .field("children", &self.data.children)
            .finish()
    }
}

impl fmt::Display for GreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, None::<&TagTable<String>>)
    }
}

#[derive(Debug, Clone)]
pub struct Children<'a> {
    raw: slice::Iter<'a, GreenChild>,
}

impl ExactSizeIterator for Children<'_> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.raw.len()
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = (TextSize, GreenElement);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next().map(|child| (child.rel_offset(), child.as_element()))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }

    #[inline]
    fn count(self) -> usize {
        self.raw.count()
    }

    #[inline]
    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.raw.nth(n).map(|child| (child.rel_offset(), child.as_element()))
    }
}

impl DoubleEndedIterator for Children<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.raw.next_back().map(|child| (child.rel_offset(), child.as_element()))
    }
}

impl FusedIterator for Children<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Visit;

    fn leaf(kind: u16, len: u32) -> GreenElement {
        NodeOrBuffer::Node(GreenNode::new(SyntaxKind(kind), [], TextSize::new(len)))
    }

    fn node(kind: u16, children: Vec<(u32, GreenElement)>, len: u32) -> GreenNode {
        GreenNode::new(
            SyntaxKind(kind),
            children.into_iter().map(|(at, child)| (TextSize::new(at), child)),
            TextSize::new(len),
        )
    }

    /// Ten tagged leaves of span 10 under an anonymous root of span 100.
    fn ladder() -> GreenNode {
        let children = (0..10u32).map(|i| (i * 10, leaf(2 * i as u16 + 1, 10))).collect();
        node(0, children, 100)
    }

    #[test]
    fn cut_laws() {
        let tree = ladder();
        let same = tree.cut(TextSize::new(100));
        assert!(std::ptr::eq(tree.as_ptr(), same.as_ptr()));

        let cut = tree.cut(TextSize::new(35));
        assert_eq!(cut.text_len(), TextSize::new(35));
        assert_eq!(cut.children().len(), 4);
        let (at, last) = cut.children().next_back().unwrap();
        assert_eq!(at, TextSize::new(30));
        // The straddling leaf was cut down, not shared.
        assert_eq!(last.as_node().unwrap().text_len(), TextSize::new(5));
    }

    #[test]
    fn append_derives_length_from_last_child() {
        let head = node(0, vec![(0, leaf(1, 10))], 10);
        let tail = node(0, vec![(10, leaf(3, 5)), (20, leaf(5, 5))], 25);
        let joined = head.append(&tail);
        assert_eq!(joined.text_len(), TextSize::new(25));
        assert_eq!(joined.children().len(), 3);

        let same = head.append(&GreenNode::empty());
        assert_eq!(same.text_len(), TextSize::new(10));
        assert_eq!(same, head);
    }

    #[test]
    #[should_panic(expected = "overlaps the receiver")]
    fn append_rejects_overlap() {
        let head = node(0, vec![(0, leaf(1, 10))], 10);
        let tail = node(0, vec![(5, leaf(3, 5))], 10);
        let _ = head.append(&tail);
    }

    #[test]
    fn unchanged_reuses_untouched_children() {
        let tree = ladder();
        let changes = [ChangedRange {
            from_a: TextSize::new(40),
            to_a: TextSize::new(60),
            from_b: TextSize::new(40),
            to_b: TextSize::new(50),
        }];
        let reused = tree.unchanged(&changes);

        let old: Vec<_> = tree.children().collect();
        let new: Vec<_> = reused.children().collect();
        // [0,40): shared by reference at unshifted positions.
        for i in 0..4 {
            assert_eq!(new[i].0, old[i].0);
            let (old_node, new_node) = (old[i].1.as_node().unwrap(), new[i].1.as_node().unwrap());
            assert!(std::ptr::eq(old_node.as_ptr(), new_node.as_ptr()));
        }
        // [40,60): dropped. [60,100): shifted left by 10.
        assert_eq!(new.len(), 8);
        for i in 4..8 {
            assert_eq!(new[i].0, old[i + 2].0 - TextSize::new(10));
            let (old_node, new_node) =
                (old[i + 2].1.as_node().unwrap(), new[i].1.as_node().unwrap());
            assert!(std::ptr::eq(old_node.as_ptr(), new_node.as_ptr()));
        }
        assert_eq!(reused.text_len(), TextSize::new(90));
    }

    #[test]
    fn unchanged_without_changes_is_identity() {
        let tree = ladder();
        let same = tree.unchanged(&[]);
        assert!(std::ptr::eq(tree.as_ptr(), same.as_ptr()));

        let empty = GreenNode::empty();
        let still_empty = empty.unchanged(&[ChangedRange {
            from_a: TextSize::new(0),
            to_a: TextSize::new(0),
            from_b: TextSize::new(0),
            to_b: TextSize::new(3),
        }]);
        assert_eq!(still_empty.text_len(), TextSize::new(0));
        assert_eq!(still_empty.children().len(), 0);
    }

    #[test]
    fn unchanged_descends_into_straddlers() {
        // An anonymous container over [0,40) holding four tagged leaves.
        let inner = node(
            0,
            vec![(0, leaf(1, 10)), (10, leaf(3, 10)), (20, leaf(5, 10)), (30, leaf(7, 10))],
            40,
        );
        let tree = node(2, vec![(0, NodeOrBuffer::Node(inner)), (40, leaf(9, 10))], 50);
        let changes = [ChangedRange {
            from_a: TextSize::new(15),
            to_a: TextSize::new(25),
            from_b: TextSize::new(15),
            to_b: TextSize::new(25),
        }];
        let reused = tree.unchanged(&changes);
        // The container straddles the change, so reuse happens at leaf
        // granularity: [0,10) survives, [10,20) and [20,30) touch the
        // change, [30,40) and [40,50) survive.
        let kept: Vec<_> = reused
            .children()
            .map(|(at, c)| (u32::from(at), c.as_node().unwrap().kind().0))
            .collect();
        assert_eq!(kept, vec![(0, 1), (30, 7), (40, 9)]);
    }

    #[test]
    fn iterate_with_skip() {
        let b = node(3, vec![], 10);
        let a = node(1, vec![(5, NodeOrBuffer::Node(b))], 20);
        let tree = node(0, vec![(0, NodeOrBuffer::Node(a))], 20);

        let mut entered = Vec::new();
        let mut left = Vec::new();
        tree.iterate_with(
            TextSize::new(0),
            TextSize::new(20),
            |kind, range| {
                entered.push((kind.0, u32::from(range.start()), u32::from(range.end())));
                if kind.0 == 1 {
                    Visit::Skip
                } else {
                    Visit::Descend
                }
            },
            |kind, _| left.push(kind.0),
        );
        assert_eq!(entered, vec![(1, 0, 20)]);
        assert!(left.is_empty());
    }

    #[test]
    fn iterate_is_position_ordered_and_range_limited() {
        let tree = ladder();
        let mut seen = Vec::new();
        tree.iterate(TextSize::new(25), TextSize::new(55), |kind, range| {
            seen.push((kind.0, u32::from(range.start())));
            Visit::Descend
        });
        // Leaves [20,30) through [50,60) intersect the query range.
        assert_eq!(seen, vec![(5, 20), (7, 30), (9, 40), (11, 50)]);
        let starts: Vec<_> = seen.iter().map(|&(_, s)| s).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn display_renders_anonymous_children_bare() {
        let b = node(3, vec![], 10);
        let a = node(1, vec![(5, NodeOrBuffer::Node(b))], 20);
        let tree = node(0, vec![(0, NodeOrBuffer::Node(a)), (20, leaf(5, 4))], 24);
        assert_eq!(tree.to_string(), "1(3),5");

        let tags = TagTable::from_pairs([
            (SyntaxKind(1), "A"),
            (SyntaxKind(3), "B"),
            (SyntaxKind(5), "C"),
        ]);
        assert_eq!(tree.to_tree_string(Some(&tags)), "A(B),C");
    }

    #[test]
    fn unchanged_matches_display_roundtrip() {
        let tree = ladder();
        assert_eq!(tree.unchanged(&[]).to_string(), tree.to_string());
    }
}
