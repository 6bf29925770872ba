//! Implementation of the cursors -- API for convenient access to syntax trees.
//!
//! Functional programmers will recognize that this module implements a zipper
//! for a purely functional (green) tree.
//!
//! A cursor node (`SyntaxNode`) points to a green node or to a record inside
//! a packed green buffer, plus a parent `SyntaxNode`. That allows cursors to
//! walk both up and down and to give cheap access to a node's absolute
//! offset, while hiding which of the two green representations backs it.
//!
//! `NodeData`s are transient, and are created and destroyed during tree
//! traversals. Parents are always created before their children, so the
//! parent chain is a plain reference-counted backlink with no cycles. Views
//! are per-thread values; the green data they point into is freely shared.

use std::{
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
};

use countme::Count;

use crate::{
    green::{iter_tree, GreenBuffer, GreenChild, GreenNode},
    utility_types::Side,
    SyntaxKind, TagTable, TextRange, TextSize, Visit,
};

#[derive(Debug)]
enum GreenRef {
    Node(GreenNode),
    Buffer { buffer: GreenBuffer, index: usize },
}

#[derive(Debug)]
struct NodeData {
    _c: Count<SyntaxNode>,
    parent: Option<SyntaxNode>,
    /// Absolute start of the green node; for buffer records, absolute start
    /// of the containing buffer (shared by every record view inside it).
    offset: TextSize,
    green: GreenRef,
}

/// A transient handle to a node of the tree, with a parent link and an
/// absolute position. Views over pointer nodes and over buffer records
/// behave identically.
#[derive(Clone)]
pub struct SyntaxNode {
    data: Rc<NodeData>,
}

impl SyntaxNode {
    /// A view of `green` as the root of a tree.
    #[inline]
    pub fn new_root(green: GreenNode) -> SyntaxNode {
        SyntaxNode::new(None, TextSize::new(0), GreenRef::Node(green))
    }

    #[inline]
    fn new(parent: Option<SyntaxNode>, offset: TextSize, green: GreenRef) -> SyntaxNode {
        SyntaxNode { data: Rc::new(NodeData { _c: Count::new(), parent, offset, green }) }
    }

    #[inline]
    fn new_node(parent: SyntaxNode, node: GreenNode, offset: TextSize) -> SyntaxNode {
        SyntaxNode::new(Some(parent), offset, GreenRef::Node(node))
    }

    #[inline]
    fn new_buffer(
        parent: SyntaxNode,
        buffer: GreenBuffer,
        index: usize,
        buffer_start: TextSize,
    ) -> SyntaxNode {
        SyntaxNode::new(Some(parent), buffer_start, GreenRef::Buffer { buffer, index })
    }

    /// Kind of the node this view points at.
    #[inline]
    pub fn kind(&self) -> SyntaxKind {
        match &self.data.green {
            GreenRef::Node(node) => node.kind(),
            GreenRef::Buffer { buffer, index } => buffer.kind_at(*index),
        }
    }

    /// Absolute start offset.
    #[inline]
    pub fn start(&self) -> TextSize {
        match &self.data.green {
            GreenRef::Node(_) => self.data.offset,
            GreenRef::Buffer { buffer, index } => self.data.offset + buffer.start_at(*index),
        }
    }

    /// Absolute end offset.
    #[inline]
    pub fn end(&self) -> TextSize {
        match &self.data.green {
            GreenRef::Node(node) => self.data.offset + node.text_len(),
            GreenRef::Buffer { buffer, index } => self.data.offset + buffer.end_at(*index),
        }
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start(), self.end())
    }

    /// The view this one was created from, or `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<SyntaxNode> {
        self.data.parent.clone()
    }

    /// Length of the parent chain up to the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut parent = self.parent();
        while let Some(view) = parent {
            depth += 1;
            parent = view.parent();
        }
        depth
    }

    /// Returns the smallest tagged node containing `pos`, or the root when
    /// no tagged node does. On a non-root view, positions outside the view's
    /// span delegate upwards until a containing node is found.
    pub fn resolve(&self, pos: TextSize) -> SyntaxNode {
        if let Some(parent) = &self.data.parent {
            if pos < self.start() || pos >= self.end() {
                return parent.resolve(pos);
            }
        }
        match &self.data.green {
            GreenRef::Node(node) => {
                resolve_in_node(self.clone(), node.clone(), self.data.offset, pos)
            }
            GreenRef::Buffer { buffer, index } => resolve_in_buffer(
                self.clone(),
                buffer.clone(),
                self.data.offset,
                pos,
                index + 4,
                index + buffer.footprint(*index),
            ),
        }
    }

    /// The nearest direct tagged child lying before `pos` (a child covering
    /// `pos` counts). Anonymous pointer children are searched transparently;
    /// zero-width children exactly at `pos` are skipped.
    pub fn child_before(&self, pos: TextSize) -> Option<SyntaxNode> {
        self.find_side(pos, Side::Before)
    }

    /// The nearest direct tagged child at or after `pos` (a child covering
    /// `pos` counts). Anonymous pointer children are searched transparently;
    /// zero-width children exactly at `pos` are skipped.
    pub fn child_after(&self, pos: TextSize) -> Option<SyntaxNode> {
        self.find_side(pos, Side::After)
    }

    fn find_side(&self, pos: TextSize, side: Side) -> Option<SyntaxNode> {
        match &self.data.green {
            GreenRef::Node(node) => find_in_node(self, node, self.data.offset, pos, side),
            GreenRef::Buffer { buffer, index } => {
                let from = index + 4;
                let to = index + buffer.footprint(*index);
                let found = buffer.find_index(pos, side, self.data.offset, from, to)?;
                Some(SyntaxNode::new_buffer(
                    self.clone(),
                    buffer.clone(),
                    found,
                    self.data.offset,
                ))
            }
        }
    }

    /// Depth-first visitation of the tagged nodes in this view's subtree
    /// (the view itself included when tagged) intersecting `[from, to]`.
    pub fn iterate<E>(&self, from: TextSize, to: TextSize, mut enter: E)
    where
        E: FnMut(SyntaxKind, TextRange) -> Visit,
    {
        self.iterate_impl(from, to, &mut enter, &mut |_, _| {});
    }

    /// Like [`iterate`](SyntaxNode::iterate), with a `leave` callback firing
    /// after the descendants of every node whose `enter` did not skip.
    pub fn iterate_with<E, L>(&self, from: TextSize, to: TextSize, mut enter: E, mut leave: L)
    where
        E: FnMut(SyntaxKind, TextRange) -> Visit,
        L: FnMut(SyntaxKind, TextRange),
    {
        self.iterate_impl(from, to, &mut enter, &mut leave);
    }

    fn iterate_impl<E, L>(&self, from: TextSize, to: TextSize, enter: &mut E, leave: &mut L)
    where
        E: FnMut(SyntaxKind, TextRange) -> Visit,
        L: FnMut(SyntaxKind, TextRange),
    {
        match &self.data.green {
            GreenRef::Node(node) => iter_tree(node, self.data.offset, from, to, enter, leave),
            GreenRef::Buffer { buffer, index } => buffer.iterate_records(
                *index,
                *index + buffer.footprint(*index),
                self.data.offset,
                from,
                to,
                enter,
                leave,
            ),
        }
    }

    /// Renders this view's subtree like the green node rendering, resolving
    /// names through `tags` when provided.
    pub fn to_tree_string<T: fmt::Display>(&self, tags: Option<&TagTable<T>>) -> String {
        match &self.data.green {
            GreenRef::Node(node) => node.to_tree_string(tags),
            GreenRef::Buffer { buffer, index } => {
                let mut out = String::new();
                buffer.child_to_string(*index, &mut out, tags);
                out
            }
        }
    }

    fn key(&self) -> (*const u8, TextSize, usize) {
        match &self.data.green {
            GreenRef::Node(node) => (node.as_ptr(), self.data.offset, usize::MAX),
            GreenRef::Buffer { buffer, index } => (buffer.as_ptr(), self.data.offset, *index),
        }
    }
}

fn resolve_in_node(
    mut current: SyntaxNode,
    mut green: GreenNode,
    mut node_start: TextSize,
    pos: TextSize,
) -> SyntaxNode {
    loop {
        let Some(i) = green.find_child(pos, Side::At, node_start) else { return current };
        let child = green.green_children()[i].clone();
        let child_start = node_start + child.rel_offset();
        match child {
            GreenChild::Node { node, .. } => {
                if node.kind().is_tagged() {
                    current = SyntaxNode::new_node(current, node.clone(), child_start);
                }
                // Anonymous nodes are descended without leaving a view.
                green = node;
                node_start = child_start;
            }
            GreenChild::Buffer { buffer, .. } => {
                let to = buffer.slot_len();
                return resolve_in_buffer(current, buffer, child_start, pos, 0, to);
            }
        }
    }
}

fn resolve_in_buffer(
    mut current: SyntaxNode,
    buffer: GreenBuffer,
    buffer_start: TextSize,
    pos: TextSize,
    mut from: usize,
    mut to: usize,
) -> SyntaxNode {
    // Refine to the innermost record containing the position.
    while let Some(i) = buffer.find_index(pos, Side::At, buffer_start, from, to) {
        if buffer.kind_at(i).is_tagged() {
            current = SyntaxNode::new_buffer(current, buffer.clone(), i, buffer_start);
        }
        from = i + 4;
        to = i + buffer.footprint(i);
    }
    current
}

/// Scans `green`'s children for the nearest tagged node on `side` of `pos`.
/// A candidate that holds no tagged node on that side (an anonymous subtree
/// of anonymous content, or a buffer with no selectable record) does not end
/// the search; the scan moves on to the next sibling in the same direction.
fn find_in_node(
    parent: &SyntaxNode,
    green: &GreenNode,
    node_start: TextSize,
    pos: TextSize,
    side: Side,
) -> Option<SyntaxNode> {
    match side {
        Side::Before => {
            // Nearest first: walk right to left, starting from the child
            // containing the position when there is one. A zero-width child
            // exactly at the position starts at it and is passed over.
            for child in green.green_children().iter().rev() {
                let start = node_start + child.rel_offset();
                if start >= pos {
                    continue;
                }
                if let Some(view) = materialize(parent, child, start, pos, side) {
                    return Some(view);
                }
            }
            None
        }
        Side::At | Side::After => {
            // A zero-width child exactly at the position ends at it and is
            // passed over.
            for child in green.green_children() {
                let start = node_start + child.rel_offset();
                if start + child.text_len() <= pos {
                    continue;
                }
                if let Some(view) = materialize(parent, child, start, pos, side) {
                    return Some(view);
                }
            }
            None
        }
    }
}

fn materialize(
    parent: &SyntaxNode,
    child: &GreenChild,
    child_start: TextSize,
    pos: TextSize,
    side: Side,
) -> Option<SyntaxNode> {
    match child {
        GreenChild::Node { node, .. } => {
            if node.kind().is_tagged() {
                Some(SyntaxNode::new_node(parent.clone(), node.clone(), child_start))
            } else {
                find_in_node(parent, node, child_start, pos, side)
            }
        }
        GreenChild::Buffer { buffer, .. } => {
            let found = buffer.find_index(pos, side, child_start, 0, buffer.slot_len())?;
            Some(SyntaxNode::new_buffer(parent.clone(), buffer.clone(), found, child_start))
        }
    }
}

impl GreenNode {
    /// Returns the smallest tagged subtree containing `pos`, as a view
    /// rooted at this node. Positions outside the tree resolve to the root.
    #[inline]
    pub fn resolve(&self, pos: TextSize) -> SyntaxNode {
        SyntaxNode::new_root(self.clone()).resolve(pos)
    }

    /// The nearest direct tagged child before `pos`, if any.
    #[inline]
    pub fn child_before(&self, pos: TextSize) -> Option<SyntaxNode> {
        SyntaxNode::new_root(self.clone()).child_before(pos)
    }

    /// The nearest direct tagged child at or after `pos`, if any.
    #[inline]
    pub fn child_after(&self, pos: TextSize) -> Option<SyntaxNode> {
        SyntaxNode::new_root(self.clone()).child_after(pos)
    }
}

// Identity semantics for hash & eq
impl PartialEq for SyntaxNode {
    #[inline]
    fn eq(&self, other: &SyntaxNode) -> bool {
        self.key() == other.key()
    }
}

impl Eq for SyntaxNode {}

impl Hash for SyntaxNode {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.kind())
            .field("range", &self.range())
            .finish()
    }
}

impl fmt::Display for SyntaxNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tree_string(None::<&TagTable<String>>))
    }
}
