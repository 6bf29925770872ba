use std::fmt;

/// A child slot of a pointer node: either another pointer node or a packed
/// buffer of leaf records. The set is closed, so navigation sites match on
/// the variant directly instead of going through dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeOrBuffer<N, B> {
    Node(N),
    Buffer(B),
}

impl<N, B> NodeOrBuffer<N, B> {
    pub fn into_node(self) -> Option<N> {
        match self {
            NodeOrBuffer::Node(node) => Some(node),
            NodeOrBuffer::Buffer(_) => None,
        }
    }

    pub fn into_buffer(self) -> Option<B> {
        match self {
            NodeOrBuffer::Node(_) => None,
            NodeOrBuffer::Buffer(buffer) => Some(buffer),
        }
    }

    pub fn as_node(&self) -> Option<&N> {
        match self {
            NodeOrBuffer::Node(node) => Some(node),
            NodeOrBuffer::Buffer(_) => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&B> {
        match self {
            NodeOrBuffer::Node(_) => None,
            NodeOrBuffer::Buffer(buffer) => Some(buffer),
        }
    }
}

impl<N: fmt::Display, B: fmt::Display> fmt::Display for NodeOrBuffer<N, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOrBuffer::Node(node) => fmt::Display::fmt(node, f),
            NodeOrBuffer::Buffer(buffer) => fmt::Display::fmt(buffer, f),
        }
    }
}

/// Which node a positional lookup should select when `pos` falls on or
/// between children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    /// The last child lying strictly before the position.
    Before,
    /// The child containing the position (inclusive start, exclusive end).
    At,
    /// The first child at or after the position.
    After,
}

/// Verdict returned by an `enter` callback during iteration.
///
/// `Skip` suppresses descent into the node's children *and* the matching
/// `leave` call. It is an ordinary value, not an error: iteration continues
/// with the next sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visit {
    /// Visit the node's children, then call `leave`.
    Descend,
    /// Do not descend; `leave` is not called for this node.
    Skip,
}
