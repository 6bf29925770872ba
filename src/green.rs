mod node;
mod buffer;
mod element;
mod builder;

pub(crate) use self::node::{iter_tree, GreenChild};

pub use self::{
    buffer::GreenBuffer,
    builder::{
        BufferCursor, FlatBufferCursor, TreeBuilder, DEFAULT_BUFFER_LENGTH, REUSED_VALUE,
    },
    element::GreenElement,
    node::{ChangedRange, Children, GreenNode},
};

/// SyntaxKind is a type tag for each node.
///
/// The low bit distinguishes *tagged* kinds (named, visible to iteration and
/// metadata lookup) from anonymous grouping kinds the parser introduces for
/// internal structure. Kind `0` is the anonymous root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxKind(pub u16);

impl SyntaxKind {
    /// The anonymous root kind.
    pub const NONE: SyntaxKind = SyntaxKind(0);

    /// Whether this kind is named and visible to iteration callbacks.
    #[inline]
    pub fn is_tagged(self) -> bool {
        self.0 & 1 == 1
    }
}
