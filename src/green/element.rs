use crate::{
    green::{GreenBuffer, GreenNode},
    NodeOrBuffer, TextSize,
};

/// Either a pointer node or a packed buffer, as stored in a child slot.
pub type GreenElement = NodeOrBuffer<GreenNode, GreenBuffer>;

impl From<GreenNode> for GreenElement {
    #[inline]
    fn from(node: GreenNode) -> GreenElement {
        NodeOrBuffer::Node(node)
    }
}

impl From<GreenBuffer> for GreenElement {
    #[inline]
    fn from(buffer: GreenBuffer) -> GreenElement {
        NodeOrBuffer::Buffer(buffer)
    }
}

impl GreenElement {
    /// Returns the length of the text covered by this element.
    #[inline]
    pub fn text_len(&self) -> TextSize {
        match self {
            NodeOrBuffer::Node(it) => it.text_len(),
            NodeOrBuffer::Buffer(it) => it.text_len(),
        }
    }
}
