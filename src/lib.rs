//! A library for the persistent syntax trees behind an incremental parser.
//!
//! The tree itself is "green": immutable, position-independent data shared
//! freely between tree versions. Dense leafy regions are packed into flat
//! numeric buffers ([`GreenBuffer`]) instead of allocating a node each;
//! [`SyntaxNode`] cursors hide the difference and add parents and absolute
//! offsets on top. [`TreeBuilder`] turns a parser's postfix record stream
//! into balanced trees, and [`GreenNode::unchanged`] carries unaffected
//! subtrees across an edit by reference.
//!
//! The tree stores only kinds and offsets; text lives with the caller.

mod utility_types;
mod green;
mod cursor;
mod tags;

pub use text_size::{TextLen, TextRange, TextSize};

pub use crate::{
    cursor::SyntaxNode,
    green::{
        BufferCursor, ChangedRange, Children, FlatBufferCursor, GreenBuffer, GreenElement,
        GreenNode, SyntaxKind, TreeBuilder, DEFAULT_BUFFER_LENGTH, REUSED_VALUE,
    },
    tags::TagTable,
    utility_types::{NodeOrBuffer, Visit},
};
