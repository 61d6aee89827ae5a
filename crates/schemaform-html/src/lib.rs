//! Markup tree for schemaform.
//!
//! The form layer composes HTML out of opaque [`Node`] values: elements with
//! a tag, an attribute map, and child nodes, plus escaped text and raw
//! pass-through content. Serialization is deterministic (attributes render
//! in sorted order) so rendered markup is directly assertable in tests.

pub mod node;

pub use node::{escape, AttrValue, Element, Node};
