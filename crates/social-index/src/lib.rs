//! Ordered attribute index for socialdb.
//!
//! [`AvlTree`] is the generic balanced map; [`AttributeIndex`] keeps one tree
//! per indexed [`social_types::Attribute`].

mod attribute_index;
mod avl;

pub use attribute_index::{AttributeIndex, Matches};
pub use avl::{AvlTree, Range};
