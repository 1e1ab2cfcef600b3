//! # An ordered key-value map on an owned AVL tree
//!
//! `avl-kv` provides [`AvlTree`], a map from totally ordered keys to values
//! that stays height balanced under every insertion and deletion.  Nodes own
//! their children outright; the tree has no parent links and no shared nodes.
//!
//! Besides the usual map operations, the tree exposes its structure: lookups
//! return the [`Node`] holding a key, and [`AvlTree::inorder`] and
//! [`AvlTree::level_order`] return the nodes in sorted and breadth-first order.
//! Breadth-first traversal runs on [`Deque`], a double-ended queue whose pops
//! fail with [`Error::EmptyCollection`] rather than returning `None`.
//!
//! Enable the `serde` feature for `Serialize`/`Deserialize` implementations.

mod error;
pub use error::{Error, Result};

mod deque;
pub use deque::Deque;

mod avl;
pub use avl::{AvlTree, Iter, Node};

#[cfg(feature = "serde")]
mod serde;
