/// Failures reported by [`AvlTree`](crate::AvlTree) and
/// [`Deque`](crate::Deque) operations.
///
/// A failed operation never modifies the collection it was called on.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An insertion found its key already present in the tree.
    #[error("key already exists")]
    KeyAlreadyExists,

    /// A search, update or deletion did not find its key.
    #[error("key not found")]
    KeyNotFound,

    /// A value was popped from an empty deque.
    #[error("collection is empty")]
    EmptyCollection,
}

/// Result type for tree and deque operations.
pub type Result<T> = std::result::Result<T, Error>;
