use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};

/// A double-ended queue with fallible pops.
///
/// The "left" end is the front and the "right" end is the back.  All four
/// push/pop operations run in amortized constant time.  Popping an empty
/// deque reports [`Error::EmptyCollection`] instead of returning an `Option`.
///
/// [`AvlTree::level_order`](crate::AvlTree::level_order) uses a `Deque` as its
/// FIFO work list.
///
/// # Examples
/// ```
/// use avl_kv::{Deque, Error};
///
/// let mut d = Deque::new();
/// d.push_right(1);
/// d.push_right(2);
/// d.push_left(0);
///
/// assert_eq!(d.len(), 3);
/// assert_eq!(d.pop_left(), Ok(0));
/// assert_eq!(d.pop_right(), Ok(2));
/// assert_eq!(d.pop_right(), Ok(1));
/// assert_eq!(d.pop_left(), Err(Error::EmptyCollection));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Deque<T> {
    elems: VecDeque<T>,
}

impl<T> Deque<T> {
    /// Creates an empty deque.
    pub fn new() -> Self {
        Deque {
            elems: VecDeque::new(),
        }
    }

    /// Adds `value` at the left end, making it the new front.
    pub fn push_left(&mut self, value: T) {
        self.elems.push_front(value);
    }

    /// Adds `value` at the right end, making it the new back.
    pub fn push_right(&mut self, value: T) {
        self.elems.push_back(value);
    }

    /// Removes and returns the front value.
    pub fn pop_left(&mut self) -> Result<T> {
        self.elems.pop_front().ok_or(Error::EmptyCollection)
    }

    /// Removes and returns the back value.
    pub fn pop_right(&mut self) -> Result<T> {
        self.elems.pop_back().ok_or(Error::EmptyCollection)
    }

    /// Returns a reference to the front value without removing it.
    pub fn peek_left(&self) -> Result<&T> {
        self.elems.front().ok_or(Error::EmptyCollection)
    }

    /// Returns a reference to the back value without removing it.
    pub fn peek_right(&self) -> Result<&T> {
        self.elems.back().ok_or(Error::EmptyCollection)
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Number of values in the deque.
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// Iterates from left to right.
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, T> {
        self.elems.iter()
    }
}

impl<T> Default for Deque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for Deque<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.elems.iter()).finish()
    }
}

/// Builds a deque whose left-to-right order is the vector's order.
impl<T> From<Vec<T>> for Deque<T> {
    fn from(v: Vec<T>) -> Self {
        Deque { elems: v.into() }
    }
}

impl<T> FromIterator<T> for Deque<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Deque {
            elems: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Deque<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.elems.extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a Deque<T> {
    type Item = &'a T;
    type IntoIter = std::collections::vec_deque::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
