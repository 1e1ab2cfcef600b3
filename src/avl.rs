use crate::deque::Deque;
use crate::error::{Error, Result};
use std::borrow::Borrow;
use std::cmp::Ordering::*;
use std::fmt::{Debug, Formatter};
use std::iter::FusedIterator;
use std::mem::replace;
use tracing::{debug, trace};

type Link<K, V> = Option<Box<Node<K, V>>>;

/// A node of an [`AvlTree`] together with the subtree below it.
///
/// Nodes are created only by insertion.  They are handed out by reference from
/// [`AvlTree::find`], [`AvlTree::inorder`] and [`AvlTree::level_order`] so
/// callers can inspect both the entry and the shape of the tree around it.
pub struct Node<K, V> {
    key: K,
    val: V,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn leaf(key: K, val: V) -> Box<Self> {
        Self::boxed(key, val, None, None)
    }

    fn boxed(key: K, val: V, left: Link<K, V>, right: Link<K, V>) -> Box<Self> {
        Box::new(Node {
            key,
            val,
            left,
            right,
        })
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.val
    }

    /// The subtree of lesser keys, if any.
    pub fn left(&self) -> Option<&Node<K, V>> {
        self.left.as_deref()
    }

    /// The subtree of greater keys, if any.
    pub fn right(&self) -> Option<&Node<K, V>> {
        self.right.as_deref()
    }

    /// Height of the subtree rooted here.  A leaf has height 0.
    ///
    /// Heights are not stored; each call walks the whole subtree.
    pub fn height(&self) -> isize {
        1 + height(&self.left).max(height(&self.right))
    }

    /// The "balance factor": left height minus right height.  Positive values
    /// mean the node is left-heavy.
    pub fn balance(&self) -> isize {
        height(&self.left) - height(&self.right)
    }
}

impl<K: Clone, V: Clone> Clone for Node<K, V> {
    fn clone(&self) -> Self {
        Node {
            key: self.key.clone(),
            val: self.val.clone(),
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

impl<K: Debug, V: Debug> Debug for Node<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "(ht: {} {{{:?}: {:?}}} ",
            self.height(),
            self.key,
            self.val
        ))?;

        match &self.left {
            None => f.write_str(".")?,
            Some(lf) => lf.fmt(f)?,
        }

        f.write_str(" ")?;

        match &self.right {
            None => f.write_str(".")?,
            Some(rt) => rt.fmt(f)?,
        }

        f.write_str(")")
    }
}

fn height<K, V>(link: &Link<K, V>) -> isize {
    link.as_ref().map_or(-1, |n| n.height())
}

fn rot_rt<K, V>(mut a: Box<Node<K, V>>) -> Box<Node<K, V>> {
    // We want the following transformation:
    //    a(b(x, y), z)   =>   b(x, a(y, z))
    // x and z retain the same parents.
    let mut b = match a.left.take() {
        Some(b) => b,
        None => return a,
    };

    trace!("rotating right");

    // move y from b to a
    a.left = b.right.take();

    // move a into b
    b.right = Some(a);
    b
}

fn rot_lf<K, V>(mut a: Box<Node<K, V>>) -> Box<Node<K, V>> {
    // We want the following transformation:
    //    a(x, b(y, z))   =>   b(a(x, y), z)
    // x and z retain the same parents.
    let mut b = match a.right.take() {
        Some(b) => b,
        None => return a,
    };

    trace!("rotating left");

    // move y from b to a
    a.right = b.left.take();

    // make a be b's left child
    b.left = Some(a);
    b
}

// Restores balance at a node whose balance factor is within [-2, 2] and whose
// children are balanced, using at most one single or double rotation.
fn restore<K, V>(mut n: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let bal = n.balance();

    if bal > 1 {
        if n.left.as_ref().is_some_and(|lf| lf.balance() < 0) {
            n.left = n.left.take().map(rot_lf);
        }
        rot_rt(n)
    } else if bal < -1 {
        if n.right.as_ref().is_some_and(|rt| rt.balance() > 0) {
            n.right = n.right.take().map(rot_rt);
        }
        rot_lf(n)
    } else {
        n
    }
}

// Rebalances a node whose children are balanced.  Only grafting a subtree
// during deletion can leave a node more than two levels out of balance; such
// nodes are rebuilt with a join.
fn rebalance<K, V>(n: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let bal = n.balance();
    if (-2..=2).contains(&bal) {
        restore(n)
    } else {
        trace!(bal, "rejoining unbalanced node");
        let Node {
            key,
            val,
            left,
            right,
        } = *n;
        join(left, key, val, right)
    }
}

fn rebalance_link<K, V>(link: &mut Link<K, V>) {
    if let Some(n) = link.take() {
        *link = Some(rebalance(n));
    }
}

// Creates a merge of disjoint balanced trees and an entry that divides them.
// Prereq: left.last_key() < key < right.first_key()
fn join<K, V>(
    left: Link<K, V>,
    key: K,
    val: V,
    right: Link<K, V>,
) -> Box<Node<K, V>> {
    let bal = height(&left) - height(&right);
    match (left, right) {
        (Some(lf), right) if bal > 1 => join_rt(lf, key, val, right),
        (left, Some(rt)) if bal < -1 => join_lf(left, key, val, rt),
        (left, right) => Node::boxed(key, val, left, right),
    }
}

// Joins by descending the right spine of the taller left tree.
fn join_rt<K, V>(
    mut t: Box<Node<K, V>>,
    key: K,
    val: V,
    right: Link<K, V>,
) -> Box<Node<K, V>> {
    let c = t.right.take();
    let c_ht = height(&c);
    let joined = match c {
        Some(c) if c_ht > height(&right) + 1 => join_rt(c, key, val, right),
        c => Node::boxed(key, val, c, right),
    };
    t.right = Some(joined);
    restore(t)
}

// Joins by descending the left spine of the taller right tree.
fn join_lf<K, V>(
    left: Link<K, V>,
    key: K,
    val: V,
    mut t: Box<Node<K, V>>,
) -> Box<Node<K, V>> {
    let c = t.left.take();
    let c_ht = height(&c);
    let joined = match c {
        Some(c) if c_ht > height(&left) + 1 => join_lf(left, key, val, c),
        c => Node::boxed(key, val, left, c),
    };
    t.left = Some(joined);
    restore(t)
}

// Places a new leaf below link and rebalances each node on the way back up.
// Refuses keys that are already present, leaving the tree untouched.
fn place<K: Ord, V>(link: &mut Link<K, V>, new: Box<Node<K, V>>) -> Result<()> {
    let n = match link.as_mut() {
        None => {
            *link = Some(new);
            return Ok(()); // *** EARLY RETURN ***
        }
        Some(n) => n,
    };

    match new.key.cmp(&n.key) {
        Less => place(&mut n.left, new)?,
        Greater => place(&mut n.right, new)?,
        Equal => return Err(Error::KeyAlreadyExists),
    }

    rebalance_link(link);
    Ok(())
}

// Places a whole subtree below link by the position of its root key, then
// rebalances each node on the way back up.  The keys of sub must not
// interleave with the keys under link.
fn graft<K: Ord, V>(link: &mut Link<K, V>, sub: Box<Node<K, V>>) {
    match link.as_mut() {
        None => *link = Some(sub),
        Some(n) => {
            if sub.key < n.key {
                graft(&mut n.left, sub);
            } else {
                graft(&mut n.right, sub);
            }
            rebalance_link(link);
        }
    }
}

// Removes key from the tree at link and returns its entry.
//
// The matching node is replaced by its left subtree, and its right subtree is
// then grafted below that.  Without a left subtree, the right subtree takes
// its place directly.
fn rm<K, V, Q>(link: &mut Link<K, V>, key: &Q) -> Result<(K, V)>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    let n = match link.as_mut() {
        None => return Err(Error::KeyNotFound), // *** EARLY RETURN ***
        Some(n) => n,
    };

    let entry = match key.cmp(n.key.borrow()) {
        Less => rm(&mut n.left, key)?,
        Greater => rm(&mut n.right, key)?,
        Equal => match link.take() {
            None => return Err(Error::KeyNotFound),
            Some(old) => {
                let Node {
                    key,
                    val,
                    left,
                    right,
                } = *old;

                *link = match (left, right) {
                    (Some(lf), Some(rt)) => {
                        trace!("grafting right subtree below promoted left");
                        let mut promoted = Some(lf);
                        graft(&mut promoted, rt);
                        promoted
                    }
                    (Some(lf), None) => Some(lf),
                    (None, right) => right,
                };

                (key, val)
            }
        },
    };

    rebalance_link(link);
    Ok(entry)
}

fn collect_inorder<'a, K, V>(
    link: &'a Link<K, V>,
    out: &mut Vec<&'a Node<K, V>>,
) {
    if let Some(n) = link.as_deref() {
        collect_inorder(&n.left, out);
        out.push(n);
        collect_inorder(&n.right, out);
    }
}

// Returns the number of nodes, the height and the greatest key of the tree at
// link, or a description of the first invariant violation.
#[allow(clippy::type_complexity)]
fn chk<'a, K: Ord, V>(
    link: &'a Link<K, V>,
    greatest: Option<&'a K>,
) -> std::result::Result<(usize, isize, Option<&'a K>), String> {
    let n = match link.as_deref() {
        None => return Ok((0, -1, greatest)),
        Some(n) => n,
    };

    // is our node in order with left-side ancestors?
    if greatest.is_some_and(|k| k >= &n.key) {
        return Err("node key is not greater than its predecessors".to_string());
    }

    // are our left descendents okay, and all less than us?
    let (lf_len, lf_ht, greatest) = chk(&n.left, greatest)?;
    if greatest.is_some_and(|k| k >= &n.key) {
        return Err("left subtree holds a key not less than its root".to_string());
    }

    // are our right descendents okay?
    let (rt_len, rt_ht, greatest) = chk(&n.right, Some(&n.key))?;

    // are we balanced?
    let bal = lf_ht - rt_ht;
    if !(-1..=1).contains(&bal) {
        return Err(format!("node has balance factor {bal}"));
    }

    Ok((lf_len + rt_len + 1, 1 + lf_ht.max(rt_ht), greatest))
}

/// An ordered map from keys to values stored in an AVL tree.
///
/// [AVL trees](https://en.wikipedia.org/wiki/AVL_tree) keep the heights of the
/// two subtrees of every node within one of each other, so lookups, insertions
/// and deletions visit O(log n) nodes.  Each node exclusively owns its
/// children; there are no parent links and no shared nodes.
///
/// Insertion refuses duplicate keys rather than replacing the stored value;
/// use [`update`](#method.update) to change the value of a present key.
///
/// Deletion replaces the removed node with its left subtree and grafts the
/// removed node's right subtree below it, rebalancing along the way.  The
/// shapes this produces differ from textbook successor-based deletion, and
/// callers inspecting [`level_order`](#method.level_order) can rely on them.
///
/// # Examples
/// ```
/// use avl_kv::{AvlTree, Error};
///
/// let mut t = AvlTree::new();
/// t.insert(20, "twenty").unwrap();
/// t.insert(4, "four").unwrap();
/// t.insert(15, "fifteen").unwrap();
///
/// let keys: Vec<_> = t.level_order().iter().map(|n| *n.key()).collect();
/// assert_eq!(keys, [15, 4, 20]);
///
/// assert_eq!(t.insert(4, "again"), Err(Error::KeyAlreadyExists));
/// assert_eq!(t.delete(&4), Ok("four"));
/// assert_eq!(t.find(&4).err(), Some(Error::KeyNotFound));
/// ```
#[derive(Clone)]
pub struct AvlTree<K, V> {
    len: usize,
    root: Link<K, V>,
}

impl<K: Debug, V: Debug> Debug for AvlTree<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.root {
            None => f.write_str("AvlTree(EMPTY)"),
            Some(n) => {
                // use Node's Debug formatter
                f.write_fmt(format_args!("AvlTree(#{}, {:?})", self.len, n))
            }
        }
    }
}

impl<K, V> AvlTree<K, V> {
    /// Creates a new, empty tree.
    /// # Examples
    /// ```
    /// use avl_kv::AvlTree;
    /// let t: AvlTree<usize, usize> = AvlTree::new();
    /// assert!(t.is_empty());
    /// ```
    pub fn new() -> Self {
        AvlTree { len: 0, root: None }
    }

    /// Creates a tree holding a single entry.
    pub fn new_root(key: K, val: V) -> Self {
        AvlTree {
            len: 1,
            root: Some(Node::leaf(key, val)),
        }
    }

    /// Drops all entries.  Clearing an empty tree does nothing.
    pub fn clear(&mut self) {
        self.len = 0;
        self.root = None;
    }

    /// Returns the number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the height of the tree: -1 when empty, 0 for a single entry.
    pub fn height(&self) -> isize {
        height(&self.root)
    }

    /// Returns the root node, if the tree is not empty.
    pub fn root(&self) -> Option<&Node<K, V>> {
        self.root.as_deref()
    }

    /// Returns the nodes in ascending key order (left, self, right).
    ///
    /// The whole sequence is materialized.  See [`iter`](#method.iter) for a
    /// lazy alternative over the entries.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::AvlTree;
    ///
    /// let t = AvlTree::from([(5, 'e'), (6, 'f'), (2, 'b'), (10, 'j')]);
    /// let keys: Vec<_> = t.inorder().iter().map(|n| *n.key()).collect();
    /// assert_eq!(keys, [2, 5, 6, 10]);
    /// ```
    pub fn inorder(&self) -> Vec<&Node<K, V>> {
        let mut out = Vec::with_capacity(self.len);
        collect_inorder(&self.root, &mut out);
        out
    }

    /// Returns the nodes breadth first: grouped by depth starting at the root,
    /// left to right within a depth.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::AvlTree;
    ///
    /// let t = AvlTree::from([(2, ()), (1, ()), (4, ()), (3, ()), (5, ())]);
    /// let keys: Vec<_> = t.level_order().iter().map(|n| *n.key()).collect();
    /// assert_eq!(keys, [2, 1, 4, 3, 5]);
    /// ```
    pub fn level_order(&self) -> Vec<&Node<K, V>> {
        let mut out = Vec::with_capacity(self.len);
        let mut work = match self.root.as_deref() {
            None => return out,
            Some(n) => Deque::from(vec![n]),
        };

        while !work.is_empty() {
            let Ok(n) = work.pop_left() else { break };
            out.push(n);
            if let Some(lf) = n.left.as_deref() {
                work.push_right(lf);
            }
            if let Some(rt) = n.right.as_deref() {
                work.push_right(rt);
            }
        }

        out
    }

    /// Creates an iterator over the entries, sorted by key.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::AvlTree;
    ///
    /// let t = AvlTree::from([(0, 1), (1, 2), (2, 3)]);
    /// for (i, (k, v)) in t.iter().enumerate() {
    ///     assert_eq!(&i, k);
    ///     assert_eq!(&(i + 1), v);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut work = Vec::new();
        let mut curr = self.root.as_deref();
        while let Some(n) = curr {
            work.push(n);
            curr = n.left.as_deref();
        }

        Iter {
            work,
            len: self.len,
        }
    }

    /// Produces an iterator over the keys, in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|p| p.0)
    }

    /// Produces an iterator over the values, ordered by their keys.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|p| p.1)
    }
}

impl<K: Ord, V> AvlTree<K, V> {
    /// Builds a tree by inserting `keys[i], values[i]` pairs in order.
    ///
    /// If either sequence is empty the tree is empty.  Pairing stops at the end
    /// of the shorter sequence.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::{AvlTree, Error};
    ///
    /// let t = AvlTree::from_arrays([20, 4, 15], ["a", "b", "c"]).unwrap();
    /// assert_eq!(t.root().map(|n| *n.key()), Some(15));
    ///
    /// let dup = AvlTree::from_arrays([1, 1], [0, 0]);
    /// assert_eq!(dup.err(), Some(Error::KeyAlreadyExists));
    /// ```
    pub fn from_arrays<I, J>(keys: I, values: J) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        J: IntoIterator<Item = V>,
    {
        let mut t = Self::new();
        for (k, v) in keys.into_iter().zip(values) {
            t.insert(k, v)?;
        }
        Ok(t)
    }

    /// Inserts a new entry, rebalancing the tree as needed.
    ///
    /// Fails with [`Error::KeyAlreadyExists`] if `key` is present; the tree is
    /// unchanged in that case.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::{AvlTree, Error};
    ///
    /// let mut t = AvlTree::new();
    /// assert_eq!(t.insert(37, "a"), Ok(()));
    /// assert_eq!(t.insert(37, "b"), Err(Error::KeyAlreadyExists));
    /// assert_eq!(t.get(&37), Some(&"a"));
    /// ```
    pub fn insert(&mut self, key: K, val: V) -> Result<()> {
        match place(&mut self.root, Node::leaf(key, val)) {
            Ok(()) => {
                self.len += 1;
                Ok(())
            }
            Err(e) => {
                debug!("refused insertion of duplicate key");
                Err(e)
            }
        }
    }

    /// Removes the entry for `key` and returns its value.
    ///
    /// Fails with [`Error::KeyNotFound`] if `key` is absent.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::{AvlTree, Error};
    ///
    /// let mut t = AvlTree::from([(2, 'b'), (1, 'a'), (4, 'd'), (3, 'c'), (5, 'e')]);
    /// assert_eq!(t.delete(&1), Ok('a'));
    ///
    /// let keys: Vec<_> = t.level_order().iter().map(|n| *n.key()).collect();
    /// assert_eq!(keys, [4, 2, 5, 3]);
    ///
    /// assert_eq!(t.delete(&1), Err(Error::KeyNotFound));
    /// ```
    pub fn delete<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match rm(&mut self.root, key) {
            Ok((_, v)) => {
                self.len -= 1;
                Ok(v)
            }
            Err(e) => {
                debug!("no entry to delete");
                Err(e)
            }
        }
    }

    /// Returns the node holding `key`.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::{AvlTree, Error};
    ///
    /// let t = AvlTree::from([(5, 5), (6, 6), (2, 2), (1, 1)]);
    /// assert_eq!(t.find(&1).map(|n| *n.value()), Ok(1));
    /// assert_eq!(t.find(&99).err(), Some(Error::KeyNotFound));
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Result<&Node<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut curr = self.root.as_deref();
        while let Some(n) = curr {
            match key.cmp(n.key.borrow()) {
                Equal => return Ok(n),
                Less => curr = n.left.as_deref(),
                Greater => curr = n.right.as_deref(),
            }
        }

        Err(Error::KeyNotFound)
    }

    /// Replaces the value stored for `key` and returns the previous value.
    /// The tree's shape does not change.
    ///
    /// # Examples
    /// ```
    /// use avl_kv::{AvlTree, Error};
    ///
    /// let mut t = AvlTree::from([(1, 1), (2, 2)]);
    /// assert_eq!(t.update(&1, 99), Ok(1));
    /// assert_eq!(t.get(&1), Some(&99));
    /// assert_eq!(t.update(&3, 0), Err(Error::KeyNotFound));
    /// ```
    pub fn update<Q>(&mut self, key: &Q, val: V) -> Result<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.get_mut(key) {
            Some(v) => Ok(replace(v, val)),
            None => {
                debug!("no entry to update");
                Err(Error::KeyNotFound)
            }
        }
    }

    /// Returns a reference to the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).ok().map(|n| &n.val)
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut curr = self.root.as_deref_mut();
        while let Some(n) = curr {
            match key.cmp(n.key.borrow()) {
                Equal => return Some(&mut n.val),
                Less => curr = n.left.as_deref_mut(),
                Greater => curr = n.right.as_deref_mut(),
            }
        }

        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_ok()
    }

    /// Verifies the ordering and balance invariants and the entry count.
    ///
    /// Returns a description of the first violation found.
    pub fn check(&self) -> std::result::Result<(), String> {
        let (len, _, _) = chk(&self.root, None)?;
        if len != self.len {
            return Err(format!("tree holds {len} nodes but records {}", self.len));
        }
        Ok(())
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlTree<K, V> {}

impl<K, Q, V> std::ops::Index<&Q> for AvlTree<K, V>
where
    K: Borrow<Q> + Ord,
    Q: Ord + ?Sized,
{
    type Output = V;

    fn index(&self, index: &Q) -> &Self::Output {
        match self.get(index) {
            Some(v) => v,
            None => panic!("Key not found in AvlTree"),
        }
    }
}

/// Inserts the entries in order.  An entry whose key is already present is
/// dropped, so the first value seen for a key wins.
impl<K: Ord, V> Extend<(K, V)> for AvlTree<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut t = Self::new();
        t.extend(iter);
        t
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlTree<K, V> {
    fn from(vs: [(K, V); N]) -> Self {
        AvlTree::from_iter(vs)
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over the entries of an [`AvlTree`].
pub struct Iter<'a, K, V> {
    work: Vec<&'a Node<K, V>>,
    len: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.work.pop().map(|n| {
            self.len -= 1;
            let entry = (&n.key, &n.val);
            let mut curr = n.right.as_deref();
            while let Some(m) = curr {
                self.work.push(m);
                curr = m.left.as_deref();
            }
            entry
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

#[cfg(test)]
mod test {
    extern crate quickcheck;
    use super::*;
    use quickcheck::quickcheck;

    impl<K: Ord, V> AvlTree<K, V> {
        fn chk(&self) {
            if let Err(msg) = self.check() {
                panic!("invariant violated: {msg}");
            }
        }
    }

    fn level_keys<K: Clone, V>(t: &AvlTree<K, V>) -> Vec<K> {
        t.level_order().iter().map(|n| n.key().clone()).collect()
    }

    fn bal_test(vs: Vec<(u8, u32)>) {
        let mut t = AvlTree::new();
        for &(k, v) in vs.iter() {
            let _ = t.insert(k, v);
            t.chk();
        }
    }

    fn rm_test(vs: Vec<(i8, u32)>) {
        let mut t = AvlTree::new();
        let mut btree = std::collections::BTreeMap::new();

        for &(k, v) in vs.iter() {
            match k {
                1..=i8::MAX => {
                    let k = k % 32;
                    let expected = if btree.contains_key(&k) {
                        Err(Error::KeyAlreadyExists)
                    } else {
                        btree.insert(k, v);
                        Ok(())
                    };
                    assert_eq!(t.insert(k, v), expected);
                }

                0 | i8::MIN => (),

                _ => {
                    let k = -k % 32;
                    let expected = btree.remove(&k).ok_or(Error::KeyNotFound);
                    assert_eq!(t.delete(&k), expected);
                }
            }

            assert!(t.iter().cmp(btree.iter()).is_eq());
            t.chk();
        }
    }

    // systematically try deleting each element of t
    fn chk_all_removes(t: AvlTree<u8, u8>) {
        for (k, v) in t.iter() {
            let mut t2 = t.clone();
            assert_eq!(t2.delete(k), Ok(*v));
            t2.chk();
            assert_eq!(t2.find(k).err(), Some(Error::KeyNotFound));
            for (k2, v2) in t.iter().filter(|(k2, _)| k2 != &k) {
                assert_eq!(t2.get(k2), Some(v2));
            }
        }
    }

    #[test]
    fn rot_rt_test() {
        let a = Node::boxed(
            5,
            (),
            Some(Node::boxed(3, (), Some(Node::leaf(1, ())), Some(Node::leaf(4, ())))),
            Some(Node::leaf(7, ())),
        );
        let b = rot_rt(a);
        assert_eq!(b.key, 3);
        assert_eq!(b.left().map(|n| n.key), Some(1));
        let a = b.right().unwrap();
        assert_eq!(a.key, 5);
        assert_eq!(a.left().map(|n| n.key), Some(4));
        assert_eq!(a.right().map(|n| n.key), Some(7));
    }

    #[test]
    fn rot_lf_test() {
        let a = Node::boxed(
            1,
            (),
            Some(Node::leaf(0, ())),
            Some(Node::boxed(3, (), Some(Node::leaf(2, ())), Some(Node::leaf(4, ())))),
        );
        let b = rot_lf(a);
        assert_eq!(b.key, 3);
        assert_eq!(b.right().map(|n| n.key), Some(4));
        let a = b.left().unwrap();
        assert_eq!(a.key, 1);
        assert_eq!(a.left().map(|n| n.key), Some(0));
        assert_eq!(a.right().map(|n| n.key), Some(2));
    }

    #[test]
    fn rot_without_child_is_noop() {
        let n = rot_rt(Node::leaf(1, ()));
        assert_eq!(n.key, 1);
        let n = rot_lf(n);
        assert_eq!(n.key, 1);
        assert_eq!(n.height(), 0);
    }

    #[test]
    fn height_and_balance() {
        let t: AvlTree<u8, ()> = AvlTree::new();
        assert_eq!(t.height(), -1);

        let t = AvlTree::from([(2, ()), (1, ()), (4, ()), (3, ()), (5, ())]);
        assert_eq!(t.height(), 2);
        let root = t.root().unwrap();
        assert_eq!(root.balance(), -1);
        assert_eq!(root.left().map(|n| n.balance()), Some(0));
    }

    #[test]
    fn double_rotations() {
        // left-right
        let t = AvlTree::from([(20, ()), (4, ()), (8, ())]);
        assert_eq!(level_keys(&t), [8, 4, 20]);

        // right-left
        let t = AvlTree::from([(4, ()), (20, ()), (8, ())]);
        assert_eq!(level_keys(&t), [8, 4, 20]);
    }

    #[test]
    fn delete_grafts_right_subtree() {
        let mut t = AvlTree::from([(2, ()), (1, ()), (4, ()), (3, ()), (5, ())]);
        t.delete(&2).unwrap();
        assert_eq!(level_keys(&t), [4, 1, 5, 3]);
        t.chk();

        let mut t = AvlTree::from([(2, ()), (1, ()), (4, ()), (3, ()), (5, ())]);
        t.delete(&4).unwrap();
        assert_eq!(level_keys(&t), [2, 1, 3, 5]);
        t.chk();
    }

    #[test]
    fn delete_with_both_children() {
        let keys = [20, 4, 26, 3, 9, 21, 30, 2, 7, 11, 15];
        let mut t: AvlTree<_, _> = keys.iter().map(|&k| (k, ())).collect();
        t.delete(&9).unwrap();
        assert_eq!(level_keys(&t), [4, 3, 20, 2, 11, 26, 7, 15, 21, 30]);
        t.chk();
    }

    #[test]
    fn delete_graft_needs_join() {
        // the grafted subtree leaves the promoted root three levels out of
        // balance, which no single or double rotation repairs
        let keys = [37, 5, 17, 8, 32, 29];
        let mut t: AvlTree<_, _> = keys.iter().map(|&k| (k, ())).collect();
        assert_eq!(level_keys(&t), [17, 5, 32, 8, 29, 37]);
        t.delete(&17).unwrap();
        assert_eq!(level_keys(&t), [32, 8, 37, 5, 29]);
        t.chk();
    }

    #[test]
    fn join_restores_balance() {
        let lf: AvlTree<_, _> = (0..3).map(|k| (k, ())).collect();
        let rt: AvlTree<_, _> = (4..40).map(|k| (k, ())).collect();
        let joined = AvlTree {
            len: 40,
            root: Some(join(lf.root, 3, (), rt.root)),
        };
        joined.chk();
    }

    #[test]
    fn rm_each_test() {
        // build in order to encourage skewing
        let t: AvlTree<_, _> = (0..32).map(|x| (x, x + 100)).collect();
        chk_all_removes(t);

        // build in reverse order to encourage opposite skewing
        let t: AvlTree<_, _> = (0..32).rev().map(|x| (x, x + 100)).collect();
        chk_all_removes(t);
    }

    #[test]
    fn failed_ops_leave_tree_unchanged() {
        let mut t: AvlTree<_, _> = [5, 6, 2, 10, 12, 3, 1, 9]
            .iter()
            .map(|&k| (k, k))
            .collect();
        let before = level_keys(&t);

        assert_eq!(t.insert(10, 0), Err(Error::KeyAlreadyExists));
        assert_eq!(t.delete(&99), Err(Error::KeyNotFound));
        assert_eq!(t.update(&99, 0), Err(Error::KeyNotFound));

        assert_eq!(level_keys(&t), before);
        assert_eq!(t.get(&10), Some(&10));
        assert_eq!(t.len(), 8);
    }

    #[test]
    fn clear_test() {
        let mut t: AvlTree<_, _> = (0..10).map(|i| (i, ())).collect();
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert!(t.inorder().is_empty());
        t.clear();
        assert!(t.level_order().is_empty());
        t.chk();
    }

    #[test]
    fn iter_len_test() {
        let t: AvlTree<_, _> = (0..10).map(|i| (i, ())).collect();

        let mut iter = t.iter();
        let mut cnt = 10;
        while iter.next().is_some() {
            assert_eq!(iter.len(), cnt - 1);
            cnt -= 1;
        }
    }

    #[test]
    fn debug_fmt() {
        let t = AvlTree::from([(1, 'a'), (0, 'b'), (2, 'c')]);
        assert_eq!(
            format!("{:?}", t),
            "AvlTree(#3, (ht: 1 {1: 'a'} (ht: 0 {0: 'b'} . .) (ht: 0 {2: 'c'} . .)))"
        );
        let e: AvlTree<u8, u8> = AvlTree::new();
        assert_eq!(format!("{:?}", e), "AvlTree(EMPTY)");
    }

    #[test]
    fn bal_test_regr1() {
        bal_test(vec![(4, 0), (0, 0), (5, 0), (1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn bal_test_regr2() {
        bal_test(vec![(3, 0), (0, 0), (1, 0), (2, 0), (4, 0)]);
    }

    #[test]
    fn rm_test_regr1() {
        rm_test(vec![(101, 0), (100, 0), (1, 0), (-100, 0)]);
    }

    #[test]
    fn rm_test_regr2() {
        rm_test(vec![
            (31, 0),
            (14, 0),
            (1, 0),
            (15, 0),
            (32, 0),
            (16, 0),
            (17, 0),
            (-14, 0),
            (-31, 0),
        ]);
    }

    quickcheck! {
        fn qc_bal_test(vs: Vec<(u8, u32)>) -> () {
            bal_test(vs);
        }

        fn qc_rm_test(vs: Vec<(i8, u32)>) -> () {
            rm_test(vs);
        }

        fn qc_rm_test2(vs: Vec<(u8, u8)>) -> () {
            let t = vs.into_iter().collect();
            chk_all_removes(t);
        }

        fn qc_inorder_sorted(vs: Vec<(u16, u8)>) -> bool {
            let t: AvlTree<_, _> = vs.into_iter().collect();
            let keys: Vec<_> = t.inorder().iter().map(|n| *n.key()).collect();
            keys.len() == t.len() && keys.windows(2).all(|w| w[0] < w[1])
        }

        fn qc_level_order_visits_all(vs: Vec<(u16, u8)>) -> bool {
            let t: AvlTree<_, _> = vs.into_iter().collect();
            let mut keys: Vec<_> = t.level_order().iter().map(|n| *n.key()).collect();
            let root_first = keys.first() == t.root().map(|n| n.key());
            keys.sort();
            root_first && keys.iter().eq(t.keys())
        }
    }
}
