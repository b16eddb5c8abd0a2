//! An ordered map implemented with an AVL tree.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::cursor::{Branch, Cursor};
#[cfg(any(test, feature = "consistency_check"))]
use crate::cursor::{subtree_count, subtree_height};

/// An ordered map implemented with an AVL tree.
///
/// Keys are kept in ascending order and every lookup, insert and removal
/// runs in O(log n). Keys must form a strict total order through their
/// `Ord` implementation; the tree's invariants are undefined for a
/// lawless ordering.
///
/// ```
/// use avlmap::AvlMap;
/// let mut map = AvlMap::new();
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.get(&1).is_none());
/// ```
pub struct AvlMap<K: Ord, V> {
    root: Link<K, V>,
    num_nodes: usize,
}

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
    parent: Link<K, V>,
    height: usize,
}

type NodePtr<K, V> = NonNull<Node<K, V>>;
type Link<K, V> = Option<NodePtr<K, V>>;
type LinkPtr<K, V> = NonNull<Link<K, V>>;

/// Where a key lives, or would live, in the tree.
enum Slot<K, V> {
    /// The key is present at this node.
    Occupied(NodePtr<K, V>),
    /// The key is absent; a new leaf goes into this child link,
    /// below this parent.
    Vacant(Link<K, V>, LinkPtr<K, V>),
}

/// An iterator over the entries of a map in ascending key order.
pub struct Iter<'a, K, V> {
    cursor: Cursor<Node<K, V>>,
    marker: PhantomData<&'a Node<K, V>>,
}

/// An owning iterator over the entries of a map in ascending key order.
pub struct IntoIter<K, V> {
    cursor: Cursor<Node<K, V>>,
}

impl<K: Ord, V> AvlMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the height of the tree in edges: 0 for an empty map and
    /// for a map with a single element.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn height(&self) -> usize {
        match self.root {
            None => 0,
            Some(root_ptr) => unsafe { root_ptr.as_ref().height },
        }
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        // The cursor reads a node's right link before handing the node
        // over, so each produced node can be freed immediately.
        let mut cursor = Cursor::over(self.root.take());
        while let Some(node_ptr) = cursor.advance() {
            unsafe { Node::destroy(node_ptr) };
        }
        self.num_nodes = 0;
    }

    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form *must* match the ordering on the
    /// key type.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key)
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }

    /// Returns true if the map contains a value for the given key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key was already present its value is overwritten in place,
    /// without restructuring the tree, and the previous value is
    /// returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.find_slot(&key) {
            Slot::Occupied(node_ptr) => {
                let old = unsafe { mem::replace(&mut (*node_ptr.as_ptr()).value, value) };
                Some(old)
            }
            Slot::Vacant(parent, mut link_ptr) => {
                unsafe {
                    *link_ptr.as_mut() = Some(Node::create(parent, key, value));
                }
                self.num_nodes += 1;
                self.rebalance_insert(parent);
                None
            }
        }
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key-value pair
    /// if the key was previously in the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_ptr = self.find(key)?;
        debug_assert!(self.num_nodes >= 1);
        self.detach_node(node_ptr);
        self.num_nodes -= 1;
        let node = *unsafe { Box::from_raw(node_ptr.as_ptr()) };
        Some((node.key, node.value))
    }

    /// Builds a map from a sequence of key-value pairs, resolving
    /// repeated keys with `merge`.
    ///
    /// For a pair whose key is already present, `merge` is called with
    /// the value present in the map and the new value and returns the
    /// value to keep.
    ///
    /// ```
    /// use avlmap::AvlMap;
    /// let pairs = [(1, String::from("a")), (1, String::from("b"))];
    /// let map = AvlMap::from_iter_merge(pairs, |present, new| present + &new);
    /// assert_eq!(map.get(&1), Some(&String::from("ab")));
    /// ```
    pub fn from_iter_merge<I, F>(iter: I, mut merge: F) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        F: FnMut(V, V) -> V,
    {
        let mut map = Self::new();
        for (key, value) in iter {
            match map.remove_entry(&key) {
                Some((key, present)) => {
                    let kept = merge(present, value);
                    map.insert(key, kept);
                }
                None => {
                    map.insert(key, value);
                }
            }
        }
        map
    }

    /// Gets an iterator over the entries of the map in ascending key
    /// order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            cursor: Cursor::over(self.root),
            marker: PhantomData,
        }
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        unsafe {
            // Check root link
            if let Some(root_ptr) = self.root {
                assert!(root_ptr.as_ref().parent.is_none());
            }

            // Check per-node invariants
            let mut pending: Vec<NodePtr<K, V>> = Vec::new();
            if let Some(root_ptr) = self.root {
                pending.push(root_ptr);
            }
            while let Some(node_ptr) = pending.pop() {
                let mut height = 0;
                let mut left_height = 0;
                let mut right_height = 0;

                // Check link for left child node
                if let Some(left_ptr) = node_ptr.as_ref().left {
                    assert!(left_ptr.as_ref().parent == Some(node_ptr));
                    assert!(left_ptr.as_ref().key < node_ptr.as_ref().key);
                    left_height = left_ptr.as_ref().height + 1;
                    height = std::cmp::max(height, left_height);
                    pending.push(left_ptr);
                }

                // Check link for right child node
                if let Some(right_ptr) = node_ptr.as_ref().right {
                    assert!(right_ptr.as_ref().parent == Some(node_ptr));
                    assert!(right_ptr.as_ref().key > node_ptr.as_ref().key);
                    right_height = right_ptr.as_ref().height + 1;
                    height = std::cmp::max(height, right_height);
                    pending.push(right_ptr);
                }

                // Check height cache
                assert_eq!(node_ptr.as_ref().height, height);

                // Check AVL condition (near balance)
                assert!(left_height <= right_height + 1);
                assert!(right_height <= left_height + 1);
            }

            // Check that the in-order walk visits strictly ascending keys
            let mut cursor = Cursor::over(self.root);
            let mut previous: Link<K, V> = None;
            while let Some(node_ptr) = cursor.advance() {
                if let Some(previous_ptr) = previous {
                    assert!(previous_ptr.as_ref().key < node_ptr.as_ref().key);
                }
                previous = Some(node_ptr);
            }
            assert!(cursor.is_exhausted());

            // Check cached count and height against recomputation
            assert_eq!(subtree_count(self.root), self.num_nodes);
            assert_eq!(subtree_height(self.root), self.height());
        }
    }

    fn find<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match key.cmp(node_ptr.as_ref().key.borrow()) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().left,
                    Ordering::Greater => node_ptr.as_ref().right,
                }
            }
        }
        current
    }

    fn find_slot(&mut self, key: &K) -> Slot<K, V> {
        let mut parent: Link<K, V> = None;
        let mut link_ptr: LinkPtr<K, V> = unsafe { LinkPtr::new_unchecked(&mut self.root) };
        unsafe {
            while let Some(mut node_ptr) = *link_ptr.as_ref() {
                match key.cmp(&node_ptr.as_ref().key) {
                    Ordering::Equal => return Slot::Occupied(node_ptr),
                    Ordering::Less => {
                        parent = Some(node_ptr);
                        link_ptr = LinkPtr::new_unchecked(&mut node_ptr.as_mut().left);
                    }
                    Ordering::Greater => {
                        parent = Some(node_ptr);
                        link_ptr = LinkPtr::new_unchecked(&mut node_ptr.as_mut().right);
                    }
                }
            }
        }
        Slot::Vacant(parent, link_ptr)
    }

    /// Unlinks a node from the tree and restores balance, leaving the
    /// node itself untouched for the caller to reclaim.
    fn detach_node(&mut self, node_ptr: NodePtr<K, V>) {
        unsafe {
            // Check if node to-unlink has a right sub tree
            if let Some(mut successor_ptr) = node_ptr.as_ref().right {
                // The in-order successor is the leftmost node of the
                // right sub tree
                let mut successor_parent_ptr = node_ptr;
                while let Some(left_ptr) = successor_ptr.as_ref().left {
                    successor_parent_ptr = successor_ptr;
                    successor_ptr = left_ptr;
                }

                // Successor is stem or leaf, unlink from tree
                debug_assert!(successor_ptr.as_ref().left.is_none());
                if successor_parent_ptr.as_ref().left == Some(successor_ptr) {
                    successor_parent_ptr.as_mut().left = successor_ptr.as_ref().right;
                } else {
                    successor_parent_ptr.as_mut().right = successor_ptr.as_ref().right;
                }
                if let Some(mut right_ptr) = successor_ptr.as_ref().right {
                    right_ptr.as_mut().parent = successor_ptr.as_ref().parent;
                }

                // Replace node to-unlink by its successor (up to 6 links)
                successor_ptr.as_mut().left = node_ptr.as_ref().left;
                if let Some(mut left_ptr) = node_ptr.as_ref().left {
                    left_ptr.as_mut().parent = Some(successor_ptr);
                }

                successor_ptr.as_mut().right = node_ptr.as_ref().right;
                if let Some(mut right_ptr) = node_ptr.as_ref().right {
                    right_ptr.as_mut().parent = Some(successor_ptr);
                }

                successor_ptr.as_mut().parent = node_ptr.as_ref().parent;
                match node_ptr.as_ref().parent {
                    None => self.root = Some(successor_ptr),
                    Some(mut parent_ptr) => {
                        if parent_ptr.as_ref().left == Some(node_ptr) {
                            parent_ptr.as_mut().left = Some(successor_ptr);
                        } else {
                            parent_ptr.as_mut().right = Some(successor_ptr);
                        }
                    }
                }

                // The successor's former parent might be out of balance now
                let mut rebalance_from = successor_parent_ptr;
                if rebalance_from == node_ptr {
                    // Former parent is the unlinked node itself, which has
                    // been replaced by the successor
                    rebalance_from = successor_ptr;
                }
                self.rebalance(Some(rebalance_from));
            } else {
                // Node to-unlink is stem or leaf, unlink from tree
                debug_assert!(node_ptr.as_ref().right.is_none());
                if let Some(mut left_ptr) = node_ptr.as_ref().left {
                    left_ptr.as_mut().parent = node_ptr.as_ref().parent;
                }
                match node_ptr.as_ref().parent {
                    None => self.root = node_ptr.as_ref().left,
                    Some(mut parent_ptr) => {
                        if parent_ptr.as_ref().left == Some(node_ptr) {
                            parent_ptr.as_mut().left = node_ptr.as_ref().left;
                        } else {
                            parent_ptr.as_mut().right = node_ptr.as_ref().left;
                        }
                        // Parent node might be out of balance now
                        self.rebalance(Some(parent_ptr));
                    }
                }
            }
        }
    }

    fn left_height(node_ptr: NodePtr<K, V>) -> usize {
        unsafe {
            match node_ptr.as_ref().left {
                None => 0,
                Some(left_ptr) => left_ptr.as_ref().height + 1,
            }
        }
    }

    fn right_height(node_ptr: NodePtr<K, V>) -> usize {
        unsafe {
            match node_ptr.as_ref().right {
                None => 0,
                Some(right_ptr) => right_ptr.as_ref().height + 1,
            }
        }
    }

    /// Balance factor: left sub tree height minus right sub tree height.
    fn balance_of(node_ptr: NodePtr<K, V>) -> isize {
        Self::left_height(node_ptr) as isize - Self::right_height(node_ptr) as isize
    }

    fn adjust_height(mut node_ptr: NodePtr<K, V>) {
        unsafe {
            node_ptr.as_mut().height =
                std::cmp::max(Self::left_height(node_ptr), Self::right_height(node_ptr));
        }
    }

    fn rotate_left(&mut self, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            if let Some(mut right_ptr) = node_ptr.as_ref().right {
                node_ptr.as_mut().right = right_ptr.as_ref().left;
                if let Some(mut right_left_ptr) = right_ptr.as_mut().left {
                    right_left_ptr.as_mut().parent = Some(node_ptr);
                }

                right_ptr.as_mut().parent = node_ptr.as_ref().parent;
                match node_ptr.as_ref().parent {
                    None => self.root = Some(right_ptr),
                    Some(mut parent_ptr) => {
                        if parent_ptr.as_ref().left == Some(node_ptr) {
                            parent_ptr.as_mut().left = Some(right_ptr);
                        } else {
                            parent_ptr.as_mut().right = Some(right_ptr);
                        }
                    }
                }

                right_ptr.as_mut().left = Some(node_ptr);
                node_ptr.as_mut().parent = Some(right_ptr);

                Self::adjust_height(node_ptr);
                Self::adjust_height(right_ptr);
            }
        }
    }

    fn rotate_right(&mut self, mut node_ptr: NodePtr<K, V>) {
        unsafe {
            if let Some(mut left_ptr) = node_ptr.as_ref().left {
                node_ptr.as_mut().left = left_ptr.as_ref().right;
                if let Some(mut left_right_ptr) = left_ptr.as_ref().right {
                    left_right_ptr.as_mut().parent = Some(node_ptr);
                }

                left_ptr.as_mut().parent = node_ptr.as_ref().parent;
                match node_ptr.as_ref().parent {
                    None => self.root = Some(left_ptr),
                    Some(mut parent_ptr) => {
                        if parent_ptr.as_ref().left == Some(node_ptr) {
                            parent_ptr.as_mut().left = Some(left_ptr);
                        } else {
                            parent_ptr.as_mut().right = Some(left_ptr);
                        }
                    }
                }

                left_ptr.as_mut().right = Some(node_ptr);
                node_ptr.as_mut().parent = Some(left_ptr);

                Self::adjust_height(node_ptr);
                Self::adjust_height(left_ptr);
            }
        }
    }

    /// Rebalances nodes starting from the given position up to the root
    /// node. Every ancestor of a structural change must be visited in
    /// bottom-up order, since a rotation changes the height a node's own
    /// parent will be judged by.
    fn rebalance(&mut self, start_from: Link<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let parent = unsafe { node_ptr.as_ref().parent };
            self.rebalance_node(node_ptr);
            current = parent;
        }
    }

    /// Rebalances nodes starting from the given position up to the root
    /// node, stopping after the first rotation. A single insert grows at
    /// most one sub tree by one, and the first rotation restores that sub
    /// tree to its previous height, so no ancestor above it can be out of
    /// balance.
    fn rebalance_insert(&mut self, start_from: Link<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            let parent = unsafe { node_ptr.as_ref().parent };
            let did_rotate = self.rebalance_node(node_ptr);
            if did_rotate {
                break;
            }
            current = parent;
        }
    }

    /// Restores the AVL condition at the given node if necessary and
    /// adjusts its cached height. The incoming imbalance never exceeds
    /// two, which always holds after a single structural update; one or
    /// two rotations suffice for all four heavy cases.
    /// Returns whether a rotation took place.
    fn rebalance_node(&mut self, node_ptr: NodePtr<K, V>) -> bool {
        let balance = Self::balance_of(node_ptr);
        debug_assert!((-2..=2).contains(&balance));
        if balance > 1 {
            // Left-heavy; a right-heavy left child needs a double rotation
            let left_ptr = unsafe { node_ptr.as_ref().left }.unwrap();
            if Self::balance_of(left_ptr) < 0 {
                self.rotate_left(left_ptr);
            }
            self.rotate_right(node_ptr);
            true
        } else if balance < -1 {
            // Right-heavy; a left-heavy right child needs a double rotation
            let right_ptr = unsafe { node_ptr.as_ref().right }.unwrap();
            if Self::balance_of(right_ptr) > 0 {
                self.rotate_right(right_ptr);
            }
            self.rotate_left(node_ptr);
            true
        } else {
            Self::adjust_height(node_ptr);
            false
        }
    }
}

impl<K: Ord, V> Drop for AvlMap<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Ord, V> Default for AvlMap<K, V> {
    /// Creates an empty map.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlMap<K, V> {
    /// Builds a map from a sequence of key-value pairs.
    /// For repeated keys the last value wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V: PartialEq> PartialEq for AvlMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Ord, V: Eq> Eq for AvlMap<K, V> {}

impl<'a, K: Ord, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V> IntoIterator for AvlMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(mut self) -> Self::IntoIter {
        let root = self.root.take();
        self.num_nodes = 0;
        IntoIter {
            cursor: Cursor::over(root),
        }
    }
}

impl<K, V> Branch for Node<K, V> {
    fn left(&self) -> Option<NonNull<Self>> {
        self.left
    }

    fn right(&self) -> Option<NonNull<Self>> {
        self.right
    }
}

impl<K, V> Node<K, V> {
    fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
        });
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    unsafe fn destroy(node_ptr: NodePtr<K, V>) {
        drop(Box::from_raw(node_ptr.as_ptr()));
    }
}

// Auto derived clone would demand K: Clone and V: Clone, which cloning
// the traversal position does not need.
impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            cursor: self.cursor.clone(),
            marker: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.advance().map(|node_ptr| {
            let node = unsafe { &*node_ptr.as_ptr() };
            (&node.key, &node.value)
        })
    }
}

impl<'a, K, V> FusedIterator for Iter<'a, K, V> {}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);
    fn next(&mut self) -> Option<Self::Item> {
        // The cursor has already stepped past this node, so it can be
        // reclaimed here while its right sub tree lives on in the stack.
        self.cursor.advance().map(|node_ptr| {
            let node = *unsafe { Box::from_raw(node_ptr.as_ptr()) };
            (node.key, node.value)
        })
    }
}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V> Drop for IntoIter<K, V> {
    fn drop(&mut self) {
        while self.next().is_some() {}
    }
}
