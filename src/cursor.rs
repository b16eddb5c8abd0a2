//! In-order traversal over any binary tree that exposes its child links.
//!
//! The cursor keeps the path from the root to the current position on an
//! explicit heap stack, so traversal never recurses and a step never
//! re-walks from the root. The map iterators, `clear` and the consistency
//! checks all drive their traversal through this one cursor.

use std::ptr::NonNull;

/// Read access to the child links of a binary tree node.
///
/// Implementors guarantee that the returned links point to live nodes of
/// the same tree for as long as the tree is not mutated.
pub(crate) trait Branch {
    fn left(&self) -> Option<NonNull<Self>>;
    fn right(&self) -> Option<NonNull<Self>>;
}

/// A resumable in-order (left-node-right) traversal position.
///
/// The stack holds (node, right subtree already taken) pairs for the
/// active path from the root down to the current position. An empty stack
/// means the traversal is exhausted; the position before the first
/// element of an empty tree looks the same, which is fine because a
/// cursor only ever moves forward.
///
/// The cursor reads nodes through raw links and must not outlive the tree
/// it was started on or survive any structural mutation of it. Callers
/// uphold this with lifetimes or by owning the nodes themselves.
pub(crate) struct Cursor<N: Branch> {
    stack: Vec<(NonNull<N>, bool)>,
}

impl<N: Branch> Cursor<N> {
    /// Creates a cursor positioned at the smallest element of the subtree
    /// under `root`.
    pub(crate) fn over(root: Option<NonNull<N>>) -> Self {
        let mut cursor = Self { stack: Vec::new() };
        cursor.push_left_spine(root);
        cursor
    }

    /// Moves the cursor one step forward and returns the node it stepped
    /// over, in ascending order. Returns `None` once the traversal is
    /// exhausted; further calls stay a no-op.
    pub(crate) fn advance(&mut self) -> Option<NonNull<N>> {
        let (node_ptr, right_taken) = self.stack.pop()?;
        if !right_taken {
            let right = unsafe { node_ptr.as_ref() }.right();
            self.push_left_spine(right);
        }
        Some(node_ptr)
    }

    /// Whether the traversal has produced its last element. This is the
    /// only meaningful comparison between cursor positions.
    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn is_exhausted(&self) -> bool {
        self.stack.is_empty()
    }

    // Push `link` and the chain of its left descendants. The deepest
    // entry ends up on top and is the next node in order.
    fn push_left_spine(&mut self, mut link: Option<NonNull<N>>) {
        while let Some(node_ptr) = link {
            self.stack.push((node_ptr, false));
            link = unsafe { node_ptr.as_ref() }.left();
        }
    }
}

// Auto derived clone would demand N: Clone, which the stack of raw links
// does not need.
impl<N: Branch> Clone for Cursor<N> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
        }
    }
}

/// Counts the nodes of the subtree under `root` by full traversal.
#[cfg(any(test, feature = "consistency_check"))]
pub(crate) fn subtree_count<N: Branch>(root: Option<NonNull<N>>) -> usize {
    let mut cursor = Cursor::over(root);
    let mut count = 0;
    while cursor.advance().is_some() {
        count += 1;
    }
    count
}

/// Recomputes the height of the subtree under `root` in edges.
/// An empty subtree and a single leaf both report 0.
#[cfg(any(test, feature = "consistency_check"))]
pub(crate) fn subtree_height<N: Branch>(root: Option<NonNull<N>>) -> usize {
    let mut max_depth = 0;
    let mut stack: Vec<(NonNull<N>, usize)> = Vec::new();
    if let Some(root_ptr) = root {
        stack.push((root_ptr, 0));
    }
    while let Some((node_ptr, depth)) = stack.pop() {
        max_depth = std::cmp::max(max_depth, depth);
        let node = unsafe { node_ptr.as_ref() };
        if let Some(left_ptr) = node.left() {
            stack.push((left_ptr, depth + 1));
        }
        if let Some(right_ptr) = node.right() {
            stack.push((right_ptr, depth + 1));
        }
    }
    max_depth
}
