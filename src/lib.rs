//! An ordered key-value map implemented with an AVL tree.
//!
//! [`AvlMap`] keeps its entries sorted by key in a height-balanced binary
//! search tree, giving O(log n) lookup, insert and removal and ascending
//! in-order iteration driven by an explicit-stack cursor.
//!
//! ```
//! use avlmap::AvlMap;
//!
//! let mut map = AvlMap::new();
//! map.insert(2, "two");
//! map.insert(1, "one");
//! map.insert(3, "three");
//! assert_eq!(map.get(&2), Some(&"two"));
//!
//! for (key, value) in &map {
//!     println!("{key} => {value}");
//! }
//! ```

mod cursor;
mod map;

pub use map::{AvlMap, IntoIter, Iter};

#[cfg(test)]
mod tests;
