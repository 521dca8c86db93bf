// mlodato, 20190318

use std::fmt::Debug;
use std::hash::Hash;

/// An opaque identity for an item registered in a [`World`](crate::World)
///
/// The world never inspects an ID beyond equality and hashing; `Debug` is used for error messages
/// and logging only.
pub trait ItemID: Copy + Clone + Hash + Eq + Debug {}

impl<T: Copy + Clone + Hash + Eq + Debug> ItemID for T {}
