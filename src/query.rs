// mlodato, 20261019

use super::geom::{Contact, Shape};
use super::index::{self, Cell, Footprint};
use super::traits::ItemID;
use super::world::Bucket;

use cgmath::BaseFloat;
use rustc_hash::{FxHashMap, FxHashSet};

use std::collections::hash_map;

/// Items in a single cell, in bucket order
pub struct CellItems<'a, ID> {
    items: std::slice::Iter<'a, ID>
}

impl<'a, ID> CellItems<'a, ID>
where
    ID: ItemID
{
    pub(crate) fn new(bucket: Option<&'a Bucket<ID>>) -> Self {
        let items: &'a [ID] = match bucket {
            Some(bucket) => bucket.as_slice(),
            None => &[]
        };
        Self{items: items.iter()}
    }
}

impl<'a, ID> Iterator for CellItems<'a, ID>
where
    ID: ItemID
{
    type Item = ID;

    fn next(&mut self) -> Option<ID> {
        self.items.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

/// Every non-empty cell, in unspecified order
pub struct PopulatedCells<'a, ID> {
    cells: hash_map::Keys<'a, Cell, Bucket<ID>>
}

impl<'a, ID> PopulatedCells<'a, ID> {
    pub(crate) fn new(buckets: &'a FxHashMap<Cell, Bucket<ID>>) -> Self {
        Self{cells: buckets.keys()}
    }
}

impl<'a, ID> Iterator for PopulatedCells<'a, ID> {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        self.cells.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cells.size_hint()
    }
}

/// Every registered item exactly once, in unspecified order
pub struct AllItems<'a, ID, S> {
    items: hash_map::Keys<'a, ID, Shape<S>>
}

impl<'a, ID, S> AllItems<'a, ID, S> {
    pub(crate) fn new(items: &'a FxHashMap<ID, Shape<S>>) -> Self {
        Self{items: items.keys()}
    }
}

impl<'a, ID, S> Iterator for AllItems<'a, ID, S>
where
    ID: ItemID
{
    type Item = ID;

    fn next(&mut self) -> Option<ID> {
        self.items.next().copied()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

/// Items whose shapes intersect a query shape
///
/// Candidate cells come from the query's footprint; each candidate item is tested at most once,
/// no matter how many of those cells it occupies. Traversal resumes from where the previous call
/// to `next` stopped, so the sequence cannot be restarted.
pub struct ShapeQuery<'a, ID, S>
where
    ID: ItemID,
    S: BaseFloat
{
    shape: Shape<S>,
    cells: Footprint<S>,
    bucket: std::slice::Iter<'a, ID>,
    buckets: &'a FxHashMap<Cell, Bucket<ID>>,
    items: &'a FxHashMap<ID, Shape<S>>,
    seen: FxHashSet<ID>
}

impl<'a, ID, S> ShapeQuery<'a, ID, S>
where
    ID: ItemID,
    S: BaseFloat
{
    pub(crate) fn new(
        shape: Shape<S>,
        cell_size: S,
        buckets: &'a FxHashMap<Cell, Bucket<ID>>,
        items: &'a FxHashMap<ID, Shape<S>>) -> Self
    {
        let empty: &'a [ID] = &[];
        Self{
            cells: index::footprint(&shape, cell_size),
            shape,
            bucket: empty.iter(),
            buckets,
            items,
            seen: FxHashSet::default()
        }
    }
}

impl<'a, ID, S> Iterator for ShapeQuery<'a, ID, S>
where
    ID: ItemID,
    S: BaseFloat
{
    type Item = (ID, Contact<S>);

    fn next(&mut self) -> Option<(ID, Contact<S>)> {
        loop {
            while let Some(&id) = self.bucket.next() {
                if !self.seen.insert(id) {
                    continue;
                }
                let contact = self.items.get(&id)
                    .and_then(|other| self.shape.intersects(other));
                if let Some(contact) = contact {
                    return Some((id, contact));
                }
            }

            let buckets = self.buckets;
            let bucket = loop {
                let cell = self.cells.next()?;
                if let Some(bucket) = buckets.get(&cell) {
                    break bucket;
                }
            };
            self.bucket = bucket.iter();
        }
    }
}
