// mlodato, 20261019

use super::error::{Error, Result};
use super::geom::{Bounds, Contact, Segment, Shape};
use super::index::{self, Cell};
use super::query::{AllItems, CellItems, PopulatedCells, ShapeQuery};
use super::ray::{self, RayCast};
use super::traits::ItemID;

use cgmath::{BaseFloat, Point2};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use std::collections::hash_map::Entry;

/// Cell size used when none is configured
pub const DEFAULT_CELL_SIZE: f64 = 64.0;

/// Footprints larger than this are logged, as they make every update of the item expensive
const LARGE_FOOTPRINT: usize = 256;

/// The items registered in one cell
pub(crate) type Bucket<ID> = SmallVec<[ID; 4]>;

fn unknown_item<ID: ItemID>(id: ID) -> Error {
    Error::UnknownItem(format!("{:?}", id))
}

fn check_cell_size<S: BaseFloat>(cell_size: S) -> Result<S> {
    if cell_size.is_finite() && cell_size > S::zero() {
        Ok(cell_size)
    } else {
        Err(Error::InvalidCellSize(format!("{:?}", cell_size)))
    }
}

/// A uniform-grid spatial hash
///
/// Each registered item is stored in the bucket of every cell its shape's footprint covers, and
/// in no other bucket. Buckets exist only while they hold at least one item.
///
/// `ID` is the type representing item identities; `S` is the coordinate scalar.
#[derive(Clone, Debug)]
pub struct World<ID, S = f64>
where
    ID: ItemID,
    S: BaseFloat
{
    cell_size: S,
    items: FxHashMap<ID, Shape<S>>,
    buckets: FxHashMap<Cell, Bucket<ID>>
}

impl<ID, S> Default for World<ID, S>
where
    ID: ItemID,
    S: BaseFloat
{
    fn default() -> Self {
        Self::new()
    }
}

impl<ID, S> World<ID, S>
where
    ID: ItemID,
    S: BaseFloat
{
    /// Creates an empty world with [`DEFAULT_CELL_SIZE`]
    pub fn new() -> Self {
        Self{
            cell_size: num_traits::cast(DEFAULT_CELL_SIZE).unwrap_or_else(S::one),
            items: FxHashMap::default(),
            buckets: FxHashMap::default()
        }
    }

    pub fn with_cell_size(cell_size: S) -> Result<Self> {
        Ok(Self{
            cell_size: check_cell_size(cell_size)?,
            items: FxHashMap::default(),
            buckets: FxHashMap::default()
        })
    }

    pub fn cell_size(&self) -> S {
        self.cell_size
    }

    /// The number of registered items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ID) -> bool {
        self.items.contains_key(&id)
    }

    /// Removes every item, keeping the cell size
    pub fn clear(&mut self) {
        self.items.clear();
        self.buckets.clear();
    }

    fn insert_cells(&mut self, id: ID, shape: &Shape<S>) -> usize {
        let mut count = 0usize;
        for cell in index::footprint(shape, self.cell_size) {
            self.buckets.entry(cell).or_insert_with(Bucket::new).push(id);
            count += 1;
        }
        if count > LARGE_FOOTPRINT {
            warn!("item {:?} spans {} cells; consider a larger cell size", id, count);
        }
        count
    }

    fn remove_cells(&mut self, id: ID, shape: &Shape<S>) -> usize {
        let mut count = 0usize;
        for cell in index::footprint(shape, self.cell_size) {
            if let Entry::Occupied(mut entry) = self.buckets.entry(cell) {
                let bucket = entry.get_mut();
                if let Some(position) = bucket.iter().position(|&other| other == id) {
                    bucket.swap_remove(position);
                    count += 1;
                }
                if bucket.is_empty() {
                    entry.remove();
                }
            }
        }
        count
    }

    /// Registers an item with its shape
    pub fn add(&mut self, id: ID, shape: Shape<S>) -> Result<()> {
        shape.validate()?;
        if self.items.contains_key(&id) {
            return Err(Error::DuplicateItem(format!("{:?}", id)));
        }

        let cells = self.insert_cells(id, &shape);
        self.items.insert(id, shape);
        trace!("added {:?} to {} cells", id, cells);
        Ok(())
    }

    /// Unregisters an item, returning its last shape
    pub fn remove(&mut self, id: ID) -> Result<Shape<S>> {
        let shape = self.items.remove(&id).ok_or_else(|| unknown_item(id))?;
        let cells = self.remove_cells(id, &shape);
        trace!("removed {:?} from {} cells", id, cells);
        Ok(shape)
    }

    /// Replaces an item's shape, returning the previous one
    ///
    /// The item leaves every cell of its old shape and joins every cell of the new one, even when
    /// the two footprints share cells.
    pub fn update(&mut self, id: ID, shape: Shape<S>) -> Result<Shape<S>> {
        shape.validate()?;
        let previous = match self.items.get(&id) {
            Some(&previous) => previous,
            None => return Err(unknown_item(id))
        };

        let removed = self.remove_cells(id, &previous);
        let added = self.insert_cells(id, &shape);
        self.items.insert(id, shape);
        trace!("moved {:?} from {} cells to {} cells", id, removed, added);
        Ok(previous)
    }

    pub fn shape_of(&self, id: ID) -> Result<&Shape<S>> {
        self.items.get(&id).ok_or_else(|| unknown_item(id))
    }

    pub fn get(&self, id: ID) -> Option<&Shape<S>> {
        self.items.get(&id)
    }

    /// Iterate over all registered items and their shapes, in unspecified order
    pub fn items<'a>(&'a self) -> impl Iterator<Item = (ID, &'a Shape<S>)> + 'a {
        self.items.iter().map(|(&id, shape)| (id, shape))
    }

    pub fn to_cell(&self, point: Point2<S>) -> Cell {
        index::to_cell(point, self.cell_size)
    }

    pub fn cell_bounds(&self, cell: Cell) -> Bounds<Point2<S>> {
        index::cell_bounds(cell, self.cell_size)
    }

    pub fn cell_item_count(&self, cell: Cell) -> usize {
        self.buckets.get(&cell).map_or(0, |bucket| bucket.len())
    }

    /// The number of non-empty cells
    pub fn cell_count(&self) -> usize {
        self.buckets.len()
    }

    /// Calls `f` for each item in `cell`, without any shape test
    pub fn map_cell<F>(&self, cell: Cell, f: F)
    where
        F: FnMut(ID)
    {
        self.iter_cell(cell).for_each(f)
    }

    /// Calls `f` once for each non-empty cell
    pub fn map_populated_cells<F>(&self, f: F)
    where
        F: FnMut(Cell)
    {
        self.iter_populated_cells().for_each(f)
    }

    /// Calls `f` exactly once for each registered item, however many cells it occupies
    pub fn map_all<F>(&self, f: F)
    where
        F: FnMut(ID)
    {
        self.iter_all().for_each(f)
    }

    /// Calls `f` for each item whose shape intersects `shape`
    ///
    /// `f` receives the [`Contact`] of testing `shape` against the item's shape, in that order.
    pub fn map_shape<F>(&self, shape: &Shape<S>, mut f: F)
    where
        F: FnMut(ID, Contact<S>)
    {
        self.iter_shape(shape).for_each(|(id, contact)| f(id, contact))
    }

    pub fn iter_cell<'a>(&'a self, cell: Cell) -> CellItems<'a, ID> {
        CellItems::new(self.buckets.get(&cell))
    }

    pub fn iter_populated_cells<'a>(&'a self) -> PopulatedCells<'a, ID> {
        PopulatedCells::new(&self.buckets)
    }

    pub fn iter_all<'a>(&'a self) -> AllItems<'a, ID, S> {
        AllItems::new(&self.items)
    }

    pub fn iter_shape<'a>(&'a self, shape: &Shape<S>) -> ShapeQuery<'a, ID, S> {
        ShapeQuery::new(*shape, self.cell_size, &self.buckets, &self.items)
    }

    pub fn query_cell(&self, cell: Cell) -> Vec<ID> {
        self.query_cell_filtered(cell, |_| true)
    }

    pub fn query_cell_filtered<F>(&self, cell: Cell, mut filter: F) -> Vec<ID>
    where
        F: FnMut(ID) -> bool
    {
        let mut results = Vec::new();
        self.map_cell(cell, |id| if filter(id) { results.push(id) });
        results
    }

    pub fn query_populated_cells(&self) -> Vec<Cell> {
        self.query_populated_cells_filtered(|_| true)
    }

    pub fn query_populated_cells_filtered<F>(&self, mut filter: F) -> Vec<Cell>
    where
        F: FnMut(Cell) -> bool
    {
        let mut results = Vec::with_capacity(self.buckets.len());
        self.map_populated_cells(|cell| if filter(cell) { results.push(cell) });
        results
    }

    pub fn query_all(&self) -> Vec<ID> {
        self.query_all_filtered(|_| true)
    }

    pub fn query_all_filtered<F>(&self, mut filter: F) -> Vec<ID>
    where
        F: FnMut(ID) -> bool
    {
        let mut results = Vec::with_capacity(self.items.len());
        self.map_all(|id| if filter(id) { results.push(id) });
        results
    }

    pub fn query_shape(&self, shape: &Shape<S>) -> Vec<(ID, Contact<S>)> {
        self.query_shape_filtered(shape, |_, _| true)
    }

    /// Collects the items intersecting `shape` which also pass `filter`
    pub fn query_shape_filtered<F>(&self, shape: &Shape<S>, mut filter: F) -> Vec<(ID, Contact<S>)>
    where
        F: FnMut(ID, &Contact<S>) -> bool
    {
        let mut results = Vec::new();
        self.map_shape(shape, |id, contact| if filter(id, &contact) { results.push((id, contact)) });
        results
    }

    /// Finds the nearest item hit by the segment from `from` to `to`
    ///
    /// Fails if `from` and `to` coincide or are not finite.
    pub fn cast_ray(&self, from: Point2<S>, to: Point2<S>) -> Result<RayCast<ID, S>> {
        let segment = Segment::new(from, to)?;
        Ok(ray::cast(&segment, self.cell_size, &self.buckets, &self.items))
    }
}

/// A builder for `World`s
#[derive(Default)]
pub struct WorldBuilder {
    cell_size: Option<f64>,
    item_capacity: Option<usize>,
    cell_capacity: Option<usize>
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell_size(&mut self, cell_size: f64) -> &mut Self {
        self.cell_size = Some(cell_size);
        self
    }

    pub fn with_item_capacity(&mut self, capacity: usize) -> &mut Self {
        self.item_capacity = Some(capacity);
        self
    }

    pub fn with_cell_capacity(&mut self, capacity: usize) -> &mut Self {
        self.cell_capacity = Some(capacity);
        self
    }

    pub fn build<ID, S>(&self) -> Result<World<ID, S>>
    where
        ID: ItemID,
        S: BaseFloat
    {
        let requested = self.cell_size.unwrap_or(DEFAULT_CELL_SIZE);
        let cell_size = num_traits::cast::<f64, S>(requested)
            .ok_or_else(|| Error::InvalidCellSize(format!("{:?}", requested)))?;

        Ok(World{
            cell_size: check_cell_size(cell_size)?,
            items: match self.item_capacity {
                    Some(capacity) => FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
                    None => FxHashMap::default()
                },
            buckets: match self.cell_capacity {
                    Some(capacity) => FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
                    None => FxHashMap::default()
                }
        })
    }
}
