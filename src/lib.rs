// mlodato, 20190219

//! A 2D spatial hash for broadphase collision queries
//!
//! Items (any small `Copy + Hash + Eq` identity) are registered with a [`Shape`]: a circle, an
//! axis-aligned box, or a line segment. The [`World`] partitions space into square cells and
//! stores each item in the bucket of every cell its shape overlaps, so that queries only test the
//! items near the query region.
//!
//! ```
//! use broadgrid::{Point2, Shape, World};
//!
//! let mut world: World<u32> = World::with_cell_size(10.0).unwrap();
//! world.add(1, Shape::circle(50.0, 50.0, 5.0).unwrap()).unwrap();
//! world.add(2, Shape::rect(0.0, 0.0, 20.0, 20.0).unwrap()).unwrap();
//!
//! // exact intersection tests against items in nearby cells only
//! let hits = world.query_shape(&Shape::rect(15.0, 15.0, 40.0, 40.0).unwrap());
//! assert_eq!(hits.len(), 2);
//!
//! // nearest item along a ray
//! let cast = world.cast_ray(Point2::new(100.0, 50.0), Point2::new(0.0, 50.0)).unwrap();
//! assert_eq!(cast.item, Some(1));
//! assert!((cast.point.x - 55.0).abs() < 1e-9);
//! ```
//!
//! The world is not internally synchronized; queries borrow it immutably and mutations borrow it
//! mutably, so concurrent access follows the usual borrowing rules.

#[macro_use]
extern crate log;

mod error;
mod geom;
mod index;
mod query;
mod ray;
mod traits;
mod world;

pub use cgmath::{Point2, Vector2};

pub use error::{Error, Result};
pub use geom::{
    Bounds, Circle, Contact, Segment, Shape,
    circle_circle, intersect, line_circle_times, rect_circle, rect_rect, segment_circle,
    segment_rect, segment_segment};
pub use index::{Cell, CellRange, Footprint, SegmentWalk, cell_bounds, cell_coord, footprint, to_cell, visit};
pub use query::{AllItems, CellItems, PopulatedCells, ShapeQuery};
pub use ray::RayCast;
pub use traits::ItemID;
pub use world::{DEFAULT_CELL_SIZE, World, WorldBuilder};
