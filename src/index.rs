// mlodato, 20190317

use super::geom::{Bounds, Segment, Shape};

use cgmath::{BaseFloat, Point2};

use std::ops::ControlFlow;

#[cfg(feature="serialize")]
use serde::{Deserialize, Serialize};

/// Integer coordinates of one square grid cell
///
/// Cell `(x, y)` covers `[x * cell_size, (x + 1) * cell_size)` horizontally, and likewise
/// vertically.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature="serialize", derive(Deserialize, Serialize))]
pub struct Cell {
    pub x: i32,
    pub y: i32
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self{x, y}
    }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self {
        Self{x, y}
    }
}

/// Floor-divides a coordinate by the cell size
///
/// Coordinates beyond the `i32` cell range saturate.
pub fn cell_coord<S: BaseFloat>(value: S, cell_size: S) -> i32 {
    let scaled = (value / cell_size).floor();
    match scaled.to_i32() {
        Some(coord) => coord,
        None => {
            warn!("coordinate {:?} exceeds the cell range at cell size {:?}; saturating", value, cell_size);
            if scaled > S::zero() { i32::MAX } else { i32::MIN }
        }
    }
}

pub fn to_cell<S: BaseFloat>(point: Point2<S>, cell_size: S) -> Cell {
    Cell::new(cell_coord(point.x, cell_size), cell_coord(point.y, cell_size))
}

fn cell_origin<S: BaseFloat>(coord: i32, cell_size: S) -> S {
    let coord: S = num_traits::cast(coord)
        .unwrap_or_else(|| if coord < 0 { S::min_value() } else { S::max_value() });
    coord * cell_size
}

pub fn cell_bounds<S: BaseFloat>(cell: Cell, cell_size: S) -> Bounds<Point2<S>> {
    let min = Point2::new(cell_origin(cell.x, cell_size), cell_origin(cell.y, cell_size));
    Bounds::new(min, Point2::new(min.x + cell_size, min.y + cell_size))
}

/// Every cell in an inclusive rectangle, row by row from `min.y` to `max.y`
#[derive(Clone, Debug)]
pub struct CellRange {
    min: Cell,
    max: Cell,
    next: Option<Cell>
}

impl CellRange {
    pub fn new(min: Cell, max: Cell) -> Self {
        let next = if min.x <= max.x && min.y <= max.y { Some(min) } else { None };
        Self{min, max, next}
    }

    pub fn covering<S: BaseFloat>(bounds: Bounds<Point2<S>>, cell_size: S) -> Self {
        Self::new(to_cell(bounds.min, cell_size), to_cell(bounds.max, cell_size))
    }
}

impl Iterator for CellRange {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        let cell = self.next?;
        self.next = if cell.x < self.max.x {
            Some(Cell::new(cell.x + 1, cell.y))
        } else if cell.y < self.max.y {
            Some(Cell::new(self.min.x, cell.y + 1))
        } else {
            None
        };
        Some(cell)
    }
}

/// Walks every cell a segment passes through, in order from `start` to `end`
///
/// `t_x`/`t_y` hold the segment parameter at which the walk crosses the next vertical/horizontal
/// grid line, and `dt_x`/`dt_y` the parameter width of one cell. An axis along which the segment
/// does not move has infinite times and is never stepped. When both crossings coincide (an exact
/// corner) the walk steps in y first.
#[derive(Clone, Debug)]
pub struct SegmentWalk<S> {
    cell: Cell,
    end: Cell,
    step_x: i32,
    step_y: i32,
    t_x: S,
    t_y: S,
    dt_x: S,
    dt_y: S,
    done: bool
}

/// Step direction, parameter of the first grid line crossing, and parameter width of one cell
fn axis_walk<S: BaseFloat>(origin: S, delta: S, coord: i32, cell_size: S) -> (i32, S, S) {
    if delta == S::zero() {
        return (0, S::infinity(), S::infinity());
    }

    let cell_min = cell_origin(coord, cell_size);
    if delta > S::zero() {
        (1, (cell_min + cell_size - origin) / delta, cell_size / delta)
    } else {
        (-1, (cell_min - origin) / delta, cell_size / -delta)
    }
}

impl<S> SegmentWalk<S>
where
    S: BaseFloat
{
    pub fn new(segment: Segment<S>, cell_size: S) -> Self {
        let cell = to_cell(segment.start, cell_size);
        let end = to_cell(segment.end, cell_size);
        let delta = segment.delta();
        let (step_x, t_x, dt_x) = axis_walk(segment.start.x, delta.x, cell.x, cell_size);
        let (step_y, t_y, dt_y) = axis_walk(segment.start.y, delta.y, cell.y, cell_size);
        Self{cell, end, step_x, step_y, t_x, t_y, dt_x, dt_y, done: false}
    }
}

impl<S> Iterator for SegmentWalk<S>
where
    S: BaseFloat
{
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        if self.done {
            return None;
        }

        let cell = self.cell;
        if cell == self.end {
            self.done = true;
            return Some(cell);
        }

        // once the end column (row) is reached only the other axis may advance
        let step_y = if cell.x == self.end.x {
            true
        } else if cell.y == self.end.y {
            false
        } else {
            self.t_x >= self.t_y
        };

        let next = if step_y {
            self.t_y = self.t_y + self.dt_y;
            cell.y.checked_add(self.step_y).map(|y| Cell::new(cell.x, y))
        } else {
            self.t_x = self.t_x + self.dt_x;
            cell.x.checked_add(self.step_x).map(|x| Cell::new(x, cell.y))
        };

        // the walk ends at the edge of the cell range
        match next {
            Some(next) => self.cell = next,
            None => self.done = true
        }

        Some(cell)
    }
}

/// The cells overlapped by a shape
///
/// Boxes and circles enumerate the rectangle of cells touched by their bounds (for circles this
/// over-approximates the true footprint); segments walk the grid.
#[derive(Clone, Debug)]
pub enum Footprint<S> {
    Cells(CellRange),
    Walk(SegmentWalk<S>)
}

impl<S> Iterator for Footprint<S>
where
    S: BaseFloat
{
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        match self {
            Footprint::Cells(range) => range.next(),
            Footprint::Walk(walk) => walk.next()
        }
    }
}

pub fn footprint<S: BaseFloat>(shape: &Shape<S>, cell_size: S) -> Footprint<S> {
    match *shape {
        Shape::Segment(segment) => Footprint::Walk(SegmentWalk::new(segment, cell_size)),
        Shape::Circle(_) | Shape::Rect(_) => Footprint::Cells(CellRange::covering(shape.bounds(), cell_size))
    }
}

/// Calls `visitor` for each cell of the shape's footprint until it breaks
///
/// Returns the value carried by `ControlFlow::Break`, or `None` if every cell was visited.
pub fn visit<S, R, F>(shape: &Shape<S>, cell_size: S, visitor: F) -> Option<R>
where
    S: BaseFloat,
    F: FnMut(Cell) -> ControlFlow<R>
{
    match footprint(shape, cell_size).try_for_each(visitor) {
        ControlFlow::Break(result) => Some(result),
        ControlFlow::Continue(()) => None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(shape: Shape<f64>, cell_size: f64) -> Vec<(i32, i32)> {
        footprint(&shape, cell_size).map(|cell| (cell.x, cell.y)).collect()
    }

    fn assert_connected(walk: &[(i32, i32)]) {
        for pair in walk.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!((a.0 - b.0).abs() + (a.1 - b.1).abs(), 1, "{:?} -> {:?}", a, b);
        }
    }

    #[test]
    fn coords_floor_toward_negative_infinity() {
        assert_eq!(cell_coord(0.0, 10.0), 0);
        assert_eq!(cell_coord(9.999, 10.0), 0);
        assert_eq!(cell_coord(10.0, 10.0), 1);
        assert_eq!(cell_coord(-0.5, 10.0), -1);
        assert_eq!(cell_coord(-10.0, 10.0), -1);
        assert_eq!(cell_coord(-10.5, 10.0), -2);
    }

    #[test]
    fn coords_saturate() {
        assert_eq!(cell_coord(1e20f64, 1.0), i32::MAX);
        assert_eq!(cell_coord(-1e20f64, 1.0), i32::MIN);
    }

    #[test]
    fn cell_bounds_round_trip() {
        let bounds = cell_bounds(Cell::new(-2, 3), 10.0);
        assert_eq!(bounds, Bounds::new(Point2::new(-20.0, 30.0), Point2::new(-10.0, 40.0)));
        assert_eq!(to_cell(bounds.min, 10.0), Cell::new(-2, 3));
    }

    #[test]
    fn rect_footprint_is_inclusive() {
        let shape = Shape::rect(0.0, 0.0, 10.0, 10.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);

        let shape = Shape::rect(1.0, 1.0, 5.0, 5.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(0, 0)]);
    }

    #[test]
    fn circle_footprint_uses_enclosing_square() {
        let shape = Shape::circle(10.0, 10.0, 1.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn horizontal_walk() {
        let shape = Shape::segment(0.0, 0.0, 25.0, 0.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(0, 0), (1, 0), (2, 0)]);

        let shape = Shape::segment(25.0, 5.0, -5.0, 5.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(2, 0), (1, 0), (0, 0), (-1, 0)]);
    }

    #[test]
    fn vertical_walk() {
        let shape = Shape::segment(5.0, 35.0, 5.0, 0.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(0, 3), (0, 2), (0, 1), (0, 0)]);
    }

    #[test]
    fn single_cell_walk() {
        let shape = Shape::segment(1.0, 1.0, 9.0, 2.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(0, 0)]);
    }

    #[test]
    fn corner_crossing_steps_y_first() {
        let shape = Shape::segment(5.0, 5.0, 15.0, 15.0).unwrap();
        assert_eq!(cells(shape, 10.0), vec![(0, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn shallow_diagonal_walk() {
        let shape = Shape::segment(2.0, 2.0, 38.0, 14.0).unwrap();
        let walk = cells(shape, 10.0);
        assert_eq!(walk.first(), Some(&(0, 0)));
        assert_eq!(walk.last(), Some(&(3, 1)));
        assert_eq!(walk.len(), 5);
        assert_connected(&walk);
    }

    #[test]
    fn steep_negative_walk_is_connected() {
        let shape = Shape::segment(-3.0, 47.0, 21.0, -58.0).unwrap();
        let walk = cells(shape, 7.0);
        assert_eq!(walk.first(), Some(&(-1, 6)));
        assert_eq!(walk.last(), Some(&(3, -9)));
        assert_connected(&walk);
    }

    #[test]
    fn walk_ends_at_edge_of_cell_range() {
        let segment = Segment{start: Point2::new(std::f64::NAN, 0.0), end: Point2::new(0.0, 0.0)};
        let walk: Vec<Cell> = SegmentWalk::new(segment, 10.0).take(4).collect();
        assert_eq!(walk, vec![Cell::new(std::i32::MIN, 0)]);
    }

    #[test]
    fn visit_stops_on_break() {
        let shape = Shape::segment(0.0, 0.0, 95.0, 0.0).unwrap();
        let mut visited = Vec::new();
        let found = visit(&shape, 10.0, |cell| {
            visited.push(cell.x);
            if cell.x == 3 { ControlFlow::Break(cell) } else { ControlFlow::Continue(()) }
        });
        assert_eq!(found, Some(Cell::new(3, 0)));
        assert_eq!(visited, vec![0, 1, 2, 3]);

        let none: Option<()> = visit(&shape, 10.0, |_| ControlFlow::Continue(()));
        assert_eq!(none, None);
    }
}
