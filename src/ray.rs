// mlodato, 20261019

use super::geom::{self, Segment, Shape};
use super::index::{self, Cell};
use super::traits::ItemID;
use super::world::Bucket;

use cgmath::{BaseFloat, Point2};
use rustc_hash::FxHashMap;

use std::ops::ControlFlow;

/// The outcome of a ray cast
///
/// On a miss, `item` is `None`, `t` is one and `point` is the end of the ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayCast<ID, S> {
    pub item: Option<ID>,
    pub point: Point2<S>,
    pub t: S
}

/// Earliest time in `[0, 1]` at which the ray touches `shape`
fn hit_time<S: BaseFloat>(ray: &Segment<S>, shape: &Shape<S>) -> Option<S> {
    let t = match shape {
        Shape::Circle(circle) => geom::segment_circle(ray, circle).map(|(t1, _)| t1),
        Shape::Rect(rect) => geom::segment_rect(ray, rect).map(|(t1, _)| t1),
        Shape::Segment(segment) => geom::segment_segment(ray, segment)
    };
    t.map(|t| t.max(S::zero()))
}

/// Walks the ray's cells in order, testing every item bucketed in each one
///
/// The walk visits cells in order of distance along the ray, so once the best hit so far lies in
/// the cell just scanned no later cell can hold a nearer one, and the walk stops.
pub(crate) fn cast<ID, S>(
    ray: &Segment<S>,
    cell_size: S,
    buckets: &FxHashMap<Cell, Bucket<ID>>,
    items: &FxHashMap<ID, Shape<S>>) -> RayCast<ID, S>
where
    ID: ItemID,
    S: BaseFloat
{
    let mut best: Option<(ID, S)> = None;
    let mut visited = 0usize;

    let stopped = index::visit(&Shape::Segment(*ray), cell_size, |cell| {
        visited += 1;
        if let Some(bucket) = buckets.get(&cell) {
            for &id in bucket.iter() {
                let t = match items.get(&id).and_then(|shape| hit_time(ray, shape)) {
                    Some(t) => t,
                    None => continue
                };
                if best.map_or(true, |(_, best_t)| t < best_t) {
                    best = Some((id, t));
                }
            }
        }

        match best {
            Some((_, t)) if index::to_cell(ray.point_at(t), cell_size) == cell => ControlFlow::Break(()),
            _ => ControlFlow::Continue(())
        }
    });

    if stopped.is_some() {
        debug!("ray cast resolved after {} cells", visited);
    }

    match best {
        Some((id, t)) => RayCast{item: Some(id), point: ray.point_at(t), t},
        None => RayCast{item: None, point: ray.end, t: S::one()}
    }
}

#[cfg(test)]
mod tests {
    use crate::geom::Shape;
    use crate::world::World;
    use cgmath::Point2;

    fn world() -> World<&'static str, f64> {
        World::with_cell_size(10.0).unwrap()
    }

    fn approx(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-9
    }

    #[test]
    fn hits_circle_at_entry() {
        let mut w = world();
        w.add("ball", Shape::circle(50.0, 50.0, 5.0).unwrap()).unwrap();
        let hit = w.cast_ray(Point2::new(0.0, 50.0), Point2::new(100.0, 50.0)).unwrap();
        assert_eq!(hit.item, Some("ball"));
        assert!(approx(hit.t, 0.45));
        assert!(approx(hit.point.x, 45.0));
        assert!(approx(hit.point.y, 50.0));
    }

    #[test]
    fn miss_reports_ray_end() {
        let w = world();
        let hit = w.cast_ray(Point2::new(3.0, 4.0), Point2::new(-30.0, 17.0)).unwrap();
        assert_eq!(hit.item, None);
        assert_eq!(hit.point, Point2::new(-30.0, 17.0));
        assert_eq!(hit.t, 1.0);
    }

    #[test]
    fn nearest_of_several() {
        let mut w = world();
        w.add("far", Shape::rect(70.0, 0.0, 5.0, 10.0).unwrap()).unwrap();
        w.add("near", Shape::rect(30.0, 0.0, 5.0, 10.0).unwrap()).unwrap();
        w.add("wall", Shape::segment(50.0, -5.0, 50.0, 15.0).unwrap()).unwrap();
        let hit = w.cast_ray(Point2::new(0.0, 5.0), Point2::new(100.0, 5.0)).unwrap();
        assert_eq!(hit.item, Some("near"));
        assert!(approx(hit.t, 0.3));

        let hit = w.cast_ray(Point2::new(100.0, 5.0), Point2::new(0.0, 5.0)).unwrap();
        assert_eq!(hit.item, Some("far"));
        assert!(approx(hit.t, 0.25));
    }

    #[test]
    fn large_item_seen_early_does_not_hide_nearer_hit() {
        let mut w = world();
        // spans every cell of the ray but is only hit near its far end
        w.add("ramp", Shape::segment(0.0, 0.0, 95.0, 9.0).unwrap()).unwrap();
        w.add("post", Shape::rect(40.0, 0.0, 2.0, 10.0).unwrap()).unwrap();
        let hit = w.cast_ray(Point2::new(0.0, 8.0), Point2::new(100.0, 8.0)).unwrap();
        assert_eq!(hit.item, Some("post"));
        assert!(approx(hit.t, 0.4));
    }

    #[test]
    fn ray_starting_inside_clamps_to_zero() {
        let mut w = world();
        w.add("ball", Shape::circle(5.0, 5.0, 4.0).unwrap()).unwrap();
        let hit = w.cast_ray(Point2::new(5.0, 5.0), Point2::new(50.0, 5.0)).unwrap();
        assert_eq!(hit.item, Some("ball"));
        assert_eq!(hit.t, 0.0);
        assert_eq!(hit.point, Point2::new(5.0, 5.0));
    }

    #[test]
    fn zero_length_ray_is_rejected() {
        let w = world();
        assert!(w.cast_ray(Point2::new(1.0, 1.0), Point2::new(1.0, 1.0)).is_err());
    }
}
