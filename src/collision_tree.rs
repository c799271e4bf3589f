use crate::collision::{CollisionActor, CollisionEvent};
use crate::geom::{BoundsShape, Rect};
use crate::penetration::penetration_vector;
use crate::quadtree::{ObjectId, Quadtree, QuadtreeConfig, QuadtreeData};

/// A Quadtree which owns the payloads it indexes. Payloads are immutable once inserted;
/// there's no removal.
pub struct CollisionTree<T> {
    entries: Vec<(T, BoundsShape)>,
    tree: Quadtree,
}

impl<T> CollisionTree<T> {
    pub fn new(boundary: Rect) -> Self {
        Self::with_config(boundary, QuadtreeConfig::default())
    }

    pub fn with_config(boundary: Rect, config: QuadtreeConfig) -> Self {
        Self {
            entries: Vec::new(),
            tree: Quadtree::with_config(boundary, config),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert<S: Into<BoundsShape>>(&mut self, target: T, shape: S) -> ObjectId {
        let id = ObjectId(self.entries.len());
        let bounds = shape.into();
        self.entries.push((target, bounds));
        self.tree.insert(QuadtreeData { id, bounds });
        id
    }

    pub fn get(&self, id: ObjectId) -> Option<(&T, &BoundsShape)> {
        self.entries.get(id.0).map(|(t, s)| (t, s))
    }

    /// Every entry whose shape intersects `shape`, ordered by insertion.
    pub fn query(&self, shape: &BoundsShape) -> Vec<(ObjectId, &T, &BoundsShape)> {
        let mut ids: Vec<ObjectId> = self.tree.query(shape).iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.get(id).map(|(t, s)| (id, t, s)))
            .collect()
    }

    /// Notifies `actor` of each entry overlapping its bounds. The actor's bounds are
    /// re-read before each notification, so an entry the actor has already been pushed
    /// clear of is skipped. Returns the number of notifications sent.
    pub fn test<A>(&self, actor: &mut A) -> usize
    where
        A: CollisionActor<T> + ?Sized,
    {
        let mut count = 0;
        for (id, other, shape) in self.query(&actor.bounds()) {
            let bounds = actor.bounds();
            if !bounds.intersects(shape) {
                continue;
            }
            let event = CollisionEvent {
                other,
                penetration_vector: penetration_vector(&bounds, shape),
            };
            log::trace!(
                "CollisionTree::test - {:?} penetration: {:?}",
                id,
                event.penetration_vector
            );
            actor.on_collision(&event);
            count += 1;
        }
        count
    }
}
