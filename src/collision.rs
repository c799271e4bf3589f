use cgmath::*;
use std::cell::RefCell;
use std::ops::{Bound, Range, RangeBounds};
use std::rc::{Rc, Weak};

use crate::collision_tree::CollisionTree;
use crate::geom::{BoundsShape, Rect};
use crate::map::{Layer, Map, MapObject, MapTile, TileLayer};
use crate::penetration::penetration_vector;
use crate::tile_overlap::TileOverlap;
use crate::tileset::{TileObject, TileSet, TilesetTile};

// ---------------------------------------------------------------------------------------------------------------------

pub trait HasBounds {
    fn bounds(&self) -> BoundsShape;
}

/// Delivered to an actor for each thing it overlaps. The penetration vector points from the
/// actor into `other`; subtracting it from the actor's position pushes the actor clear.
#[derive(Debug)]
pub struct CollisionEvent<'a, T> {
    pub other: &'a T,
    pub penetration_vector: Vector2<f32>,
}

pub trait CollisionActor<T>: HasBounds {
    fn on_collision(&mut self, event: &CollisionEvent<T>);
}

/// An actor which collides with both tiles and map objects.
pub trait TileMapActor: CollisionActor<TilesetTile> + CollisionActor<MapObject> {}

impl<A> TileMapActor for A where A: CollisionActor<TilesetTile> + CollisionActor<MapObject> + ?Sized {}

// ---------------------------------------------------------------------------------------------------------------------

/// A contiguous run of map layers, `start..start + length`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LayerRange {
    pub start: usize,
    pub length: usize,
}

impl LayerRange {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn all(layer_count: usize) -> Self {
        Self::new(0, layer_count)
    }

    /// Converts any range expression, e.g. `1..3` or `2..`, clamped to `layer_count`.
    pub fn from_bounds<R: RangeBounds<usize>>(range: R, layer_count: usize) -> Self {
        let start = match range.start_bound() {
            Bound::Included(s) => *s,
            Bound::Excluded(s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(e) => e.saturating_add(1),
            Bound::Excluded(e) => *e,
            Bound::Unbounded => layer_count,
        };
        Self::new(start, end.saturating_sub(start)).clamped(layer_count)
    }

    pub fn clamped(&self, layer_count: usize) -> Self {
        let start = self.start.min(layer_count);
        let end = self.start.saturating_add(self.length).min(layer_count);
        Self::new(start, end - start)
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.start + self.length
    }
}

// ---------------------------------------------------------------------------------------------------------------------

/// Places a tile's local collision rect in world space, applying the tile's flips. A diagonal
/// flip transposes the rect before the horizontal and vertical mirroring.
pub fn tile_object_world_rect(
    object: &TileObject,
    tile: &MapTile,
    tileset: &TileSet,
    map_tile_size: Vector2<u32>,
) -> Rect {
    let mut origin = object.origin;
    let mut extent = object.extent;
    let mut tile_extent = vec2(tileset.tile_width as f32, tileset.tile_height as f32);

    if tile.flipped_diagonally {
        origin = point2(origin.y, origin.x);
        extent = vec2(extent.y, extent.x);
        tile_extent = vec2(tile_extent.y, tile_extent.x);
    }
    if tile.flipped_horizontally {
        origin.x = tile_extent.x - (origin.x + extent.x);
    }
    if tile.flipped_vertically {
        origin.y = tile_extent.y - (origin.y + extent.y);
    }

    Rect::new(origin, extent).offset(vec2(
        (tile.x * map_tile_size.x) as f32,
        (tile.y * map_tile_size.y) as f32,
    ))
}

/// Collides registered actors against the tile layers of a map, and against the objects of
/// any object layers. Actors are held weakly; dropping one unregisters it.
pub struct TileMapCollision {
    map: Rc<Map>,
    layers: LayerRange,
    actors: Vec<Weak<RefCell<dyn TileMapActor>>>,
    objects: Option<CollisionTree<MapObject>>,
}

impl TileMapCollision {
    pub fn new(map: Rc<Map>, layer_range: Option<LayerRange>) -> Self {
        let layers = layer_range
            .map(|r| r.clamped(map.layers.len()))
            .unwrap_or_else(|| LayerRange::all(map.layers.len()));

        let object_layers: Vec<_> = map.layers[layers.indices()]
            .iter()
            .filter_map(|l| match l {
                Layer::Objects(o) => Some(o),
                _ => None,
            })
            .collect();

        let objects = if object_layers.iter().any(|l| !l.objects.is_empty()) {
            let mut tree = CollisionTree::new(map.bounds());
            for object in object_layers.iter().flat_map(|l| &l.objects) {
                match object.bounds() {
                    Some(shape) => {
                        tree.insert(object.clone(), shape);
                    }
                    None => log::debug!(
                        "TileMapCollision::new - object {} ({:?}) has no collision shape, skipping",
                        object.id,
                        object.kind
                    ),
                }
            }
            Some(tree)
        } else {
            None
        };

        log::debug!(
            "TileMapCollision::new - layers {:?}, {} indexed objects",
            layers.indices(),
            objects.as_ref().map_or(0, |o| o.len())
        );

        TileMapCollision {
            map,
            layers,
            actors: Vec::new(),
            objects,
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn layer_range(&self) -> LayerRange {
        self.layers
    }

    pub fn objects(&self) -> Option<&CollisionTree<MapObject>> {
        self.objects.as_ref()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.iter().filter(|a| a.strong_count() > 0).count()
    }

    /// Registers `actor` for collision callbacks. Adding an actor twice has no effect.
    pub fn add_actor<A: TileMapActor + 'static>(&mut self, actor: &Rc<RefCell<A>>) {
        let actor: Rc<RefCell<dyn TileMapActor>> = actor.clone();
        let actor = Rc::downgrade(&actor);
        let address = actor.as_ptr() as *const ();
        if self
            .actors
            .iter()
            .any(|a| a.as_ptr() as *const () == address)
        {
            log::debug!("TileMapCollision::add_actor - actor already registered");
            return;
        }
        self.actors.push(actor);
    }

    /// Runs one tick of collision detection, notifying actors of everything they overlap.
    /// Returns the number of notifications sent.
    pub fn update(&mut self, _dt: f32) -> usize {
        let before = self.actors.len();
        self.actors.retain(|a| a.strong_count() > 0);
        if self.actors.len() != before {
            log::debug!(
                "TileMapCollision::update - pruned {} dropped actors",
                before - self.actors.len()
            );
        }

        let mut count = 0;
        for actor in &self.actors {
            let actor = match actor.upgrade() {
                Some(actor) => actor,
                None => continue,
            };
            let mut actor = actor.borrow_mut();

            for layer in &self.map.layers[self.layers.indices()] {
                if let Layer::Tiles(layer) = layer {
                    count += self.test_tile_layer(layer, &mut *actor);
                }
            }

            if let Some(objects) = &self.objects {
                count += objects.test(&mut *actor);
            }
        }
        count
    }

    fn test_tile_layer(&self, layer: &TileLayer, actor: &mut dyn TileMapActor) -> usize {
        let map_tile_size = vec2(self.map.tile_width, self.map.tile_height);
        let query = actor.bounds().bounding_rect();
        let mut count = 0;

        for tile in TileOverlap::new(layer, map_tile_size.x, map_tile_size.y, &query) {
            if tile.is_empty() {
                continue;
            }

            let (tileset, first_gid) = match self.map.tileset_for_gid(tile.gid) {
                Some(t) => t,
                None => {
                    log::trace!("No tileset for gid {} at ({}, {})", tile.gid, tile.x, tile.y);
                    continue;
                }
            };
            let tileset_tile = match tileset.tile(tile.gid - first_gid) {
                Some(t) => t,
                None => continue,
            };

            for object in &tileset_tile.objects {
                let rect = tile_object_world_rect(object, tile, tileset, map_tile_size);
                let shape = BoundsShape::Rect(rect);
                let bounds = actor.bounds();
                if !bounds.intersects(&shape) {
                    continue;
                }

                let event = CollisionEvent {
                    other: tileset_tile,
                    penetration_vector: penetration_vector(&bounds, &shape),
                };
                log::trace!(
                    "Tile collision at ({}, {}) in \"{}\" penetration: {:?}",
                    tile.x,
                    tile.y,
                    layer.name,
                    event.penetration_vector
                );
                CollisionActor::<TilesetTile>::on_collision(&mut *actor, &event);
                count += 1;
            }
        }
        count
    }
}
