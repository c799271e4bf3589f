pub mod collision;
pub mod collision_tree;
pub mod constants;
pub mod geom;
pub mod input;
pub mod map;
pub mod penetration;
pub mod player;
pub mod quadtree;
pub mod sprite;
pub mod tile_overlap;
pub mod tileset;
pub mod util;
