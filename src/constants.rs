// Units are pixels & seconds unless otherwise specified.

// Player
pub const PLAYER_RADIUS: f32 = 12.0;
// The collision circle sits this far above the player's feet
pub const PLAYER_BOUNDS_OFFSET_Y: f32 = 8.0;
pub const PLAYER_MOVEMENT_SPEED: f32 = 64.0;

// Character sheet layout: each character occupies 3 columns x 4 rows of frames,
// rows ordered down, left, right, up.
pub const CHARACTER_FRAME_WIDTH: i32 = 32;
pub const CHARACTER_FRAME_HEIGHT: i32 = 32;
pub const CHARACTER_SHEET_COLUMNS: i32 = 10;
pub const CHARACTER_FRAMES_PER_ROW: i32 = 3;
pub const CHARACTER_ROWS: i32 = 4;
pub const CHARACTER_ANIMATION_SPEED: f32 = 4.0;

// Static object index
pub const QUADTREE_MAX_OBJECTS_PER_NODE: usize = 25;
pub const QUADTREE_MAX_DEPTH: usize = 7;

// https://doc.mapeditor.org/en/stable/reference/tmx-map-format/#tile-flipping
pub const FLIPPED_HORIZONTALLY_FLAG: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY_FLAG: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY_FLAG: u32 = 0x2000_0000;
