use cgmath::*;

use crate::collision::{CollisionActor, CollisionEvent, HasBounds};
use crate::constants::{PLAYER_BOUNDS_OFFSET_Y, PLAYER_MOVEMENT_SPEED, PLAYER_RADIUS};
use crate::geom::{BoundsShape, Circle};
use crate::input::{ArrowKey, Direction4, InputState, MovementInput};
use crate::map::MapObject;
use crate::sprite::{Animation, FrameRect, PlayerAnimation, SpriteSheet};
use crate::tileset::TilesetTile;

pub struct Player {
    /// Where the player's feet touch the ground, in world pixels
    pub position: Point2<f32>,
    pub movement_speed: f32,
    movement: MovementInput,
    sheet: SpriteSheet<Direction4, PlayerAnimation>,
    animation: Animation<Direction4, PlayerAnimation>,
}

impl Player {
    pub fn new(position: Point2<f32>, sheet: SpriteSheet<Direction4, PlayerAnimation>) -> Self {
        Self {
            position,
            movement_speed: PLAYER_MOVEMENT_SPEED,
            movement: MovementInput::default(),
            sheet,
            animation: Animation::new(),
        }
    }

    pub fn update(&mut self, dt: f32, input: &InputState<ArrowKey>) {
        self.animation.update(dt);
        self.movement.update(input);

        self.position += self.movement.movement * dt * self.movement_speed;
        self.animation.set_direction(self.movement.main_direction);
        self.animation.set_animation(if self.movement.movement.is_zero() {
            PlayerAnimation::Idle
        } else {
            PlayerAnimation::Walking
        });
    }

    pub fn direction(&self) -> Direction4 {
        self.animation.direction()
    }

    pub fn current_animation(&self) -> PlayerAnimation {
        self.animation.animation()
    }

    /// Sheet frame to draw, anchored at `position` by the sequence's origin
    pub fn current_frame(&self) -> Option<&FrameRect> {
        self.animation.current_frame(&self.sheet)
    }

    fn resolve(&mut self, penetration_vector: Vector2<f32>) {
        self.position -= penetration_vector;
    }
}

impl HasBounds for Player {
    fn bounds(&self) -> BoundsShape {
        Circle::new(
            point2(self.position.x, self.position.y - PLAYER_BOUNDS_OFFSET_Y),
            PLAYER_RADIUS,
        )
        .into()
    }
}

impl CollisionActor<TilesetTile> for Player {
    fn on_collision(&mut self, event: &CollisionEvent<TilesetTile>) {
        self.resolve(event.penetration_vector);
    }
}

impl CollisionActor<MapObject> for Player {
    fn on_collision(&mut self, event: &CollisionEvent<MapObject>) {
        log::trace!("Player touched object {} \"{}\"", event.other.id, event.other.name);
        self.resolve(event.penetration_vector);
    }
}
