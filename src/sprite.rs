use cgmath::*;
use std::collections::HashMap;
use std::hash::Hash;

use crate::constants::{
    CHARACTER_ANIMATION_SPEED, CHARACTER_FRAMES_PER_ROW, CHARACTER_FRAME_HEIGHT,
    CHARACTER_FRAME_WIDTH, CHARACTER_ROWS, CHARACTER_SHEET_COLUMNS,
};
use crate::input::Direction4;

/// Fieldless enums whose every variant can be listed.
pub trait Enumerated: Copy + Eq + Hash + 'static {
    const ALL: &'static [Self];
}

impl Enumerated for Direction4 {
    const ALL: &'static [Self] = &[
        Direction4::Down,
        Direction4::Left,
        Direction4::Right,
        Direction4::Up,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlayerAnimation {
    Idle,
    Walking,
}

impl Default for PlayerAnimation {
    fn default() -> Self {
        PlayerAnimation::Idle
    }
}

impl Enumerated for PlayerAnimation {
    const ALL: &'static [Self] = &[PlayerAnimation::Idle, PlayerAnimation::Walking];
}

// ---------------------------------------------------------------------------------------------------------------------

/// A frame's source rect in sheet pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRect {
    pub origin: Point2<i32>,
    pub extent: Vector2<i32>,
}

impl FrameRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            origin: point2(x, y),
            extent: vec2(width, height),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSequence {
    pub frames: Vec<FrameRect>,
    /// Frames per second
    pub frame_speed: f32,
    /// Draw anchor, relative to the frame's top-left
    pub origin: Vector2<f32>,
}

impl AnimationSequence {
    /// The frame showing `elapsed` seconds into the sequence, looping.
    pub fn frame_at(&self, elapsed: f32) -> Option<&FrameRect> {
        if self.frames.is_empty() {
            return None;
        }
        let index = (elapsed * self.frame_speed).floor().max(0.0) as usize % self.frames.len();
        self.frames.get(index)
    }
}

/// Every animation a character has, one sequence per (direction, animation) pair.
#[derive(Clone, Debug)]
pub struct SpriteSheet<D: Enumerated, A: Enumerated> {
    sequences: HashMap<(D, A), AnimationSequence>,
}

impl<D: Enumerated, A: Enumerated> SpriteSheet<D, A> {
    /// Builds the sheet by asking `sequence_for` for each (direction, animation) pair.
    pub fn new<F>(mut sequence_for: F) -> Self
    where
        F: FnMut(D, A) -> AnimationSequence,
    {
        let mut sequences = HashMap::new();
        for direction in D::ALL {
            for animation in A::ALL {
                sequences.insert(
                    (*direction, *animation),
                    sequence_for(*direction, *animation),
                );
            }
        }
        Self { sequences }
    }

    pub fn get(&self, direction: D, animation: A) -> Option<&AnimationSequence> {
        self.sequences.get(&(direction, animation))
    }
}

/// Sheet for the character at `index` on the shared character sheet. Each character is
/// a block of 3 columns by 4 rows; rows face down, left, right and up. Walking cycles
/// columns 0,1,2,1 and idle holds column 1.
pub fn player_sheet(index: i32) -> SpriteSheet<Direction4, PlayerAnimation> {
    let width = CHARACTER_FRAME_WIDTH;
    let height = CHARACTER_FRAME_HEIGHT;
    let base_x = (index % CHARACTER_SHEET_COLUMNS) * width * CHARACTER_FRAMES_PER_ROW;
    let base_y = (index / CHARACTER_SHEET_COLUMNS) * height * CHARACTER_ROWS;
    let origin = vec2((width / 2) as f32, height as f32);

    SpriteSheet::new(|direction, animation| {
        let row = match direction {
            Direction4::Down => 0,
            Direction4::Left => 1,
            Direction4::Right => 2,
            Direction4::Up => 3,
        };
        let columns: &[i32] = match animation {
            PlayerAnimation::Walking => &[0, 1, 2, 1],
            PlayerAnimation::Idle => &[1],
        };
        AnimationSequence {
            frames: columns
                .iter()
                .map(|c| FrameRect::new(base_x + c * width, base_y + row * height, width, height))
                .collect(),
            frame_speed: CHARACTER_ANIMATION_SPEED,
            origin,
        }
    })
}

// ---------------------------------------------------------------------------------------------------------------------

/// Playback state over a SpriteSheet. Changing direction or animation restarts the
/// sequence from its first frame.
#[derive(Clone, Debug, Default)]
pub struct Animation<D, A> {
    time: f32,
    animation_start: f32,
    direction: D,
    animation: A,
}

impl<D: Enumerated + Default, A: Enumerated + Default> Animation<D, A> {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            animation_start: 0.0,
            direction: D::default(),
            animation: A::default(),
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
    }

    pub fn direction(&self) -> D {
        self.direction
    }

    pub fn set_direction(&mut self, direction: D) {
        if direction != self.direction {
            self.direction = direction;
            self.animation_start = self.time;
        }
    }

    pub fn animation(&self) -> A {
        self.animation
    }

    pub fn set_animation(&mut self, animation: A) {
        if animation != self.animation {
            self.animation = animation;
            self.animation_start = self.time;
        }
    }

    /// Seconds since the current sequence started
    pub fn elapsed(&self) -> f32 {
        self.time - self.animation_start
    }

    pub fn current_sequence<'a>(&self, sheet: &'a SpriteSheet<D, A>) -> Option<&'a AnimationSequence> {
        sheet.get(self.direction, self.animation)
    }

    pub fn current_frame<'a>(&self, sheet: &'a SpriteSheet<D, A>) -> Option<&'a FrameRect> {
        self.current_sequence(sheet)?.frame_at(self.elapsed())
    }
}

#[cfg(test)]
mod sprite_tests {
    use super::*;

    #[test]
    fn sheet_has_every_pair() {
        let sheet = player_sheet(0);
        for direction in Direction4::ALL {
            for animation in PlayerAnimation::ALL {
                assert!(sheet.get(*direction, *animation).is_some());
            }
        }
    }

    #[test]
    fn player_sheet_layout() {
        let sheet = player_sheet(0);
        let walk = sheet
            .get(Direction4::Left, PlayerAnimation::Walking)
            .unwrap();
        assert_eq!(
            walk.frames,
            vec![
                FrameRect::new(0, 32, 32, 32),
                FrameRect::new(32, 32, 32, 32),
                FrameRect::new(64, 32, 32, 32),
                FrameRect::new(32, 32, 32, 32),
            ]
        );
        assert_eq!(walk.frame_speed, 4.0);
        assert_eq!(walk.origin, vec2(16.0, 32.0));

        let idle = sheet.get(Direction4::Up, PlayerAnimation::Idle).unwrap();
        assert_eq!(idle.frames, vec![FrameRect::new(32, 96, 32, 32)]);

        // character 12 sits in the second band of characters, third block across
        let sheet = player_sheet(12);
        let idle = sheet.get(Direction4::Down, PlayerAnimation::Idle).unwrap();
        assert_eq!(idle.frames, vec![FrameRect::new(2 * 96 + 32, 128, 32, 32)]);
    }

    #[test]
    fn frames_advance_and_loop() {
        let sheet = player_sheet(0);
        let mut animation: Animation<Direction4, PlayerAnimation> = Animation::new();
        animation.set_animation(PlayerAnimation::Walking);

        let columns: Vec<i32> = (0..6)
            .map(|_| {
                let frame = animation.current_frame(&sheet).unwrap();
                animation.update(0.25);
                frame.origin.x
            })
            .collect();
        assert_eq!(columns, vec![0, 32, 64, 32, 0, 32]);
    }

    #[test]
    fn changing_selection_restarts() {
        let sheet = player_sheet(0);
        let mut animation: Animation<Direction4, PlayerAnimation> = Animation::new();
        animation.set_animation(PlayerAnimation::Walking);
        animation.update(0.6);
        assert_eq!(animation.current_frame(&sheet).unwrap().origin.x, 64);

        // setting the same value doesn't restart
        animation.set_animation(PlayerAnimation::Walking);
        assert_eq!(animation.current_frame(&sheet).unwrap().origin.x, 64);

        animation.set_direction(Direction4::Right);
        assert_eq!(animation.elapsed(), 0.0);
        assert_eq!(
            animation.current_frame(&sheet),
            Some(&FrameRect::new(0, 64, 32, 32))
        );
    }
}
