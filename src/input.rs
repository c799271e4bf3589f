use anyhow::Result;
use cgmath::*;
use std::collections::HashMap;
use std::hash::Hash;
use std::str::FromStr;

use crate::util::normalized_or_zero;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Down,
    Released,
    Up,
}

impl Default for ButtonState {
    fn default() -> Self {
        ButtonState::Up
    }
}

impl ButtonState {
    fn transition(&self, key_down: bool) -> ButtonState {
        if key_down {
            match self {
                ButtonState::Pressed => ButtonState::Down,
                ButtonState::Down => ButtonState::Down,
                ButtonState::Released => ButtonState::Pressed,
                ButtonState::Up => ButtonState::Pressed,
            }
        } else {
            match self {
                ButtonState::Pressed => ButtonState::Released,
                ButtonState::Down => ButtonState::Released,
                ButtonState::Released => ButtonState::Up,
                ButtonState::Up => ButtonState::Up,
            }
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ButtonState::Pressed | ButtonState::Down)
    }
}

/// Tracks the state of a fixed set of keys. The key type is whatever the host's
/// windowing layer reports.
#[derive(Debug)]
pub struct InputState<K: Copy + Eq + Hash> {
    buttons: HashMap<K, ButtonState>,
}

impl<K: Copy + Eq + Hash> Default for InputState<K> {
    fn default() -> Self {
        Self {
            buttons: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> InputState<K> {
    pub fn for_keys(keys: &[K]) -> Self {
        let mut buttons = HashMap::new();
        for key in keys {
            buttons.insert(*key, ButtonState::default());
        }

        Self { buttons }
    }

    pub fn register(&mut self, key: K) {
        self.buttons.insert(key, ButtonState::default());
    }

    pub fn get_button_state(&self, key: K) -> Option<&ButtonState> {
        self.buttons.get(&key)
    }

    pub fn is_active(&self, key: K) -> bool {
        self.buttons.get(&key).map_or(false, |s| s.is_active())
    }

    /// Feeds a key event. Returns false if the key isn't tracked.
    pub fn process_key(&mut self, key: K, key_down: bool) -> bool {
        if let Some(button_state) = self.buttons.get(&key) {
            let new_state = button_state.transition(key_down);
            self.buttons.insert(key, new_state);
            true
        } else {
            false
        }
    }

    /// Advances Pressed to Down and Released to Up; call once per tick after processing events.
    pub fn update(&mut self) {
        let previous_button_state = std::mem::take(&mut self.buttons);
        for (key, button_state) in previous_button_state {
            self.buttons
                .insert(key, button_state.transition(button_state.is_active()));
        }
    }
}

// ---------------------------------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

impl ArrowKey {
    pub const ALL: [ArrowKey; 4] = [ArrowKey::Left, ArrowKey::Right, ArrowKey::Up, ArrowKey::Down];
}

impl FromStr for ArrowKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(ArrowKey::Left),
            "right" | "r" => Ok(ArrowKey::Right),
            "up" | "u" => Ok(ArrowKey::Up),
            "down" | "d" => Ok(ArrowKey::Down),
            _ => anyhow::bail!("Unrecognized arrow key \"{}\"", s),
        }
    }
}

/// Facing direction. Variant order matches the rows of a character sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction4 {
    Down,
    Left,
    Right,
    Up,
}

impl Default for Direction4 {
    fn default() -> Self {
        Direction4::Down
    }
}

/// Converts held arrow keys into a unit (or zero) movement vector in y-down screen space,
/// and the direction a character should face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MovementInput {
    pub movement: Vector2<f32>,
    /// Last direction held; keeps its value when nothing is held
    pub main_direction: Direction4,
}

impl Default for MovementInput {
    fn default() -> Self {
        Self {
            movement: Vector2::zero(),
            main_direction: Direction4::Down,
        }
    }
}

impl MovementInput {
    pub fn update(&mut self, input: &InputState<ArrowKey>) {
        let mut movement = Vector2::zero();
        // later keys win the main direction
        let keys = [
            (ArrowKey::Left, vec2(-1.0, 0.0), Direction4::Left),
            (ArrowKey::Right, vec2(1.0, 0.0), Direction4::Right),
            (ArrowKey::Up, vec2(0.0, -1.0), Direction4::Up),
            (ArrowKey::Down, vec2(0.0, 1.0), Direction4::Down),
        ];
        for (key, dir, facing) in keys.iter() {
            if input.is_active(*key) {
                movement += *dir;
                self.main_direction = *facing;
            }
        }
        self.movement = normalized_or_zero(movement);
    }
}

#[cfg(test)]
mod input_tests {
    use super::*;
    use crate::util::vec2_approx_eq;

    fn held(keys: &[ArrowKey]) -> InputState<ArrowKey> {
        let mut input = InputState::for_keys(&ArrowKey::ALL);
        for k in keys {
            input.process_key(*k, true);
        }
        input
    }

    #[test]
    fn button_state_transitions() {
        let mut input = InputState::for_keys(&['a']);
        assert_eq!(input.get_button_state('a'), Some(&ButtonState::Up));

        assert!(input.process_key('a', true));
        assert_eq!(input.get_button_state('a'), Some(&ButtonState::Pressed));
        input.update();
        assert_eq!(input.get_button_state('a'), Some(&ButtonState::Down));
        input.update();
        assert_eq!(input.get_button_state('a'), Some(&ButtonState::Down));

        input.process_key('a', false);
        assert_eq!(input.get_button_state('a'), Some(&ButtonState::Released));
        assert!(!input.is_active('a'));
        input.update();
        assert_eq!(input.get_button_state('a'), Some(&ButtonState::Up));

        assert!(!input.process_key('b', true));
        assert!(input.get_button_state('b').is_none());
    }

    #[test]
    fn default_movement_is_still_and_facing_down() {
        let movement = MovementInput::default();
        assert_eq!(movement.movement, Vector2::zero());
        assert_eq!(movement.main_direction, Direction4::Down);
    }

    #[test]
    fn nothing_held_is_zero_movement() {
        let mut movement = MovementInput::default();
        movement.update(&held(&[]));
        assert_eq!(movement.movement, vec2(0.0, 0.0));
        assert_eq!(movement.main_direction, Direction4::Down);
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let mut movement = MovementInput::default();
        movement.update(&held(&[ArrowKey::Right, ArrowKey::Up]));
        let d = std::f32::consts::FRAC_1_SQRT_2;
        assert!(vec2_approx_eq(movement.movement, vec2(d, -d), 1e-5));
        // up is checked after right
        assert_eq!(movement.main_direction, Direction4::Up);
    }

    #[test]
    fn opposing_keys_cancel_but_keep_direction() {
        let mut movement = MovementInput::default();
        movement.update(&held(&[ArrowKey::Left, ArrowKey::Right]));
        assert_eq!(movement.movement, vec2(0.0, 0.0));
        assert_eq!(movement.main_direction, Direction4::Right);

        // releasing everything keeps the last facing
        movement.update(&held(&[]));
        assert_eq!(movement.main_direction, Direction4::Right);
    }

    #[test]
    fn parses_arrow_keys() {
        assert_eq!("Left".parse::<ArrowKey>().unwrap(), ArrowKey::Left);
        assert_eq!("d".parse::<ArrowKey>().unwrap(), ArrowKey::Down);
        assert!("sideways".parse::<ArrowKey>().is_err());
    }
}
